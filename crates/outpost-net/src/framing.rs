//! Length-prefixed, channel-tagged framing for the TCP link.
//!
//! ```text
//! +-------------------+-----------+----------------------+
//! | length (4 bytes)  | tag (1 B) |   body               |
//! | u32 little-endian |           |   (length - 1 bytes) |
//! +-------------------+-----------+----------------------+
//! ```
//!
//! The length covers the tag and body. A zero length is a keepalive frame
//! and is skipped by [`read_frame`].

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Configuration for the framing layer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum frame length (tag + body) in bytes. Default: 1 MiB.
    pub max_frame_size: u32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: 1_048_576,
        }
    }
}

/// Logical channel a frame belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameTag {
    /// A remote procedure call frame.
    Call,
    /// The compressed initial world download.
    WorldStream,
    /// Peer is closing; body is a UTF-8 reason.
    Close,
}

impl FrameTag {
    pub fn to_byte(self) -> u8 {
        match self {
            FrameTag::Call => 0,
            FrameTag::WorldStream => 1,
            FrameTag::Close => 2,
        }
    }

    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(FrameTag::Call),
            1 => Some(FrameTag::WorldStream),
            2 => Some(FrameTag::Close),
            _ => None,
        }
    }
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub tag: FrameTag,
    pub body: Bytes,
}

/// Errors that can occur during framing operations.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The frame length exceeds the configured maximum.
    #[error("frame size {size} exceeds maximum {max}")]
    FrameTooLarge {
        /// Declared size.
        size: u32,
        /// Configured maximum.
        max: u32,
    },

    /// The tag byte is not a known channel.
    #[error("unknown frame tag 0x{0:02X}")]
    UnknownTag(u8),

    /// The connection was closed before a complete frame was received.
    #[error("connection closed")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn eof_as_closed(e: std::io::Error) -> FrameError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        FrameError::ConnectionClosed
    } else {
        FrameError::Io(e)
    }
}

/// Read the next non-empty frame from the stream.
pub async fn read_frame<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    config: &FrameConfig,
) -> Result<Frame, FrameError> {
    loop {
        let mut len_buf = [0u8; 4];
        reader.read_exact(&mut len_buf).await.map_err(eof_as_closed)?;
        let len = u32::from_le_bytes(len_buf);

        if len > config.max_frame_size {
            return Err(FrameError::FrameTooLarge {
                size: len,
                max: config.max_frame_size,
            });
        }
        if len == 0 {
            continue;
        }

        let mut payload = vec![0u8; len as usize];
        reader.read_exact(&mut payload).await.map_err(eof_as_closed)?;

        let tag = FrameTag::from_byte(payload[0]).ok_or(FrameError::UnknownTag(payload[0]))?;
        let mut body = Bytes::from(payload);
        let _ = body.split_to(1);
        return Ok(Frame { tag, body });
    }
}

/// Write one frame and flush.
pub async fn write_frame<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    tag: FrameTag,
    body: &[u8],
    config: &FrameConfig,
) -> Result<(), FrameError> {
    let len = u32::try_from(body.len() + 1).unwrap_or(u32::MAX);
    if len > config.max_frame_size {
        return Err(FrameError::FrameTooLarge {
            size: len,
            max: config.max_frame_size,
        });
    }

    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_u8(tag.to_byte()).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn test_frame_roundtrip_over_duplex() {
        let config = FrameConfig::default();
        let (mut a, mut b) = duplex(1024);

        write_frame(&mut a, FrameTag::Call, &[0, 3, 9], &config)
            .await
            .unwrap();
        let frame = read_frame(&mut b, &config).await.unwrap();
        assert_eq!(frame.tag, FrameTag::Call);
        assert_eq!(&frame.body[..], &[0, 3, 9]);
    }

    #[tokio::test]
    async fn test_keepalive_frames_are_skipped() {
        let config = FrameConfig::default();
        let (mut a, mut b) = duplex(1024);

        a.write_all(&0u32.to_le_bytes()).await.unwrap();
        write_frame(&mut a, FrameTag::Close, b"closed", &config)
            .await
            .unwrap();
        let frame = read_frame(&mut b, &config).await.unwrap();
        assert_eq!(frame.tag, FrameTag::Close);
        assert_eq!(&frame.body[..], b"closed");
    }

    #[tokio::test]
    async fn test_oversized_frame_rejected() {
        let config = FrameConfig { max_frame_size: 8 };
        let (mut a, mut b) = duplex(1024);

        a.write_all(&100u32.to_le_bytes()).await.unwrap();
        let err = read_frame(&mut b, &config).await.unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 100, max: 8 }));

        let err = write_frame(&mut a, FrameTag::Call, &[0u8; 16], &config)
            .await
            .unwrap_err();
        assert!(matches!(err, FrameError::FrameTooLarge { size: 17, max: 8 }));
    }

    #[tokio::test]
    async fn test_unknown_tag_rejected() {
        let config = FrameConfig::default();
        let (mut a, mut b) = duplex(1024);

        a.write_all(&2u32.to_le_bytes()).await.unwrap();
        a.write_all(&[0x44, 0x00]).await.unwrap();
        let err = read_frame(&mut b, &config).await.unwrap_err();
        assert!(matches!(err, FrameError::UnknownTag(0x44)));
    }

    #[tokio::test]
    async fn test_eof_mid_frame_is_connection_closed() {
        let config = FrameConfig::default();
        let (mut a, mut b) = duplex(1024);

        a.write_all(&10u32.to_le_bytes()).await.unwrap();
        a.write_all(&[0, 1, 2]).await.unwrap();
        drop(a);
        let err = read_frame(&mut b, &config).await.unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }
}
