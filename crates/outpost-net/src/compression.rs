//! Compression envelope for the initial world stream.
//!
//! The world download is the only large payload the client receives, so it
//! travels as a flag byte followed by either the raw bytes or an LZ4 block
//! with a little-endian `u32` size prefix. Decompressed size is bounded by
//! [`StreamLimits::max_inflated`] before any allocation happens.

use lz4_flex::{compress_prepend_size, decompress_size_prepended};

/// Flag: payload follows uncompressed.
pub const STREAM_FLAG_RAW: u8 = 0x00;

/// Flag: payload is an LZ4 block with a size prefix.
pub const STREAM_FLAG_LZ4: u8 = 0x01;

/// Size thresholds for packing and unpacking world streams.
#[derive(Debug, Clone)]
pub struct StreamLimits {
    /// Payloads smaller than this are sent raw. Default: 256.
    pub compress_threshold: usize,
    /// Largest accepted decompressed size. Default: 64 MiB.
    pub max_inflated: usize,
}

impl Default for StreamLimits {
    fn default() -> Self {
        Self {
            compress_threshold: 256,
            max_inflated: 64 * 1024 * 1024,
        }
    }
}

/// Wrap serialized world data in the compression envelope.
pub fn pack_world_stream(data: &[u8], limits: &StreamLimits) -> Vec<u8> {
    if data.len() < limits.compress_threshold {
        let mut out = Vec::with_capacity(1 + data.len());
        out.push(STREAM_FLAG_RAW);
        out.extend_from_slice(data);
        return out;
    }
    let compressed = compress_prepend_size(data);
    let mut out = Vec::with_capacity(1 + compressed.len());
    out.push(STREAM_FLAG_LZ4);
    out.extend_from_slice(&compressed);
    out
}

/// Unwrap a received world stream, inflating it if needed.
pub fn unpack_world_stream(data: &[u8], limits: &StreamLimits) -> Result<Vec<u8>, CompressionError> {
    let (&flag, body) = data.split_first().ok_or(CompressionError::EmptyPayload)?;
    match flag {
        STREAM_FLAG_RAW => {
            if body.len() > limits.max_inflated {
                return Err(CompressionError::TooLarge {
                    size: body.len(),
                    max: limits.max_inflated,
                });
            }
            Ok(body.to_vec())
        }
        STREAM_FLAG_LZ4 => {
            let prefix: [u8; 4] = body
                .get(..4)
                .and_then(|p| p.try_into().ok())
                .ok_or_else(|| CompressionError::DecompressFailed("missing size prefix".into()))?;
            let declared = u32::from_le_bytes(prefix) as usize;
            if declared > limits.max_inflated {
                return Err(CompressionError::TooLarge {
                    size: declared,
                    max: limits.max_inflated,
                });
            }
            decompress_size_prepended(body)
                .map_err(|e| CompressionError::DecompressFailed(e.to_string()))
        }
        flag => Err(CompressionError::UnknownFlag(flag)),
    }
}

/// Errors raised while unpacking a world stream.
#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    /// Zero-length stream, no flag byte.
    #[error("empty world stream")]
    EmptyPayload,
    /// LZ4 block was malformed.
    #[error("LZ4 decompression failed: {0}")]
    DecompressFailed(String),
    /// Flag byte not recognised.
    #[error("unknown compression flag: 0x{0:02X}")]
    UnknownFlag(u8),
    /// Declared or raw size exceeds the configured bound.
    #[error("world stream of {size} bytes exceeds limit {max}")]
    TooLarge {
        /// Size that was rejected.
        size: usize,
        /// Configured maximum.
        max: usize,
    },
}
