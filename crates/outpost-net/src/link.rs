//! TCP link between the simulation thread and a remote server.
//!
//! [`TcpLink::connect`] opens the socket, splits it, and spawns a reader task
//! that turns incoming frames into [`TransportEvent`]s on a bounded channel.
//! The simulation thread drains that channel once per tick with
//! [`TcpLink::poll_events`], so all handler work stays on one thread.
//!
//! TCP delivers everything reliably and in order; the reliability class of
//! an [`OutgoingCall`] is therefore not acted upon here.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{Mutex, mpsc, watch};

use crate::dispatch::OutgoingCall;
use crate::framing::{FrameConfig, FrameError, FrameTag, read_frame, write_frame};
use crate::transport::TransportEvent;

/// Link settings.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Framing limits.
    pub frame: FrameConfig,
    /// Capacity of the inbound event channel. Default: 1024.
    pub event_buffer: usize,
    /// How long to wait for the socket to open. Default: 5 s.
    pub connect_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            event_buffer: 1024,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// An open connection to a server.
pub struct TcpLink {
    writer: Arc<Mutex<OwnedWriteHalf>>,
    events: mpsc::Receiver<TransportEvent>,
    shutdown_tx: watch::Sender<bool>,
    config: LinkConfig,
}

impl TcpLink {
    /// Connect to `address:port`.
    ///
    /// The first event on the channel is always
    /// [`TransportEvent::Connected`]; the last is always
    /// [`TransportEvent::Disconnected`].
    /// Fails with [`io::ErrorKind::TimedOut`] if the socket is not open
    /// within [`LinkConfig::connect_timeout`].
    pub async fn connect(address: &str, port: u16, config: LinkConfig) -> io::Result<Self> {
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect((address, port)))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "timeout"))??;
        stream.set_nodelay(true)?;
        let peer = stream.peer_addr()?;

        let (reader, writer) = stream.into_split();
        let (tx, rx) = mpsc::channel(config.event_buffer.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tracing::info!("Link established to {address} ({peer})");
        let _ = tx
            .send(TransportEvent::Connected {
                address: format!("{address}/{peer}"),
            })
            .await;

        let frame_config = config.frame.clone();
        tokio::spawn(async move {
            Self::read_loop(reader, tx, shutdown_rx, frame_config).await;
        });

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            events: rx,
            shutdown_tx,
            config,
        })
    }

    /// Drain every event received since the last call, without blocking.
    pub fn poll_events(&mut self) -> Vec<TransportEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event);
        }
        out
    }

    /// Wait for the next event. Returns `None` once the reader has exited and
    /// every event has been taken.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events.recv().await
    }

    /// Send one encoded call.
    pub async fn send(&self, call: &OutgoingCall) -> Result<(), FrameError> {
        let mut w = self.writer.lock().await;
        write_frame(&mut *w, FrameTag::Call, &call.frame, &self.config.frame).await
    }

    /// Close the link. The reader task reports
    /// `Disconnected { reason: None }` and exits.
    pub fn close(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    async fn read_loop(
        mut reader: OwnedReadHalf,
        tx: mpsc::Sender<TransportEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
        config: FrameConfig,
    ) {
        let reason = loop {
            tokio::select! {
                result = read_frame(&mut reader, &config) => {
                    let event = match result {
                        Ok(frame) => match frame.tag {
                            FrameTag::Call => TransportEvent::Call(frame.body),
                            FrameTag::WorldStream => TransportEvent::WorldStream(frame.body),
                            FrameTag::Close => {
                                break Some(String::from_utf8_lossy(&frame.body).into_owned());
                            }
                        },
                        Err(FrameError::ConnectionClosed) => break Some("closed".to_string()),
                        Err(e) => {
                            tracing::warn!("Link read failed: {e}");
                            break Some(e.to_string());
                        }
                    };
                    if tx.send(event).await.is_err() {
                        return;
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break None;
                    }
                }
            }
        };
        let _ = tx.send(TransportEvent::Disconnected { reason }).await;
    }
}

impl Drop for TcpLink {
    fn drop(&mut self) {
        self.close();
    }
}
