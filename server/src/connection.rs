//! Outbound side of a session.
//!
//! The game service only ever talks to a [`Connection`]. Sending never blocks:
//! packets are queued and written by a separate task, so a slow peer cannot
//! stall anyone holding a match lock.

use log::{debug, warn};
use shared::{write_packet, Packet};
use std::fmt;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// The peer is gone and the packet was dropped.
    Closed,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionError::Closed => write!(f, "Connection closed"),
        }
    }
}

impl std::error::Error for ConnectionError {}

pub trait Connection: Send + Sync {
    /// Queues a packet for delivery.
    fn send(&self, packet: Packet) -> Result<(), ConnectionError>;

    /// Human readable peer description for logs.
    fn peer(&self) -> String;
}

/// A socket peer. Frames are written by a background task.
pub struct TcpConnection {
    peer: String,
    outgoing: mpsc::UnboundedSender<Packet>,
}

impl TcpConnection {
    /// Spawns the writer task that owns `writer`.
    pub fn spawn<W>(mut writer: W, peer: String) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (outgoing, mut queue) = mpsc::unbounded_channel::<Packet>();
        let task_peer = peer.clone();
        tokio::spawn(async move {
            while let Some(packet) = queue.recv().await {
                if let Err(e) = write_packet(&mut writer, &packet).await {
                    warn!("Failed to write to {}: {}", task_peer, e);
                    break;
                }
            }
            debug!("Writer for {} stopped", task_peer);
        });
        Self { peer, outgoing }
    }
}

impl Connection for TcpConnection {
    fn send(&self, packet: Packet) -> Result<(), ConnectionError> {
        self.outgoing
            .send(packet)
            .map_err(|_| ConnectionError::Closed)
    }

    fn peer(&self) -> String {
        self.peer.clone()
    }
}

/// An in-process peer, such as a bot or a test harness.
pub struct LocalConnection {
    name: String,
    outgoing: mpsc::UnboundedSender<Packet>,
}

impl LocalConnection {
    /// Returns the connection and the receiver that gets everything sent on it.
    pub fn pair(name: &str) -> (Self, mpsc::UnboundedReceiver<Packet>) {
        let (outgoing, incoming) = mpsc::unbounded_channel();
        (
            Self {
                name: name.to_string(),
                outgoing,
            },
            incoming,
        )
    }
}

impl Connection for LocalConnection {
    fn send(&self, packet: Packet) -> Result<(), ConnectionError> {
        self.outgoing
            .send(packet)
            .map_err(|_| ConnectionError::Closed)
    }

    fn peer(&self) -> String {
        format!("local:{}", self.name)
    }
}
