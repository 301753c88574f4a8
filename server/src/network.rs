//! Server network layer accepting TCP sessions
//!
//! Every accepted stream gets two tasks: a writer owned by its
//! [`TcpConnection`] and a reader that feeds decoded packets to the
//! [`GameService`]. A third task periodically drops silent sessions.

use crate::connection::TcpConnection;
use crate::service::GameService;
use log::{debug, error, info, warn};
use shared::{read_packet, Packet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};

pub struct Server {
    listener: TcpListener,
    service: Arc<GameService>,
    heartbeat: Duration,
}

impl Server {
    pub async fn bind(
        addr: &str,
        service: Arc<GameService>,
        heartbeat: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        info!("Server listening on {}", listener.local_addr()?);
        Ok(Server {
            listener,
            service,
            heartbeat,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn service(&self) -> Arc<GameService> {
        Arc::clone(&self.service)
    }

    /// Accepts connections until the listener fails.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_timeout_checker();

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let service = Arc::clone(&self.service);
                    tokio::spawn(serve_stream(service, stream, addr));
                }
                Err(e) => {
                    error!("Error accepting connection: {}", e);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            }
        }
    }

    /// Spawns task that monitors session liveness
    fn spawn_timeout_checker(&self) {
        let service = Arc::clone(&self.service);
        let heartbeat = self.heartbeat;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(heartbeat);
            loop {
                interval.tick().await;
                let reaped = service.reap_timed_out().await;
                if !reaped.is_empty() {
                    debug!("Reaped {} silent session(s)", reaped.len());
                }
            }
        });
    }
}

/// Reads packets from one peer until it leaves, then runs the disconnect path.
async fn serve_stream(service: Arc<GameService>, stream: TcpStream, addr: SocketAddr) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("Could not disable Nagle for {}: {}", addr, e);
    }
    let (mut reader, writer) = stream.into_split();
    let connection = Arc::new(TcpConnection::spawn(writer, addr.to_string()));
    let Some(session_id) = service.connect(connection).await else {
        info!("Refused {}: server full", addr);
        return;
    };

    loop {
        match read_packet(&mut reader).await {
            Ok(Some(packet)) => {
                let leaving = packet == Packet::Disconnect;
                service.handle_packet(session_id, packet).await;
                if leaving {
                    return;
                }
            }
            Ok(None) => {
                debug!("{} closed the connection", addr);
                break;
            }
            Err(e) => {
                warn!("Dropping {}: {}", addr, e);
                break;
            }
        }
    }
    service.handle_disconnect(session_id).await;
}
