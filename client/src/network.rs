use crate::game::GameState;
use crate::input::{parse_command, Command, HELP};
use crate::rendering::{render_notification, render_state};
use log::{debug, error, info, warn};
use shared::{read_packet, write_packet, Action, CodecError, Packet, PROTOCOL_VERSION};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::interval;

/// A TCP session with the game server.
///
/// Packets are read by a background task so waiting for the next one never
/// loses half a frame when another event wins a `select!`.
pub struct Client {
    writer: OwnedWriteHalf,
    incoming: mpsc::UnboundedReceiver<Packet>,
    username: String,
    session_id: Option<u64>,
    connected: bool,
    game: Option<GameState>,
    ping_interval: Duration,
    ping_ms: Option<u64>,
}

impl Client {
    pub async fn connect(
        server_addr: &str,
        username: &str,
        ping_interval: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let stream = TcpStream::connect(server_addr).await?;
        stream.set_nodelay(true)?;
        let (mut reader, writer) = stream.into_split();

        let (tx, incoming) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            loop {
                match read_packet(&mut reader).await {
                    Ok(Some(packet)) => {
                        if tx.send(packet).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("Server closed the connection");
                        break;
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Client {
            writer,
            incoming,
            username: username.to_string(),
            session_id: None,
            connected: true,
            game: None,
            ping_interval,
            ping_ms: None,
        })
    }

    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    pub fn session_id(&self) -> Option<u64> {
        self.session_id
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn ping_ms(&self) -> Option<u64> {
        self.ping_ms
    }

    async fn send_packet(&mut self, packet: &Packet) -> Result<(), CodecError> {
        write_packet(&mut self.writer, packet).await
    }

    /// Introduces this client by username.
    pub async fn hello(&mut self) -> Result<(), CodecError> {
        info!("Connecting as {}...", self.username);
        let packet = Packet::Connect {
            client_version: PROTOCOL_VERSION,
            username: self.username.clone(),
        };
        self.send_packet(&packet).await
    }

    pub async fn send_action(&mut self, action: Action) -> Result<(), CodecError> {
        self.send_packet(&Packet::Action(action)).await
    }

    pub async fn ping(&mut self) -> Result<(), CodecError> {
        let timestamp = get_timestamp();
        self.send_packet(&Packet::Ping { timestamp }).await
    }

    pub async fn disconnect(&mut self) -> Result<(), CodecError> {
        self.connected = false;
        self.send_packet(&Packet::Disconnect).await
    }

    /// Waits for the next packet and folds it into the local state.
    ///
    /// Returns None once the server hung up.
    pub async fn recv(&mut self) -> Option<Packet> {
        let packet = self.incoming.recv().await;
        match &packet {
            Some(packet) => self.handle_packet(packet),
            None => self.connected = false,
        }
        packet
    }

    fn handle_packet(&mut self, packet: &Packet) {
        match packet {
            Packet::Connected { session_id } => {
                info!("Connected! Session ID: {}", session_id);
                self.session_id = Some(*session_id);
            }
            Packet::LobbyUpdate { waiting, target } => {
                info!(
                    "Lobby {}/{}: {}",
                    waiting.len(),
                    target,
                    waiting.join(", ")
                );
            }
            Packet::Notify(notification) => {
                if matches!(notification, shared::Notification::ColorAssignment { .. }) {
                    self.game = Some(GameState::new(&self.username));
                }
                let game = self
                    .game
                    .get_or_insert_with(|| GameState::new(&self.username));
                if let Err(e) = game.apply(notification) {
                    warn!("Local state out of sync: {}", e);
                }
            }
            Packet::Snapshot(view) => match GameState::from_snapshot((**view).clone()) {
                Ok(game) => {
                    info!("Rejoined the match as {}", game.me);
                    self.game = Some(game);
                }
                Err(e) => error!("Could not load snapshot: {}", e),
            },
            Packet::Error { code, message } => {
                warn!("Server rejected action ({}): {}", code, message);
            }
            Packet::Pong { timestamp } => {
                self.ping_ms = Some(get_timestamp().saturating_sub(*timestamp));
            }
            Packet::Disconnected { reason } => {
                warn!("Disconnected: {}", reason);
                self.connected = false;
                self.session_id = None;
            }
            _ => {
                warn!("Unexpected packet type");
            }
        }
    }

    /// Interactive loop: server packets, typed commands and keep-alive pings.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.hello().await?;
        println!("{}", HELP);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut ping_interval = interval(self.ping_interval);

        while self.connected {
            tokio::select! {
                packet = self.recv() => {
                    match packet {
                        Some(packet) => self.print_packet(&packet),
                        None => {
                            println!("Server closed the connection");
                            break;
                        }
                    }
                },

                line = lines.next_line() => {
                    let Some(line) = line? else {
                        break;
                    };
                    match parse_command(&line) {
                        Ok(Command::Action(action)) => self.send_action(action).await?,
                        Ok(Command::Show) => match &self.game {
                            Some(game) => print!("{}", render_state(game)),
                            None => println!("Waiting for a match"),
                        },
                        Ok(Command::Help) => println!("{}", HELP),
                        Ok(Command::Quit) => break,
                        Err(e) => println!("{}", e),
                    }
                },

                _ = ping_interval.tick() => {
                    if let Err(e) = self.ping().await {
                        error!("Error sending ping: {}", e);
                    }
                },
            }
        }

        if self.connected {
            let _ = self.disconnect().await;
        }

        Ok(())
    }

    fn print_packet(&self, packet: &Packet) {
        match packet {
            Packet::Notify(notification) => {
                if let Some(line) = render_notification(&self.username, notification) {
                    println!("{}", line);
                }
            }
            Packet::Snapshot(_) => {
                if let Some(game) = &self.game {
                    print!("{}", render_state(game));
                }
            }
            Packet::Error { message, .. } => println!("Rejected: {}", message),
            Packet::Disconnected { reason } => println!("Disconnected: {}", reason),
            _ => {}
        }
    }
}

fn get_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}
