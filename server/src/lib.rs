//! # Codex Arena Server
//!
//! The authoritative server for a turn-based card placement game. Players
//! connect over TCP, wait in a lobby until enough of them are present, and
//! then play a match whose every rule is enforced here. Clients only ever
//! see what the server tells them.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! A single match: setup, turns, the last lap and final scoring. Each accepted
//! action yields notifications tagged with who may see them.
//!
//! ### Service Module (`service`)
//! Sessions, the lobby and every running match. Rejected actions become error
//! packets for the sender only.
//!
//! ### Client Manager Module (`client_manager`)
//! Session bookkeeping: usernames, liveness and capacity limits.
//!
//! ### Connection Module (`connection`)
//! The outbound side of a session, behind a small trait so matches can be
//! driven without sockets.
//!
//! ### Persistence Module (`persistence`)
//! Match snapshots on disk, written after setup and after each completed turn,
//! and reloaded on startup so players can reconnect.
//!
//! ### Network Module (`network`)
//! The TCP accept loop and per-connection reader tasks.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//! use server::service::GameService;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let service = Arc::new(GameService::new(&config, config.load_catalog()?, None));
//!     let server = Server::bind(&config.address(), service, config.heartbeat_interval()).await?;
//!     server.run().await
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod connection;
pub mod game;
pub mod network;
pub mod persistence;
pub mod service;
