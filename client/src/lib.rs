//! # Codex Arena Client Library
//!
//! The client side of the card placement game. It never decides anything on
//! its own: every change to the local view comes from the server, either as
//! one notification at a time or as a full snapshot after reconnecting.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! The projected match state:
//! - Player fields rebuilt by replaying placements, so symbol counts are local
//! - Our own hand in full, other hands as card backs only
//! - Scores, turn, phase, chat and final standings
//!
//! ### Input Module (`input`)
//! Parses typed commands into protocol actions.
//!
//! ### Network Module (`network`)
//! The TCP session: framing, keep-alive pings and the interactive loop.
//!
//! ### Rendering Module (`rendering`)
//! Plain text views of the table and of notable events.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = Client::connect("127.0.0.1:8080", "ada", Duration::from_secs(5)).await?;
//!     client.run().await
//! }
//! ```

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
