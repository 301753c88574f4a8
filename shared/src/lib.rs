//! # Shared Rule Engine
//!
//! Types and rules used by both the server and the client.
//!
//! ## Contents
//!
//! - **Cards** (`card`, `symbol`): the five card kinds, their faces and corners.
//! - **Fields** (`grid`, `pool`): where cards may be placed and which symbols
//!   remain visible. The symbol pool is kept in step with every placement.
//! - **Objectives** (`objective`): symbol counting and pattern matching on a
//!   field, including the greedy disjoint-occurrence rule.
//! - **Catalog** (`catalog`): the built-in card set and JSON loading.
//! - **Protocol** (`protocol`, `codec`): packets, actions, notifications, the
//!   per-player match view, and the length-prefixed frame codec.
//! - **Errors** (`error`): every reason an action can be rejected, with stable
//!   numeric codes.
//!
//! The server owns the authoritative match and validates every action against
//! these rules. Clients mirror what they are told and never decide anything.

pub mod card;
pub mod catalog;
pub mod codec;
pub mod error;
pub mod grid;
pub mod objective;
pub mod pool;
pub mod protocol;
pub mod symbol;

pub use card::*;
pub use catalog::*;
pub use codec::*;
pub use error::*;
pub use grid::*;
pub use objective::*;
pub use pool::*;
pub use protocol::*;
pub use symbol::*;

/// Bumped whenever the packet layout changes.
pub const PROTOCOL_VERSION: u32 = 1;
pub const HAND_SIZE: usize = 3;
pub const MARKET_SIZE: usize = 4;
/// Reaching this many points arms the last round.
pub const POINT_THRESHOLD: u32 = 20;
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 4;
