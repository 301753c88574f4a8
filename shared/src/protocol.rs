//! Messages exchanged between the server and its clients.
//!
//! Every type here derives serde with the default externally tagged enum
//! representation: the variant name is the tag. That keeps frames decodable by
//! bincode and makes JSON records self-describing.

use crate::{Card, Face, Objective, Placement, Position, Symbol, HAND_SIZE, MARKET_SIZE};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two face-down draw piles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pile {
    Resource,
    Gold,
}

impl Pile {
    pub fn other(self) -> Pile {
        match self {
            Pile::Resource => Pile::Gold,
            Pile::Gold => Pile::Resource,
        }
    }
}

impl fmt::Display for Pile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pile::Resource => f.write_str("resource"),
            Pile::Gold => f.write_str("gold"),
        }
    }
}

/// Where a drawn card came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawSource {
    Pile(Pile),
    Market(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
}

impl Color {
    /// Assigned in turn order.
    pub const ALL: [Color; 4] = [Color::Red, Color::Blue, Color::Green, Color::Yellow];
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Color::Red => "red",
            Color::Blue => "blue",
            Color::Green => "green",
            Color::Yellow => "yellow",
        };
        f.write_str(name)
    }
}

/// A hand slot as seen by one viewer.
///
/// The owner sees the card itself; everyone else only sees its back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandSlot {
    Empty,
    Hidden(Symbol),
    Known(Card),
}

impl HandSlot {
    pub fn for_owner(card: Option<&Card>) -> Self {
        match card {
            Some(card) => HandSlot::Known(card.clone()),
            None => HandSlot::Empty,
        }
    }

    pub fn for_opponent(card: Option<&Card>) -> Self {
        match card.and_then(Card::back_symbol) {
            Some(symbol) => HandSlot::Hidden(symbol),
            None => HandSlot::Empty,
        }
    }
}

/// Public state of the draw piles and the market.
///
/// Only the back of each pile's top card is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardState {
    pub resource_top: Option<Symbol>,
    pub gold_top: Option<Symbol>,
    pub resource_left: usize,
    pub gold_left: usize,
    /// Slots 0 and 1 start with resources, slots 2 and 3 with golds.
    pub market: [Option<Card>; MARKET_SIZE],
}

impl CardState {
    pub fn top(&self, pile: Pile) -> Option<Symbol> {
        match pile {
            Pile::Resource => self.resource_top,
            Pile::Gold => self.gold_top,
        }
    }
}

/// What a player asks the server to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    ChooseStarterFace { face: Face },
    /// Index into the two personal objectives offered at setup.
    ChooseObjective { index: usize },
    PlayCard { slot: usize, position: Position, face: Face },
    DrawResource,
    DrawGold,
    DrawMarket { index: usize },
    /// `to: None` speaks to everyone in the match.
    Chat { to: Option<Vec<String>>, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    pub from: String,
    pub to: Option<Vec<String>>,
    pub text: String,
}

impl ChatLine {
    pub fn is_visible_to(&self, player: &str) -> bool {
        match &self.to {
            None => true,
            Some(recipients) => self.from == player || recipients.iter().any(|r| r == player),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    Completed,
    PlayerDisconnected(String),
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndReason::Completed => f.write_str("the last round is over"),
            EndReason::PlayerDisconnected(name) => write!(f, "{} disconnected", name),
        }
    }
}

/// Final result of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub player: String,
    pub total: u32,
    pub objectives_completed: u32,
    pub winner: bool,
}

/// Events the server emits as the match advances, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// Players in turn order with their colors.
    ColorAssignment { players: Vec<(String, Color)> },
    StarterCardsRevealed { starters: Vec<(String, Card)> },
    GlobalObjectives { objectives: Vec<Objective> },
    CardState(CardState),
    PlayerHand { player: String, hand: [HandSlot; HAND_SIZE] },
    /// Sent only to the player choosing.
    ObjectiveOptions { options: Vec<Objective> },
    ChosenStarter { player: String, face: Face },
    /// Sent only to the player who chose.
    ChosenObjective { index: usize },
    SetUpFinished { first_player: String },
    CardPlayed {
        player: String,
        slot: usize,
        card: Card,
        face: Face,
        position: Position,
        points: u32,
        score: u32,
    },
    Drawn {
        player: String,
        slot: usize,
        card: HandSlot,
        source: DrawSource,
        card_state: CardState,
    },
    TurnAdvanced { current_player: String },
    LastRound { origin: String },
    MatchEnded { reason: EndReason, standings: Vec<Standing> },
    Chat(ChatLine),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PhaseView {
    Setup,
    Playing,
    LastLap,
    Finished,
}

/// Everything one viewer may see of another player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub color: Color,
    pub starter: Card,
    pub starter_face: Option<Face>,
    /// Placements after the starter, in order.
    pub placements: Vec<Placement>,
    pub hand_backs: [Option<Symbol>; HAND_SIZE],
    pub score: u32,
}

/// A full match as seen by one player, sent once when they reconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchView {
    pub me: String,
    pub players: Vec<PlayerView>,
    pub hand: [Option<Card>; HAND_SIZE],
    pub objective_options: Vec<Objective>,
    pub chosen_objective: Option<usize>,
    pub shared_objectives: Vec<Objective>,
    pub card_state: CardState,
    pub current_player: Option<String>,
    pub turn_played: bool,
    pub phase: PhaseView,
    pub last_lap_origin: Option<String>,
    pub chat: Vec<ChatLine>,
    pub standings: Vec<Standing>,
    pub end_reason: Option<EndReason>,
}

/// Top level frame payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Packet {
    // Client to server
    Connect { client_version: u32, username: String },
    Action(Action),
    Ping { timestamp: u64 },
    Disconnect,

    // Server to client
    Connected { session_id: u64 },
    LobbyUpdate { waiting: Vec<String>, target: usize },
    Notify(Notification),
    Snapshot(Box<MatchView>),
    Error { code: u16, message: String },
    Pong { timestamp: u64 },
    Disconnected { reason: String },
}
