use crate::{Pile, Position};
use std::fmt;

/// Broad class of a rejected action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    TurnOrder,
    Duplicate,
    Precondition,
    Resource,
    Placement,
    Chat,
    Session,
}

/// Why a player action was rejected.
///
/// These are recoverable: the action had no effect and the error is reported to
/// the player who sent it. Each variant has a stable numeric code for the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    NotYourTurn,
    AlreadyPlayed,
    AlreadyChosen,
    DrawBeforePlay,
    SetupInProgress,
    StarterNotChosen,
    NoDrawOnFinalLap,
    MatchFinished,
    InvalidHandSlot { slot: usize },
    EmptyHandSlot { slot: usize },
    PileExhausted { pile: Pile },
    InvalidMarketSlot { index: usize },
    MarketSlotEmpty { index: usize },
    InvalidObjectiveIndex { index: usize },
    RequirementsNotMet,
    IllegalPosition { position: Position },
    InvalidRecipients,
    NotAuthenticated,
    AlreadyAuthenticated,
    UsernameTaken { username: String },
    MatchNotFound,
}

impl GameError {
    pub fn code(&self) -> u16 {
        match self {
            GameError::NotYourTurn => 100,
            GameError::AlreadyPlayed => 200,
            GameError::AlreadyChosen => 201,
            GameError::DrawBeforePlay => 300,
            GameError::SetupInProgress => 301,
            GameError::StarterNotChosen => 302,
            GameError::NoDrawOnFinalLap => 303,
            GameError::MatchFinished => 304,
            GameError::InvalidHandSlot { .. } => 400,
            GameError::EmptyHandSlot { .. } => 401,
            GameError::PileExhausted { .. } => 402,
            GameError::InvalidMarketSlot { .. } => 403,
            GameError::MarketSlotEmpty { .. } => 404,
            GameError::InvalidObjectiveIndex { .. } => 405,
            GameError::RequirementsNotMet => 500,
            GameError::IllegalPosition { .. } => 501,
            GameError::InvalidRecipients => 600,
            GameError::NotAuthenticated => 700,
            GameError::AlreadyAuthenticated => 701,
            GameError::UsernameTaken { .. } => 702,
            GameError::MatchNotFound => 703,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self.code() / 100 {
            1 => ErrorCategory::TurnOrder,
            2 => ErrorCategory::Duplicate,
            3 => ErrorCategory::Precondition,
            4 => ErrorCategory::Resource,
            5 => ErrorCategory::Placement,
            6 => ErrorCategory::Chat,
            _ => ErrorCategory::Session,
        }
    }
}

impl std::error::Error for GameError {}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::NotYourTurn => write!(f, "It is not your turn"),
            GameError::AlreadyPlayed => write!(f, "You already played a card this turn"),
            GameError::AlreadyChosen => write!(f, "You already made this choice"),
            GameError::DrawBeforePlay => write!(f, "You must play a card before drawing"),
            GameError::SetupInProgress => write!(f, "The match is still being set up"),
            GameError::StarterNotChosen => {
                write!(f, "Choose your starter card face before your objective")
            }
            GameError::NoDrawOnFinalLap => write!(f, "No cards are drawn during the last round"),
            GameError::MatchFinished => write!(f, "The match is over"),
            GameError::InvalidHandSlot { slot } => write!(f, "Hand slot {} does not exist", slot),
            GameError::EmptyHandSlot { slot } => write!(f, "Hand slot {} is empty", slot),
            GameError::PileExhausted { pile } => write!(f, "The {} pile is empty", pile),
            GameError::InvalidMarketSlot { index } => {
                write!(f, "Market slot {} does not exist", index)
            }
            GameError::MarketSlotEmpty { index } => write!(f, "Market slot {} is empty", index),
            GameError::InvalidObjectiveIndex { index } => {
                write!(f, "Objective option {} does not exist", index)
            }
            GameError::RequirementsNotMet => {
                write!(f, "Your field does not show the symbols this card requires")
            }
            GameError::IllegalPosition { position } => {
                write!(f, "A card cannot be placed at {}", position)
            }
            GameError::InvalidRecipients => write!(f, "The chat recipient list is invalid"),
            GameError::NotAuthenticated => write!(f, "Say hello with a username first"),
            GameError::AlreadyAuthenticated => write!(f, "This session already has a username"),
            GameError::UsernameTaken { username } => {
                write!(f, "The username {} is already connected", username)
            }
            GameError::MatchNotFound => write!(f, "You are not part of a running match"),
        }
    }
}

/// Misuse of the grid geometry or an illegal placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// The offset between two cards is not one of the four diagonals.
    NoCoveredCorner { dx: i32, dy: i32 },
    IllegalPosition { position: Position },
    /// A field must start with a starter card, and only one.
    MissingStarter,
    StarterAlreadyPlaced,
}

impl std::error::Error for GridError {}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::NoCoveredCorner { dx, dy } => {
                write!(f, "Offset ({}, {}) does not touch a corner", dx, dy)
            }
            GridError::IllegalPosition { position } => {
                write!(f, "Position {} is not a legal placement", position)
            }
            GridError::MissingStarter => write!(f, "A field must begin with a starter card"),
            GridError::StarterAlreadyPlaced => {
                write!(f, "Only the first card of a field may be a starter")
            }
        }
    }
}

impl From<GridError> for GameError {
    fn from(err: GridError) -> Self {
        match err {
            GridError::IllegalPosition { position } => GameError::IllegalPosition { position },
            GridError::NoCoveredCorner { dx, dy } => GameError::IllegalPosition {
                position: Position::new(dx, dy),
            },
            GridError::MissingStarter | GridError::StarterAlreadyPlaced => {
                GameError::IllegalPosition {
                    position: Position::ORIGIN,
                }
            }
        }
    }
}
