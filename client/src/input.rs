//! Turns typed lines into player actions

use shared::{Action, Face, Position};
use std::fmt;

pub const HELP: &str = "\
Commands:
  starter front|back            choose the face of your starter card
  objective 0|1                 pick a personal objective
  play <slot> <x> <y> [back]    play a hand card (front face unless 'back')
  draw resource|gold            draw from a pile
  draw market <0-3>             take a market card
  say <text>                    chat with everyone
  tell <a,b,...> <text>         chat with some players
  show                          print the table
  help                          print this text
  quit                          leave the match";

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Action(Action),
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputError {
    Empty,
    UnknownCommand(String),
    MissingArgument(&'static str),
    BadNumber(String),
    BadFace(String),
    BadSource(String),
}

impl fmt::Display for InputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputError::Empty => write!(f, "Nothing to do"),
            InputError::UnknownCommand(word) => {
                write!(f, "Unknown command '{}', try 'help'", word)
            }
            InputError::MissingArgument(what) => write!(f, "Missing {}", what),
            InputError::BadNumber(word) => write!(f, "'{}' is not a number", word),
            InputError::BadFace(word) => write!(f, "'{}' is not a face (front/back)", word),
            InputError::BadSource(word) => {
                write!(f, "'{}' is not a draw source (resource/gold/market)", word)
            }
        }
    }
}

impl std::error::Error for InputError {}

pub fn parse_command(line: &str) -> Result<Command, InputError> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let mut args = rest.split_whitespace();

    let action = match word.to_ascii_lowercase().as_str() {
        "" => return Err(InputError::Empty),
        "help" | "?" => return Ok(Command::Help),
        "show" => return Ok(Command::Show),
        "quit" | "exit" => return Ok(Command::Quit),
        "starter" => Action::ChooseStarterFace {
            face: parse_face(args.next().ok_or(InputError::MissingArgument("face"))?)?,
        },
        "objective" => Action::ChooseObjective {
            index: parse_number(args.next().ok_or(InputError::MissingArgument("index"))?)?,
        },
        "play" => {
            let slot = parse_number(args.next().ok_or(InputError::MissingArgument("slot"))?)?;
            let x = parse_number(args.next().ok_or(InputError::MissingArgument("x"))?)?;
            let y = parse_number(args.next().ok_or(InputError::MissingArgument("y"))?)?;
            let face = match args.next() {
                Some(face) => parse_face(face)?,
                None => Face::Front,
            };
            Action::PlayCard {
                slot,
                position: Position::new(x, y),
                face,
            }
        }
        "draw" => match args.next().ok_or(InputError::MissingArgument("source"))? {
            "resource" => Action::DrawResource,
            "gold" => Action::DrawGold,
            "market" => Action::DrawMarket {
                index: parse_number(args.next().ok_or(InputError::MissingArgument("index"))?)?,
            },
            other => return Err(InputError::BadSource(other.to_string())),
        },
        "say" => {
            if rest.is_empty() {
                return Err(InputError::MissingArgument("text"));
            }
            Action::Chat {
                to: None,
                text: rest.to_string(),
            }
        }
        "tell" => {
            let (recipients, text) = rest
                .split_once(char::is_whitespace)
                .ok_or(InputError::MissingArgument("text"))?;
            Action::Chat {
                to: Some(
                    recipients
                        .split(',')
                        .filter(|name| !name.is_empty())
                        .map(str::to_string)
                        .collect(),
                ),
                text: text.trim().to_string(),
            }
        }
        other => return Err(InputError::UnknownCommand(other.to_string())),
    };
    Ok(Command::Action(action))
}

fn parse_face(word: &str) -> Result<Face, InputError> {
    match word.to_ascii_lowercase().as_str() {
        "front" | "f" => Ok(Face::Front),
        "back" | "b" => Ok(Face::Back),
        _ => Err(InputError::BadFace(word.to_string())),
    }
}

fn parse_number<T: std::str::FromStr>(word: &str) -> Result<T, InputError> {
    word.parse()
        .map_err(|_| InputError::BadNumber(word.to_string()))
}
