//! Client-side projection of a match.
//!
//! [`GameState`] follows the server: it is either loaded whole from a
//! snapshot or advanced one notification at a time, and never changes on its
//! own.

use log::debug;
use shared::{
    Card, CardState, ChatLine, Color, EndReason, Face, Grid, GridError, HandSlot, MatchView,
    Notification, Objective, PhaseView, Standing, Symbol, HAND_SIZE,
};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    UnknownPlayer(String),
    StarterUnknown { player: String },
    StarterNotChosen { player: String },
    InvalidHandSlot { slot: usize },
    Placement(GridError),
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionError::UnknownPlayer(name) => write!(f, "Unknown player {}", name),
            ProjectionError::StarterUnknown { player } => {
                write!(f, "Starter of {} was never revealed", player)
            }
            ProjectionError::StarterNotChosen { player } => {
                write!(f, "{} has no field yet", player)
            }
            ProjectionError::InvalidHandSlot { slot } => write!(f, "Invalid hand slot {}", slot),
            ProjectionError::Placement(e) => write!(f, "Placement rejected: {}", e),
        }
    }
}

impl std::error::Error for ProjectionError {}

impl From<GridError> for ProjectionError {
    fn from(e: GridError) -> Self {
        ProjectionError::Placement(e)
    }
}

/// What this client knows about one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub name: String,
    pub color: Color,
    pub starter: Option<Card>,
    pub field: Option<Grid>,
    /// Backs of the cards in hand, for every player including us.
    pub hand_backs: [Option<Symbol>; HAND_SIZE],
    pub score: u32,
}

impl PlayerState {
    fn new(name: String, color: Color) -> Self {
        Self {
            name,
            color,
            starter: None,
            field: None,
            hand_backs: [None; HAND_SIZE],
            score: 0,
        }
    }

    pub fn starter_face(&self) -> Option<Face> {
        self.field.as_ref().map(|field| field.starter().face())
    }

    fn set_slot(&mut self, slot: usize, back: Option<Symbol>) -> Result<(), ProjectionError> {
        *self
            .hand_backs
            .get_mut(slot)
            .ok_or(ProjectionError::InvalidHandSlot { slot })? = back;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub me: String,
    /// In turn order.
    pub players: Vec<PlayerState>,
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

impl GameState {
    pub fn new(me: &str) -> Self {
        Self {
            me: me.to_string(),
            players: Vec::new(),
            hand: std::array::from_fn(|_| None),
            objective_options: Vec::new(),
            chosen_objective: None,
            shared_objectives: Vec::new(),
            card_state: CardState::default(),
            current_player: None,
            turn_played: false,
            phase: PhaseView::Setup,
            last_lap_origin: None,
            chat: Vec::new(),
            standings: Vec::new(),
            end_reason: None,
        }
    }

    /// Loads a reconnect snapshot. Fields are rebuilt by replaying their
    /// placements, so the symbol counts are derived locally.
    pub fn from_snapshot(view: MatchView) -> Result<Self, ProjectionError> {
        let mut players = Vec::with_capacity(view.players.len());
        for player in view.players {
            let field = match player.starter_face {
                Some(face) => {
                    let mut field = Grid::new(player.starter.clone(), face)?;
                    for placement in player.placements {
                        field.place(
                            placement.card().clone(),
                            placement.face(),
                            placement.position(),
                        )?;
                    }
                    Some(field)
                }
                None => None,
            };
            players.push(PlayerState {
                name: player.name,
                color: player.color,
                starter: Some(player.starter),
                field,
                hand_backs: player.hand_backs,
                score: player.score,
            });
        }

        Ok(Self {
            me: view.me,
            players,
            hand: view.hand,
            objective_options: view.objective_options,
            chosen_objective: view.chosen_objective,
            shared_objectives: view.shared_objectives,
            card_state: view.card_state,
            current_player: view.current_player,
            turn_played: view.turn_played,
            phase: view.phase,
            last_lap_origin: view.last_lap_origin,
            chat: view.chat,
            standings: view.standings,
            end_reason: view.end_reason,
        })
    }

    pub fn player(&self, name: &str) -> Option<&PlayerState> {
        self.players.iter().find(|player| player.name == name)
    }

    fn player_mut(&mut self, name: &str) -> Result<&mut PlayerState, ProjectionError> {
        self.players
            .iter_mut()
            .find(|player| player.name == name)
            .ok_or_else(|| ProjectionError::UnknownPlayer(name.to_string()))
    }

    pub fn my_field(&self) -> Option<&Grid> {
        self.player(&self.me).and_then(|player| player.field.as_ref())
    }

    pub fn is_my_turn(&self) -> bool {
        self.current_player.as_deref() == Some(self.me.as_str())
            && matches!(self.phase, PhaseView::Playing | PhaseView::LastLap)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == PhaseView::Finished
    }

    /// Advances the projection by one notification.
    pub fn apply(&mut self, notification: &Notification) -> Result<(), ProjectionError> {
        debug!("{} applies {:?}", self.me, notification);
        match notification {
            Notification::ColorAssignment { players } => {
                self.players = players
                    .iter()
                    .map(|(name, color)| PlayerState::new(name.clone(), *color))
                    .collect();
            }
            Notification::StarterCardsRevealed { starters } => {
                for (name, card) in starters {
                    self.player_mut(name)?.starter = Some(card.clone());
                }
            }
            Notification::GlobalObjectives { objectives } => {
                self.shared_objectives = objectives.clone();
            }
            Notification::CardState(card_state) => self.card_state = card_state.clone(),
            Notification::PlayerHand { player, hand } => {
                for (slot, card) in hand.iter().enumerate() {
                    self.update_hand_slot(player, slot, card)?;
                }
            }
            Notification::ObjectiveOptions { options } => {
                self.objective_options = options.clone();
            }
            Notification::ChosenStarter { player, face } => {
                let player = self.player_mut(player)?;
                let starter = player
                    .starter
                    .clone()
                    .ok_or_else(|| ProjectionError::StarterUnknown {
                        player: player.name.clone(),
                    })?;
                player.field = Some(Grid::new(starter, *face)?);
            }
            Notification::ChosenObjective { index } => self.chosen_objective = Some(*index),
            Notification::SetUpFinished { first_player } => {
                self.phase = PhaseView::Playing;
                self.current_player = Some(first_player.clone());
            }
            Notification::CardPlayed {
                player,
                slot,
                card,
                face,
                position,
                score,
                ..
            } => {
                if *slot >= HAND_SIZE {
                    return Err(ProjectionError::InvalidHandSlot { slot: *slot });
                }
                let is_me = *player == self.me;
                let state = self.player_mut(player)?;
                let field = state
                    .field
                    .as_mut()
                    .ok_or_else(|| ProjectionError::StarterNotChosen {
                        player: player.clone(),
                    })?;
                field.place(card.clone(), *face, *position)?;
                state.score = *score;
                state.set_slot(*slot, None)?;
                if is_me {
                    self.hand[*slot] = None;
                }
                self.turn_played = true;
            }
            Notification::Drawn {
                player,
                slot,
                card,
                card_state,
                ..
            } => {
                self.update_hand_slot(player, *slot, card)?;
                self.card_state = card_state.clone();
            }
            Notification::TurnAdvanced { current_player } => {
                self.current_player = Some(current_player.clone());
                self.turn_played = false;
            }
            Notification::LastRound { origin } => {
                self.phase = PhaseView::LastLap;
                self.last_lap_origin = Some(origin.clone());
            }
            Notification::MatchEnded { reason, standings } => {
                self.phase = PhaseView::Finished;
                self.end_reason = Some(reason.clone());
                self.standings = standings.clone();
                self.turn_played = false;
            }
            Notification::Chat(line) => self.chat.push(line.clone()),
        }
        Ok(())
    }

    fn update_hand_slot(
        &mut self,
        player: &str,
        slot: usize,
        card: &HandSlot,
    ) -> Result<(), ProjectionError> {
        let (known, back) = match card {
            HandSlot::Empty => (None, None),
            HandSlot::Hidden(symbol) => (None, Some(*symbol)),
            HandSlot::Known(card) => (Some(card.clone()), card.back_symbol()),
        };
        self.player_mut(player)?.set_slot(slot, back)?;
        if player == self.me {
            self.hand[slot] = known;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{CardCatalog, Pile, Position};

    fn catalog() -> CardCatalog {
        CardCatalog::standard()
    }

    fn opening(me: &str) -> GameState {
        let catalog = catalog();
        let mut state = GameState::new(me);
        let notes = vec![
            Notification::ColorAssignment {
                players: vec![("ada".to_string(), Color::Red), ("bob".to_string(), Color::Blue)],
            },
            Notification::StarterCardsRevealed {
                starters: vec![
                    ("ada".to_string(), catalog.starters[0].clone()),
                    ("bob".to_string(), catalog.starters[1].clone()),
                ],
            },
            Notification::PlayerHand {
                player: "ada".to_string(),
                hand: [
                    HandSlot::Known(catalog.resources[0].clone()),
                    HandSlot::Known(catalog.resources[1].clone()),
                    HandSlot::Known(catalog.golds[0].clone()),
                ],
            },
            Notification::PlayerHand {
                player: "bob".to_string(),
                hand: [
                    HandSlot::for_opponent(Some(&catalog.resources[2])),
                    HandSlot::for_opponent(Some(&catalog.resources[3])),
                    HandSlot::for_opponent(Some(&catalog.golds[1])),
                ],
            },
            Notification::ChosenStarter {
                player: "ada".to_string(),
                face: Face::Back,
            },
            Notification::ChosenStarter {
                player: "bob".to_string(),
                face: Face::Back,
            },
            Notification::SetUpFinished {
                first_player: "ada".to_string(),
            },
        ];
        for note in &notes {
            state.apply(note).unwrap();
        }
        state
    }

    #[test]
    fn test_setup_builds_fields_and_hands() {
        let state = opening("ada");
        assert_eq!(state.players.len(), 2);
        assert_eq!(state.player("bob").unwrap().color, Color::Blue);
        assert!(state.hand.iter().all(Option::is_some));
        assert!(state.player("bob").unwrap().hand_backs.iter().all(Option::is_some));
        assert_eq!(state.my_field().unwrap().len(), 1);
        assert_eq!(state.phase, PhaseView::Playing);
        assert!(state.is_my_turn());
    }

    #[test]
    fn test_card_played_updates_field_score_and_hand() {
        let mut state = opening("ada");
        let card = state.hand[0].clone().unwrap();
        state
            .apply(&Notification::CardPlayed {
                player: "ada".to_string(),
                slot: 0,
                card,
                face: Face::Back,
                position: Position::new(1, 1),
                points: 0,
                score: 0,
            })
            .unwrap();

        assert!(state.hand[0].is_none());
        assert_eq!(state.player("ada").unwrap().hand_backs[0], None);
        assert_eq!(state.my_field().unwrap().len(), 2);
        assert!(state.turn_played);
    }

    #[test]
    fn test_opponent_draw_only_reveals_back() {
        let mut state = opening("ada");
        let drawn = catalog().golds[5].clone();
        let card_state = CardState {
            gold_left: 12,
            ..CardState::default()
        };
        state
            .apply(&Notification::Drawn {
                player: "bob".to_string(),
                slot: 1,
                card: HandSlot::for_opponent(Some(&drawn)),
                source: shared::DrawSource::Pile(Pile::Gold),
                card_state: card_state.clone(),
            })
            .unwrap();

        assert_eq!(
            state.player("bob").unwrap().hand_backs[1],
            drawn.back_symbol()
        );
        assert_eq!(state.card_state, card_state);
        assert!(state.hand.iter().all(Option::is_some));
    }

    #[test]
    fn test_unknown_player_is_reported() {
        let mut state = opening("ada");
        let result = state.apply(&Notification::ChosenStarter {
            player: "zed".to_string(),
            face: Face::Front,
        });
        assert_eq!(result, Err(ProjectionError::UnknownPlayer("zed".to_string())));
    }

    #[test]
    fn test_illegal_replay_is_reported() {
        let mut state = opening("ada");
        let card = state.hand[0].clone().unwrap();
        let result = state.apply(&Notification::CardPlayed {
            player: "ada".to_string(),
            slot: 0,
            card,
            face: Face::Back,
            position: Position::new(1, 0),
            points: 0,
            score: 0,
        });
        assert!(matches!(result, Err(ProjectionError::Placement(_))));
        assert_eq!(state.my_field().unwrap().len(), 1);
    }

    #[test]
    fn test_last_round_and_end() {
        let mut state = opening("bob");
        state
            .apply(&Notification::LastRound {
                origin: "ada".to_string(),
            })
            .unwrap();
        assert_eq!(state.phase, PhaseView::LastLap);

        state
            .apply(&Notification::MatchEnded {
                reason: EndReason::Completed,
                standings: Vec::new(),
            })
            .unwrap();
        assert!(state.is_finished());
        assert!(!state.is_my_turn());
        assert_eq!(state.last_lap_origin.as_deref(), Some("ada"));
    }
}
