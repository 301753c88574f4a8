//! The authoritative match and its turn state machine.
//!
//! Every mutation goes through [`Match::apply`], which validates the whole
//! action before touching any state and returns the notifications it caused.
//! Delivering those notifications is the caller's job.

use crate::client_manager::SessionId;
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared::{
    Action, CardCatalog, CardState, CatalogError, Card, ChatLine, Color, DrawSource, EndReason,
    Face, GameError, Grid, HandSlot, MatchView, Notification, Objective, Packet, Pile, PhaseView,
    PlayerView, Position, Standing, HAND_SIZE, MARKET_SIZE, POINT_THRESHOLD,
};

pub type MatchId = u64;

/// Which seats a notification is meant for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Only(usize),
    AllBut(usize),
    Seats(Vec<usize>),
}

impl Audience {
    pub fn includes(&self, seat: usize) -> bool {
        match self {
            Audience::Everyone => true,
            Audience::Only(only) => *only == seat,
            Audience::AllBut(excluded) => *excluded != seat,
            Audience::Seats(seats) => seats.contains(&seat),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub audience: Audience,
    pub notification: Notification,
}

impl Dispatch {
    fn everyone(notification: Notification) -> Self {
        Self {
            audience: Audience::Everyone,
            notification,
        }
    }

    fn only(seat: usize, notification: Notification) -> Self {
        Self {
            audience: Audience::Only(seat),
            notification,
        }
    }

    fn all_but(seat: usize, notification: Notification) -> Self {
        Self {
            audience: Audience::AllBut(seat),
            notification,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    Playing,
    LastLap,
    Finished { reason: EndReason },
}

/// How far one player got through setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    AwaitingStarterChoice,
    AwaitingObjectiveChoice,
    Ready,
}

/// One player's place at the table.
#[derive(Debug, Clone)]
pub struct Seat {
    pub(crate) name: String,
    pub(crate) color: Color,
    pub(crate) starter: Card,
    /// Created once the starter face is chosen.
    pub(crate) field: Option<Grid>,
    pub(crate) hand: [Option<Card>; HAND_SIZE],
    pub(crate) objective_options: Vec<Objective>,
    pub(crate) chosen_objective: Option<usize>,
    pub(crate) score: u32,
    pub(crate) session: Option<SessionId>,
}

impl Seat {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn field(&self) -> Option<&Grid> {
        self.field.as_ref()
    }

    pub fn hand(&self) -> &[Option<Card>; HAND_SIZE] {
        &self.hand
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    pub fn starter_face(&self) -> Option<Face> {
        self.field.as_ref().map(|field| field.starter().face())
    }

    pub fn personal_objective(&self) -> Option<&Objective> {
        self.chosen_objective
            .and_then(|index| self.objective_options.get(index))
    }

    pub fn stage(&self) -> SetupStage {
        match (&self.field, self.chosen_objective) {
            (None, _) => SetupStage::AwaitingStarterChoice,
            (Some(_), None) => SetupStage::AwaitingObjectiveChoice,
            (Some(_), Some(_)) => SetupStage::Ready,
        }
    }

    fn hand_as_seen_by_owner(&self) -> [HandSlot; HAND_SIZE] {
        std::array::from_fn(|slot| HandSlot::for_owner(self.hand[slot].as_ref()))
    }

    fn hand_as_seen_by_others(&self) -> [HandSlot; HAND_SIZE] {
        std::array::from_fn(|slot| HandSlot::for_opponent(self.hand[slot].as_ref()))
    }
}

/// A running match. Draw piles keep their top card at the end of the vector.
#[derive(Debug, Clone)]
pub struct Match {
    pub(crate) id: MatchId,
    pub(crate) seats: Vec<Seat>,
    pub(crate) resource_pile: Vec<Card>,
    pub(crate) gold_pile: Vec<Card>,
    pub(crate) market: [Option<Card>; MARKET_SIZE],
    pub(crate) shared_objectives: Vec<Objective>,
    pub(crate) current: usize,
    pub(crate) turn_played: bool,
    pub(crate) phase: Phase,
    /// Seat whose turn ended when the last lap was armed.
    pub(crate) last_lap_origin: Option<usize>,
    pub(crate) chat: Vec<ChatLine>,
    pub(crate) standings: Vec<Standing>,
    pub(crate) turns_completed: u64,
}

impl Match {
    /// Deals a new match and returns the setup notifications.
    ///
    /// Seats follow the order of `players`, which is also the turn order.
    pub fn new<R: Rng>(
        id: MatchId,
        players: Vec<String>,
        catalog: &CardCatalog,
        rng: &mut R,
    ) -> Result<(Self, Vec<Dispatch>), CatalogError> {
        catalog.ensure_playable(players.len())?;

        let mut starters = catalog.starters.clone();
        let mut resource_pile = catalog.resources.clone();
        let mut gold_pile = catalog.golds.clone();
        let mut objectives = catalog.objectives.clone();
        starters.shuffle(rng);
        resource_pile.shuffle(rng);
        gold_pile.shuffle(rng);
        objectives.shuffle(rng);

        let shared_objectives = deal(&mut objectives, 2);
        let mut seats = Vec::with_capacity(players.len());
        for ((name, starter), color) in players.into_iter().zip(starters).zip(Color::ALL) {
            seats.push(Seat {
                name,
                color,
                starter,
                field: None,
                hand: [resource_pile.pop(), resource_pile.pop(), gold_pile.pop()],
                objective_options: deal(&mut objectives, 2),
                chosen_objective: None,
                score: 0,
                session: None,
            });
        }
        let market = [
            resource_pile.pop(),
            resource_pile.pop(),
            gold_pile.pop(),
            gold_pile.pop(),
        ];

        let game = Self {
            id,
            seats,
            resource_pile,
            gold_pile,
            market,
            shared_objectives,
            current: 0,
            turn_played: false,
            phase: Phase::Setup,
            last_lap_origin: None,
            chat: Vec::new(),
            standings: Vec::new(),
            turns_completed: 0,
        };
        info!(
            "Match {} created for {}",
            id,
            game.seats
                .iter()
                .map(|seat| seat.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let dispatches = game.setup_dispatches();
        Ok((game, dispatches))
    }

    fn setup_dispatches(&self) -> Vec<Dispatch> {
        let mut out = vec![
            Dispatch::everyone(Notification::ColorAssignment {
                players: self
                    .seats
                    .iter()
                    .map(|seat| (seat.name.clone(), seat.color))
                    .collect(),
            }),
            Dispatch::everyone(Notification::StarterCardsRevealed {
                starters: self
                    .seats
                    .iter()
                    .map(|seat| (seat.name.clone(), seat.starter.clone()))
                    .collect(),
            }),
            Dispatch::everyone(Notification::GlobalObjectives {
                objectives: self.shared_objectives.clone(),
            }),
            Dispatch::everyone(Notification::CardState(self.card_state())),
        ];
        for (index, seat) in self.seats.iter().enumerate() {
            out.push(Dispatch::only(
                index,
                Notification::PlayerHand {
                    player: seat.name.clone(),
                    hand: seat.hand_as_seen_by_owner(),
                },
            ));
            out.push(Dispatch::all_but(
                index,
                Notification::PlayerHand {
                    player: seat.name.clone(),
                    hand: seat.hand_as_seen_by_others(),
                },
            ));
            out.push(Dispatch::only(
                index,
                Notification::ObjectiveOptions {
                    options: seat.objective_options.clone(),
                },
            ));
        }
        out
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Finished { .. })
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seat(&self, index: usize) -> Option<&Seat> {
        self.seats.get(index)
    }

    pub fn seat_of(&self, name: &str) -> Option<usize> {
        self.seats.iter().position(|seat| seat.name == name)
    }

    pub fn current_seat(&self) -> usize {
        self.current
    }

    pub fn turn_played(&self) -> bool {
        self.turn_played
    }

    pub fn last_lap_origin(&self) -> Option<usize> {
        self.last_lap_origin
    }

    pub fn shared_objectives(&self) -> &[Objective] {
        &self.shared_objectives
    }

    pub fn standings(&self) -> &[Standing] {
        &self.standings
    }

    /// Number of turns that ran to completion since the match was loaded.
    pub fn turns_completed(&self) -> u64 {
        self.turns_completed
    }

    pub fn setup_complete(&self) -> bool {
        self.seats
            .iter()
            .all(|seat| seat.stage() == SetupStage::Ready)
    }

    pub fn card_state(&self) -> CardState {
        CardState {
            resource_top: self.resource_pile.last().and_then(Card::back_symbol),
            gold_top: self.gold_pile.last().and_then(Card::back_symbol),
            resource_left: self.resource_pile.len(),
            gold_left: self.gold_pile.len(),
            market: self.market.clone(),
        }
    }

    /// Binds a connected session to the seat named `name`.
    ///
    /// Fails when there is no such seat or someone already sits there.
    pub fn attach(&mut self, name: &str, session: SessionId) -> Option<usize> {
        let index = self.seat_of(name)?;
        let seat = &mut self.seats[index];
        if seat.session.is_some() {
            return None;
        }
        seat.session = Some(session);
        Some(index)
    }

    pub fn detach(&mut self, session: SessionId) -> Option<usize> {
        let index = self
            .seats
            .iter()
            .position(|seat| seat.session == Some(session))?;
        self.seats[index].session = None;
        Some(index)
    }

    pub fn has_vacant_seat(&self, name: &str) -> bool {
        self.seat_of(name)
            .map_or(false, |index| self.seats[index].session.is_none())
    }

    /// Expands dispatches into one packet per attached session.
    pub fn route(&self, dispatches: Vec<Dispatch>) -> Vec<(SessionId, Packet)> {
        let mut outbox = Vec::new();
        for dispatch in dispatches {
            for (index, seat) in self.seats.iter().enumerate() {
                let Some(session) = seat.session else {
                    continue;
                };
                if dispatch.audience.includes(index) {
                    outbox.push((session, Packet::Notify(dispatch.notification.clone())));
                }
            }
        }
        outbox
    }

    /// Applies one player action.
    ///
    /// On error nothing has changed.
    pub fn apply(&mut self, seat: usize, action: Action) -> Result<Vec<Dispatch>, GameError> {
        if seat >= self.seats.len() {
            return Err(GameError::MatchNotFound);
        }
        debug!("Match {} seat {}: {:?}", self.id, seat, action);

        let mut out = Vec::new();
        match action {
            Action::ChooseStarterFace { face } => self.choose_starter_face(seat, face, &mut out)?,
            Action::ChooseObjective { index } => self.choose_objective(seat, index, &mut out)?,
            Action::PlayCard {
                slot,
                position,
                face,
            } => self.play_card(seat, slot, position, face, &mut out)?,
            Action::DrawResource => self.draw(seat, DrawSource::Pile(Pile::Resource), &mut out)?,
            Action::DrawGold => self.draw(seat, DrawSource::Pile(Pile::Gold), &mut out)?,
            Action::DrawMarket { index } => self.draw(seat, DrawSource::Market(index), &mut out)?,
            Action::Chat { to, text } => self.chat(seat, to, text, &mut out)?,
        }
        Ok(out)
    }

    fn choose_starter_face(
        &mut self,
        seat: usize,
        face: Face,
        out: &mut Vec<Dispatch>,
    ) -> Result<(), GameError> {
        self.ensure_setup()?;
        let player = &mut self.seats[seat];
        if player.field.is_some() {
            return Err(GameError::AlreadyChosen);
        }
        player.field = Some(Grid::new(player.starter.clone(), face)?);
        out.push(Dispatch::everyone(Notification::ChosenStarter {
            player: player.name.clone(),
            face,
        }));
        Ok(())
    }

    fn choose_objective(
        &mut self,
        seat: usize,
        index: usize,
        out: &mut Vec<Dispatch>,
    ) -> Result<(), GameError> {
        self.ensure_setup()?;
        let player = &mut self.seats[seat];
        match player.stage() {
            SetupStage::AwaitingStarterChoice => return Err(GameError::StarterNotChosen),
            SetupStage::Ready => return Err(GameError::AlreadyChosen),
            SetupStage::AwaitingObjectiveChoice => {}
        }
        if index >= player.objective_options.len() {
            return Err(GameError::InvalidObjectiveIndex { index });
        }
        player.chosen_objective = Some(index);
        out.push(Dispatch::only(seat, Notification::ChosenObjective { index }));

        if self.setup_complete() {
            self.phase = Phase::Playing;
            self.current = 0;
            info!("Match {} setup finished", self.id);
            out.push(Dispatch::everyone(Notification::SetUpFinished {
                first_player: self.seats[0].name.clone(),
            }));
        }
        Ok(())
    }

    fn play_card(
        &mut self,
        seat: usize,
        slot: usize,
        position: Position,
        face: Face,
        out: &mut Vec<Dispatch>,
    ) -> Result<(), GameError> {
        self.ensure_turn(seat)?;
        if self.turn_played {
            return Err(GameError::AlreadyPlayed);
        }

        let player = &mut self.seats[seat];
        let card = player
            .hand
            .get(slot)
            .ok_or(GameError::InvalidHandSlot { slot })?
            .clone()
            .ok_or(GameError::EmptyHandSlot { slot })?;
        let field = player.field.as_mut().ok_or(GameError::StarterNotChosen)?;
        if !field.pool().satisfies(card.requirement(face)) {
            return Err(GameError::RequirementsNotMet);
        }
        if !field.is_placeable(position) {
            return Err(GameError::IllegalPosition { position });
        }

        let covered = field.place(card.clone(), face, position)?;
        let points = card.points_on_play(face, field.pool(), covered);
        player.hand[slot] = None;
        player.score += points;
        let notification = Notification::CardPlayed {
            player: player.name.clone(),
            slot,
            card,
            face,
            position,
            points,
            score: player.score,
        };
        self.turn_played = true;
        out.push(Dispatch::everyone(notification));

        if self.phase == Phase::LastLap {
            self.end_turn(out);
        }
        Ok(())
    }

    fn draw(
        &mut self,
        seat: usize,
        source: DrawSource,
        out: &mut Vec<Dispatch>,
    ) -> Result<(), GameError> {
        self.ensure_turn(seat)?;
        if self.phase == Phase::LastLap {
            return Err(GameError::NoDrawOnFinalLap);
        }
        if !self.turn_played {
            return Err(GameError::DrawBeforePlay);
        }
        let slot = self.seats[seat]
            .hand
            .iter()
            .position(Option::is_none)
            .ok_or(GameError::InvalidHandSlot { slot: HAND_SIZE })?;

        let card = match source {
            DrawSource::Pile(pile) => self
                .pile_mut(pile)
                .pop()
                .ok_or(GameError::PileExhausted { pile })?,
            DrawSource::Market(index) => {
                let card = self
                    .market
                    .get_mut(index)
                    .ok_or(GameError::InvalidMarketSlot { index })?
                    .take()
                    .ok_or(GameError::MarketSlotEmpty { index })?;
                self.refill_market(index);
                card
            }
        };

        let player = &mut self.seats[seat];
        player.hand[slot] = Some(card.clone());
        let name = player.name.clone();
        let card_state = self.card_state();
        out.push(Dispatch::only(
            seat,
            Notification::Drawn {
                player: name.clone(),
                slot,
                card: HandSlot::for_owner(Some(&card)),
                source,
                card_state: card_state.clone(),
            },
        ));
        out.push(Dispatch::all_but(
            seat,
            Notification::Drawn {
                player: name,
                slot,
                card: HandSlot::for_opponent(Some(&card)),
                source,
                card_state,
            },
        ));

        self.end_turn(out);
        Ok(())
    }

    fn chat(
        &mut self,
        seat: usize,
        to: Option<Vec<String>>,
        text: String,
        out: &mut Vec<Dispatch>,
    ) -> Result<(), GameError> {
        let audience = match &to {
            None => Audience::Everyone,
            Some(recipients) => {
                if recipients.is_empty() {
                    return Err(GameError::InvalidRecipients);
                }
                let mut seats = vec![seat];
                for name in recipients {
                    let recipient = self
                        .seat_of(name)
                        .filter(|index| *index != seat)
                        .ok_or(GameError::InvalidRecipients)?;
                    if seats.contains(&recipient) {
                        return Err(GameError::InvalidRecipients);
                    }
                    seats.push(recipient);
                }
                Audience::Seats(seats)
            }
        };

        let line = ChatLine {
            from: self.seats[seat].name.clone(),
            to,
            text,
        };
        self.chat.push(line.clone());
        out.push(Dispatch {
            audience,
            notification: Notification::Chat(line),
        });
        Ok(())
    }

    /// Ends the match early because a player left.
    pub fn abandon(&mut self, player: &str) -> Vec<Dispatch> {
        let mut out = Vec::new();
        if !self.is_finished() {
            info!("Match {} abandoned: {} disconnected", self.id, player);
            self.finish(EndReason::PlayerDisconnected(player.to_string()), &mut out);
        }
        out
    }

    fn ensure_setup(&self) -> Result<(), GameError> {
        match self.phase {
            Phase::Setup => Ok(()),
            Phase::Finished { .. } => Err(GameError::MatchFinished),
            Phase::Playing | Phase::LastLap => Err(GameError::AlreadyChosen),
        }
    }

    fn ensure_turn(&self, seat: usize) -> Result<(), GameError> {
        match self.phase {
            Phase::Setup => Err(GameError::SetupInProgress),
            Phase::Finished { .. } => Err(GameError::MatchFinished),
            Phase::Playing | Phase::LastLap if self.current != seat => Err(GameError::NotYourTurn),
            Phase::Playing | Phase::LastLap => Ok(()),
        }
    }

    fn pile_mut(&mut self, pile: Pile) -> &mut Vec<Card> {
        match pile {
            Pile::Resource => &mut self.resource_pile,
            Pile::Gold => &mut self.gold_pile,
        }
    }

    /// Slots 0 and 1 refill from the resource pile, 2 and 3 from the gold
    /// pile. An empty pile falls back to the other one.
    fn refill_market(&mut self, index: usize) {
        let preferred = if index < MARKET_SIZE / 2 {
            Pile::Resource
        } else {
            Pile::Gold
        };
        let mut refill = self.pile_mut(preferred).pop();
        if refill.is_none() {
            refill = self.pile_mut(preferred.other()).pop();
        }
        self.market[index] = refill;
    }

    fn last_lap_due(&self) -> bool {
        self.resource_pile.is_empty()
            || self.gold_pile.is_empty()
            || self.seats.iter().any(|seat| seat.score >= POINT_THRESHOLD)
    }

    fn end_turn(&mut self, out: &mut Vec<Dispatch>) {
        let ending = self.current;
        self.turn_played = false;
        self.turns_completed += 1;

        if self.phase == Phase::LastLap {
            if self.last_lap_origin == Some(ending) {
                self.finish(EndReason::Completed, out);
                return;
            }
        } else if self.last_lap_due() {
            self.phase = Phase::LastLap;
            self.last_lap_origin = Some(ending);
            info!(
                "Match {}: last round armed after {}'s turn",
                self.id, self.seats[ending].name
            );
            out.push(Dispatch::everyone(Notification::LastRound {
                origin: self.seats[ending].name.clone(),
            }));
        }

        self.current = (ending + 1) % self.seats.len();
        out.push(Dispatch::everyone(Notification::TurnAdvanced {
            current_player: self.seats[self.current].name.clone(),
        }));
    }

    fn finish(&mut self, reason: EndReason, out: &mut Vec<Dispatch>) {
        self.standings = self.final_standings();
        self.turn_played = false;
        self.phase = Phase::Finished {
            reason: reason.clone(),
        };
        info!("Match {} ended: {}", self.id, reason);
        out.push(Dispatch::everyone(Notification::MatchEnded {
            reason,
            standings: self.standings.clone(),
        }));
    }

    /// Running score plus shared and personal objectives.
    ///
    /// The highest total wins, ties go to whoever completed more objectives,
    /// and remaining ties share the win.
    pub fn final_standings(&self) -> Vec<Standing> {
        let results: Vec<(u32, u32)> = self
            .seats
            .iter()
            .map(|seat| {
                let Some(field) = seat.field.as_ref() else {
                    return (seat.score, 0);
                };
                let mut total = seat.score;
                let mut completed = 0;
                for objective in self.shared_objectives.iter().chain(seat.personal_objective()) {
                    let completions = objective.completions(field);
                    completed += completions;
                    total += completions * objective.multiplier();
                }
                (total, completed)
            })
            .collect();
        let best = results.iter().max().copied();

        self.seats
            .iter()
            .zip(&results)
            .map(|(seat, result)| Standing {
                player: seat.name.clone(),
                total: result.0,
                objectives_completed: result.1,
                winner: Some(*result) == best,
            })
            .collect()
    }

    /// Everything `seat` is allowed to see, for a reconnecting client.
    pub fn view_for(&self, seat: usize) -> Option<MatchView> {
        let me = self.seats.get(seat)?;
        let players = self
            .seats
            .iter()
            .map(|player| PlayerView {
                name: player.name.clone(),
                color: player.color,
                starter: player.starter.clone(),
                starter_face: player.starter_face(),
                placements: player
                    .field
                    .as_ref()
                    .map(|field| field.placements()[1..].to_vec())
                    .unwrap_or_default(),
                hand_backs: std::array::from_fn(|slot| {
                    player.hand[slot].as_ref().and_then(Card::back_symbol)
                }),
                score: player.score,
            })
            .collect();

        let (phase, end_reason) = match &self.phase {
            Phase::Setup => (PhaseView::Setup, None),
            Phase::Playing => (PhaseView::Playing, None),
            Phase::LastLap => (PhaseView::LastLap, None),
            Phase::Finished { reason } => (PhaseView::Finished, Some(reason.clone())),
        };

        Some(MatchView {
            me: me.name.clone(),
            players,
            hand: me.hand.clone(),
            objective_options: me.objective_options.clone(),
            chosen_objective: me.chosen_objective,
            shared_objectives: self.shared_objectives.clone(),
            card_state: self.card_state(),
            current_player: self
                .setup_complete()
                .then(|| self.seats[self.current].name.clone()),
            turn_played: self.turn_played,
            phase,
            last_lap_origin: self
                .last_lap_origin
                .map(|origin| self.seats[origin].name.clone()),
            chat: self
                .chat
                .iter()
                .filter(|line| line.is_visible_to(&me.name))
                .cloned()
                .collect(),
            standings: self.standings.clone(),
            end_reason,
        })
    }
}

/// Takes `count` cards off the top of a shuffled pile.
fn deal<T>(pile: &mut Vec<T>, count: usize) -> Vec<T> {
    let at = pile.len().saturating_sub(count);
    pile.split_off(at)
}
