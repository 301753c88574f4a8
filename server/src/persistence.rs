//! Snapshots of running matches on disk.
//!
//! A [`MatchRecord`] flattens a match into plain data: each field is kept as
//! its starter face plus the ordered placements after it. Restoring replays
//! those placements through [`Grid::place`], so symbol pools are rebuilt by the
//! same rules that built them the first time and never read from disk.
//!
//! Records are JSON, one file per match, named `<match id>.json`.

use crate::game::{Match, MatchId, Phase, Seat};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use shared::{Card, ChatLine, Color, Face, Grid, Objective, Placement, HAND_SIZE, MARKET_SIZE};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const RECORD_VERSION: u32 = 1;

#[derive(Debug)]
pub enum PersistenceError {
    Io(io::Error),
    Format(serde_json::Error),
    /// The record parsed but does not describe a playable match.
    Corrupt(String),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Io(err) => write!(f, "Snapshot I/O failed: {}", err),
            PersistenceError::Format(err) => write!(f, "Snapshot is not valid JSON: {}", err),
            PersistenceError::Corrupt(reason) => write!(f, "Snapshot is inconsistent: {}", reason),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<io::Error> for PersistenceError {
    fn from(err: io::Error) -> Self {
        PersistenceError::Io(err)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::Format(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub username: String,
    pub color: Color,
    pub starter: Card,
    pub starter_face: Option<Face>,
    /// Every placement after the starter, in the order they were made.
    pub placements: Vec<Placement>,
    pub score: u32,
    pub hand: [Option<Card>; HAND_SIZE],
    pub objective_options: Vec<Objective>,
    pub chosen_objective: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub version: u32,
    pub match_id: MatchId,
    /// In turn order.
    pub players: Vec<PlayerRecord>,
    /// Top card last.
    pub resource_pile: Vec<Card>,
    pub gold_pile: Vec<Card>,
    pub market: [Option<Card>; MARKET_SIZE],
    pub shared_objectives: Vec<Objective>,
    pub current_player: usize,
    pub phase: Phase,
    pub last_lap_origin: Option<usize>,
    #[serde(default)]
    pub turn_played: bool,
    #[serde(default)]
    pub chat: Vec<ChatLine>,
}

impl MatchRecord {
    pub fn capture(game: &Match) -> Self {
        let players = game
            .seats
            .iter()
            .map(|seat| PlayerRecord {
                username: seat.name.clone(),
                color: seat.color,
                starter: seat.starter.clone(),
                starter_face: seat.starter_face(),
                placements: seat
                    .field
                    .as_ref()
                    .map(|field| field.placements()[1..].to_vec())
                    .unwrap_or_default(),
                score: seat.score,
                hand: seat.hand.clone(),
                objective_options: seat.objective_options.clone(),
                chosen_objective: seat.chosen_objective,
            })
            .collect();

        Self {
            version: RECORD_VERSION,
            match_id: game.id,
            players,
            resource_pile: game.resource_pile.clone(),
            gold_pile: game.gold_pile.clone(),
            market: game.market.clone(),
            shared_objectives: game.shared_objectives.clone(),
            current_player: game.current,
            phase: game.phase.clone(),
            last_lap_origin: game.last_lap_origin,
            turn_played: game.turn_played,
            chat: game.chat.clone(),
        }
    }

    /// Rebuilds the match, replaying every field placement by placement.
    ///
    /// No session is attached to any seat afterwards.
    pub fn restore(self) -> Result<Match, PersistenceError> {
        if self.players.is_empty() {
            return Err(corrupt("no players"));
        }
        if self.current_player >= self.players.len() {
            return Err(corrupt("current player out of range"));
        }
        if self.last_lap_origin.map_or(false, |origin| origin >= self.players.len()) {
            return Err(corrupt("last round origin out of range"));
        }
        if matches!(self.phase, Phase::Finished { .. }) {
            return Err(corrupt("match already finished"));
        }
        if (self.phase == Phase::LastLap) != self.last_lap_origin.is_some() {
            return Err(corrupt("last round origin does not match the phase"));
        }

        let mut seats = Vec::with_capacity(self.players.len());
        for player in self.players {
            let field = match player.starter_face {
                Some(face) => Some(replay_field(&player, face)?),
                None if player.placements.is_empty() => None,
                None => {
                    return Err(corrupt(&format!(
                        "{} has placements but no starter",
                        player.username
                    )))
                }
            };
            if player
                .chosen_objective
                .map_or(false, |index| index >= player.objective_options.len())
            {
                return Err(corrupt(&format!("{} chose a missing objective", player.username)));
            }
            seats.push(Seat {
                name: player.username,
                color: player.color,
                starter: player.starter,
                field,
                hand: player.hand,
                objective_options: player.objective_options,
                chosen_objective: player.chosen_objective,
                score: player.score,
                session: None,
            });
        }

        Ok(Match {
            id: self.match_id,
            seats,
            resource_pile: self.resource_pile,
            gold_pile: self.gold_pile,
            market: self.market,
            shared_objectives: self.shared_objectives,
            current: self.current_player,
            turn_played: self.turn_played,
            phase: self.phase,
            last_lap_origin: self.last_lap_origin,
            chat: self.chat,
            standings: Vec::new(),
            turns_completed: 0,
        })
    }
}

fn replay_field(player: &PlayerRecord, face: Face) -> Result<Grid, PersistenceError> {
    let mut field = Grid::new(player.starter.clone(), face)
        .map_err(|e| corrupt(&format!("{}: {}", player.username, e)))?;
    for placement in &player.placements {
        field
            .place(placement.card().clone(), placement.face(), placement.position())
            .map_err(|e| corrupt(&format!("{}: {}", player.username, e)))?;
    }
    Ok(field)
}

fn corrupt(reason: &str) -> PersistenceError {
    PersistenceError::Corrupt(reason.to_string())
}

/// A directory of match records.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Opens `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, match_id: MatchId) -> PathBuf {
        self.dir.join(format!("{}.json", match_id))
    }

    /// Writes a record through a temporary file so a crash never leaves half a
    /// record behind.
    pub fn save(&self, record: &MatchRecord) -> Result<(), PersistenceError> {
        let json = serde_json::to_vec_pretty(record)?;
        let path = self.path_for(record.match_id);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// Like [`SnapshotStore::save`], but failures are only logged: the match in
    /// memory stays authoritative.
    pub fn checkpoint(&self, record: &MatchRecord) {
        if let Err(e) = self.save(record) {
            error!("Failed to checkpoint match {}: {}", record.match_id, e);
        }
    }

    pub fn load(&self, match_id: MatchId) -> Result<MatchRecord, PersistenceError> {
        let json = fs::read_to_string(self.path_for(match_id))?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn remove(&self, match_id: MatchId) {
        match fs::remove_file(self.path_for(match_id)) {
            Ok(()) => info!("Removed snapshot of match {}", match_id),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove snapshot of match {}: {}", match_id, e),
        }
    }

    /// Loads and replays every record in the directory
    ///
    /// A record that cannot be read or replayed is logged and skipped; the
    /// other matches still come back.
    pub fn rehydrate(&self) -> Result<Vec<Match>, PersistenceError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
            .collect();
        paths.sort();

        let mut matches = Vec::new();
        for path in paths {
            let restored = fs::read_to_string(&path)
                .map_err(PersistenceError::from)
                .and_then(|json| Ok(serde_json::from_str::<MatchRecord>(&json)?))
                .and_then(MatchRecord::restore);
            match restored {
                Ok(game) => {
                    info!("Rehydrated match {} from {}", game.id(), path.display());
                    matches.push(game);
                }
                Err(e) => error!("Skipping snapshot {}: {}", path.display(), e),
            }
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use shared::{Action, CardCatalog, Position};
    use tempfile::tempdir;

    /// A match a few turns in, with cards on every field.
    fn played_match() -> Match {
        let mut rng = StdRng::seed_from_u64(11);
        let players = vec!["ada".to_string(), "bob".to_string()];
        let (mut game, _) = Match::new(5, players, &CardCatalog::standard(), &mut rng).unwrap();
        for seat in 0..2 {
            game.apply(seat, Action::ChooseStarterFace { face: Face::Back })
                .unwrap();
            game.apply(seat, Action::ChooseObjective { index: 1 }).unwrap();
        }
        for turn in 0..6 {
            let seat = turn % 2;
            let slot = game.seats[seat].hand.iter().position(Option::is_some).unwrap();
            let position = game.seats[seat].field.as_ref().unwrap().available_positions()[0];
            game.apply(
                seat,
                Action::PlayCard {
                    slot,
                    position,
                    face: Face::Back,
                },
            )
            .unwrap();
            game.apply(seat, Action::DrawMarket { index: turn % 4 }).unwrap();
        }
        game.apply(
            0,
            Action::Chat {
                to: None,
                text: "good luck".to_string(),
            },
        )
        .unwrap();
        game
    }

    #[test]
    fn test_restore_rebuilds_identical_pools() {
        let game = played_match();
        let json = serde_json::to_string(&MatchRecord::capture(&game)).unwrap();
        let restored = serde_json::from_str::<MatchRecord>(&json)
            .unwrap()
            .restore()
            .unwrap();

        for (before, after) in game.seats.iter().zip(&restored.seats) {
            let before = before.field.as_ref().unwrap();
            let after = after.field.as_ref().unwrap();
            assert_eq!(after.pool(), before.pool());
            assert_eq!(&after.recount(), before.pool());
            assert_eq!(after.placements(), before.placements());
        }
        assert_eq!(restored.current_seat(), game.current_seat());
        assert_eq!(restored.card_state(), game.card_state());
        assert_eq!(restored.view_for(1), game.view_for(1));
    }

    #[test]
    fn test_record_captures_setup_progress() {
        let mut rng = StdRng::seed_from_u64(2);
        let players = vec!["ada".to_string(), "bob".to_string()];
        let (mut game, _) = Match::new(6, players, &CardCatalog::standard(), &mut rng).unwrap();
        game.apply(1, Action::ChooseStarterFace { face: Face::Front })
            .unwrap();

        let restored = MatchRecord::capture(&game).restore().unwrap();
        assert_eq!(restored.phase(), &Phase::Setup);
        assert!(restored.seats[0].field.is_none());
        assert_eq!(restored.seats[1].starter_face(), Some(Face::Front));
    }

    #[test]
    fn test_replay_rejects_impossible_fields() {
        let game = played_match();
        let mut record = MatchRecord::capture(&game);
        let first = record.players[0].placements[0].clone();
        // The same position twice can never be legal.
        record.players[0].placements.push(Placement::new(
            first.card().clone(),
            first.face(),
            first.position(),
        ));
        assert!(matches!(record.restore(), Err(PersistenceError::Corrupt(_))));

        let mut record = MatchRecord::capture(&game);
        record.current_player = 7;
        assert!(matches!(record.restore(), Err(PersistenceError::Corrupt(_))));

        let mut record = MatchRecord::capture(&game);
        record.players[1].starter_face = None;
        assert!(matches!(record.restore(), Err(PersistenceError::Corrupt(_))));
    }

    #[test]
    fn test_last_round_needs_an_origin() {
        let game = played_match();

        let mut record = MatchRecord::capture(&game);
        record.phase = Phase::LastLap;
        record.last_lap_origin = None;
        assert!(matches!(record.restore(), Err(PersistenceError::Corrupt(_))));

        let mut record = MatchRecord::capture(&game);
        record.last_lap_origin = Some(0);
        assert!(matches!(record.restore(), Err(PersistenceError::Corrupt(_))));

        let mut record = MatchRecord::capture(&game);
        record.phase = Phase::LastLap;
        record.last_lap_origin = Some(1);
        let restored = record.restore().unwrap();
        assert_eq!(restored.phase(), &Phase::LastLap);
        assert_eq!(restored.last_lap_origin(), Some(1));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let game = played_match();
        let mut value = serde_json::to_value(MatchRecord::capture(&game)).unwrap();
        let object = value.as_object_mut().unwrap();
        object.remove("chat");
        object.remove("turn_played");

        let record: MatchRecord = serde_json::from_value(value).unwrap();
        assert!(record.chat.is_empty());
        assert!(!record.turn_played);
    }

    #[test]
    fn test_store_save_load_remove() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::open(dir.path().join("sessions")).unwrap();
        let record = MatchRecord::capture(&played_match());

        store.save(&record).unwrap();
        assert!(store.dir().join("5.json").exists());
        assert!(!store.dir().join("5.json.tmp").exists());
        assert_eq!(store.load(5).unwrap(), record);

        store.remove(5);
        assert!(matches!(store.load(5), Err(PersistenceError::Io(_))));
        store.remove(5);
    }

    #[test]
    fn test_rehydrate_skips_broken_records() {
        let dir = tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        store.save(&MatchRecord::capture(&played_match())).unwrap();
        fs::write(dir.path().join("8.json"), "{ not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let mut broken = MatchRecord::capture(&played_match());
        broken.match_id = 9;
        broken.players[0].placements[0] = Placement::new(
            broken.players[0].placements[0].card().clone(),
            Face::Back,
            Position::new(1, 0),
        );
        store.save(&broken).unwrap();

        let matches = store.rehydrate().unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id(), 5);
    }
}
