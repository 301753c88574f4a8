//! Session handling, the lobby and the match arena.
//!
//! Locks are taken in one order only: a match lock may be held while the
//! session registry or the arena is locked, never the other way round. Everything a match
//! produces is queued on the connections before its lock is released, so each
//! player sees a match's events in the order they happened. Snapshot writes run
//! on the blocking pool under the same lock.

use crate::client_manager::{ClientManager, SessionId};
use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::game::{Match, MatchId};
use crate::persistence::{MatchRecord, SnapshotStore};
use log::{error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{Action, CardCatalog, GameError, Packet, PROTOCOL_VERSION};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

pub type MatchHandle = Arc<Mutex<Match>>;

pub struct GameService {
    players_per_match: usize,
    session_timeout: Duration,
    catalog: CardCatalog,
    store: Option<SnapshotStore>,
    sessions: RwLock<ClientManager>,
    /// Sessions waiting for a match, in arrival order.
    lobby: Mutex<Vec<(SessionId, String)>>,
    arena: RwLock<HashMap<MatchId, MatchHandle>>,
    rng: Mutex<StdRng>,
    next_match_id: AtomicU64,
}

impl GameService {
    pub fn new(config: &ServerConfig, catalog: CardCatalog, store: Option<SnapshotStore>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            players_per_match: config.players_per_match(),
            session_timeout: config.session_timeout(),
            catalog,
            store,
            sessions: RwLock::new(ClientManager::new(config.max_sessions)),
            lobby: Mutex::new(Vec::new()),
            arena: RwLock::new(HashMap::new()),
            rng: Mutex::new(rng),
            next_match_id: AtomicU64::new(1),
        }
    }

    /// Puts rehydrated matches back in the arena. Their seats stay vacant until
    /// the players say hello again.
    pub async fn restore_matches(&self, matches: Vec<Match>) {
        let mut arena = self.arena.write().await;
        for game in matches {
            let id = game.id();
            self.next_match_id.fetch_max(id + 1, Ordering::SeqCst);
            arena.insert(id, Arc::new(Mutex::new(game)));
        }
    }

    pub async fn match_handle(&self, match_id: MatchId) -> Option<MatchHandle> {
        self.arena.read().await.get(&match_id).cloned()
    }

    pub async fn match_count(&self) -> usize {
        self.arena.read().await.len()
    }

    pub async fn lobby_size(&self) -> usize {
        self.lobby.lock().await.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Registers a new peer. Returns None, after telling the peer why, when
    /// the server is full.
    pub async fn connect(&self, connection: Arc<dyn Connection>) -> Option<SessionId> {
        let session_id = self
            .sessions
            .write()
            .await
            .add_session(Arc::clone(&connection));
        let reply = match session_id {
            Some(session_id) => Packet::Connected { session_id },
            None => Packet::Disconnected {
                reason: "Server full".to_string(),
            },
        };
        if let Err(e) = connection.send(reply) {
            warn!("Could not greet {}: {}", connection.peer(), e);
        }
        session_id
    }

    /// Entry point for every packet read from a session.
    pub async fn handle_packet(&self, session_id: SessionId, packet: Packet) {
        if !self.sessions.write().await.touch(session_id) {
            warn!("Packet from unknown session {}", session_id);
            return;
        }

        match packet {
            Packet::Connect {
                client_version,
                username,
            } => {
                if client_version != PROTOCOL_VERSION {
                    warn!(
                        "Session {} speaks protocol {}, expected {}",
                        session_id, client_version, PROTOCOL_VERSION
                    );
                    self.send(
                        session_id,
                        Packet::Disconnected {
                            reason: "Unsupported protocol version".to_string(),
                        },
                    )
                    .await;
                    self.handle_disconnect(session_id).await;
                    return;
                }
                if let Err(e) = self.hello(session_id, &username).await {
                    self.send_error(session_id, &e).await;
                }
            }
            Packet::Action(action) => {
                if let Err(e) = self.handle_player_action(session_id, action).await {
                    self.send_error(session_id, &e).await;
                }
            }
            Packet::Ping { timestamp } => {
                self.send(session_id, Packet::Pong { timestamp }).await;
            }
            Packet::Disconnect => self.handle_disconnect(session_id).await,
            other => warn!("Unexpected packet from session {}: {:?}", session_id, other),
        }
    }

    async fn hello(&self, session_id: SessionId, username: &str) -> Result<(), GameError> {
        self.sessions
            .write()
            .await
            .authenticate(session_id, username)?;
        if !self.attach_to_match(session_id, username).await {
            self.join_lobby(session_id, username).await;
        }
        Ok(())
    }

    /// Seats a session in a running match that has a vacant seat with its
    /// username, and sends it a full snapshot.
    pub async fn attach_to_match(&self, session_id: SessionId, username: &str) -> bool {
        let handles: Vec<MatchHandle> = self.arena.read().await.values().cloned().collect();
        for handle in handles {
            let mut game = handle.lock().await;
            if game.is_finished() {
                continue;
            }
            let Some(seat) = game.attach(username, session_id) else {
                continue;
            };
            let match_id = game.id();
            let view = game.view_for(seat);
            // The snapshot has to be queued before any later event of this match.
            if let Some(view) = view {
                self.send(session_id, Packet::Snapshot(Box::new(view))).await;
            }
            drop(game);

            self.sessions
                .write()
                .await
                .set_match(session_id, Some(match_id));
            info!("{} rejoined match {}", username, match_id);
            return true;
        }
        false
    }

    async fn join_lobby(&self, session_id: SessionId, username: &str) {
        let (outbox, starting) = {
            let mut lobby = self.lobby.lock().await;
            lobby.push((session_id, username.to_string()));
            info!(
                "{} joined the lobby ({}/{})",
                username,
                lobby.len(),
                self.players_per_match
            );
            let outbox = self.lobby_update(&lobby);
            let starting = (lobby.len() >= self.players_per_match)
                .then(|| lobby.drain(..self.players_per_match).collect::<Vec<_>>());
            (outbox, starting)
        };
        self.deliver(outbox).await;
        if let Some(players) = starting {
            self.start_match(players).await;
        }
    }

    fn lobby_update(&self, lobby: &[(SessionId, String)]) -> Vec<(SessionId, Packet)> {
        let waiting: Vec<String> = lobby.iter().map(|(_, name)| name.clone()).collect();
        lobby
            .iter()
            .map(|(session_id, _)| {
                (
                    *session_id,
                    Packet::LobbyUpdate {
                        waiting: waiting.clone(),
                        target: self.players_per_match,
                    },
                )
            })
            .collect()
    }

    async fn start_match(&self, players: Vec<(SessionId, String)>) {
        let match_id = self.next_match_id.fetch_add(1, Ordering::SeqCst);
        let names = players.iter().map(|(_, name)| name.clone()).collect();
        let created = {
            let mut rng = self.rng.lock().await;
            Match::new(match_id, names, &self.catalog, &mut *rng)
        };
        let (mut game, dispatches) = match created {
            Ok(created) => created,
            Err(e) => {
                error!("Cannot start match {}: {}", match_id, e);
                return;
            }
        };
        for (session_id, name) in &players {
            game.attach(name, *session_id);
        }
        let outbox = game.route(dispatches);

        // Held until the opening events are queued, so no action can overtake them.
        let handle = Arc::new(Mutex::new(game));
        let _game = handle.lock().await;
        self.arena.write().await.insert(match_id, Arc::clone(&handle));
        {
            let mut sessions = self.sessions.write().await;
            for (session_id, _) in &players {
                sessions.set_match(*session_id, Some(match_id));
            }
        }
        self.deliver(outbox).await;
    }

    /// Applies an action for the player behind `session_id`.
    ///
    /// Errors are returned untouched for the caller to report to that player.
    pub async fn handle_player_action(
        &self,
        session_id: SessionId,
        action: Action,
    ) -> Result<(), GameError> {
        let (username, match_id) = {
            let sessions = self.sessions.read().await;
            let session = sessions
                .get(session_id)
                .ok_or(GameError::NotAuthenticated)?;
            let username = session
                .username
                .clone()
                .ok_or(GameError::NotAuthenticated)?;
            (username, session.match_id.ok_or(GameError::MatchNotFound)?)
        };
        let handle = self
            .match_handle(match_id)
            .await
            .ok_or(GameError::MatchNotFound)?;

        let finished = {
            let mut game = handle.lock().await;
            let seat = game.seat_of(&username).ok_or(GameError::MatchNotFound)?;
            let was_set_up = game.setup_complete();
            let turns = game.turns_completed();

            let dispatches = game.apply(seat, action)?;
            let outbox = game.route(dispatches);
            self.deliver(outbox).await;

            let finished = game.is_finished();
            let checkpoint = !finished
                && ((!was_set_up && game.setup_complete()) || game.turns_completed() != turns);
            if checkpoint {
                self.checkpoint(MatchRecord::capture(&game)).await;
            }
            finished
        };

        if finished {
            self.retire_match(match_id).await;
        }
        Ok(())
    }

    /// Drops a session. A match it was playing in ends for everyone.
    pub async fn handle_disconnect(&self, session_id: SessionId) {
        let Some(session) = self.sessions.write().await.remove_session(session_id) else {
            return;
        };

        let lobby_outbox = {
            let mut lobby = self.lobby.lock().await;
            match lobby.iter().position(|(id, _)| *id == session_id) {
                Some(index) => {
                    lobby.remove(index);
                    self.lobby_update(&lobby)
                }
                None => Vec::new(),
            }
        };
        self.deliver(lobby_outbox).await;

        let Some(match_id) = session.match_id else {
            return;
        };
        let Some(handle) = self.match_handle(match_id).await else {
            return;
        };
        {
            let mut game = handle.lock().await;
            let Some(seat) = game.detach(session_id) else {
                return;
            };
            let name = game.seats()[seat].name().to_string();
            let dispatches = game.abandon(&name);
            let outbox = game.route(dispatches);
            self.deliver(outbox).await;
        }
        self.retire_match(match_id).await;
    }

    /// Disconnects every session that has been silent for too long.
    pub async fn reap_timed_out(&self) -> Vec<SessionId> {
        let timed_out = self
            .sessions
            .read()
            .await
            .check_timeouts(self.session_timeout);
        for session_id in &timed_out {
            info!("Session {} timed out", session_id);
            self.send(
                *session_id,
                Packet::Disconnected {
                    reason: "Timed out".to_string(),
                },
            )
            .await;
            self.handle_disconnect(*session_id).await;
        }
        timed_out
    }

    /// Writes a snapshot of every match still in progress.
    pub async fn checkpoint_all(&self) {
        let handles: Vec<MatchHandle> = self.arena.read().await.values().cloned().collect();
        for handle in handles {
            let game = handle.lock().await;
            if !game.is_finished() {
                self.checkpoint(MatchRecord::capture(&game)).await;
            }
        }
    }

    /// Writes a record off the async workers. Failures are logged by the store
    /// and never reach the match.
    async fn checkpoint(&self, record: MatchRecord) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let match_id = record.match_id;
        if let Err(e) = tokio::task::spawn_blocking(move || store.checkpoint(&record)).await {
            error!("Checkpoint of match {} did not run: {}", match_id, e);
        }
    }

    async fn retire_match(&self, match_id: MatchId) {
        if self.arena.write().await.remove(&match_id).is_none() {
            return;
        }
        if let Some(store) = self.store.clone() {
            if let Err(e) = tokio::task::spawn_blocking(move || store.remove(match_id)).await {
                error!("Removing snapshot of match {} did not run: {}", match_id, e);
            }
        }
        self.sessions.write().await.clear_match(match_id);
        info!("Match {} retired", match_id);
    }

    async fn send(&self, session_id: SessionId, packet: Packet) {
        self.deliver(vec![(session_id, packet)]).await;
    }

    async fn send_error(&self, session_id: SessionId, err: &GameError) {
        info!("Rejected action from session {}: {}", session_id, err);
        self.send(
            session_id,
            Packet::Error {
                code: err.code(),
                message: err.to_string(),
            },
        )
        .await;
    }

    async fn deliver(&self, outbox: Vec<(SessionId, Packet)>) {
        if outbox.is_empty() {
            return;
        }
        let routed = self.sessions.read().await.connections_for(outbox);
        for (session_id, connection, packet) in routed {
            if let Err(e) = connection.send(packet) {
                warn!("Dropped packet for session {}: {}", session_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::LocalConnection;
    use shared::{EndReason, Face, Notification};
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Peer {
        id: SessionId,
        inbox: UnboundedReceiver<Packet>,
    }

    impl Peer {
        fn drain(&mut self) -> Vec<Packet> {
            let mut packets = Vec::new();
            while let Ok(packet) = self.inbox.try_recv() {
                packets.push(packet);
            }
            packets
        }
    }

    fn service_with(config: ServerConfig, store: Option<SnapshotStore>) -> GameService {
        GameService::new(&config, CardCatalog::standard(), store)
    }

    fn service() -> GameService {
        service_with(
            ServerConfig {
                seed: Some(7),
                ..ServerConfig::default()
            },
            None,
        )
    }

    async fn join(service: &GameService, name: &str) -> Peer {
        let (connection, inbox) = LocalConnection::pair(name);
        let id = service.connect(Arc::new(connection)).await.unwrap();
        service
            .handle_packet(
                id,
                Packet::Connect {
                    client_version: PROTOCOL_VERSION,
                    username: name.to_string(),
                },
            )
            .await;
        Peer { id, inbox }
    }

    async fn finish_setup(service: &GameService, peers: &[&Peer]) {
        for peer in peers {
            service
                .handle_packet(
                    peer.id,
                    Packet::Action(Action::ChooseStarterFace { face: Face::Back }),
                )
                .await;
            service
                .handle_packet(peer.id, Packet::Action(Action::ChooseObjective { index: 0 }))
                .await;
        }
    }

    fn notifications(packets: &[Packet]) -> Vec<&Notification> {
        packets
            .iter()
            .filter_map(|packet| match packet {
                Packet::Notify(notification) => Some(notification),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_lobby_fills_and_starts_match() {
        let service = service();
        let mut ada = join(&service, "ada").await;
        assert_eq!(service.lobby_size().await, 1);
        assert_eq!(service.match_count().await, 0);

        let mut bob = join(&service, "bob").await;
        assert_eq!(service.lobby_size().await, 0);
        assert_eq!(service.match_count().await, 1);

        let packets = ada.drain();
        assert_eq!(packets[0], Packet::Connected { session_id: ada.id });
        assert_eq!(
            packets[1],
            Packet::LobbyUpdate {
                waiting: vec!["ada".to_string()],
                target: 2
            }
        );
        assert_eq!(
            packets[2],
            Packet::LobbyUpdate {
                waiting: vec!["ada".to_string(), "bob".to_string()],
                target: 2
            }
        );
        assert!(matches!(
            notifications(&packets)[0],
            Notification::ColorAssignment { .. }
        ));

        let bob_notes = bob.drain();
        assert!(notifications(&bob_notes)
            .iter()
            .any(|note| matches!(note, Notification::PlayerHand { player, .. } if player == "bob")));
    }

    #[tokio::test]
    async fn test_ping_is_answered() {
        let service = service();
        let mut ada = join(&service, "ada").await;
        ada.drain();
        service
            .handle_packet(ada.id, Packet::Ping { timestamp: 42 })
            .await;
        assert_eq!(ada.drain(), vec![Packet::Pong { timestamp: 42 }]);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let service = service();
        let _ada = join(&service, "ada").await;
        let mut impostor = join(&service, "ada").await;

        let packets = impostor.drain();
        let expected = GameError::UsernameTaken {
            username: "ada".to_string(),
        };
        assert!(packets.iter().any(|packet| matches!(
            packet,
            Packet::Error { code, .. } if *code == expected.code()
        )));
        assert_eq!(service.lobby_size().await, 1);
    }

    #[tokio::test]
    async fn test_server_full() {
        let service = service_with(
            ServerConfig {
                max_sessions: 1,
                ..ServerConfig::default()
            },
            None,
        );
        let _ada = join(&service, "ada").await;

        let (connection, mut inbox) = LocalConnection::pair("bob");
        assert_eq!(service.connect(Arc::new(connection)).await, None);
        assert_eq!(
            inbox.recv().await,
            Some(Packet::Disconnected {
                reason: "Server full".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_rejected_action_reaches_only_sender() {
        let service = service();
        let mut ada = join(&service, "ada").await;
        let mut bob = join(&service, "bob").await;
        ada.drain();
        bob.drain();

        service
            .handle_packet(ada.id, Packet::Action(Action::DrawGold))
            .await;
        assert_eq!(
            ada.drain(),
            vec![Packet::Error {
                code: GameError::SetupInProgress.code(),
                message: GameError::SetupInProgress.to_string(),
            }]
        );
        assert!(bob.drain().is_empty());
    }

    #[tokio::test]
    async fn test_action_outside_match_fails() {
        let service = service();
        let mut ada = join(&service, "ada").await;
        ada.drain();
        assert_eq!(
            service
                .handle_player_action(ada.id, Action::DrawGold)
                .await,
            Err(GameError::MatchNotFound)
        );
        assert_eq!(
            service.handle_player_action(99, Action::DrawGold).await,
            Err(GameError::NotAuthenticated)
        );
    }

    #[tokio::test]
    async fn test_disconnect_ends_match_for_everyone() {
        let service = service();
        let mut ada = join(&service, "ada").await;
        let bob = join(&service, "bob").await;
        ada.drain();

        service.handle_packet(bob.id, Packet::Disconnect).await;

        let packets = ada.drain();
        assert!(notifications(&packets).iter().any(|note| matches!(
            note,
            Notification::MatchEnded {
                reason: EndReason::PlayerDisconnected(player),
                ..
            } if player == "bob"
        )));
        assert_eq!(service.match_count().await, 0);
        assert_eq!(service.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_lobby_leave_updates_the_rest() {
        let service = service_with(
            ServerConfig {
                players: 3,
                ..ServerConfig::default()
            },
            None,
        );
        let mut ada = join(&service, "ada").await;
        let bob = join(&service, "bob").await;
        ada.drain();

        service.handle_disconnect(bob.id).await;
        assert_eq!(service.lobby_size().await, 1);
        assert_eq!(
            ada.drain(),
            vec![Packet::LobbyUpdate {
                waiting: vec!["ada".to_string()],
                target: 3
            }]
        );
    }

    #[tokio::test]
    async fn test_returning_player_gets_snapshot() {
        let service = service();
        let mut rng = StdRng::seed_from_u64(3);
        let (game, _) = Match::new(
            12,
            vec!["ada".to_string(), "bob".to_string()],
            &CardCatalog::standard(),
            &mut rng,
        )
        .unwrap();
        service.restore_matches(vec![game]).await;

        let mut ada = join(&service, "ada").await;
        assert_eq!(service.lobby_size().await, 0);
        let snapshot = ada
            .drain()
            .into_iter()
            .find_map(|packet| match packet {
                Packet::Snapshot(view) => Some(view),
                _ => None,
            })
            .unwrap();
        assert_eq!(snapshot.me, "ada");
        assert_eq!(snapshot.players.len(), 2);

        // New matches never reuse a restored id.
        let _cyd = join(&service, "cyd").await;
        let _dee = join(&service, "dee").await;
        assert!(service.match_handle(13).await.is_some());
    }

    #[tokio::test]
    async fn test_checkpoint_after_setup_and_cleanup_on_end() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        let service = service_with(
            ServerConfig {
                seed: Some(7),
                ..ServerConfig::default()
            },
            Some(store.clone()),
        );
        let ada = join(&service, "ada").await;
        let bob = join(&service, "bob").await;
        tokio_test::assert_err!(store.load(1));

        finish_setup(&service, &[&ada, &bob]).await;
        let record = tokio_test::assert_ok!(store.load(1));
        assert_eq!(record.match_id, 1);

        service.handle_disconnect(ada.id).await;
        tokio_test::assert_err!(store.load(1));
    }

    /// The seat whose turn it is and a legal face-down play for it.
    async fn next_play(service: &GameService, match_id: MatchId) -> (usize, Action) {
        let handle = service.match_handle(match_id).await.unwrap();
        let game = handle.lock().await;
        let seat = game.current_seat();
        let player = game.seat(seat).unwrap();
        let play = Action::PlayCard {
            slot: player.hand().iter().position(Option::is_some).unwrap(),
            position: player.field().unwrap().available_positions()[0],
            face: Face::Back,
        };
        (seat, play)
    }

    #[tokio::test]
    async fn test_failed_checkpoints_leave_the_match_running() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sessions");
        let store = SnapshotStore::open(&path).unwrap();
        // Every write into the store now fails.
        std::fs::remove_dir(&path).unwrap();
        std::fs::write(&path, b"not a directory").unwrap();

        let service = service_with(
            ServerConfig {
                seed: Some(7),
                ..ServerConfig::default()
            },
            Some(store.clone()),
        );
        let mut ada = join(&service, "ada").await;
        let mut bob = join(&service, "bob").await;
        finish_setup(&service, &[&ada, &bob]).await;
        tokio_test::assert_err!(store.load(1));
        ada.drain();
        bob.drain();

        let (seat, play) = next_play(&service, 1).await;
        let player = [ada.id, bob.id][seat];
        service.handle_packet(player, Packet::Action(play)).await;
        service
            .handle_packet(player, Packet::Action(Action::DrawResource))
            .await;

        let handle = service.match_handle(1).await.unwrap();
        {
            let game = handle.lock().await;
            assert_eq!(game.turns_completed(), 1);
            assert_eq!(game.current_seat(), 1 - seat);
            assert!(!game.is_finished());
        }
        for peer in [&mut ada, &mut bob] {
            let packets = peer.drain();
            assert!(!packets
                .iter()
                .any(|packet| matches!(packet, Packet::Error { .. })));
            let seen = notifications(&packets);
            assert!(seen
                .iter()
                .any(|note| matches!(note, Notification::CardPlayed { .. })));
            assert!(seen
                .iter()
                .any(|note| matches!(note, Notification::TurnAdvanced { .. })));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_match_end_is_never_overtaken() {
        for _ in 0..25 {
            let service = Arc::new(service());
            let ada = join(&service, "ada").await;
            let bob = join(&service, "bob").await;
            finish_setup(&service, &[&ada, &bob]).await;

            let (seat, play) = next_play(&service, 1).await;
            let mut peers = [ada, bob];
            peers[seat].drain();
            let mover = peers[seat].id;
            let leaver = peers[1 - seat].id;

            let playing = {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.handle_packet(mover, Packet::Action(play)).await })
            };
            let leaving = {
                let service = Arc::clone(&service);
                tokio::spawn(async move { service.handle_packet(leaver, Packet::Disconnect).await })
            };
            playing.await.unwrap();
            leaving.await.unwrap();

            let packets = peers[seat].drain();
            let seen = notifications(&packets);
            assert!(matches!(
                seen.last(),
                Some(Notification::MatchEnded {
                    reason: EndReason::PlayerDisconnected(_),
                    ..
                })
            ));
        }
    }

    #[tokio::test]
    async fn test_checkpoint_all_writes_running_matches() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::open(dir.path()).unwrap();
        let service = service_with(ServerConfig::default(), Some(store.clone()));
        let _ada = join(&service, "ada").await;
        let _bob = join(&service, "bob").await;

        service.checkpoint_all().await;
        assert_eq!(store.rehydrate().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_silent_sessions_are_reaped() {
        let service = service_with(
            ServerConfig {
                timeout_secs: 0,
                ..ServerConfig::default()
            },
            None,
        );
        let mut ada = join(&service, "ada").await;
        let _bob = join(&service, "bob").await;
        ada.drain();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let reaped = service.reap_timed_out().await;
        assert_eq!(reaped.len(), 2);
        assert_eq!(service.session_count().await, 0);
        assert_eq!(service.match_count().await, 0);
        assert_eq!(
            ada.drain().last(),
            Some(&Packet::Disconnected {
                reason: "Timed out".to_string()
            })
        );
    }
}
