//! Session management for the game server
//!
//! This module tracks every connected session, including:
//! - Session lifecycle (connect, hello, disconnect, timeout)
//! - The username a session claimed and the match it sits in
//! - Liveness, refreshed by every inbound packet
//! - Capacity limits
//!
//! A session is transport agnostic: it only holds the [`Connection`] used to
//! reach its peer.

use crate::connection::Connection;
use crate::game::MatchId;
use log::info;
use shared::{GameError, Packet};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub type SessionId = u64;

/// A connected peer and what the server knows about it.
pub struct Session {
    /// Unique session identifier assigned by the server
    pub id: SessionId,
    /// Outbound channel to the peer
    pub connection: Arc<dyn Connection>,
    /// Set once the peer said hello
    pub username: Option<String>,
    /// Match this session plays in, if any
    pub match_id: Option<MatchId>,
    /// Last time we received any packet from this session
    pub last_seen: Instant,
}

impl Session {
    pub fn new(id: SessionId, connection: Arc<dyn Connection>) -> Self {
        Self {
            id,
            connection,
            username: None,
            match_id: None,
            last_seen: Instant::now(),
        }
    }

    /// Checks if the session has exceeded the liveness timeout
    ///
    /// Returns true if nothing has been received from this peer within
    /// `timeout`, which is treated exactly like a dropped connection.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// All sessions, indexed by id.
pub struct ClientManager {
    sessions: HashMap<SessionId, Session>,
    next_session_id: SessionId,
    max_sessions: usize,
}

impl ClientManager {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            next_session_id: 1,
            max_sessions,
        }
    }

    /// Registers a new session
    ///
    /// Returns None if the server is at capacity.
    pub fn add_session(&mut self, connection: Arc<dyn Connection>) -> Option<SessionId> {
        if self.sessions.len() >= self.max_sessions {
            return None;
        }

        let session_id = self.next_session_id;
        self.next_session_id += 1;

        info!("Session {} connected from {}", session_id, connection.peer());
        self.sessions
            .insert(session_id, Session::new(session_id, connection));
        Some(session_id)
    }

    pub fn remove_session(&mut self, session_id: SessionId) -> Option<Session> {
        let session = self.sessions.remove(&session_id)?;
        info!(
            "Session {} ({}) disconnected",
            session_id,
            session.username.as_deref().unwrap_or("anonymous")
        );
        Some(session)
    }

    pub fn get(&self, session_id: SessionId) -> Option<&Session> {
        self.sessions.get(&session_id)
    }

    /// Refreshes the liveness timestamp. Returns false for unknown sessions.
    pub fn touch(&mut self, session_id: SessionId) -> bool {
        match self.sessions.get_mut(&session_id) {
            Some(session) => {
                session.last_seen = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Claims a username for a session
    ///
    /// Usernames are unique among connected sessions. A session can only say
    /// hello once.
    pub fn authenticate(&mut self, session_id: SessionId, username: &str) -> Result<(), GameError> {
        if self.find_by_username(username).is_some() {
            return Err(GameError::UsernameTaken {
                username: username.to_string(),
            });
        }
        let session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(GameError::NotAuthenticated)?;
        if session.username.is_some() {
            return Err(GameError::AlreadyAuthenticated);
        }
        session.username = Some(username.to_string());
        info!("Session {} is now {}", session_id, username);
        Ok(())
    }

    pub fn find_by_username(&self, username: &str) -> Option<SessionId> {
        self.sessions
            .values()
            .find(|session| session.username.as_deref() == Some(username))
            .map(|session| session.id)
    }

    pub fn set_match(&mut self, session_id: SessionId, match_id: Option<MatchId>) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.match_id = match_id;
        }
    }

    /// Unbinds every session from a match that is over.
    pub fn clear_match(&mut self, match_id: MatchId) {
        for session in self.sessions.values_mut() {
            if session.match_id == Some(match_id) {
                session.match_id = None;
            }
        }
    }

    /// Collects sessions that stopped talking
    ///
    /// The sessions are left in place; the caller runs the normal disconnect
    /// path for each of them.
    pub fn check_timeouts(&self, timeout: Duration) -> Vec<SessionId> {
        self.sessions
            .values()
            .filter(|session| session.is_timed_out(timeout))
            .map(|session| session.id)
            .collect()
    }

    /// Connections for a batch of outgoing packets. Unknown sessions are skipped.
    pub fn connections_for(
        &self,
        outbox: Vec<(SessionId, Packet)>,
    ) -> Vec<(SessionId, Arc<dyn Connection>, Packet)> {
        outbox
            .into_iter()
            .filter_map(|(session_id, packet)| {
                self.sessions
                    .get(&session_id)
                    .map(|session| (session_id, Arc::clone(&session.connection), packet))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
