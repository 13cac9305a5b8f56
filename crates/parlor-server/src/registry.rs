//! Connection registry for sessions, participants and the roster.
//!
//! A session is one QUIC connection. A participant is the identity a session
//! claims on `Hello`; several sessions may share one participant when ids are
//! derived from the IP address alone. The registry keeps both directions of
//! that mapping plus the roster, in the order participants were first seen.

use std::{
    collections::{BTreeSet, HashMap},
    net::SocketAddr,
};

use parlor_core::{ParticipantId, RosterEntry};

/// Information about a registered session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    /// Remote address of the connection.
    pub addr: SocketAddr,
    /// Participant this session speaks for, once `Hello` has been handled.
    pub participant: Option<ParticipantId>,
}

impl SessionInfo {
    /// Create an unauthenticated session.
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, participant: None }
    }

    /// Whether the session has completed the handshake.
    pub fn is_authenticated(&self) -> bool {
        self.participant.is_some()
    }
}

/// Result of removing a session from the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    /// The removed session.
    pub info: SessionInfo,
    /// True when this was the participant's last session, so the participant
    /// has left the roster.
    pub left_roster: bool,
}

/// Registry for tracking sessions and the participants they speak for.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Session ID → session info
    sessions: HashMap<u64, SessionInfo>,
    /// Participant → sessions speaking for it
    participant_sessions: HashMap<ParticipantId, BTreeSet<u64>>,
    /// Connected participants in first-seen order
    roster: Vec<RosterEntry>,
}

impl ConnectionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new, unauthenticated session.
    ///
    /// Returns `false` if the session already exists.
    pub fn register_session(&mut self, session_id: u64, addr: SocketAddr) -> bool {
        if self.sessions.contains_key(&session_id) {
            return false;
        }

        self.sessions.insert(session_id, SessionInfo::new(addr));
        true
    }

    /// Bind a session to a participant.
    ///
    /// The first session of a participant appends it to the roster; later
    /// sessions update its display name in place. Returns `false` if the
    /// session is unknown or already bound.
    pub fn authenticate(
        &mut self,
        session_id: u64,
        participant: ParticipantId,
        display_name: String,
    ) -> bool {
        let Some(info) = self.sessions.get_mut(&session_id) else {
            return false;
        };
        if info.participant.is_some() {
            return false;
        }
        info.participant = Some(participant.clone());

        self.participant_sessions.entry(participant.clone()).or_default().insert(session_id);

        match self.roster.iter_mut().find(|entry| entry.id == participant) {
            Some(entry) => entry.display_name = display_name,
            None => self.roster.push(RosterEntry::new(participant, display_name)),
        }
        true
    }

    /// Remove a session, dropping its participant from the roster if it was
    /// the last session speaking for it.
    pub fn unregister_session(&mut self, session_id: u64) -> Option<Departure> {
        let info = self.sessions.remove(&session_id)?;

        let mut left_roster = false;
        if let Some(participant) = &info.participant {
            if let Some(sessions) = self.participant_sessions.get_mut(participant) {
                sessions.remove(&session_id);
                if sessions.is_empty() {
                    self.participant_sessions.remove(participant);
                    self.roster.retain(|entry| &entry.id != participant);
                    left_roster = true;
                }
            }
        }

        Some(Departure { info, left_roster })
    }

    /// Session metadata. `None` if session doesn't exist.
    pub fn session(&self, session_id: u64) -> Option<&SessionInfo> {
        self.sessions.get(&session_id)
    }

    /// Check if a session is registered.
    pub fn has_session(&self, session_id: u64) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Participant bound to a session, if it has completed the handshake.
    pub fn participant(&self, session_id: u64) -> Option<&ParticipantId> {
        self.sessions.get(&session_id).and_then(|info| info.participant.as_ref())
    }

    /// Sessions speaking for a participant, in ascending order.
    pub fn sessions_for(&self, participant: &ParticipantId) -> impl Iterator<Item = u64> + '_ {
        self.participant_sessions.get(participant).into_iter().flat_map(|s| s.iter().copied())
    }

    /// All sessions that completed the handshake, in ascending order.
    pub fn authenticated_sessions(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self
            .sessions
            .iter()
            .filter(|(_, info)| info.is_authenticated())
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Connected participants in first-seen order.
    pub fn roster(&self) -> &[RosterEntry] {
        &self.roster
    }

    /// Total number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn addr(last: u8) -> SocketAddr {
        SocketAddr::from(([10, 0, 0, last], 5000))
    }

    fn id(s: &str) -> ParticipantId {
        ParticipantId::from(s)
    }

    #[test]
    fn register_and_lookup_session() {
        let mut registry = ConnectionRegistry::new();

        assert!(registry.register_session(1, addr(1)));
        assert!(registry.has_session(1));
        assert!(!registry.has_session(2));

        let info = registry.session(1).unwrap();
        assert!(!info.is_authenticated());
        assert_eq!(info.addr, addr(1));
    }

    #[test]
    fn register_duplicate_session_fails() {
        let mut registry = ConnectionRegistry::new();

        assert!(registry.register_session(1, addr(1)));
        assert!(!registry.register_session(1, addr(1)));
    }

    #[test]
    fn authenticate_appends_to_roster_in_order() {
        let mut registry = ConnectionRegistry::new();
        registry.register_session(1, addr(2));
        registry.register_session(2, addr(1));

        assert!(registry.authenticate(1, id("10.0.0.2"), "Bob".into()));
        assert!(registry.authenticate(2, id("10.0.0.1"), "Alice".into()));

        let ids: Vec<&str> = registry.roster().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["10.0.0.2", "10.0.0.1"]);
    }

    #[test]
    fn authenticate_twice_fails() {
        let mut registry = ConnectionRegistry::new();
        registry.register_session(1, addr(1));

        assert!(registry.authenticate(1, id("10.0.0.1"), "A".into()));
        assert!(!registry.authenticate(1, id("10.0.0.9"), "B".into()));
        assert_eq!(registry.participant(1), Some(&id("10.0.0.1")));
    }

    #[test]
    fn authenticate_unknown_session_fails() {
        let mut registry = ConnectionRegistry::new();
        assert!(!registry.authenticate(7, id("10.0.0.1"), "A".into()));
        assert!(registry.roster().is_empty());
    }

    #[test]
    fn shared_participant_stays_until_last_session_leaves() {
        let mut registry = ConnectionRegistry::new();
        registry.register_session(1, addr(1));
        registry.register_session(2, addr(1));
        registry.authenticate(1, id("10.0.0.1"), "First".into());
        registry.authenticate(2, id("10.0.0.1"), "Second".into());

        assert_eq!(registry.roster().len(), 1);
        assert_eq!(registry.roster()[0].display_name, "Second");
        assert_eq!(registry.sessions_for(&id("10.0.0.1")).collect::<Vec<_>>(), [1, 2]);

        let departure = registry.unregister_session(1).unwrap();
        assert!(!departure.left_roster);
        assert_eq!(registry.roster().len(), 1);

        let departure = registry.unregister_session(2).unwrap();
        assert!(departure.left_roster);
        assert!(registry.roster().is_empty());
        assert_eq!(registry.sessions_for(&id("10.0.0.1")).count(), 0);
    }

    #[test]
    fn unauthenticated_departure_never_touches_roster() {
        let mut registry = ConnectionRegistry::new();
        registry.register_session(1, addr(1));

        let departure = registry.unregister_session(1).unwrap();
        assert!(!departure.left_roster);
        assert!(registry.unregister_session(1).is_none());
    }

    #[test]
    fn authenticated_sessions_are_sorted() {
        let mut registry = ConnectionRegistry::new();
        for session in [5, 3, 9] {
            registry.register_session(session, addr(1));
        }
        registry.authenticate(9, id("x"), "X".into());
        registry.authenticate(3, id("y"), "Y".into());

        assert_eq!(registry.authenticated_sessions(), [3, 9]);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Register(u64),
        Authenticate(u64, u8),
        Unregister(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..6).prop_map(Op::Register),
            (0u64..6, 0u8..3).prop_map(|(s, p)| Op::Authenticate(s, p)),
            (0u64..6).prop_map(Op::Unregister),
        ]
    }

    proptest! {
        #[test]
        fn roster_tracks_live_participants(ops in prop::collection::vec(op(), 0..40)) {
            let mut registry = ConnectionRegistry::new();

            for op in ops {
                match op {
                    Op::Register(session) => {
                        registry.register_session(session, addr(1));
                    },
                    Op::Authenticate(session, participant) => {
                        let participant = id(&format!("10.0.0.{participant}"));
                        registry.authenticate(session, participant, "N".into());
                    },
                    Op::Unregister(session) => {
                        registry.unregister_session(session);
                    },
                }

                let live: BTreeSet<&ParticipantId> = registry
                    .authenticated_sessions()
                    .into_iter()
                    .filter_map(|session| registry.participant(session))
                    .collect();
                let listed: BTreeSet<&ParticipantId> =
                    registry.roster().iter().map(|entry| &entry.id).collect();

                prop_assert_eq!(registry.roster().len(), listed.len(), "roster has duplicates");
                prop_assert_eq!(listed, live);
            }
        }
    }
}
