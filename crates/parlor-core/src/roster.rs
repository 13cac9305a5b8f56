//! Participant roster.

use crate::ParticipantId;

/// One connected participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Participant id.
    pub id: ParticipantId,
    /// Name to show in room lists.
    pub display_name: String,
}

impl RosterEntry {
    /// Create an entry.
    pub fn new(id: impl Into<ParticipantId>, display_name: impl Into<String>) -> Self {
        Self { id: id.into(), display_name: display_name.into() }
    }
}

/// Ordered snapshot of connected participants.
///
/// Replaced wholesale on every roster event. Order is whatever the server sent
/// and carries no meaning beyond display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    entries: Vec<RosterEntry>,
}

impl Roster {
    /// Empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from positional `(id, display name)` pairs as carried on the wire.
    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<ParticipantId>,
        B: Into<String>,
    {
        Self { entries: pairs.into_iter().map(|(id, name)| RosterEntry::new(id, name)).collect() }
    }

    /// All entries in server order.
    pub fn entries(&self) -> &[RosterEntry] {
        &self.entries
    }

    /// Entries other than `self_id`, in server order.
    pub fn peers<'a>(
        &'a self,
        self_id: &'a ParticipantId,
    ) -> impl Iterator<Item = &'a RosterEntry> + 'a {
        self.entries.iter().filter(move |entry| &entry.id != self_id)
    }

    /// Entry for `id`. `None` if not connected.
    pub fn get(&self, id: &ParticipantId) -> Option<&RosterEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    /// True if `id` is in the roster.
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.get(id).is_some()
    }

    /// Number of entries, self included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nobody is connected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<RosterEntry> for Roster {
    fn from_iter<T: IntoIterator<Item = RosterEntry>>(iter: T) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_pairs_preserves_order() {
        let roster = Roster::from_pairs([("10.0.0.3", "Carol"), ("10.0.0.1", "Me")]);

        let ids: Vec<_> = roster.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["10.0.0.3", "10.0.0.1"]);
    }

    #[test]
    fn peers_excludes_self() {
        let me = ParticipantId::from("10.0.0.1");
        let roster = Roster::from_pairs([("10.0.0.2", "Alice"), ("10.0.0.1", "Me")]);

        let peers: Vec<_> = roster.peers(&me).map(|e| e.display_name.as_str()).collect();
        assert_eq!(peers, ["Alice"]);
    }

    #[test]
    fn lookup_by_id() {
        let roster = Roster::from_pairs([("10.0.0.2", "Alice")]);

        assert_eq!(
            roster.get(&"10.0.0.2".into()).map(|e| e.display_name.as_str()),
            Some("Alice")
        );
        assert!(!roster.contains(&"10.0.0.9".into()));
    }
}
