//! Rooms and canonical pairwise room keys.

use std::{fmt, str::FromStr};

use thiserror::Error;

use crate::ParticipantId;

/// Name accepted by [`Room::parse_target`] for the general room.
pub const GENERAL_TARGET: &str = "general";

/// A logical message space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Room {
    /// Shared broadcast room every participant sees.
    #[default]
    General,
    /// One-to-one room with the given peer.
    Direct(ParticipantId),
}

/// Errors from [`Room::parse_target`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TargetError {
    /// Nothing to select.
    #[error("no participant given")]
    Empty,

    /// The id could never appear in a pairwise room key.
    #[error("participant ids cannot contain '{ROOM_KEY_SEPARATOR}': {0}")]
    Separator(String),
}

impl Room {
    /// Interpret a user-supplied selection target.
    ///
    /// `"general"` (any case) selects the general room; anything else is taken
    /// as a peer id, whether or not that peer is in the roster. Ids holding
    /// [`ROOM_KEY_SEPARATOR`] are rejected since their room key would not
    /// parse.
    pub fn parse_target(target: &str) -> Result<Self, TargetError> {
        let target = target.trim();
        if target.is_empty() {
            return Err(TargetError::Empty);
        }
        if target.eq_ignore_ascii_case(GENERAL_TARGET) {
            return Ok(Self::General);
        }
        if target.contains(ROOM_KEY_SEPARATOR) {
            return Err(TargetError::Separator(target.to_owned()));
        }
        Ok(Self::Direct(ParticipantId::from(target)))
    }

    /// Peer of a direct room. `None` for the general room.
    pub fn peer(&self) -> Option<&ParticipantId> {
        match self {
            Self::General => None,
            Self::Direct(peer) => Some(peer),
        }
    }

    /// True for direct rooms.
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct(_))
    }
}

impl fmt::Display for Room {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => f.write_str("#general"),
            Self::Direct(peer) => write!(f, "@{peer}"),
        }
    }
}

/// Separator between the two members of a pairwise room key.
pub const ROOM_KEY_SEPARATOR: char = '_';

/// Errors from parsing a [`RoomKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomKeyError {
    /// Key has no separator, or more than one.
    #[error("room key must contain exactly one '{ROOM_KEY_SEPARATOR}': {0}")]
    Malformed(String),

    /// One side of the key is empty.
    #[error("room key has an empty member: {0}")]
    EmptyMember(String),

    /// Members are not in sorted order.
    #[error("room key is not canonical: {0}")]
    NotCanonical(String),
}

/// Canonical identifier of a pairwise room.
///
/// Both participants derive the same key: the two ids sorted and joined with
/// [`ROOM_KEY_SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomKey(String);

impl RoomKey {
    /// Key for the room shared by `a` and `b`, independent of argument order.
    pub fn pairwise(a: &ParticipantId, b: &ParticipantId) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{low}{ROOM_KEY_SEPARATOR}{high}"))
    }

    /// Key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two members, in canonical order.
    pub fn members(&self) -> (ParticipantId, ParticipantId) {
        match self.0.split_once(ROOM_KEY_SEPARATOR) {
            Some((low, high)) => (ParticipantId::from(low), ParticipantId::from(high)),
            None => (ParticipantId::from(self.0.as_str()), ParticipantId::from("")),
        }
    }

    /// True if `id` is one of the two members.
    pub fn contains(&self, id: &ParticipantId) -> bool {
        let (low, high) = self.members();
        &low == id || &high == id
    }

    /// The member that is not `id`. `None` if `id` is not a member.
    pub fn other(&self, id: &ParticipantId) -> Option<ParticipantId> {
        let (low, high) = self.members();
        if &low == id {
            Some(high)
        } else if &high == id {
            Some(low)
        } else {
            None
        }
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomKey {
    type Err = RoomKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((low, high)) = s.split_once(ROOM_KEY_SEPARATOR) else {
            return Err(RoomKeyError::Malformed(s.to_owned()));
        };
        if high.contains(ROOM_KEY_SEPARATOR) {
            return Err(RoomKeyError::Malformed(s.to_owned()));
        }
        if low.is_empty() || high.is_empty() {
            return Err(RoomKeyError::EmptyMember(s.to_owned()));
        }
        if low > high {
            return Err(RoomKeyError::NotCanonical(s.to_owned()));
        }
        Ok(Self(s.to_owned()))
    }
}
