//! Actor identity and team membership

use std::fmt;

/// Unique identifier for an actor (broadcaster, target or listener owner)
///
/// Backed by a UUIDv7, so identifiers sort by creation time and can be
/// generated without coordination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId(u128);

impl ActorId {
    /// Generate a new UUIDv7-based ActorId
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsense_domain::ActorId;
    ///
    /// let id = ActorId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create an ActorId from a raw u128 value
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse an ActorId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUID string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Team (faction) discriminator used to filter event delivery
///
/// Comparison is plain equality: two actors without a team share
/// [`TeamId::NO_TEAM`] and therefore hear each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TeamId(u8);

impl TeamId {
    /// Identifier for actors that belong to no team
    pub const NO_TEAM: TeamId = TeamId(u8::MAX);

    /// Create a team identifier
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Get the raw value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Whether this is [`TeamId::NO_TEAM`]
    pub fn is_no_team(&self) -> bool {
        *self == Self::NO_TEAM
    }
}

impl Default for TeamId {
    fn default() -> Self {
        Self::NO_TEAM
    }
}

impl From<u8> for TeamId {
    fn from(id: u8) -> Self {
        Self(id)
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_no_team() {
            f.write_str("none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}
