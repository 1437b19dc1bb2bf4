use uuid::Uuid;

/// Identifier for one live authenticated session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to one authenticated agent connection.
///
/// Created by `Authenticator::login`, owned by the pipeline for the duration
/// of one attempt, and released exactly once per creation via
/// `Authenticator::logout` regardless of which stage failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: SessionId,
    pub username: String,
}

impl Session {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            username: username.into(),
        }
    }
}
