use serde::Deserialize;

use crate::config::AccountConfig;

/// Username + secret pair for one account. Supplied externally, never
/// mutated by the funnel.
#[derive(Clone, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl From<&AccountConfig> for Credential {
    fn from(account: &AccountConfig) -> Self {
        Self {
            username: account.username.clone(),
            password: account.password.clone(),
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
