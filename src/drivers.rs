//! Capability seams consumed by the funnel.
//!
//! The core never touches markup, DOM selection, or payment mechanics
//! directly; it depends only on these traits. Production adapters live in
//! `adapters`; tests supply scripted doubles.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{Acquisition, Credential, Session};
use crate::error::Result;

/// Outcome of waiting for one of several page conditions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitEvent {
    /// One of the requested selectors appeared
    Selector(String),
    /// The page navigated before any selector appeared
    Navigation,
}

/// Account login/logout capability. `login` creates a live session the
/// caller owns; every created session must be passed to `logout` exactly
/// once.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(&self, credential: &Credential, identity: Option<&str>) -> Result<Session>;

    async fn logout(&self, session: &Session) -> Result<()>;
}

/// Page/session primitives the queue driver and pipeline are built on
#[async_trait]
pub trait SessionDriver: Send + Sync {
    async fn navigate(&self, session: &Session, url: &str) -> Result<()>;

    /// True if any of the selectors is currently present
    async fn is_present(&self, session: &Session, selectors: &[&str]) -> Result<bool>;

    /// Activate the first matching element
    async fn click(&self, session: &Session, selectors: &[&str]) -> Result<()>;

    /// Text content of the first matching element, if any
    async fn read_text(&self, session: &Session, selectors: &[&str]) -> Result<Option<String>>;

    /// Wait until one of the selectors appears or a navigation happens,
    /// bounded by `timeout`. Errors on bound exhaustion.
    async fn wait_for_any(
        &self,
        session: &Session,
        selectors: &[&str],
        timeout: Duration,
    ) -> Result<WaitEvent>;

    /// Reload the current page, bounded by `timeout`
    async fn reload(&self, session: &Session, timeout: Duration) -> Result<()>;
}

/// Bounded HTTP GET through an optional identity
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, identity: Option<&str>) -> Result<String>;
}

/// Checkout capability invoked once a session has been admitted
#[async_trait]
pub trait Acquirer: Send + Sync {
    async fn acquire(&self, session: &Session, ticket_count: u32) -> Result<Acquisition>;
}
