use async_trait::async_trait;
use std::time::Duration;

use crate::domain::{Acquisition, Credential, Session};
use crate::drivers::{Acquirer, Authenticator, SessionDriver, WaitEvent};
use crate::error::{MatchdayError, Result};

fn not_configured(operation: &str) -> MatchdayError {
    MatchdayError::Driver(format!(
        "{operation} requires a browser automation backend, none is configured"
    ))
}

/// Placeholder for deployments without a browser backend wired in.
///
/// Every operation fails with a `Driver` error, so the funnel degrades to
/// "no accounts logged in" instead of pretending to progress. Availability
/// monitoring is unaffected since it runs over plain HTTP.
pub struct UnconfiguredBrowser;

#[async_trait]
impl Authenticator for UnconfiguredBrowser {
    async fn login(&self, _credential: &Credential, _identity: Option<&str>) -> Result<Session> {
        Err(not_configured("login"))
    }

    async fn logout(&self, _session: &Session) -> Result<()> {
        Err(not_configured("logout"))
    }
}

#[async_trait]
impl SessionDriver for UnconfiguredBrowser {
    async fn navigate(&self, _session: &Session, _url: &str) -> Result<()> {
        Err(not_configured("navigate"))
    }

    async fn is_present(&self, _session: &Session, _selectors: &[&str]) -> Result<bool> {
        Err(not_configured("element detection"))
    }

    async fn click(&self, _session: &Session, _selectors: &[&str]) -> Result<()> {
        Err(not_configured("click"))
    }

    async fn read_text(&self, _session: &Session, _selectors: &[&str]) -> Result<Option<String>> {
        Err(not_configured("text read"))
    }

    async fn wait_for_any(
        &self,
        _session: &Session,
        _selectors: &[&str],
        _timeout: Duration,
    ) -> Result<WaitEvent> {
        Err(not_configured("wait"))
    }

    async fn reload(&self, _session: &Session, _timeout: Duration) -> Result<()> {
        Err(not_configured("reload"))
    }
}

#[async_trait]
impl Acquirer for UnconfiguredBrowser {
    async fn acquire(&self, _session: &Session, _ticket_count: u32) -> Result<Acquisition> {
        Err(not_configured("checkout"))
    }
}
