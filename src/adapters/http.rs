use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::drivers::Fetcher;
use crate::error::{MatchdayError, Result};

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// Bounded HTTP GET adapter over reqwest.
///
/// Builds a fresh client per call when an identity is supplied, since
/// reqwest binds proxies at client construction.
pub struct HttpFetcher {
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn build_client(&self, identity: Option<&str>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(self.timeout)
            .user_agent(random_user_agent());

        if let Some(address) = identity {
            // Reject malformed proxy addresses before reqwest sees them
            Url::parse(address)
                .map_err(|e| MatchdayError::Validation(format!("invalid identity '{address}': {e}")))?;
            builder = builder.proxy(Proxy::all(address)?);
        }

        builder
            .build()
            .map_err(MatchdayError::Transport)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, identity: Option<&str>) -> Result<String> {
        debug!(url, identity = identity.unwrap_or("none"), "Fetching");
        let client = self.build_client(identity)?;
        let response = client.get(url).send().await?;
        let body = response.text().await?;
        Ok(body)
    }
}

fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}
