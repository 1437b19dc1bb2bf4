//! Outer monitor loop.
//!
//! One logical worker: poll availability, and when a window opens run one
//! full acquisition attempt across all accounts. A cycle that errors is
//! logged and retried after a fixed backoff; the process never terminates
//! on a single cycle's failure.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::control::StopSignal;
use crate::domain::Credential;
use crate::monitor::TicketMonitor;
use crate::pipeline::AcquisitionPipeline;
use crate::rotation::IdentityPool;

/// Backoff after a failed cycle
const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Adjacent tickets to acquire per attempt
const TICKET_COUNT: u32 = 2;

pub struct BotEngine {
    config: AppConfig,
    identities: Arc<IdentityPool>,
    monitor: TicketMonitor,
    pipeline: AcquisitionPipeline,
}

impl BotEngine {
    pub fn new(
        config: AppConfig,
        identities: Arc<IdentityPool>,
        monitor: TicketMonitor,
        pipeline: AcquisitionPipeline,
    ) -> Self {
        Self {
            config,
            identities,
            monitor,
            pipeline,
        }
    }

    /// Run the monitor loop until a stop is requested.
    ///
    /// The stop signal halts the loop before its next iteration; any attempt
    /// in flight finishes its own unconditional session cleanup first.
    pub async fn run(&self, mut stop: StopSignal) {
        info!(
            accounts = self.config.accounts.len(),
            identities = self.identities.stats().total,
            target = %self.config.target_match_url,
            "Starting ticket bot"
        );

        loop {
            if stop.is_stopped() {
                break;
            }

            let wait = match self.cycle(&stop).await {
                Ok(()) => Duration::from_millis(self.config.refresh_interval_ms),
                Err(e) => {
                    error!("Error in monitor loop: {}", e);
                    ERROR_BACKOFF
                }
            };

            tokio::select! {
                _ = stop.stopped() => break,
                _ = sleep(wait) => {}
            }
        }

        info!("Ticket bot stopped");
    }

    /// One monitor cycle: availability gate, then at most one attempt.
    async fn cycle(&self, stop: &StopSignal) -> crate::error::Result<()> {
        let identity = self.identities.pick_random();
        let target = &self.config.target_match_url;

        let available = match self.monitor.probe(target, identity.as_deref()).await {
            Ok(available) => available,
            Err(e) if e.is_transport() => {
                warn!("Monitoring error: {}", e);
                // A transport failure through a specific identity counts
                // against that identity, not against availability.
                if let Some(address) = identity.as_deref() {
                    self.identities.quarantine(address);
                }
                false
            }
            // Anything else is a bug in our own setup; surface it to the
            // outer loop for backoff instead of reading it as "sold out".
            Err(e) => return Err(e),
        };

        if !available {
            info!("No tickets available yet. Waiting...");
            return Ok(());
        }

        info!("Tickets detected! Initiating acquisition");
        let accounts: Vec<Credential> =
            self.config.accounts.iter().map(Credential::from).collect();

        let outcome = self
            .pipeline
            .run(&accounts, target, TICKET_COUNT, stop)
            .await;

        match serde_json::to_string(&outcome) {
            Ok(line) => info!(target: "matchday::attempt", outcome = %line),
            Err(e) => warn!("Failed to serialize attempt outcome: {}", e),
        }

        if outcome.success {
            info!(order_id = ?outcome.order_id, "Acquisition attempt succeeded");
        } else {
            warn!(
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "Acquisition attempt failed"
            );
        }

        Ok(())
    }
}
