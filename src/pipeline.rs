//! Multi-account acquisition funnel.
//!
//! Drives every configured account through login, queue entry, admission
//! wait, and the acquisition attempt, fan-in style: each stage collects the
//! accounts that survived it and the next stage runs only over those.
//! Per-account failures are contained at the account level; only a stage
//! left with no survivors aborts the attempt. Every session created by the
//! login stage is released exactly once on every exit path.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::control::StopSignal;
use crate::domain::{AttemptOutcome, Credential, Session};
use crate::drivers::{Acquirer, Authenticator};
use crate::queue::QueueDriver;
use crate::rotation::IdentityPool;

pub struct AcquisitionPipeline {
    authenticator: Arc<dyn Authenticator>,
    queue: Arc<QueueDriver>,
    acquirer: Arc<dyn Acquirer>,
    identities: Arc<IdentityPool>,
}

impl AcquisitionPipeline {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        queue: Arc<QueueDriver>,
        acquirer: Arc<dyn Acquirer>,
        identities: Arc<IdentityPool>,
    ) -> Self {
        Self {
            authenticator,
            queue,
            acquirer,
            identities,
        }
    }

    /// Run one full attempt across all accounts.
    ///
    /// Never returns an error: every failure mode is folded into the
    /// outcome, and cleanup of created sessions is unconditional.
    pub async fn run(
        &self,
        accounts: &[Credential],
        target: &str,
        ticket_count: u32,
        stop: &StopSignal,
    ) -> AttemptOutcome {
        info!(accounts = accounts.len(), target, "Starting acquisition attempt");

        let logged_in = self.login_stage(accounts, stop).await;
        if logged_in.is_empty() {
            warn!("Aborting attempt: no accounts logged in");
            return AttemptOutcome::failed("no accounts logged in");
        }

        let outcome = self
            .run_with_sessions(&logged_in, target, ticket_count, stop)
            .await;

        // Cleanup is deferred to here for all logged-in accounts uniformly,
        // regardless of how far the attempt progressed.
        self.cleanup(&logged_in).await;

        outcome
    }

    async fn run_with_sessions(
        &self,
        logged_in: &[Session],
        target: &str,
        ticket_count: u32,
        stop: &StopSignal,
    ) -> AttemptOutcome {
        let queued = self.queue_stage(logged_in, target, stop).await;
        if queued.is_empty() {
            warn!("Aborting attempt: no accounts queued");
            return AttemptOutcome::failed("no accounts queued");
        }

        let admitted = self.wait_stage(&queued, stop).await;
        if admitted.is_empty() {
            warn!("Aborting attempt: no accounts admitted");
            return AttemptOutcome::failed("no accounts admitted");
        }

        self.acquisition_stage(&admitted, ticket_count, stop).await
    }

    /// Sequential login fan-out. Each account gets a distinct round-robin
    /// identity when the pool allows; an individual failure excludes that
    /// account and nothing else.
    async fn login_stage(&self, accounts: &[Credential], stop: &StopSignal) -> Vec<Session> {
        let mut logged_in = Vec::new();

        for (i, account) in accounts.iter().enumerate() {
            if stop.is_stopped() {
                break;
            }

            let identity = self.identities.pick_for_index(i);
            match self
                .authenticator
                .login(account, identity.as_deref())
                .await
            {
                Ok(session) => {
                    info!(account = %account.username, "Logged in");
                    logged_in.push(session);
                }
                Err(e) => {
                    warn!(account = %account.username, "Login failed: {}", e);
                }
            }
        }

        logged_in
    }

    async fn queue_stage(
        &self,
        logged_in: &[Session],
        target: &str,
        stop: &StopSignal,
    ) -> Vec<Session> {
        let mut queued = Vec::new();

        for session in logged_in {
            if stop.is_stopped() {
                break;
            }

            match self.queue.enter_queue(session, target).await {
                Ok(state) => {
                    info!(account = %session.username, state = %state, "Entered queue");
                    queued.push(session.clone());
                }
                Err(e) => {
                    warn!(account = %session.username, "Queue entry failed: {}", e);
                }
            }
        }

        queued
    }

    async fn wait_stage(&self, queued: &[Session], stop: &StopSignal) -> Vec<Session> {
        let mut admitted = Vec::new();

        for session in queued {
            if stop.is_stopped() {
                break;
            }

            match self.queue.wait_for_access(session).await {
                Ok(_) => {
                    info!(account = %session.username, "Gained access to purchase");
                    admitted.push(session.clone());
                }
                Err(e) => {
                    warn!(account = %session.username, "Did not gain access: {}", e);
                }
            }
        }

        admitted
    }

    /// Iterate admitted accounts in order; the first success wins and stops
    /// the iteration. On failure the last error is recorded, not the first.
    async fn acquisition_stage(
        &self,
        admitted: &[Session],
        ticket_count: u32,
        stop: &StopSignal,
    ) -> AttemptOutcome {
        let mut last_error: Option<String> = None;

        for session in admitted {
            if stop.is_stopped() {
                break;
            }

            match self.acquirer.acquire(session, ticket_count).await {
                Ok(acquisition) => {
                    info!(
                        account = %session.username,
                        order_id = %acquisition.order_id,
                        "Acquisition succeeded"
                    );
                    return AttemptOutcome::succeeded(Some(acquisition.order_id));
                }
                Err(e) => {
                    warn!(account = %session.username, "Acquisition failed: {}", e);
                    last_error = Some(e.to_string());
                }
            }
        }

        AttemptOutcome::failed(
            last_error.unwrap_or_else(|| "no acquisition attempts completed".to_string()),
        )
    }

    /// Release every session created by the login stage. Best-effort and
    /// isolated: one failed release never blocks the others, and a cleanup
    /// failure never masks the attempt's real outcome.
    async fn cleanup(&self, logged_in: &[Session]) {
        for session in logged_in {
            if let Err(e) = self.authenticator.logout(session).await {
                error!(account = %session.username, "Error releasing session: {}", e);
            }
        }
    }
}
