pub mod adapters;
pub mod config;
pub mod control;
pub mod domain;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod pipeline;
pub mod queue;
pub mod rotation;

pub use config::AppConfig;
pub use control::{StopController, StopSignal};
pub use domain::{Acquisition, AttemptOutcome, Credential, QueueState, Session, SessionId};
pub use drivers::{Acquirer, Authenticator, Fetcher, SessionDriver, WaitEvent};
pub use engine::BotEngine;
pub use error::{MatchdayError, QueueError, Result};
pub use monitor::{AvailabilityClassifier, TicketMonitor};
pub use pipeline::AcquisitionPipeline;
pub use queue::QueueDriver;
pub use rotation::{IdentityPool, PoolStats};
