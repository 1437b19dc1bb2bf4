mod account;
mod outcome;
mod session;
mod state;

pub use account::Credential;
pub use outcome::{Acquisition, AttemptOutcome};
pub use session::{Session, SessionId};
pub use state::QueueState;
