use serde::{Deserialize, Serialize};

/// Result contract returned by every stage and by the pipeline as a whole.
///
/// `error` is `None` iff `success` is true; on failure it carries the last
/// concrete error from the acquisition stage, not the first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub order_id: Option<String>,
}

impl AttemptOutcome {
    pub fn succeeded(order_id: Option<String>) -> Self {
        Self {
            success: true,
            error: None,
            order_id,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            order_id: None,
        }
    }
}

/// Successful acquisition record returned by the `Acquirer` capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Acquisition {
    pub order_id: String,
}
