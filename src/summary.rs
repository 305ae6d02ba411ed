//! Invocation result: counts plus a multi-status code.

use crate::processor::BatchOutcome;
use serde::{Deserialize, Serialize};

/// Every item succeeded.
pub const STATUS_OK: u16 = 200;
/// At least one failure unit was recorded.
pub const STATUS_MULTI: u16 = 207;

/// What an invocation returns to its caller.
///
/// Serializes as `{"statusCode": 200, "processed": 3, "failed": 0}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub processed: usize,
    pub failed: usize,
}

impl ResultSummary {
    pub fn is_partial(&self) -> bool {
        self.status_code == STATUS_MULTI
    }
}

/// `200` when nothing failed, `207` otherwise.
pub fn aggregate(outcome: BatchOutcome) -> ResultSummary {
    ResultSummary {
        status_code: if outcome.failed == 0 {
            STATUS_OK
        } else {
            STATUS_MULTI
        },
        processed: outcome.processed,
        failed: outcome.failed,
    }
}

impl From<BatchOutcome> for ResultSummary {
    fn from(outcome: BatchOutcome) -> Self {
        aggregate(outcome)
    }
}
