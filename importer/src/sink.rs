use std::fmt::{Display, Formatter};

use common::store::ApplyOutcome;

use crate::errors::ImportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The unit never described a valid product, nothing was attempted
    Rejected,
    /// Storage kept failing until the attempt budget ran out
    Exhausted { attempts: u32 },
}

impl Display for FailureKind {
    fn fmt(&self, formatter: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Rejected => write!(formatter, "rejected"),
            Self::Exhausted { attempts } => write!(formatter, "exhausted after {attempts} attempts"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermanentFailure {
    /// Product name as sent, `None` when the unit carried none
    pub name: Option<String>,
    pub error: String,
    pub kind: FailureKind,
}

/// Where the worker reports what happened to each unit.
///
/// A unit ends in exactly one `on_applied` or one `on_permanent_failure`
/// call, with zero or more `on_retry` calls before it.
pub trait ImportSink: Send + Sync {
    fn on_applied(&self, name: &str, outcome: ApplyOutcome);

    fn on_retry(&self, name: &str, attempt: u32, error: &ImportError);

    fn on_permanent_failure(&self, failure: PermanentFailure);
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_kinds_read_well_in_logs() {
        assert_eq!(FailureKind::Rejected.to_string(), "rejected");
        assert_eq!(
            FailureKind::Exhausted { attempts: 3 }.to_string(),
            "exhausted after 3 attempts"
        );
    }
}
