//! Job status and the explicit transition table.
//!
//! Every status change goes through [`JobStatus::apply`], which validates the
//! requested edge against [`ALLOWED_TRANSITIONS`]. Illegal transitions are
//! rejected rather than silently overwriting fields.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Job execution status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted but not yet picked up. The engine never leaves a job here;
    /// the status exists for filtering and for rows written by older tooling.
    Pending,
    /// Currently executing.
    Processing,
    /// Finished successfully (terminal).
    Completed,
    /// The last delivery attempt failed; retry budget remains.
    Failed,
    /// Label for a failure that upstream redelivery will retry.
    Retrying,
    /// Retry budget exhausted (terminal).
    DeadLetter,
}

/// A lifecycle signal driving a status change.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum JobSignal {
    /// Execution of a delivery attempt begins.
    Start,
    /// The processing function succeeded.
    Succeed,
    /// The processing function failed; `budget_exhausted` is true when the
    /// incremented retry count has reached the job's retry budget.
    Fail { budget_exhausted: bool },
}

/// An illegal status transition was requested.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("illegal job transition: {from} -> {to}")]
pub struct TransitionError {
    pub from: JobStatus,
    pub to: JobStatus,
}

/// The set of legal status edges.
///
/// `completed` and `dead_letter` are terminal: no outgoing edges.
/// `failed -> failed` records a later delivery attempt failing again while
/// budget remains.
pub const ALLOWED_TRANSITIONS: &[(JobStatus, JobStatus)] = &[
    (JobStatus::Pending, JobStatus::Processing),
    (JobStatus::Processing, JobStatus::Completed),
    (JobStatus::Processing, JobStatus::Failed),
    (JobStatus::Processing, JobStatus::DeadLetter),
    (JobStatus::Failed, JobStatus::Failed),
    (JobStatus::Failed, JobStatus::Retrying),
    (JobStatus::Failed, JobStatus::DeadLetter),
    (JobStatus::Retrying, JobStatus::Processing),
    (JobStatus::Retrying, JobStatus::DeadLetter),
];

impl JobStatus {
    /// Apply a signal, returning the next status or rejecting the edge.
    pub fn apply(self, signal: JobSignal) -> Result<JobStatus, TransitionError> {
        let to = match signal {
            JobSignal::Start => JobStatus::Processing,
            JobSignal::Succeed => JobStatus::Completed,
            JobSignal::Fail {
                budget_exhausted: true,
            } => JobStatus::DeadLetter,
            JobSignal::Fail {
                budget_exhausted: false,
            } => JobStatus::Failed,
        };

        if ALLOWED_TRANSITIONS.contains(&(self, to)) {
            Ok(to)
        } else {
            Err(TransitionError { from: self, to })
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::DeadLetter)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Retrying => "retrying",
            JobStatus::DeadLetter => "dead_letter",
        }
    }
}

impl core::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unknown status string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown job status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(JobStatus::Pending),
            "processing" => Ok(JobStatus::Processing),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            "retrying" => Ok(JobStatus::Retrying),
            "dead_letter" => Ok(JobStatus::DeadLetter),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_path() {
        let s = JobStatus::Processing.apply(JobSignal::Succeed).unwrap();
        assert_eq!(s, JobStatus::Completed);
        assert!(s.is_terminal());
    }

    #[test]
    fn failure_with_budget_left() {
        let s = JobStatus::Processing
            .apply(JobSignal::Fail {
                budget_exhausted: false,
            })
            .unwrap();
        assert_eq!(s, JobStatus::Failed);
        assert!(!s.is_terminal());
    }

    #[test]
    fn failure_with_budget_exhausted() {
        let s = JobStatus::Failed
            .apply(JobSignal::Fail {
                budget_exhausted: true,
            })
            .unwrap();
        assert_eq!(s, JobStatus::DeadLetter);
    }

    #[test]
    fn terminal_states_reject_all_signals() {
        for terminal in [JobStatus::Completed, JobStatus::DeadLetter] {
            for signal in [
                JobSignal::Start,
                JobSignal::Succeed,
                JobSignal::Fail {
                    budget_exhausted: false,
                },
                JobSignal::Fail {
                    budget_exhausted: true,
                },
            ] {
                let err = terminal.apply(signal).unwrap_err();
                assert_eq!(err.from, terminal);
            }
        }
    }

    #[test]
    fn completed_never_regresses_to_failed() {
        let err = JobStatus::Completed
            .apply(JobSignal::Fail {
                budget_exhausted: false,
            })
            .unwrap_err();
        assert_eq!(err.to, JobStatus::Failed);
    }

    #[test]
    fn status_string_round_trip() {
        for s in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
            JobStatus::Retrying,
            JobStatus::DeadLetter,
        ] {
            assert_eq!(s.as_str().parse::<JobStatus>().unwrap(), s);
        }
        assert!("bogus".parse::<JobStatus>().is_err());
    }
}
