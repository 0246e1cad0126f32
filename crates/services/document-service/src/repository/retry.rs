//! Delete retry policy.

use std::time::Duration;

use reqwest::StatusCode;

use common::RetryConfig;
use domain::{DEFAULT_DELETE_MAX_ATTEMPTS, DEFAULT_DELETE_RETRY_DELAY_MS};

/// Statuses that end a delete successfully. Not Found counts: the document is
/// already gone.
pub const DELETE_ACCEPTED_STATUSES: [StatusCode; 5] = [
    StatusCode::OK,
    StatusCode::CREATED,
    StatusCode::ACCEPTED,
    StatusCode::NO_CONTENT,
    StatusCode::NOT_FOUND,
];

/// Check if a delete status is terminal success
pub fn is_accepted_delete_status(status: StatusCode) -> bool {
    DELETE_ACCEPTED_STATUSES.contains(&status)
}

/// Bounded fixed-backoff retry for deletes.
///
/// Stops at the first accepted status. Failed calls and unexpected statuses
/// are retried until `max_attempts` calls have been made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Decide whether another attempt should be made.
    ///
    /// `attempts_made` counts calls already issued; `last_status` is the status
    /// of the latest call, `None` when there was no call yet or it failed.
    pub fn should_retry(&self, attempts_made: u32, last_status: Option<StatusCode>) -> bool {
        if last_status.is_some_and(is_accepted_delete_status) {
            return false;
        }
        attempts_made < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_DELETE_MAX_ATTEMPTS,
            Duration::from_millis(DEFAULT_DELETE_RETRY_DELAY_MS),
        )
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
    }
}
