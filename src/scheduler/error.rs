//! Error types for the scheduler module

use std::fmt;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler configuration errors, all fatal at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// Job time is not a valid `HH:MM`
    InvalidTime { job: String, value: String },

    /// Two jobs share a name
    DuplicateJob { name: String },

    /// A required post kind has no job
    MissingJob { kind: String },

    /// Jitter would let a job drift by half a day or more
    InvalidJitter { job: String, minutes: u32 },

    /// UTC offset is not `+HH:MM` / `-HH:MM`
    InvalidUtcOffset { value: String },
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTime { job, value } => {
                write!(f, "Invalid time '{}' for job '{}'. Expected HH:MM", value, job)
            }
            Self::DuplicateJob { name } => {
                write!(f, "Duplicate job name '{}'", name)
            }
            Self::MissingJob { kind } => {
                write!(f, "No job scheduled for required post kind '{}'", kind)
            }
            Self::InvalidJitter { job, minutes } => {
                write!(f, "Jitter of {} minutes for job '{}' must be below 720", minutes, job)
            }
            Self::InvalidUtcOffset { value } => {
                write!(f, "Invalid UTC offset '{}'. Expected +HH:MM or -HH:MM", value)
            }
        }
    }
}

impl std::error::Error for SchedulerError {}

impl SchedulerError {
    /// Create an invalid time error
    pub fn invalid_time(job: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidTime {
            job: job.into(),
            value: value.into(),
        }
    }

    /// Create a duplicate job error
    pub fn duplicate_job(name: impl Into<String>) -> Self {
        Self::DuplicateJob { name: name.into() }
    }

    /// Create a missing job error
    pub fn missing_job(kind: impl Into<String>) -> Self {
        Self::MissingJob { kind: kind.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_time_error() {
        let err = SchedulerError::invalid_time("good_morning", "7am");
        assert!(err.to_string().contains("7am"));
        assert!(err.to_string().contains("good_morning"));
        assert!(err.to_string().contains("HH:MM"));
    }

    #[test]
    fn test_duplicate_job_error() {
        let err = SchedulerError::duplicate_job("market_open");
        assert_eq!(err.to_string(), "Duplicate job name 'market_open'");
    }

    #[test]
    fn test_missing_job_error() {
        let err = SchedulerError::missing_job("good_night");
        assert!(err.to_string().contains("good_night"));
    }
}
