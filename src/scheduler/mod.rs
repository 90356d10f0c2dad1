//! Daily post scheduling with per-job jitter
//!
//! The schedule is a fixed table of jobs, each firing once a day at its base
//! time plus a jitter offset drawn when the scheduler is built. The pure
//! [`JitteredScheduler::tick`] takes the current time as an argument, which
//! keeps the timing logic testable without sleeping; [`JitteredScheduler::run`]
//! wraps it in a 30-second polling loop.
//!
//! # Job lifecycle
//!
//! ```text
//!   Idle ──arm(now)──► Armed(next) ──tick(now >= next)──► fired ──► Armed(next + 1 day)
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use pulsecast::scheduler::{parse_jobs, JitteredScheduler, JobSpec};
//!
//! let jobs = parse_jobs(&JobSpec::defaults())?;
//! let mut scheduler = JitteredScheduler::new(jobs, offset, &mut rand::thread_rng());
//!
//! for job in scheduler.tick(now) {
//!     println!("due: {}", job.name);
//! }
//! ```
//!
//! # Modules
//!
//! - [`job`] - Post kinds, categories and the job table
//! - [`timetable`] - Jitter, next-occurrence math and the scheduler state
//! - [`runner`] - The polling loop and the [`JobHandler`] seam
//! - [`error`] - Startup validation errors

pub mod error;
pub mod job;
pub mod runner;
pub mod timetable;

pub use error::{SchedulerError, SchedulerResult};
pub use job::{parse_jobs, Category, JobSpec, PostKind, ScheduledJob};
pub use runner::{JobHandler, JobOutcome, DEFAULT_POLL_INTERVAL};
pub use timetable::{
    jittered_time, next_occurrence, parse_utc_offset, JitteredScheduler, JobState, TimetableEntry,
};
