//! Jittered daily timetable
//!
//! Each job's fire time is its base time shifted by a random number of
//! minutes drawn once at construction, so posts land at slightly different
//! times than the round hour but keep that time every day.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, NaiveTime, TimeZone};
use rand::Rng;
use std::fmt;

use super::error::{SchedulerError, SchedulerResult};
use super::job::ScheduledJob;

/// Per-job runtime state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Not yet armed
    Idle,
    /// Waiting for its next occurrence
    Armed { next_fire_at: DateTime<FixedOffset> },
}

#[derive(Debug, Clone)]
struct Slot {
    job: ScheduledJob,
    fire_time: NaiveTime,
    state: JobState,
    last_fired_at: Option<DateTime<FixedOffset>>,
}

/// One printable row of the timetable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableEntry {
    pub name: String,
    pub base_time: NaiveTime,
    pub fire_time: NaiveTime,
    pub next_fire_at: Option<DateTime<FixedOffset>>,
}

impl fmt::Display for TimetableEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<18} base {}  fires {}",
            self.name,
            self.base_time.format("%H:%M"),
            self.fire_time.format("%H:%M")
        )?;
        if let Some(next) = self.next_fire_at {
            write!(f, "  next {}", next.format("%Y-%m-%d %H:%M %:z"))?;
        }
        Ok(())
    }
}

/// Parse a `+HH:MM` / `-HH:MM` offset
pub fn parse_utc_offset(value: &str) -> SchedulerResult<FixedOffset> {
    let invalid = || SchedulerError::InvalidUtcOffset {
        value: value.to_string(),
    };

    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match trimmed.chars().next() {
        Some('+') => (1, &trimmed[1..]),
        Some('-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };
    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if !(0..=14).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Shift `base` by a uniform draw in `[-jitter, +jitter]` minutes, wrapping at midnight
pub fn jittered_time<R: Rng + ?Sized>(base: NaiveTime, jitter_minutes: u32, rng: &mut R) -> NaiveTime {
    if jitter_minutes == 0 {
        return base;
    }
    let jitter = i64::from(jitter_minutes);
    let shift = rng.gen_range(-jitter..=jitter);
    base.overflowing_add_signed(Duration::minutes(shift)).0
}

fn at_local(offset: FixedOffset, local: NaiveDateTime) -> DateTime<FixedOffset> {
    offset.from_utc_datetime(&(local - Duration::seconds(i64::from(offset.local_minus_utc()))))
}

/// Next occurrence of `time` strictly after `now`
pub fn next_occurrence(time: NaiveTime, now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let offset = *now.offset();
    let today = at_local(offset, now.date_naive().and_time(time));
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

/// Daily scheduler over a fixed job table
pub struct JitteredScheduler {
    slots: Vec<Slot>,
    offset: FixedOffset,
}

impl JitteredScheduler {
    /// Draw each job's fire time once; jobs start `Idle`
    pub fn new<R: Rng + ?Sized>(jobs: Vec<ScheduledJob>, offset: FixedOffset, rng: &mut R) -> Self {
        let slots = jobs
            .into_iter()
            .map(|job| Slot {
                fire_time: jittered_time(job.base_time, job.jitter_minutes, rng),
                job,
                state: JobState::Idle,
                last_fired_at: None,
            })
            .collect();

        Self { slots, offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Arm every idle job for its next occurrence after `now`
    pub fn arm(&mut self, now: DateTime<FixedOffset>) {
        for slot in &mut self.slots {
            if slot.state == JobState::Idle {
                slot.state = JobState::Armed {
                    next_fire_at: next_occurrence(slot.fire_time, now),
                };
            }
        }
    }

    /// Return the jobs due at `now`, in declaration order, re-arming each for the next day
    ///
    /// Idle jobs are armed first and therefore never fire on the tick that
    /// arms them.
    pub fn tick(&mut self, now: DateTime<FixedOffset>) -> Vec<&ScheduledJob> {
        self.arm(now);

        let mut due = Vec::new();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let JobState::Armed { next_fire_at } = slot.state else {
                continue;
            };
            if next_fire_at <= now {
                slot.last_fired_at = Some(now);
                slot.state = JobState::Armed {
                    next_fire_at: next_occurrence(slot.fire_time, now),
                };
                tracing::debug!(job = %slot.job.name, "Job due");
                due.push(index);
            }
        }

        due.into_iter().map(|index| &self.slots[index].job).collect()
    }

    /// When the named job last fired
    pub fn last_fired_at(&self, name: &str) -> Option<DateTime<FixedOffset>> {
        self.slots
            .iter()
            .find(|s| s.job.name == name)
            .and_then(|s| s.last_fired_at)
    }

    /// State of the named job
    pub fn state(&self, name: &str) -> Option<JobState> {
        self.slots.iter().find(|s| s.job.name == name).map(|s| s.state)
    }

    /// Jittered fire time of the named job
    pub fn fire_time(&self, name: &str) -> Option<NaiveTime> {
        self.slots.iter().find(|s| s.job.name == name).map(|s| s.fire_time)
    }

    /// The soonest armed job
    pub fn next_due(&self) -> Option<(&ScheduledJob, DateTime<FixedOffset>)> {
        self.slots
            .iter()
            .filter_map(|slot| match slot.state {
                JobState::Armed { next_fire_at } => Some((&slot.job, next_fire_at)),
                JobState::Idle => None,
            })
            .min_by_key(|(_, at)| *at)
    }

    /// Rows in declaration order
    pub fn timetable(&self) -> Vec<TimetableEntry> {
        self.slots
            .iter()
            .map(|slot| TimetableEntry {
                name: slot.job.name.clone(),
                base_time: slot.job.base_time,
                fire_time: slot.fire_time,
                next_fire_at: match slot.state {
                    JobState::Armed { next_fire_at } => Some(next_fire_at),
                    JobState::Idle => None,
                },
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::job::{parse_jobs, JobSpec, PostKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        ist().with_ymd_and_hms(2025, 3, day, hour, minute, 0).unwrap()
    }

    fn exact_jobs() -> Vec<ScheduledJob> {
        let specs: Vec<JobSpec> = JobSpec::defaults()
            .into_iter()
            .map(|s| JobSpec { jitter_minutes: 0, ..s })
            .collect();
        parse_jobs(&specs).unwrap()
    }

    fn scheduler(jobs: Vec<ScheduledJob>) -> JitteredScheduler {
        JitteredScheduler::new(jobs, ist(), &mut ChaCha8Rng::seed_from_u64(1))
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("+05:30").unwrap(), ist());
        assert_eq!(
            parse_utc_offset("-04:00").unwrap(),
            FixedOffset::west_opt(4 * 3600).unwrap()
        );
        assert_eq!(parse_utc_offset("UTC").unwrap(), FixedOffset::east_opt(0).unwrap());
        assert!(parse_utc_offset("05:30").is_err());
        assert!(parse_utc_offset("+5").is_err());
        assert!(parse_utc_offset("+05:75").is_err());
    }

    #[test]
    fn test_next_occurrence_same_day_and_next_day() {
        let time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        assert_eq!(next_occurrence(time, at(1, 8, 0)), at(1, 9, 0));
        assert_eq!(next_occurrence(time, at(1, 9, 0)), at(2, 9, 0));
        assert_eq!(next_occurrence(time, at(1, 23, 0)), at(2, 9, 0));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let base = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..500 {
            let t = jittered_time(base, 5, &mut rng);
            let diff = (t - base).num_minutes();
            assert!((-5..=5).contains(&diff), "diff {diff}");
        }
    }

    #[test]
    fn test_jitter_wraps_around_midnight() {
        let base = NaiveTime::from_hms_opt(0, 2, 0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut wrapped = false;
        for _ in 0..200 {
            let t = jittered_time(base, 5, &mut rng);
            if t > NaiveTime::from_hms_opt(23, 0, 0).unwrap() {
                wrapped = true;
                assert!(t >= NaiveTime::from_hms_opt(23, 57, 0).unwrap());
            } else {
                assert!(t <= NaiveTime::from_hms_opt(0, 7, 0).unwrap());
            }
        }
        assert!(wrapped);
    }

    #[test]
    fn test_fire_time_drawn_once() {
        let jobs = parse_jobs(&JobSpec::defaults()).unwrap();
        let mut scheduler = scheduler(jobs);
        let before = scheduler.fire_time("good_morning").unwrap();

        scheduler.tick(at(1, 0, 0));
        scheduler.tick(at(2, 0, 0));
        scheduler.tick(at(3, 0, 0));

        assert_eq!(scheduler.fire_time("good_morning"), Some(before));
    }

    #[test]
    fn test_tick_arms_idle_jobs_without_firing() {
        let mut scheduler = scheduler(exact_jobs());
        assert_eq!(scheduler.state("market_open"), Some(JobState::Idle));

        let fired = scheduler.tick(at(1, 9, 0));
        assert!(fired.is_empty());
        assert_eq!(
            scheduler.state("market_open"),
            Some(JobState::Armed { next_fire_at: at(2, 9, 0) })
        );
    }

    #[test]
    fn test_job_fires_once_and_rearms_for_next_day() {
        let mut scheduler = scheduler(exact_jobs());
        scheduler.arm(at(1, 8, 0));

        assert!(scheduler.tick(at(1, 8, 59)).is_empty());

        let fired: Vec<_> = scheduler
            .tick(at(1, 9, 0))
            .into_iter()
            .map(|j| j.kind)
            .collect();
        assert_eq!(fired, vec![PostKind::MarketOpen]);

        assert!(scheduler.tick(at(1, 9, 1)).is_empty());
        assert_eq!(
            scheduler.state("market_open"),
            Some(JobState::Armed { next_fire_at: at(2, 9, 0) })
        );
    }

    #[test]
    fn test_simultaneous_jobs_fire_in_declaration_order() {
        let mut scheduler = scheduler(exact_jobs());
        scheduler.arm(at(1, 6, 0));

        // A stalled loop catches up with everything due by noon
        let fired: Vec<_> = scheduler
            .tick(at(1, 12, 0))
            .into_iter()
            .map(|j| j.name.clone())
            .collect();
        assert_eq!(fired, vec!["good_morning", "market_open", "global_news"]);
    }

    #[test]
    fn test_next_due_and_timetable() {
        let mut scheduler = scheduler(exact_jobs());
        scheduler.arm(at(1, 10, 0));

        let (job, when) = scheduler.next_due().unwrap();
        assert_eq!(job.name, "global_news");
        assert_eq!(when, at(1, 11, 0));

        let rows = scheduler.timetable();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].next_fire_at, Some(at(2, 7, 0)));
        assert!(rows[0].to_string().contains("good_morning"));
    }
}
