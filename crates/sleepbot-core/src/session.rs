use chrono::{DateTime, Duration};
use chrono_tz::Tz;

use crate::{
    classifier::{classify, Category},
    domain::UserId,
};

/// One in-progress sleep for one user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SleepSession {
    pub user_id: UserId,
    pub start_time: DateTime<Tz>,
}

impl SleepSession {
    pub fn new(user_id: UserId, start_time: DateTime<Tz>) -> Self {
        Self {
            user_id,
            start_time,
        }
    }

    /// Close the session at `end_time`.
    pub fn finish(&self, end_time: DateTime<Tz>) -> SleepSummary {
        SleepSummary {
            start_time: self.start_time,
            end_time,
            duration: SleepDuration::between(&self.start_time, &end_time),
            category: classify(&self.start_time),
        }
    }
}

/// What a finished session reports. Never stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SleepSummary {
    pub start_time: DateTime<Tz>,
    pub end_time: DateTime<Tz>,
    pub duration: SleepDuration,
    pub category: Category,
}

/// Elapsed time in whole hours and minutes; seconds are truncated.
///
/// `clock_skew` is set when the end was observed before the start. The
/// duration is then reported as zero rather than negative.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SleepDuration {
    pub hours: i64,
    pub minutes: i64,
    pub clock_skew: bool,
}

impl SleepDuration {
    pub fn between(start: &DateTime<Tz>, end: &DateTime<Tz>) -> Self {
        Self::from_elapsed(end.signed_duration_since(*start))
    }

    pub fn from_elapsed(elapsed: Duration) -> Self {
        let total_minutes = elapsed.num_minutes();
        if elapsed < Duration::zero() {
            return Self {
                hours: 0,
                minutes: 0,
                clock_skew: true,
            };
        }
        Self {
            hours: total_minutes / 60,
            minutes: total_minutes % 60,
            clock_skew: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Europe::Berlin;

    use super::*;

    fn at(day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Tz> {
        Berlin
            .with_ymd_and_hms(2025, 6, day, hour, minute, second)
            .single()
            .unwrap()
    }

    #[test]
    fn truncates_to_whole_minutes() {
        let d = SleepDuration::between(&at(1, 6, 10, 0), &at(1, 8, 45, 59));
        assert_eq!((d.hours, d.minutes, d.clock_skew), (2, 35, false));
    }

    #[test]
    fn keeps_hours_beyond_a_day() {
        let d = SleepDuration::between(&at(1, 22, 0, 0), &at(2, 23, 5, 0));
        assert_eq!((d.hours, d.minutes), (25, 5));
    }

    #[test]
    fn end_before_start_is_flagged_not_negative() {
        let d = SleepDuration::between(&at(1, 8, 0, 0), &at(1, 7, 30, 0));
        assert_eq!((d.hours, d.minutes, d.clock_skew), (0, 0, true));
    }

    #[test]
    fn summary_classifies_on_start_time() {
        let session = SleepSession::new(UserId(1), at(1, 17, 30, 0));
        let summary = session.finish(at(1, 19, 0, 0));
        assert_eq!(summary.category, Category::Day);
        assert_eq!(summary.start_time, session.start_time);
        assert_eq!((summary.duration.hours, summary.duration.minutes), (1, 30));
    }

    #[test]
    fn cross_midnight_uses_full_timestamps() {
        let session = SleepSession::new(UserId(1), at(1, 22, 0, 0));
        let summary = session.finish(at(2, 6, 15, 0));
        assert_eq!(summary.category, Category::Night);
        assert_eq!((summary.duration.hours, summary.duration.minutes), (8, 15));
    }
}
