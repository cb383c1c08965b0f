//! User-facing texts. Plain text, no parse mode.

use chrono::{DateTime, TimeZone};

use crate::session::{SleepDuration, SleepSummary};

pub const WELCOME: &str = "Welcome to Sleep Tracker 😴\nPress start when you go to sleep:";
pub const NOT_STARTED: &str = "You haven’t started sleeping yet 😅";
pub const CANCELED: &str = "Sleep tracking canceled. Ready when you are 💤";
pub const NEXT_NAP: &str = "Ready for next nap? 😴";

/// Local wall-clock time as `HH:MM` (24-hour).
pub fn clock_time<Tz: TimeZone>(t: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    t.format("%H:%M").to_string()
}

pub fn started(start_time: &DateTime<chrono_tz::Tz>) -> String {
    format!("Sleep started at {} 💤", clock_time(start_time))
}

/// `<H>h <M>m`, with a marker when the clock went backwards.
pub fn duration(d: &SleepDuration) -> String {
    let base = format!("{}h {}m", d.hours, d.minutes);
    if d.clock_skew {
        format!("{base} ⚠️ clock skew")
    } else {
        base
    }
}

pub fn summary(s: &SleepSummary) -> String {
    format!(
        "{} {} sleep\n{}–{} ({})",
        s.category.emoji(),
        s.category.label(),
        clock_time(&s.start_time),
        clock_time(&s.end_time),
        duration(&s.duration)
    )
}

#[cfg(test)]
mod tests {
    use chrono_tz::Europe::Berlin;

    use super::*;
    use crate::{domain::UserId, session::SleepSession};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<chrono_tz::Tz> {
        Berlin
            .with_ymd_and_hms(2025, 6, day, hour, minute, 0)
            .single()
            .unwrap()
    }

    #[test]
    fn started_message_uses_24h_clock() {
        assert_eq!(started(&at(1, 21, 5)), "Sleep started at 21:05 💤");
    }

    #[test]
    fn summary_for_morning_nap() {
        let s = SleepSession::new(UserId(1), at(1, 6, 10)).finish(at(1, 8, 45));
        assert_eq!(summary(&s), "🌞 Day sleep\n06:10–08:45 (2h 35m)");
    }

    #[test]
    fn summary_for_night() {
        let s = SleepSession::new(UserId(1), at(1, 23, 40)).finish(at(2, 7, 0));
        assert_eq!(summary(&s), "🌙 Night sleep\n23:40–07:00 (7h 20m)");
    }

    #[test]
    fn skewed_duration_is_marked() {
        let s = SleepSession::new(UserId(1), at(1, 9, 0)).finish(at(1, 8, 59));
        assert_eq!(duration(&s.duration), "0h 0m ⚠️ clock skew");
    }
}
