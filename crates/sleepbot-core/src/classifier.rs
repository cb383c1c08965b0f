use chrono::{DateTime, TimeZone, Timelike};

/// First local hour that counts as a day sleep.
pub const DAY_START_HOUR: u32 = 6;
/// First local hour that counts as a night sleep again.
pub const DAY_END_HOUR: u32 = 18;

/// Time-of-day label for a sleep, derived from its start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Day,
    Night,
}

impl Category {
    pub fn label(self) -> &'static str {
        match self {
            Category::Day => "Day",
            Category::Night => "Night",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Category::Day => "🌞",
            Category::Night => "🌙",
        }
    }
}

/// Classify a sleep by the local hour of its start: `[06:00, 18:00)` is day.
pub fn classify<Tz: TimeZone>(start_time: &DateTime<Tz>) -> Category {
    let hour = start_time.hour();
    if (DAY_START_HOUR..DAY_END_HOUR).contains(&hour) {
        Category::Day
    } else {
        Category::Night
    }
}
