use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{PostMortemError, PostMortemResult};

/// Inclusive calendar-date window.
///
/// Hourly data is stamped with the hour-ending convention (hour ending 24 of
/// a day is midnight of the next day), so membership of an hourly timestamp is
/// decided on its operating day, one hour earlier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> PostMortemResult<Self> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(self) -> PostMortemResult<()> {
        if self.start > self.end {
            return Err(PostMortemError::InvalidConfig(format!(
                "date window start {} is after end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    #[must_use]
    pub fn contains_hour_ending(self, hour_ending: NaiveDateTime) -> bool {
        self.contains(operating_day(hour_ending))
    }

    /// Number of calendar days covered, both ends included.
    #[must_use]
    pub fn day_count(self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// First month start touched by the window.
    #[must_use]
    pub fn first_month(self) -> NaiveDate {
        month_start(self.start)
    }

    /// Time range shared by the stacked hourly panels: from the first
    /// midnight to the last hour ending of the window.
    #[must_use]
    pub fn hourly_axis_range(self) -> (NaiveDateTime, NaiveDateTime) {
        let start = self.start.and_time(NaiveTime::MIN);
        let end = (self.end + Duration::days(1)).and_time(NaiveTime::MIN);
        (start, end)
    }
}

/// Operating day of an hour-ending timestamp.
#[must_use]
pub fn operating_day(hour_ending: NaiveDateTime) -> NaiveDate {
    (hour_ending - Duration::hours(1)).date()
}

#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}
