//! Calendar attributes derived from a timestamp index
//!
//! The holiday calendar covers French public holidays, the region the
//! consumption sites are located in. Movable feasts hang off Easter Sunday,
//! so the calendar is computed per year rather than listed.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Weekday};
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Fixed-date public holidays as (month, day)
const FIXED_HOLIDAYS: [(u32, u32); 8] = [
    (1, 1),   // New Year's Day
    (5, 1),   // Labour Day
    (5, 8),   // Victory in Europe Day
    (7, 14),  // Bastille Day
    (8, 15),  // Assumption
    (11, 1),  // All Saints' Day
    (11, 11), // Armistice Day
    (12, 25), // Christmas Day
];

/// Movable public holidays as day offsets from Easter Sunday
const EASTER_OFFSETS: [i64; 3] = [
    1,  // Easter Monday
    39, // Ascension Thursday
    50, // Whit Monday
];

/// Easter Sunday of a Gregorian year (anonymous Gregorian algorithm)
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}

/// Set of public holiday dates over a range of years
#[derive(Debug, Clone, Default)]
pub struct HolidayCalendar {
    dates: HashSet<NaiveDate>,
}

impl HolidayCalendar {
    /// Build the French calendar for every year in `years`
    pub fn france(years: RangeInclusive<i32>) -> Self {
        let mut dates = HashSet::new();

        for year in years {
            for (month, day) in FIXED_HOLIDAYS {
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    dates.insert(date);
                }
            }
            if let Some(easter) = easter_sunday(year) {
                for offset in EASTER_OFFSETS {
                    dates.insert(easter + Duration::days(offset));
                }
            }
        }

        Self { dates }
    }

    /// Build the calendar spanning the years of a timestamp index
    pub fn for_index(index: &[NaiveDateTime]) -> Self {
        let years = index.iter().map(|ts| ts.year());
        match (years.clone().min(), years.max()) {
            (Some(first), Some(last)) => Self::france(first..=last),
            _ => Self::default(),
        }
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Per-row calendar attributes of an index
#[derive(Debug, Clone, Default)]
pub struct CalendarFeatures {
    /// Hour of day (0-23)
    pub hour: Vec<i32>,
    /// Day of week, Monday = 0 through Sunday = 6
    pub day_of_week: Vec<i32>,
    /// Month (1-12)
    pub month: Vec<i32>,
    /// Saturday or Sunday
    pub is_weekend: Vec<bool>,
    /// Holiday membership, present only when a calendar was supplied
    pub is_holiday: Option<Vec<bool>>,
}

impl CalendarFeatures {
    pub fn from_index(index: &[NaiveDateTime], holidays: Option<&HolidayCalendar>) -> Self {
        let n = index.len();
        let mut features = Self {
            hour: Vec::with_capacity(n),
            day_of_week: Vec::with_capacity(n),
            month: Vec::with_capacity(n),
            is_weekend: Vec::with_capacity(n),
            is_holiday: holidays.map(|_| Vec::with_capacity(n)),
        };

        for ts in index {
            let weekday = ts.weekday();
            features.hour.push(ts.hour() as i32);
            features.day_of_week.push(weekday.num_days_from_monday() as i32);
            features.month.push(ts.month() as i32);
            features
                .is_weekend
                .push(matches!(weekday, Weekday::Sat | Weekday::Sun));

            if let (Some(flags), Some(calendar)) = (features.is_holiday.as_mut(), holidays) {
                flags.push(calendar.is_holiday(ts.date()));
            }
        }

        features
    }

    pub fn len(&self) -> usize {
        self.hour.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hour.is_empty()
    }
}
