//! Date token normalization.
//!
//! Rules, in order:
//! - last component has 4 digits: day/month/year (month/day/year under `MonthFirst`)
//! - first component has 4 digits: year/month/day
//! - otherwise: two-digit year, prefixed with "20"
//!
//! Day-first versus month-first cannot be decided from the token alone; the
//! order is configuration and `ambiguous` flags tokens where both readings are valid.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateOrder {
    #[default]
    DayFirst,
    MonthFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DateError {
    #[error("not a date token")]
    Malformed,
    #[error("month {0} out of range")]
    MonthOutOfRange(u32),
    #[error("day {0} out of range")]
    DayOutOfRange(u32),
    #[error("not a calendar date")]
    NotACalendarDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDate {
    pub date: NaiveDate,
    /// Swapping day and month would also give a valid, different date.
    pub ambiguous: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateNormalizer {
    order: DateOrder,
}

impl DateNormalizer {
    pub fn new(order: DateOrder) -> Self {
        Self { order }
    }

    pub fn normalize(&self, token: &str) -> Result<NormalizedDate, DateError> {
        let parts: Vec<&str> = token.trim().split(['/', '-', '.']).collect();
        let [first, second, third] = parts[..] else {
            return Err(DateError::Malformed);
        };
        if parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
            return Err(DateError::Malformed);
        }

        let (year, month, day, ambiguous) = if third.len() == 4 {
            let (m, d, amb) = self.month_day(first, second)?;
            (number(third)? as i32, m, d, amb)
        } else if first.len() == 4 {
            (number(first)? as i32, number(second)?, number(third)?, false)
        } else if third.len() == 2 {
            let (m, d, amb) = self.month_day(first, second)?;
            (2000 + number(third)? as i32, m, d, amb)
        } else {
            return Err(DateError::Malformed);
        };

        if !(1..=12).contains(&month) {
            return Err(DateError::MonthOutOfRange(month));
        }
        if !(1..=31).contains(&day) {
            return Err(DateError::DayOutOfRange(day));
        }
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or(DateError::NotACalendarDate)?;

        Ok(NormalizedDate { date, ambiguous })
    }

    /// Returns (month, day, ambiguous) for the two non-year components.
    fn month_day(&self, first: &str, second: &str) -> Result<(u32, u32, bool), DateError> {
        let a = number(first)?;
        let b = number(second)?;
        let ambiguous = a != b && a <= 12 && b <= 12;
        Ok(match self.order {
            DateOrder::DayFirst => (b, a, ambiguous),
            DateOrder::MonthFirst => (a, b, ambiguous),
        })
    }
}

fn number(s: &str) -> Result<u32, DateError> {
    s.parse().map_err(|_| DateError::Malformed)
}
