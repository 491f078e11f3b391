//! Best-effort normalization of the date and time strings found in league records.
//!
//! Nothing here fails: input that can't be understood is kept verbatim so it can still be
//! shown to the user.

mod calendar_date;
mod clock_time;

pub use calendar_date::{normalize_date, CalendarDate};
pub use clock_time::{normalize_time, ClockTime};

use crate::models::types::LocalDateTime;

/// Combines a date and an optional time of day into a naive local instant.
///
/// A missing time means the start of the day. Returns `None` if either part is unparsed.
pub fn combine(date: &CalendarDate, time: Option<&ClockTime>) -> Option<LocalDateTime> {
    let date = date.as_date()?;

    match time {
        None => Some(LocalDateTime::start_of_day(date)),
        Some(time) => Some(LocalDateTime::new(date, time.as_time()?)),
    }
}
