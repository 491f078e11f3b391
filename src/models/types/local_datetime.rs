use std::ops::{Add, Sub};

use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};
use tracing::warn;

/// A wall-clock date and time without any UTC offset attached.
///
/// League dates are always interpreted in the viewer's local time. Keeping them naive avoids
/// the off-by-one-day errors caused by reading a bare date as UTC midnight.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalDateTime(PrimitiveDateTime);

impl LocalDateTime {
    pub fn new(date: Date, time: Time) -> LocalDateTime {
        LocalDateTime(PrimitiveDateTime::new(date, time))
    }

    pub fn start_of_day(date: Date) -> LocalDateTime {
        LocalDateTime::new(date, Time::MIDNIGHT)
    }

    /// Current local wall-clock time. Falls back to UTC if the local offset can't be determined.
    pub fn now() -> LocalDateTime {
        let now = match OffsetDateTime::now_local() {
            Ok(now) => now,
            Err(err) => {
                warn!("Could not determine local UTC offset, using UTC: {err}");
                OffsetDateTime::now_utc()
            }
        };

        LocalDateTime::new(now.date(), now.time())
    }

    pub fn date(&self) -> Date {
        self.0.date()
    }
}

impl From<PrimitiveDateTime> for LocalDateTime {
    fn from(value: PrimitiveDateTime) -> Self {
        LocalDateTime(value)
    }
}

impl From<LocalDateTime> for PrimitiveDateTime {
    fn from(value: LocalDateTime) -> Self {
        value.0
    }
}

impl Add<Duration> for LocalDateTime {
    type Output = LocalDateTime;

    fn add(self, rhs: Duration) -> Self::Output {
        LocalDateTime(self.0 + rhs)
    }
}

impl Sub<Duration> for LocalDateTime {
    type Output = LocalDateTime;

    fn sub(self, rhs: Duration) -> Self::Output {
        LocalDateTime(self.0 - rhs)
    }
}

impl Sub for LocalDateTime {
    type Output = Duration;

    fn sub(self, rhs: LocalDateTime) -> Self::Output {
        self.0 - rhs.0
    }
}
