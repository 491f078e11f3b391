use std::fmt::Display;

use lazy_regex::regex_captures;
use time::Time;

/// A time of day, or the raw text if it couldn't be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClockTime {
    Time(Time),
    Unparsed(String),
}

impl ClockTime {
    pub fn as_time(&self) -> Option<Time> {
        match self {
            ClockTime::Time(time) => Some(*time),
            ClockTime::Unparsed(_) => None,
        }
    }

    /// Canonical storage form: 24-hour `HH:MM` for parsed times, the raw text otherwise.
    pub fn to_canonical(&self) -> String {
        match self {
            ClockTime::Time(time) => format!("{:02}:{:02}", time.hour(), time.minute()),
            ClockTime::Unparsed(raw) => raw.clone(),
        }
    }
}

impl Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClockTime::Time(time) => {
                let (hour, suffix) = match time.hour() {
                    0 => (12, "AM"),
                    hour @ 1..=11 => (hour, "AM"),
                    12 => (12, "PM"),
                    hour => (hour - 12, "PM"),
                };
                write!(f, "{hour}:{:02} {suffix}", time.minute())
            }
            ClockTime::Unparsed(raw) => f.write_str(raw),
        }
    }
}

/// Parses 12-hour clock strings such as `6pm`, `6:30 PM`, `630pm` or `10:15 a.m.`,
/// plus 24-hour `HH:MM[:SS]`.
pub fn normalize_time(raw: &str) -> ClockTime {
    parse(raw.trim())
        .map(ClockTime::Time)
        .unwrap_or_else(|| ClockTime::Unparsed(raw.to_owned()))
}

fn parse(s: &str) -> Option<Time> {
    if let Some((_, hour, minute, meridiem)) =
        regex_captures!(r"^(\d{1,2}):?(\d{2})?\s*([ap])\.?\s*m?\.?$"i, s)
    {
        let hour: u8 = hour.parse().ok()?;
        let minute: u8 = if minute.is_empty() {
            0
        } else {
            minute.parse().ok()?
        };

        if !(1..=12).contains(&hour) {
            return None;
        }

        let hour = match (hour, meridiem.eq_ignore_ascii_case("p")) {
            (12, false) => 0,
            (12, true) => 12,
            (hour, false) => hour,
            (hour, true) => hour + 12,
        };

        Time::from_hms(hour, minute, 0).ok()
    } else if let Some((_, hour, minute, _, second)) =
        regex_captures!(r"^(\d{1,2}):(\d{2})(:(\d{2}))?$", s)
    {
        let hour = hour.parse().ok()?;
        let minute = minute.parse().ok()?;
        let second = if second.is_empty() {
            0
        } else {
            second.parse().ok()?
        };

        Time::from_hms(hour, minute, second).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use time::macros::time;

    use super::{normalize_time, ClockTime};

    fn parsed(raw: &str) -> Option<time::Time> {
        normalize_time(raw).as_time()
    }

    #[test]
    fn hour_only() {
        assert_eq!(parsed("6pm"), Some(time!(18:00)));
        assert_eq!(parsed("6 PM"), Some(time!(18:00)));
        assert_eq!(parsed("9am"), Some(time!(9:00)));
    }

    #[test]
    fn with_minutes() {
        assert_eq!(parsed("6:30 PM"), Some(time!(18:30)));
        assert_eq!(parsed("6:30pm"), Some(time!(18:30)));
        assert_eq!(parsed("10:15 a.m."), Some(time!(10:15)));
    }

    #[test]
    fn without_colon() {
        assert_eq!(parsed("630pm"), Some(time!(18:30)));
        assert_eq!(parsed("1030AM"), Some(time!(10:30)));
    }

    #[test]
    fn noon_and_midnight() {
        assert_eq!(parsed("12pm"), Some(time!(12:00)));
        assert_eq!(parsed("12:45 am"), Some(time!(0:45)));
    }

    #[test]
    fn twenty_four_hour() {
        assert_eq!(parsed("19:00"), Some(time!(19:00)));
        assert_eq!(parsed("07:05:30"), Some(time!(7:05:30)));
    }

    #[test]
    fn out_of_range() {
        assert_eq!(parsed("13pm"), None);
        assert_eq!(parsed("6:75pm"), None);
        assert_eq!(parsed("25:00"), None);
    }

    #[test]
    fn garbage_is_returned_unchanged() {
        assert_eq!(
            normalize_time("after dinner"),
            ClockTime::Unparsed("after dinner".to_string())
        );
    }

    #[test]
    fn display() {
        assert_eq!(normalize_time("18:05").to_string(), "6:05 PM");
        assert_eq!(normalize_time("12am").to_string(), "12:00 AM");
        assert_eq!(normalize_time("whenever").to_string(), "whenever");
    }
}
