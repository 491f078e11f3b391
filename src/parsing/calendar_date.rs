use std::fmt::Display;

use lazy_regex::regex_captures;
use time::{Date, Month};

/// A calendar date, or the raw text if it couldn't be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CalendarDate {
    Date(Date),
    Unparsed(String),
}

impl CalendarDate {
    pub fn as_date(&self) -> Option<Date> {
        match self {
            CalendarDate::Date(date) => Some(*date),
            CalendarDate::Unparsed(_) => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CalendarDate::Unparsed(raw) if raw.trim().is_empty())
    }

    /// Canonical storage form: `YYYY-MM-DD` for parsed dates, the raw text otherwise.
    pub fn to_canonical(&self) -> String {
        match self {
            CalendarDate::Date(date) => format!(
                "{:04}-{:02}-{:02}",
                date.year(),
                u8::from(date.month()),
                date.day()
            ),
            CalendarDate::Unparsed(raw) => raw.clone(),
        }
    }
}

impl Display for CalendarDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalendarDate::Date(date) => write!(
                f,
                "{}/{}/{}",
                u8::from(date.month()),
                date.day(),
                date.year()
            ),
            CalendarDate::Unparsed(raw) => f.write_str(raw),
        }
    }
}

/// Parses `YYYY-MM-DD` (optionally followed by a `T...` time part, which is ignored),
/// `M/D/YYYY` and `MM/DD/YYYY`.
pub fn normalize_date(raw: &str) -> CalendarDate {
    let trimmed = raw.trim();

    let parts = if let Some((_, year, month, day, _)) =
        regex_captures!(r"^(\d{4})-(\d{1,2})-(\d{1,2})(T.*)?$", trimmed)
    {
        Some((year, month, day))
    } else if let Some((_, month, day, year)) =
        regex_captures!(r"^(\d{1,2})/(\d{1,2})/(\d{4})$", trimmed)
    {
        Some((year, month, day))
    } else {
        None
    };

    parts
        .and_then(|(year, month, day)| from_parts(year, month, day))
        .map(CalendarDate::Date)
        .unwrap_or_else(|| CalendarDate::Unparsed(raw.to_owned()))
}

fn from_parts(year: &str, month: &str, day: &str) -> Option<Date> {
    let year: i32 = year.parse().ok()?;
    let month: u8 = month.parse().ok()?;
    let day: u8 = day.parse().ok()?;

    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{normalize_date, CalendarDate};

    #[test]
    fn iso() {
        assert_eq!(
            normalize_date("2024-09-05"),
            CalendarDate::Date(date!(2024 - 09 - 05))
        );
    }

    #[test]
    fn iso_with_time_part_keeps_the_calendar_day() {
        assert_eq!(
            normalize_date("2024-09-05T00:00:00.000Z"),
            CalendarDate::Date(date!(2024 - 09 - 05))
        );
    }

    #[test]
    fn slashes() {
        assert_eq!(
            normalize_date("9/5/2024"),
            CalendarDate::Date(date!(2024 - 09 - 05))
        );
        assert_eq!(
            normalize_date(" 09/05/2024 "),
            CalendarDate::Date(date!(2024 - 09 - 05))
        );
    }

    #[test]
    fn impossible_date_is_unparsed() {
        assert_eq!(
            normalize_date("2024-02-30"),
            CalendarDate::Unparsed("2024-02-30".to_string())
        );
        assert_eq!(
            normalize_date("13/01/2024"),
            CalendarDate::Unparsed("13/01/2024".to_string())
        );
    }

    #[test]
    fn garbage_is_returned_unchanged() {
        assert_eq!(
            normalize_date("sometime next week"),
            CalendarDate::Unparsed("sometime next week".to_string())
        );
        assert!(normalize_date("  ").is_blank());
    }

    #[test]
    fn display() {
        assert_eq!(normalize_date("2024-09-05").to_string(), "9/5/2024");
        assert_eq!(normalize_date("tbd").to_string(), "tbd");
    }

    #[test]
    fn canonical() {
        assert_eq!(normalize_date("9/5/2024").to_canonical(), "2024-09-05");
        assert_eq!(normalize_date("tbd").to_canonical(), "tbd");
    }
}
