//! Date format patterns
//!
//! Grid clients describe dates with PHP-style format characters
//! (`Y-m-d H:i:s`). A [`DateFormat`] parses such a pattern once and can then
//! parse and render values with chrono, or translate itself into the
//! formatting syntax of a SQL backend (`strftime` for SQLite, `to_char` for
//! PostgreSQL).

use chrono::format::{Parsed, StrftimeItems, parse};
use chrono::{NaiveDateTime, NaiveTime};
use thiserror::Error;

/// Errors raised while parsing a format or a value under a format
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateFormatError {
    #[error("date format is empty")]
    Empty,

    #[error("unsupported date format character '{0}'")]
    UnsupportedToken(char),

    #[error("'{value}' does not match date format '{format}'")]
    Mismatch { value: String, format: String },
}

/// A single element of a date format pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateToken {
    /// `Y` - four digit year
    Year,
    /// `y` - two digit year
    ShortYear,
    /// `m` - month, zero padded
    Month,
    /// `n` - month, no padding
    MonthNoPad,
    /// `d` - day of month, zero padded
    Day,
    /// `j` - day of month, no padding
    DayNoPad,
    /// `H` - 24 hour, zero padded
    Hour,
    /// `G` - 24 hour, no padding
    HourNoPad,
    /// `h` - 12 hour, zero padded
    Hour12,
    /// `g` - 12 hour, no padding
    Hour12NoPad,
    /// `i` - minutes
    Minute,
    /// `s` - seconds
    Second,
    /// `u` - microseconds
    Micros,
    /// `v` - milliseconds
    Millis,
    /// `A` - AM/PM
    UpperMeridiem,
    /// `a` - am/pm
    LowerMeridiem,
    /// `D` - Mon..Sun
    WeekdayShort,
    /// `l` - Monday..Sunday
    WeekdayLong,
    /// `M` - Jan..Dec
    MonthShort,
    /// `F` - January..December
    MonthLong,
    Literal(char),
}

impl DateToken {
    fn from_format_char(c: char) -> Option<Self> {
        let token = match c {
            'Y' => Self::Year,
            'y' => Self::ShortYear,
            'm' => Self::Month,
            'n' => Self::MonthNoPad,
            'd' => Self::Day,
            'j' => Self::DayNoPad,
            'H' => Self::Hour,
            'G' => Self::HourNoPad,
            'h' => Self::Hour12,
            'g' => Self::Hour12NoPad,
            'i' => Self::Minute,
            's' => Self::Second,
            'u' => Self::Micros,
            'v' => Self::Millis,
            'A' => Self::UpperMeridiem,
            'a' => Self::LowerMeridiem,
            'D' => Self::WeekdayShort,
            'l' => Self::WeekdayLong,
            'M' => Self::MonthShort,
            'F' => Self::MonthLong,
            _ => return None,
        };
        Some(token)
    }

    fn is_time(&self) -> bool {
        matches!(
            self,
            Self::Hour
                | Self::HourNoPad
                | Self::Hour12
                | Self::Hour12NoPad
                | Self::Minute
                | Self::Second
                | Self::Micros
                | Self::Millis
                | Self::UpperMeridiem
                | Self::LowerMeridiem
        )
    }

    fn strftime(&self) -> String {
        let spec = match self {
            Self::Year => "%Y",
            Self::ShortYear => "%y",
            Self::Month => "%m",
            Self::MonthNoPad => "%-m",
            Self::Day => "%d",
            Self::DayNoPad => "%-d",
            Self::Hour => "%H",
            Self::HourNoPad => "%-H",
            Self::Hour12 => "%I",
            Self::Hour12NoPad => "%-I",
            Self::Minute => "%M",
            Self::Second => "%S",
            Self::Micros => "%6f",
            Self::Millis => "%3f",
            Self::UpperMeridiem => "%p",
            Self::LowerMeridiem => "%P",
            Self::WeekdayShort => "%a",
            Self::WeekdayLong => "%A",
            Self::MonthShort => "%b",
            Self::MonthLong => "%B",
            Self::Literal('%') => "%%",
            Self::Literal(c) => return c.to_string(),
        };
        spec.to_string()
    }

    /// SQLite `strftime` only covers the numeric, zero padded subset
    fn sqlite(&self) -> Option<String> {
        let spec = match self {
            Self::Year => "%Y",
            Self::Month => "%m",
            Self::Day => "%d",
            Self::Hour => "%H",
            Self::Minute => "%M",
            Self::Second => "%S",
            Self::Literal('%') => "%%",
            Self::Literal(c) => return Some(c.to_string()),
            _ => return None,
        };
        Some(spec.to_string())
    }

    fn postgres(&self) -> String {
        let spec = match self {
            Self::Year => "YYYY",
            Self::ShortYear => "YY",
            Self::Month => "MM",
            Self::MonthNoPad => "FMMM",
            Self::Day => "DD",
            Self::DayNoPad => "FMDD",
            Self::Hour => "HH24",
            Self::HourNoPad => "FMHH24",
            Self::Hour12 => "HH12",
            Self::Hour12NoPad => "FMHH12",
            Self::Minute => "MI",
            Self::Second => "SS",
            Self::Micros => "US",
            Self::Millis => "MS",
            Self::UpperMeridiem => "AM",
            Self::LowerMeridiem => "am",
            Self::WeekdayShort => "Dy",
            Self::WeekdayLong => "FMDay",
            Self::MonthShort => "Mon",
            Self::MonthLong => "FMMonth",
            Self::Literal('"') => return "\\\"".to_string(),
            Self::Literal(c) if c.is_ascii_alphanumeric() => return format!("\"{}\"", c),
            Self::Literal(c) => return c.to_string(),
        };
        spec.to_string()
    }
}

/// A parsed PHP-style date format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    source: String,
    tokens: Vec<DateToken>,
}

impl DateFormat {
    /// Parse a format pattern. A backslash escapes the following character.
    pub fn parse(pattern: &str) -> Result<Self, DateFormatError> {
        if pattern.is_empty() {
            return Err(DateFormatError::Empty);
        }

        let mut tokens = Vec::with_capacity(pattern.len());
        let mut chars = pattern.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                tokens.push(DateToken::Literal(chars.next().unwrap_or('\\')));
            } else if c.is_ascii_alphabetic() {
                tokens.push(
                    DateToken::from_format_char(c).ok_or(DateFormatError::UnsupportedToken(c))?,
                );
            } else {
                tokens.push(DateToken::Literal(c));
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            tokens,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the pattern carries any time-of-day component
    pub fn has_time(&self) -> bool {
        self.tokens.iter().any(DateToken::is_time)
    }

    /// A format with the same fields, ordered from year down to second and
    /// zero padded, so that text order is chronological order.
    ///
    /// Weekdays, meridiem markers and sub-second fields are dropped, a two
    /// digit year widens to four digits. `None` when no field is left.
    pub fn sortable(&self) -> Option<DateFormat> {
        use DateToken::*;

        let has = |wanted: &[DateToken]| self.tokens.iter().any(|t| wanted.contains(t));
        let date: Vec<&str> = [
            (has(&[Year, ShortYear]), "Y"),
            (has(&[Month, MonthNoPad, MonthShort, MonthLong]), "m"),
            (has(&[Day, DayNoPad]), "d"),
        ]
        .into_iter()
        .filter_map(|(present, token)| present.then_some(token))
        .collect();
        let time: Vec<&str> = [
            (has(&[Hour, HourNoPad, Hour12, Hour12NoPad]), "H"),
            (has(&[Minute]), "i"),
            (has(&[Second]), "s"),
        ]
        .into_iter()
        .filter_map(|(present, token)| present.then_some(token))
        .collect();

        let pattern = [date.join("-"), time.join(":")]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        Self::parse(&pattern).ok()
    }

    /// Equivalent chrono strftime pattern
    pub fn to_strftime(&self) -> String {
        self.tokens.iter().map(DateToken::strftime).collect()
    }

    /// Equivalent SQLite `strftime` pattern, if every token is supported
    pub fn to_sqlite(&self) -> Option<String> {
        self.tokens.iter().map(DateToken::sqlite).collect()
    }

    /// Equivalent PostgreSQL `to_char` pattern
    pub fn to_postgres(&self) -> String {
        self.tokens.iter().map(DateToken::postgres).collect()
    }

    /// Parse a value written in this format.
    ///
    /// Date-only formats produce midnight.
    pub fn parse_value(&self, value: &str) -> Result<NaiveDateTime, DateFormatError> {
        let mismatch = || DateFormatError::Mismatch {
            value: value.to_string(),
            format: self.source.clone(),
        };

        let pattern = self.to_strftime();
        let mut parsed = Parsed::new();
        parse(&mut parsed, value.trim(), StrftimeItems::new(&pattern)).map_err(|_| mismatch())?;

        let date = parsed.to_naive_date().map_err(|_| mismatch())?;
        let time = if self.has_time() {
            parsed.to_naive_time().map_err(|_| mismatch())?
        } else {
            NaiveTime::MIN
        };
        Ok(date.and_time(time))
    }

    /// Render a timestamp in this format
    pub fn format(&self, value: &NaiveDateTime) -> String {
        value.format(&self.to_strftime()).to_string()
    }

    /// Parse `value` under this format and render it under `target`
    pub fn reformat(&self, value: &str, target: &DateFormat) -> Result<String, DateFormatError> {
        self.parse_value(value).map(|dt| target.format(&dt))
    }
}

impl std::fmt::Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_datetime_pattern() {
        let format = DateFormat::parse("Y-m-d H:i:s").unwrap();
        assert_eq!(format.to_strftime(), "%Y-%m-%d %H:%M:%S");
        assert!(format.has_time());
    }

    #[test]
    fn test_parse_date_only_pattern() {
        let format = DateFormat::parse("d/m/Y").unwrap();
        assert_eq!(format.to_strftime(), "%d/%m/%Y");
        assert!(!format.has_time());
    }

    #[test]
    fn test_escaped_characters_are_literals() {
        let format = DateFormat::parse("Y-m-d\\TH:i").unwrap();
        assert_eq!(format.to_strftime(), "%Y-%m-%dT%H:%M");
    }

    #[test]
    fn test_unsupported_token() {
        assert_eq!(
            DateFormat::parse("Y-N").unwrap_err(),
            DateFormatError::UnsupportedToken('N')
        );
        assert_eq!(DateFormat::parse("").unwrap_err(), DateFormatError::Empty);
    }

    #[test]
    fn test_parse_value_datetime() {
        let format = DateFormat::parse("Y-m-d H:i:s").unwrap();
        let dt = format.parse_value("2026-10-18 09:15:42").unwrap();
        assert_eq!(dt.year(), 2026);
        assert_eq!(dt.month(), 10);
        assert_eq!(dt.day(), 18);
        assert_eq!(dt.hour(), 9);
        assert_eq!(dt.minute(), 15);
        assert_eq!(dt.second(), 42);
    }

    #[test]
    fn test_parse_value_date_only_is_midnight() {
        let format = DateFormat::parse("d.m.Y").unwrap();
        let dt = format.parse_value("03.02.2025").unwrap();
        assert_eq!(dt.day(), 3);
        assert_eq!(dt.month(), 2);
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.minute(), 0);
    }

    #[test]
    fn test_parse_value_twelve_hour_clock() {
        let format = DateFormat::parse("Y-m-d g:i A").unwrap();
        let dt = format.parse_value("2026-10-18 9:15 PM").unwrap();
        assert_eq!(dt.hour(), 21);
        assert_eq!(dt.minute(), 15);
    }

    #[test]
    fn test_parse_value_mismatch() {
        let format = DateFormat::parse("Y-m-d H:i:s").unwrap();
        let err = format.parse_value("18/10/2026").unwrap_err();
        assert_eq!(
            err,
            DateFormatError::Mismatch {
                value: "18/10/2026".to_string(),
                format: "Y-m-d H:i:s".to_string(),
            }
        );
    }

    #[test]
    fn test_reformat_presentation_to_storage() {
        let presentation = DateFormat::parse("Y-m-d H:i:s").unwrap();
        let storage = DateFormat::parse("Y-m-d").unwrap();
        assert_eq!(
            presentation
                .reformat("2026-10-18 23:59:59", &storage)
                .unwrap(),
            "2026-10-18"
        );
    }

    #[test]
    fn test_reformat_round_trips_at_day_granularity() {
        let presentation = DateFormat::parse("d/m/Y H:i").unwrap();
        let storage = DateFormat::parse("Y-m-d").unwrap();

        let stored = presentation.reformat("01/03/2024 17:45", &storage).unwrap();
        assert_eq!(stored, "2024-03-01");

        let back = storage.reformat(&stored, &presentation).unwrap();
        assert_eq!(back, "01/03/2024 00:00");
        assert_eq!(
            presentation.parse_value(&back).unwrap().date(),
            presentation.parse_value("01/03/2024 17:45").unwrap().date()
        );
    }

    #[test]
    fn test_month_names() {
        let format = DateFormat::parse("j F Y").unwrap();
        let dt = format.parse_value("5 March 2024").unwrap();
        assert_eq!(dt.month(), 3);
        assert_eq!(format.format(&dt), "5 March 2024");
    }

    #[test]
    fn test_sqlite_pattern() {
        assert_eq!(
            DateFormat::parse("Y-m-d").unwrap().to_sqlite(),
            Some("%Y-%m-%d".to_string())
        );
        assert_eq!(
            DateFormat::parse("Y-m-d H:i:s").unwrap().to_sqlite(),
            Some("%Y-%m-%d %H:%M:%S".to_string())
        );
        assert_eq!(DateFormat::parse("d M Y").unwrap().to_sqlite(), None);
    }

    #[test]
    fn test_sortable_reorders_fields() {
        let sortable = |pattern: &str| {
            DateFormat::parse(pattern)
                .unwrap()
                .sortable()
                .map(|f| f.as_str().to_string())
        };

        assert_eq!(sortable("Y-m-d").as_deref(), Some("Y-m-d"));
        assert_eq!(sortable("d/m/Y").as_deref(), Some("Y-m-d"));
        assert_eq!(sortable("D, j F y g:i A").as_deref(), Some("Y-m-d H:i"));
        assert_eq!(sortable("d.m.Y H:i:s.v").as_deref(), Some("Y-m-d H:i:s"));
        assert_eq!(sortable("m/d").as_deref(), Some("m-d"));
        assert_eq!(sortable("l"), None);
    }

    #[test]
    fn test_sortable_text_order_is_date_order() {
        let storage = DateFormat::parse("d/m/Y").unwrap();
        let sortable = storage.sortable().unwrap();
        let parse = |v: &str| storage.parse_value(v).unwrap();

        let october = parse("31/10/2026");
        let november = parse("01/11/2026");
        assert!(storage.format(&october) > storage.format(&november));
        assert!(sortable.format(&october) < sortable.format(&november));
    }

    #[test]
    fn test_postgres_pattern() {
        assert_eq!(
            DateFormat::parse("Y-m-d H:i:s").unwrap().to_postgres(),
            "YYYY-MM-DD HH24:MI:SS"
        );
        assert_eq!(
            DateFormat::parse("j F Y\\T").unwrap().to_postgres(),
            "FMDD FMMonth YYYY\"T\""
        );
    }
}
