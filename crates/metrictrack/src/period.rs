//! Reporting periods and their display forms.
//!
//! A [`Period`] is a normalized `YYYY-MM` code. It is both the sort key of the
//! view and the input of the formatting functions in this module, which map a
//! period to its Russian display label (`"Февраль 2026"`) and a date to the
//! official long form used inside generated documents
//! (`"от «05» марта 2026 г."`).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Month names in the nominative case, indexed by `month - 1`.
pub const MONTHS: [&str; 12] = [
    "Январь",
    "Февраль",
    "Март",
    "Апрель",
    "Май",
    "Июнь",
    "Июль",
    "Август",
    "Сентябрь",
    "Октябрь",
    "Ноябрь",
    "Декабрь",
];

/// Month names in the genitive case, lowercase, as used in dates.
pub const MONTHS_GENITIVE: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// ASCII digits only; `\d` would also accept other Unicode digits.
const PERIOD_PATTERN: &str = r"^[0-9]{4}-[0-9]{2}$";

/// The compiled period grammar.
///
/// # Panics
///
/// Panics if [`PERIOD_PATTERN`] is not a valid regex.
pub(crate) fn period_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(PERIOD_PATTERN).expect("Invalid period pattern"))
}

/// A reporting month in `YYYY-MM` form.
///
/// The month is always in 1..=12. Ordering is chronological, which matches
/// the lexicographic order of the zero-padded string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    year: u16,
    month: u8,
}

impl Period {
    /// Parse a `YYYY-MM` period code.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPeriod`] if the text does not match the grammar
    /// or the month is outside 01-12.
    pub fn parse(text: &str) -> Result<Self> {
        if !period_regex().is_match(text) {
            return Err(Error::InvalidPeriod(text.to_string()));
        }
        let (year, month) = text
            .split_once('-')
            .ok_or_else(|| Error::InvalidPeriod(text.to_string()))?;
        let year: u16 = year
            .parse()
            .map_err(|_| Error::InvalidPeriod(text.to_string()))?;
        let month: u8 = month
            .parse()
            .map_err(|_| Error::InvalidPeriod(text.to_string()))?;
        Self::new(year, month).ok_or_else(|| Error::InvalidPeriod(text.to_string()))
    }

    /// Build a period from its parts, or `None` if out of range.
    #[must_use]
    pub fn new(year: u16, month: u8) -> Option<Self> {
        if year > 9999 || !(1..=12).contains(&month) {
            return None;
        }
        Some(Self { year, month })
    }

    /// The period containing the given date.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        // chrono months are 1..=12 and the year is clamped to four digits.
        let year = u16::try_from(date.year().clamp(0, 9999)).unwrap_or_default();
        let month = u8::try_from(date.month()).unwrap_or(1);
        Self { year, month }
    }

    /// The current month in local time.
    #[must_use]
    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    /// The four-digit year.
    #[must_use]
    pub fn year(&self) -> u16 {
        self.year
    }

    /// The month number, 1..=12.
    #[must_use]
    pub fn month(&self) -> u8 {
        self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Period {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.to_string()
    }
}

/// The nominative month name for a month number, or `None` outside 1..=12.
#[must_use]
pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month.checked_sub(1)?).ok()?;
    MONTHS.get(index).copied()
}

/// Display label of a period, e.g. `"2026-02"` becomes `"Февраль 2026"`.
#[must_use]
pub fn display_label(period: &Period) -> String {
    let name = month_name(u32::from(period.month())).unwrap_or_default();
    format!("{name} {:04}", period.year())
}

/// Official long form of a date, e.g. `от «05» марта 2026 г.`.
#[must_use]
pub fn official_long_form(date: NaiveDate) -> String {
    let month = MONTHS_GENITIVE[date.month0() as usize];
    format!("от «{:02}» {month} {} г.", date.day(), date.year())
}
