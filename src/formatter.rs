//! Display formatting for schedule fields.

use crate::locale::Locale;
use chrono::NaiveDate;

pub const PLACEHOLDER: &str = "—";

/// Lists longer than this are collapsed.
const COLLAPSE_ABOVE: usize = 8;
/// Chips kept when a list is collapsed.
const COLLAPSED_CHIPS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeRanges {
    Empty,
    Chips {
        chips: Vec<String>,
        /// Number of ranges hidden behind the summary chip. Counted from the
        /// five shown chips, so nine ranges give `+4`.
        more: Option<usize>,
    },
}

impl TimeRanges {
    pub fn is_compact(&self) -> bool {
        matches!(self, TimeRanges::Chips { more: Some(_), .. })
    }
}

pub fn format_time_ranges(raw: &str) -> TimeRanges {
    let ranges: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();

    if ranges.is_empty() {
        return TimeRanges::Empty;
    }

    if ranges.len() > COLLAPSE_ABOVE {
        let more = ranges.len() - COLLAPSED_CHIPS;
        let chips = ranges.into_iter().take(COLLAPSED_CHIPS).collect();
        return TimeRanges::Chips {
            chips,
            more: Some(more),
        };
    }

    TimeRanges::Chips {
        chips: ranges,
        more: None,
    }
}

/// 1 = Monday ... 7 = Sunday. Other codes have no name.
pub fn format_day_of_week(code: u8, locale: Locale) -> Option<&'static str> {
    match code {
        1..=7 => Some(locale.weekdays()[usize::from(code) - 1]),
        _ => None,
    }
}

/// Parses a `YYYY-MM-DD` date and renders it as `dd/mm/yyyy`. The value is a
/// plain calendar date, so no timezone can shift it to the previous day.
pub fn format_date(iso: &str, locale: Locale) -> Option<String> {
    let date = NaiveDate::parse_from_str(iso.trim(), "%Y-%m-%d").ok()?;
    Some(format_calendar_date(date, locale))
}

pub fn format_calendar_date(date: NaiveDate, locale: Locale) -> String {
    match locale {
        Locale::Es | Locale::En => date.format("%d/%m/%Y").to_string(),
    }
}
