use std::ops::Range;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

// ── Vocabulary ───────────────────────────────────────────────────────────────

/// Weekday names are matched so they stay outside the captured date, then ignored.
const WEEKDAYS: &str =
    "Monday|Mon|Tuesday|Tues|Tue|Wednesday|Wedensday|Wed|Thursday|Thurs|Thu|Friday|Fri";

const MONTHS: &str = "January|Jan|February|Feb|March|Mar|April|Apr|May|June|Jun|July|Jul\
                      |August|Aug|September|Sept|Sep|October|Oct|November|Nov|December|Dec";

/// Literal misspellings seen in episode titles, fixed before matching.
const TYPO_CORRECTIONS: &[(&str, &str)] = &[("Febuary", "February")];

/// Leap year injected when the text carries no year, so that 29 Feb parses.
const PLACEHOLDER_YEAR: i32 = 2000;

// ── Formats ──────────────────────────────────────────────────────────────────

struct DateFormat {
    pattern: &'static str,
    needs_placeholder_year: bool,
}

impl DateFormat {
    /// Whitespace-separated tokens the fragment must have before the
    /// placeholder year is appended. chrono scans numbers greedily, so
    /// without this guard `Mar 2012` would read as day 20 of year 12.
    fn token_count(&self) -> usize {
        if self.needs_placeholder_year {
            2
        } else {
            3
        }
    }
}

const DATE_FORMATS: &[DateFormat] = &[
    DateFormat { pattern: "%B %d %Y", needs_placeholder_year: false },
    DateFormat { pattern: "%b %d %Y", needs_placeholder_year: false },
    DateFormat { pattern: "%d %B %Y", needs_placeholder_year: false },
    DateFormat { pattern: "%d %b %Y", needs_placeholder_year: false },
    DateFormat { pattern: "%B %d %Y", needs_placeholder_year: true },
    DateFormat { pattern: "%b %d %Y", needs_placeholder_year: true },
    DateFormat { pattern: "%d %B %Y", needs_placeholder_year: true },
    DateFormat { pattern: "%d %b %Y", needs_placeholder_year: true },
];

// ── Lazy static regexes ──────────────────────────────────────────────────────

static DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?:{WEEKDAYS})? ?((?:\b\d{{1,2}}(?:st|nd|rd|th)?)? ?(?:{MONTHS})\b ?(?:\d{{1,2}}(?:st|nd|rd|th)?\b)? ?(?:\d{{4}}\b)?)"
    ))
    .unwrap()
});

static ORDINAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d{1,2})(?:st|nd|rd|th)").unwrap());

static LEADING_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d) ").unwrap());

static INNER_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" (\d)( |$)").unwrap());

static SEPT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bSept\b").unwrap());

// ── Public API ───────────────────────────────────────────────────────────────

/// A date recovered from free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    /// False when the year is the injected placeholder.
    pub has_year: bool,
}

impl ResolvedDate {
    pub fn day(&self) -> u32 {
        self.date.day()
    }

    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn same_day_and_month(&self, other: NaiveDate) -> bool {
        self.day() == other.day() && self.month() == other.month()
    }
}

/// Find the first date in `text` that parses.
pub fn resolve(text: &str) -> Option<ResolvedDate> {
    find(text).map(|(_, date)| date)
}

/// Like [`resolve`], also returning the byte span of the whole match
/// (weekday included) within the typo-corrected text.
pub fn find(text: &str) -> Option<(Range<usize>, ResolvedDate)> {
    let corrected = correct_typos(text);
    DATE_RE.captures_iter(&corrected).find_map(|caps| {
        let whole = caps.get(0)?;
        let fragment = caps.get(1)?.as_str();
        parse_fragment(fragment).map(|date| (whole.range(), date))
    })
}

/// Apply the literal typo table. `find` spans refer to this text.
pub fn correct_typos(text: &str) -> String {
    TYPO_CORRECTIONS
        .iter()
        .fold(text.to_string(), |acc, (typo, fix)| acc.replace(typo, fix))
}

/// Canonical spelling of a captured date fragment, ready for the format list.
pub fn normalize_fragment(fragment: &str) -> String {
    let s = ORDINAL_RE.replace_all(fragment, "$1");
    let s = LEADING_DIGIT_RE.replace(&s, "0$1 ");
    let s = INNER_DIGIT_RE.replace_all(&s, " 0$1$2");
    let s = SEPT_RE.replace_all(&s, "Sep");
    s.trim().to_string()
}

fn parse_fragment(fragment: &str) -> Option<ResolvedDate> {
    let normalized = normalize_fragment(fragment);
    if normalized.is_empty() {
        return None;
    }
    let with_placeholder = format!("{} {}", normalized, PLACEHOLDER_YEAR);

    let tokens = normalized.split_whitespace().count();

    DATE_FORMATS.iter().find_map(|format| {
        if tokens != format.token_count() {
            return None;
        }
        let input = if format.needs_placeholder_year {
            with_placeholder.as_str()
        } else {
            normalized.as_str()
        };
        NaiveDate::parse_from_str(input, format.pattern)
            .ok()
            .map(|date| ResolvedDate {
                date,
                has_year: !format.needs_placeholder_year,
            })
    })
}
