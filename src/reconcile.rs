use std::collections::{HashMap, HashSet};
use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Deserialize;
use url::Url;

use crate::dates;
use crate::error::AppError;
use crate::models::{Episode, EpisodeRecord};
use crate::sanitize::sanitize;
use crate::titles;

pub const SHOW_NAME: &str = "Hamish & Andy";
const AUDIO_EXTENSION: &str = ".mp3";

// ── Rules ────────────────────────────────────────────────────────────────────

/// Hand-maintained corrections for episodes whose listed or titled dates are
/// known to be wrong.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconcileRules {
    /// Episode id → the date it actually aired. Only day and month are used.
    pub date_overrides: HashMap<u64, NaiveDate>,
    /// Episodes whose scraped date is right despite what the title says.
    pub correct_dates: HashSet<u64>,
    /// Titles containing this are never date-corrected.
    pub returns_marker: String,
}

impl Default for ReconcileRules {
    fn default() -> Self {
        let date_overrides = [
            (2744131, (2014, 3, 21)),
            (1865221, (2007, 3, 26)),
            (1865227, (2007, 3, 16)),
        ]
        .into_iter()
        .filter_map(|(id, (y, m, d))| NaiveDate::from_ymd_opt(y, m, d).map(|date| (id, date)))
        .collect();

        Self {
            date_overrides,
            correct_dates: [2652979, 2461292, 2231202].into_iter().collect(),
            returns_marker: "Podcast Returns".to_string(),
        }
    }
}

impl ReconcileRules {
    /// Load rules from a JSON file; absent fields keep the built-in tables.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

// ── Reconciler ───────────────────────────────────────────────────────────────

pub struct Reconciler {
    rules: ReconcileRules,
}

impl Reconciler {
    pub fn new(rules: ReconcileRules) -> Self {
        Self { rules }
    }

    /// Reconcile one page worth of records. Non-audio records are dropped;
    /// the rest keep their order.
    pub fn reconcile_batch(&self, records: Vec<EpisodeRecord>) -> Vec<Episode> {
        records
            .into_iter()
            .filter_map(|record| self.reconcile(record))
            .collect()
    }

    /// `None` when the record's media is not an audio file.
    pub fn reconcile(&self, mut record: EpisodeRecord) -> Option<Episode> {
        let extension = media_extension(record.media.as_str());
        if !extension.eq_ignore_ascii_case(AUDIO_EXTENSION) {
            tracing::info!(
                "Dropping episode '{}' ({}): media {} is not {}",
                record.title,
                record.id,
                record.media.as_str(),
                AUDIO_EXTENSION
            );
            return None;
        }

        self.resolve_release_date(&mut record);
        warn_if_weekend(&record);

        let title = titles::normalize(&record.title);
        let date = record.release_date;

        let display_date = format!("{}, {} {}", date.format("%a"), date.day(), date.format("%b"));
        let file_date = date.format("%Y-%m-%d").to_string();

        let (display_title, file_title) = if title.is_empty() {
            (display_date, file_date)
        } else {
            (
                format!("{} - {}", display_date, title),
                format!("{} - {}", file_date, title),
            )
        };

        Some(Episode {
            id: record.id,
            title: display_title,
            filename: sanitize(&format!("{} - {}{}", SHOW_NAME, file_title, extension)),
            release_date: date,
            track_number: date.ordinal(),
            file_url: record.media.as_str().to_string(),
        })
    }

    fn resolve_release_date(&self, record: &mut EpisodeRecord) {
        if let Some(date) = self.rules.date_overrides.get(&record.id) {
            tracing::info!(
                "Manual date override ({}) of episode '{}' ({})",
                date,
                record.title,
                record.id
            );
            set_day_month(record, date.day(), date.month(), "manual override");
            return;
        }

        if self.rules.correct_dates.contains(&record.id)
            || (!self.rules.returns_marker.is_empty()
                && record.title.contains(&self.rules.returns_marker))
        {
            tracing::debug!("Keeping listed date of episode {}", record.id);
            return;
        }

        // The body is only consulted when the title carries no date at all.
        let (found, source) = match dates::resolve(&record.title) {
            Some(date) => (Some(date), "title"),
            None => (record.body.as_deref().and_then(dates::resolve), "body"),
        };

        if let Some(found) = found {
            if found.has_year && found.date.year() != record.release_date.year() {
                tracing::debug!(
                    "Episode {} {} names year {}; keeping {}",
                    record.id,
                    source,
                    found.date.year(),
                    record.release_date.year()
                );
            }
            if !found.same_day_and_month(record.release_date) {
                tracing::warn!(
                    "Overriding date {} of episode '{}' ({}) with parsed date from {}: {}",
                    record.release_date,
                    record.title,
                    record.id,
                    source,
                    found.date.format("%d/%m")
                );
                set_day_month(record, found.day(), found.month(), source);
            }
        }
    }
}

/// Replace day and month, keeping the year. Leaves the date alone when the
/// combination does not exist in that year (29 Feb outside a leap year).
fn set_day_month(record: &mut EpisodeRecord, day: u32, month: u32, source: &str) {
    match NaiveDate::from_ymd_opt(record.release_date.year(), month, day) {
        Some(date) => record.release_date = date,
        None => tracing::warn!(
            "Ignoring {} date {:02}/{:02} for episode '{}' ({}): not valid in {}",
            source,
            day,
            month,
            record.title,
            record.id,
            record.release_date.year()
        ),
    }
}

fn warn_if_weekend(record: &EpisodeRecord) {
    if matches!(record.release_date.weekday(), Weekday::Sat | Weekday::Sun) {
        tracing::warn!(
            "Episode '{}' ({}) with date {} falls on a weekend",
            record.title,
            record.id,
            record.release_date
        );
    }
}

/// Extension of the media path including the dot, or `""`. URL query strings
/// and fragments are ignored.
pub fn media_extension(media: &str) -> String {
    let path = match Url::parse(media) {
        Ok(url) => url.path().to_string(),
        Err(_) => media.to_string(),
    };
    Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}
