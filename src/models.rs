use chrono::NaiveDate;
use serde::Serialize;

/// Where an episode's audio lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    /// Embedded player page, still to be resolved.
    Player(String),
    /// Direct audio URL (or a dry-run placeholder filename).
    Audio(String),
}

impl MediaRef {
    pub fn as_str(&self) -> &str {
        match self {
            MediaRef::Player(url) | MediaRef::Audio(url) => url,
        }
    }
}

/// One episode as scraped from a listing page.
#[derive(Debug, Clone)]
pub struct EpisodeRecord {
    pub id: u64,
    pub release_date: NaiveDate,
    pub title: String,
    pub body: Option<String>,
    pub media: MediaRef,
}

/// A reconciled episode, ready for download and tagging.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Episode {
    pub id: u64,
    pub title: String,
    pub filename: String,
    pub release_date: NaiveDate,
    pub track_number: u32,
    pub file_url: String,
}
