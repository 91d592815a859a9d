use scraper::Html;

use crate::error::ScrapeError;
use crate::extract;
use crate::fetch::Fetch;
use crate::models::{EpisodeRecord, MediaRef};

pub const ARCHIVE_URL: &str = "http://handa.libsyn.com/page/";

/// Players embedded without a thumbnail are audio; the rest are video.
const AUDIO_PLAYER_MARKER: &str = "thumbnail/no";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapePhase {
    Init,
    Scanning,
    Exhausted,
}

/// Cumulative counters shared across page fetches. Pages must be fetched in
/// order for `offset` and `limit` to stay meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScrapeState {
    pub phase: ScrapePhase,
    pub page_number: u32,
    /// Unknown until the first page has been parsed.
    pub page_count: Option<u32>,
    pub offset: usize,
    /// Remaining episode budget; `None` is unbounded.
    pub limit: Option<usize>,
}

impl PageScrapeState {
    pub fn new(page_number: u32, offset: usize, limit: Option<usize>) -> Self {
        Self {
            phase: ScrapePhase::Init,
            page_number: page_number.max(1),
            page_count: None,
            offset,
            limit,
        }
    }

    fn limit_reached(&self) -> bool {
        self.limit == Some(0)
    }

    fn past_last_page(&self) -> bool {
        self.page_count.is_some_and(|count| self.page_number > count)
    }
}

pub struct PageScraper<F> {
    fetcher: F,
    archive_url: String,
    dry_run: bool,
    pub state: PageScrapeState,
    episodes: Vec<EpisodeRecord>,
}

impl<F: Fetch> PageScraper<F> {
    pub fn new(
        fetcher: F,
        archive_url: impl Into<String>,
        state: PageScrapeState,
        dry_run: bool,
    ) -> Self {
        Self {
            fetcher,
            archive_url: archive_url.into(),
            dry_run,
            state,
            episodes: Vec::new(),
        }
    }

    /// Fetch and process the next listing page. `Ok(false)` once the archive
    /// or the episode budget is exhausted.
    pub async fn fetch_next_page(&mut self) -> Result<bool, ScrapeError> {
        self.episodes.clear();

        if self.state.phase == ScrapePhase::Exhausted {
            return Ok(false);
        }
        if self.state.limit_reached() || self.state.past_last_page() {
            self.state.phase = ScrapePhase::Exhausted;
            return Ok(false);
        }

        let url = format!("{}{}", self.archive_url, self.state.page_number);
        tracing::info!("Scanning page {}", self.state.page_number);
        let html = self.fetch_ok(&url).await?;

        let Some(records) = self.parse_listing(&html)? else {
            tracing::info!("Page {} has no episodes", self.state.page_number);
            self.state.phase = ScrapePhase::Exhausted;
            return Ok(false);
        };

        for mut record in records {
            if !record.media.as_str().contains(AUDIO_PLAYER_MARKER) {
                tracing::debug!("Skipping video episode {} ({})", record.id, record.title);
                continue;
            }

            record.media = MediaRef::Audio(self.resolve_media(&record).await?);
            self.episodes.push(record);

            if let Some(limit) = self.state.limit.as_mut() {
                *limit -= 1;
                if *limit == 0 {
                    break;
                }
            }
        }

        self.state.phase = ScrapePhase::Scanning;
        self.state.page_number += 1;
        Ok(true)
    }

    /// Episodes accepted from the most recent page.
    pub fn episodes(&self) -> &[EpisodeRecord] {
        &self.episodes
    }

    pub fn take_episodes(&mut self) -> Vec<EpisodeRecord> {
        std::mem::take(&mut self.episodes)
    }

    /// Discover the page count if needed, consume the offset and extract the
    /// remaining fragments. `None` when the page has no fragments at all.
    /// The parsed document never lives across an await.
    fn parse_listing(&mut self, html: &str) -> Result<Option<Vec<EpisodeRecord>>, ScrapeError> {
        let document = Html::parse_document(html);

        let fragments = extract::episode_fragments(&document);
        if fragments.is_empty() {
            return Ok(None);
        }

        if self.state.page_count.is_none() {
            let count = extract::page_count(&document)?;
            tracing::info!("Archive has {} pages", count);
            self.state.page_count = Some(count);
        }

        let budget = self.state.limit.unwrap_or(usize::MAX);
        let mut records = Vec::new();
        let mut audio_candidates = 0usize;

        for fragment in fragments {
            if self.state.offset > 0 {
                self.state.offset -= 1;
                continue;
            }
            let record = extract::parse_episode(fragment)?;
            if record.media.as_str().contains(AUDIO_PLAYER_MARKER) {
                audio_candidates += 1;
            }
            records.push(record);
            if audio_candidates >= budget {
                break;
            }
        }

        Ok(Some(records))
    }

    async fn resolve_media(&self, record: &EpisodeRecord) -> Result<String, ScrapeError> {
        if self.dry_run {
            return Ok(format!("{}.mp3", record.release_date.format("%Y-%m-%d")));
        }
        let html = self.fetch_ok(record.media.as_str()).await?;
        extract::media_url_from_player(&html)
    }

    async fn fetch_ok(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.fetcher.get(url).await?;
        if !response.is_success() {
            return Err(ScrapeError::Transport {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok(response.body)
    }
}
