use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::ScrapeError;
use crate::models::{EpisodeRecord, MediaRef};

// ── Constants ────────────────────────────────────────────────────────────────

/// Base that protocol-relative player sources are resolved against.
const PLAYER_BASE: &str = "http://handa.libsyn.com/";
const RELEASE_DATE_FORMAT: &str = "%b %d, %Y";

// ── Lazy statics ─────────────────────────────────────────────────────────────

static ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,10}").unwrap());

static MEDIA_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"mediaURL = "(https?://[^"\s]+)";"#).unwrap());

static ITEM_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.libsyn-item").unwrap());
static RELEASE_DATE_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.libsyn-item-release-date").unwrap());
static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.libsyn-item-title").unwrap());
static BODY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div.libsyn-item-body").unwrap());
static PLAYER_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.libsyn-item-player").unwrap());
static PAGINATION_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".libsyn-pagination").unwrap());
static ANCHOR_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static IFRAME_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("iframe").unwrap());
static BODY_SCRIPT_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("body script").unwrap());

// ── Listing pages ────────────────────────────────────────────────────────────

/// Every episode fragment on a listing page, in document order.
pub fn episode_fragments(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&ITEM_SEL).collect()
}

/// Total page count: the last numbered link of the pagination control.
pub fn page_count(document: &Html) -> Result<u32, ScrapeError> {
    let pagination = document
        .select(&PAGINATION_SEL)
        .next()
        .ok_or_else(|| ScrapeError::Structure(".libsyn-pagination is missing".to_string()))?;

    pagination
        .select(&ANCHOR_SEL)
        .filter_map(|a| normalize_text(collect_text(a)).parse::<u32>().ok())
        .last()
        .ok_or_else(|| {
            ScrapeError::Structure(".libsyn-pagination has no numbered links".to_string())
        })
}

// ── Episode fragments ────────────────────────────────────────────────────────

pub fn parse_episode(item: ElementRef<'_>) -> Result<EpisodeRecord, ScrapeError> {
    let id_attr = item.value().attr("id").unwrap_or("");
    let id = ID_RE
        .find(id_attr)
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .ok_or_else(|| {
            ScrapeError::Structure(
                "div.libsyn-item id attribute does not contain integer".to_string(),
            )
        })?;

    let release_date = release_date(item)?;

    let title = item
        .select(&TITLE_SEL)
        .next()
        .and_then(|container| container.select(&ANCHOR_SEL).next())
        .map(|a| collect_text(a).trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            ScrapeError::Structure(
                "div.libsyn-item-title or child 'a' child element is missing".to_string(),
            )
        })?;

    let body = item.select(&BODY_SEL).next().map(stripped_strings);

    let src = item
        .select(&PLAYER_SEL)
        .next()
        .and_then(|container| container.select(&IFRAME_SEL).next())
        .and_then(|iframe| iframe.value().attr("src"))
        .ok_or_else(|| {
            ScrapeError::Structure(
                "div.libsyn-item-player or 'iframe' child element is missing".to_string(),
            )
        })?;

    Ok(EpisodeRecord {
        id,
        release_date,
        title,
        body,
        media: MediaRef::Player(absolute_player_url(src)?),
    })
}

fn release_date(item: ElementRef<'_>) -> Result<NaiveDate, ScrapeError> {
    let container = item.select(&RELEASE_DATE_SEL).next().ok_or_else(|| {
        ScrapeError::Structure("div.libsyn-item-release-date is missing".to_string())
    })?;

    let text = container
        .text()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or("");

    NaiveDate::parse_from_str(text, RELEASE_DATE_FORMAT).map_err(|e| {
        ScrapeError::Structure(format!("release date {:?} is malformed: {}", text, e))
    })
}

fn absolute_player_url(src: &str) -> Result<String, ScrapeError> {
    let base = Url::parse(PLAYER_BASE).map_err(|e| ScrapeError::Structure(e.to_string()))?;
    base.join(src.trim())
        .map(|u| u.to_string())
        .map_err(|e| ScrapeError::Structure(format!("player src {:?}: {}", src, e)))
}

// ── Player pages ─────────────────────────────────────────────────────────────

/// Pull the direct audio URL out of an embedded player page.
pub fn media_url_from_player(html: &str) -> Result<String, ScrapeError> {
    let document = Html::parse_document(html);

    let script = document
        .select(&BODY_SCRIPT_SEL)
        .find(|s| s.value().attr("src").is_none())
        .ok_or_else(|| ScrapeError::Structure("player page has no inline script".to_string()))?;

    let text = collect_text(script);
    MEDIA_URL_RE
        .captures(text.trim())
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            ScrapeError::Structure("player script does not assign mediaURL".to_string())
        })
}

// ── DOM utility helpers ──────────────────────────────────────────────────────

/// Recursively collect all text from an element and its descendants.
fn collect_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join("")
}

/// Collapse whitespace and trim.
fn normalize_text(text: String) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Each non-blank text node, trimmed and newline-terminated.
fn stripped_strings(el: ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .fold(String::new(), |mut acc, s| {
            acc.push_str(s);
            acc.push('\n');
            acc
        })
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn parse_single(html: &str) -> Result<EpisodeRecord, ScrapeError> {
        let document = Html::parse_document(html);
        let item = episode_fragments(&document)
            .into_iter()
            .next()
            .expect("fixture has an item");
        parse_episode(item)
    }

    #[test]
    fn parses_a_complete_fragment() {
        let html = item(2744131, "Mar 24, 2014", "Hamish &amp; Andy - Fri 21st March 2014", "no");
        let record = parse_single(&html).unwrap();

        assert_eq!(record.id, 2744131);
        assert_eq!(record.release_date, NaiveDate::from_ymd_opt(2014, 3, 24).unwrap());
        assert_eq!(record.title, "Hamish & Andy - Fri 21st March 2014");
        assert_eq!(record.body.as_deref(), Some("Episode 2744131.\n"));
        assert_eq!(record.media, MediaRef::Player(player_url(2744131, "no")));
    }

    #[test]
    fn body_is_optional_and_flattened() {
        let without = r#"<div class="libsyn-item" id="item-7">
  <div class="libsyn-item-release-date">Jan 02, 2009</div>
  <div class="libsyn-item-title"><a>  Plain  </a></div>
  <div class="libsyn-item-player"><iframe src="//example.com/p/7"></iframe></div>
</div>"#;
        let record = parse_single(without).unwrap();
        assert_eq!(record.body, None);
        assert_eq!(record.title, "Plain");

        let with = without.replace(
            r#"<div class="libsyn-item-player">"#,
            r#"<div class="libsyn-item-body">
  <p> First line </p>
  <p>Recorded <b>Thurs 1st Jan</b></p>
</div>
<div class="libsyn-item-player">"#,
        );
        let record = parse_single(&with).unwrap();
        assert_eq!(record.body.as_deref(), Some("First line\nRecorded\nThurs 1st Jan\n"));
    }

    #[test]
    fn missing_elements_are_structure_errors() {
        let good = item(42, "Mar 24, 2014", "Title", "no");
        let cases = [
            good.replace("libsyn-item-42", "no-digits"),
            good.replace("libsyn-item-release-date", "release"),
            good.replace("Mar 24, 2014", "sometime"),
            good.replace(r#"<a href="/webpage/42">Title</a>"#, "Title"),
            good.replace(r#"<a href="/webpage/42">Title</a>"#, "<a> </a>"),
            good.replace("<iframe", "<video").replace("</iframe>", "</video>"),
        ];
        for html in cases {
            assert!(
                matches!(parse_single(&html), Err(ScrapeError::Structure(_))),
                "{html}"
            );
        }
    }

    #[test]
    fn page_count_is_last_numbered_link() {
        let document = Html::parse_document(&listing(5, &[]));
        assert_eq!(page_count(&document).unwrap(), 5);

        let document = Html::parse_document("<html><body><p>nothing</p></body></html>");
        assert!(matches!(page_count(&document), Err(ScrapeError::Structure(_))));
    }

    #[test]
    fn media_url_comes_from_inline_script() {
        let html = player_page("http://traffic.libsyn.com/handa/HA_2014_03_21.mp3");
        assert_eq!(
            media_url_from_player(&html).unwrap(),
            "http://traffic.libsyn.com/handa/HA_2014_03_21.mp3"
        );

        let html = "<html><body><script>var other = 1;</script></body></html>";
        assert!(matches!(
            media_url_from_player(html),
            Err(ScrapeError::Structure(_))
        ));
    }
}
