use once_cell::sync::Lazy;
use regex::Regex;

use crate::dates;

const LEADING_JUNK: &[char] = &[' ', '-', '(', ','];

static SHOW_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*hamish\s*(?:&|and)\s*andy\s*-?").unwrap());

/// Reduce a raw episode title to the part worth displaying.
///
/// Passes repeat until the string is stable, so `normalize` is idempotent.
pub fn normalize(raw: &str) -> String {
    let mut current = raw.trim().to_string();
    loop {
        let next = normalize_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn normalize_once(title: &str) -> String {
    let stripped = SHOW_PREFIX_RE.replace(title, "");
    let stripped = strip_through_date(&stripped);
    let stripped = stripped.trim_start_matches(LEADING_JUNK);
    let stripped = if stripped.contains('(') {
        stripped
    } else {
        stripped.strip_suffix(')').unwrap_or(stripped)
    };
    stripped.trim_end().to_string()
}

/// Keep only what follows the first resolvable date. Anything in front of it,
/// a "Best of" marker included, goes with it.
fn strip_through_date(title: &str) -> String {
    match dates::find(title) {
        Some((span, _)) => dates::correct_typos(title)[span.end..].to_string(),
        None => title.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "Hamish & Andy - Fri 21st March 2014",
        "Hamish & Andy - Best Of Mon 10th Feb - Animal Week",
        "Hamish and Andy - Thurs 3rd Apr (Part 2)",
        "Hamish & Andy - Podcast Returns (Mon 12th Jan)",
        "Hamish & Andy - (Wed 5th Nov)",
        "Hamish & Andy - Fri 14th Febuary - Valentines",
        "Hamish & Andy - Hamish & Andy - Tue 1st July 2008, Gap Year",
        "Chatting about 5th May",
        "Hamish & Andy - Highlights 5th May",
        "Hamish & Andy - Episode 12 - Fri 21st March 2014",
        "Hamish & Andy - May Contain Traces - Tue 6th May",
        "",
        "   ",
        ")",
        "Ask Hamish & Andy",
    ];

    #[test]
    fn strips_show_name_and_date() {
        assert_eq!(normalize("Hamish & Andy - Fri 21st March 2014"), "");
        assert_eq!(
            normalize("Hamish & Andy - Best Of Mon 10th Feb - Animal Week"),
            "Animal Week"
        );
        assert_eq!(
            normalize("Hamish & Andy - Fri 14th Febuary - Valentines"),
            "Valentines"
        );
        assert_eq!(
            normalize("Hamish & Andy - Hamish & Andy - Tue 1st July 2008, Gap Year"),
            "Gap Year"
        );
    }

    #[test]
    fn trailing_paren_only_stripped_when_unbalanced() {
        assert_eq!(normalize("Hamish and Andy - Thurs 3rd Apr (Part 2)"), "Part 2");
        assert_eq!(
            normalize("Hamish & Andy - Grand Final Special (Part 2)"),
            "Grand Final Special (Part 2)"
        );
        assert_eq!(normalize("Hamish & Andy - (Wed 5th Nov)"), "");
        assert_eq!(normalize("Extra bit)"), "Extra bit");
    }

    #[test]
    fn text_before_a_date_is_dropped() {
        assert_eq!(normalize("Hamish & Andy - Highlights 5th May"), "");
        assert_eq!(normalize("Hamish & Andy - Episode 12 - Fri 21st March 2014"), "");
        assert_eq!(
            normalize("Hamish & Andy - Episode 12 - Fri 21st March 2014 - Encore"),
            "Encore"
        );
        assert_eq!(normalize("Hamish & Andy - Podcast Returns (Mon 12th Jan)"), "");
        assert_eq!(normalize("Chatting about 5th May"), "");
    }

    #[test]
    fn normalized_title_never_resolves_to_a_date() {
        for raw in SAMPLES {
            let title = normalize(raw);
            assert!(dates::resolve(&title).is_none(), "{raw:?} -> {title:?}");
        }
    }

    #[test]
    fn titles_without_dates_pass_through() {
        assert_eq!(normalize("Ask Hamish & Andy"), "Ask Hamish & Andy");
        assert_eq!(normalize("Hamish & Andy - Caravan of Courage"), "Caravan of Courage");
    }

    #[test]
    fn normalize_is_idempotent() {
        for raw in SAMPLES {
            let once = normalize(raw);
            assert_eq!(normalize(&once), once, "{raw:?}");
        }
    }
}
