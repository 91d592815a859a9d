use unicode_normalization::UnicodeNormalization;

/// Make a display string safe to use as a filename.
pub fn sanitize(name: &str) -> String {
    let ascii: String = name
        .replace('\u{2019}', "'")
        .nfkd()
        .filter(char::is_ascii)
        .collect();

    ascii
        .replace('/', " + ")
        .replace(": ", " - ")
        .replace(':', ".")
        .replace('?', "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curly_apostrophe_and_question_mark() {
        assert_eq!(sanitize("Who’s Who?"), "Who's Who");
    }

    #[test]
    fn accents_are_folded() {
        assert_eq!(sanitize("Café Olé"), "Cafe Ole");
        assert_eq!(sanitize("“Quoted” — dash"), "Quoted  dash");
    }

    #[test]
    fn path_and_colon_replacements() {
        assert_eq!(sanitize("AC/DC"), "AC + DC");
        assert_eq!(sanitize("Part 1: The Start"), "Part 1 - The Start");
        assert_eq!(sanitize("10:30 Show"), "10.30 Show");
    }

    #[test]
    fn output_never_has_forbidden_characters() {
        for input in [
            "a/b:c?d",
            "::??//",
            " : / ? ",
            "Hamish & Andy - 2014-03-21 - What?: A/B",
            "\u{FF1A}fullwidth\u{FF1F}",
        ] {
            let out = sanitize(input);
            assert!(!out.contains(['/', ':', '?']), "{input:?} -> {out:?}");
        }
    }
}
