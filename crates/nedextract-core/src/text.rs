fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn starts_on_boundary(text: &str, start: usize, phrase: &str) -> bool {
    if !phrase.starts_with(is_word_char) {
        return true;
    }
    !text[..start].chars().next_back().is_some_and(is_word_char)
}

fn ends_on_boundary(text: &str, end: usize, phrase: &str) -> bool {
    if !phrase.ends_with(is_word_char) {
        return true;
    }
    !text[end..].chars().next().is_some_and(is_word_char)
}

/// Byte offsets of every non-overlapping whole-word occurrence of `phrase`.
pub fn whole_word_positions(text: &str, phrase: &str) -> Vec<usize> {
    if phrase.is_empty() {
        return Vec::new();
    }
    text.match_indices(phrase)
        .filter(|(start, _)| {
            starts_on_boundary(text, *start, phrase)
                && ends_on_boundary(text, start + phrase.len(), phrase)
        })
        .map(|(start, _)| start)
        .collect()
}

pub fn count_whole_word(text: &str, phrase: &str) -> usize {
    whole_word_positions(text, phrase).len()
}

pub fn contains_whole_word(text: &str, phrase: &str) -> bool {
    !whole_word_positions(text, phrase).is_empty()
}

/// Case-insensitive whole-word count. Hyphens in the text are dropped when
/// the phrase has none.
pub fn count_mentions(text: &str, phrase: &str) -> usize {
    let phrase = phrase.to_lowercase();
    let text = if phrase.contains('-') {
        text.to_lowercase()
    } else {
        text.replace('-', "").to_lowercase()
    };
    count_whole_word(&text, &phrase)
}

/// Trim surrounding whitespace and punctuation, keeping the case.
pub fn normalize_mention(raw: &str) -> String {
    raw.trim_matches(|c: char| !c.is_alphanumeric()).to_string()
}

/// Lowercased alphanumeric tokens; everything else separates.
pub fn word_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_word_positions() {
        let text = "Bank, Bankier en ABCBank. Bank";
        assert_eq!(whole_word_positions(text, "Bank"), vec![0, 26]);
        assert_eq!(count_whole_word(text, "Bankier"), 1);
        assert!(!contains_whole_word(text, "Ban"));
    }

    #[test]
    fn test_count_mentions_ignores_case_and_hyphens() {
        let text = "Het Rode Kruis en het rode kruis. Rode-Kruis";
        assert_eq!(count_mentions(text, "Rode Kruis"), 2);
        assert_eq!(count_mentions("Stichting Rode-Kruis", "Rode-Kruis"), 1);
    }

    #[test]
    fn test_normalize_mention() {
        assert_eq!(normalize_mention(" (Stichting X B.V.). "), "Stichting X B.V");
        assert_eq!(normalize_mention("ABCbank,"), "ABCbank");
        assert_eq!(normalize_mention("..."), "");
    }

    #[test]
    fn test_word_tokens() {
        assert_eq!(
            word_tokens("De voorzitter, Jane-Doe."),
            vec!["de", "voorzitter", "jane", "doe"]
        );
    }
}
