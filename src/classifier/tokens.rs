/// Lowercased alphanumeric words, split on every other character.
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether `phrase` occurs as consecutive tokens in `tokens`.
pub fn contains_phrase(tokens: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && tokens.windows(phrase.len()).any(|window| window == phrase)
}

/// At most `max` characters of `text`, whitespace collapsed.
pub fn sample(text: &str, max: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(max).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_unicode_aware() {
        assert_eq!(
            words("Grüße aus KÖLN! 2024er-Folge, let's play"),
            vec!["grüße", "aus", "köln", "2024er", "folge", "let", "s", "play"]
        );
        assert!(words(" ,.!? ").is_empty());
    }

    #[test]
    fn phrase_matching_needs_adjacent_tokens() {
        let tokens = words("wir spielen heute lets play mit euch");
        assert!(contains_phrase(&tokens, &words("lets play")));
        assert!(!contains_phrase(&tokens, &words("spielen euch")));
        assert!(!contains_phrase(&tokens, &[]));
    }

    #[test]
    fn sample_truncates_on_char_boundaries() {
        assert_eq!(sample("äöü  ß", 10), "äöü ß");
        assert_eq!(sample("äöüß", 2), "äö…");
    }
}
