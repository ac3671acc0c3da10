//! Transcript text tokenizer.
//!
//! Normalization must be identical on the ingest and query paths, otherwise
//! indexed terms can never match query terms. Everything here is a pure
//! function of its input.

/// Tokens shorter than this are dropped unless they are purely numeric
/// (numbers like "7" stay searchable).
const MIN_TOKEN_CHARS: usize = 2;

/// Tokenize text into a finite, restartable stream of (term, position)
/// pairs, the position being the term's index in the normalized stream.
///
/// Lowercases, splits on non-alphanumeric characters and drops one-character
/// tokens that are not digits.
pub fn tokens(text: &str) -> impl Iterator<Item = (String, u32)> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .filter(|s| s.chars().count() >= MIN_TOKEN_CHARS || s.chars().all(|c| c.is_ascii_digit()))
        .enumerate()
        .map(|(i, term)| (term, i as u32))
}

/// Tokenize into bare terms, keeping duplicates.
pub fn tokenize(text: &str) -> Vec<String> {
    tokens(text).map(|(term, _)| term).collect()
}

/// Tokenize and deduplicate, preserving first-seen order. Used on the query
/// path where each term is looked up once.
pub fn tokenize_unique(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokens(text)
        .map(|(term, _)| term)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_splits_on_punctuation() {
        assert_eq!(tokenize("Hello, World!"), vec!["hello", "world"]);
    }

    #[test]
    fn drops_single_letters_keeps_digits() {
        assert_eq!(tokenize("I bought 7 apples"), vec!["bought", "7", "apples"]);
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(tokenize("  world   peace \t now "), vec!["world", "peace", "now"]);
    }

    #[test]
    fn empty_and_punctuation_only_yield_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("...?!---").is_empty());
    }

    #[test]
    fn positions_follow_the_normalized_stream() {
        let toks: Vec<(String, u32)> = tokens("So... hello world").collect();
        assert_eq!(toks[0], ("so".to_string(), 0));
        assert_eq!(toks[1], ("hello".to_string(), 1));
        assert_eq!(toks[2], ("world".to_string(), 2));
    }

    #[test]
    fn same_input_same_output() {
        let a = tokenize("Mixed CASE text, twice.");
        let b = tokenize("Mixed CASE text, twice.");
        assert_eq!(a, b);
    }

    #[test]
    fn unique_preserves_first_seen_order() {
        assert_eq!(
            tokenize_unique("world peace WORLD now"),
            vec!["world", "peace", "now"]
        );
    }
}
