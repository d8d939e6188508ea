//! Text helpers shared by the classifiers and reducers.

use std::collections::HashSet;
use std::sync::OnceLock;

/// English stop words excluded from term statistics.
const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for",
    "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself",
    "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself", "just",
    "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once",
    "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she",
    "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "until", "up", "very", "was", "we", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours", "yourself",
    "yourselves", "don", "didn", "doesn", "isn", "wasn", "weren", "won", "wouldn", "couldn",
    "shouldn", "aren", "hasn", "haven", "ll", "ve", "re",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Returns true for common English words with no topical value.
pub fn is_stop_word(word: &str) -> bool {
    stop_words().contains(word)
}

/// Split text into lowercase alphabetic tokens of two or more letters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| w.chars().count() >= 2)
        .map(String::from)
        .collect()
}

/// Tokenize and drop stop words.
pub fn content_words(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|w| !is_stop_word(w))
        .collect()
}

/// Case-insensitive substring test against lowercase keywords.
///
/// `keywords` must already be lowercase.
pub fn contains_any(text_lower: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text_lower.contains(k.as_str()))
}

/// Lowercase and trim a keyword list, dropping empty entries.
pub fn normalize_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}
