//! Rule-based sentiment classification.
//!
//! Classification goes through the [`SentimentClassifier`] trait so a
//! statistical model can replace the keyword rules without touching
//! filtering or aggregation.

use crate::analysis::text::{contains_any, normalize_keywords};
use crate::config::ClassifierConfig;
use crate::models::Sentiment;

/// Maps a feedback text to a sentiment label.
pub trait SentimentClassifier {
    /// Classify a text. Must be total: every input yields a label.
    fn classify(&self, text: &str) -> Sentiment;
}

/// Keyword classifier with ordered rules.
///
/// Rules are evaluated in declaration order and the first rule with a
/// matching keyword decides the label. Positive rules come first, so text
/// with both positive and negative keywords is Positive.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(Sentiment, Vec<String>)>,
    fallback: Sentiment,
}

impl KeywordClassifier {
    /// Build a classifier from positive and negative keyword lists.
    pub fn new(positive: &[String], negative: &[String]) -> Self {
        Self {
            rules: vec![
                (Sentiment::Positive, normalize_keywords(positive)),
                (Sentiment::Negative, normalize_keywords(negative)),
            ],
            fallback: Sentiment::Neutral,
        }
    }

    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self::new(&config.positive, &config.negative)
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::from_config(&ClassifierConfig::default())
    }
}

impl SentimentClassifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Sentiment {
        let lower = text.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| contains_any(&lower, keywords))
            .map(|(label, _)| *label)
            .unwrap_or(self.fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_only() {
        let c = KeywordClassifier::default();
        assert_eq!(c.classify("Great service!"), Sentiment::Positive);
        assert_eq!(c.classify("I LOVE this shop"), Sentiment::Positive);
        assert_eq!(c.classify("Staff were friendly"), Sentiment::Positive);
    }

    #[test]
    fn test_negative_only() {
        let c = KeywordClassifier::default();
        assert_eq!(c.classify("Defective product, very bad"), Sentiment::Negative);
        assert_eq!(c.classify("Support was UNRESPONSIVE"), Sentiment::Negative);
        assert_eq!(c.classify("The aisles were messy"), Sentiment::Negative);
    }

    #[test]
    fn test_positive_takes_precedence() {
        let c = KeywordClassifier::default();
        assert_eq!(
            c.classify("Great prices but poor packaging"),
            Sentiment::Positive
        );
        assert_eq!(c.classify("bad checkout, amazing staff"), Sentiment::Positive);
    }

    #[test]
    fn test_neutral() {
        let c = KeywordClassifier::default();
        assert_eq!(c.classify("Average experience"), Sentiment::Neutral);
        assert_eq!(c.classify(""), Sentiment::Neutral);
        assert_eq!(c.classify("   "), Sentiment::Neutral);
    }

    #[test]
    fn test_substring_matching() {
        // Substring match, not word match: "badge" contains "bad".
        let c = KeywordClassifier::default();
        assert_eq!(c.classify("Lost my badge"), Sentiment::Negative);
    }

    #[test]
    fn test_custom_keywords() {
        let c = KeywordClassifier::new(&["Superb".to_string()], &["awful".to_string()]);
        assert_eq!(c.classify("superb fit"), Sentiment::Positive);
        assert_eq!(c.classify("Awful fit"), Sentiment::Negative);
        assert_eq!(c.classify("great fit"), Sentiment::Neutral);
    }

    #[test]
    fn test_trait_object() {
        struct AlwaysNegative;
        impl SentimentClassifier for AlwaysNegative {
            fn classify(&self, _text: &str) -> Sentiment {
                Sentiment::Negative
            }
        }

        let classifiers: Vec<Box<dyn SentimentClassifier>> =
            vec![Box::new(KeywordClassifier::default()), Box::new(AlwaysNegative)];
        let labels: Vec<_> = classifiers.iter().map(|c| c.classify("love it")).collect();
        assert_eq!(labels, vec![Sentiment::Positive, Sentiment::Negative]);
    }
}
