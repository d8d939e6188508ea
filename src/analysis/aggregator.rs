//! Feedback aggregation and statistics.
//!
//! Pure reducers over record sequences. Every reducer accepts an empty
//! sequence and returns an empty or zero result.

use crate::analysis::text::content_words;
use crate::models::{
    FeedbackRecord, Sentiment, SentimentCounts, ThemeImpact, ThemeSentimentCount, TrendPoint,
    WordFrequency,
};
use std::collections::{BTreeMap, HashMap};

/// Count records per sentiment.
pub fn sentiment_counts<'a, I>(records: I) -> SentimentCounts
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    SentimentCounts::from_records(records)
}

/// Count records per theme.
pub fn theme_counts<'a, I>(records: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();

    for record in records {
        *counts.entry(record.theme().to_string()).or_default() += 1;
    }

    counts
}

/// Count records per (theme, sentiment) pair, ordered by theme then sentiment.
pub fn theme_sentiment_counts<'a, I>(records: I) -> Vec<ThemeSentimentCount>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let mut counts: BTreeMap<(String, Sentiment), usize> = BTreeMap::new();

    for record in records {
        *counts
            .entry((record.theme().to_string(), record.sentiment()))
            .or_default() += 1;
    }

    counts
        .into_iter()
        .map(|((theme, sentiment), count)| ThemeSentimentCount {
            theme,
            sentiment,
            count,
        })
        .collect()
}

/// Mean impact score of one theme, or `None` if the theme has no records.
pub fn average_impact<'a, I>(records: I, theme: &str) -> Option<f64>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let (sum, count) = records
        .into_iter()
        .filter(|r| r.theme() == theme)
        .fold((0.0, 0usize), |(sum, count), r| {
            (sum + r.sentiment().impact(), count + 1)
        });

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Frequency and average impact for every observed theme.
///
/// Sorted by frequency (highest first), then theme name.
pub fn theme_impacts<'a, I>(records: I) -> Vec<ThemeImpact>
where
    I: IntoIterator<Item = &'a FeedbackRecord> + Clone,
{
    let mut impacts: Vec<ThemeImpact> = theme_counts(records.clone())
        .into_iter()
        .filter_map(|(theme, frequency)| {
            let impact = average_impact(records.clone(), &theme)?;
            Some(ThemeImpact {
                theme,
                frequency,
                impact,
            })
        })
        .collect();

    impacts.sort_by_key(|t| std::cmp::Reverse(t.frequency));
    impacts
}

/// Sentiment counts per day, in date order.
pub fn sentiment_trend<'a, I>(records: I) -> Vec<TrendPoint>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let mut by_date: BTreeMap<chrono::NaiveDate, SentimentCounts> = BTreeMap::new();

    for record in records {
        by_date
            .entry(record.date())
            .or_default()
            .add(record.sentiment());
    }

    by_date
        .into_iter()
        .map(|(date, counts)| TrendPoint { date, counts })
        .collect()
}

/// Most frequent content words in feedback with the given sentiment.
pub fn word_frequencies<'a, I>(records: I, sentiment: Sentiment, n: usize) -> Vec<WordFrequency>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    let mut counts: HashMap<String, usize> = HashMap::new();

    for record in records.into_iter().filter(|r| r.sentiment() == sentiment) {
        for word in content_words(record.text()) {
            *counts.entry(word).or_default() += 1;
        }
    }

    let mut words: Vec<WordFrequency> = counts
        .into_iter()
        .map(|(word, count)| WordFrequency { word, count })
        .collect();

    words.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.word.cmp(&b.word)));
    words.truncate(n);

    words
}

/// First `n` feedback texts with the given sentiment.
pub fn representative_samples<'a, I>(records: I, sentiment: Sentiment, n: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    records
        .into_iter()
        .filter(|r| r.sentiment() == sentiment)
        .take(n)
        .map(|r| r.text().to_string())
        .collect()
}

/// First `n` feedback texts, handed to the insight client.
pub fn text_sample<'a, I>(records: I, n: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    records
        .into_iter()
        .take(n)
        .map(|r| r.text().to_string())
        .collect()
}

/// Generate a text summary of sentiment statistics.
pub fn generate_summary_text(counts: &SentimentCounts, themes: &BTreeMap<String, usize>) -> String {
    let mut lines = Vec::new();

    lines.push(format!("Total Feedback: {}", counts.total));
    for sentiment in Sentiment::ALL {
        lines.push(format!(
            "- {} {}: {} ({:.1}%)",
            sentiment.emoji(),
            sentiment,
            counts.get(sentiment),
            counts.percent(sentiment)
        ));
    }

    if !themes.is_empty() {
        lines.push(String::new());
        lines.push("By Theme:".to_string());

        let mut sorted: Vec<_> = themes.iter().collect();
        sorted.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

        for (theme, count) in sorted {
            lines.push(format!("- {}: {}", theme, count));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Dataset;
    use crate::models::RawRecord;
    use chrono::NaiveDate;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_dataset() -> Dataset {
        Dataset::with_defaults(vec![
            RawRecord::new("Great service!", ymd(2024, 1, 1)),
            RawRecord::new("Defective product, very bad", ymd(2024, 1, 2)),
            RawRecord::new("Average experience", ymd(2024, 1, 3)),
            RawRecord::new("Staff were unresponsive", ymd(2024, 1, 3)),
            RawRecord::new("Love the product quality", ymd(2024, 1, 3)),
            RawRecord::new("Poor service at the desk", ymd(2024, 1, 4)),
        ])
        .unwrap()
    }

    #[test]
    fn test_counts_sum_to_total() {
        let data = create_test_dataset();

        let sentiments = sentiment_counts(data.records());
        assert_eq!(sentiments.total, data.len());
        assert_eq!(
            sentiments.positive + sentiments.negative + sentiments.neutral,
            data.len()
        );

        let themes = theme_counts(data.records());
        assert_eq!(themes.values().sum::<usize>(), data.len());
        assert_eq!(themes.get("Service"), Some(&3));
        assert_eq!(themes.get("Product"), Some(&2));
        assert_eq!(themes.get("General"), Some(&1));

        let pairs = theme_sentiment_counts(data.records());
        assert_eq!(pairs.iter().map(|p| p.count).sum::<usize>(), data.len());
    }

    #[test]
    fn test_theme_sentiment_counts() {
        let data = create_test_dataset();
        let pairs = theme_sentiment_counts(data.records());

        let service_negative = pairs
            .iter()
            .find(|p| p.theme == "Service" && p.sentiment == Sentiment::Negative)
            .map(|p| p.count);
        assert_eq!(service_negative, Some(2));
        assert_eq!(pairs[0].theme, "General");
    }

    #[test]
    fn test_average_impact() {
        let data = create_test_dataset();

        // Service: Positive, Negative, Negative.
        let service = average_impact(data.records(), "Service").unwrap();
        assert!((service - (-1.0 / 3.0)).abs() < 1e-9);

        // Product: Negative, Positive.
        assert_eq!(average_impact(data.records(), "Product"), Some(0.0));
        assert_eq!(average_impact(data.records(), "Delivery"), None);
    }

    #[test]
    fn test_theme_impacts() {
        let data = create_test_dataset();
        let impacts = theme_impacts(data.records());

        assert_eq!(impacts.len(), 3);
        assert_eq!(impacts[0].theme, "Service");
        assert_eq!(impacts[0].frequency, 3);
        assert!(impacts.iter().all(|t| t.impact.is_finite()));

        for item in &impacts {
            assert_eq!(
                Some(item.impact),
                average_impact(data.records(), &item.theme)
            );
        }
    }

    #[test]
    fn test_sentiment_trend() {
        let data = create_test_dataset();
        let trend = sentiment_trend(data.records());

        assert_eq!(trend.len(), 4);
        assert_eq!(trend[0].date, ymd(2024, 1, 1));
        assert_eq!(trend[2].date, ymd(2024, 1, 3));
        assert_eq!(trend[2].counts.total, 3);
        assert_eq!(trend[2].counts.neutral, 1);
    }

    #[test]
    fn test_word_frequencies() {
        let data = create_test_dataset();

        let negative = word_frequencies(data.records(), Sentiment::Negative, 3);
        assert_eq!(negative.len(), 3);
        assert!(negative.iter().all(|w| w.word != "the" && w.word != "very"));

        let positive = word_frequencies(data.records(), Sentiment::Positive, 100);
        assert!(positive.iter().any(|w| w.word == "service"));
    }

    #[test]
    fn test_samples() {
        let data = create_test_dataset();

        assert_eq!(
            representative_samples(data.records(), Sentiment::Positive, 3),
            vec!["Great service!", "Love the product quality"]
        );
        assert_eq!(
            representative_samples(data.records(), Sentiment::Negative, 1),
            vec!["Defective product, very bad"]
        );
        assert_eq!(text_sample(data.records(), 2).len(), 2);
        assert_eq!(text_sample(data.records(), 50).len(), data.len());
    }

    #[test]
    fn test_empty_input() {
        let empty: Vec<FeedbackRecord> = Vec::new();

        assert_eq!(sentiment_counts(&empty), SentimentCounts::default());
        assert!(theme_counts(&empty).is_empty());
        assert!(theme_sentiment_counts(&empty).is_empty());
        assert!(theme_impacts(&empty).is_empty());
        assert!(sentiment_trend(&empty).is_empty());
        assert!(word_frequencies(&empty, Sentiment::Positive, 10).is_empty());
        assert!(representative_samples(&empty, Sentiment::Negative, 3).is_empty());
        assert_eq!(average_impact(&empty, "Service"), None);
    }

    #[test]
    fn test_generate_summary_text() {
        let data = create_test_dataset();
        let text = generate_summary_text(
            &sentiment_counts(data.records()),
            &theme_counts(data.records()),
        );

        assert!(text.contains("Total Feedback: 6"));
        assert!(text.contains("Negative: 3"));
        assert!(text.contains("By Theme:"));
        assert!(text.contains("- Service: 3"));
    }
}
