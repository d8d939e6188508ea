//! Report assembly and rendering.

pub mod generator;

pub use generator::{
    generate_console_summary, generate_json_report, generate_markdown_report, write_report,
};

use crate::analysis::{
    representative_samples, sentiment_counts, sentiment_trend, theme_counts, theme_impacts,
    theme_sentiment_counts, word_frequencies, FilterCriteria, ThemeCatalog,
};
use crate::config::ReportConfig;
use crate::models::{
    AppliedFilters, FeedbackRecord, QuestionAnswer, Report, ReportMetadata, Sentiment,
};

/// Describe filter criteria for the report header.
pub fn describe_filters(criteria: &FilterCriteria) -> AppliedFilters {
    AppliedFilters {
        date_range: criteria.date_range.map(|r| (r.start, r.end)),
        sentiments: criteria.sentiments.to_string(),
        themes: criteria.themes.to_string(),
        search: criteria.search.clone().filter(|s| !s.is_empty()),
    }
}

/// Assemble a report from the filtered records and the model output.
pub fn build_report(
    records: &[&FeedbackRecord],
    catalog: &ThemeCatalog,
    config: &ReportConfig,
    metadata: ReportMetadata,
    insights: Option<Vec<String>>,
    answer: Option<QuestionAnswer>,
) -> Report {
    let records = records.iter().copied();

    let top_terms = if config.include_vocabulary {
        catalog
            .vocabulary()
            .iter()
            .map(|t| t.term.clone())
            .collect()
    } else {
        Vec::new()
    };

    Report {
        metadata,
        sentiment: sentiment_counts(records.clone()),
        themes: theme_counts(records.clone()),
        theme_sentiment: theme_sentiment_counts(records.clone()),
        priority: theme_impacts(records.clone()),
        trend: sentiment_trend(records.clone()),
        positive_words: word_frequencies(records.clone(), Sentiment::Positive, config.top_words),
        negative_words: word_frequencies(records.clone(), Sentiment::Negative, config.top_words),
        catalog: catalog.to_keywords(),
        top_terms,
        insights,
        answer,
        positive_samples: representative_samples(
            records.clone(),
            Sentiment::Positive,
            config.samples_per_sentiment,
        ),
        negative_samples: representative_samples(
            records,
            Sentiment::Negative,
            config.samples_per_sentiment,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{filter, Dataset, DateRange, Selection};
    use crate::models::RawRecord;
    use chrono::{NaiveDate, Utc};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn metadata(filters: AppliedFilters, total: usize, filtered: usize) -> ReportMetadata {
        ReportMetadata {
            source: "test.csv".to_string(),
            generated_at: Utc::now(),
            total_records: total,
            filtered_records: filtered,
            filters,
            model_used: None,
            duration_seconds: 0.0,
        }
    }

    #[test]
    fn test_describe_filters() {
        let criteria = FilterCriteria::all()
            .with_date_range(Some(DateRange::new(ymd(2024, 1, 1), ymd(2024, 1, 2))))
            .with_sentiments(Selection::only([Sentiment::Negative]))
            .with_search("");

        let applied = describe_filters(&criteria);
        assert_eq!(applied.date_range, Some((ymd(2024, 1, 1), ymd(2024, 1, 2))));
        assert_eq!(applied.sentiments, "Negative");
        assert_eq!(applied.themes, "All");
        assert_eq!(applied.search, None);
    }

    #[test]
    fn test_build_report() {
        let data = Dataset::with_defaults(vec![
            RawRecord::new("Great service!", ymd(2024, 1, 1)),
            RawRecord::new("Defective product, very bad", ymd(2024, 1, 2)),
            RawRecord::new("Average experience", ymd(2024, 1, 3)),
        ])
        .unwrap();

        let criteria = FilterCriteria::all();
        let filtered = filter(data.records(), &criteria);
        let report = build_report(
            &filtered,
            data.catalog(),
            &ReportConfig::default(),
            metadata(describe_filters(&criteria), data.len(), filtered.len()),
            Some(vec!["Fix quality control".to_string()]),
            None,
        );

        assert_eq!(report.sentiment.total, 3);
        assert_eq!(report.themes.len(), 3);
        assert_eq!(report.trend.len(), 3);
        assert_eq!(report.catalog.len(), 4);
        assert!(!report.top_terms.is_empty());
        assert_eq!(report.positive_samples, vec!["Great service!"]);
        assert_eq!(report.negative_samples, vec!["Defective product, very bad"]);
    }

    #[test]
    fn test_build_report_empty_and_no_vocabulary() {
        let data = Dataset::with_defaults(vec![RawRecord::new("Great service!", ymd(2024, 1, 1))])
            .unwrap();
        let config = ReportConfig {
            include_vocabulary: false,
            ..ReportConfig::default()
        };

        let report = build_report(
            &[],
            data.catalog(),
            &config,
            metadata(AppliedFilters::default(), data.len(), 0),
            Some(Vec::new()),
            None,
        );

        assert_eq!(report.sentiment.total, 0);
        assert!(report.themes.is_empty());
        assert!(report.priority.is_empty());
        assert!(report.top_terms.is_empty());
        assert!(report.positive_samples.is_empty());
        assert_eq!(report.insights, Some(Vec::new()));
    }
}
