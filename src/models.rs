//! Data models for the feedback synthesizer.
//!
//! This module contains the core data structures used throughout
//! the application for representing feedback records, summaries, and reports.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Theme assigned when no catalog keyword matches.
pub const FALLBACK_THEME: &str = "General";

/// Sentiment label attached to a feedback record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Every label, in display order.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral];

    /// Impact score used by the priority matrix.
    pub fn impact(&self) -> f64 {
        match self {
            Sentiment::Positive => 1.0,
            Sentiment::Neutral => 0.0,
            Sentiment::Negative => -1.0,
        }
    }

    /// Returns an emoji representation of the sentiment.
    pub fn emoji(&self) -> &'static str {
        match self {
            Sentiment::Positive => "🟢",
            Sentiment::Negative => "🔴",
            Sentiment::Neutral => "🟡",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "Positive"),
            Sentiment::Negative => write!(f, "Negative"),
            Sentiment::Neutral => write!(f, "Neutral"),
        }
    }
}

impl FromStr for Sentiment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" => Ok(Sentiment::Positive),
            "negative" | "neg" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            other => Err(format!("unknown sentiment '{}'", other)),
        }
    }
}

/// A validated input row before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Free-text feedback.
    pub text: String,
    /// Calendar date of the feedback.
    pub date: NaiveDate,
}

impl RawRecord {
    pub fn new(text: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            text: text.into(),
            date,
        }
    }
}

/// A feedback row with its sentiment and theme labels.
///
/// Labels are assigned once during enrichment and cannot be changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackRecord {
    text: String,
    date: NaiveDate,
    sentiment: Sentiment,
    theme: String,
}

impl FeedbackRecord {
    pub(crate) fn labeled(
        raw: RawRecord,
        sentiment: Sentiment,
        theme: impl Into<String>,
    ) -> Self {
        Self {
            text: raw.text,
            date: raw.date,
            sentiment,
            theme: theme.into(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sentiment(&self) -> Sentiment {
        self.sentiment
    }

    pub fn theme(&self) -> &str {
        &self.theme
    }
}

/// Count of records per sentiment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub total: usize,
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl SentimentCounts {
    /// Creates a summary from a sequence of records.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a FeedbackRecord>,
    {
        let mut counts = Self::default();
        for record in records {
            counts.add(record.sentiment());
        }
        counts
    }

    pub fn add(&mut self, sentiment: Sentiment) {
        self.total += 1;
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Negative => self.negative += 1,
            Sentiment::Neutral => self.neutral += 1,
        }
    }

    pub fn get(&self, sentiment: Sentiment) -> usize {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Negative => self.negative,
            Sentiment::Neutral => self.neutral,
        }
    }

    /// Share of the given sentiment as a percentage (0 when empty).
    pub fn percent(&self, sentiment: Sentiment) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.get(sentiment) as f64 / self.total as f64 * 100.0
    }
}

/// Number of records for one (theme, sentiment) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeSentimentCount {
    pub theme: String,
    pub sentiment: Sentiment,
    pub count: usize,
}

/// Frequency and average impact of one theme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeImpact {
    pub theme: String,
    pub frequency: usize,
    pub impact: f64,
}

/// Sentiment counts for a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub counts: SentimentCounts,
}

/// A word and how often it appears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFrequency {
    pub word: String,
    pub count: usize,
}

/// A theme and its trigger keywords, as shown in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeKeywords {
    pub name: String,
    pub keywords: Vec<String>,
}

/// A question asked about the feedback and the model's answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAnswer {
    pub question: String,
    pub answer: String,
}

/// Human-readable description of the filters that produced the report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppliedFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub sentiments: String,
    pub themes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

/// Metadata about the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Input file the feedback was loaded from.
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Records in the loaded dataset.
    pub total_records: usize,
    /// Records left after filtering.
    pub filtered_records: usize,
    /// Filters that were applied.
    pub filters: AppliedFilters,
    /// Language model used for insights, if any was called.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    /// Duration of the run in seconds.
    pub duration_seconds: f64,
}

/// The complete feedback report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub metadata: ReportMetadata,
    pub sentiment: SentimentCounts,
    pub themes: BTreeMap<String, usize>,
    pub theme_sentiment: Vec<ThemeSentimentCount>,
    pub priority: Vec<ThemeImpact>,
    pub trend: Vec<TrendPoint>,
    pub positive_words: Vec<WordFrequency>,
    pub negative_words: Vec<WordFrequency>,
    pub catalog: Vec<ThemeKeywords>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_terms: Vec<String>,
    /// `None` when insights were not requested. Empty when no feedback matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insights: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<QuestionAnswer>,
    pub positive_samples: Vec<String>,
    pub negative_samples: Vec<String>,
}
