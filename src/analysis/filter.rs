//! Filter and search over labeled feedback.
//!
//! Filtering never mutates the base dataset: it returns references to the
//! matching records in their original order.

use crate::models::{FeedbackRecord, Sentiment};
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Build a range from a list of bounds.
    ///
    /// Anything other than exactly two bounds yields `None`, which disables
    /// the date predicate.
    pub fn from_bounds(bounds: &[NaiveDate]) -> Option<Self> {
        match bounds {
            [start, end] => Some(Self::new(*start, *end)),
            _ => None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Multi-select restriction.
///
/// `All` means no restriction. `Only` keeps records whose value is in the
/// set; an empty set keeps nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T: Ord> {
    All,
    Only(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: Ord> Selection<T> {
    pub fn only<I: IntoIterator<Item = T>>(values: I) -> Self {
        Selection::Only(values.into_iter().collect())
    }

    pub fn allows<Q>(&self, value: &Q) -> bool
    where
        T: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self {
            Selection::All => true,
            Selection::Only(set) => set.contains(value),
        }
    }
}

impl<T: Ord + fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "All"),
            Selection::Only(set) if set.is_empty() => write!(f, "None"),
            Selection::Only(set) => {
                let values: Vec<String> = set.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", values.join(", "))
            }
        }
    }
}

/// Combined filter predicate. All active predicates are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub date_range: Option<DateRange>,
    pub sentiments: Selection<Sentiment>,
    pub themes: Selection<String>,
    pub search: Option<String>,
}

impl FilterCriteria {
    /// Criteria that keep every record.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, range: Option<DateRange>) -> Self {
        self.date_range = range;
        self
    }

    pub fn with_sentiments(mut self, sentiments: Selection<Sentiment>) -> Self {
        self.sentiments = sentiments;
        self
    }

    pub fn with_themes(mut self, themes: Selection<String>) -> Self {
        self.themes = themes;
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Check a single record against every active predicate.
    pub fn matches(&self, record: &FeedbackRecord) -> bool {
        if let Some(range) = self.date_range {
            if !range.contains(record.date()) {
                return false;
            }
        }

        if !self.sentiments.allows(&record.sentiment()) {
            return false;
        }

        if !self.themes.allows(record.theme()) {
            return false;
        }

        match self.search_needle() {
            Some(needle) => record.text().to_lowercase().contains(&needle),
            None => true,
        }
    }

    /// Lowercased search text, or `None` when search is inactive.
    fn search_needle(&self) -> Option<String> {
        self.search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}

/// Apply criteria to records, preserving their order.
pub fn filter<'a, I>(records: I, criteria: &FilterCriteria) -> Vec<&'a FeedbackRecord>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    records
        .into_iter()
        .filter(|r| criteria.matches(r))
        .collect()
}

/// Case-insensitive substring search over feedback text.
#[allow(dead_code)] // Utility for ad-hoc text lookup
pub fn search<'a, I>(records: I, query: &str) -> Vec<&'a FeedbackRecord>
where
    I: IntoIterator<Item = &'a FeedbackRecord>,
{
    filter(records, &FilterCriteria::all().with_search(query))
}
