//! Feedback classification and filtering pipeline.
//!
//! Raw records are enriched once into a [`Dataset`]: each record gets a
//! sentiment from a [`SentimentClassifier`] and a theme from the dataset's
//! [`ThemeCatalog`]. The dataset is read-only afterwards; filtering and
//! aggregation borrow from it.

pub mod aggregator;
pub mod filter;
pub mod sentiment;
pub mod text;
pub mod themes;

pub use aggregator::*;
pub use filter::{filter, DateRange, FilterCriteria, Selection};
pub use sentiment::{KeywordClassifier, SentimentClassifier};
pub use themes::{CatalogError, ThemeCatalog};

use crate::config::CatalogConfig;
use crate::models::{FeedbackRecord, RawRecord};
use chrono::NaiveDate;
use tracing::{debug, info};

/// Label each raw record with a sentiment and a theme.
pub fn enrich(
    raw: Vec<RawRecord>,
    classifier: &dyn SentimentClassifier,
    catalog: &ThemeCatalog,
) -> Vec<FeedbackRecord> {
    raw.into_iter()
        .map(|record| {
            let sentiment = classifier.classify(&record.text);
            let theme = catalog.assign(&record.text).to_string();
            FeedbackRecord::labeled(record, sentiment, theme)
        })
        .collect()
}

/// A labeled dataset and the catalog it was labeled with.
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<FeedbackRecord>,
    catalog: ThemeCatalog,
}

impl Dataset {
    /// Build the catalog for `raw` and enrich every record.
    pub fn build(
        raw: Vec<RawRecord>,
        classifier: &dyn SentimentClassifier,
        catalog_config: &CatalogConfig,
    ) -> Result<Self, CatalogError> {
        let corpus: Vec<&str> = raw.iter().map(|r| r.text.as_str()).collect();
        let catalog = ThemeCatalog::build(&corpus, catalog_config)?;
        debug!("Catalog themes: {:?}", catalog.theme_names());

        let records = enrich(raw, classifier, &catalog);
        info!("Classified {} feedback records", records.len());

        Ok(Self { records, catalog })
    }

    /// Build with the default keyword classifier and catalog.
    #[cfg(test)]
    pub fn with_defaults(raw: Vec<RawRecord>) -> Result<Self, CatalogError> {
        Self::build(raw, &KeywordClassifier::default(), &CatalogConfig::default())
    }

    pub fn records(&self) -> &[FeedbackRecord] {
        &self.records
    }

    pub fn catalog(&self) -> &ThemeCatalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest record dates.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date()).min()?;
        let max = self.records.iter().map(|r| r.date()).max()?;
        Some((min, max))
    }

    /// Sentiments present in the dataset.
    #[cfg(test)]
    pub fn distinct_sentiments(&self) -> std::collections::BTreeSet<crate::models::Sentiment> {
        self.records.iter().map(|r| r.sentiment()).collect()
    }

    /// Themes present in the dataset.
    #[cfg(test)]
    pub fn distinct_themes(&self) -> std::collections::BTreeSet<String> {
        self.records.iter().map(|r| r.theme().to_string()).collect()
    }
}
