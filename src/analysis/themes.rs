//! Theme catalog construction and assignment.
//!
//! A [`ThemeCatalog`] is built once per dataset load and passed by reference
//! to every assignment. Assignment walks the themes in declared order and
//! returns the first one with a keyword contained in the text, falling back
//! to [`FALLBACK_THEME`].
//!
//! Building a catalog also runs a TF-IDF pass over the corpus. The resulting
//! vocabulary is reported alongside the catalog but does not feed assignment.

use crate::analysis::text::{contains_any, content_words, normalize_keywords};
use crate::config::{CatalogConfig, ThemeConfig};
use crate::models::{ThemeKeywords, FALLBACK_THEME};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;
use tracing::debug;

/// Errors raised when a catalog definition is invalid.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate theme name '{0}'")]
    DuplicateTheme(String),

    #[error("theme names must not be empty")]
    EmptyName,
}

/// A theme and its lowercase trigger keywords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    name: String,
    keywords: Vec<String>,
}

impl Theme {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// A corpus term and its summed TF-IDF weight.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedTerm {
    pub term: String,
    pub weight: f64,
}

/// Ordered theme → keywords mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeCatalog {
    themes: Vec<Theme>,
    vocabulary: Vec<WeightedTerm>,
}

impl ThemeCatalog {
    /// Create a catalog from theme definitions, keeping their order.
    pub fn new(themes: &[ThemeConfig]) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut catalog = Vec::with_capacity(themes.len());

        for theme in themes {
            let name = theme.name.trim();
            if name.is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if !seen.insert(name.to_string()) {
                return Err(CatalogError::DuplicateTheme(name.to_string()));
            }
            catalog.push(Theme {
                name: name.to_string(),
                keywords: normalize_keywords(&theme.keywords),
            });
        }

        Ok(Self {
            themes: catalog,
            vocabulary: Vec::new(),
        })
    }

    /// Build the catalog for a dataset.
    ///
    /// The theme mapping comes from `config`; the corpus only determines the
    /// attached TF-IDF vocabulary.
    pub fn build<S: AsRef<str>>(corpus: &[S], config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut catalog = Self::new(&config.themes)?;
        catalog.vocabulary = tfidf_vocabulary(corpus, config.max_terms);
        debug!(
            "Built catalog with {} themes and {} vocabulary terms",
            catalog.themes.len(),
            catalog.vocabulary.len()
        );
        Ok(catalog)
    }

    /// Assign a theme to a text. Always returns exactly one name.
    pub fn assign(&self, text: &str) -> &str {
        let lower = text.to_lowercase();
        self.themes
            .iter()
            .find(|theme| contains_any(&lower, &theme.keywords))
            .map(|theme| theme.name.as_str())
            .unwrap_or(FALLBACK_THEME)
    }

    /// Themes in match order.
    pub fn themes(&self) -> &[Theme] {
        &self.themes
    }

    /// TF-IDF vocabulary of the corpus the catalog was built from.
    pub fn vocabulary(&self) -> &[WeightedTerm] {
        &self.vocabulary
    }

    /// Theme names plus the fallback, in match order.
    pub fn theme_names(&self) -> Vec<&str> {
        self.themes()
            .iter()
            .map(Theme::name)
            .chain(std::iter::once(FALLBACK_THEME))
            .collect()
    }

    /// Catalog contents for the report.
    pub fn to_keywords(&self) -> Vec<ThemeKeywords> {
        self.themes()
            .iter()
            .map(|t| ThemeKeywords {
                name: t.name().to_string(),
                keywords: t.keywords().to_vec(),
            })
            .collect()
    }
}

/// Select the `max_terms` most important terms of a corpus.
///
/// Each document is reduced to its content words, weighted by term count
/// times smoothed IDF (`ln((1 + n) / (1 + df)) + 1`), and L2-normalized.
/// A term's importance is the sum of its weights across documents. Ties are
/// broken alphabetically so the result is deterministic.
pub fn tfidf_vocabulary<S: AsRef<str>>(corpus: &[S], max_terms: usize) -> Vec<WeightedTerm> {
    if corpus.is_empty() || max_terms == 0 {
        return Vec::new();
    }

    let documents: Vec<Vec<String>> = corpus.iter().map(|d| content_words(d.as_ref())).collect();
    let n_docs = documents.len() as f64;

    let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
    for doc in &documents {
        let unique: BTreeSet<&str> = doc.iter().map(String::as_str).collect();
        for term in unique {
            *doc_freq.entry(term).or_insert(0) += 1;
        }
    }

    let idf: BTreeMap<&str, f64> = doc_freq
        .iter()
        .map(|(term, df)| (*term, ((1.0 + n_docs) / (1.0 + *df as f64)).ln() + 1.0))
        .collect();

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for doc in &documents {
        let mut tf: BTreeMap<&str, f64> = BTreeMap::new();
        for term in doc {
            *tf.entry(term.as_str()).or_insert(0.0) += 1.0;
        }

        let weights: Vec<(&str, f64)> = tf
            .into_iter()
            .map(|(term, count)| (term, count * idf[term]))
            .collect();
        let norm = weights.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm == 0.0 {
            continue;
        }

        for (term, weight) in weights {
            *totals.entry(term).or_insert(0.0) += weight / norm;
        }
    }

    let mut terms: Vec<WeightedTerm> = totals
        .into_iter()
        .map(|(term, weight)| WeightedTerm {
            term: term.to_string(),
            weight,
        })
        .collect();

    terms.sort_by(|a, b| {
        b.weight
            .partial_cmp(&a.weight)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.term.cmp(&b.term))
    });
    terms.truncate(max_terms);

    terms
}
