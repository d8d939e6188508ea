//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.feedback-synth.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".feedback-synth.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Language model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// CSV loader settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Sentiment keyword settings.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Theme catalog settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of filtered feedback texts sent to the language model.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
            sample_size: default_sample_size(),
        }
    }
}

fn default_output() -> String {
    "feedback_report.md".to_string()
}

fn default_sample_size() -> usize {
    20
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Base URL of an OpenAI-compatible chat completions API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Token limit for the insights request.
    #[serde(default = "default_insight_tokens")]
    pub insight_max_tokens: u32,

    /// Token limit for the question-answering request.
    #[serde(default = "default_answer_tokens")]
    pub answer_max_tokens: u32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            api_url: default_api_url(),
            temperature: default_temperature(),
            insight_max_tokens: default_insight_tokens(),
            answer_max_tokens: default_answer_tokens(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "llama-3.1-8b-instant".to_string()
}

fn default_api_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_temperature() -> f32 {
    0.5
}

fn default_insight_tokens() -> u32 {
    300
}

fn default_answer_tokens() -> u32 {
    500
}

fn default_timeout() -> u64 {
    60
}

/// CSV loader settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Header of the free-text column.
    #[serde(default = "default_text_column")]
    pub text_column: String,

    /// Header of the date column.
    #[serde(default = "default_date_column")]
    pub date_column: String,

    /// chrono formats tried in order for each date cell.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            text_column: default_text_column(),
            date_column: default_date_column(),
            date_formats: default_date_formats(),
        }
    }
}

fn default_text_column() -> String {
    "feedback".to_string()
}

fn default_date_column() -> String {
    "date".to_string()
}

fn default_date_formats() -> Vec<String> {
    vec![
        "%Y-%m-%d",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y/%m/%d",
        "%m/%d/%Y",
        "%d.%m.%Y",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Sentiment keyword lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Keywords that mark feedback as positive. Checked first.
    #[serde(default = "default_positive")]
    pub positive: Vec<String>,

    /// Keywords that mark feedback as negative.
    #[serde(default = "default_negative")]
    pub negative: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            positive: default_positive(),
            negative: default_negative(),
        }
    }
}

fn default_positive() -> Vec<String> {
    vec!["great", "amazing", "satisfied", "love", "friendly"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_negative() -> Vec<String> {
    vec!["poor", "bad", "defective", "unresponsive", "messy"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Theme catalog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Size of the TF-IDF vocabulary computed over the corpus.
    #[serde(default = "default_max_terms")]
    pub max_terms: usize,

    /// Themes in match order. The first theme with a matching keyword wins.
    #[serde(default = "default_themes")]
    pub themes: Vec<ThemeConfig>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_terms: default_max_terms(),
            themes: default_themes(),
        }
    }
}

/// One theme and its trigger keywords.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub name: String,
    pub keywords: Vec<String>,
}

impl ThemeConfig {
    fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

fn default_max_terms() -> usize {
    100
}

fn default_themes() -> Vec<ThemeConfig> {
    vec![
        ThemeConfig::new(
            "Service",
            &["service", "staff", "support", "customer", "friendly", "unresponsive"],
        ),
        ThemeConfig::new(
            "Product",
            &["product", "item", "quality", "defective", "collection"],
        ),
        ThemeConfig::new("Store", &["store", "checkout", "wait", "messy", "find"]),
        ThemeConfig::new("Delivery", &["delivery", "fast", "shipping", "discounts"]),
    ]
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Representative samples shown per sentiment.
    #[serde(default = "default_samples")]
    pub samples_per_sentiment: usize,

    /// Words listed in each word-frequency table.
    #[serde(default = "default_top_words")]
    pub top_words: usize,

    /// Include the TF-IDF vocabulary in the report.
    #[serde(default = "default_true")]
    pub include_vocabulary: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            samples_per_sentiment: default_samples(),
            top_words: default_top_words(),
            include_vocabulary: true,
        }
    }
}

fn default_samples() -> usize {
    3
}

fn default_top_words() -> usize {
    15
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref api_url) = args.api_url {
            self.model.api_url = api_url.clone();
        }
        if let Some(temperature) = args.temperature {
            self.model.temperature = temperature;
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }
        if let Some(sample_size) = args.sample_size {
            self.general.sample_size = sample_size;
        }
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
