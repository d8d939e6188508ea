//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and the translation of filter flags into
//! filter criteria.

use crate::analysis::{DateRange, Selection};
use crate::models::Sentiment;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Feedback Synth - customer feedback analysis from the command line
///
/// Classify customer feedback by sentiment and theme, filter it, and
/// produce a Markdown/JSON report with optional LLM insights.
///
/// Examples:
///   feedback-synth --input feedback.csv
///   feedback-synth --input feedback.csv --sentiment negative --theme service,store
///   feedback-synth --input feedback.csv --from 2024-01-01 --to 2024-01-31 --format json
///   feedback-synth --input feedback.csv --question "What do customers dislike most?"
///   feedback-synth --input feedback.csv --search delivery --dry-run
///   feedback-synth --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// CSV file with customer feedback
    ///
    /// Must have a header row with the text and date columns
    /// (default headers: "feedback" and "date").
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Default: from config or feedback_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Keep feedback on or after this date (YYYY-MM-DD)
    ///
    /// If only one of --from/--to is given, the other bound defaults to
    /// the earliest or latest date in the data.
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Keep feedback on or before this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Sentiments to keep (comma-separated)
    ///
    /// Example: --sentiment positive,neutral. Use "all" for no restriction.
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub sentiment: Option<Vec<String>>,

    /// Themes to keep (comma-separated, case-insensitive)
    ///
    /// Example: --theme service,delivery. Use "all" for no restriction.
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub theme: Option<Vec<String>>,

    /// Keep only feedback containing this text (case-insensitive)
    #[arg(long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Ask the language model a question about the filtered feedback
    #[arg(long, value_name = "TEXT")]
    pub question: Option<String>,

    /// Skip the language model insights
    #[arg(long)]
    pub no_insights: bool,

    /// Dry run: load, classify and filter without calling the LLM
    ///
    /// Prints the summary and matching feedback and exits without
    /// writing a report.
    #[arg(long)]
    pub dry_run: bool,

    /// Language model to use for insights
    ///
    /// Can also be set via FEEDBACK_SYNTH_MODEL env var or .feedback-synth.toml config.
    #[arg(short, long, env = "FEEDBACK_SYNTH_MODEL")]
    pub model: Option<String>,

    /// Base URL of an OpenAI-compatible chat completions API
    #[arg(long, value_name = "URL", env = "FEEDBACK_SYNTH_API_URL")]
    pub api_url: Option<String>,

    /// API key for the language model
    #[arg(long, value_name = "KEY", env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Temperature for LLM responses (0.0 - 2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Number of filtered feedback texts sent to the LLM
    #[arg(long, value_name = "COUNT")]
    pub sample_size: Option<usize>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .feedback-synth.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .feedback-synth.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Validate input file
        match self.input {
            Some(ref path) if !path.exists() => {
                return Err(format!("Input file does not exist: {}", path.display()));
            }
            Some(ref path) if !path.is_file() => {
                return Err(format!("Input path is not a file: {}", path.display()));
            }
            Some(_) => {}
            None => return Err("An input file is required (--input)".to_string()),
        }

        // Validate API URL format
        if let Some(ref url) = self.api_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("API URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate temperature range
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if self.sample_size == Some(0) {
            return Err("Sample size must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref question) = self.question {
            if question.trim().is_empty() {
                return Err("Question must not be empty".to_string());
            }
        }

        self.sentiment_selection()?;

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is the `verbose` setting from the config file;
    /// `--quiet` overrides it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Date range from --from/--to.
    ///
    /// A missing bound is filled from `data_bounds`. Returns `None` when
    /// neither flag was given or a bound cannot be filled.
    pub fn date_range(&self, data_bounds: Option<(NaiveDate, NaiveDate)>) -> Option<DateRange> {
        if self.from.is_none() && self.to.is_none() {
            return None;
        }

        let bounds: Vec<NaiveDate> = [
            self.from.or(data_bounds.map(|(min, _)| min)),
            self.to.or(data_bounds.map(|(_, max)| max)),
        ]
        .into_iter()
        .flatten()
        .collect();

        DateRange::from_bounds(&bounds)
    }

    /// Sentiment selection from --sentiment.
    pub fn sentiment_selection(&self) -> Result<Selection<Sentiment>, String> {
        let Some(values) = selection_values(self.sentiment.as_deref()) else {
            return Ok(Selection::All);
        };

        values
            .iter()
            .map(|v| v.parse::<Sentiment>())
            .collect::<Result<Vec<_>, _>>()
            .map(Selection::only)
    }

    /// Theme selection from --theme, matched case-insensitively against
    /// `known` theme names.
    pub fn theme_selection(&self, known: &[&str]) -> Result<Selection<String>, String> {
        let Some(values) = selection_values(self.theme.as_deref()) else {
            return Ok(Selection::All);
        };

        values
            .iter()
            .map(|value| {
                known
                    .iter()
                    .find(|name| name.eq_ignore_ascii_case(value))
                    .map(|name| name.to_string())
                    .ok_or_else(|| {
                        format!(
                            "unknown theme '{}' (available: {})",
                            value,
                            known.join(", ")
                        )
                    })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Selection::only)
    }
}

/// Trimmed, non-empty values of a multi-select flag.
///
/// Returns `None` when the flag is absent or any value is "all".
fn selection_values(values: Option<&[String]>) -> Option<Vec<&str>> {
    let values: Vec<&str> = values?
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();

    if values.iter().any(|v| v.eq_ignore_ascii_case("all")) {
        None
    } else {
        Some(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn make_args() -> Args {
        Args {
            input: Some(PathBuf::from("Cargo.toml")),
            output: None,
            format: OutputFormat::Markdown,
            from: None,
            to: None,
            sentiment: None,
            theme: None,
            search: None,
            question: None,
            no_insights: false,
            dry_run: false,
            model: None,
            api_url: None,
            api_key: None,
            timeout: None,
            temperature: None,
            sample_size: None,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    fn strings(values: &[&str]) -> Option<Vec<String>> {
        Some(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn test_parse_from_command_line() {
        let args = Args::try_parse_from([
            "feedback-synth",
            "--input",
            "data.csv",
            "--from",
            "2024-01-01",
            "--sentiment",
            "positive,negative",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(args.input, Some(PathBuf::from("data.csv")));
        assert_eq!(args.from, Some(ymd(2024, 1, 1)));
        assert_eq!(args.sentiment, strings(&["positive", "negative"]));
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_input_required_unless_init_config() {
        assert!(Args::try_parse_from(["feedback-synth"]).is_err());
        assert!(Args::try_parse_from(["feedback-synth", "--init-config"]).is_ok());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("definitely/not/here.csv"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.api_url = Some("api.groq.com".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        assert!(args.validate().is_ok());

        args.temperature = Some(3.0);
        assert!(args.validate().is_err());

        args.temperature = None;
        args.sample_size = Some(0);
        assert!(args.validate().is_err());

        args.sample_size = None;
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        args.timeout = None;
        args.question = Some("  ".to_string());
        assert!(args.validate().is_err());

        args.question = None;
        args.sentiment = strings(&["happy"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
    }

    #[test]
    fn test_log_level_from_config() {
        let mut args = make_args();
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }

    #[test]
    fn test_date_range_fills_missing_bound() {
        let bounds = Some((ymd(2024, 1, 1), ymd(2024, 3, 31)));
        let mut args = make_args();
        assert_eq!(args.date_range(bounds), None);

        args.from = Some(ymd(2024, 2, 1));
        assert_eq!(
            args.date_range(bounds),
            Some(DateRange::new(ymd(2024, 2, 1), ymd(2024, 3, 31)))
        );

        args.from = None;
        args.to = Some(ymd(2024, 1, 15));
        assert_eq!(
            args.date_range(bounds),
            Some(DateRange::new(ymd(2024, 1, 1), ymd(2024, 1, 15)))
        );

        // No data to fill from.
        assert_eq!(args.date_range(None), None);
    }

    #[test]
    fn test_sentiment_selection() {
        let mut args = make_args();
        assert_eq!(args.sentiment_selection(), Ok(Selection::All));

        args.sentiment = strings(&["Positive", " neutral "]);
        assert_eq!(
            args.sentiment_selection(),
            Ok(Selection::only([Sentiment::Positive, Sentiment::Neutral]))
        );

        args.sentiment = strings(&["negative", "ALL"]);
        assert_eq!(args.sentiment_selection(), Ok(Selection::All));
    }

    #[test]
    fn test_theme_selection() {
        let known = ["Service", "Product", "General"];
        let mut args = make_args();
        assert_eq!(args.theme_selection(&known), Ok(Selection::All));

        args.theme = strings(&["service", "GENERAL"]);
        assert_eq!(
            args.theme_selection(&known),
            Ok(Selection::only([
                "Service".to_string(),
                "General".to_string()
            ]))
        );

        args.theme = strings(&["pricing"]);
        assert!(args.theme_selection(&known).is_err());

        // Blank values select nothing.
        args.theme = strings(&[""]);
        assert_eq!(
            args.theme_selection(&known),
            Ok(Selection::Only(BTreeSet::new()))
        );
    }
}
