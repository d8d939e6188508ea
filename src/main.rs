//! Feedback Synth - customer feedback analysis CLI
//!
//! Loads customer feedback from CSV, labels each record with a sentiment
//! and a theme, filters the result, and writes a Markdown or JSON report
//! with optional language model insights.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Error (invalid arguments, unreadable or malformed input, write failure)

mod analysis;
mod cli;
mod config;
mod insights;
mod loader;
mod models;
mod report;

use analysis::{Dataset, FilterCriteria, KeywordClassifier};
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use insights::{InsightClient, InsightConfig};
use models::{FeedbackRecord, QuestionAnswer, ReportMetadata};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so its verbosity applies
    let (mut config, config_path) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    init_logging(&args, &config);

    info!("Feedback Synth v{}", env!("CARGO_PKG_VERSION"));
    match config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }
    debug!(
        "Input: {:?}, format: {:?}, dry run: {}",
        args.input, args.format, args.dry_run
    );

    if let Err(e) = run(args, config).await {
        error!("Run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default configuration file.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize keywords, themes, columns, and the model.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config: &Config) {
    let level = args.log_level(config.general.verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the complete load → classify → filter → report workflow.
async fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();

    // Step 1: Load the feedback
    let input = args
        .input
        .clone()
        .context("An input file is required (--input)")?;
    println!("📥 Loading feedback: {}", input.display());

    let raw = loader::load_file(&input, &config.loader)
        .with_context(|| format!("Failed to load {}", input.display()))?;

    // Step 2: Classify
    let classifier = KeywordClassifier::from_config(&config.classifier);
    let dataset = Dataset::build(raw, &classifier, &config.catalog)
        .context("Invalid theme catalog in configuration")?;
    if dataset.is_empty() {
        warn!("No feedback rows found in {}", input.display());
    }

    // Step 3: Filter
    let criteria = build_criteria(&args, &dataset)?;
    let filtered = analysis::filter(dataset.records(), &criteria);
    info!(
        "{} of {} records match the filters",
        filtered.len(),
        dataset.len()
    );

    // Handle --dry-run: print the filtered view and exit
    if args.dry_run {
        handle_dry_run(&dataset, &filtered);
        return Ok(());
    }

    // Step 4: Ask the language model
    let sample = analysis::text_sample(filtered.iter().copied(), config.general.sample_size);
    let (insight_list, answer, model_used) = request_insights(&args, &config, &sample).await?;

    // Step 5: Build the report
    println!("\n📝 Generating report...");

    let metadata = ReportMetadata {
        source: input.display().to_string(),
        generated_at: Utc::now(),
        total_records: dataset.len(),
        filtered_records: filtered.len(),
        filters: report::describe_filters(&criteria),
        model_used,
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };

    let report = report::build_report(
        &filtered,
        dataset.catalog(),
        &config.report,
        metadata,
        insight_list,
        answer,
    );

    // Step 6: Render and save
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = output_path(&args, &config);
    report::write_report(&output, &output_path)?;

    // Print summary
    println!("\n📊 Feedback Summary:");
    for line in report::generate_console_summary(&report).lines() {
        println!("   {}", line);
    }
    println!("   Duration: {:.1}s", start_time.elapsed().as_secs_f64());
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        output_path.display()
    );

    Ok(())
}

/// Translate filter flags into criteria for this dataset.
fn build_criteria(args: &Args, dataset: &Dataset) -> Result<FilterCriteria> {
    let known = dataset.catalog().theme_names();

    let sentiments = args.sentiment_selection().map_err(anyhow::Error::msg)?;
    let themes = args.theme_selection(&known).map_err(anyhow::Error::msg)?;

    let mut criteria = FilterCriteria::all()
        .with_date_range(args.date_range(dataset.date_bounds()))
        .with_sentiments(sentiments)
        .with_themes(themes);

    if let Some(ref search) = args.search {
        criteria = criteria.with_search(search.clone());
    }

    if let Some(range) = criteria.date_range {
        if range.start > range.end {
            warn!(
                "Date range {} to {} is inverted; no records will match",
                range.start, range.end
            );
        }
    }

    debug!("Filter criteria: {:?}", criteria);
    Ok(criteria)
}

/// Generate insights and answer the optional question.
///
/// Returns the insights (`None` when not requested), the answer, and the
/// model name when it was called.
async fn request_insights(
    args: &Args,
    config: &Config,
    sample: &[String],
) -> Result<(Option<Vec<String>>, Option<QuestionAnswer>, Option<String>)> {
    let wants_insights = !args.no_insights;
    if !wants_insights && args.question.is_none() {
        debug!("Insights disabled");
        return Ok((None, None, None));
    }

    if sample.is_empty() {
        warn!("No matching feedback to send to the language model");
        let answer = args.question.as_ref().map(|question| QuestionAnswer {
            question: question.clone(),
            answer: insights::client::NO_ANSWER.to_string(),
        });
        return Ok((wants_insights.then(Vec::new), answer, None));
    }

    let mut insight_config = InsightConfig::from_model(&config.model, args.api_key.clone());
    insight_config.show_progress = !args.quiet;
    let client = InsightClient::new(insight_config)?;

    if client.is_available() {
        println!("🤖 Asking {} about {} feedback texts...", client.model_name(), sample.len());
    } else {
        warn!("GROQ_API_KEY is not set; insights will be replaced by placeholder text");
    }

    let insight_list = if wants_insights {
        Some(insights::insights_or_placeholder(&client, sample).await)
    } else {
        None
    };

    let answer = match args.question {
        Some(ref question) => Some(QuestionAnswer {
            question: question.clone(),
            answer: insights::answer_or_placeholder(&client, sample, question).await,
        }),
        None => None,
    };

    let model_used = client
        .is_available()
        .then(|| client.model_name().to_string());

    Ok((insight_list, answer, model_used))
}

/// Handle --dry-run: print the summary and matching feedback.
fn handle_dry_run(dataset: &Dataset, filtered: &[&FeedbackRecord]) {
    println!("\n🔍 Dry run: classified and filtered feedback (no LLM call)...\n");

    let counts = analysis::sentiment_counts(filtered.iter().copied());
    let themes = analysis::theme_counts(filtered.iter().copied());
    println!(
        "   {} of {} records matched\n",
        filtered.len(),
        dataset.len()
    );
    for line in analysis::generate_summary_text(&counts, &themes).lines() {
        println!("   {}", line);
    }

    if filtered.is_empty() {
        println!("\n   No feedback matched the selected filters.");
    } else {
        println!();
        for record in filtered {
            println!(
                "     {} {} | {} | {} | {}",
                record.sentiment().emoji(),
                record.date(),
                record.sentiment(),
                record.theme(),
                record.text()
            );
        }
    }

    println!("\n✅ Dry run complete. No LLM calls were made.");
}

/// Report path, switching the default extension for JSON output.
fn output_path(args: &Args, config: &Config) -> PathBuf {
    let path = PathBuf::from(&config.general.output);

    if args.output.is_none()
        && args.format == OutputFormat::Json
        && path.extension().is_some_and(|ext| ext == "md")
    {
        path.with_extension("json")
    } else {
        path
    }
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is initialized. Returns the config and the file it
/// came from, if any.
fn load_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, Some(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, Some(PathBuf::from(CONFIG_FILE_NAME)))),
        Ok(None) => Ok((Config::default(), None)),
        Err(e) => {
            eprintln!("⚠️  Failed to load config: {:#}. Using defaults.", e);
            Ok((Config::default(), None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["feedback-synth", "--input", "feedback.csv"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_insights_requested_without_matches() {
        let args = parse(&["--question", "What do customers dislike?"]);
        let (list, answer, model) =
            tokio_test::block_on(request_insights(&args, &Config::default(), &[])).unwrap();

        assert_eq!(list, Some(Vec::new()));
        assert_eq!(
            answer.map(|qa| qa.answer),
            Some(insights::client::NO_ANSWER.to_string())
        );
        assert_eq!(model, None);
    }

    #[test]
    fn test_insights_not_requested() {
        let args = parse(&["--no-insights"]);
        let sample = vec!["Great service!".to_string()];
        let (list, answer, model) =
            tokio_test::block_on(request_insights(&args, &Config::default(), &sample)).unwrap();

        assert_eq!(list, None);
        assert!(answer.is_none());
        assert_eq!(model, None);
    }

    #[test]
    fn test_load_explicit_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[general]\nverbose = true\n").unwrap();

        let path = file.path().display().to_string();
        let args = parse(&["--config", path.as_str()]);
        let (config, source) = load_config(&args).unwrap();

        assert!(config.general.verbose);
        assert_eq!(source, Some(file.path().to_path_buf()));
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);
    }
}
