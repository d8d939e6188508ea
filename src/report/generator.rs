//! Markdown report generation.
//!
//! This module renders the feedback report as Markdown or JSON.

use crate::analysis::generate_summary_text;
use crate::models::{
    QuestionAnswer, Report, ReportMetadata, Sentiment, SentimentCounts, ThemeImpact,
    ThemeKeywords, ThemeSentimentCount, TrendPoint, WordFrequency,
};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# Customer Feedback Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents(report));

    // Distributions
    output.push_str(&generate_summary_section(&report.sentiment, &report.themes));
    output.push_str(&generate_theme_sentiment_section(&report.theme_sentiment));
    output.push_str(&generate_priority_section(&report.priority));
    output.push_str(&generate_trend_section(&report.trend));
    output.push_str(&generate_words_section(
        &report.positive_words,
        &report.negative_words,
    ));

    // Themes and keywords
    output.push_str(&generate_catalog_section(&report.catalog, &report.top_terms));

    // Language model output
    output.push_str(&generate_insights_section(report.insights.as_deref()));
    if let Some(ref answer) = report.answer {
        output.push_str(&generate_answer_section(answer));
    }

    output.push_str(&generate_samples_section(
        &report.positive_samples,
        &report.negative_samples,
    ));

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push_str(&format!(
        "- **Records:** {} of {} matched the filters\n",
        metadata.filtered_records, metadata.total_records
    ));

    let filters = &metadata.filters;
    if let Some((start, end)) = filters.date_range {
        section.push_str(&format!("- **Date Range:** {} to {}\n", start, end));
    }
    section.push_str(&format!("- **Sentiments:** {}\n", filters.sentiments));
    section.push_str(&format!("- **Themes:** {}\n", filters.themes));
    if let Some(ref search) = filters.search {
        section.push_str(&format!("- **Search:** \"{}\"\n", search));
    }

    if let Some(ref model) = metadata.model_used {
        section.push_str(&format!("- **Model Used:** `{}`\n", model));
    }
    section.push_str(&format!(
        "- **Duration:** {:.1}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

/// Generate the table of contents.
fn generate_table_of_contents(report: &Report) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Sentiment by Theme](#sentiment-by-theme)\n");
    toc.push_str("- [Priority Matrix](#priority-matrix)\n");
    toc.push_str("- [Sentiment Trend](#sentiment-trend)\n");
    toc.push_str("- [Frequent Words](#frequent-words)\n");
    toc.push_str("- [Themes and Keywords](#themes-and-keywords)\n");
    toc.push_str("- [Actionable Insights](#actionable-insights)\n");

    if report.answer.is_some() {
        toc.push_str("- [Question and Answer](#question-and-answer)\n");
    }

    toc.push_str("- [Feedback Samples](#feedback-samples)\n");
    toc.push('\n');

    toc
}

/// Generate the summary section.
fn generate_summary_section(counts: &SentimentCounts, themes: &BTreeMap<String, usize>) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");

    if counts.total == 0 {
        section.push_str("No feedback matched the selected filters.\n\n");
        return section;
    }

    // Sentiment breakdown
    section.push_str("### Sentiment Distribution\n\n");
    section.push_str(&format!(
        "| {} Positive | {} Negative | {} Neutral | **Total** |\n",
        Sentiment::Positive.emoji(),
        Sentiment::Negative.emoji(),
        Sentiment::Neutral.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} ({:.1}%) | {} ({:.1}%) | {} ({:.1}%) | **{}** |\n\n",
        counts.positive,
        counts.percent(Sentiment::Positive),
        counts.negative,
        counts.percent(Sentiment::Negative),
        counts.neutral,
        counts.percent(Sentiment::Neutral),
        counts.total
    ));

    // Theme breakdown
    if !themes.is_empty() {
        section.push_str("### Theme Distribution\n\n");
        section.push_str("| Theme | Count |\n");
        section.push_str("|:---|:---:|\n");

        let mut sorted: Vec<_> = themes.iter().collect();
        sorted.sort_by_key(|(_, count)| std::cmp::Reverse(**count));

        for (theme, count) in sorted {
            section.push_str(&format!("| {} | {} |\n", theme, count));
        }
        section.push('\n');
    }

    section
}

/// Generate the sentiment-per-theme matrix.
fn generate_theme_sentiment_section(pairs: &[ThemeSentimentCount]) -> String {
    if pairs.is_empty() {
        return String::new();
    }

    let mut matrix: BTreeMap<&str, SentimentCounts> = BTreeMap::new();
    for pair in pairs {
        let counts = matrix.entry(pair.theme.as_str()).or_default();
        for _ in 0..pair.count {
            counts.add(pair.sentiment);
        }
    }

    let mut section = String::new();

    section.push_str("## Sentiment by Theme\n\n");
    section.push_str("| Theme | Positive | Negative | Neutral |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    for (theme, counts) in matrix {
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            theme, counts.positive, counts.negative, counts.neutral
        ));
    }
    section.push('\n');

    section
}

/// Generate the priority matrix section.
fn generate_priority_section(priority: &[ThemeImpact]) -> String {
    if priority.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Priority Matrix\n\n");
    section.push_str(
        "Impact is the mean sentiment score per theme (Positive +1, Neutral 0, Negative -1).\n\n",
    );
    section.push_str("| Theme | Frequency | Impact | Priority |\n");
    section.push_str("|:---|:---:|:---:|:---|\n");

    for item in priority {
        section.push_str(&format!(
            "| {} | {} | {:+.2} | {} |\n",
            item.theme,
            item.frequency,
            item.impact,
            priority_label(item.impact)
        ));
    }
    section.push('\n');

    section
}

/// Label a theme by its average impact.
fn priority_label(impact: f64) -> &'static str {
    if impact < -0.25 {
        "🔴 Address first"
    } else if impact > 0.25 {
        "🟢 Strength"
    } else {
        "🟡 Monitor"
    }
}

/// Generate the sentiment trend section.
fn generate_trend_section(trend: &[TrendPoint]) -> String {
    if trend.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Sentiment Trend\n\n");
    section.push_str("| Date | Positive | Negative | Neutral | Total |\n");
    section.push_str("|:---|:---:|:---:|:---:|:---:|\n");

    for point in trend {
        section.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            point.date,
            point.counts.positive,
            point.counts.negative,
            point.counts.neutral,
            point.counts.total
        ));
    }
    section.push('\n');

    section
}

/// Generate the word frequency section.
fn generate_words_section(positive: &[WordFrequency], negative: &[WordFrequency]) -> String {
    if positive.is_empty() && negative.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Frequent Words\n\n");

    for (title, words) in [("Positive Feedback", positive), ("Negative Feedback", negative)] {
        if words.is_empty() {
            continue;
        }

        section.push_str(&format!("### {}\n\n", title));
        section.push_str("| Word | Count |\n");
        section.push_str("|:---|:---:|\n");

        for word in words {
            section.push_str(&format!("| {} | {} |\n", word.word, word.count));
        }
        section.push('\n');
    }

    section
}

/// Generate the themes and keywords section.
fn generate_catalog_section(catalog: &[ThemeKeywords], top_terms: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Themes and Keywords\n\n");

    for theme in catalog {
        section.push_str(&format!(
            "- **{}:** {}\n",
            theme.name,
            theme.keywords.join(", ")
        ));
    }
    section.push_str("- **General:** feedback matching no theme keyword\n\n");

    if !top_terms.is_empty() {
        section.push_str("### Top Terms\n\n");
        section.push_str(&top_terms.join(", "));
        section.push_str("\n\n");
    }

    section
}

/// Generate the insights section.
fn generate_insights_section(insights: Option<&[String]>) -> String {
    let mut section = String::new();

    section.push_str("## Actionable Insights\n\n");

    let insights = match insights {
        None => {
            section.push_str("*Insights were not requested for this report.*\n\n");
            return section;
        }
        Some([]) => {
            section.push_str(
                "*No feedback matched the selected filters, so no insights were generated.*\n\n",
            );
            return section;
        }
        Some(insights) => insights,
    };

    for insight in insights {
        section.push_str(&format!("- {}\n", insight));
    }
    section.push('\n');

    section
}

/// Generate the question and answer section.
fn generate_answer_section(qa: &QuestionAnswer) -> String {
    let mut section = String::new();

    section.push_str("## Question and Answer\n\n");
    section.push_str(&format!("> **Q:** {}\n\n", qa.question));
    section.push_str(qa.answer.trim());
    section.push_str("\n\n");

    section
}

/// Generate the representative samples section.
fn generate_samples_section(positive: &[String], negative: &[String]) -> String {
    let mut section = String::new();

    section.push_str("## Feedback Samples\n\n");

    for (sentiment, samples) in [
        (Sentiment::Positive, positive),
        (Sentiment::Negative, negative),
    ] {
        section.push_str(&format!("### {} {}\n\n", sentiment.emoji(), sentiment));

        if samples.is_empty() {
            section.push_str("*No samples.*\n\n");
            continue;
        }

        for sample in samples {
            section.push_str(&format!("> {}\n\n", sample.trim()));
        }
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str("*Report generated by feedback-synth*\n");

    footer
}

/// Generate a plain-text summary for the console.
pub fn generate_console_summary(report: &Report) -> String {
    let mut lines = vec![format!(
        "{} of {} records matched",
        report.metadata.filtered_records, report.metadata.total_records
    )];
    lines.push(generate_summary_text(&report.sentiment, &report.themes));
    lines.join("\n")
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Write report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write report file: {}", path.display()))?;

    Ok(())
}
