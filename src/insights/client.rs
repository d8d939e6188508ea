//! Chat-completions client for feedback insights.
//!
//! Talks to any OpenAI-compatible `/chat/completions` endpoint with bearer
//! authentication. The default endpoint is Groq's.

use crate::config::ModelConfig;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

/// Shown in place of insights when the model cannot be reached.
pub const INSIGHTS_UNAVAILABLE: &str = "Unable to generate insights due to an error: ensure GROQ_API_KEY is correctly set and the API is accessible.";

/// Shown in place of an answer when the model cannot be reached.
pub const ANSWER_UNAVAILABLE: &str = "Unable to answer the question due to an error: ensure GROQ_API_KEY is correctly set and the API is accessible.";

/// Shown when the model returns an empty answer.
pub const NO_ANSWER: &str = "No relevant answer could be generated.";

/// Shown when the model reply contains no insight lines.
pub const NO_INSIGHTS: &str = "The model returned no insights for this feedback.";

/// Configuration for the insight client.
#[derive(Debug, Clone)]
pub struct InsightConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model_name: String,
    pub temperature: f32,
    pub insight_max_tokens: u32,
    pub answer_max_tokens: u32,
    pub timeout_seconds: u64,
    /// Show a spinner while waiting for the model.
    pub show_progress: bool,
}

impl InsightConfig {
    pub fn from_model(model: &ModelConfig, api_key: Option<String>) -> Self {
        Self {
            api_url: model.api_url.clone(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model_name: model.name.clone(),
            temperature: model.temperature,
            insight_max_tokens: model.insight_max_tokens,
            answer_max_tokens: model.answer_max_tokens,
            timeout_seconds: model.timeout_seconds,
            show_progress: true,
        }
    }
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self::from_model(&ModelConfig::default(), None)
    }
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    fn user(content: String) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

/// Chat completions request.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

/// Chat completions response.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client that turns feedback samples into insights and answers.
pub struct InsightClient {
    config: InsightConfig,
    http_client: reqwest::Client,
}

impl InsightClient {
    pub fn new(config: InsightConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Whether an API key is configured.
    pub fn is_available(&self) -> bool {
        self.config.api_key.is_some()
    }

    pub fn model_name(&self) -> &str {
        &self.config.model_name
    }

    /// Ask the model for three actionable insights about the sample.
    pub async fn generate_insights(&self, sample: &[String]) -> Result<Vec<String>> {
        let prompt = format!(
            "You are a retail business consultant specializing in customer feedback analysis. \
             Analyze the following feedback data:\n{}\n\
             Provide 3 highly specific, actionable, and practical insights to improve customer \
             experience in a retail setting. Focus on strategies like staff training, inventory \
             management, store layout optimization, or customer service improvements. \
             Format your response as a concise bulleted list.",
            format_feedback(sample)
        );

        let response = self
            .complete(
                INSIGHTS_SYSTEM_PROMPT,
                prompt,
                self.config.insight_max_tokens,
                "Generating insights...",
            )
            .await?;

        let insights = parse_bullets(&response);
        info!("Received {} insights", insights.len());
        Ok(insights)
    }

    /// Ask the model a free-form question about the sample.
    pub async fn answer_question(&self, sample: &[String], question: &str) -> Result<String> {
        let prompt = format!(
            "You are a retail customer feedback analysis expert. \
             Based on the following feedback data:\n{}\n\
             Answer the following question in a concise, accurate, and professional manner, \
             focusing on the specific details requested:\n{}",
            format_feedback(sample),
            question
        );

        let response = self
            .complete(
                ANSWER_SYSTEM_PROMPT,
                prompt,
                self.config.answer_max_tokens,
                "Answering question...",
            )
            .await?;

        let answer = response.trim();
        if answer.is_empty() {
            Ok(NO_ANSWER.to_string())
        } else {
            Ok(answer.to_string())
        }
    }

    /// Send one system + user exchange and return the reply text.
    async fn complete(
        &self,
        system: &str,
        prompt: String,
        max_tokens: u32,
        progress_message: &'static str,
    ) -> Result<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .context("GROQ_API_KEY is not set")?;

        let url = format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model_name,
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending chat request to {} ({} max tokens)", url, max_tokens);
        let spinner = self.spinner(progress_message);

        let result = self.send(&url, api_key, &request).await;
        spinner.finish_and_clear();

        result
    }

    async fn send(&self, url: &str, api_key: &str, request: &ChatRequest<'_>) -> Result<String> {
        let response = self
            .http_client
            .post(url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Request timed out after {}s", self.config.timeout_seconds)
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot connect to {}", self.config.api_url)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Chat API error {}: {}", status, body));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat response")?;

        Ok(first_content(chat_response))
    }

    fn spinner(&self, message: &'static str) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

fn first_content(response: ChatResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default()
}

/// Render feedback texts as a numbered list for the prompt.
fn format_feedback(sample: &[String]) -> String {
    sample
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{}. {}", i + 1, text.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split a model reply into bullet items.
///
/// Leading list markers (`- `, `* `, `•`, `1.`, `1)`) are stripped and blank
/// lines are dropped. A `-` or `*` counts as a marker only when followed by
/// whitespace, so "-20%" and "*Note*" are kept intact.
pub fn parse_bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_marker)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

fn strip_marker(line: &str) -> &str {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix('•') {
        return rest.trim();
    }

    for marker in ['-', '*'] {
        if let Some(rest) = line.strip_prefix(marker) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return rest.trim();
            }
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return rest.trim();
        }
    }

    line
}

/// Generate insights, replacing any failure with a fixed message.
pub async fn insights_or_placeholder(client: &InsightClient, sample: &[String]) -> Vec<String> {
    insights_from_reply(client.generate_insights(sample).await)
}

/// Map an insights result to report lines. Never returns an empty list.
fn insights_from_reply(result: Result<Vec<String>>) -> Vec<String> {
    match result {
        Ok(insights) if !insights.is_empty() => insights,
        Ok(_) => {
            info!("Model reply contained no insights");
            vec![NO_INSIGHTS.to_string()]
        }
        Err(e) => {
            error!("Error generating insights: {:#}", e);
            vec![INSIGHTS_UNAVAILABLE.to_string()]
        }
    }
}

/// Answer a question, replacing any failure with a fixed message.
pub async fn answer_or_placeholder(
    client: &InsightClient,
    sample: &[String],
    question: &str,
) -> String {
    match client.answer_question(sample, question).await {
        Ok(answer) => answer,
        Err(e) => {
            error!("Error answering question: {:#}", e);
            ANSWER_UNAVAILABLE.to_string()
        }
    }
}

/// System prompt for the insights request
const INSIGHTS_SYSTEM_PROMPT: &str =
    "You are a retail business consultant providing actionable insights.";

/// System prompt for the question request
const ANSWER_SYSTEM_PROMPT: &str =
    "You are a retail feedback analyst providing precise and relevant answers.";

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> InsightClient {
        let config = InsightConfig {
            show_progress: false,
            ..InsightConfig::default()
        };
        InsightClient::new(config).unwrap()
    }

    fn sample() -> Vec<String> {
        vec!["Great service!".to_string(), "Defective product".to_string()]
    }

    #[test]
    fn test_config_from_model() {
        let config = InsightConfig::from_model(&ModelConfig::default(), Some("  ".to_string()));
        assert_eq!(config.model_name, "llama-3.1-8b-instant");
        assert_eq!(config.insight_max_tokens, 300);
        assert_eq!(config.answer_max_tokens, 500);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_missing_key_fails_without_network() {
        let client = offline_client();
        assert!(!client.is_available());

        let result = tokio_test::block_on(client.generate_insights(&sample()));
        let message = format!("{}", result.unwrap_err());
        assert!(message.contains("GROQ_API_KEY"));

        let answer = tokio_test::block_on(client.answer_question(&sample(), "Why?"));
        assert!(answer.is_err());
    }

    #[test]
    fn test_placeholders_on_failure() {
        let client = offline_client();

        let insights = tokio_test::block_on(insights_or_placeholder(&client, &sample()));
        assert_eq!(insights, vec![INSIGHTS_UNAVAILABLE.to_string()]);

        let answer = tokio_test::block_on(answer_or_placeholder(&client, &sample(), "Why?"));
        assert_eq!(answer, ANSWER_UNAVAILABLE);
    }

    #[test]
    fn test_insights_from_reply() {
        let blank = parse_bullets("\n  \n");
        assert_eq!(insights_from_reply(Ok(blank)), vec![NO_INSIGHTS.to_string()]);

        let parsed = insights_from_reply(Ok(vec!["Restock shelves".to_string()]));
        assert_eq!(parsed, vec!["Restock shelves"]);

        let failed = insights_from_reply(Err(anyhow::anyhow!("Chat API error 500")));
        assert_eq!(failed, vec![INSIGHTS_UNAVAILABLE.to_string()]);
    }

    #[test]
    fn test_parse_bullets_keeps_leading_symbols() {
        assert_eq!(
            parse_bullets("-20% returns since March\n*Note* staff shortages"),
            vec!["-20% returns since March", "*Note* staff shortages"]
        );
        assert_eq!(parse_bullets("**Staffing**: hire more"), vec!["**Staffing**: hire more"]);
        assert_eq!(parse_bullets("-\tTabbed item\n•Tight bullet"), vec!["Tabbed item", "Tight bullet"]);
        assert!(parse_bullets("-\n*").is_empty());
    }

    #[test]
    fn test_parse_bullets() {
        let reply = "- Train staff on returns\n\n* Restock popular items\n• Tidy the aisles\n";
        assert_eq!(
            parse_bullets(reply),
            vec![
                "Train staff on returns",
                "Restock popular items",
                "Tidy the aisles"
            ]
        );

        let numbered = "1. First\n2) Second\n  3.Third  ";
        assert_eq!(parse_bullets(numbered), vec!["First", "Second", "Third"]);

        assert_eq!(parse_bullets("Plain sentence"), vec!["Plain sentence"]);
        assert!(parse_bullets("  \n- \n").is_empty());
    }

    #[test]
    fn test_format_feedback() {
        assert_eq!(
            format_feedback(&sample()),
            "1. Great service!\n2. Defective product"
        );
        assert_eq!(format_feedback(&[]), "");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "llama-3.1-8b-instant",
            messages: vec![
                ChatMessage::system(INSIGHTS_SYSTEM_PROMPT),
                ChatMessage::user("hello".to_string()),
            ],
            max_tokens: 300,
            temperature: 0.5,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "llama-3.1-8b-instant");
        assert_eq!(json["max_tokens"], 300);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hello");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"- One\n- Two"}}]}"#;
        let response: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parse_bullets(&first_content(response)), vec!["One", "Two"]);

        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(first_content(empty), "");

        let null_content: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert_eq!(first_content(null_content), "");
    }
}
