// Keyword suggestions from an OpenAI-compatible chat completions API

use crate::config::KeywordSettings;
use crate::extract::PageSignals;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum KeywordError {
    #[error("No API key: set the {0} environment variable")]
    MissingApiKey(String),

    #[error("Keyword request timed out")]
    Timeout,

    #[error("Keyword request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Keyword API answered with HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Keyword API returned no suggestions")]
    EmptyResponse,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone)]
pub struct KeywordClient {
    client: Client,
    settings: KeywordSettings,
    api_key: Option<String>,
}

impl KeywordClient {
    /// Key taken from the environment variable named in the settings.
    pub fn new(settings: KeywordSettings) -> Result<Self, KeywordError> {
        let api_key = settings.api_key();
        Self::with_api_key(settings, api_key)
    }

    pub fn with_api_key(
        settings: KeywordSettings,
        api_key: Option<String>,
    ) -> Result<Self, KeywordError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            settings,
            api_key,
        })
    }

    pub async fn suggest(&self, signals: &PageSignals) -> Result<Vec<String>, KeywordError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| KeywordError::MissingApiKey(self.settings.api_key_env.clone()))?;

        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: format!(
                        "You are an SEO assistant. Reply with at most {} search keywords for the page, \
                         comma separated, nothing else.",
                        self.settings.max_keywords
                    ),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: page_summary(signals),
                },
            ],
            temperature: 0.3,
        };

        info!("Requesting keyword suggestions from {}", self.settings.endpoint);
        let response = self
            .client
            .post(&self.settings.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(timeout_or_request)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(KeywordError::Api {
                status: status.as_u16(),
                message: message.chars().take(200).collect(),
            });
        }

        let body: ChatResponse = response.json().await.map_err(timeout_or_request)?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(KeywordError::EmptyResponse)?;

        let keywords = parse_keywords(&content, self.settings.max_keywords);
        debug!("Parsed {} keyword(s)", keywords.len());
        if keywords.is_empty() {
            return Err(KeywordError::EmptyResponse);
        }
        Ok(keywords)
    }
}

fn timeout_or_request(error: reqwest::Error) -> KeywordError {
    if error.is_timeout() {
        KeywordError::Timeout
    } else {
        KeywordError::Request(error)
    }
}

fn page_summary(signals: &PageSignals) -> String {
    let mut summary = String::new();
    if let Some(title) = &signals.title {
        summary.push_str(&format!("Title: {}\n", title));
    }
    if let Some(description) = &signals.meta_description {
        summary.push_str(&format!("Description: {}\n", description));
    }
    let headings: Vec<&str> = signals
        .headings
        .h1
        .iter()
        .chain(&signals.headings.h2)
        .map(String::as_str)
        .collect();
    if !headings.is_empty() {
        summary.push_str(&format!("Headings: {}\n", headings.join(" | ")));
    }
    summary
}

/// Split a model reply into keywords. Accepts comma or newline separated
/// lists, with or without bullets and numbering.
pub fn parse_keywords(reply: &str, max: usize) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for raw in reply.split([',', '\n']) {
        let keyword = raw
            .trim()
            .trim_start_matches(|c: char| {
                c.is_ascii_digit() || matches!(c, '.' | ')' | '-' | '*' | '•')
            })
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .trim();
        if keyword.is_empty() {
            continue;
        }
        if keywords.iter().any(|k| k.eq_ignore_ascii_case(keyword)) {
            continue;
        }
        keywords.push(keyword.to_string());
        if keywords.len() == max {
            break;
        }
    }
    keywords
}
