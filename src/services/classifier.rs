// src/services/classifier.rs

//! Batch title classification against a chat-completions service.
//!
//! A batch of titles goes out as one request. The reply is expected to be a
//! JSON array with one object per title. Failed attempts are retried with
//! exponential backoff; when every attempt fails the batch is labelled
//! [`CLASSIFICATION_FAILED`]. Without a credential nothing is sent and every
//! title is labelled [`UNCLASSIFIED`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::ClassifierConfig;
use crate::models::tags::{CLASSIFICATION_FAILED, MAX_SECONDARY_TAGS, PrimaryTag, UNCLASSIFIED};
use crate::services::pacing::Sleeper;

/// Labels assigned to one title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub title: String,
    pub primary_tag: String,
    pub secondary_tags: Vec<String>,
}

impl Classification {
    /// A classification carrying `sentinel` as both primary and only secondary tag.
    pub fn sentinel(title: impl Into<String>, sentinel: &str) -> Self {
        Self {
            title: title.into(),
            primary_tag: sentinel.to_string(),
            secondary_tags: vec![sentinel.to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

/// Body of a chat-completions request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

/// Sends one chat request and returns the assistant's message text.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<String>;
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions over HTTPS with bearer authentication.
pub struct HttpChatTransport {
    client: Client,
    endpoint: String,
}

impl HttpChatTransport {
    pub fn new(config: &ClassifierConfig, api_key: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| AppError::config("classifier.api_key is not a valid header value"))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.api_url.clone(),
        })
    }
}

#[async_trait]
impl ChatTransport for HttpChatTransport {
    async fn complete(&self, request: &ChatRequest) -> Result<String> {
        let response: ChatResponse = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::classification("response has no message content"))
    }
}

/// How many requests to make per batch and how long to back off after each
/// failed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Requests per batch, the first one included
    pub max_attempts: u32,
    /// Wait after the first failure; doubled for each further failure
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Wait after failed attempt number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl From<&ClassifierConfig> for RetryPolicy {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_secs(config.backoff_base_secs),
        }
    }
}

/// Classifies announcement titles in bounded batches.
pub struct ClassifierClient {
    transport: Option<Box<dyn ChatTransport>>,
    sleeper: Arc<dyn Sleeper>,
    retry: RetryPolicy,
    model: String,
    temperature: f32,
    max_batch_size: usize,
    batch_pause: Duration,
}

impl ClassifierClient {
    /// Build a client talking to the configured endpoint.
    ///
    /// No transport is created when the configuration carries no credential.
    pub fn from_config(config: &ClassifierConfig, sleeper: Arc<dyn Sleeper>) -> Result<Self> {
        let transport: Option<Box<dyn ChatTransport>> = match config.credential() {
            Some(key) => Some(Box::new(HttpChatTransport::new(config, key)?)),
            None => None,
        };
        Ok(Self::new(config, transport, sleeper))
    }

    /// Build a client over an explicit transport.
    ///
    /// The transport is ignored unless the configuration carries a credential.
    pub fn new(
        config: &ClassifierConfig,
        transport: Option<Box<dyn ChatTransport>>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let transport = config.credential().and(transport);
        if transport.is_none() {
            log::warn!("No classifier credential configured; new entries stay unclassified");
        }
        Self {
            transport,
            sleeper,
            retry: RetryPolicy::from(config),
            model: config.model.clone(),
            temperature: config.temperature,
            max_batch_size: config.max_batch_size.max(1),
            batch_pause: Duration::from_millis(config.batch_pause_ms),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Classify one batch.
    ///
    /// The result has one element per input title, in input order. Titles the
    /// service did not answer for are labelled [`CLASSIFICATION_FAILED`].
    pub async fn classify_batch(&self, titles: &[String]) -> Vec<Classification> {
        let Some(transport) = self.transport.as_deref() else {
            return label_all(titles, UNCLASSIFIED);
        };
        if titles.is_empty() {
            return Vec::new();
        }

        let request = self.build_request(titles);
        let attempts = self.retry.attempts();
        for attempt in 0..attempts {
            match request_labels(transport, &request).await {
                Ok(labels) => return align(titles, labels),
                Err(e) => log::warn!(
                    "Classification attempt {}/{} failed: {e}",
                    attempt + 1,
                    attempts
                ),
            }
            let wait = self.retry.backoff(attempt);
            log::info!("Backing off {wait:?} before the next classification request");
            self.sleeper.sleep(wait).await;
        }

        log::error!(
            "Classification gave up after {attempts} attempts; {} titles marked failed",
            titles.len()
        );
        label_all(titles, CLASSIFICATION_FAILED)
    }

    /// Classify any number of titles, split into batches of at most the
    /// configured size, pausing after each full batch that has a successor.
    ///
    /// Results are keyed by exact title; repeated titles share the last answer.
    pub async fn classify_titles(&self, titles: &[String]) -> HashMap<String, Classification> {
        let mut by_title = HashMap::with_capacity(titles.len());
        let mut batches = titles.chunks(self.max_batch_size).peekable();

        while let Some(batch) = batches.next() {
            log::info!("Classifying batch of {} titles", batch.len());
            for classification in self.classify_batch(batch).await {
                by_title.insert(classification.title.clone(), classification);
            }
            if self.is_enabled() && batch.len() == self.max_batch_size && batches.peek().is_some() {
                self.sleeper.sleep(self.batch_pause).await;
            }
        }
        by_title
    }

    fn build_request(&self, titles: &[String]) -> ChatRequest {
        let listing: String = titles
            .iter()
            .map(|title| format!("- {title}\n"))
            .collect();
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system_prompt(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "Classify these {} announcement titles:\n{listing}",
                        titles.len()
                    ),
                },
            ],
            temperature: self.temperature,
        }
    }
}

fn system_prompt() -> String {
    let taxonomy: String = PrimaryTag::ALL
        .iter()
        .map(|tag| format!("- {}\n", tag.label()))
        .collect();
    format!(
        "You label announcements from a university office portal.\n\
         For every title give one primary_tag chosen from exactly this list:\n\
         {taxonomy}\
         and 1 to {MAX_SECONDARY_TAGS} short secondary_tags in Chinese naming the subject, \
         audience or activity.\n\
         Hiring, finance disclosures, party affairs and speeches belong to {other}.\n\
         Answer with a JSON array only, one object per title, in input order:\n\
         [{{\"title\": \"...\", \"primary_tag\": \"...\", \"secondary_tags\": [\"...\"]}}]\n\
         Copy each title exactly as given.",
        other = PrimaryTag::Other.label(),
    )
}

async fn request_labels(
    transport: &dyn ChatTransport,
    request: &ChatRequest,
) -> Result<Vec<Classification>> {
    let content = transport.complete(request).await?;
    parse_labels(&content)
}

/// One result object as the service writes it.
#[derive(Debug, Deserialize)]
struct LabelItem {
    #[serde(alias = "新闻标题")]
    title: String,
    #[serde(alias = "一级分类")]
    primary_tag: String,
    #[serde(default, alias = "二级分类")]
    secondary_tags: Vec<String>,
}

/// Parse the assistant's reply into sanitized classifications.
///
/// Accepts a bare JSON array, one wrapped in a Markdown code fence, or an
/// object whose first array-valued field holds the results.
fn parse_labels(content: &str) -> Result<Vec<Classification>> {
    let value: Value = serde_json::from_str(strip_code_fence(content))?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(fields) => fields
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .ok_or_else(|| AppError::classification("object reply holds no array"))?,
        _ => return Err(AppError::classification("reply is neither array nor object")),
    };

    let labels: Vec<Classification> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<LabelItem>(item) {
            Ok(item) => Some(sanitize(item)),
            Err(e) => {
                log::warn!("Ignoring malformed classification item: {e}");
                None
            }
        })
        .collect();

    if labels.is_empty() {
        return Err(AppError::classification("reply holds no usable results"));
    }
    Ok(labels)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    match rest.find('\n') {
        Some(newline) => rest[newline + 1..].trim(),
        None => rest.trim(),
    }
}

fn sanitize(item: LabelItem) -> Classification {
    let primary_tag = match PrimaryTag::from_label(&item.primary_tag) {
        Some(tag) => tag.label().to_string(),
        None => {
            log::warn!(
                "Primary tag '{}' for '{}' is outside the taxonomy",
                item.primary_tag,
                item.title
            );
            CLASSIFICATION_FAILED.to_string()
        }
    };

    let mut secondary_tags: Vec<String> = item
        .secondary_tags
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .take(MAX_SECONDARY_TAGS)
        .map(str::to_string)
        .collect();
    if secondary_tags.is_empty() {
        secondary_tags.push(CLASSIFICATION_FAILED.to_string());
    }

    Classification {
        title: item.title,
        primary_tag,
        secondary_tags,
    }
}

/// Match results back to the input titles; the last result for a title wins.
fn align(titles: &[String], labels: Vec<Classification>) -> Vec<Classification> {
    let by_title: HashMap<String, Classification> = labels
        .into_iter()
        .map(|label| (label.title.clone(), label))
        .collect();

    titles
        .iter()
        .map(|title| match by_title.get(title) {
            Some(label) => label.clone(),
            None => {
                log::warn!("No classification returned for '{title}'");
                Classification::sentinel(title.as_str(), CLASSIFICATION_FAILED)
            }
        })
        .collect()
}

fn label_all(titles: &[String], sentinel: &str) -> Vec<Classification> {
    titles
        .iter()
        .map(|title| Classification::sentinel(title.as_str(), sentinel))
        .collect()
}
