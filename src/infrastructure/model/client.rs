//! Completion client with ordered candidate fallback.

use super::dialect::CompletionRequest;
use super::sse;
use super::types::{
    CandidatePlan, DETAILS_LIMIT, RejectionKind, UpstreamError, classify_rejection, excerpt,
};
use crate::config::UpstreamConfig;
use crate::domain::types::ChatMessage;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Returned when a completion body carries no assistant content.
pub const FALLBACK_REPLY: &str = "I couldn't generate a response.";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Stateless client for the upstream completions endpoint. One instance is
/// shared by every request; all per-request data lives on the stack.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    plan: CandidatePlan,
    attempt_timeout: Duration,
}

/// A successful candidate attempt: the model that was accepted and the
/// still-unread upstream response.
#[derive(Debug)]
pub struct CompletionAttempt {
    pub model: String,
    pub response: reqwest::Response,
}

impl CompletionClient {
    pub fn new(config: &UpstreamConfig, api_key: String) -> Result<Self, UpstreamError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key,
            plan: CandidatePlan::from_config(config),
            attempt_timeout: Duration::from_secs(config.attempt_timeout_secs),
        })
    }

    /// Try each candidate model in declared order until one is accepted.
    ///
    /// Attempts are strictly sequential: the retry decision depends on
    /// reading the previous rejection. Only model-availability rejections
    /// advance the iteration; anything else surfaces immediately.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        stream: bool,
    ) -> Result<CompletionAttempt, UpstreamError> {
        let mut last_error = String::new();
        for model in &self.plan.models {
            let dialect = self.plan.dialects.dialect_for(model);
            let body = CompletionRequest::new(
                model,
                messages,
                stream,
                dialect,
                self.plan.max_output_tokens,
            );
            let mut request = self
                .http
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body);
            if !stream {
                // Streamed attempts skip the wall-clock deadline: it would
                // cut off long generations mid-body.
                request = request.timeout(self.attempt_timeout);
            }
            let response = request.send().await?;
            if response.status().is_success() {
                debug!(model = model.as_str(), "upstream accepted candidate");
                return Ok(CompletionAttempt {
                    model: model.clone(),
                    response,
                });
            }

            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            error!(
                model = model.as_str(),
                status,
                body = text.as_str(),
                "upstream rejected candidate"
            );
            match classify_rejection(&text) {
                RejectionKind::ModelAvailability => last_error = text,
                RejectionKind::Unclassified => {
                    warn!(
                        model = model.as_str(),
                        "rejection body was not structured; trying next candidate"
                    );
                    last_error = text;
                }
                RejectionKind::Hard => {
                    return Err(UpstreamError::Rejected {
                        status,
                        details: excerpt(&text, DETAILS_LIMIT),
                    });
                }
            }
        }
        Err(UpstreamError::Exhausted {
            details: excerpt(&last_error, DETAILS_LIMIT),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

impl CompletionAttempt {
    /// Consume a buffered completion and extract the assistant reply.
    pub async fn into_reply(self) -> Result<String, UpstreamError> {
        let body: CompletionBody = self.response.json().await?;
        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_else(|| FALLBACK_REPLY.to_string()))
    }

    /// Consume a streamed completion as bare content fragments.
    pub fn into_fragment_stream(self) -> impl Stream<Item = Result<Bytes, reqwest::Error>> {
        sse::content_fragments(self.response.bytes_stream().boxed())
    }
}
