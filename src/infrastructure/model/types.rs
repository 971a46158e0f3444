//! Model types - candidate plan, upstream errors, and rejection triage.

use super::dialect::DialectTable;
use crate::config::UpstreamConfig;
use serde::Deserialize;
use thiserror::Error;

/// How much of an upstream error body survives into diagnostics.
pub(crate) const DETAILS_LIMIT: usize = 500;

/// The ordered model list together with the dialect table and token cap.
#[derive(Debug, Clone)]
pub struct CandidatePlan {
    pub models: Vec<String>,
    pub dialects: DialectTable,
    pub max_output_tokens: u32,
}

impl CandidatePlan {
    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self {
            models: config.models.clone(),
            dialects: DialectTable::new(config.newer_param_prefixes.clone()),
            max_output_tokens: config.max_output_tokens,
        }
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The upstream refused an attempt for a reason other than model
    /// availability. Never retried.
    #[error("upstream rejected the request with status {status}")]
    Rejected { status: u16, details: String },
    /// Every candidate was refused for model-related reasons.
    #[error("all candidate models were rejected upstream")]
    Exhausted { details: String },
    #[error("failed to reach upstream: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },
}

/// Triage verdict for one upstream rejection body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RejectionKind {
    /// The candidate model is unavailable; the next candidate may work.
    ModelAvailability,
    /// Auth, quota, malformed request - retrying other models cannot help.
    Hard,
    /// The body was not structured JSON; treated as retryable but logged.
    Unclassified,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

/// Decide whether a rejection is model-related. The structured `error.code`
/// field is authoritative; the textual match on "model" is a fallback for
/// upstream deployments that omit the code.
pub(crate) fn classify_rejection(body: &str) -> RejectionKind {
    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        return RejectionKind::Unclassified;
    };
    let detail = envelope.error.unwrap_or(ErrorDetail {
        code: None,
        message: None,
    });
    if detail.code.as_deref() == Some("model_not_found") {
        return RejectionKind::ModelAvailability;
    }
    let message = detail.message.unwrap_or_default();
    if message.to_ascii_lowercase().contains("model") {
        return RejectionKind::ModelAvailability;
    }
    RejectionKind::Hard
}

/// Bound an error body for diagnostics without splitting a code point.
pub(crate) fn excerpt(body: &str, limit: usize) -> String {
    body.chars().take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_not_found_code_is_model_related() {
        let body = r#"{"error":{"code":"model_not_found","message":"does not exist"}}"#;
        assert_eq!(classify_rejection(body), RejectionKind::ModelAvailability);
    }

    #[test]
    fn message_mentioning_model_is_model_related() {
        let body = r#"{"error":{"message":"The Model `x` has been deprecated"}}"#;
        assert_eq!(classify_rejection(body), RejectionKind::ModelAvailability);
    }

    #[test]
    fn auth_failure_is_hard() {
        let body = r#"{"error":{"code":"invalid_api_key","message":"Incorrect API key provided"}}"#;
        assert_eq!(classify_rejection(body), RejectionKind::Hard);
    }

    #[test]
    fn unparseable_body_is_unclassified() {
        assert_eq!(
            classify_rejection("upstream fell over"),
            RejectionKind::Unclassified
        );
    }

    #[test]
    fn excerpt_bounds_by_characters() {
        let body = "é".repeat(600);
        let bounded = excerpt(&body, DETAILS_LIMIT);
        assert_eq!(bounded.chars().count(), DETAILS_LIMIT);
    }
}
