//! Request payload dialects.
//!
//! Newer model generations take `max_completion_tokens` and reject a
//! temperature field; everything else takes `max_tokens`. Which family a
//! candidate belongs to is decided by an injectable prefix table so the
//! mapping can change without touching the relay logic.

use crate::domain::types::ChatMessage;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDialect {
    /// `max_completion_tokens`, no temperature permitted.
    CompletionTokens,
    /// `max_tokens`.
    MaxTokens,
}

/// Maps a model identifier to the payload dialect it expects.
#[derive(Debug, Clone)]
pub struct DialectTable {
    newer_param_prefixes: Vec<String>,
}

impl DialectTable {
    pub fn new(newer_param_prefixes: Vec<String>) -> Self {
        Self {
            newer_param_prefixes,
        }
    }

    pub fn dialect_for(&self, model: &str) -> ParamDialect {
        if self
            .newer_param_prefixes
            .iter()
            .any(|prefix| model.starts_with(prefix.as_str()))
        {
            ParamDialect::CompletionTokens
        } else {
            ParamDialect::MaxTokens
        }
    }
}

/// Outgoing body for one candidate attempt. Exactly one token-limit field is
/// set; no attempt ever carries a temperature field.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(
        model: &'a str,
        messages: &'a [ChatMessage],
        stream: bool,
        dialect: ParamDialect,
        max_output_tokens: u32,
    ) -> Self {
        let (max_tokens, max_completion_tokens) = match dialect {
            ParamDialect::CompletionTokens => (None, Some(max_output_tokens)),
            ParamDialect::MaxTokens => (Some(max_output_tokens), None),
        };
        Self {
            model,
            messages,
            stream,
            max_tokens,
            max_completion_tokens,
        }
    }
}
