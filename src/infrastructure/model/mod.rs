//! Upstream completion client: candidate fallback, payload dialects, and
//! stream decoding.

pub mod client;
pub mod dialect;
pub mod sse;
pub mod types;

pub use client::{CompletionAttempt, CompletionClient, FALLBACK_REPLY};
pub use dialect::{CompletionRequest, DialectTable, ParamDialect};
pub use types::{CandidatePlan, UpstreamError};

use std::env;
use tracing::warn;

/// Environment variables holding the upstream credential, checked in order.
const API_KEY_VARS: [&str; 2] = ["OPEN_AI_KEY", "OPENAI_API_KEY"];

/// Resolve the upstream API key from the environment.
pub fn resolve_api_key() -> Option<String> {
    for var in API_KEY_VARS {
        if let Ok(value) = env::var(var) {
            if !value.trim().is_empty() {
                return Some(value);
            }
        }
    }
    warn!(
        vars = ?API_KEY_VARS,
        "no upstream API key present in environment"
    );
    None
}
