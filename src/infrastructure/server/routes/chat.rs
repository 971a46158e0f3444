use super::super::dto::{ChatPayload, ChatReply, ErrorResponse};
use super::super::state::AppState;
use crate::application::relay::ChatRelay;
use crate::domain::types::ChatMessage;
use crate::infrastructure::model::{CompletionAttempt, UpstreamError};
use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Header reporting which candidate model served a streamed response.
pub const MODEL_HEADER: &str = "x-model-used";

type ApiError = (StatusCode, Json<ErrorResponse>);

/// `POST /ai-chat` - study assistant, buffered unless the caller opts into
/// streaming.
pub async fn ai_chat(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatPayload>,
) -> Result<Response, ApiError> {
    respond(&state, payload, Persona::Assistant, false).await
}

/// `POST /chatbot` - citation-aware assistant, streamed unless the caller
/// opts out.
pub async fn chatbot(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ChatPayload>,
) -> Result<Response, ApiError> {
    respond(&state, payload, Persona::CitedAssistant, true).await
}

enum Persona {
    Assistant,
    CitedAssistant,
}

async fn respond(
    state: &AppState,
    payload: ChatPayload,
    persona: Persona,
    default_stream: bool,
) -> Result<Response, ApiError> {
    let Some(relay) = state.relay() else {
        error!("rejecting chat request: no upstream credential configured");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("server not configured")),
        ));
    };

    let Some(turns) = payload.turns() else {
        warn!("rejecting chat request with malformed message list");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("invalid messages format")),
        ));
    };

    let stream = payload.stream.unwrap_or(default_stream);
    info!(turns = turns.len(), stream, "relaying chat request");

    let attempt = dispatch(relay, persona, turns, stream)
        .await
        .map_err(upstream_error)?;

    if stream {
        streamed_response(attempt)
    } else {
        buffered_response(attempt).await
    }
}

async fn dispatch(
    relay: &ChatRelay,
    persona: Persona,
    turns: Vec<ChatMessage>,
    stream: bool,
) -> Result<CompletionAttempt, UpstreamError> {
    match persona {
        Persona::Assistant => relay.assist(turns, stream).await,
        Persona::CitedAssistant => relay.assist_with_citations(turns, stream).await,
    }
}

async fn buffered_response(attempt: CompletionAttempt) -> Result<Response, ApiError> {
    let model = attempt.model.clone();
    let reply = attempt.into_reply().await.map_err(upstream_error)?;
    info!(model = model.as_str(), "returning buffered reply");
    Ok(Json(ChatReply { reply, model }).into_response())
}

/// Relay the upstream stream as plain concatenable text. The chosen model
/// travels out-of-band in a header because the body carries only content
/// fragments.
fn streamed_response(attempt: CompletionAttempt) -> Result<Response, ApiError> {
    let model = attempt.model.clone();
    let model_header = HeaderValue::from_str(&model).map_err(|_| {
        error!(model = model.as_str(), "model id is not a valid header value");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("invalid model identifier")),
        )
    })?;
    info!(model = model.as_str(), "relaying streamed reply");

    let mut response = Response::new(Body::from_stream(attempt.into_fragment_stream()));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response.headers_mut().insert(MODEL_HEADER, model_header);
    Ok(response)
}

fn upstream_error(error: UpstreamError) -> ApiError {
    match error {
        UpstreamError::Rejected { status, details } => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            Json(ErrorResponse::with_details(
                "upstream rejected the request",
                details,
            )),
        ),
        UpstreamError::Exhausted { details } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::with_details("upstream request failed", details)),
        ),
        UpstreamError::Transport { source } => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::with_details(
                "failed to reach upstream",
                source.to_string(),
            )),
        ),
    }
}
