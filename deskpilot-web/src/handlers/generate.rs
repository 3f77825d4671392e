//! Reply generation handlers

use super::types::{ApiError, GenerateRequest};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    response::Json,
};
use deskpilot_core::performance::measure_async;
use deskpilot_rag::{GeneratedMessage, RequestContext};
use tracing::{error, info, warn};

/// Generate a reply for a free-standing prompt
pub async fn generate_message(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GeneratedMessage>, ApiError> {
    let (prompt, context) = parse_request(body)?;
    run_generation(&state, &prompt, context).await
}

/// Draft a reply on a ticket. The path id replaces any `context.ticketId`.
pub async fn draft_ticket_reply(
    State(state): State<AppState>,
    Path(ticket_id): Path<String>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GeneratedMessage>, ApiError> {
    let (prompt, mut context) = parse_request(body)?;
    context.ticket_id = Some(ticket_id);
    run_generation(&state, &prompt, context).await
}

fn parse_request(
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<(String, RequestContext), ApiError> {
    let Json(request) = body.map_err(|rejection| {
        warn!("Rejected request body: {}", rejection.body_text());
        ApiError::InvalidBody
    })?;

    match request.prompt {
        Some(prompt) if !prompt.is_empty() => Ok((prompt, request.context)),
        _ => Err(ApiError::MissingPrompt),
    }
}

async fn run_generation(
    state: &AppState,
    prompt: &str,
    context: RequestContext,
) -> Result<Json<GeneratedMessage>, ApiError> {
    info!(
        ticket_id = context.ticket_id.as_deref().unwrap_or(""),
        "Generating reply"
    );

    let result = measure_async(
        "generate_message",
        state.generator.generate_response(prompt, &context),
    )
    .await;

    match result {
        Ok(message) => Ok(Json(message)),
        Err(e) if e.is_recoverable() => {
            warn!(error = %e, "Failed to generate message, may succeed on retry");
            Err(ApiError::GenerationFailed)
        }
        Err(e) => {
            error!(error = %e, "Failed to generate message");
            Err(ApiError::GenerationFailed)
        }
    }
}
