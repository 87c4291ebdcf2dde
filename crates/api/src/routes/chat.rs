//! `POST /chat/:bot_id`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub response: String,
    pub conversation_id: String,
    pub bot_id: String,
}

/// Send one message to a persona.
pub async fn chat(
    State(state): State<AppState>,
    Path(bot_id): Path<String>,
    payload: std::result::Result<Json<ChatBody>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state
        .gateway
        .chat(&bot_id, &body.message, body.conversation_id.as_deref())
        .await?;

    Ok(Json(ChatResponse {
        response: outcome.response,
        conversation_id: outcome.conversation_id,
        bot_id: outcome.bot_id,
    }))
}
