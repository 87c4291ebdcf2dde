//! `POST /groups/:group_id/send`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBody {
    #[serde(default)]
    pub sender_id: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub persona_id: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub replies: Vec<Reply>,
}

/// Send one message to every responder of a group.
pub async fn send(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    payload: std::result::Result<Json<SendBody>, JsonRejection>,
) -> Result<Json<SendResponse>> {
    let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let outcome = state
        .gateway
        .group_send(&group_id, &body.sender_id, &body.text)
        .await?;

    Ok(Json(SendResponse {
        replies: outcome
            .replies
            .into_iter()
            .map(|reply| Reply {
                persona_id: reply.persona_id,
                text: reply.text,
            })
            .collect(),
    }))
}
