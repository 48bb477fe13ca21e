//! Reaction endpoints.

use axum::{Json, Router, extract::State, routing::post};
use colloquy_common::AppResult;
use colloquy_core::{ReactionSummary, require_actor};
use colloquy_db::entities::reaction::ReactionType;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{extractors::MaybeAuthUser, middleware::AppState, response::ApiResponse};

/// Summary request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    #[validate(length(min = 1, max = 128))]
    pub parent_id: String,
}

/// Get like/dislike counts and the caller's own reaction.
async fn summary(
    user: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<SummaryRequest>,
) -> AppResult<ApiResponse<ReactionSummary>> {
    req.validate()?;

    let summary = state
        .interaction_service
        .load_reaction_summary(&req.parent_id, user.actor().map(|a| a.user_id.as_str()))
        .await?;
    Ok(ApiResponse::ok(summary))
}

/// Toggle request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ToggleRequest {
    #[validate(length(min = 1, max = 128))]
    pub parent_id: String,
    #[serde(rename = "type")]
    pub reaction_type: ReactionType,
}

/// Toggle response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub current_user_reaction: Option<ReactionType>,
}

/// Toggle the caller's reaction.
async fn toggle(
    user: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<ToggleRequest>,
) -> AppResult<ApiResponse<ToggleResponse>> {
    require_actor(user.actor())?;
    req.validate()?;

    let current_user_reaction = state
        .interaction_service
        .toggle_reaction(&req.parent_id, user.actor(), req.reaction_type)
        .await?;

    Ok(ApiResponse::ok(ToggleResponse {
        current_user_reaction,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summary", post(summary))
        .route("/toggle", post(toggle))
}
