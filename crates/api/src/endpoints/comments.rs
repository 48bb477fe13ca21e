//! Comment endpoints.

use axum::{Json, Router, extract::State, response::IntoResponse, routing::post};
use colloquy_common::{AppError, AppResult};
use colloquy_core::{DisplayRow, ThreadNode, require_actor, thread::count_comments};
use colloquy_db::entities::comment;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    extractors::MaybeAuthUser,
    middleware::AppState,
    response::{self, ApiResponse, RawJson},
};

/// Comment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub parent_id: String,
    pub reply_to_id: Option<String>,
    pub author_id: String,
    pub author_name: String,
    pub author_role: String,
    pub content: String,
    pub created_at: String,
}

impl From<&comment::Model> for CommentResponse {
    fn from(c: &comment::Model) -> Self {
        Self::from(c.clone())
    }
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_id,
            reply_to_id: c.reply_to_id,
            author_id: c.author_id,
            author_name: c.author_name,
            author_role: c.author_role,
            content: c.content,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Display row response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRowResponse {
    pub comment: CommentResponse,
    pub depth: usize,
    pub indent: usize,
    pub orphaned: bool,
}

impl From<DisplayRow> for DisplayRowResponse {
    fn from(row: DisplayRow) -> Self {
        Self {
            comment: row.comment.into(),
            depth: row.depth,
            indent: row.indent,
            orphaned: row.orphaned,
        }
    }
}

/// Thread request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ThreadRequest {
    #[validate(length(min = 1, max = 128))]
    pub parent_id: String,
}

enum Step<'a> {
    Node(&'a ThreadNode),
    Comma,
    EndNode,
}

fn push_siblings<'a>(stack: &mut Vec<Step<'a>>, nodes: &'a [ThreadNode]) {
    for (i, node) in nodes.iter().enumerate().rev() {
        stack.push(Step::Node(node));
        if i > 0 {
            stack.push(Step::Comma);
        }
    }
}

/// Render `{"data":{"total":..,"threads":[..]}}` for a reply forest.
///
/// Each node becomes `{"comment":..,"replies":[..]}`. The tree is walked
/// with an explicit stack so arbitrarily deep reply chains are safe.
pub fn thread_json(threads: &[ThreadNode]) -> serde_json::Result<Vec<u8>> {
    let total = count_comments(threads);
    let mut out = Vec::with_capacity(64 + total * 320);
    out.extend_from_slice(b"{\"data\":{\"total\":");
    out.extend_from_slice(total.to_string().as_bytes());
    out.extend_from_slice(b",\"threads\":[");

    let mut stack = Vec::new();
    push_siblings(&mut stack, threads);
    while let Some(step) = stack.pop() {
        match step {
            Step::Comma => out.push(b','),
            Step::EndNode => out.extend_from_slice(b"]}"),
            Step::Node(node) => {
                out.extend_from_slice(b"{\"comment\":");
                serde_json::to_writer(&mut out, &CommentResponse::from(&node.comment))?;
                out.extend_from_slice(b",\"replies\":[");
                stack.push(Step::EndNode);
                push_siblings(&mut stack, &node.replies);
            }
        }
    }

    out.extend_from_slice(b"]}}");
    Ok(out)
}

/// Get the reply tree of a content item.
async fn thread(
    State(state): State<AppState>,
    Json(req): Json<ThreadRequest>,
) -> AppResult<RawJson> {
    req.validate()?;

    let threads = state.interaction_service.load_thread(&req.parent_id).await?;
    let body = thread_json(&threads).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(RawJson(body))
}

/// Display rows request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRequest {
    #[validate(length(min = 1, max = 128))]
    pub parent_id: String,
    #[validate(range(max = 32))]
    pub max_display_depth: Option<usize>,
}

/// Get a thread flattened for rendering.
async fn display(
    State(state): State<AppState>,
    Json(req): Json<DisplayRequest>,
) -> AppResult<ApiResponse<Vec<DisplayRowResponse>>> {
    req.validate()?;

    let rows = state
        .interaction_service
        .load_display_rows(&req.parent_id, req.max_display_depth)
        .await?;

    Ok(ApiResponse::ok(rows.into_iter().map(Into::into).collect()))
}

/// Create comment request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 128))]
    pub parent_id: String,
    pub content: String,
    #[validate(length(min = 1, max = 128))]
    pub reply_to_id: Option<String>,
}

/// Post a comment or reply.
async fn create(
    user: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateCommentRequest>,
) -> AppResult<ApiResponse<CommentResponse>> {
    require_actor(user.actor())?;
    req.validate()?;

    let created = state
        .interaction_service
        .post_comment(
            &req.parent_id,
            &req.content,
            user.actor(),
            req.reply_to_id.as_deref(),
        )
        .await?;

    Ok(ApiResponse::ok(created.into()))
}

/// Delete comment request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCommentRequest {
    #[validate(length(min = 1, max = 128))]
    pub comment_id: String,
}

/// Delete a comment.
async fn delete(
    user: MaybeAuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteCommentRequest>,
) -> AppResult<impl IntoResponse> {
    require_actor(user.actor())?;
    req.validate()?;

    state
        .interaction_service
        .remove_comment(&req.comment_id, user.actor())
        .await?;
    Ok(response::ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/thread", post(thread))
        .route("/display", post(display))
        .route("/create", post(create))
        .route("/delete", post(delete))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn created_at() -> chrono::DateTime<chrono::FixedOffset> {
        Utc.timestamp_opt(1_700_000_000, 0).single().unwrap().into()
    }

    fn comment(id: &str, reply_to: Option<&str>) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            parent_id: "p".to_string(),
            reply_to_id: reply_to.map(str::to_string),
            author_id: "u".to_string(),
            author_name: "U".to_string(),
            author_role: "Member".to_string(),
            content: format!("c{id}"),
            created_at: created_at(),
        }
    }

    fn node(id: &str, reply_to: Option<&str>, replies: Vec<ThreadNode>) -> ThreadNode {
        ThreadNode {
            comment: comment(id, reply_to),
            replies,
        }
    }

    #[test]
    fn test_thread_json_shape() {
        let threads = vec![
            node(
                "a",
                None,
                vec![node("b", Some("a"), vec![]), node("c", Some("a"), vec![])],
            ),
            node("d", None, vec![]),
        ];

        let body = thread_json(&threads).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(value["data"]["total"], 4);
        let roots = value["data"]["threads"].as_array().unwrap();
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0]["comment"]["id"], "a");
        assert_eq!(roots[0]["replies"][0]["comment"]["id"], "b");
        assert_eq!(roots[0]["replies"][1]["comment"]["replyToId"], "a");
        assert_eq!(roots[1]["comment"]["content"], "cd");
        assert_eq!(roots[1]["replies"], serde_json::json!([]));
    }

    #[test]
    fn test_thread_json_empty() {
        let body = thread_json(&[]).unwrap();
        assert_eq!(body, b"{\"data\":{\"total\":0,\"threads\":[]}}");
    }

    #[test]
    fn test_thread_json_very_deep_chain() {
        const DEPTH: usize = 100_000;

        let mut tree = node(&(DEPTH - 1).to_string(), Some(&(DEPTH - 2).to_string()), vec![]);
        for i in (0..DEPTH - 1).rev() {
            let reply_to = i.checked_sub(1).map(|p| p.to_string());
            tree = node(&i.to_string(), reply_to.as_deref(), vec![tree]);
        }
        let threads = vec![tree];

        let body = thread_json(&threads).unwrap();

        let prefix = b"{\"data\":{\"total\":100000,\"threads\":[{\"comment\":{\"id\":\"0\"";
        assert!(body.starts_with(prefix));
        assert!(body.ends_with(b"]}]}]}}"));
        assert_eq!(body.windows(2).filter(|w| w == b"[]").count(), 1);
        let opens = body.iter().filter(|&&b| b == b'[').count();
        let closes = body.iter().filter(|&&b| b == b']').count();
        assert_eq!(opens, DEPTH + 1);
        assert_eq!(opens, closes);

        drop(threads);
    }
}
