//! Comment service.

use chrono::Utc;
use colloquy_common::config::InteractionConfig;
use colloquy_common::{AppError, AppResult, IdGenerator};
use colloquy_db::entities::comment;
use colloquy_db::store::{CommentFilter, CommentStore};
use serde::Deserialize;
use validator::Validate;

use crate::identity::{Actor, PrivilegedRoles};

/// Input for posting a comment or reply.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[validate(length(min = 1, max = 128))]
    pub parent_id: String,

    pub content: String,

    /// Comment being answered; `None` posts a root comment.
    #[validate(length(min = 1, max = 128))]
    pub reply_to_id: Option<String>,
}

impl NewComment {
    /// Root comment on `parent_id`.
    pub fn root(parent_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            content: content.into(),
            reply_to_id: None,
        }
    }

    /// Reply to `reply_to_id` on `parent_id`.
    pub fn reply(
        parent_id: impl Into<String>,
        content: impl Into<String>,
        reply_to_id: impl Into<String>,
    ) -> Self {
        Self {
            reply_to_id: Some(reply_to_id.into()),
            ..Self::root(parent_id, content)
        }
    }
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_store: CommentStore,
    privileged_roles: PrivilegedRoles,
    max_content_length: usize,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(comment_store: CommentStore, config: &InteractionConfig) -> Self {
        Self {
            comment_store,
            privileged_roles: PrivilegedRoles::new(config.privileged_roles.iter().cloned()),
            max_content_length: config.max_content_length,
            id_gen: IdGenerator::new(),
        }
    }

    /// All comments of one content item, unordered.
    pub async fn list(&self, parent_id: &str) -> AppResult<Vec<comment::Model>> {
        self.comment_store
            .query(&CommentFilter::for_parent(parent_id))
            .await
    }

    /// Post a comment as `author`.
    ///
    /// Input is checked before the store is touched; the reply target is
    /// then resolved and must belong to the same content item.
    pub async fn create(&self, input: NewComment, author: &Actor) -> AppResult<comment::Model> {
        if !author.is_authenticated() {
            return Err(AppError::Unauthorized);
        }
        input.validate()?;

        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::InvalidInput(
                "Comment content must not be empty".to_string(),
            ));
        }
        if content.chars().count() > self.max_content_length {
            return Err(AppError::InvalidInput(format!(
                "Comment content exceeds {} characters",
                self.max_content_length
            )));
        }
        if input.parent_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "parent_id must not be blank".to_string(),
            ));
        }
        if input
            .reply_to_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return Err(AppError::InvalidInput(
                "reply_to_id must not be blank".to_string(),
            ));
        }

        if let Some(reply_to_id) = &input.reply_to_id {
            match self.comment_store.get(reply_to_id).await? {
                Some(target) if target.parent_id == input.parent_id => {}
                Some(_) => {
                    return Err(AppError::InvalidReply(format!(
                        "Comment {reply_to_id} belongs to another content item"
                    )));
                }
                None => {
                    return Err(AppError::InvalidReply(format!(
                        "Comment {reply_to_id} does not exist"
                    )));
                }
            }
        }

        let model = comment::Model {
            id: self.id_gen.generate(),
            parent_id: input.parent_id,
            reply_to_id: input.reply_to_id,
            author_id: author.user_id.clone(),
            author_name: author.display_name.clone(),
            author_role: author.role.clone(),
            content: content.to_string(),
            created_at: Utc::now().into(),
        };
        self.comment_store.put(model.clone()).await?;

        tracing::info!(
            comment_id = %model.id,
            parent_id = %model.parent_id,
            author_id = %model.author_id,
            is_reply = model.reply_to_id.is_some(),
            "Comment created"
        );
        Ok(model)
    }

    /// Whether `requester` may delete `comment`.
    #[must_use]
    pub fn can_delete(&self, comment: &comment::Model, requester: &Actor) -> bool {
        requester.is_authenticated()
            && (comment.author_id == requester.user_id
                || self.privileged_roles.contains(&requester.role))
    }

    /// Delete a comment. Replies are kept and become orphans.
    pub async fn delete(&self, comment_id: &str, requester: &Actor) -> AppResult<()> {
        if !requester.is_authenticated() {
            return Err(AppError::Unauthorized);
        }

        let comment = self
            .comment_store
            .get(comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {comment_id}")))?;

        if !self.can_delete(&comment, requester) {
            return Err(AppError::Forbidden(
                "Cannot delete other user's comment".to_string(),
            ));
        }

        // A concurrent delete may have won the race
        if !self.comment_store.delete(comment_id).await? {
            return Err(AppError::NotFound(format!("Comment {comment_id}")));
        }

        tracing::info!(
            comment_id,
            parent_id = %comment.parent_id,
            requester_id = %requester.user_id,
            moderated = comment.author_id != requester.user_id,
            "Comment deleted"
        );
        Ok(())
    }
}
