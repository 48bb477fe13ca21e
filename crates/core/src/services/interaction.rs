//! Interaction façade.
//!
//! The single entry point content pages use for threads and reactions.
//! Mutations require an authenticated [`Actor`]; that check happens here,
//! before any store access.

use std::sync::Arc;

use colloquy_common::config::{Config, InteractionConfig};
use colloquy_common::AppResult;
use colloquy_db::entities::comment;
use colloquy_db::entities::reaction::ReactionType;
use colloquy_db::store::{CommentStore, ReactionStore, RetryConfig, RetryingStore};

use super::comment::{CommentService, NewComment};
use super::reaction::{ReactionService, ReactionSummary};
use super::thread::{self, DisplayRow, ThreadNode};
use crate::identity::{Actor, require_actor};

/// Composes the comment, reaction and thread components.
#[derive(Clone)]
pub struct InteractionService {
    comments: CommentService,
    reactions: ReactionService,
    max_display_depth: usize,
}

impl InteractionService {
    /// Create a façade over the given stores.
    #[must_use]
    pub fn new(
        comment_store: CommentStore,
        reaction_store: ReactionStore,
        config: &InteractionConfig,
    ) -> Self {
        Self {
            comments: CommentService::new(comment_store, config),
            reactions: ReactionService::new(reaction_store),
            max_display_depth: config.max_display_depth,
        }
    }

    /// Create a façade whose store calls carry the configured timeout and
    /// retry policy.
    #[must_use]
    pub fn from_config(
        comment_store: CommentStore,
        reaction_store: ReactionStore,
        config: &Config,
    ) -> Self {
        let retry = RetryConfig::from(&config.store);
        Self::new(
            Arc::new(RetryingStore::new(comment_store, retry.clone())),
            Arc::new(RetryingStore::new(reaction_store, retry)),
            &config.interaction,
        )
    }

    /// Reply forest for a content item. Readable without identity.
    pub async fn load_thread(&self, parent_id: &str) -> AppResult<Vec<ThreadNode>> {
        let comments = self.comments.list(parent_id).await?;
        tracing::debug!(parent_id, count = comments.len(), "Loaded comments");
        Ok(thread::build(&comments))
    }

    /// Thread flattened for rendering, indentation clamped to
    /// `max_display_depth` (or the configured default).
    pub async fn load_display_rows(
        &self,
        parent_id: &str,
        max_display_depth: Option<usize>,
    ) -> AppResult<Vec<DisplayRow>> {
        let threads = self.load_thread(parent_id).await?;
        Ok(thread::display_rows(
            &threads,
            max_display_depth.unwrap_or(self.max_display_depth),
        ))
    }

    /// Number of comments on a content item.
    pub async fn comment_count(&self, parent_id: &str) -> AppResult<usize> {
        Ok(self.comments.list(parent_id).await?.len())
    }

    /// Post a comment or reply.
    pub async fn post_comment(
        &self,
        parent_id: &str,
        content: &str,
        author: Option<&Actor>,
        reply_to_id: Option<&str>,
    ) -> AppResult<comment::Model> {
        let author = require_actor(author)?;
        let input = NewComment {
            parent_id: parent_id.to_string(),
            content: content.to_string(),
            reply_to_id: reply_to_id.map(ToString::to_string),
        };
        self.comments.create(input, author).await
    }

    /// Delete a comment as its author or a privileged role.
    pub async fn remove_comment(&self, comment_id: &str, requester: Option<&Actor>) -> AppResult<()> {
        let requester = require_actor(requester)?;
        self.comments.delete(comment_id, requester).await
    }

    /// Reaction tallies, plus the requester's own reaction when known.
    pub async fn load_reaction_summary(
        &self,
        parent_id: &str,
        user_id: Option<&str>,
    ) -> AppResult<ReactionSummary> {
        self.reactions.summary(parent_id, user_id).await
    }

    /// Toggle the actor's reaction and return the resulting state.
    pub async fn toggle_reaction(
        &self,
        parent_id: &str,
        actor: Option<&Actor>,
        reaction_type: ReactionType,
    ) -> AppResult<Option<ReactionType>> {
        let actor = require_actor(actor)?;
        self.reactions
            .toggle(parent_id, &actor.user_id, reaction_type)
            .await
    }
}
