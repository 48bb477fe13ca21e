//! Reaction service.

use chrono::Utc;
use colloquy_common::{AppError, AppResult, IdGenerator};
use colloquy_db::entities::reaction::{self, ReactionType};
use colloquy_db::store::{ReactionFilter, ReactionStore};
use serde::Serialize;

use super::key_lock::KeyedLock;

/// Per-user reaction transition.
///
/// Re-applying the held type clears it; anything else switches to the
/// requested type.
#[must_use]
pub fn apply_toggle(
    current: Option<ReactionType>,
    requested: ReactionType,
) -> Option<ReactionType> {
    match current {
        Some(held) if held == requested => None,
        _ => Some(requested),
    }
}

/// Like/dislike tallies for one content item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub like_count: u64,
    pub dislike_count: u64,
    pub current_user_reaction: Option<ReactionType>,
}

/// Reaction service for business logic.
///
/// Keeps at most one reaction per (content item, user). Toggles for the
/// same pair are serialized in-process; the `PostgreSQL` backend also
/// enforces the pair as a unique key.
#[derive(Clone)]
pub struct ReactionService {
    reaction_store: ReactionStore,
    locks: KeyedLock<(String, String)>,
    id_gen: IdGenerator,
}

impl ReactionService {
    /// Create a new reaction service.
    #[must_use]
    pub fn new(reaction_store: ReactionStore) -> Self {
        Self {
            reaction_store,
            locks: KeyedLock::new(),
            id_gen: IdGenerator::new(),
        }
    }

    /// Count reactions on `parent_id` and look up the requester's own.
    pub async fn summary(
        &self,
        parent_id: &str,
        user_id: Option<&str>,
    ) -> AppResult<ReactionSummary> {
        let reactions = self
            .reaction_store
            .query(&ReactionFilter::for_parent(parent_id))
            .await?;

        let mut summary = ReactionSummary::default();
        for r in &reactions {
            match r.reaction_type {
                ReactionType::Like => summary.like_count += 1,
                ReactionType::Dislike => summary.dislike_count += 1,
            }
        }

        if let Some(user_id) = user_id.filter(|id| !id.trim().is_empty()) {
            summary.current_user_reaction = oldest(
                reactions
                    .into_iter()
                    .filter(|r| r.user_id == user_id)
                    .collect(),
            )
            .map(|r| r.reaction_type);
        }

        Ok(summary)
    }

    /// Apply one toggle for `user_id` and return the resulting reaction.
    ///
    /// Performs exactly one store write.
    pub async fn toggle(
        &self,
        parent_id: &str,
        user_id: &str,
        requested: ReactionType,
    ) -> AppResult<Option<ReactionType>> {
        if user_id.trim().is_empty() {
            return Err(AppError::Unauthorized);
        }
        if parent_id.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "parent_id must not be empty".to_string(),
            ));
        }

        let _guard = self
            .locks
            .lock((parent_id.to_string(), user_id.to_string()))
            .await;

        let existing = self
            .reaction_store
            .query(&ReactionFilter::for_user(parent_id, user_id))
            .await?;
        if existing.len() > 1 {
            tracing::warn!(
                parent_id,
                user_id,
                count = existing.len(),
                "Multiple reactions stored for one user, using the oldest"
            );
        }
        let current = oldest(existing);

        let next = apply_toggle(current.as_ref().map(|r| r.reaction_type), requested);
        match (current, next) {
            (Some(record), None) => {
                self.reaction_store.delete(&record.id).await?;
            }
            (Some(record), Some(reaction_type)) => {
                self.reaction_store
                    .put(reaction::Model {
                        reaction_type,
                        updated_at: Some(Utc::now().into()),
                        ..record
                    })
                    .await?;
            }
            (None, Some(reaction_type)) => {
                self.reaction_store
                    .put(reaction::Model {
                        id: self.id_gen.generate(),
                        parent_id: parent_id.to_string(),
                        user_id: user_id.to_string(),
                        reaction_type,
                        created_at: Utc::now().into(),
                        updated_at: None,
                    })
                    .await?;
            }
            (None, None) => {}
        }

        tracing::debug!(parent_id, user_id, requested = %requested, result = ?next, "Reaction toggled");
        Ok(next)
    }
}

/// The earliest record by (`created_at`, `id`).
fn oldest(reactions: Vec<reaction::Model>) -> Option<reaction::Model> {
    reactions
        .into_iter()
        .min_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)))
}
