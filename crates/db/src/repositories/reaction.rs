//! Reaction repository.

use std::sync::Arc;

use crate::entities::{Reaction, reaction};
use crate::repositories::map_db_err;
use crate::store::{DocumentStore, ReactionFilter};
use async_trait::async_trait;
use colloquy_common::AppResult;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};

/// Reaction repository for database operations.
#[derive(Clone)]
pub struct ReactionRepository {
    db: Arc<DatabaseConnection>,
}

impl ReactionRepository {
    /// Create a new reaction repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore<reaction::Model> for ReactionRepository {
    async fn get(&self, id: &str) -> AppResult<Option<reaction::Model>> {
        Reaction::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    async fn query(&self, filter: &ReactionFilter) -> AppResult<Vec<reaction::Model>> {
        let mut query =
            Reaction::find().filter(reaction::Column::ParentId.eq(filter.parent_id.as_str()));

        if let Some(ref user_id) = filter.user_id {
            query = query.filter(reaction::Column::UserId.eq(user_id.as_str()));
        }

        query
            .order_by_asc(reaction::Column::CreatedAt)
            .order_by_asc(reaction::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    async fn put(&self, doc: reaction::Model) -> AppResult<()> {
        let model = reaction::ActiveModel {
            id: Set(doc.id),
            parent_id: Set(doc.parent_id),
            user_id: Set(doc.user_id),
            reaction_type: Set(doc.reaction_type),
            created_at: Set(doc.created_at),
            updated_at: Set(doc.updated_at),
        };

        // Conflicting on the (parent_id, user_id) pair keeps a single row per
        // user even when two writers race from different processes.
        Reaction::insert(model)
            .on_conflict(
                OnConflict::columns([reaction::Column::ParentId, reaction::Column::UserId])
                    .update_columns([reaction::Column::ReactionType, reaction::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Reaction::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }
}
