//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment};
use crate::repositories::map_db_err;
use crate::store::{CommentFilter, DocumentStore};
use async_trait::async_trait;
use colloquy_common::AppResult;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    sea_query::OnConflict,
};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore<comment::Model> for CommentRepository {
    async fn get(&self, id: &str) -> AppResult<Option<comment::Model>> {
        Comment::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    async fn query(&self, filter: &CommentFilter) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::ParentId.eq(filter.parent_id.as_str()))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    async fn put(&self, doc: comment::Model) -> AppResult<()> {
        let model = comment::ActiveModel {
            id: Set(doc.id),
            parent_id: Set(doc.parent_id),
            reply_to_id: Set(doc.reply_to_id),
            author_id: Set(doc.author_id),
            author_name: Set(doc.author_name),
            author_role: Set(doc.author_role),
            content: Set(doc.content),
            created_at: Set(doc.created_at),
        };

        // reply_to_id and parent_id are immutable once written
        Comment::insert(model)
            .on_conflict(
                OnConflict::column(comment::Column::Id)
                    .update_columns([comment::Column::Content])
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> AppResult<bool> {
        let result = Comment::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected > 0)
    }
}
