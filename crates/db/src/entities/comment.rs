//! Comment entity (discussion entries attached to a content item).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comment")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Content item (blog post, paper, event) the comment belongs to
    #[sea_orm(indexed)]
    pub parent_id: String,

    /// Comment this one replies to; `None` for a root comment.
    /// Not a foreign key: the target may be deleted later.
    #[sea_orm(nullable, indexed)]
    pub reply_to_id: Option<String>,

    /// Author snapshot taken at post time
    pub author_id: String,
    pub author_name: String,
    pub author_role: String,

    /// Trimmed, non-empty text
    #[sea_orm(column_type = "Text")]
    pub content: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this is a top-level comment.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.reply_to_id.is_none()
    }
}
