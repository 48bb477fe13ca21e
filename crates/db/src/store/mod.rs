//! Document store adapter.
//!
//! The interaction services never talk to a database directly. They see a
//! narrow keyed store per collection: point reads, predicate queries, and
//! point writes. Backends:
//!
//! - [`MemoryStore`]: process-local map, used for tests and single-node setups
//! - [`CommentRepository`](crate::repositories::CommentRepository) and
//!   [`ReactionRepository`](crate::repositories::ReactionRepository): `PostgreSQL`
//!   via sea-orm
//!
//! [`RetryingStore`] wraps any backend with a per-call timeout and bounded
//! retries for transient failures.

mod memory;
mod retry;

pub use memory::MemoryStore;
pub use retry::{RetryConfig, RetryingStore};

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use colloquy_common::AppResult;

use crate::entities::{comment, reaction};

/// A record that lives in a named collection and can be matched by a filter.
pub trait Document: Clone + Debug + Send + Sync + 'static {
    /// Predicate type accepted by [`DocumentStore::query`].
    type Filter: Debug + Send + Sync;

    /// Collection name, used for logging.
    const COLLECTION: &'static str;

    /// Unique identifier of the record.
    fn id(&self) -> &str;

    /// Whether the record satisfies the filter.
    fn matches(&self, filter: &Self::Filter) -> bool;
}

/// Keyed access to one collection of documents.
///
/// Every operation is a single round-trip and is idempotent by id, so a
/// caller may retry any of them after a transient failure.
#[async_trait]
pub trait DocumentStore<D: Document>: Send + Sync {
    /// Fetch a record by id.
    async fn get(&self, id: &str) -> AppResult<Option<D>>;

    /// Fetch every record matching the filter.
    async fn query(&self, filter: &D::Filter) -> AppResult<Vec<D>>;

    /// Insert or replace a record by id.
    async fn put(&self, doc: D) -> AppResult<()>;

    /// Remove a record by id. Returns whether a record was removed.
    async fn delete(&self, id: &str) -> AppResult<bool>;
}

/// Shared handle to the comment collection.
pub type CommentStore = Arc<dyn DocumentStore<comment::Model>>;

/// Shared handle to the reaction collection.
pub type ReactionStore = Arc<dyn DocumentStore<reaction::Model>>;

/// Selects the comments of one content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentFilter {
    pub parent_id: String,
}

impl CommentFilter {
    /// All comments attached to `parent_id`.
    #[must_use]
    pub fn for_parent(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
        }
    }
}

/// Selects reactions on one content item, optionally for a single user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionFilter {
    pub parent_id: String,
    pub user_id: Option<String>,
}

impl ReactionFilter {
    /// All reactions on `parent_id`.
    #[must_use]
    pub fn for_parent(parent_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            user_id: None,
        }
    }

    /// The reaction of `user_id` on `parent_id`.
    #[must_use]
    pub fn for_user(parent_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            parent_id: parent_id.into(),
            user_id: Some(user_id.into()),
        }
    }
}

impl Document for comment::Model {
    type Filter = CommentFilter;

    const COLLECTION: &'static str = "comment";

    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, filter: &CommentFilter) -> bool {
        self.parent_id == filter.parent_id
    }
}

impl Document for reaction::Model {
    type Filter = ReactionFilter;

    const COLLECTION: &'static str = "reaction";

    fn id(&self) -> &str {
        &self.id
    }

    fn matches(&self, filter: &ReactionFilter) -> bool {
        self.parent_id == filter.parent_id
            && filter
                .user_id
                .as_deref()
                .is_none_or(|user_id| self.user_id == user_id)
    }
}
