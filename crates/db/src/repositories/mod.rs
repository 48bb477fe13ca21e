//! `PostgreSQL` repositories.
//!
//! Each repository implements [`DocumentStore`](crate::store::DocumentStore)
//! for one entity so it can be swapped for the in-memory store.

mod comment;
mod reaction;

pub use comment::CommentRepository;
pub use reaction::ReactionRepository;

use colloquy_common::AppError;
use sea_orm::DbErr;

/// Map a sea-orm error onto the application error kinds.
///
/// Connection-class failures are transient and surface as
/// [`AppError::StoreUnavailable`] so callers may retry them.
pub(crate) fn map_db_err(err: DbErr) -> AppError {
    match err {
        DbErr::ConnectionAcquire(_) | DbErr::Conn(_) => AppError::StoreUnavailable(err.to_string()),
        _ => AppError::Internal(err.to_string()),
    }
}
