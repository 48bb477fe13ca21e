//! Database entities.

#![allow(missing_docs)]

pub mod comment;
pub mod reaction;

pub use comment::Entity as Comment;
pub use reaction::Entity as Reaction;
