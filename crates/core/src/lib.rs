//! Core interaction logic for colloquy.
//!
//! Comments and reactions attached to external content items:
//!
//! - [`thread::build`](services::thread::build) turns a flat comment set into a reply tree
//! - [`CommentService`] validates posting and enforces deletion rights
//! - [`ReactionService`] keeps one like/dislike per user per content item
//! - [`InteractionService`] is the single entry point composing the above

pub mod identity;
pub mod services;

pub use identity::{Actor, PrivilegedRoles, require_actor};
pub use services::*;
