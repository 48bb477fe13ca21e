//! Business logic services.

pub mod comment;
pub mod interaction;
pub mod key_lock;
pub mod reaction;
pub mod thread;

pub use comment::{CommentService, NewComment};
pub use interaction::InteractionService;
pub use key_lock::{KeyGuard, KeyedLock};
pub use reaction::{ReactionService, ReactionSummary, apply_toggle};
pub use thread::{DisplayRow, ThreadNode};
