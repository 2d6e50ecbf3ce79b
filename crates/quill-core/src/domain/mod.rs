//! Domain entities - the core business objects.

mod comment;
mod ids;
mod page;
mod post;
mod slug;
mod taxonomy;
mod user;

pub use comment::{Comment, CommentAuthor, CommentDraft, CommentStatus, CommentThread, NewComment};
pub use ids::{CategoryId, CommentId, PostId, TagId};
pub use page::{Page, PageRequest};
pub use post::{
    NewPost, Post, PostDraft, PostMeta, PostStatus, WORDS_PER_MINUTE, reading_time, word_count,
};
pub use slug::slugify;
pub use taxonomy::{Category, Counted, LabelDraft, NewLabel, Tag};
pub use user::{Actor, Role, User};

/// A string did not name any variant of a domain enum.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant: {0}")]
pub struct UnknownVariant(pub String);
