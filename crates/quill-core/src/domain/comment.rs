use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UnknownVariant;
use super::ids::{CommentId, PostId};

/// Moderation status of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl CommentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommentStatus::Pending => "pending",
            CommentStatus::Approved => "approved",
            CommentStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for CommentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CommentStatus::Pending),
            "approved" => Ok(CommentStatus::Approved),
            "rejected" => Ok(CommentStatus::Rejected),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Who wrote a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CommentAuthor {
    /// A registered user.
    User { user_id: Uuid },
    /// An anonymous visitor who left a name and email.
    Guest { name: String, email: String },
}

/// Comment entity - a reader's response to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub author: CommentAuthor,
    pub content: String,
    pub status: CommentStatus,
    pub parent_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn from_new(id: CommentId, new: NewComment) -> Self {
        Self {
            id,
            post_id: new.post_id,
            author: new.author,
            content: new.content,
            status: new.status,
            parent_id: new.parent_id,
            created_at: new.created_at,
            updated_at: new.created_at,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.status == CommentStatus::Approved
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// A validated comment awaiting an identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct NewComment {
    pub post_id: PostId,
    pub author: CommentAuthor,
    pub content: String,
    pub status: CommentStatus,
    pub parent_id: Option<CommentId>,
    pub created_at: DateTime<Utc>,
}

/// Fields a reader submits with a comment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentDraft {
    pub content: String,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub parent_id: Option<CommentId>,
}

/// A top-level comment with its direct replies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}
