//! Categories and tags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{CategoryId, TagId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub slug: String,
    pub color: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated label fields shared by categories and tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabel {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn from_new(id: CategoryId, new: NewLabel) -> Self {
        Self {
            id,
            name: new.name,
            slug: new.slug,
            description: new.description,
            color: new.color,
            created_at: new.created_at,
            updated_at: new.created_at,
        }
    }
}

impl Tag {
    pub fn from_new(id: TagId, new: NewLabel) -> Self {
        Self {
            id,
            name: new.name,
            slug: new.slug,
            color: new.color,
            created_at: new.created_at,
            updated_at: new.created_at,
        }
    }
}

/// Caller-supplied fields for a category or tag. Tags ignore `description`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDraft {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

/// An item paired with the number of publicly visible posts it classifies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Counted<T> {
    #[serde(flatten)]
    pub item: T,
    pub posts_count: u64,
}
