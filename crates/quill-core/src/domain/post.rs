use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UnknownVariant;
use super::ids::{CategoryId, PostId, TagId};

/// Average reading speed used for [`Post::reading_time`].
pub const WORDS_PER_MINUTE: usize = 200;

/// Publication status of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Draft,
    Published,
    Scheduled,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Draft => "draft",
            PostStatus::Published => "published",
            PostStatus::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(PostStatus::Draft),
            "published" => Ok(PostStatus::Published),
            "scheduled" => Ok(PostStatus::Scheduled),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// SEO metadata attached to a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical_url: Option<String>,
}

/// Post entity - a blog article, or a version of one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub meta: Option<PostMeta>,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub category_id: Option<CategoryId>,
    pub tag_ids: BTreeSet<TagId>,
    pub version: i32,
    pub parent_id: Option<PostId>,
    pub views_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Materialize a stored post from its unsaved form.
    pub fn from_new(id: PostId, new: NewPost) -> Self {
        Self {
            id,
            title: new.title,
            slug: new.slug,
            excerpt: new.excerpt,
            content: new.content,
            featured_image: new.featured_image,
            status: new.status,
            meta: new.meta,
            published_at: new.published_at,
            scheduled_at: new.scheduled_at,
            author_id: new.author_id,
            category_id: new.category_id,
            tag_ids: new.tag_ids,
            version: new.version,
            parent_id: new.parent_id,
            views_count: 0,
            created_at: new.created_at,
            updated_at: new.created_at,
        }
    }

    /// Whether anonymous readers may see this post at `now`.
    ///
    /// Scheduled posts stay hidden until someone flips them to published.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Published && self.published_at.is_some_and(|at| at <= now)
    }

    pub fn is_version(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }

    /// Estimated reading time in whole minutes, never below one.
    pub fn reading_time(&self) -> u32 {
        reading_time(&self.content)
    }
}

/// A post that has passed validation but has no storage identity yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: String,
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub meta: Option<PostMeta>,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub category_id: Option<CategoryId>,
    pub tag_ids: BTreeSet<TagId>,
    pub version: i32,
    pub parent_id: Option<PostId>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for creating or updating a post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostDraft {
    pub title: String,
    /// Normalized to a URL-safe slug; derived from the title on create when absent.
    pub slug: Option<String>,
    pub excerpt: Option<String>,
    pub content: String,
    pub featured_image: Option<String>,
    pub status: PostStatus,
    pub meta: Option<PostMeta>,
    pub published_at: Option<DateTime<Utc>>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub category_id: Option<CategoryId>,
    pub tag_ids: Vec<TagId>,
}

/// Minutes needed to read `text` at [`WORDS_PER_MINUTE`].
pub fn reading_time(text: &str) -> u32 {
    let minutes = word_count(&strip_tags(text)).div_ceil(WORDS_PER_MINUTE);
    minutes.max(1) as u32
}

/// Count words the way a reader would: runs of letters, allowing inner `'` and `-`.
pub fn word_count(text: &str) -> usize {
    text.split(|c: char| !(c.is_alphabetic() || c == '\'' || c == '-'))
        .filter(|token| token.chars().any(char::is_alphabetic))
        .count()
}

fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_reading_time_rounds_up_per_two_hundred_words() {
        assert_eq!(reading_time(&words(400)), 2);
        assert_eq!(reading_time(&words(401)), 3);
        assert_eq!(reading_time(&words(200)), 1);
    }

    #[test]
    fn test_reading_time_has_floor_of_one_minute() {
        assert_eq!(reading_time("hello"), 1);
        assert_eq!(reading_time(""), 1);
    }

    #[test]
    fn test_word_count_ignores_markup_and_numbers() {
        assert_eq!(word_count(&strip_tags("<p>Hello <b>brave</b> new</p> world 42")), 4);
        assert_eq!(word_count("don't over-think it"), 3);
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [PostStatus::Draft, PostStatus::Published, PostStatus::Scheduled] {
            assert_eq!(status.as_str().parse::<PostStatus>().unwrap(), status);
        }
        assert!("archived".parse::<PostStatus>().is_err());
    }
}
