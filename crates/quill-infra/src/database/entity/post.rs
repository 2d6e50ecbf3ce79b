//! Post entity for SeaORM.

use std::collections::BTreeSet;

use sea_orm::entity::prelude::*;
use sea_orm::{NotSet, Set};

use quill_core::domain::{CategoryId, NewPost, PostId, PostMeta, TagId};

use super::sea_orm_active_enums::PostStatusColumn;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub excerpt: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub featured_image: Option<String>,
    pub status: PostStatusColumn,
    pub meta_data: Option<Json>,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub scheduled_at: Option<DateTimeWithTimeZone>,
    pub author_id: Uuid,
    pub category_id: Option<i64>,
    pub version: i32,
    pub parent_id: Option<i64>,
    pub views_count: i64,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
    #[sea_orm(has_many = "super::post_tag::Entity")]
    PostTags,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::post_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::post_tag::Relation::Post.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Conversion from SeaORM Model to Domain Post; tags live in `post_tags`.
    pub fn into_domain(self, tag_ids: BTreeSet<TagId>) -> quill_core::domain::Post {
        quill_core::domain::Post {
            id: PostId(self.id),
            title: self.title,
            slug: self.slug,
            excerpt: self.excerpt,
            content: self.content,
            featured_image: self.featured_image,
            status: self.status.into(),
            meta: self
                .meta_data
                .and_then(|value| serde_json::from_value::<PostMeta>(value).ok()),
            published_at: self.published_at.map(Into::into),
            scheduled_at: self.scheduled_at.map(Into::into),
            author_id: self.author_id,
            category_id: self.category_id.map(CategoryId),
            tag_ids,
            version: self.version,
            parent_id: self.parent_id.map(PostId),
            views_count: self.views_count,
            created_at: self.created_at.into(),
            updated_at: self.updated_at.into(),
        }
    }
}

fn meta_json(meta: Option<PostMeta>) -> Option<Json> {
    meta.and_then(|m| serde_json::to_value(m).ok())
}

/// Conversion from a validated new post to an insertable ActiveModel.
impl From<NewPost> for ActiveModel {
    fn from(post: NewPost) -> Self {
        Self {
            id: NotSet,
            title: Set(post.title),
            slug: Set(post.slug),
            excerpt: Set(post.excerpt),
            content: Set(post.content),
            featured_image: Set(post.featured_image),
            status: Set(post.status.into()),
            meta_data: Set(meta_json(post.meta)),
            published_at: Set(post.published_at.map(Into::into)),
            scheduled_at: Set(post.scheduled_at.map(Into::into)),
            author_id: Set(post.author_id),
            category_id: Set(post.category_id.map(i64::from)),
            version: Set(post.version),
            parent_id: Set(post.parent_id.map(i64::from)),
            views_count: Set(0),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.created_at.into()),
        }
    }
}

/// Conversion from Domain Post to an ActiveModel for updates.
///
/// `author_id`, `version`, `parent_id`, `views_count` and `created_at` are left
/// untouched in the database.
impl From<quill_core::domain::Post> for ActiveModel {
    fn from(post: quill_core::domain::Post) -> Self {
        Self {
            id: Set(post.id.0),
            title: Set(post.title),
            slug: Set(post.slug),
            excerpt: Set(post.excerpt),
            content: Set(post.content),
            featured_image: Set(post.featured_image),
            status: Set(post.status.into()),
            meta_data: Set(meta_json(post.meta)),
            published_at: Set(post.published_at.map(Into::into)),
            scheduled_at: Set(post.scheduled_at.map(Into::into)),
            author_id: NotSet,
            category_id: Set(post.category_id.map(i64::from)),
            version: NotSet,
            parent_id: NotSet,
            views_count: NotSet,
            created_at: NotSet,
            updated_at: Set(post.updated_at.into()),
        }
    }
}
