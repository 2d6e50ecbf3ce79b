//! Comment entity for SeaORM.

use sea_orm::entity::prelude::*;
use sea_orm::{NotSet, Set};

use quill_core::domain::{CommentAuthor, CommentId, NewComment, PostId};

use super::sea_orm_active_enums::CommentStatusColumn;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub post_id: i64,
    pub user_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub status: CommentStatusColumn,
    pub parent_id: Option<i64>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_delete = "Cascade"
    )]
    Post,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn author_columns(author: CommentAuthor) -> (Option<Uuid>, Option<String>, Option<String>) {
    match author {
        CommentAuthor::User { user_id } => (Some(user_id), None, None),
        CommentAuthor::Guest { name, email } => (None, Some(name), Some(email)),
    }
}

/// Conversion from SeaORM Model to Domain Comment.
impl From<Model> for quill_core::domain::Comment {
    fn from(model: Model) -> Self {
        let author = match model.user_id {
            Some(user_id) => CommentAuthor::User { user_id },
            None => CommentAuthor::Guest {
                name: model.author_name.unwrap_or_default(),
                email: model.author_email.unwrap_or_default(),
            },
        };
        Self {
            id: CommentId(model.id),
            post_id: PostId(model.post_id),
            author,
            content: model.content,
            status: model.status.into(),
            parent_id: model.parent_id.map(CommentId),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<NewComment> for ActiveModel {
    fn from(comment: NewComment) -> Self {
        let (user_id, author_name, author_email) = author_columns(comment.author);
        Self {
            id: NotSet,
            post_id: Set(comment.post_id.0),
            user_id: Set(user_id),
            author_name: Set(author_name),
            author_email: Set(author_email),
            content: Set(comment.content),
            status: Set(comment.status.into()),
            parent_id: Set(comment.parent_id.map(i64::from)),
            created_at: Set(comment.created_at.into()),
            updated_at: Set(comment.created_at.into()),
        }
    }
}

/// Conversion from Domain Comment to SeaORM ActiveModel.
impl From<quill_core::domain::Comment> for ActiveModel {
    fn from(comment: quill_core::domain::Comment) -> Self {
        let (user_id, author_name, author_email) = author_columns(comment.author);
        Self {
            id: Set(comment.id.0),
            post_id: Set(comment.post_id.0),
            user_id: Set(user_id),
            author_name: Set(author_name),
            author_email: Set(author_email),
            content: Set(comment.content),
            status: Set(comment.status.into()),
            parent_id: Set(comment.parent_id.map(i64::from)),
            created_at: Set(comment.created_at.into()),
            updated_at: Set(comment.updated_at.into()),
        }
    }
}
