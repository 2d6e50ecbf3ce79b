//! Enum columns stored as text.

use sea_orm::entity::prelude::*;

use quill_core::domain::{CommentStatus, PostStatus, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PostStatusColumn {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[sea_orm(string_value = "published")]
    Published,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
}

impl From<PostStatus> for PostStatusColumn {
    fn from(status: PostStatus) -> Self {
        match status {
            PostStatus::Draft => Self::Draft,
            PostStatus::Published => Self::Published,
            PostStatus::Scheduled => Self::Scheduled,
        }
    }
}

impl From<PostStatusColumn> for PostStatus {
    fn from(status: PostStatusColumn) -> Self {
        match status {
            PostStatusColumn::Draft => Self::Draft,
            PostStatusColumn::Published => Self::Published,
            PostStatusColumn::Scheduled => Self::Scheduled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum CommentStatusColumn {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

impl From<CommentStatus> for CommentStatusColumn {
    fn from(status: CommentStatus) -> Self {
        match status {
            CommentStatus::Pending => Self::Pending,
            CommentStatus::Approved => Self::Approved,
            CommentStatus::Rejected => Self::Rejected,
        }
    }
}

impl From<CommentStatusColumn> for CommentStatus {
    fn from(status: CommentStatusColumn) -> Self {
        match status {
            CommentStatusColumn::Pending => Self::Pending,
            CommentStatusColumn::Approved => Self::Approved,
            CommentStatusColumn::Rejected => Self::Rejected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum RoleColumn {
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "editor")]
    Editor,
    #[sea_orm(string_value = "author")]
    Author,
}

impl From<Role> for RoleColumn {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::Editor => Self::Editor,
            Role::Author => Self::Author,
        }
    }
}

impl From<RoleColumn> for Role {
    fn from(role: RoleColumn) -> Self {
        match role {
            RoleColumn::Admin => Self::Admin,
            RoleColumn::Editor => Self::Editor,
            RoleColumn::Author => Self::Author,
        }
    }
}
