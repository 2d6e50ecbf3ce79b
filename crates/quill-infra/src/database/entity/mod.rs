//! SeaORM entities mirroring the blog schema.

pub mod category;
pub mod comment;
pub mod post;
pub mod post_tag;
pub mod sea_orm_active_enums;
pub mod tag;
pub mod user;
