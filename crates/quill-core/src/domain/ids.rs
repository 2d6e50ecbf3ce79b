//! Ordinal identifiers assigned by storage.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! ordinal_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

ordinal_id!(
    /// Identifier of a post (originals and versions share one sequence).
    PostId
);
ordinal_id!(
    /// Identifier of a comment.
    CommentId
);
ordinal_id!(
    /// Identifier of a category.
    CategoryId
);
ordinal_id!(
    /// Identifier of a tag.
    TagId
);
