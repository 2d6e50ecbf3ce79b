//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod capability;
mod clock;
mod repository;

pub use auth::{AuthError, PasswordService, TokenClaims, TokenService};
pub use capability::{Action, CapabilityChecker, RoleCapabilities};
pub use clock::{Clock, ManualClock, SystemClock};
pub use repository::{
    BaseRepository, CategoryRepository, CommentQuery, CommentRepository, PostOrder, PostQuery,
    PostRepository, RelatedTo, TagRepository, UserRepository,
};
