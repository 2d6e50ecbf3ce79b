//! # Quill Shared
//!
//! Wire types shared between the API server and its clients.
//! Nothing here depends on the domain crate, so it can be compiled for WASM.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse, FieldErrorBody, PageMeta, Paginated};
