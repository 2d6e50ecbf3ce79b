//! # Quill Core
//!
//! The domain layer of the Quill blog platform: entities, ports and the
//! services that enforce post lifecycle rules.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
