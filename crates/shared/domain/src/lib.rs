//! Domain layer - documents and store-wide rules.
//!
//! This crate contains pure domain types with no infrastructure dependencies.
//! Documents are schema-less; the data-access layer only reads their `id`.

pub mod constants;
pub mod document;
pub mod error;

pub use constants::*;
pub use document::Document;
pub use error::{DomainError, DomainResult};
