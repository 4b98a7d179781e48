//! # tome-core
//!
//! Core types and the shared error type for Tome, the skill registry and
//! context selector. Every other crate in the workspace speaks this vocabulary.

pub mod error;
pub mod types;

pub use error::{Result, TomeError};
pub use types::*;
