//! # tome-config
//!
//! Configuration system for Tome. Reads from `tome.toml` and environment
//! variables; CLI flags override both at the call site.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::TomeConfig;
pub use schema::{ConfigWarning, LoggingConfig, ScoringStrategy, SelectorConfig, SkillsConfig, WarningSeverity};
