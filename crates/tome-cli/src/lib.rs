//! # tome-cli
//!
//! Command-line interface for Tome.
//!
//! ## Commands
//!
//! - `tome list` — List discovered skill bundles
//! - `tome show <name>` — Show a bundle's summary and detail topics
//! - `tome match <task>` — Rank bundles for a task description
//! - `tome load <task>` — Run a selection and print the loaded context
//! - `tome validate` — Check bundles for orphan detail documents and broken links
//! - `tome create <name>` — Scaffold a new bundle
//! - `tome config` — Show the effective configuration
//! - `tome init` — Write a starter `tome.toml`

pub mod commands;

pub use commands::Cli;
