//! # tome-skills
//!
//! Skills are Markdown guidance bundles for an AI coding assistant. This crate
//! decides which bundles a request needs and discloses them into a session's
//! context incrementally: the summary first, detail documents only on demand,
//! each at most once.
//!
//! ## Bundle layout
//!
//! ```text
//! build/
//! ├── SKILL.md                 # frontmatter + summary
//! └── references/
//!     └── nix-expressions.md   # detail document, topic "nix-expressions"
//! ```
//!
//! ```markdown
//! ---
//! name: build
//! description: packaging and build steps
//! tags: [nix, containers]
//! ---
//!
//! # Building packages
//!
//! For recipe syntax see [writing Nix expressions](references/nix-expressions.md).
//! ```
//!
//! Every file under `references/` must be linked from the summary; the
//! registry refuses to build otherwise.
//!
//! ## Flow
//!
//! 1. [`RegistryBuilder`] discovers bundles and validates them into an
//!    immutable [`SkillRegistry`]
//! 2. Each session gets a [`LoadedContext`]; a [`Selector`] shares the registry
//! 3. [`Selector::match_bundles`] ranks bundles for the task text
//! 4. [`Selector::activate`] loads a summary, [`Selector::load_detail`] a topic
//! 5. [`LoadedContext::render`] produces the block to inject into the prompt

pub mod context;
pub mod definition;
pub mod registry;
pub mod scoring;
pub mod selector;

pub use context::{LoadedContext, MaterialEntry};
pub use definition::{CrossReference, DetailDocument, SkillBundle};
pub use registry::{RegistryBuilder, SkillRegistry};
pub use scoring::{EmbeddingScorer, Embedder, HashingEmbedder, LexicalScorer, Scorer};
pub use selector::{Activation, BundleMatch, DetailLoad, DetailMatch, SelectionReport, Selector};
