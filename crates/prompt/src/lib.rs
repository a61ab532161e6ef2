//! Prompt system for the science tutor.
//!
//! This crate provides structured prompt management with:
//! - YAML-based prompt definitions (bundled default, workspace overrides)
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use loader::{default_prompt, load_prompt, DEFAULT_PROMPT_ID};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
