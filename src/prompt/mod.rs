// file: src/prompt/mod.rs
// description: prompt construction module exports
// reference: internal module structure

pub mod builder;

pub use builder::{Prompt, PromptBuilder};
