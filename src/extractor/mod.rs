// file: src/extractor/mod.rs
// description: book list extraction module exports
// reference: internal module structure

pub mod books;
pub mod cleaner;
pub mod fences;
pub mod fragment;
pub mod parser;
pub mod patterns;

pub use books::BookExtractor;
pub use cleaner::{CleanedFragment, Cleaner, PatternRepair, Repair};
pub use fences::FenceStripper;
pub use fragment::FragmentLocator;
pub use parser::{BookParser, ParseOutcome};
