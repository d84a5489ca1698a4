// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod book;
pub mod completion;

pub use book::{BookList, BookRecord};
pub use completion::{ExtractedFragment, RawCompletion};
