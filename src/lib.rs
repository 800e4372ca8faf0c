//! Lexis: vocabulary lookup cache and spaced review for readers.
//!
//! A reader clicks a word; [`VocabularyService::lookup_word`] answers from the
//! per-user store or asks the definition generator and caches the result in
//! the background. Saved words are then reviewed on a fixed-interval chain
//! and summarized for a dashboard.

pub mod config;
pub mod error;
pub mod language;
pub mod review;
pub mod service;
pub mod stats;
pub mod vocabulary;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{Result, ServiceError};
pub use language::Language;
pub use service::{ServiceOptions, VocabularyService};
