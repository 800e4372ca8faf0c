//! Per-user vocabulary for Lexis
//!
//! This module provides:
//! - The vocabulary entry model (one row per user, word and context)
//! - The row store trait and its SQLite implementation
//! - The definition generator trait and its HTTP client
//! - The cache-aside lookup that ties them together

pub mod generator;
pub mod lookup;
pub mod models;
pub mod storage;

pub use generator::{DefinitionGenerator, GeneratorError, HttpDefinitionGenerator};
pub use lookup::{LookupCache, NewWord};
pub use models::*;
pub use storage::{ReviewUpdate, SqliteVocabularyStore, StorageError, VocabularyStore};
