//! Shared fixtures for unit tests: a temp SQLite store, a counting generator
//! and a store whose every call fails.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use tempfile::TempDir;

use crate::vocabulary::generator::{self, DefinitionGenerator, GeneratorError};
use crate::vocabulary::storage::{self, ReviewUpdate, StorageError, VocabularyStore};
use crate::vocabulary::{Definition, ReviewStatus, SqliteVocabularyStore, VocabularyEntry, WordSource};

pub fn temp_store() -> (Arc<SqliteVocabularyStore>, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteVocabularyStore::open(temp_dir.path().join("vocabulary.db")).unwrap();
    (Arc::new(store), temp_dir)
}

/// Stored entry for `user_id` with the given word and context
pub fn stored_entry(store: &dyn VocabularyStore, user_id: i64, word: &str, context: &str) -> VocabularyEntry {
    let entry = VocabularyEntry::new(
        user_id,
        word.to_string(),
        context.to_string(),
        format!("stored meaning of {}", word),
        format!("stored example with {}", word),
    );
    store.insert(&entry).unwrap()
}

#[derive(Clone, Copy)]
pub enum Behavior {
    Succeed,
    Fail,
    Hang,
}

/// Generator that records how often it was called
pub struct CountingGenerator {
    calls: AtomicUsize,
    behavior: Behavior,
}

impl CountingGenerator {
    pub fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            behavior,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DefinitionGenerator for CountingGenerator {
    async fn generate(&self, word: &str, context: &str) -> generator::Result<Definition> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            Behavior::Succeed => Ok(Definition {
                meaning: format!("generated meaning of {} ({})", word, context),
                example: format!("An example using {}.", word),
                phonetic: None,
                difficulty: Some("B2".to_string()),
            }),
            Behavior::Fail => Err(GeneratorError::Empty(word.to_string())),
            Behavior::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(GeneratorError::Empty(word.to_string()))
            }
        }
    }
}

/// Store that fails every operation, for exercising degraded paths
pub struct FailingStore;

fn broken<T>() -> storage::Result<T> {
    Err(StorageError::LockPoisoned)
}

impl VocabularyStore for FailingStore {
    fn find_best_match(&self, _: i64, _: &str, _: &str) -> storage::Result<Option<VocabularyEntry>> {
        broken()
    }

    fn find_by_user_word_context(&self, _: i64, _: &str, _: &str) -> storage::Result<Option<VocabularyEntry>> {
        broken()
    }

    fn find_by_id(&self, _: i64) -> storage::Result<Option<VocabularyEntry>> {
        broken()
    }

    fn insert(&self, _: &VocabularyEntry) -> storage::Result<VocabularyEntry> {
        broken()
    }

    fn insert_if_absent(&self, _: &VocabularyEntry) -> storage::Result<Option<VocabularyEntry>> {
        broken()
    }

    fn update_review(&self, _: &ReviewUpdate) -> storage::Result<bool> {
        broken()
    }

    fn retire(&self, _: i64, _: NaiveDate) -> storage::Result<bool> {
        broken()
    }

    fn count_by_user(&self, _: i64) -> storage::Result<u64> {
        broken()
    }

    fn count_by_status(&self, _: i64) -> storage::Result<HashMap<ReviewStatus, u64>> {
        broken()
    }

    fn count_by_source(&self, _: i64) -> storage::Result<HashMap<WordSource, u64>> {
        broken()
    }

    fn count_added_since(&self, _: i64, _: NaiveDate) -> storage::Result<u64> {
        broken()
    }

    fn count_reviewed(&self, _: i64) -> storage::Result<u64> {
        broken()
    }

    fn count_successful(&self, _: i64) -> storage::Result<u64> {
        broken()
    }

    fn count_due(&self, _: i64, _: NaiveDate) -> storage::Result<u64> {
        broken()
    }

    fn list_due_for_user(&self, _: i64, _: NaiveDate) -> storage::Result<Vec<VocabularyEntry>> {
        broken()
    }

    fn daily_added_counts(&self, _: i64, _: NaiveDate, _: NaiveDate) -> storage::Result<Vec<(NaiveDate, u64)>> {
        broken()
    }

    fn delete_duplicates(&self, _: Option<i64>) -> storage::Result<usize> {
        broken()
    }
}
