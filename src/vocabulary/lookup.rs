//! Cache-aside word lookup.
//!
//! The store is checked first; on a miss the definition generator is asked,
//! the caller gets the generated entry right away and the row is written in
//! the background. A failed backfill only costs a second generator call on
//! the next lookup, so it is logged and never returned.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::join_all;
use tokio::task::JoinHandle;

use super::generator::{DefinitionGenerator, GeneratorError};
use super::models::{canonical_context, canonical_word, VocabularyEntry, WordSource};
use super::storage::VocabularyStore;
use crate::error::{require_optional_id, require_positive_id, Result, ServiceError};
use crate::language::Language;

/// Key of a backfill in progress
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BackfillKey {
    user_id: i64,
    word: String,
    context: String,
}

impl BackfillKey {
    fn of(entry: &VocabularyEntry) -> Self {
        Self {
            user_id: entry.user_id,
            word: entry.word.clone(),
            context: entry.context.clone(),
        }
    }
}

/// A word the learner adds by hand, with their own meaning
#[derive(Debug, Clone, Default)]
pub struct NewWord {
    pub word: String,
    pub context: Option<String>,
    pub meaning: String,
    pub example: Option<String>,
    pub article_id: Option<i64>,
}

pub struct LookupCache {
    store: Arc<dyn VocabularyStore>,
    generator: Arc<dyn DefinitionGenerator>,
    timeout: Duration,
    language: Language,
    in_flight: Arc<Mutex<HashSet<BackfillKey>>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl LookupCache {
    pub fn new(
        store: Arc<dyn VocabularyStore>,
        generator: Arc<dyn DefinitionGenerator>,
        timeout: Duration,
        language: Language,
    ) -> Self {
        Self {
            store,
            generator,
            timeout,
            language,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Resolve a word for a reader.
    ///
    /// Only invalid input is an error. A generator failure or timeout
    /// produces a degraded entry with placeholder text that is not cached.
    pub async fn lookup_word(
        &self,
        word: &str,
        context: Option<&str>,
        user_id: i64,
        article_id: Option<i64>,
    ) -> Result<VocabularyEntry> {
        require_positive_id("user id", user_id)?;
        require_optional_id("article id", article_id)?;
        let word = canonical_word(word)
            .ok_or_else(|| ServiceError::Validation(format!("'{}' contains no word", word)))?;
        let context = canonical_context(context);

        let cached = {
            let store = Arc::clone(&self.store);
            let (word, context) = (word.clone(), context.clone());
            tokio::task::spawn_blocking(move || store.find_best_match(user_id, &word, &context)).await
        };

        match cached {
            Ok(Ok(Some(entry))) => {
                log::debug!(
                    "Cache hit for '{}' (user {}, context {} -> {})",
                    word,
                    user_id,
                    context,
                    entry.context
                );
                return Ok(entry);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                log::warn!("Vocabulary read failed for '{}', treating as miss: {}", word, e);
            }
            Err(e) => {
                log::warn!("Vocabulary read task for '{}' did not finish, treating as miss: {}", word, e);
            }
        }

        log::info!("Cache miss for '{}' (user {}, context {}), generating", word, user_id, context);

        let generated = tokio::time::timeout(self.timeout, self.generator.generate(&word, &context))
            .await
            .unwrap_or_else(|_| Err(GeneratorError::Timeout(self.timeout)));
        let definition = match generated {
            Ok(definition) => Some(definition),
            Err(e) => {
                log::warn!("Definition generator failed for '{}': {}", word, e);
                None
            }
        };

        let mut entry = VocabularyEntry::new(
            user_id,
            word,
            context,
            self.language.no_definition().to_string(),
            self.language.no_example().to_string(),
        );
        entry.source = WordSource::Ai;
        entry.source_article_id = article_id;

        match definition {
            Some(definition) => {
                entry.meaning = definition.meaning;
                if !definition.example.is_empty() {
                    entry.example = definition.example;
                }
                entry.phonetic = definition.phonetic;
                entry.difficulty = definition.difficulty;
                self.spawn_backfill(entry.clone());
            }
            None => {
                log::debug!("Returning degraded entry for '{}' without caching", entry.word);
            }
        }

        Ok(entry)
    }

    /// Look up several words; a word that fails gets a placeholder entry
    /// instead of failing the batch. Output order follows input order.
    pub async fn lookup_words(
        &self,
        words: &[String],
        context: Option<&str>,
        user_id: i64,
        article_id: Option<i64>,
    ) -> Result<Vec<VocabularyEntry>> {
        require_positive_id("user id", user_id)?;
        require_optional_id("article id", article_id)?;

        let lookups = words.iter().map(|word| async move {
            match self.lookup_word(word, context, user_id, article_id).await {
                Ok(entry) => entry,
                Err(e) => {
                    log::error!("Lookup failed for '{}': {}", word, e);
                    self.failed_placeholder(word, context, user_id, article_id)
                }
            }
        });

        Ok(join_all(lookups).await)
    }

    /// Save a word the learner typed in themselves. If the key already
    /// exists the stored row is returned unchanged.
    pub fn add_word(&self, user_id: i64, new_word: NewWord) -> Result<VocabularyEntry> {
        require_positive_id("user id", user_id)?;
        require_optional_id("article id", new_word.article_id)?;
        let word = canonical_word(&new_word.word)
            .ok_or_else(|| ServiceError::Validation(format!("'{}' contains no word", new_word.word)))?;
        if new_word.meaning.trim().is_empty() {
            return Err(ServiceError::Validation("meaning must not be empty".to_string()));
        }
        let context = canonical_context(new_word.context.as_deref());

        let mut entry = VocabularyEntry::new(
            user_id,
            word,
            context,
            new_word.meaning.trim().to_string(),
            new_word.example.unwrap_or_default(),
        );
        entry.source = WordSource::Local;
        entry.source_article_id = new_word.article_id;

        if let Some(stored) = self.store.insert_if_absent(&entry)? {
            log::info!("Added word '{}' for user {} as #{}", stored.word, user_id, stored.id);
            return Ok(stored);
        }

        self.store
            .find_by_user_word_context(user_id, &entry.word, &entry.context)?
            .ok_or_else(|| {
                ServiceError::Validation(format!("'{}' vanished while being added", entry.word))
            })
    }

    /// Wait for every backfill started so far
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = match self.pending.lock() {
            Ok(mut pending) => pending.drain(..).collect(),
            Err(_) => Vec::new(),
        };

        for handle in handles {
            if let Err(e) = handle.await {
                log::error!("Backfill task failed to complete: {}", e);
            }
        }
    }

    /// Persist a generated entry off the calling path
    fn spawn_backfill(&self, entry: VocabularyEntry) {
        let key = BackfillKey::of(&entry);
        match self.in_flight.lock() {
            Ok(mut in_flight) => {
                if !in_flight.insert(key.clone()) {
                    log::debug!("Backfill for '{}' already in flight, skipping", entry.word);
                    return;
                }
            }
            Err(_) => {
                log::error!("Backfill registry poisoned, not caching '{}'", entry.word);
                return;
            }
        }

        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);

        let handle = tokio::task::spawn_blocking(move || {
            match store.insert_if_absent(&entry) {
                Ok(Some(stored)) => log::info!(
                    "Cached '{}' (user {}, context {}) as #{}",
                    stored.word,
                    stored.user_id,
                    stored.context,
                    stored.id
                ),
                Ok(None) => log::debug!(
                    "'{}' (user {}, context {}) already cached, skipping",
                    entry.word,
                    entry.user_id,
                    entry.context
                ),
                Err(e) => log::error!("Failed to cache '{}' for user {}: {}", entry.word, entry.user_id, e),
            }

            if let Ok(mut in_flight) = in_flight.lock() {
                in_flight.remove(&key);
            }
        });

        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|h| !h.is_finished());
            pending.push(handle);
        }
    }

    fn failed_placeholder(
        &self,
        raw_word: &str,
        context: Option<&str>,
        user_id: i64,
        article_id: Option<i64>,
    ) -> VocabularyEntry {
        let word = canonical_word(raw_word).unwrap_or_else(|| raw_word.trim().to_lowercase());
        let mut entry = VocabularyEntry::new(
            user_id,
            word,
            canonical_context(context),
            self.language.lookup_failed().to_string(),
            String::new(),
        );
        entry.source_article_id = article_id;
        entry
    }
}
