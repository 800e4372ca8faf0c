//! The vocabulary service: one entry point over lookup, review and stats,
//! sharing a single store.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::error::{require_optional_id, Result};
use crate::language::Language;
use crate::review::{ReviewCard, ReviewScheduler};
use crate::stats::{GrowthCurve, StatsAggregator, VocabularyStats};
use crate::vocabulary::{
    DefinitionGenerator, HttpDefinitionGenerator, LookupCache, NewWord, ReviewOutcome,
    SqliteVocabularyStore, VocabularyEntry, VocabularyStore,
};

#[derive(Debug, Clone, Copy)]
pub struct ServiceOptions {
    /// Upper bound on one generator call during lookup
    pub generator_timeout: Duration,
    pub language: Language,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            generator_timeout: Duration::from_secs(10),
            language: Language::En,
        }
    }
}

pub struct VocabularyService {
    store: Arc<dyn VocabularyStore>,
    lookup: LookupCache,
    scheduler: ReviewScheduler,
    stats: StatsAggregator,
}

impl VocabularyService {
    pub fn new(
        store: Arc<dyn VocabularyStore>,
        generator: Arc<dyn DefinitionGenerator>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            lookup: LookupCache::new(
                Arc::clone(&store),
                generator,
                options.generator_timeout,
                options.language,
            ),
            scheduler: ReviewScheduler::new(Arc::clone(&store), options.language),
            stats: StatsAggregator::new(Arc::clone(&store)),
            store,
        }
    }

    /// Open the configured SQLite store and HTTP generator
    pub fn from_config(config: &Config) -> Result<Self> {
        let db_path = config.database_path()?;
        let store = SqliteVocabularyStore::open(db_path)?;
        let generator = HttpDefinitionGenerator::new(
            &config.generator.base_url,
            config.generator.timeout(),
        )?;

        log::info!(
            "Vocabulary service ready (store {}, generator {})",
            store.db_path().display(),
            config.generator.base_url
        );

        Ok(Self::new(
            Arc::new(store),
            Arc::new(generator),
            ServiceOptions {
                generator_timeout: config.generator.timeout(),
                language: config.language,
            },
        ))
    }

    pub async fn lookup_word(
        &self,
        word: &str,
        context: Option<&str>,
        user_id: i64,
        article_id: Option<i64>,
    ) -> Result<VocabularyEntry> {
        self.lookup.lookup_word(word, context, user_id, article_id).await
    }

    pub async fn lookup_words(
        &self,
        words: &[String],
        context: Option<&str>,
        user_id: i64,
        article_id: Option<i64>,
    ) -> Result<Vec<VocabularyEntry>> {
        self.lookup.lookup_words(words, context, user_id, article_id).await
    }

    pub fn add_word(&self, user_id: i64, word: NewWord) -> Result<VocabularyEntry> {
        self.lookup.add_word(user_id, word)
    }

    pub fn record_review(&self, user_id: i64, word_id: i64, outcome: ReviewOutcome) -> Result<bool> {
        self.scheduler.record_review(user_id, word_id, outcome)
    }

    pub fn retire_word(&self, word_id: i64) -> Result<bool> {
        self.scheduler.retire_word(word_id)
    }

    pub fn get_due_words(&self, user_id: i64) -> Result<Vec<VocabularyEntry>> {
        self.scheduler.get_due_words(user_id)
    }

    pub fn review_card(&self, entry: &VocabularyEntry) -> ReviewCard {
        self.scheduler.review_card(entry)
    }

    pub fn get_stats(&self, user_id: i64) -> Result<VocabularyStats> {
        self.stats.get_stats(user_id)
    }

    pub fn get_growth_curve(&self, user_id: i64, days: u32) -> Result<GrowthCurve> {
        self.stats.growth_curve(user_id, days)
    }

    /// Remove rows duplicating an earlier `(user, word, context)`, for one
    /// user or for everyone
    pub fn cleanup_duplicates(&self, user_id: Option<i64>) -> Result<usize> {
        require_optional_id("user id", user_id)?;
        let deleted = self.store.delete_duplicates(user_id)?;
        if deleted > 0 {
            log::info!("Removed {} duplicate vocabulary rows", deleted);
        }
        Ok(deleted)
    }

    /// Wait for pending lookup backfills to land
    pub async fn flush(&self) {
        self.lookup.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::test_support::{temp_store, Behavior, CountingGenerator};
    use crate::vocabulary::{ReviewStatus, WordSource};
    use tempfile::TempDir;

    fn service(generator: Arc<CountingGenerator>) -> (VocabularyService, Arc<SqliteVocabularyStore>, TempDir) {
        let (store, temp_dir) = temp_store();
        let service = VocabularyService::new(store.clone(), generator, ServiceOptions::default());
        (service, store, temp_dir)
    }

    #[tokio::test]
    async fn test_reader_clicks_a_word_twice() {
        let generator = CountingGenerator::new(Behavior::Succeed);
        let (service, store, _temp) = service(generator.clone());

        let first = service.lookup_word("Ubiquitous", Some("tech"), 7, Some(12)).await.unwrap();
        assert_eq!(first.word, "ubiquitous");
        assert_eq!(first.source, WordSource::Ai);
        assert_eq!(first.review_status, ReviewStatus::New);
        service.flush().await;

        let second = service.lookup_word("ubiquitous", Some("tech"), 7, None).await.unwrap();
        assert_eq!(generator.calls(), 1);
        assert!(second.id > 0);
        assert_eq!(second.meaning, first.meaning);
        assert_eq!(store.count_by_user(7).unwrap(), 1);

        let due = service.get_due_words(7).unwrap();
        assert_eq!(due.len(), 1);
        assert!(service.record_review(7, due[0].id, ReviewOutcome::Success).unwrap());
        assert!(service.get_due_words(7).unwrap().is_empty());

        let stats = service.get_stats(7).unwrap();
        assert_eq!(stats.total_words, 1);
        assert_eq!(stats.due_words, 0);
        assert_eq!(stats.status_distribution.learning, 1);
        assert_eq!(stats.added_today, 1);

        let curve = service.get_growth_curve(7, 7).unwrap();
        assert_eq!(curve.window_total(), 1);
    }

    #[tokio::test]
    async fn test_retired_word_disappears_from_due() {
        let generator = CountingGenerator::new(Behavior::Succeed);
        let (service, _store, _temp) = service(generator);

        service.lookup_word("ephemeral", None, 7, None).await.unwrap();
        service.flush().await;

        let due = service.get_due_words(7).unwrap();
        assert_eq!(due.len(), 1);
        assert!(service.retire_word(due[0].id).unwrap());
        assert!(service.get_due_words(7).unwrap().is_empty());
        assert_eq!(service.get_stats(7).unwrap().status_distribution.mastered, 1);
    }

    #[test]
    fn test_cleanup_duplicates() {
        let generator = CountingGenerator::new(Behavior::Succeed);
        let (service, store, _temp) = service(generator);

        let entry = VocabularyEntry::new(7, "twice".into(), "general".into(), "m".into(), "e".into());
        store.insert(&entry).unwrap();
        store.insert(&entry).unwrap();

        assert_eq!(service.cleanup_duplicates(Some(7)).unwrap(), 1);
        assert_eq!(service.cleanup_duplicates(None).unwrap(), 0);
        assert!(service.cleanup_duplicates(Some(0)).is_err());
    }

    #[test]
    fn test_from_config_opens_store() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            database_path: Some(temp_dir.path().join("nested").join("vocabulary.db")),
            language: Language::Zh,
            generator: GeneratorConfig::default(),
        };

        let service = VocabularyService::from_config(&config).unwrap();
        assert_eq!(service.get_stats(1).unwrap().total_words, 0);
        assert!(temp_dir.path().join("nested").join("vocabulary.db").exists());
    }
}
