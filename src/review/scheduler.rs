use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::algorithm::{self, SchedulePreview};
use crate::error::{require_positive_id, Result};
use crate::language::Language;
use crate::vocabulary::{ReviewOutcome, ReviewStatus, ReviewUpdate, VocabularyEntry, VocabularyStore};

/// Attempts at the guarded update before giving up on a contended row
const MAX_UPDATE_ATTEMPTS: usize = 3;

/// Review state of one entry as shown on a flashcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewCard {
    pub id: i64,
    pub word: String,
    pub status: ReviewStatus,
    pub next_review_at: NaiveDate,
    pub progress_percent: u8,
    pub countdown: String,
    pub retired: bool,
    pub preview: SchedulePreview,
}

/// Applies review outcomes and answers "what is due" for a user
pub struct ReviewScheduler {
    store: Arc<dyn VocabularyStore>,
    language: Language,
}

/// Last date a word may be scheduled for and still count as due today.
/// Anything scheduled from tomorrow on is not due yet.
pub fn due_cutoff(today: NaiveDate) -> NaiveDate {
    today
}

impl ReviewScheduler {
    pub fn new(store: Arc<dyn VocabularyStore>, language: Language) -> Self {
        Self { store, language }
    }

    /// Move a word one step along the review chain and reschedule it.
    ///
    /// Returns `false` if no such word exists for this user. Never inserts.
    pub fn record_review(&self, user_id: i64, word_id: i64, outcome: ReviewOutcome) -> Result<bool> {
        require_positive_id("user id", user_id)?;
        require_positive_id("word id", word_id)?;

        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let entry = match self.store.find_by_id(word_id)? {
                Some(entry) if entry.user_id == user_id => entry,
                Some(_) => {
                    log::warn!("Word #{} does not belong to user {}, not reviewing", word_id, user_id);
                    return Ok(false);
                }
                None => {
                    log::warn!("Word #{} not found, nothing to review", word_id);
                    return Ok(false);
                }
            };

            let now = Utc::now();
            let result = algorithm::calculate_next_review(entry.review_status, outcome, now.date_naive());
            let update = ReviewUpdate {
                id: word_id,
                user_id,
                expected_status: entry.review_status,
                status: result.status,
                next_review_at: result.next_review_at,
                reviewed_at: now,
                succeeded: outcome.is_success(),
            };

            if self.store.update_review(&update)? {
                log::info!(
                    "Reviewed '{}' (#{}): {} -> {}, next review {}",
                    entry.word,
                    word_id,
                    entry.review_status,
                    result.status,
                    result.next_review_at
                );
                return Ok(true);
            }

            log::debug!(
                "Word #{} changed during review (attempt {}/{}), retrying",
                word_id,
                attempt,
                MAX_UPDATE_ATTEMPTS
            );
        }

        log::warn!("Gave up reviewing word #{} after {} attempts", word_id, MAX_UPDATE_ATTEMPTS);
        Ok(false)
    }

    /// Take a word out of rotation for good
    pub fn retire_word(&self, word_id: i64) -> Result<bool> {
        require_positive_id("word id", word_id)?;

        let until = algorithm::retirement_date(Utc::now().date_naive());
        let retired = self.store.retire(word_id, until)?;
        if retired {
            log::info!("Retired word #{}", word_id);
        } else {
            log::warn!("Word #{} not found, nothing to retire", word_id);
        }
        Ok(retired)
    }

    /// Words due today or overdue, oldest schedule first
    pub fn get_due_words(&self, user_id: i64) -> Result<Vec<VocabularyEntry>> {
        require_positive_id("user id", user_id)?;

        let cutoff = due_cutoff(Utc::now().date_naive());
        let due = self.store.list_due_for_user(user_id, cutoff)?;
        log::debug!("{} words due for user {} (through {})", due.len(), user_id, cutoff);
        Ok(due)
    }

    pub fn progress_percent(&self, next_review_at: DateTime<Utc>) -> u8 {
        algorithm::progress_percent(next_review_at, Utc::now())
    }

    pub fn humanize_countdown(&self, next_review_at: DateTime<Utc>) -> String {
        algorithm::humanize_countdown(next_review_at, Utc::now(), self.language)
    }

    pub fn review_card(&self, entry: &VocabularyEntry) -> ReviewCard {
        self.review_card_at(entry, Utc::now())
    }

    fn review_card_at(&self, entry: &VocabularyEntry, now: DateTime<Utc>) -> ReviewCard {
        let next = entry.next_review_instant();
        ReviewCard {
            id: entry.id,
            word: entry.word.clone(),
            status: entry.review_status,
            next_review_at: entry.next_review_at,
            progress_percent: algorithm::progress_percent(next, now),
            countdown: algorithm::humanize_countdown(next, now, self.language),
            retired: entry.retired,
            preview: algorithm::preview_schedule(entry.review_status, now.date_naive()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::test_support::{stored_entry, temp_store, FailingStore};
    use crate::vocabulary::SqliteVocabularyStore;
    use chrono::{Duration, TimeZone};

    fn scheduler(store: Arc<SqliteVocabularyStore>) -> ReviewScheduler {
        ReviewScheduler::new(store, Language::En)
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    #[test]
    fn test_review_walks_the_chain() {
        let (store, _temp) = temp_store();
        let word = stored_entry(store.as_ref(), 7, "ubiquitous", "tech");
        let scheduler = scheduler(store.clone());

        assert!(scheduler.record_review(7, word.id, ReviewOutcome::Success).unwrap());
        let entry = store.find_by_id(word.id).unwrap().unwrap();
        assert_eq!(entry.review_status, ReviewStatus::Learning);
        assert_eq!(entry.next_review_at, today() + Duration::days(1));
        assert_eq!(entry.review_count, 1);
        assert_eq!(entry.last_review_succeeded, Some(true));
        assert!(entry.last_reviewed_at.is_some());

        assert!(scheduler.record_review(7, word.id, ReviewOutcome::Success).unwrap());
        let entry = store.find_by_id(word.id).unwrap().unwrap();
        assert_eq!(entry.review_status, ReviewStatus::Mastered);
        assert_eq!(entry.next_review_at, today() + Duration::days(3));

        assert!(scheduler.record_review(7, word.id, ReviewOutcome::Fail).unwrap());
        let entry = store.find_by_id(word.id).unwrap().unwrap();
        assert_eq!(entry.review_status, ReviewStatus::Learning);
        assert_eq!(entry.next_review_at, today() + Duration::days(1));
        assert_eq!(entry.review_count, 3);
        assert_eq!(entry.last_review_succeeded, Some(false));
    }

    #[test]
    fn test_successful_review_leaves_due_list() {
        let (store, _temp) = temp_store();
        let word = stored_entry(store.as_ref(), 7, "ubiquitous", "tech");
        let scheduler = scheduler(store.clone());

        assert_eq!(scheduler.get_due_words(7).unwrap().len(), 1);
        assert!(scheduler.record_review(7, word.id, ReviewOutcome::Success).unwrap());
        assert!(scheduler.get_due_words(7).unwrap().is_empty());

        // Failing a new word keeps it due today
        let other = stored_entry(store.as_ref(), 7, "lucid", "general");
        assert!(scheduler.record_review(7, other.id, ReviewOutcome::Fail).unwrap());
        let due: Vec<i64> = scheduler.get_due_words(7).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(due, vec![other.id]);
    }

    #[test]
    fn test_review_of_missing_or_foreign_word() {
        let (store, _temp) = temp_store();
        let word = stored_entry(store.as_ref(), 7, "bond", "finance");
        let scheduler = scheduler(store.clone());

        assert!(!scheduler.record_review(7, 9999, ReviewOutcome::Success).unwrap());
        assert!(!scheduler.record_review(8, word.id, ReviewOutcome::Success).unwrap());

        let entry = store.find_by_id(word.id).unwrap().unwrap();
        assert_eq!(entry.review_status, ReviewStatus::New);
        assert_eq!(entry.review_count, 0);
        assert_eq!(store.count_by_user(7).unwrap(), 1);
        assert_eq!(store.count_by_user(8).unwrap(), 0);
    }

    #[test]
    fn test_invalid_ids_fail_before_store() {
        let scheduler = ReviewScheduler::new(Arc::new(FailingStore), Language::En);
        assert!(matches!(
            scheduler.record_review(0, 1, ReviewOutcome::Success),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            scheduler.record_review(1, -2, ReviewOutcome::Fail),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(scheduler.retire_word(0), Err(ServiceError::Validation(_))));
        assert!(matches!(scheduler.get_due_words(0), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_storage_failure_surfaces() {
        let scheduler = ReviewScheduler::new(Arc::new(FailingStore), Language::En);
        assert!(matches!(
            scheduler.record_review(1, 1, ReviewOutcome::Success),
            Err(ServiceError::Storage(_))
        ));
        assert!(matches!(scheduler.retire_word(1), Err(ServiceError::Storage(_))));
    }

    #[test]
    fn test_due_words_are_today_or_overdue() {
        let (store, _temp) = temp_store();
        let scheduler = scheduler(store.clone());

        let mut overdue = VocabularyEntry::new(7, "old".into(), "general".into(), "m".into(), "e".into());
        overdue.next_review_at = today() - Duration::days(4);
        let overdue = store.insert(&overdue).unwrap();

        let due_today = stored_entry(store.as_ref(), 7, "today", "general");

        let mut tomorrow = VocabularyEntry::new(7, "soon".into(), "general".into(), "m".into(), "e".into());
        tomorrow.next_review_at = today() + Duration::days(1);
        store.insert(&tomorrow).unwrap();

        let mut later = VocabularyEntry::new(7, "later".into(), "general".into(), "m".into(), "e".into());
        later.next_review_at = today() + Duration::days(2);
        store.insert(&later).unwrap();

        stored_entry(store.as_ref(), 8, "other", "general");

        let ids: Vec<i64> = scheduler.get_due_words(7).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![overdue.id, due_today.id]);
    }

    #[test]
    fn test_retired_word_leaves_rotation() {
        let (store, _temp) = temp_store();
        let scheduler = scheduler(store.clone());

        let mut learning = VocabularyEntry::new(7, "ephemeral".into(), "general".into(), "m".into(), "e".into());
        learning.review_status = ReviewStatus::Learning;
        let word = store.insert(&learning).unwrap();
        assert_eq!(scheduler.get_due_words(7).unwrap().len(), 1);

        assert!(scheduler.retire_word(word.id).unwrap());
        let entry = store.find_by_id(word.id).unwrap().unwrap();
        assert!(entry.retired);
        assert_eq!(entry.review_status, ReviewStatus::Mastered);
        assert!(entry.next_review_instant() > Utc::now() + Duration::days(99 * 365));
        assert_eq!(entry.next_review_at, algorithm::retirement_date(today()));
        assert!(scheduler.get_due_words(7).unwrap().is_empty());

        assert!(!scheduler.retire_word(9999).unwrap());
    }

    #[test]
    fn test_review_after_retirement_brings_word_back() {
        let (store, _temp) = temp_store();
        let scheduler = scheduler(store.clone());

        let word = stored_entry(store.as_ref(), 7, "ephemeral", "general");
        scheduler.retire_word(word.id).unwrap();
        assert!(scheduler.record_review(7, word.id, ReviewOutcome::Fail).unwrap());

        let entry = store.find_by_id(word.id).unwrap().unwrap();
        assert!(!entry.retired);
        assert_eq!(entry.review_status, ReviewStatus::Learning);
        assert_eq!(entry.next_review_at, today() + Duration::days(1));
        assert!(scheduler.get_due_words(7).unwrap().is_empty());
    }

    #[test]
    fn test_review_card() {
        let (store, _temp) = temp_store();
        let scheduler = ReviewScheduler::new(store.clone(), Language::Zh);

        let mut entry = VocabularyEntry::new(7, "lucid".into(), "general".into(), "m".into(), "e".into());
        entry.next_review_at = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        entry.review_status = ReviewStatus::Learning;

        let now = Utc.with_ymd_and_hms(2025, 3, 11, 6, 0, 0).unwrap();
        let card = scheduler.review_card_at(&entry, now);
        assert_eq!(card.progress_percent, 25);
        assert_eq!(card.countdown, "18小时后复习");
        assert_eq!(card.preview.on_success.status, ReviewStatus::Mastered);

        let late = Utc.with_ymd_and_hms(2025, 3, 12, 5, 0, 0).unwrap();
        let card = scheduler.review_card_at(&entry, late);
        assert_eq!(card.progress_percent, 100);
        assert_eq!(card.countdown, "已逾期5小时");
    }
}
