use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};

use super::models::{DailyCount, GrowthCurve, StatusDistribution, VocabularyStats};
use crate::error::{require_positive_id, Result, ServiceError};
use crate::review::scheduler::due_cutoff;
use crate::vocabulary::{storage, VocabularyStore, WordSource};

/// Longest growth window a caller may ask for
pub const MAX_GROWTH_DAYS: u32 = 365;

const WEEK_DAYS: i64 = 7;
const MONTH_DAYS: i64 = 30;

/// Read-only counts over a user's vocabulary.
///
/// A failing sub-query is logged and counted as zero, so a dashboard
/// always renders.
pub struct StatsAggregator {
    store: Arc<dyn VocabularyStore>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn VocabularyStore>) -> Self {
        Self { store }
    }

    pub fn total_words(&self, user_id: i64) -> Result<u64> {
        require_positive_id("user id", user_id)?;
        Ok(or_zero("total words", user_id, self.store.count_by_user(user_id)))
    }

    /// Words added on or after `since`
    pub fn words_added_since(&self, user_id: i64, since: NaiveDate) -> Result<u64> {
        require_positive_id("user id", user_id)?;
        Ok(or_zero(
            "words added",
            user_id,
            self.store.count_added_since(user_id, since),
        ))
    }

    pub fn status_distribution(&self, user_id: i64) -> Result<StatusDistribution> {
        require_positive_id("user id", user_id)?;
        let counts = or_zero("status distribution", user_id, self.store.count_by_status(user_id));
        Ok(StatusDistribution::from_counts(&counts))
    }

    /// Share of reviewed words whose last review succeeded, in `[0, 1]`
    pub fn success_rate(&self, user_id: i64) -> Result<f64> {
        require_positive_id("user id", user_id)?;
        let reviewed = or_zero("reviewed words", user_id, self.store.count_reviewed(user_id));
        let successful = or_zero("successful words", user_id, self.store.count_successful(user_id));
        Ok(rate(successful, reviewed))
    }

    /// Words added per day for the last `days` days, today included
    pub fn growth_curve(&self, user_id: i64, days: u32) -> Result<GrowthCurve> {
        require_positive_id("user id", user_id)?;
        if days == 0 || days > MAX_GROWTH_DAYS {
            return Err(ServiceError::Validation(format!(
                "days must be between 1 and {}, got {}",
                MAX_GROWTH_DAYS, days
            )));
        }

        let today = Utc::now().date_naive();
        let start = today - Duration::days(i64::from(days) - 1);
        let counts: HashMap<NaiveDate, u64> = or_zero(
            "daily additions",
            user_id,
            self.store.daily_added_counts(user_id, start, today),
        )
        .into_iter()
        .collect();

        let points = start
            .iter_days()
            .take(days as usize)
            .map(|date| DailyCount {
                date,
                count: counts.get(&date).copied().unwrap_or(0),
            })
            .collect();

        let weekly_new_words = or_zero(
            "weekly additions",
            user_id,
            self.store.count_added_since(user_id, today - Duration::days(WEEK_DAYS - 1)),
        );

        Ok(GrowthCurve {
            points,
            total_words: or_zero("total words", user_id, self.store.count_by_user(user_id)),
            weekly_new_words,
            daily_average: weekly_new_words as f64 / WEEK_DAYS as f64,
        })
    }

    pub fn get_stats(&self, user_id: i64) -> Result<VocabularyStats> {
        require_positive_id("user id", user_id)?;

        let store = self.store.as_ref();
        let today = Utc::now().date_naive();

        let by_source = or_zero("source split", user_id, store.count_by_source(user_id));
        let reviewed_words = or_zero("reviewed words", user_id, store.count_reviewed(user_id));
        let successful_words = or_zero("successful words", user_id, store.count_successful(user_id));
        let added_since = |days: i64| {
            or_zero(
                "words added",
                user_id,
                store.count_added_since(user_id, today - Duration::days(days - 1)),
            )
        };

        let stats = VocabularyStats {
            total_words: or_zero("total words", user_id, store.count_by_user(user_id)),
            status_distribution: StatusDistribution::from_counts(&or_zero(
                "status distribution",
                user_id,
                store.count_by_status(user_id),
            )),
            local_words: by_source.get(&WordSource::Local).copied().unwrap_or(0),
            ai_words: by_source.get(&WordSource::Ai).copied().unwrap_or(0),
            reviewed_words,
            successful_words,
            success_rate: rate(successful_words, reviewed_words),
            due_words: or_zero("due words", user_id, store.count_due(user_id, due_cutoff(today))),
            added_today: added_since(1),
            added_this_week: added_since(WEEK_DAYS),
            added_this_month: added_since(MONTH_DAYS),
        };

        log::debug!(
            "Stats for user {}: {} words, {} due",
            user_id,
            stats.total_words,
            stats.due_words
        );
        Ok(stats)
    }
}

fn rate(successful: u64, reviewed: u64) -> f64 {
    if reviewed == 0 {
        0.0
    } else {
        (successful as f64 / reviewed as f64).min(1.0)
    }
}

fn or_zero<T: Default>(what: &str, user_id: i64, result: storage::Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Failed to count {} for user {}, using zero: {}", what, user_id, e);
            T::default()
        }
    }
}
