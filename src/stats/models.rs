use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::vocabulary::ReviewStatus;

/// Word counts per review status; every status is always present
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDistribution {
    pub new: u64,
    pub learning: u64,
    pub mastered: u64,
}

impl StatusDistribution {
    pub fn from_counts(counts: &HashMap<ReviewStatus, u64>) -> Self {
        let count = |status| counts.get(&status).copied().unwrap_or(0);
        Self {
            new: count(ReviewStatus::New),
            learning: count(ReviewStatus::Learning),
            mastered: count(ReviewStatus::Mastered),
        }
    }

    pub fn get(&self, status: ReviewStatus) -> u64 {
        match status {
            ReviewStatus::New => self.new,
            ReviewStatus::Learning => self.learning,
            ReviewStatus::Mastered => self.mastered,
        }
    }

    pub fn total(&self) -> u64 {
        self.new + self.learning + self.mastered
    }
}

/// Words added on one day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: u64,
}

/// Words added per day over a trailing window ending today
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthCurve {
    /// One point per day, oldest first, days without additions included
    pub points: Vec<DailyCount>,
    pub total_words: u64,
    /// Words added in the last seven days, today included
    pub weekly_new_words: u64,
    pub daily_average: f64,
}

impl GrowthCurve {
    /// Chart labels, `MM/dd`
    pub fn labels(&self) -> Vec<String> {
        self.points
            .iter()
            .map(|p| p.date.format("%m/%d").to_string())
            .collect()
    }

    pub fn counts(&self) -> Vec<u64> {
        self.points.iter().map(|p| p.count).collect()
    }

    pub fn window_total(&self) -> u64 {
        self.points.iter().map(|p| p.count).sum()
    }
}

/// Dashboard snapshot of a user's vocabulary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyStats {
    pub total_words: u64,
    pub status_distribution: StatusDistribution,
    pub local_words: u64,
    pub ai_words: u64,
    pub reviewed_words: u64,
    pub successful_words: u64,
    /// Fraction in `[0, 1]`
    pub success_rate: f64,
    pub due_words: u64,
    pub added_today: u64,
    pub added_this_week: u64,
    pub added_this_month: u64,
}
