//! Fixed-interval review scheduling
//!
//! A word moves one step along `new <-> learning <-> mastered` per review:
//! up on success, down on failure. Its next review date depends only on the
//! status it lands in:
//!
//! - new: today
//! - learning: tomorrow
//! - mastered: in three days

use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use serde::Serialize;

use crate::language::Language;
use crate::vocabulary::{ReviewOutcome, ReviewStatus};

/// Days until the next review after landing in `learning`
pub const LEARNING_INTERVAL_DAYS: i64 = 1;

/// Days until the next review after landing in `mastered`
pub const MASTERED_INTERVAL_DAYS: i64 = 3;

/// How far ahead a retired word is scheduled
const RETIREMENT_MONTHS: u32 = 100 * 12;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Result of applying one review outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    pub status: ReviewStatus,
    pub interval_days: i64,
    pub next_review_at: NaiveDate,
}

/// What each outcome would do to a word, for showing before the learner answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePreview {
    pub on_success: ReviewResult,
    pub on_fail: ReviewResult,
}

pub fn next_status(current: ReviewStatus, outcome: ReviewOutcome) -> ReviewStatus {
    match (current, outcome) {
        (ReviewStatus::New, ReviewOutcome::Success) => ReviewStatus::Learning,
        (ReviewStatus::Learning, ReviewOutcome::Success) => ReviewStatus::Mastered,
        (ReviewStatus::Mastered, ReviewOutcome::Success) => ReviewStatus::Mastered,
        (ReviewStatus::Mastered, ReviewOutcome::Fail) => ReviewStatus::Learning,
        (ReviewStatus::Learning, ReviewOutcome::Fail) => ReviewStatus::New,
        (ReviewStatus::New, ReviewOutcome::Fail) => ReviewStatus::New,
    }
}

pub fn interval_days(status: ReviewStatus) -> i64 {
    match status {
        ReviewStatus::New => 0,
        ReviewStatus::Learning => LEARNING_INTERVAL_DAYS,
        ReviewStatus::Mastered => MASTERED_INTERVAL_DAYS,
    }
}

pub fn next_review_date(status: ReviewStatus, today: NaiveDate) -> NaiveDate {
    today + Duration::days(interval_days(status))
}

/// Date a retired word is pushed to, a century out
pub fn retirement_date(today: NaiveDate) -> NaiveDate {
    today
        .checked_add_months(Months::new(RETIREMENT_MONTHS))
        .unwrap_or(NaiveDate::MAX)
}

/// Apply one review to a word currently in `current`
pub fn calculate_next_review(current: ReviewStatus, outcome: ReviewOutcome, today: NaiveDate) -> ReviewResult {
    let status = next_status(current, outcome);
    ReviewResult {
        status,
        interval_days: interval_days(status),
        next_review_at: next_review_date(status, today),
    }
}

pub fn preview_schedule(current: ReviewStatus, today: NaiveDate) -> SchedulePreview {
    SchedulePreview {
        on_success: calculate_next_review(current, ReviewOutcome::Success, today),
        on_fail: calculate_next_review(current, ReviewOutcome::Fail, today),
    }
}

/// How close a word is to being due, as a percentage.
///
/// 100 once `next_review_at` has been reached. Before that, a linear ramp
/// over the preceding day, capped at 99 so that 100 always means due.
pub fn progress_percent(next_review_at: DateTime<Utc>, now: DateTime<Utc>) -> u8 {
    if next_review_at <= now {
        return 100;
    }

    let remaining_ms = (next_review_at - now).num_milliseconds();
    let elapsed_ms = DAY_MS - remaining_ms;
    (elapsed_ms * 100 / DAY_MS).clamp(0, 99) as u8
}

/// Countdown text for a word's next review, in hours under a day and in
/// days beyond that
pub fn humanize_countdown(next_review_at: DateTime<Utc>, now: DateTime<Utc>, language: Language) -> String {
    let remaining = next_review_at - now;
    let hours = remaining.num_hours();

    // Less than an hour late still reads as "in 0 hours"
    if hours < 0 {
        let overdue = -hours;
        return match language {
            Language::En => format!("overdue by {} {}", overdue, plural(overdue, "hour")),
            Language::Zh => format!("已逾期{}小时", overdue),
        };
    }

    if hours < 24 {
        match language {
            Language::En => format!("in {} {}", hours, plural(hours, "hour")),
            Language::Zh => format!("{}小时后复习", hours),
        }
    } else {
        let days = remaining.num_days();
        match language {
            Language::En => format!("in {} {}", days, plural(days, "day")),
            Language::Zh => format!("{}天后复习", days),
        }
    }
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        unit.to_string()
    } else {
        format!("{}s", unit)
    }
}
