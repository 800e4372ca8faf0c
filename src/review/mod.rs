//! Spaced review for saved words
//!
//! This module provides:
//! - The fixed-interval status chain and its date arithmetic
//! - Progress and countdown helpers for review cards
//! - The scheduler that persists review outcomes and lists due words

pub mod algorithm;
pub mod scheduler;

pub use algorithm::{ReviewResult, SchedulePreview};
pub use scheduler::{ReviewCard, ReviewScheduler};
