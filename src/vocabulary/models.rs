//! Data models for the per-user vocabulary store

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Context tag used when the caller gives none
pub const DEFAULT_CONTEXT: &str = "general";

/// Contexts are short category tags; longer input is cut to this many characters
pub const MAX_CONTEXT_CHARS: usize = 50;

/// Where the meaning and example of an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WordSource {
    /// Entered or curated locally
    Local,
    /// Produced by the definition generator
    Ai,
}

impl WordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Ai => "ai",
        }
    }
}

impl Default for WordSource {
    fn default() -> Self {
        Self::Ai
    }
}

impl fmt::Display for WordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WordSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "ai" => Ok(Self::Ai),
            other => Err(format!("unknown word source: {}", other)),
        }
    }
}

/// Position of a word on the review chain `new <-> learning <-> mastered`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Never reviewed successfully
    New,
    /// Recalled once, still fragile
    Learning,
    /// Recalled on consecutive reviews
    Mastered,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 3] = [Self::New, Self::Learning, Self::Mastered];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Mastered => "mastered",
        }
    }

    /// Index on the chain, used to check that transitions move one step at most
    pub fn rank(&self) -> i32 {
        match self {
            Self::New => 0,
            Self::Learning => 1,
            Self::Mastered => 2,
        }
    }
}

impl Default for ReviewStatus {
    fn default() -> Self {
        Self::New
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(Self::New),
            "learning" => Ok(Self::Learning),
            "mastered" => Ok(Self::Mastered),
            other => Err(format!("unknown review status: {}", other)),
        }
    }
}

/// Result of a single review, as reported by the learner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewOutcome {
    Success,
    Fail,
}

impl ReviewOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// A word saved by one user, with its cached meaning and review schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyEntry {
    /// Row id; 0 until the entry has been persisted
    pub id: i64,
    pub user_id: i64,
    pub word: String,
    pub context: String,
    pub meaning: String,
    pub example: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    pub source: WordSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_article_id: Option<i64>,
    pub review_status: ReviewStatus,
    pub added_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reviewed_at: Option<DateTime<Utc>>,
    pub next_review_at: NaiveDate,
    /// Retired words are never offered for review again
    #[serde(default)]
    pub retired: bool,
    #[serde(default)]
    pub review_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_review_succeeded: Option<bool>,
}

impl VocabularyEntry {
    /// Build a fresh, unpersisted entry that is due for review today
    pub fn new(user_id: i64, word: String, context: String, meaning: String, example: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            user_id,
            word,
            context,
            meaning,
            example,
            phonetic: None,
            difficulty: None,
            source: WordSource::Ai,
            source_article_id: None,
            review_status: ReviewStatus::New,
            added_at: now,
            last_reviewed_at: None,
            next_review_at: now.date_naive(),
            retired: false,
            review_count: 0,
            last_review_succeeded: None,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Start of the day the entry is scheduled for, in UTC
    pub fn next_review_instant(&self) -> DateTime<Utc> {
        start_of_day(self.next_review_at)
    }
}

/// Meaning and example text returned by the definition generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    pub meaning: String,
    pub example: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

/// Midnight UTC at the start of `date`
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// Canonical form of a clicked token: trimmed, surrounding punctuation
/// removed, lower-cased. Returns `None` if nothing word-like remains.
pub fn canonical_word(raw: &str) -> Option<String> {
    let trimmed = raw
        .trim()
        .trim_matches(|c: char| !c.is_alphanumeric());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Canonical context tag: blank becomes `general`, long text is truncated
pub fn canonical_context(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        None | Some("") => DEFAULT_CONTEXT.to_string(),
        Some(context) => context.chars().take(MAX_CONTEXT_CHARS).collect(),
    }
}
