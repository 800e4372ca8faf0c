//! Row store for vocabulary entries.
//!
//! One row per `(user, word, context)`. The SQLite implementation keeps a
//! single connection behind a mutex, so every statement below runs alone.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

use super::models::{ReviewStatus, VocabularyEntry, WordSource};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store connection lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Everything a single review writes back to one row
#[derive(Debug, Clone)]
pub struct ReviewUpdate {
    pub id: i64,
    pub user_id: i64,
    /// Status the row had when it was read; the update only applies if it still does
    pub expected_status: ReviewStatus,
    pub status: ReviewStatus,
    pub next_review_at: NaiveDate,
    pub reviewed_at: DateTime<Utc>,
    pub succeeded: bool,
}

/// Row operations the vocabulary core needs from persistence
pub trait VocabularyStore: Send + Sync {
    /// Row for `(user, word)`: the exact `context` match first, otherwise the most recently added one
    fn find_best_match(&self, user_id: i64, word: &str, context: &str) -> Result<Option<VocabularyEntry>>;

    fn find_by_user_word_context(
        &self,
        user_id: i64,
        word: &str,
        context: &str,
    ) -> Result<Option<VocabularyEntry>>;

    fn find_by_id(&self, id: i64) -> Result<Option<VocabularyEntry>>;

    /// Unconditional insert; returns the entry with its assigned id
    fn insert(&self, entry: &VocabularyEntry) -> Result<VocabularyEntry>;

    /// Insert unless a row with the same `(user, word, context)` exists, in one statement.
    /// Returns `None` when the key was already present.
    fn insert_if_absent(&self, entry: &VocabularyEntry) -> Result<Option<VocabularyEntry>>;

    /// Apply a review to one row; `false` if no row matched
    fn update_review(&self, update: &ReviewUpdate) -> Result<bool>;

    /// Mark a row mastered and retired, parking its review date at `next_review_at`
    fn retire(&self, id: i64, next_review_at: NaiveDate) -> Result<bool>;

    fn count_by_user(&self, user_id: i64) -> Result<u64>;

    fn count_by_status(&self, user_id: i64) -> Result<HashMap<ReviewStatus, u64>>;

    fn count_by_source(&self, user_id: i64) -> Result<HashMap<WordSource, u64>>;

    /// Words whose `added_at` falls on or after `date`
    fn count_added_since(&self, user_id: i64, date: NaiveDate) -> Result<u64>;

    /// Words reviewed at least once
    fn count_reviewed(&self, user_id: i64) -> Result<u64>;

    /// Words whose most recent review succeeded
    fn count_successful(&self, user_id: i64) -> Result<u64>;

    /// Non-retired words scheduled on or before `cutoff`
    fn count_due(&self, user_id: i64, cutoff: NaiveDate) -> Result<u64>;

    fn list_due_for_user(&self, user_id: i64, cutoff: NaiveDate) -> Result<Vec<VocabularyEntry>>;

    /// Per-day additions within `[start, end]`; days without additions are absent
    fn daily_added_counts(&self, user_id: i64, start: NaiveDate, end: NaiveDate) -> Result<Vec<(NaiveDate, u64)>>;

    /// Delete all but the earliest row of every duplicated key, for one user or all users
    fn delete_duplicates(&self, user_id: Option<i64>) -> Result<usize>;
}

const ENTRY_COLUMNS: &str = "id, user_id, word, context, meaning, example, phonetic, difficulty, \
     source, source_article_id, review_status, added_at, last_reviewed_at, next_review_at, \
     retired, review_count, last_review_succeeded";

/// SQLite-backed vocabulary store
pub struct SqliteVocabularyStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteVocabularyStore {
    /// Open (or create) the store at the given path.
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&db_path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS vocabulary_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                word TEXT NOT NULL,
                context TEXT NOT NULL DEFAULT 'general',
                meaning TEXT NOT NULL,
                example TEXT NOT NULL DEFAULT '',
                phonetic TEXT,
                difficulty TEXT,
                source TEXT NOT NULL DEFAULT 'ai',
                source_article_id INTEGER,
                review_status TEXT NOT NULL DEFAULT 'new',
                added_at TEXT NOT NULL,
                last_reviewed_at TEXT,
                next_review_at TEXT NOT NULL,
                retired INTEGER NOT NULL DEFAULT 0,
                review_count INTEGER NOT NULL DEFAULT 0,
                last_review_succeeded INTEGER
            );

            -- Not unique: rows written by older clients may duplicate a key
            CREATE INDEX IF NOT EXISTS idx_vocabulary_user_word
                ON vocabulary_entries(user_id, word, context);
            CREATE INDEX IF NOT EXISTS idx_vocabulary_user_next_review
                ON vocabulary_entries(user_id, next_review_at);
            "#,
        )?;

        log::debug!("Opened vocabulary store at {}", db_path.display());

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
        })
    }

    /// Get the database path.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    fn query_one(&self, sql: &str, params: impl rusqlite::Params) -> Result<Option<VocabularyEntry>> {
        let conn = self.conn()?;
        let entry = conn.query_row(sql, params, entry_from_row).optional()?;
        Ok(entry)
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }
}

impl VocabularyStore for SqliteVocabularyStore {
    fn find_best_match(&self, user_id: i64, word: &str, context: &str) -> Result<Option<VocabularyEntry>> {
        let sql = format!(
            "SELECT {} FROM vocabulary_entries
             WHERE user_id = ?1 AND word = ?2
             ORDER BY (context = ?3) DESC, added_at DESC, id DESC
             LIMIT 1",
            ENTRY_COLUMNS
        );
        self.query_one(&sql, params![user_id, word, context])
    }

    fn find_by_user_word_context(
        &self,
        user_id: i64,
        word: &str,
        context: &str,
    ) -> Result<Option<VocabularyEntry>> {
        let sql = format!(
            "SELECT {} FROM vocabulary_entries
             WHERE user_id = ?1 AND word = ?2 AND context = ?3
             ORDER BY added_at ASC, id ASC
             LIMIT 1",
            ENTRY_COLUMNS
        );
        self.query_one(&sql, params![user_id, word, context])
    }

    fn find_by_id(&self, id: i64) -> Result<Option<VocabularyEntry>> {
        let sql = format!("SELECT {} FROM vocabulary_entries WHERE id = ?1", ENTRY_COLUMNS);
        self.query_one(&sql, params![id])
    }

    fn insert(&self, entry: &VocabularyEntry) -> Result<VocabularyEntry> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO vocabulary_entries (
                user_id, word, context, meaning, example, phonetic, difficulty, source,
                source_article_id, review_status, added_at, last_reviewed_at, next_review_at,
                retired, review_count, last_review_succeeded
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
            params![
                entry.user_id,
                entry.word,
                entry.context,
                entry.meaning,
                entry.example,
                entry.phonetic,
                entry.difficulty,
                entry.source.as_str(),
                entry.source_article_id,
                entry.review_status.as_str(),
                entry.added_at,
                entry.last_reviewed_at,
                entry.next_review_at,
                entry.retired,
                entry.review_count,
                entry.last_review_succeeded,
            ],
        )?;

        let mut stored = entry.clone();
        stored.id = conn.last_insert_rowid();
        Ok(stored)
    }

    fn insert_if_absent(&self, entry: &VocabularyEntry) -> Result<Option<VocabularyEntry>> {
        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT INTO vocabulary_entries (
                user_id, word, context, meaning, example, phonetic, difficulty, source,
                source_article_id, review_status, added_at, last_reviewed_at, next_review_at,
                retired, review_count, last_review_succeeded
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16
            WHERE NOT EXISTS (
                SELECT 1 FROM vocabulary_entries WHERE user_id = ?1 AND word = ?2 AND context = ?3
            )",
            params![
                entry.user_id,
                entry.word,
                entry.context,
                entry.meaning,
                entry.example,
                entry.phonetic,
                entry.difficulty,
                entry.source.as_str(),
                entry.source_article_id,
                entry.review_status.as_str(),
                entry.added_at,
                entry.last_reviewed_at,
                entry.next_review_at,
                entry.retired,
                entry.review_count,
                entry.last_review_succeeded,
            ],
        )?;

        if inserted == 0 {
            return Ok(None);
        }

        let mut stored = entry.clone();
        stored.id = conn.last_insert_rowid();
        Ok(Some(stored))
    }

    fn update_review(&self, update: &ReviewUpdate) -> Result<bool> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "UPDATE vocabulary_entries
             SET review_status = ?1,
                 next_review_at = ?2,
                 last_reviewed_at = ?3,
                 last_review_succeeded = ?4,
                 review_count = review_count + 1,
                 retired = 0
             WHERE id = ?5 AND user_id = ?6 AND review_status = ?7",
            params![
                update.status.as_str(),
                update.next_review_at,
                update.reviewed_at,
                update.succeeded,
                update.id,
                update.user_id,
                update.expected_status.as_str(),
            ],
        )?;
        Ok(affected > 0)
    }

    fn retire(&self, id: i64, next_review_at: NaiveDate) -> Result<bool> {
        let conn = self.conn()?;
        let affected = conn.execute(
            "UPDATE vocabulary_entries
             SET review_status = ?1, next_review_at = ?2, retired = 1
             WHERE id = ?3",
            params![ReviewStatus::Mastered.as_str(), next_review_at, id],
        )?;
        Ok(affected > 0)
    }

    fn count_by_user(&self, user_id: i64) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM vocabulary_entries WHERE user_id = ?1",
            params![user_id],
        )
    }

    fn count_by_status(&self, user_id: i64) -> Result<HashMap<ReviewStatus, u64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT review_status, COUNT(*) FROM vocabulary_entries
             WHERE user_id = ?1 GROUP BY review_status",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut counts = HashMap::new();
        for (status, count) in rows {
            match status.parse::<ReviewStatus>() {
                Ok(status) => *counts.entry(status).or_insert(0) += count.max(0) as u64,
                Err(e) => log::warn!("Skipping rows with {}", e),
            }
        }
        Ok(counts)
    }

    fn count_by_source(&self, user_id: i64) -> Result<HashMap<WordSource, u64>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT source, COUNT(*) FROM vocabulary_entries
             WHERE user_id = ?1 GROUP BY source",
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut counts = HashMap::new();
        for (source, count) in rows {
            match source.parse::<WordSource>() {
                Ok(source) => *counts.entry(source).or_insert(0) += count.max(0) as u64,
                Err(e) => log::warn!("Skipping rows with {}", e),
            }
        }
        Ok(counts)
    }

    fn count_added_since(&self, user_id: i64, date: NaiveDate) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM vocabulary_entries WHERE user_id = ?1 AND date(added_at) >= ?2",
            params![user_id, date],
        )
    }

    fn count_reviewed(&self, user_id: i64) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM vocabulary_entries
             WHERE user_id = ?1 AND last_reviewed_at IS NOT NULL",
            params![user_id],
        )
    }

    fn count_successful(&self, user_id: i64) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM vocabulary_entries
             WHERE user_id = ?1 AND last_reviewed_at IS NOT NULL AND last_review_succeeded = 1",
            params![user_id],
        )
    }

    fn count_due(&self, user_id: i64, cutoff: NaiveDate) -> Result<u64> {
        self.count(
            "SELECT COUNT(*) FROM vocabulary_entries
             WHERE user_id = ?1 AND retired = 0 AND next_review_at <= ?2",
            params![user_id, cutoff],
        )
    }

    fn list_due_for_user(&self, user_id: i64, cutoff: NaiveDate) -> Result<Vec<VocabularyEntry>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM vocabulary_entries
             WHERE user_id = ?1 AND retired = 0 AND next_review_at <= ?2
             ORDER BY next_review_at ASC, id ASC",
            ENTRY_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params![user_id, cutoff], entry_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(entries)
    }

    fn daily_added_counts(&self, user_id: i64, start: NaiveDate, end: NaiveDate) -> Result<Vec<(NaiveDate, u64)>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT date(added_at) AS day, COUNT(*) FROM vocabulary_entries
             WHERE user_id = ?1 AND date(added_at) >= ?2 AND date(added_at) <= ?3
             GROUP BY day ORDER BY day",
        )?;
        let rows = stmt
            .query_map(params![user_id, start, end], |row| {
                Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .map(|(day, count)| (day, count.max(0) as u64))
            .collect())
    }

    fn delete_duplicates(&self, user_id: Option<i64>) -> Result<usize> {
        let conn = self.conn()?;
        // A row goes if an earlier row (by added_at, then id) shares its key
        let deleted = conn.execute(
            "DELETE FROM vocabulary_entries
             WHERE (?1 IS NULL OR user_id = ?1)
               AND EXISTS (
                 SELECT 1 FROM vocabulary_entries AS earlier
                 WHERE earlier.user_id = vocabulary_entries.user_id
                   AND earlier.word = vocabulary_entries.word
                   AND earlier.context = vocabulary_entries.context
                   AND (earlier.added_at < vocabulary_entries.added_at
                        OR (earlier.added_at = vocabulary_entries.added_at
                            AND earlier.id < vocabulary_entries.id))
               )",
            params![user_id],
        )?;
        Ok(deleted)
    }
}

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<VocabularyEntry> {
    Ok(VocabularyEntry {
        id: row.get(0)?,
        user_id: row.get(1)?,
        word: row.get(2)?,
        context: row.get(3)?,
        meaning: row.get(4)?,
        example: row.get(5)?,
        phonetic: row.get(6)?,
        difficulty: row.get(7)?,
        source: parse_text_column(row, 8)?,
        source_article_id: row.get(9)?,
        review_status: parse_text_column(row, 10)?,
        added_at: row.get(11)?,
        last_reviewed_at: row.get(12)?,
        next_review_at: row.get(13)?,
        retired: row.get(14)?,
        review_count: row.get(15)?,
        last_review_succeeded: row.get(16)?,
    })
}

fn parse_text_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}
