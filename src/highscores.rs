//! Score store boundary
//!
//! Validates raw submissions, stamps them into records, and lists the
//! leaderboard (best score first, earliest first among equals). Storage is
//! behind the [`ScoreStore`] trait: memory everywhere, LocalStorage on wasm.

use std::error::Error;
use std::fmt;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::{MAX_LISTED_SCORES, MAX_NAME_LEN};

/// Why a submission was refused before reaching storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreRejection {
    /// Name was blank after trimming
    EmptyName,
    /// Name was missing or not a string
    InvalidName,
    /// Score was missing, non-numeric, negative or not finite
    InvalidScore,
    /// Payload was not a JSON object
    MalformedPayload,
}

impl fmt::Display for ScoreRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::InvalidName => write!(f, "name must be a string"),
            Self::InvalidScore => write!(f, "score must be a non-negative number"),
            Self::MalformedPayload => write!(f, "payload must be a JSON object"),
        }
    }
}

impl Error for ScoreRejection {}

/// Failures surfaced by a [`ScoreStore`]
#[derive(Debug)]
pub enum ScoreStoreError {
    Rejected(ScoreRejection),
    /// Backing storage unavailable or refused the write
    Storage(String),
    Serialization(serde_json::Error),
}

impl fmt::Display for ScoreStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected(reason) => write!(f, "invalid data: {reason}"),
            Self::Storage(msg) => write!(f, "score storage failed: {msg}"),
            Self::Serialization(e) => write!(f, "score records unreadable: {e}"),
        }
    }
}

impl Error for ScoreStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rejected(reason) => Some(reason),
            Self::Storage(_) => None,
            Self::Serialization(e) => Some(e),
        }
    }
}

impl From<ScoreRejection> for ScoreStoreError {
    fn from(reason: ScoreRejection) -> Self {
        Self::Rejected(reason)
    }
}

impl From<serde_json::Error> for ScoreStoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e)
    }
}

/// A validated submission: trimmed, length-capped name and whole score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSubmission {
    pub name: String,
    pub score: u64,
}

impl ScoreSubmission {
    /// Validate a typed submission
    pub fn new(name: &str, score: f64) -> Result<Self, ScoreRejection> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ScoreRejection::EmptyName);
        }
        if !score.is_finite() || score < 0.0 {
            return Err(ScoreRejection::InvalidScore);
        }

        Ok(Self {
            name: name.chars().take(MAX_NAME_LEN).collect(),
            score: score.floor() as u64,
        })
    }

    /// Validate a raw JSON body of the form `{"name": ..., "score": ...}`
    pub fn from_json(payload: &str) -> Result<Self, ScoreRejection> {
        let value: serde_json::Value =
            serde_json::from_str(payload).map_err(|_| ScoreRejection::MalformedPayload)?;
        let object = value.as_object().ok_or(ScoreRejection::MalformedPayload)?;

        let name = object
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or(ScoreRejection::InvalidName)?;
        let score = object
            .get("score")
            .and_then(|v| v.as_f64())
            .ok_or(ScoreRejection::InvalidScore)?;

        Self::new(name, score)
    }
}

/// A stored leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: String,
    pub name: String,
    pub score: u64,
    /// Unix timestamp (ms) when stored
    pub timestamp: f64,
}

/// Leaderboard order: score descending, then oldest first
pub fn sort_records(records: &mut [ScoreRecord]) {
    records.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.timestamp.total_cmp(&b.timestamp))
    });
}

/// Record id source: `<timestamp>_<7 base-36 chars>`
#[derive(Debug, Clone)]
pub struct RecordIds {
    rng: Pcg32,
}

impl RecordIds {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn next(&mut self, timestamp: f64) -> String {
        let suffix: String = (0..7)
            .map(|_| char::from_digit(self.rng.random_range(0..36), 36).unwrap_or('0'))
            .collect();
        format!("{}_{}", timestamp as u64, suffix)
    }
}

/// Persistence for player scores
pub trait ScoreStore {
    /// Every stored record, in storage order
    fn records(&self) -> Result<Vec<ScoreRecord>, ScoreStoreError>;

    /// Persist one record
    fn append(&mut self, record: ScoreRecord) -> Result<(), ScoreStoreError>;

    /// Id source for new records
    fn ids(&mut self) -> &mut RecordIds;

    /// Top records in leaderboard order
    fn list(&self) -> Result<Vec<ScoreRecord>, ScoreStoreError> {
        let mut records = self.records()?;
        sort_records(&mut records);
        records.truncate(MAX_LISTED_SCORES);
        Ok(records)
    }

    /// Validate and store a score, stamped with the current time
    fn submit(&mut self, name: &str, score: i64) -> Result<ScoreRecord, ScoreStoreError> {
        let submission = ScoreSubmission::new(name, score as f64)?;
        self.accept(submission, crate::platform::now_ms())
    }

    /// Store an already validated submission
    fn accept(
        &mut self,
        submission: ScoreSubmission,
        timestamp: f64,
    ) -> Result<ScoreRecord, ScoreStoreError> {
        let record = ScoreRecord {
            id: self.ids().next(timestamp),
            name: submission.name,
            score: submission.score,
            timestamp,
        };
        self.append(record.clone())?;
        log::info!("Score saved: {} - {}", record.name, record.score);
        Ok(record)
    }

    /// Leaderboard rank (1-indexed) a new `score` would take right now
    fn rank_for(&self, score: u64) -> Result<usize, ScoreStoreError> {
        let ahead = self.records()?.iter().filter(|r| r.score >= score).count();
        Ok(ahead + 1)
    }
}

/// Score store held in memory
#[derive(Debug, Clone)]
pub struct MemoryScoreStore {
    records: Vec<ScoreRecord>,
    ids: RecordIds,
}

impl Default for MemoryScoreStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::with_seed(crate::platform::now_ms() as u64)
    }

    /// Deterministic ids
    pub fn with_seed(seed: u64) -> Self {
        Self {
            records: Vec::new(),
            ids: RecordIds::new(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ScoreStore for MemoryScoreStore {
    fn records(&self) -> Result<Vec<ScoreRecord>, ScoreStoreError> {
        Ok(self.records.clone())
    }

    fn append(&mut self, record: ScoreRecord) -> Result<(), ScoreStoreError> {
        self.records.push(record);
        Ok(())
    }

    fn ids(&mut self) -> &mut RecordIds {
        &mut self.ids
    }
}

/// Score store persisted to LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
pub struct LocalScoreStore {
    ids: RecordIds,
}

#[cfg(target_arch = "wasm32")]
impl LocalScoreStore {
    const STORAGE_KEY: &'static str = "grid_invaders_scores";

    pub fn new() -> Self {
        Self {
            ids: RecordIds::new(js_sys::Date::now() as u64),
        }
    }

    fn storage() -> Result<web_sys::Storage, ScoreStoreError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| ScoreStoreError::Storage("LocalStorage unavailable".to_string()))
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreStore for LocalScoreStore {
    fn records(&self) -> Result<Vec<ScoreRecord>, ScoreStoreError> {
        let storage = Self::storage()?;
        match storage.get_item(Self::STORAGE_KEY) {
            Ok(Some(json)) => Ok(serde_json::from_str(&json)?),
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(ScoreStoreError::Storage(format!("{:?}", e))),
        }
    }

    fn append(&mut self, record: ScoreRecord) -> Result<(), ScoreStoreError> {
        let mut records = self.records()?;
        records.push(record);
        let json = serde_json::to_string(&records)?;
        Self::storage()?
            .set_item(Self::STORAGE_KEY, &json)
            .map_err(|e| ScoreStoreError::Storage(format!("{:?}", e)))?;
        log::info!("Scores saved ({} entries)", records.len());
        Ok(())
    }

    fn ids(&mut self) -> &mut RecordIds {
        &mut self.ids
    }
}
