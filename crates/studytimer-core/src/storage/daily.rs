//! Per-day study ledger stored as a single JSON document.
//!
//! The file maps `YYYY-MM-DD` keys to a [`DailyRecord`]:
//!
//! ```json
//! {
//!   "2025-03-14": {
//!     "session_count": 2.4,
//!     "total_study_time": 60.0,
//!     "last_updated": "2025-03-14T21:04:10.512"
//!   }
//! }
//! ```
//!
//! Saving is read-merge-write over the whole document, so other dates (even
//! ones this version cannot parse) survive every write. The new document is
//! written to a sibling temp file and renamed over the old one.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StorageError;

pub const DATA_FILE: &str = "data.json";

/// Aggregate of one calendar day.
///
/// The two counters are independent ledgers: durations may change between
/// sessions, so neither can be derived from the other.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// Whole sessions plus fractional partial credit.
    #[serde(rename = "session_count", alias = "completedSessions", default)]
    pub completed_sessions: f64,
    #[serde(rename = "total_study_time", alias = "totalStudyMinutes", default)]
    pub total_study_minutes: f64,
    #[serde(
        rename = "last_updated",
        alias = "lastUpdated",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_updated: Option<NaiveDateTime>,
}

impl DailyRecord {
    pub fn touch(&mut self) {
        self.last_updated = Some(Local::now().naive_local());
    }
}

/// Ledger key for `date`.
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// JSON-file backed ledger of [`DailyRecord`]s.
#[derive(Debug, Clone)]
pub struct DailyStore {
    path: PathBuf,
}

impl DailyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record for `date`, or a zeroed one when missing, unreadable or corrupt.
    pub fn load(&self, date: NaiveDate) -> DailyRecord {
        match self.try_load(date) {
            Ok(Some(record)) => {
                info!(
                    "Loaded {}: {:.2} sessions, {:.2} minutes",
                    date_key(date),
                    record.completed_sessions,
                    record.total_study_minutes
                );
                record
            }
            Ok(None) => {
                info!("No data for {}, starting fresh", date_key(date));
                DailyRecord::default()
            }
            Err(err) => {
                warn!("Ignoring stored data for {}: {err}", date_key(date));
                DailyRecord::default()
            }
        }
    }

    pub fn try_load(&self, date: NaiveDate) -> Result<Option<DailyRecord>, StorageError> {
        let Some(document) = self.read_document()? else {
            return Ok(None);
        };
        match document.get(&date_key(date)) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|source| self.corrupt(source)),
            None => Ok(None),
        }
    }

    /// Every parseable record, keyed by date string.
    pub fn load_all(&self) -> Result<BTreeMap<String, DailyRecord>, StorageError> {
        let mut records = BTreeMap::new();
        for (key, value) in self.read_document()?.unwrap_or_default() {
            match serde_json::from_value::<DailyRecord>(value) {
                Ok(record) => {
                    records.insert(key, record);
                }
                Err(err) => warn!("Skipping unreadable entry '{key}': {err}"),
            }
        }
        Ok(records)
    }

    /// Merge `record` under `date` into the ledger, keeping every other date.
    pub fn save(&self, date: NaiveDate, record: &DailyRecord) -> Result<(), StorageError> {
        let mut document = match self.read_document() {
            Ok(document) => document.unwrap_or_default(),
            Err(err @ (StorageError::Corrupt { .. } | StorageError::NotAnObject { .. })) => {
                warn!("{err}; starting a new ledger");
                self.quarantine()?;
                Map::new()
            }
            Err(err) => return Err(err),
        };

        document.insert(date_key(date), serde_json::to_value(record)?);
        let contents = serde_json::to_string_pretty(&Value::Object(document))?;
        self.write_atomic(&contents)?;
        debug!(
            "Saved {}: {:.2} sessions, {:.2} minutes",
            date_key(date),
            record.completed_sessions,
            record.total_study_minutes
        );
        Ok(())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn read_document(&self) -> Result<Option<Map<String, Value>>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        // An empty file is what an interrupted first write leaves behind.
        if contents.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<Value>(&contents).map_err(|source| self.corrupt(source))? {
            Value::Object(document) => Ok(Some(document)),
            _ => Err(StorageError::NotAnObject {
                path: self.path.clone(),
            }),
        }
    }

    fn write_atomic(&self, contents: &str) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let tmp = self.sibling("tmp");
        fs::write(&tmp, contents).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }

    /// Move an unparseable ledger aside so its contents are not lost.
    ///
    /// Earlier quarantined copies are never overwritten. If the move fails
    /// the ledger stays in place and the caller must not write over it.
    fn quarantine(&self) -> Result<PathBuf, StorageError> {
        let stamp = Local::now().format("%Y%m%dT%H%M%S").to_string();
        let mut target = self.sibling(&format!("corrupt-{stamp}"));
        let mut attempt = 1;
        while target.exists() {
            target = self.sibling(&format!("corrupt-{stamp}-{attempt}"));
            attempt += 1;
        }
        fs::rename(&self.path, &target).map_err(|source| StorageError::Quarantine {
            path: self.path.clone(),
            source,
        })?;
        warn!("Moved unreadable ledger to {}", target.display());
        Ok(target)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DATA_FILE.into());
        name.push(".");
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn corrupt(&self, source: serde_json::Error) -> StorageError {
        StorageError::Corrupt {
            path: self.path.clone(),
            source,
        }
    }
}
