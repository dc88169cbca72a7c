//! CSV snapshots of the expense table
//!
//! Snapshots are named `expenses_<YYYYMMDD_HHMMSS>.csv` (UTC) and hold one
//! row per expense under the header `Date,Amount,Category,Description`,
//! newest first. Because the timestamp is in the name, sorting filenames
//! sorts snapshots by age.

use crate::core::time::parse_timestamp;
use crate::core::{BackupError, NewExpense, StorageError};
use crate::storage::ExpenseStore;
use crate::storage::expenses::{delete_all_with, insert_with};
use chrono::{NaiveDateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

const FILE_PREFIX: &str = "expenses_";
const FILE_SUFFIX: &str = ".csv";
const STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const HEADER: [&str; 4] = ["Date", "Amount", "Category", "Description"];

/// Metadata about a snapshot file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotInfo {
    pub filename: String,
    pub path: PathBuf,
    /// Timestamp encoded in the filename (UTC)
    pub created_at: NaiveDateTime,
    pub size_bytes: u64,
}

/// Writes, lists and restores expense snapshots
#[derive(Debug, Clone)]
pub struct BackupService {
    exports_dir: PathBuf,
    expenses: ExpenseStore,
}

impl BackupService {
    pub fn new(exports_dir: impl Into<PathBuf>, expenses: ExpenseStore) -> Self {
        Self {
            exports_dir: exports_dir.into(),
            expenses,
        }
    }

    pub fn exports_dir(&self) -> &Path {
        &self.exports_dir
    }

    /// Write a snapshot of every expense and return its metadata
    pub async fn export(&self) -> Result<SnapshotInfo, BackupError> {
        tokio::fs::create_dir_all(&self.exports_dir).await?;

        let rows = self.expenses.all_by_date_desc().await?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(HEADER)?;
        for expense in &rows {
            writer.write_record([
                expense.date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                expense.amount.to_string(),
                expense.category.clone(),
                expense.description.clone(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| BackupError::Io(e.into_error()))?;

        let filename = format!(
            "{FILE_PREFIX}{}{FILE_SUFFIX}",
            Utc::now().format(STAMP_FORMAT)
        );
        let path = self.exports_dir.join(&filename);
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(path = %path.display(), rows = rows.len(), "snapshot written");
        snapshot_info(path)
            .await?
            .ok_or_else(|| BackupError::NoSnapshot(self.exports_dir.display().to_string()))
    }

    /// All snapshots, newest first
    pub async fn list(&self) -> Result<Vec<SnapshotInfo>, BackupError> {
        let mut entries = match tokio::fs::read_dir(&self.exports_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut snapshots = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(info) = snapshot_info(entry.path()).await? {
                snapshots.push(info);
            }
        }
        snapshots.sort_by(|a, b| b.filename.cmp(&a.filename));
        Ok(snapshots)
    }

    /// Newest snapshot, if any
    pub async fn latest(&self) -> Result<Option<SnapshotInfo>, BackupError> {
        Ok(self.list().await?.into_iter().next())
    }

    /// Replace every expense with the rows of a snapshot
    ///
    /// The file is parsed completely before the table is touched, and the
    /// swap runs in one transaction. Returns the number of restored rows.
    pub async fn restore(&self, path: impl AsRef<Path>) -> Result<usize, BackupError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let rows = parse_snapshot(&bytes)?;

        let mut tx = self
            .expenses
            .pool()
            .begin()
            .await
            .map_err(StorageError::from)?;
        let removed = delete_all_with(&mut *tx).await?;
        for row in &rows {
            insert_with(&mut *tx, row).await?;
        }
        tx.commit().await.map_err(StorageError::from)?;

        tracing::info!(
            path = %path.display(),
            removed,
            restored = rows.len(),
            "snapshot restored"
        );
        Ok(rows.len())
    }
}

async fn snapshot_info(path: PathBuf) -> Result<Option<SnapshotInfo>, BackupError> {
    let Some(filename) = path.file_name().and_then(|name| name.to_str()) else {
        return Ok(None);
    };
    let Some(stamp) = filename
        .strip_prefix(FILE_PREFIX)
        .and_then(|rest| rest.strip_suffix(FILE_SUFFIX))
    else {
        return Ok(None);
    };
    let Ok(created_at) = NaiveDateTime::parse_from_str(stamp, STAMP_FORMAT) else {
        return Ok(None);
    };
    let filename = filename.to_string();

    let metadata = tokio::fs::metadata(&path).await?;
    if !metadata.is_file() {
        return Ok(None);
    }

    Ok(Some(SnapshotInfo {
        filename,
        created_at,
        size_bytes: metadata.len(),
        path,
    }))
}

fn parse_snapshot(bytes: &[u8]) -> Result<Vec<NewExpense>, BackupError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader.headers()?.clone();
    let matches_header = headers.len() == HEADER.len()
        && headers
            .iter()
            .zip(HEADER)
            .all(|(found, expected)| found.eq_ignore_ascii_case(expected));
    if !matches_header {
        return Err(BackupError::InvalidRow {
            line: 1,
            message: format!("expected header {}", HEADER.join(",")),
        });
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let invalid = |message: String| BackupError::InvalidRow { line, message };

        let date = record
            .get(0)
            .and_then(parse_timestamp)
            .ok_or_else(|| invalid("invalid date".to_string()))?;
        let amount = record
            .get(1)
            .and_then(|raw| raw.parse::<f64>().ok())
            .filter(|amount| amount.is_finite())
            .ok_or_else(|| invalid("invalid amount".to_string()))?;
        let category = record.get(2).unwrap_or_default();
        let description = record.get(3).unwrap_or_default();
        if category.is_empty() || description.is_empty() {
            return Err(invalid("category and description are required".to_string()));
        }

        rows.push(NewExpense::new(amount, category, description, date));
    }
    Ok(rows)
}
