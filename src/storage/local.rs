//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── metadata_YYYY.csv     # Append-only CSV, header written once
//! ├── metadata_YYYY.json    # Whole-array JSON, rewritten per append
//! └── YYYY/
//!     └── *.pdf
//! ```
//!
//! JSON rewrites go through a temporary file and a rename, so a crash
//! mid-write never leaves a truncated array behind.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::PaperMetadata;
use crate::storage::MetadataSink;

/// Parse a year's JSON store.
///
/// A usable store is an array whose entries are all objects with a string
/// `title`; anything else is an error. Extra fields are kept as-is.
fn parse_store(bytes: &[u8]) -> std::result::Result<Vec<Value>, String> {
    let records: Vec<Value> = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
    if let Some(index) = records.iter().position(|r| stored_title(r).is_none()) {
        return Err(format!("entry {index} has no title"));
    }
    Ok(records)
}

fn stored_title(record: &Value) -> Option<&str> {
    record.get("title").and_then(Value::as_str)
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    /// Path of the CSV store for a year.
    pub fn csv_path(&self, year: i32) -> PathBuf {
        self.root_dir.join(format!("metadata_{year}.csv"))
    }

    /// Path of the JSON store for a year.
    pub fn json_path(&self, year: i32) -> PathBuf {
        self.root_dir.join(format!("metadata_{year}.json"))
    }

    /// Create the root directory if it is missing.
    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root_dir)
            .await
            .map_err(|e| AppError::environment(&self.root_dir, e))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let tmp = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(path, &bytes).await
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Append one CSV row, writing the header only when the file is new.
    ///
    /// Returns the length of the file before the append, or `None` if the
    /// append created it, so the row can be taken back with [`Self::rollback_csv`].
    async fn append_csv(&self, record: &PaperMetadata) -> Result<Option<u64>> {
        let path = self.csv_path(record.year);
        let previous_len = match tokio::fs::metadata(&path).await {
            Ok(meta) => Some(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut writer = csv::WriterBuilder::new()
            .has_headers(previous_len.is_none())
            .from_writer(Vec::new());
        writer.serialize(record)?;
        let row = writer
            .into_inner()
            .map_err(|e| AppError::Io(e.into_error()))?;

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(&row).await?;
        file.flush().await?;

        log::info!("Metadata saved to CSV: {}", path.display());
        Ok(previous_len)
    }

    /// Undo an [`Self::append_csv`] whose record never reached the JSON store.
    async fn rollback_csv(&self, year: i32, previous_len: Option<u64>) {
        let path = self.csv_path(year);
        let result = match previous_len {
            None => tokio::fs::remove_file(&path).await,
            Some(len) => match tokio::fs::OpenOptions::new().write(true).open(&path).await {
                Ok(file) => file.set_len(len).await,
                Err(e) => Err(e),
            },
        };
        if let Err(e) = result {
            log::warn!("Could not roll back CSV row in {}: {e}", path.display());
        }
    }

    /// Append one record to the JSON array, rewriting the whole file.
    ///
    /// A store that [`parse_store`] rejects is moved aside to
    /// `metadata_YYYY.json.corrupt` (numbered if that name is taken) and a
    /// new array is started.
    async fn append_json(&self, record: &PaperMetadata) -> Result<()> {
        let path = self.json_path(record.year);

        let mut records = match self.read_bytes(&path).await? {
            None => Vec::new(),
            Some(bytes) => match parse_store(&bytes) {
                Ok(records) => records,
                Err(e) => {
                    let aside = corrupt_path(&path).await;
                    log::warn!(
                        "Metadata store {} is malformed ({e}); moving it to {}",
                        path.display(),
                        aside.display()
                    );
                    tokio::fs::rename(&path, &aside).await?;
                    Vec::new()
                }
            },
        };

        records.push(serde_json::to_value(record)?);
        self.write_json(&path, &records).await?;

        log::info!("Metadata saved to JSON: {}", path.display());
        Ok(())
    }

    /// All records of a year's JSON store. Missing store yields no records.
    pub async fn load_records(&self, year: i32) -> Result<Vec<PaperMetadata>> {
        match self.read_bytes(&self.json_path(year)).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => Ok(Vec::new()),
        }
    }

    /// Number of PDF files in a year's folder.
    pub async fn count_pdfs(&self, year: i32) -> Result<usize> {
        let dir = self.root_dir.join(year.to_string());
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut count = 0;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().is_some_and(|ext| ext == "pdf") {
                count += 1;
            }
        }
        Ok(count)
    }
}

/// First free backup name for a malformed store.
async fn corrupt_path(path: &Path) -> PathBuf {
    let mut candidate = path.with_extension("json.corrupt");
    let mut n = 1;
    while tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
        candidate = path.with_extension(format!("json.corrupt.{n}"));
        n += 1;
    }
    candidate
}

#[async_trait]
impl MetadataSink for LocalStorage {
    async fn append(&self, record: &PaperMetadata) -> Result<()> {
        self.ensure_root().await?;
        let previous_len = self.append_csv(record).await?;
        if let Err(e) = self.append_json(record).await {
            self.rollback_csv(record.year, previous_len).await;
            return Err(e);
        }
        Ok(())
    }

    async fn load_processed(&self, year: i32) -> HashSet<String> {
        let path = self.json_path(year);
        let bytes = match self.read_bytes(&path).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return HashSet::new(),
            Err(e) => {
                log::warn!("Could not read {}: {e}; treating as empty", path.display());
                return HashSet::new();
            }
        };

        match parse_store(&bytes) {
            Ok(records) => records
                .iter()
                .filter_map(stored_title)
                .map(str::to_string)
                .collect(),
            Err(e) => {
                log::warn!(
                    "Metadata store {} is malformed ({e}); treating as empty",
                    path.display()
                );
                HashSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(year: i32, title: &str) -> PaperMetadata {
        PaperMetadata {
            year,
            title: title.to_string(),
            authors: "Ada Lovelace, Alan Turing".to_string(),
            abstract_text: "We study, \"quoted\" things.".to_string(),
            pdf_url: "https://papers.nips.cc/x-Paper.pdf".to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let path = tmp.path().join("test.json");

        storage.write_bytes(&path, b"[]").await.unwrap();
        let data = storage.read_bytes(&path).await.unwrap();
        assert_eq!(data, Some(b"[]".to_vec()));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let data = storage.read_bytes(&tmp.path().join("nope")).await.unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn test_append_creates_both_stores() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path().join("out"));

        storage.append(&record(2020, "First")).await.unwrap();
        storage.append(&record(2020, "Second")).await.unwrap();

        let csv = std::fs::read_to_string(storage.csv_path(2020)).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("year,title,authors,abstract,pdf_url"));
        assert_eq!(csv.matches("year,title").count(), 1);

        let mut reader = csv::Reader::from_path(storage.csv_path(2020)).unwrap();
        let rows: Vec<PaperMetadata> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows, vec![record(2020, "First"), record(2020, "Second")]);

        let records = storage.load_records(2020).await.unwrap();
        assert_eq!(records, vec![record(2020, "First"), record(2020, "Second")]);
    }

    #[tokio::test]
    async fn test_years_are_kept_apart() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.append(&record(2020, "A")).await.unwrap();
        storage.append(&record(2022, "B")).await.unwrap();

        assert_eq!(
            storage.load_processed(2020).await,
            HashSet::from(["A".to_string()])
        );
        assert_eq!(
            storage.load_processed(2022).await,
            HashSet::from(["B".to_string()])
        );
    }

    #[tokio::test]
    async fn test_load_processed_missing_store() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        assert!(storage.load_processed(2019).await.is_empty());
    }

    #[tokio::test]
    async fn test_load_processed_malformed_store() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        std::fs::write(storage.json_path(2019), b"[{\"title\": \"A\"},").unwrap();

        assert!(storage.load_processed(2019).await.is_empty());
    }

    #[tokio::test]
    async fn test_append_moves_corrupt_store_aside() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        std::fs::write(storage.json_path(2019), b"not json").unwrap();

        storage.append(&record(2019, "Fresh")).await.unwrap();

        let aside = tmp.path().join("metadata_2019.json.corrupt");
        assert_eq!(std::fs::read(aside).unwrap(), b"not json");
        assert_eq!(
            storage.load_records(2019).await.unwrap(),
            vec![record(2019, "Fresh")]
        );
    }

    #[tokio::test]
    async fn test_store_without_titles_is_moved_aside() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        std::fs::write(storage.json_path(2020), b"[{\"year\":2020}]").unwrap();

        for _ in 0..3 {
            if !storage.load_processed(2020).await.contains("Paper") {
                storage.append(&record(2020, "Paper")).await.unwrap();
            }
        }

        assert_eq!(
            storage.load_records(2020).await.unwrap(),
            vec![record(2020, "Paper")]
        );
        let aside = tmp.path().join("metadata_2020.json.corrupt");
        assert_eq!(std::fs::read(aside).unwrap(), b"[{\"year\":2020}]");
    }

    #[tokio::test]
    async fn test_extra_fields_survive_append() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        std::fs::write(
            storage.json_path(2020),
            b"[{\"title\":\"Old\",\"venue\":\"NeurIPS\"}]",
        )
        .unwrap();

        storage.append(&record(2020, "New")).await.unwrap();

        let raw: Vec<Value> =
            serde_json::from_slice(&std::fs::read(storage.json_path(2020)).unwrap()).unwrap();
        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0]["venue"], "NeurIPS");
        assert!(!tmp.path().join("metadata_2020.json.corrupt").exists());
    }

    #[tokio::test]
    async fn test_second_corruption_keeps_first_backup() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        std::fs::write(storage.json_path(2019), b"first").unwrap();
        storage.append(&record(2019, "A")).await.unwrap();
        std::fs::write(storage.json_path(2019), b"second").unwrap();
        storage.append(&record(2019, "B")).await.unwrap();

        assert_eq!(
            std::fs::read(tmp.path().join("metadata_2019.json.corrupt")).unwrap(),
            b"first"
        );
        assert_eq!(
            std::fs::read(tmp.path().join("metadata_2019.json.corrupt.1")).unwrap(),
            b"second"
        );
        assert_eq!(
            storage.load_records(2019).await.unwrap(),
            vec![record(2019, "B")]
        );
    }

    #[tokio::test]
    async fn test_failed_json_write_leaves_no_csv_row() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        std::fs::create_dir(storage.json_path(2020)).unwrap();

        for _ in 0..3 {
            if !storage.load_processed(2020).await.contains("Paper") {
                assert!(storage.append(&record(2020, "Paper")).await.is_err());
            }
        }
        assert!(!storage.csv_path(2020).exists());
    }

    #[tokio::test]
    async fn test_failed_json_write_keeps_earlier_csv_rows() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.append(&record(2020, "Kept")).await.unwrap();
        let before = std::fs::read(storage.csv_path(2020)).unwrap();

        std::fs::remove_file(storage.json_path(2020)).unwrap();
        std::fs::create_dir(storage.json_path(2020)).unwrap();
        assert!(storage.append(&record(2020, "Lost")).await.is_err());

        assert_eq!(std::fs::read(storage.csv_path(2020)).unwrap(), before);
    }

    #[tokio::test]
    async fn test_append_fails_when_root_is_a_file() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("occupied");
        std::fs::write(&root, b"").unwrap();
        let storage = LocalStorage::new(&root);

        let err = storage.append(&record(2020, "A")).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_count_pdfs() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        assert_eq!(storage.count_pdfs(2020).await.unwrap(), 0);

        let dir = tmp.path().join("2020");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("a.pdf"), b"%PDF").unwrap();
        std::fs::write(dir.join("b.pdf.part"), b"%PD").unwrap();
        assert_eq!(storage.count_pdfs(2020).await.unwrap(), 1);
    }
}
