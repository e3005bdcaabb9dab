use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use study_core::model::{TestResult, UserIdentity};

use crate::repository::{HistoryRepository, ResultRecord, StorageError};

const DOCUMENT_PREFIX: &str = "test_results_";
const DOCUMENT_SUFFIX: &str = ".json";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FsInitError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Filesystem-backed history store: one JSON document per identity.
///
/// Documents are named `test_results_<identity>.json`, the same keying the
/// production object store uses, so a directory of exported blobs can be
/// pointed at directly. Appending rewrites the identity's whole document.
///
/// Read policy for damaged data: a record that fails schema validation is
/// skipped with a warning, and an unparseable document is treated as empty
/// history. A subsequent append therefore persists only the records that
/// validated.
#[derive(Debug, Clone)]
pub struct FsHistoryStore {
    root: PathBuf,
}

impl FsHistoryStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `FsInitError` if the directory cannot be created.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, FsInitError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, identity: &UserIdentity) -> PathBuf {
        self.root
            .join(format!("{DOCUMENT_PREFIX}{identity}{DOCUMENT_SUFFIX}"))
    }

    async fn read_records(
        &self,
        identity: &UserIdentity,
    ) -> Result<Vec<ResultRecord>, StorageError> {
        let path = self.document_path(identity);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StorageError::Unavailable(e.to_string())),
        };

        let raw: Vec<serde_json::Value> = match serde_json::from_str(&contents) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(identity = %identity, error = %e, "unparseable history document, treating as empty");
                return Ok(Vec::new());
            }
        };

        let mut records = Vec::with_capacity(raw.len());
        for value in raw {
            match serde_json::from_value::<ResultRecord>(value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(identity = %identity, error = %e, "skipping malformed result record");
                }
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl HistoryRepository for FsHistoryStore {
    async fn append_result(
        &self,
        identity: &UserIdentity,
        result: &TestResult,
    ) -> Result<(), StorageError> {
        let mut records = self.read_records(identity).await?;
        records.push(ResultRecord::from_result(result));

        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        tokio::fs::write(self.document_path(identity), json)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))
    }

    async fn load_history(
        &self,
        identity: &UserIdentity,
    ) -> Result<Vec<TestResult>, StorageError> {
        let records = self.read_records(identity).await?;
        let mut history = Vec::with_capacity(records.len());
        for record in records {
            match record.into_result() {
                Ok(result) => history.push(result),
                Err(e) => {
                    warn!(identity = %identity, error = %e, "skipping invalid result record");
                }
            }
        }
        Ok(history)
    }

    async fn list_identities(&self) -> Result<Vec<UserIdentity>, StorageError> {
        let mut entries = tokio::fs::read_dir(&self.root)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;

        let mut identities = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stem) = name
                .strip_prefix(DOCUMENT_PREFIX)
                .and_then(|rest| rest.strip_suffix(DOCUMENT_SUFFIX))
            else {
                continue;
            };
            if let Ok(identity) = UserIdentity::new(stem) {
                identities.push(identity);
            }
        }

        identities.sort();
        Ok(identities)
    }
}
