//! JSON self-healing records.
//!
//! Each suggestion is a pretty-printed JSON document named
//! `{workflow}_{step}_{YYYYmmdd_HHMMSS}.json`. Saving an existing key
//! overwrites it, which is how status changes are persisted.
//!
//! Failures are appended to `failures.jsonl` in the same directory, one
//! record per line.

use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use webpilot_core::repository::SuggestionRepository;
use webpilot_types::error::StoreError;
use webpilot_types::healing::{Failure, RepairSuggestion};

use super::{list_files, write_atomic};

pub const FAILURE_LOG: &str = "failures.jsonl";

pub struct JsonSuggestionRepository {
    dir: PathBuf,
    append_lock: Mutex<()>,
}

impl JsonSuggestionRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            append_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, suggestion: &RepairSuggestion) -> PathBuf {
        self.dir.join(format!("{}.json", suggestion.record_key()))
    }
}

impl SuggestionRepository for JsonSuggestionRepository {
    async fn save(&self, suggestion: &RepairSuggestion) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(suggestion)
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        write_atomic(&self.path_for(suggestion), &json).await?;
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<RepairSuggestion>, StoreError> {
        let files = list_files(&self.dir, &["json"]).await?;

        let mut suggestions = Vec::with_capacity(files.len());
        for path in files {
            let parsed = match tokio::fs::read(&path).await {
                Ok(bytes) => serde_json::from_slice::<RepairSuggestion>(&bytes)
                    .map_err(|e| StoreError::Parse(e.to_string())),
                Err(err) => Err(err.into()),
            };
            match parsed {
                Ok(suggestion) => suggestions.push(suggestion),
                Err(error) => {
                    tracing::warn!(?path, %error, "skipping unparseable repair suggestion");
                }
            }
        }
        Ok(suggestions)
    }

    async fn append_failure(&self, failure: &Failure) -> Result<(), StoreError> {
        let mut line =
            serde_json::to_vec(failure).map_err(|e| StoreError::Parse(e.to_string()))?;
        line.push(b'\n');

        let _guard = self.append_lock.lock().await;
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(FAILURE_LOG))
            .await?;
        file.write_all(&line).await?;
        file.flush().await?;
        Ok(())
    }

    async fn load_failures(&self) -> Result<Vec<Failure>, StoreError> {
        let path = self.dir.join(FAILURE_LOG);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut failures = Vec::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Failure>(line) {
                Ok(failure) => failures.push(failure),
                Err(error) => {
                    tracing::warn!(?path, line = number + 1, %error, "skipping unparseable failure record");
                }
            }
        }
        Ok(failures)
    }
}
