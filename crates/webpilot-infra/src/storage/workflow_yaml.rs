//! YAML workflow repository.
//!
//! One document per workflow under a single directory. On load, every
//! `*.yaml` / `*.yml` file is parsed; files that fail to parse are skipped
//! with a warning. A document without a `name` takes its file stem.
//!
//! The repository remembers which file each workflow came from, so saving a
//! loaded workflow overwrites its original file even when the file name and
//! the workflow name differ. New workflows are written to `{name}.yaml`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use webpilot_core::repository::WorkflowRepository;
use webpilot_types::error::StoreError;
use webpilot_types::workflow::WorkflowSpec;

use super::{list_files, write_atomic};

pub struct YamlWorkflowRepository {
    dir: PathBuf,
    paths: RwLock<HashMap<String, PathBuf>>,
}

impl YamlWorkflowRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            paths: RwLock::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        let known = self
            .paths
            .read()
            .ok()
            .and_then(|paths| paths.get(name).cloned());
        known.unwrap_or_else(|| self.dir.join(format!("{name}.yaml")))
    }

    fn remember(&self, name: &str, path: PathBuf) {
        if let Ok(mut paths) = self.paths.write() {
            paths.entry(name.to_string()).or_insert(path);
        }
    }
}

/// Parse a workflow document, filling a missing name from the file stem.
pub fn parse_workflow_file(path: &Path, content: &str) -> Result<WorkflowSpec, StoreError> {
    let mut spec: WorkflowSpec =
        serde_yaml_ng::from_str(content).map_err(|e| StoreError::Parse(e.to_string()))?;
    if spec.name.trim().is_empty() {
        spec.name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
    }
    WorkflowSpec::validate_name(&spec.name).map_err(StoreError::InvalidName)?;
    Ok(spec)
}

pub fn serialize_workflow(spec: &WorkflowSpec) -> Result<String, StoreError> {
    serde_yaml_ng::to_string(spec).map_err(|e| StoreError::Parse(e.to_string()))
}

impl WorkflowRepository for YamlWorkflowRepository {
    async fn load_all(&self) -> Result<Vec<WorkflowSpec>, StoreError> {
        let files = list_files(&self.dir, &["yaml", "yml"]).await?;

        let mut specs = Vec::with_capacity(files.len());
        for path in files {
            let parsed = match tokio::fs::read_to_string(&path).await {
                Ok(content) => parse_workflow_file(&path, &content),
                Err(err) => Err(err.into()),
            };
            match parsed {
                Ok(spec) => {
                    self.remember(&spec.name, path);
                    specs.push(spec);
                }
                Err(error) => {
                    tracing::warn!(?path, %error, "skipping unparseable workflow file");
                }
            }
        }

        tracing::debug!(dir = %self.dir.display(), count = specs.len(), "loaded workflow files");
        Ok(specs)
    }

    async fn save(&self, spec: &WorkflowSpec) -> Result<(), StoreError> {
        WorkflowSpec::validate_name(&spec.name).map_err(StoreError::InvalidName)?;
        let yaml = serialize_workflow(spec)?;
        let path = self.path_for(&spec.name);
        write_atomic(&path, yaml.as_bytes()).await?;
        self.remember(&spec.name, path);
        Ok(())
    }
}
