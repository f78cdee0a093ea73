//! File-backed repositories.
//!
//! Workflows are YAML documents, repair suggestions are JSON documents. Both
//! repositories write through [`write_atomic`] so a crash mid-save never
//! leaves a truncated record behind.

pub mod suggestion_json;
pub mod workflow_yaml;

use std::path::Path;

pub use suggestion_json::JsonSuggestionRepository;
pub use workflow_yaml::YamlWorkflowRepository;

/// Write `contents` to `path` via a sibling temp file and a rename.
///
/// Creates parent directories if they don't exist.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    tokio::fs::write(&tmp, contents).await?;
    if let Err(err) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err);
    }
    Ok(())
}

/// Directory entries with one of `extensions`, sorted by file name.
///
/// A missing directory yields an empty list.
pub(crate) async fn list_files(
    dir: &Path,
    extensions: &[&str],
) -> std::io::Result<Vec<std::path::PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if matches && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_atomic_creates_parents_and_replaces() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("a.yaml");

        write_atomic(&path, b"first").await.unwrap();
        write_atomic(&path, b"second").await.unwrap();

        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), "second");
        assert!(!tmp.path().join("nested").join("a.yaml.tmp").exists());
    }

    #[tokio::test]
    async fn test_list_files_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        for name in ["b.yaml", "a.yml", "notes.txt", "c.yaml.tmp"] {
            tokio::fs::write(tmp.path().join(name), "").await.unwrap();
        }
        tokio::fs::create_dir(tmp.path().join("dir.yaml")).await.unwrap();

        let files = list_files(tmp.path(), &["yaml", "yml"]).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a.yml", "b.yaml"]);
    }

    #[tokio::test]
    async fn test_list_files_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let files = list_files(&tmp.path().join("absent"), &["json"]).await.unwrap();
        assert!(files.is_empty());
    }
}
