use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

/// Read and parse a JSON file. `Ok(None)` when the file does not exist.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read failed: {}", path.display())),
    };
    let value = serde_json::from_str(&content)
        .with_context(|| format!("parse failed: {}", path.display()))?;
    Ok(Some(value))
}

/// Write `value` as pretty JSON next to `path`, then rename over it.
///
/// Readers see either the previous file or the complete new one.
pub async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .await
            .with_context(|| format!("create dir failed: {}", dir.display()))?;
    }

    let content = serde_json::to_string_pretty(value).context("serialize failed")?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content)
        .await
        .with_context(|| format!("write temp file failed: {}", tmp_path.display()))?;

    fs::rename(&tmp_path, path).await.with_context(|| {
        format!(
            "rename temp file failed: {} -> {}",
            tmp_path.display(),
            path.display()
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_then_read_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/state.json");

        write_json_atomic(&path, &vec![1, 2, 3]).await.unwrap();
        let back: Option<Vec<i32>> = read_json(&path).await.unwrap();

        assert_eq!(back, Some(vec![1, 2, 3]));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let back: Option<Vec<i32>> = read_json(&dir.path().join("absent.json")).await.unwrap();
        assert_eq!(back, None);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let result: Result<Option<Vec<i32>>> = read_json(&path).await;
        assert!(result.is_err());
    }
}
