use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use hp_core::auth::AuthTokens;
use hp_core::ports::AuthTokenPort;
use tokio::fs;

use crate::fs::{read_json, write_json_atomic};

/// Access/refresh tokens in a JSON file (`auth.json`).
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AuthTokenPort for FileTokenStore {
    async fn load(&self) -> Result<Option<AuthTokens>> {
        read_json(&self.path).await
    }

    async fn save(&self, tokens: &AuthTokens) -> Result<()> {
        write_json_atomic(&self.path, tokens).await
    }

    async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove failed: {}", self.path.display())),
        }
    }
}
