use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::TokenStore;
use crate::common::CredentialRecord;
use crate::error::BridgeError;

type Table = HashMap<String, CredentialRecord>;

/// Stores every identity's record in a single JSON file.
///
/// The file is read once, on first access, and cached. Each mutation rewrites
/// the whole table to a temporary file and renames it into place; the cache
/// only changes after that succeeds.
pub struct FileTokenStore {
    path: PathBuf,
    table: Mutex<Option<Table>>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: Mutex::new(None),
        }
    }

    /// `<data dir>/asana-bridge/tokens.json`, falling back to the working directory.
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .map(|dir| dir.join("asana-bridge"))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tokens.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Table, BridgeError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(json) if json.trim().is_empty() => Ok(Table::new()),
            Ok(json) => serde_json::from_str(&json).map_err(|e| {
                BridgeError::Storage(format!(
                    "Failed to parse token file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Table::new()),
            Err(e) => Err(BridgeError::Storage(format!(
                "Failed to read token file {}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn persist(&self, table: &Table) -> Result<(), BridgeError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    BridgeError::Storage(format!("Failed to create token directory: {}", e))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(table)?;
        let tmp_name = format!(
            "{}.{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id()
        );
        let tmp_path = self.path.with_file_name(tmp_name);

        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to write tokens: {}", e)))?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| {
                    BridgeError::Storage(format!("Failed to set file permissions: {}", e))
                })?;
        }

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| BridgeError::Storage(format!("Failed to replace token file: {}", e)))?;

        Ok(())
    }

    /// Applies `mutate` to a copy of the table, persists it, then swaps it in.
    async fn update<F>(&self, mutate: F) -> Result<(), BridgeError>
    where
        F: FnOnce(&mut Table),
    {
        let mut guard = self.table.lock().await;
        let mut next = match guard.as_ref() {
            Some(table) => table.clone(),
            None => self.load().await?,
        };
        mutate(&mut next);
        self.persist(&next).await?;
        *guard = Some(next);
        Ok(())
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, user_id: &str) -> Result<Option<CredentialRecord>, BridgeError> {
        let mut guard = self.table.lock().await;
        if guard.is_none() {
            let table = self.load().await?;
            tracing::debug!(path = %self.path.display(), records = table.len(), "Loaded token file");
            *guard = Some(table);
        }
        Ok(guard
            .as_ref()
            .and_then(|table| table.get(user_id))
            .cloned())
    }

    async fn set(&self, user_id: &str, record: CredentialRecord) -> Result<(), BridgeError> {
        self.update(|table| {
            table.insert(user_id.to_string(), record);
        })
        .await
    }

    async fn delete(&self, user_id: &str) -> Result<(), BridgeError> {
        self.update(|table| {
            table.remove(user_id);
        })
        .await
    }
}
