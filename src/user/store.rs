use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

/// A small persisted key-value map, written atomically on every change.
pub struct LocalStore {
    path: PathBuf,
    entries: RwLock<Map<String, Value>>,
}

impl LocalStore {
    pub async fn load(path: PathBuf) -> Result<Self, String> {
        let entries = if path.exists() {
            let data = tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| format!("failed to read local store: {}", err))?;
            if data.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&data)
                    .map_err(|err| format!("failed to parse local store: {}", err))?
            }
        } else {
            Map::new()
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, String> {
        let guard = self.entries.read().await;
        match guard.get(key) {
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|err| format!("failed to decode {}: {}", key, err)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), String> {
        let value = serde_json::to_value(value)
            .map_err(|err| format!("failed to encode {}: {}", key, err))?;
        let mut guard = self.entries.write().await;
        let mut next = guard.clone();
        next.insert(key.to_string(), value);
        self.persist(&next).await?;
        *guard = next;
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<bool, String> {
        let mut guard = self.entries.write().await;
        if !guard.contains_key(key) {
            return Ok(false);
        }
        let mut next = guard.clone();
        next.remove(key);
        self.persist(&next).await?;
        *guard = next;
        Ok(true)
    }

    async fn persist(&self, entries: &Map<String, Value>) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent).await?;
        }
        let payload = serde_json::to_string_pretty(entries)
            .map_err(|err| format!("failed to serialize local store: {}", err))?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, payload)
            .await
            .map_err(|err| format!("failed to write local store: {}", err))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|err| format!("failed to finalize local store: {}", err))?;
        Ok(())
    }
}

async fn ensure_dir(path: &Path) -> Result<(), String> {
    if path.as_os_str().is_empty() || path.exists() {
        return Ok(());
    }
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| format!("failed to create store dir: {}", err))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("local.json");

        let store = LocalStore::load(path.clone()).await.unwrap();
        store.set("cgg_user", &"dave").await.unwrap();

        let reloaded = LocalStore::load(path).await.unwrap();
        let value: Option<String> = reloaded.get("cgg_user").await.unwrap();
        assert_eq!(value.as_deref(), Some("dave"));
    }

    #[tokio::test]
    async fn remove_reports_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::load(dir.path().join("local.json")).await.unwrap();
        store.set("k", &1u32).await.unwrap();

        assert!(store.remove("k").await.unwrap());
        assert!(!store.remove("k").await.unwrap());
        let value: Option<u32> = store.get("k").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn failed_write_keeps_previous_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        let store = LocalStore::load(path.clone()).await.unwrap();
        store.set("k", &1u32).await.unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(store.set("k", &2u32).await.is_err());
        assert!(store.remove("k").await.is_err());
        let value: Option<u32> = store.get("k").await.unwrap();
        assert_eq!(value, Some(1));
    }

    #[tokio::test]
    async fn empty_file_loads_as_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "  \n").unwrap();
        let store = LocalStore::load(path).await.unwrap();
        let value: Option<String> = store.get("anything").await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = LocalStore::load(path).await.err().unwrap();
        assert!(err.starts_with("failed to parse local store"));
    }
}
