// ABOUTME: Filesystem storage driver: one JSON map file per namespace.
// ABOUTME: Writes use atomic tmp-file + fsync + rename so a crash never leaves a torn file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::driver::{Namespace, StorageDriver};
use crate::error::StoreError;

/// Storage driver rooted at a directory. Each application gets a
/// subdirectory and each namespace within it is a single JSON object file,
/// `<root>/<application>/<namespace>.json`, mapping entity keys to their
/// serialized values. Application and namespace names must be valid path
/// components.
#[derive(Clone)]
pub struct FsDriver {
    root: PathBuf,
}

impl FsDriver {
    /// Create a driver rooted at the given directory. The directory itself
    /// is created lazily when the first namespace is opened.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn namespace_path(&self, application: &str, namespace: &str) -> PathBuf {
        self.root.join(application).join(format!("{namespace}.json"))
    }
}

#[async_trait]
impl StorageDriver for FsDriver {
    async fn open(
        &self,
        application: &str,
        namespace: &str,
    ) -> Result<Arc<dyn Namespace>, StoreError> {
        let path = self.namespace_path(application, namespace);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(Arc::new(FsNamespace {
            path,
            write_lock: Mutex::new(()),
        }))
    }

    async fn drop_namespace(&self, application: &str, namespace: &str) -> Result<(), StoreError> {
        let path = self.namespace_path(application, namespace);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

struct FsNamespace {
    path: PathBuf,
    // Serializes read-modify-write cycles on this handle.
    write_lock: Mutex<()>,
}

impl FsNamespace {
    async fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the full entry map via tmp file, fsync, then atomic rename.
    async fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let tmp_path = tmp_path_for(&self.path);
        let json = serde_json::to_string_pretty(entries)?;

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(json.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[async_trait]
impl Namespace for FsNamespace {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(&entries).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(&entries).await?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.load().await?.into_keys().collect())
    }
}
