//! Durable object storage for generated media
//!
//! Keys are slash-separated relative paths such as
//! `images/2026/cover-3f2a.png`. They never start with `/` and never contain
//! `..` segments.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{AiError, AiResult};

const CONTENT_TYPE_SUFFIX: &str = ".content-type";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key`, replacing any previous object.
    ///
    /// Without an explicit content type one is guessed from the key's
    /// extension.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: Option<&str>) -> AiResult<()>;

    async fn get(&self, key: &str) -> AiResult<Option<StoredObject>>;
}

pub fn validate_key(key: &str) -> AiResult<()> {
    let invalid = |reason: &str| Err(AiError::Validation(format!("invalid object key {key:?}: {reason}")));

    if key.trim().is_empty() {
        return invalid("empty");
    }
    if key.contains('\\') {
        return invalid("backslash");
    }
    if key.ends_with(CONTENT_TYPE_SUFFIX) {
        return invalid("reserved suffix");
    }
    for component in Path::new(key).components() {
        match component {
            Component::Normal(_) => {}
            _ => return invalid("must be a relative path without '.' or '..'"),
        }
    }
    Ok(())
}

fn content_type_for(key: &str, explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .unwrap_or_else(|| mime_guess::from_path(key).first_or_octet_stream().to_string())
}

/// Objects as files under a root directory, with the content type kept in a
/// sidecar file next to each object.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> AiResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

fn sidecar(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(CONTENT_TYPE_SUFFIX);
    PathBuf::from(name)
}

fn storage_error(path: &Path, e: std::io::Error) -> AiError {
    AiError::Storage(format!("{}: {e}", path.display()))
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: Option<&str>) -> AiResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error(parent, e))?;
        }

        let content_type = content_type_for(key, content_type);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| storage_error(&path, e))?;
        let meta = sidecar(&path);
        tokio::fs::write(&meta, content_type.as_bytes())
            .await
            .map_err(|e| storage_error(&meta, e))?;

        tracing::debug!(key, size = bytes.len(), content_type = %content_type, "object stored");
        Ok(())
    }

    async fn get(&self, key: &str) -> AiResult<Option<StoredObject>> {
        let path = self.path_for(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(&path, e)),
        };
        let content_type = match tokio::fs::read_to_string(sidecar(&path)).await {
            Ok(content_type) => content_type.trim().to_string(),
            Err(_) => content_type_for(key, None),
        };
        Ok(Some(StoredObject {
            bytes,
            content_type,
        }))
    }
}

/// In-process store used by tests and the development server.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: Option<&str>) -> AiResult<()> {
        validate_key(key)?;
        let object = StoredObject {
            bytes,
            content_type: content_type_for(key, content_type),
        };
        self.objects.write().await.insert(key.to_string(), object);
        Ok(())
    }

    async fn get(&self, key: &str) -> AiResult<Option<StoredObject>> {
        validate_key(key)?;
        Ok(self.objects.read().await.get(key).cloned())
    }
}
