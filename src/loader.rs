use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{CatalogError, CatalogResult};
use crate::locale::CANONICAL_LOCALE;
use crate::tree::Messages;

/// Load a message tree from a single JSON file
///
/// The file must contain a JSON object; nested objects are namespaces.
///
/// # Errors
/// - File not found or unreadable
/// - Invalid JSON
/// - Root is not an object
pub fn load_messages_from_file(path: &Path) -> CatalogResult<Messages> {
    let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;

    let json: Value = serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match json {
        Value::Object(messages) => Ok(messages),
        _ => Err(CatalogError::NotAnObject {
            path: path.to_path_buf(),
        }),
    }
}

/// Write a message tree as two-space indented JSON with a trailing newline.
///
/// Missing parent directories are created.
pub fn save_messages_to_file(path: &Path, messages: &Messages) -> CatalogResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
    }
    let mut content = serde_json::to_string_pretty(messages)?;
    content.push('\n');
    fs::write(path, content).map_err(|e| CatalogError::io(path, e))
}

/// A directory of `<locale>.json` message files.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    dir: PathBuf,
}

impl MessageCatalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, locale: &str) -> PathBuf {
        self.dir.join(format!("{locale}.json"))
    }

    /// Load the canonical (English) tree. A missing file is an error.
    pub fn load_canonical(&self) -> CatalogResult<Messages> {
        load_messages_from_file(&self.path_for(CANONICAL_LOCALE))
    }

    /// Load a locale's tree, treating a missing file as an empty tree.
    ///
    /// Parse errors are still reported.
    pub fn load_or_empty(&self, locale: &str) -> CatalogResult<Messages> {
        match load_messages_from_file(&self.path_for(locale)) {
            Ok(messages) => Ok(messages),
            Err(e) if e.is_not_found() => {
                tracing::info!(locale, "no existing messages, a new file will be created");
                Ok(Messages::new())
            }
            Err(e) => Err(e),
        }
    }

    pub fn save(&self, locale: &str, messages: &Messages) -> CatalogResult<()> {
        save_messages_to_file(&self.path_for(locale), messages)
    }

    /// Locale codes that have a file in the directory, sorted.
    pub fn available_locales(&self) -> CatalogResult<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| CatalogError::io(&self.dir, e))?;

        let mut locales = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| CatalogError::io(&self.dir, e))?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                locales.push(stem.to_string());
            }
        }
        locales.sort();
        Ok(locales)
    }
}
