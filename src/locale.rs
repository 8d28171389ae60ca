//! Locale registry
//!
//! The registry replaces a process-wide locale list: it is built once (either
//! from the built-in defaults or from a JSON file) and handed to whatever needs
//! to know which languages the site serves.
//!
//! A locales file is a JSON array:
//!
//! ```json
//! [
//!     { "code": "en", "name": "English" },
//!     { "code": "ar", "name": "العربية", "dir": "rtl" }
//! ]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

/// The source-of-truth locale every other locale is diffed against.
pub const CANONICAL_LOCALE: &str = "en";

/// Writing direction of a locale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    #[default]
    Ltr,
    Rtl,
}

/// A locale code with its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub dir: TextDirection,
}

impl Locale {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            dir: TextDirection::Ltr,
        }
    }

    pub fn rtl(code: &str, name: &str) -> Self {
        Self {
            dir: TextDirection::Rtl,
            ..Self::new(code, name)
        }
    }

    pub fn is_canonical(&self) -> bool {
        self.code == CANONICAL_LOCALE
    }
}

/// Validate that a locale code is a well-formed BCP 47 identifier
///
/// # Example
///
/// ```
/// use edgepress_i18n::validate_locale;
///
/// assert!(validate_locale("zh-TW").is_ok());
/// assert!(validate_locale("en@US").is_err());
/// ```
pub fn validate_locale(code: &str) -> CatalogResult<()> {
    if code.trim().is_empty() || code.parse::<icu_locale::Locale>().is_err() {
        return Err(CatalogError::InvalidLocale(code.to_string()));
    }
    Ok(())
}

/// The set of locales served by the site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleRegistry {
    locales: Vec<Locale>,
}

impl LocaleRegistry {
    /// Build a registry, validating every code.
    ///
    /// The canonical locale must be present; duplicate codes keep their first
    /// occurrence.
    pub fn new(locales: Vec<Locale>) -> CatalogResult<Self> {
        let mut unique: Vec<Locale> = Vec::with_capacity(locales.len());
        for locale in locales {
            validate_locale(&locale.code)?;
            if !unique.iter().any(|l| l.code == locale.code) {
                unique.push(locale);
            }
        }

        if !unique.iter().any(Locale::is_canonical) {
            return Err(CatalogError::UnknownLocale(CANONICAL_LOCALE.to_string()));
        }

        Ok(Self { locales: unique })
    }

    /// Load a registry from a JSON array of locales.
    pub fn from_file(path: &Path) -> CatalogResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
        let locales: Vec<Locale> =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(locales)
    }

    pub fn all(&self) -> &[Locale] {
        &self.locales
    }

    pub fn canonical(&self) -> &Locale {
        // `new` guarantees presence
        self.locales
            .iter()
            .find(|l| l.is_canonical())
            .unwrap_or(&self.locales[0])
    }

    pub fn get(&self, code: &str) -> Option<&Locale> {
        self.locales
            .iter()
            .find(|l| l.code.eq_ignore_ascii_case(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    /// Every locale except the canonical one, in registry order.
    pub fn targets(&self) -> impl Iterator<Item = &Locale> {
        self.locales.iter().filter(|l| !l.is_canonical())
    }

    /// Resolve the target locales for a run.
    ///
    /// `None` selects every non-canonical locale. Requested codes are returned
    /// in registry order; the canonical locale is silently dropped and unknown
    /// codes are an error.
    pub fn select_targets(&self, requested: Option<&[String]>) -> CatalogResult<Vec<Locale>> {
        let Some(requested) = requested else {
            return Ok(self.targets().cloned().collect());
        };

        for code in requested {
            if !self.contains(code) {
                return Err(CatalogError::UnknownLocale(code.clone()));
            }
        }

        Ok(self
            .targets()
            .filter(|l| requested.iter().any(|c| c.eq_ignore_ascii_case(&l.code)))
            .cloned()
            .collect())
    }
}

impl Default for LocaleRegistry {
    fn default() -> Self {
        Self {
            locales: vec![
                Locale::new("en", "English"),
                Locale::new("zh", "简体中文"),
                Locale::new("zh-TW", "繁體中文"),
                Locale::new("ja", "日本語"),
                Locale::new("ko", "한국어"),
                Locale::new("fr", "Français"),
                Locale::new("de", "Deutsch"),
                Locale::new("es", "Español"),
                Locale::new("pt", "Português"),
                Locale::new("ru", "Русский"),
                Locale::rtl("ar", "العربية"),
            ],
        }
    }
}
