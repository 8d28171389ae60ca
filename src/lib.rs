//! Nested JSON message catalogs for edgepress
//!
//! Each locale is stored as one JSON file holding a tree of messages. English
//! is the canonical locale: every other locale is compared against it with
//! [`missing_keys`], and freshly translated fragments are folded back with
//! [`deep_merge`] so that existing translations survive a partial pass.
//!
//! ```
//! use edgepress_i18n::{deep_merge, missing_keys, Messages};
//! use serde_json::json;
//!
//! let en: Messages = json!({ "nav": { "home": "Home", "blog": "Blog" } })
//!     .as_object().cloned().unwrap();
//! let fr: Messages = json!({ "nav": { "home": "Accueil" } })
//!     .as_object().cloned().unwrap();
//!
//! assert_eq!(missing_keys(&en, &fr), vec!["nav.blog"]);
//!
//! let patch: Messages = json!({ "nav": { "blog": "Blog" } }).as_object().cloned().unwrap();
//! let merged = deep_merge(&fr, &patch);
//! assert!(missing_keys(&en, &merged).is_empty());
//! ```

pub mod diff;
pub mod error;
pub mod loader;
pub mod locale;
pub mod merge;
pub mod tree;

pub use diff::{missing_keys, union_keys};
pub use error::{CatalogError, CatalogResult};
pub use loader::{MessageCatalog, load_messages_from_file, save_messages_to_file};
pub use locale::{CANONICAL_LOCALE, Locale, LocaleRegistry, TextDirection, validate_locale};
pub use merge::{deep_merge, merge_into};
pub use tree::{Messages, extract_keys, get_path, leaf_count, leaf_keys, set_path};
