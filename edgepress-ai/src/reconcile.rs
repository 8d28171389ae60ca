//! Locale reconciliation
//!
//! Brings every target locale file in line with the canonical English file:
//!
//! 1. pick the keys to translate (all, missing, or an explicit list),
//! 2. split them into fixed-size batches,
//! 3. send each batch to the [`Translator`] once for all locales that need it,
//! 4. merge each locale's part of the answer into its file and save.
//!
//! Batches run strictly one after another. A batch that fails is recorded
//! and the run moves on; only setup problems (unreadable canonical file,
//! unknown locale, empty key list) abort.

use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use edgepress_i18n::{
    Locale, LocaleRegistry, MessageCatalog, Messages, extract_keys, get_path, leaf_keys,
    merge_into, missing_keys, set_path, union_keys,
};
use serde::Serialize;

use crate::error::{AiError, AiResult};
use crate::scheduler::ChunkedScheduler;
use crate::translator::{TranslatedBundle, Translator};

pub const DEFAULT_BATCH_SIZE: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(size) => size,
    None => NonZeroUsize::MIN,
};

/// Which keys a run translates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationMode {
    /// Every canonical leaf, overwriting existing translations
    Full,
    /// Only keys that are absent, empty, null or mistyped in a locale
    Missing,
    /// The listed dot-paths, overwriting existing translations
    Keys(Vec<String>),
}

impl TranslationMode {
    pub fn name(&self) -> &'static str {
        match self {
            TranslationMode::Full => "full",
            TranslationMode::Missing => "missing",
            TranslationMode::Keys(_) => "keys",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    pub mode: TranslationMode,
    /// `None` means every non-canonical locale in the registry
    pub target_locales: Option<Vec<String>>,
    /// With [`TranslationMode::Full`], discard existing locale content
    pub force: bool,
    pub batch_size: NonZeroUsize,
    /// Wait between consecutive batches
    pub pause: Duration,
    /// Keys copied verbatim from the canonical file instead of translated
    pub pinned_keys: Vec<String>,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            mode: TranslationMode::Missing,
            target_locales: None,
            force: false,
            batch_size: DEFAULT_BATCH_SIZE,
            pause: Duration::ZERO,
            pinned_keys: Vec::new(),
        }
    }
}

/// Outcome for one locale in one batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleBatchResult {
    pub locale: String,
    pub success: bool,
    pub translated_keys: Vec<String>,
    /// Keys that were sent for this locale but not written
    pub untranslated_keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub index: usize,
    pub keys: Vec<String>,
    pub locales: Vec<LocaleBatchResult>,
}

/// Summary of a reconciliation run
///
/// Counts are key×locale pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TranslationReport {
    pub mode: String,
    pub total_keys: usize,
    pub batches: Vec<BatchResult>,
    pub succeeded: usize,
    pub failed: usize,
    /// Pinned pairs copied without translation
    pub skipped: usize,
    pub pinned: Vec<String>,
}

impl TranslationReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Failed key×locale pairs grouped by locale.
    pub fn failures_by_locale(&self) -> HashMap<String, usize> {
        let mut failures = HashMap::new();
        for locale in self.batches.iter().flat_map(|b| &b.locales) {
            if !locale.untranslated_keys.is_empty() {
                *failures.entry(locale.locale.clone()).or_insert(0) +=
                    locale.untranslated_keys.len();
            }
        }
        failures
    }
}

/// The keys of one run and, per locale, the subset it needs.
struct Plan {
    keys: Vec<String>,
    /// `None` means every key applies to the locale
    per_locale: HashMap<String, Option<HashSet<String>>>,
}

impl Plan {
    fn keys_for(&self, locale: &str, batch: &[String]) -> Vec<String> {
        match self.per_locale.get(locale) {
            Some(None) => batch.to_vec(),
            Some(Some(wanted)) => batch.iter().filter(|k| wanted.contains(*k)).cloned().collect(),
            None => Vec::new(),
        }
    }
}

pub struct Reconciler {
    catalog: MessageCatalog,
    registry: LocaleRegistry,
    translator: Arc<dyn Translator>,
}

impl Reconciler {
    pub fn new(
        catalog: MessageCatalog,
        registry: LocaleRegistry,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            catalog,
            registry,
            translator,
        }
    }

    pub fn catalog(&self) -> &MessageCatalog {
        &self.catalog
    }

    pub async fn run(&self, options: &ReconcileOptions) -> AiResult<TranslationReport> {
        let targets = self
            .registry
            .select_targets(options.target_locales.as_deref())?;
        let canonical = self.catalog.load_canonical()?;

        let mut existing = HashMap::new();
        for locale in &targets {
            existing.insert(locale.code.clone(), self.catalog.load_or_empty(&locale.code)?);
        }

        let pinned = pinned_keys(&canonical, &options.pinned_keys);
        let plan = plan_keys(&options.mode, &canonical, &targets, &existing, &pinned)?;

        tracing::info!(
            mode = options.mode.name(),
            provider = self.translator.provider_name(),
            keys = plan.keys.len(),
            locales = targets.len(),
            batch_size = options.batch_size.get(),
            "starting translation"
        );

        let mut report = TranslationReport {
            mode: options.mode.name().to_string(),
            total_keys: plan.keys.len(),
            pinned: pinned.clone(),
            ..Default::default()
        };

        let reset = options.force && options.mode == TranslationMode::Full;
        let replaced: Mutex<HashSet<String>> = Mutex::new(HashSet::new());

        let batches: Vec<(usize, Vec<String>)> =
            crate::scheduler::partition(&plan.keys, options.batch_size)
                .into_iter()
                .enumerate()
                .collect();
        let total = batches.len();

        let scheduler = ChunkedScheduler::sequential().with_pause(options.pause);
        report.batches = scheduler
            .run(batches, |(index, keys)| {
                let canonical = &canonical;
                let targets = &targets;
                let plan = &plan;
                let replaced = &replaced;
                async move {
                    tracing::info!(batch = index + 1, total, keys = keys.len(), "translating batch");
                    self.run_batch(index, keys, canonical, targets, plan, reset.then_some(replaced))
                        .await
                }
            })
            .await;

        if !pinned.is_empty() {
            report.skipped = self.copy_pinned(&canonical, &targets, &pinned);
        }

        for locale in report.batches.iter().flat_map(|b| &b.locales) {
            report.succeeded += locale.translated_keys.len();
            report.failed += locale.untranslated_keys.len();
        }

        tracing::info!(
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "translation finished"
        );
        Ok(report)
    }

    async fn run_batch(
        &self,
        index: usize,
        keys: Vec<String>,
        canonical: &Messages,
        targets: &[Locale],
        plan: &Plan,
        replaced: Option<&Mutex<HashSet<String>>>,
    ) -> BatchResult {
        let wanted: Vec<(&Locale, Vec<String>)> = targets
            .iter()
            .map(|l| (l, plan.keys_for(&l.code, &keys)))
            .filter(|(_, keys)| !keys.is_empty())
            .collect();

        let mut result = BatchResult {
            index,
            keys,
            locales: Vec::with_capacity(wanted.len()),
        };
        if wanted.is_empty() {
            return result;
        }

        let source = extract_keys(canonical, &result.keys);
        let locales: Vec<Locale> = wanted.iter().map(|(l, _)| (*l).clone()).collect();

        let bundle: TranslatedBundle = match self.translator.translate(&source, &locales).await {
            Ok(bundle) => bundle,
            Err(e) => {
                tracing::warn!(batch = index + 1, error = %e, "batch failed");
                result.locales = wanted
                    .into_iter()
                    .map(|(l, keys)| failure(&l.code, keys, e.to_string()))
                    .collect();
                return result;
            }
        };

        for (locale, keys) in wanted {
            let record = match bundle.get(&locale.code) {
                Some(tree) => self.apply(locale, keys, tree, replaced),
                None => {
                    tracing::warn!(locale = %locale.code, batch = index + 1, "locale missing from response");
                    failure(&locale.code, keys, "locale missing from response".to_string())
                }
            };
            result.locales.push(record);
        }
        result
    }

    /// Merge one locale's translated keys into its file.
    fn apply(
        &self,
        locale: &Locale,
        keys: Vec<String>,
        translated: &Messages,
        replaced: Option<&Mutex<HashSet<String>>>,
    ) -> LocaleBatchResult {
        let patch = extract_keys(translated, &keys);
        let written: HashSet<String> = leaf_keys(&patch).into_iter().collect();
        if written.is_empty() {
            return failure(&locale.code, keys, "no translated values for this batch".to_string());
        }

        let mut current = match self.base_tree(&locale.code, replaced) {
            Ok(tree) => tree,
            Err(e) => return failure(&locale.code, keys, e.to_string()),
        };
        merge_into(&mut current, &patch);

        if let Err(e) = self.catalog.save(&locale.code, &current) {
            tracing::warn!(locale = %locale.code, error = %e, "failed to write locale file");
            return failure(&locale.code, keys, e.to_string());
        }
        if let Err(e) = mark_replaced(&locale.code, replaced) {
            return failure(&locale.code, keys, e.to_string());
        }

        let (translated_keys, untranslated_keys): (Vec<String>, Vec<String>) =
            keys.into_iter().partition(|k| written.contains(k));
        if !untranslated_keys.is_empty() {
            tracing::warn!(locale = %locale.code, keys = ?untranslated_keys, "keys missing from translation");
        }
        tracing::debug!(locale = %locale.code, written = translated_keys.len(), "locale updated");

        LocaleBatchResult {
            locale: locale.code.clone(),
            success: true,
            translated_keys,
            untranslated_keys,
            error: None,
        }
    }

    /// The tree a write starts from: the file on disk, or an empty tree
    /// until a forced full run has written the locale once.
    fn base_tree(
        &self,
        locale: &str,
        replaced: Option<&Mutex<HashSet<String>>>,
    ) -> AiResult<Messages> {
        if let Some(replaced) = replaced {
            let replaced = replaced
                .lock()
                .map_err(|_| AiError::Storage("locale reset state poisoned".to_string()))?;
            if !replaced.contains(locale) {
                tracing::info!(locale, "force: replacing existing messages");
                return Ok(Messages::new());
            }
        }
        Ok(self.catalog.load_or_empty(locale)?)
    }

    /// Copy pinned keys verbatim into every target file as it stands on disk.
    /// Returns the number of key×locale pairs written.
    ///
    /// A forced locale that never received a translation keeps its old
    /// content here.
    fn copy_pinned(&self, canonical: &Messages, targets: &[Locale], pinned: &[String]) -> usize {
        let mut copied = 0;
        for locale in targets {
            let mut tree = match self.catalog.load_or_empty(&locale.code) {
                Ok(tree) => tree,
                Err(e) => {
                    tracing::warn!(locale = %locale.code, error = %e, "cannot copy pinned keys");
                    continue;
                }
            };
            for key in pinned {
                if let Some(value) = get_path(canonical, key) {
                    set_path(&mut tree, key, value.clone());
                }
            }
            match self.catalog.save(&locale.code, &tree) {
                Ok(()) => copied += pinned.len(),
                Err(e) => tracing::warn!(locale = %locale.code, error = %e, "cannot copy pinned keys"),
            }
        }
        copied
    }
}

/// Record that a forced run has written `locale`, so later writes merge.
fn mark_replaced(locale: &str, replaced: Option<&Mutex<HashSet<String>>>) -> AiResult<()> {
    if let Some(replaced) = replaced {
        replaced
            .lock()
            .map_err(|_| AiError::Storage("locale reset state poisoned".to_string()))?
            .insert(locale.to_string());
    }
    Ok(())
}

fn failure(locale: &str, keys: Vec<String>, error: String) -> LocaleBatchResult {
    LocaleBatchResult {
        locale: locale.to_string(),
        success: false,
        translated_keys: Vec::new(),
        untranslated_keys: keys,
        error: Some(error),
    }
}

/// Requested pinned keys that exist as leaves in the canonical tree.
///
/// A pinned namespace pins every leaf beneath it.
fn pinned_keys(canonical: &Messages, requested: &[String]) -> Vec<String> {
    let leaves = leaf_keys(canonical);
    let mut pinned = Vec::new();
    for key in requested {
        let prefix = format!("{key}.");
        let matched: Vec<&String> = leaves
            .iter()
            .filter(|leaf| *leaf == key || leaf.starts_with(&prefix))
            .collect();
        if matched.is_empty() {
            tracing::warn!(key = %key, "pinned key not found in canonical messages");
        }
        for leaf in matched {
            if !pinned.contains(leaf) {
                pinned.push(leaf.clone());
            }
        }
    }
    pinned
}

fn plan_keys(
    mode: &TranslationMode,
    canonical: &Messages,
    targets: &[Locale],
    existing: &HashMap<String, Messages>,
    pinned: &[String],
) -> AiResult<Plan> {
    let not_pinned = |key: &String| !pinned.contains(key);
    let everyone = |keys: Vec<String>| Plan {
        keys,
        per_locale: targets.iter().map(|l| (l.code.clone(), None)).collect(),
    };

    match mode {
        TranslationMode::Full => Ok(everyone(
            leaf_keys(canonical).into_iter().filter(not_pinned).collect(),
        )),
        TranslationMode::Missing => {
            let mut per_locale = HashMap::new();
            let mut lists = Vec::with_capacity(targets.len());
            for locale in targets {
                let empty = Messages::new();
                let target = existing.get(&locale.code).unwrap_or(&empty);
                let missing: Vec<String> = missing_keys(canonical, target)
                    .into_iter()
                    .filter(not_pinned)
                    .collect();
                tracing::info!(locale = %locale.code, missing = missing.len(), "compared with canonical");
                per_locale.insert(locale.code.clone(), Some(missing.iter().cloned().collect()));
                lists.push(missing);
            }
            Ok(Plan {
                keys: union_keys(&lists),
                per_locale,
            })
        }
        TranslationMode::Keys(requested) => {
            if requested.iter().all(|k| k.trim().is_empty()) {
                return Err(AiError::Validation("no keys given to translate".to_string()));
            }
            let leaves = leaf_keys(canonical);
            let mut keys = Vec::new();
            for key in requested.iter().map(|k| k.trim()).filter(|k| !k.is_empty()) {
                let prefix = format!("{key}.");
                let matched: Vec<&String> = leaves
                    .iter()
                    .filter(|leaf| leaf.as_str() == key || leaf.starts_with(&prefix))
                    .collect();
                if matched.is_empty() {
                    tracing::warn!(key, "key not found in canonical messages, skipping");
                }
                for leaf in matched {
                    if not_pinned(leaf) && !keys.contains(leaf) {
                        keys.push(leaf.clone());
                    }
                }
            }
            if keys.is_empty() {
                return Err(AiError::Validation(
                    "none of the requested keys exist in the canonical messages".to_string(),
                ));
            }
            Ok(everyone(keys))
        }
    }
}
