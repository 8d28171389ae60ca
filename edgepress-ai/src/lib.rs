//! AI-assisted content pipelines for edgepress
//!
//! This crate sits on top of [`edgepress_i18n`] and adds everything that
//! talks to a remote model:
//!
//! - [`Reconciler`]: fill in or refresh locale files from the English
//!   catalog, one batch of keys per model call
//! - [`ArticleGenerator`]: keyword to article, singly or in parallel chunks
//! - [`ImageGenerator`]: text-to-image with ratio and style presets
//!
//! All remote access goes through the [`AiClient`] trait. [`WorkersAiClient`]
//! is the production implementation; [`MockAiClient`] and
//! [`MockTranslator`] make every pipeline testable offline.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use edgepress_ai::{
//!     AiConfig, PromptTranslator, ReconcileOptions, Reconciler, WorkersAiClient,
//! };
//! use edgepress_i18n::{LocaleRegistry, MessageCatalog};
//!
//! let client = Arc::new(WorkersAiClient::new(AiConfig::from_env()?)?);
//! let reconciler = Reconciler::new(
//!     MessageCatalog::new("messages"),
//!     LocaleRegistry::default(),
//!     Arc::new(PromptTranslator::new(client)),
//! );
//! let report = reconciler.run(&ReconcileOptions::default()).await?;
//! println!("{} translated, {} failed", report.succeeded, report.failed);
//! ```

pub mod article;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod image;
pub mod mock;
pub mod reconcile;
pub mod scheduler;
pub mod storage;
pub mod translator;
pub mod workers_ai;

pub use article::{
    ArticleGenerator, BatchArticleReport, GeneratedArticle, KeywordOutcome, KeywordStatus,
};
pub use client::{AiClient, ImageParams, TextParams};
pub use config::{AiArgs, AiConfig};
pub use error::{AiError, AiResult};
pub use extract::{ExtractError, extract_json_object, parse_json_object};
pub use image::{
    GeneratedImage, ImageGenerator, ImageMetadata, ImageRatio, ImageRequest, ImageStyle,
    cover_request,
};
pub use mock::{MockAiClient, MockMode, MockTranslator};
pub use reconcile::{
    BatchResult, LocaleBatchResult, ReconcileOptions, Reconciler, TranslationMode,
    TranslationReport,
};
pub use scheduler::{ChunkMode, ChunkedScheduler, partition};
pub use storage::{FsObjectStore, MemoryObjectStore, ObjectStore, StoredObject};
pub use translator::{PromptTranslator, TranslatedBundle, Translator};
pub use workers_ai::WorkersAiClient;
