use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use edgepress_ai::{
    AiArgs, MockMode, MockTranslator, PromptTranslator, ReconcileOptions, Reconciler,
    TranslationMode, TranslationReport, Translator, WorkersAiClient,
};
use edgepress_ai::reconcile::DEFAULT_BATCH_SIZE;
use edgepress_i18n::{LocaleRegistry, MessageCatalog};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Translate every key, overwriting existing translations
    Full,
    /// Translate only keys a locale is missing
    Missing,
    /// Translate the keys given with --keys
    Keys,
}

/// Translate the English message catalog into the other site locales.
#[derive(Debug, Parser)]
#[command(name = "edgepress-translate", version, about)]
struct Args {
    /// Directory holding `<locale>.json` files
    #[arg(long, env = "EDGEPRESS_MESSAGES_DIR", default_value = "messages")]
    messages_dir: PathBuf,

    /// JSON file listing the served locales (defaults to the built-in list)
    #[arg(long, env = "EDGEPRESS_LOCALES_FILE")]
    locales_file: Option<PathBuf>,

    /// Target locales (comma separated, default: all)
    #[arg(short, long, value_delimiter = ',')]
    locales: Option<Vec<String>>,

    #[arg(long, value_enum, default_value_t = Mode::Missing)]
    mode: Mode,

    /// Keys to translate in `keys` mode (comma separated dot paths)
    #[arg(short, long, value_delimiter = ',')]
    keys: Vec<String>,

    /// In `full` mode, replace locale files instead of merging into them
    #[arg(long)]
    force: bool,

    /// Keys per model call
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: NonZeroUsize,

    /// Seconds to wait between batches
    #[arg(long, default_value_t = 3)]
    pause_secs: u64,

    /// Keys copied verbatim instead of translated (comma separated)
    #[arg(short = 'n', long = "no-translate", value_delimiter = ',', default_value = "siteInfo.brandName")]
    no_translate: Vec<String>,

    /// Use the offline mock translator
    #[arg(long)]
    mock: bool,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    ai: AiArgs,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .init();
}

fn print_summary(report: &TranslationReport) {
    println!();
    println!("Mode: {}", report.mode);
    println!("Keys: {}", report.total_keys);
    println!("Batches: {}", report.batches.len());
    println!("✅ Translated: {}", report.succeeded);
    if report.skipped > 0 {
        println!("⏭️  Copied without translation: {}", report.skipped);
    }
    if report.failed > 0 {
        println!("❌ Failed: {}", report.failed);
        let mut failures: Vec<_> = report.failures_by_locale().into_iter().collect();
        failures.sort();
        for (locale, count) in failures {
            println!("   {locale}: {count}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mode = match args.mode {
        Mode::Full => TranslationMode::Full,
        Mode::Missing => TranslationMode::Missing,
        Mode::Keys if args.keys.is_empty() => bail!("--mode keys needs at least one --keys entry"),
        Mode::Keys => TranslationMode::Keys(args.keys.clone()),
    };
    if args.force && mode != TranslationMode::Full {
        tracing::warn!("--force only applies to full mode, ignoring");
    }

    let registry = match &args.locales_file {
        Some(path) => LocaleRegistry::from_file(path)
            .with_context(|| format!("loading locales from {}", path.display()))?,
        None => LocaleRegistry::default(),
    };

    let translator: Arc<dyn Translator> = if args.mock {
        Arc::new(MockTranslator::new(MockMode::Suffix))
    } else {
        let config = args.ai.clone().into_config()?;
        let model = config.text_model.clone();
        let max_tokens = config.max_tokens;
        let client = WorkersAiClient::new(config).context("creating the Workers AI client")?;
        Arc::new(
            PromptTranslator::new(Arc::new(client))
                .with_model(model)
                .with_max_tokens(max_tokens),
        )
    };

    let options = ReconcileOptions {
        mode,
        target_locales: args.locales.clone(),
        force: args.force,
        batch_size: args.batch_size,
        pause: Duration::from_secs(args.pause_secs),
        pinned_keys: args
            .no_translate
            .iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect(),
    };

    let reconciler = Reconciler::new(MessageCatalog::new(&args.messages_dir), registry, translator);
    let report = reconciler
        .run(&options)
        .await
        .context("translation run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}
