use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use edgepress_i18n::{LocaleRegistry, MessageCatalog, leaf_count, missing_keys};
use tracing_subscriber::EnvFilter;

/// Report which keys each locale is missing relative to the English catalog.
#[derive(Debug, Parser)]
#[command(name = "edgepress-i18n", version, about)]
struct Args {
    /// Directory holding `<locale>.json` files
    #[arg(long, env = "EDGEPRESS_MESSAGES_DIR", default_value = "messages")]
    messages_dir: PathBuf,

    /// JSON file listing the served locales (defaults to the built-in list)
    #[arg(long, env = "EDGEPRESS_LOCALES_FILE")]
    locales_file: Option<PathBuf>,

    /// Only inspect these locales (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    locales: Option<Vec<String>>,

    /// Print every missing key, not just the counts
    #[arg(short, long)]
    verbose: bool,

    /// Exit with status 1 when any locale is missing keys
    #[arg(long)]
    check: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let args = Args::parse();

    let registry = match &args.locales_file {
        Some(path) => LocaleRegistry::from_file(path)
            .with_context(|| format!("loading locales from {}", path.display()))?,
        None => LocaleRegistry::default(),
    };
    let targets = registry.select_targets(args.locales.as_deref())?;

    let catalog = MessageCatalog::new(&args.messages_dir);
    let canonical = catalog
        .load_canonical()
        .context("reading the canonical English messages")?;

    println!(
        "{} keys in {}",
        leaf_count(&canonical),
        catalog.path_for(registry.canonical().code.as_str()).display()
    );

    let mut incomplete = 0;
    for locale in &targets {
        let existing = catalog.load_or_empty(&locale.code)?;
        let missing = missing_keys(&canonical, &existing);
        if missing.is_empty() {
            println!("✅ {} ({}): complete", locale.code, locale.name);
            continue;
        }

        incomplete += 1;
        println!(
            "❌ {} ({}): {} missing",
            locale.code,
            locale.name,
            missing.len()
        );
        if args.verbose {
            for key in &missing {
                println!("   {key}");
            }
        }
    }

    if args.check && incomplete > 0 {
        std::process::exit(1);
    }
    Ok(())
}
