//! Message catalog checker - loads the bundles and reports consistency problems
//!
//! Usage:
//!   cargo run --bin check-messages                 # Check the configured catalog
//!   cargo run --bin check-messages -- path/to/dir  # Check bundles in another directory
//!   cargo run --bin check-messages -- --strict     # Treat warnings as failures
//!
//! Optional environment variables:
//! - MESSAGES_DIR (defaults to web/WEB-INF/classes)
//! - MESSAGES_BASENAME (defaults to messages)
//! - DEFAULT_LOCALE (defaults to en)
//!
//! Exits non-zero when the audit finds errors (or warnings with --strict).

use anyhow::{Context, Result};
use eucaptcha_web::config::Config;
use eucaptcha_web::i18n::{CatalogAudit, MessageCatalog};
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eucaptcha_web=warn".parse()?),
        )
        .init();

    let config = Config::from_env()?;

    let mut strict = false;
    let mut dir: Option<PathBuf> = None;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--strict" => strict = true,
            other => dir = Some(PathBuf::from(other)),
        }
    }
    let dir = dir.unwrap_or_else(|| config.messages_dir.clone());

    info!("Checking '{}' bundles in {}", config.messages_basename, dir.display());

    let catalog = MessageCatalog::load(&dir, &config.messages_basename, config.fallback_locale())
        .with_context(|| format!("Failed to load bundles from {}", dir.display()))?;

    let locales: Vec<String> = catalog.locales().iter().map(|l| l.to_tag()).collect();
    println!("Basename: {}", catalog.basename());
    println!("Fallback locale: {}", catalog.fallback_locale());
    println!(
        "Base bundle: {}",
        if catalog.bundle("").is_some() { "present" } else { "MISSING" }
    );
    println!("Locale bundles: {}", if locales.is_empty() { "none".to_string() } else { locales.join(", ") });

    let report = CatalogAudit::audit(&catalog);

    for problem in &report.errors {
        println!("ERROR   {}", problem);
    }
    for warning in &report.warnings {
        println!("WARNING {}", warning);
    }

    if report.is_clean() {
        println!("✓ Catalog is consistent");
        return Ok(());
    }

    println!(
        "{} error(s), {} warning(s)",
        report.errors.len(),
        report.warnings.len()
    );

    if report.has_errors() || (strict && report.has_warnings()) {
        std::process::exit(1);
    }

    Ok(())
}
