use anyhow::{Context, Result};
use eucaptcha_web::config::Config;
use eucaptcha_web::i18n::{CatalogAudit, MessageCatalog};
use eucaptcha_web::scheduler;
use eucaptcha_web::web::{self, AppState};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("eucaptcha_web=info".parse()?),
        )
        .init();

    info!("Starting EU CAPTCHA web front end");

    // Load configuration from environment
    let config = Config::from_env()?;

    // Step 1: Load and audit the message catalog
    let catalog = MessageCatalog::load(
        &config.messages_dir,
        &config.messages_basename,
        config.fallback_locale(),
    )
    .context("Failed to load message catalog")?;

    let report = CatalogAudit::audit(&catalog);
    for warning in &report.warnings {
        warn!("Catalog: {}", warning);
    }
    for problem in &report.errors {
        error!("Catalog: {}", problem);
    }

    // Step 2: Wire the pipeline and start the session reaper
    let state = AppState::new(config, catalog);
    let _scheduler =
        scheduler::start_session_reaper(state.sessions.clone(), &state.config.session_reaper_cron)
            .await
            .context("Failed to start session reaper")?;

    // Step 3: Serve
    let addr = format!("{}:{}", state.config.host, state.config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, web::build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
