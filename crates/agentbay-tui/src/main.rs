// AgentBay storefront entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database, load the featured catalog
// 4. Build the backend client and speech input
// 5. Create mpsc channels and the app state, restore the previous session
// 6. Spawn app logic task
// 7. Run the TUI until the user quits
// 8. Cleanup on exit

use std::path::Path;
use std::sync::Arc;

use agentbay_api::HttpMarketplace;
use agentbay_app::app;
use agentbay_app::speech::SpeechInput;
use agentbay_core::{catalog, config, db};
use agentbay_tui::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("AgentBay starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: backend={}, timeout={}s",
        config.api.base_url, config.api.timeout_secs
    );

    // 3. Open database and load the featured catalog
    let db = db::Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path.display());

    let featured = match catalog::load_featured(Path::new(&config.catalog.featured)) {
        Ok(products) => {
            info!("Loaded {} featured products", products.len());
            products
        }
        Err(e) => {
            warn!("Featured catalog unavailable: {}", e);
            Vec::new()
        }
    };

    // 4. Backend client and speech input
    let api = HttpMarketplace::from_config(&config).context("failed to build backend client")?;
    let speech = SpeechInput::from_config(&config.speech);
    if speech.is_supported() {
        info!("Voice search enabled");
    } else {
        info!("Voice search disabled (no speech command configured)");
    }

    // 5. Channels and app state
    let (api_tx, api_rx) = mpsc::channel(64);
    let (speech_tx, speech_rx) = mpsc::channel(64);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let mut app_state = app::AppState::new(
        config,
        db,
        Arc::new(api),
        speech,
        featured,
        api_tx,
        speech_tx,
    );

    match app::recover_from_db(&mut app_state) {
        Ok(true) => info!("Previous session restored"),
        Ok(false) => info!("Starting fresh session"),
        Err(e) => {
            error!("Session restore failed: {:#}", e);
            return Err(e.context("session restore failed"));
        }
    }

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(api_rx, speech_rx, cmd_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. Run the TUI event loop (blocking until user quits)
    info!("Application ready");
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 8. Cleanup: wait for app task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("AgentBay shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("agentbay.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("agentbay=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
