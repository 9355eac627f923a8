use std::net::SocketAddr;
use std::sync::Arc;

use ambient_agent::quickenhance;
use ambient_agent::{http, AppState, Orchestrator};
use ambient_capture::CaptureSource;
use ambient_core::capability::{NullClipboard, NullHotkeyRegistrar, NullKeySynth, NullOverlay, NullScreenGrabber};
use ambient_core::Config;
use ambient_enhance::Enhancer;
use ambient_llm::{ChatClient, VisionClient};
use ambient_store::MemoryStoreClient;
use clap::Parser;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "ambient-agent")]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, env = "AMBIENT_CONFIG_PATH")]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ambient_agent=info,axum=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    info!(
        path = %config_path.display(),
        port = config.extension.port,
        "Loaded configuration"
    );

    let capture = CaptureSource::new(Arc::new(NullScreenGrabber), config.capture.clone());
    let vision = VisionClient::new(&config.llm);
    let chat = ChatClient::new(&config.llm);
    let store = MemoryStoreClient::new(&config.memory);
    let enhancer = Enhancer::new();

    let state = Arc::new(AppState {
        config,
        capture,
        vision,
        chat,
        store,
        enhancer,
        last_state: RwLock::new(None),
    });

    let cancel = CancellationToken::new();
    let orchestrator = Arc::new(Orchestrator::new(state.clone(), cancel.clone()));

    if let Err(e) = orchestrator.run_startup_checks().await {
        error!(error = %e, "startup health check failed, aborting");
        return Err(e.into());
    }

    orchestrator.spawn();

    // §4.8: no platform capability backend is wired, so this always falls
    // through to the startup-warning path; the HTTP and UI paths still work.
    let _quick_enhance = Arc::new(quickenhance::QuickEnhanceController::new(
        Arc::new(NullClipboard::default()),
        Arc::new(NullKeySynth),
        Arc::new(NullOverlay),
    ));
    let hotkey_registrar = NullHotkeyRegistrar;
    let _hotkey_registration = quickenhance::register_hotkeys(&hotkey_registrar).await;

    let port = state.config.extension.port;
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let app = http::router(state.clone(), orchestrator.clone());

    info!(addr = %addr, "Starting HTTP API (loopback only)");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let shutdown_cancel = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let ctrl_c = async {
                tokio::signal::ctrl_c().await.ok();
            };
            tokio::select! {
                _ = ctrl_c => {}
                _ = shutdown_cancel.cancelled() => {}
            }
            info!("Shutdown signal received, stopping capture loop");
        })
        .await?;

    cancel.cancel();
    Ok(())
}
