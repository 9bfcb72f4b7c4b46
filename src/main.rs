//! Kitchen Timers - Recipe step timers served over HTTP
//!
//! This is the main entry point for the kitchen-timers daemon.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use kitchen_timers::{
    alerts::{AlertSound, BroadcastChecklist, CompletionCoordinator, Notifier, Silent},
    api::create_router,
    config::Config,
    persistence::{open_slots, KeyValueStore, TimerPersistence, TIMERS_KEY},
    services::{CommandSound, DesktopNotifier},
    state::{AppState, TimerStore},
    tasks::{checklist_recorder_task, TickDriver},
    utils::{shutdown_signal, SystemClock},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("kitchen_timers={},tower_http=info", config.log_level()))
        .init();

    info!("Starting kitchen-timers server v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration: host={}, port={}, data_dir={}, tick={}ms",
        config.host,
        config.port,
        config.data_dir.display(),
        config.tick_period().as_millis()
    );

    let slots: Arc<dyn KeyValueStore> = open_slots(&config.data_dir);
    let store = TimerStore::load(TimerPersistence::new(Arc::clone(&slots)), TIMERS_KEY);

    let sound: Arc<dyn AlertSound> = match &config.sound {
        Some(file) => Arc::new(CommandSound::new(config.player.clone(), file.clone())),
        None => Arc::new(Silent),
    };
    let notifier: Arc<dyn Notifier> = if config.notify {
        Arc::new(DesktopNotifier::new())
    } else {
        Arc::new(Silent)
    };
    let checklist = BroadcastChecklist::new(100);
    let checklist_events = checklist.subscribe();

    let coordinator = CompletionCoordinator::new(sound, notifier, Arc::new(checklist))
        .with_snooze_secs(config.snooze_secs);

    // Create application state
    let state = Arc::new(AppState::new(
        store,
        coordinator,
        Arc::new(SystemClock),
        Arc::clone(&slots),
        config.host.clone(),
        config.port,
    ));

    // Mark recipe steps done as their timers are dismissed
    tokio::spawn(checklist_recorder_task(Arc::clone(&slots), checklist_events));

    let driver = TickDriver::new(Arc::clone(&state), config.tick_period());
    driver.mount();

    // Create HTTP router with all endpoints
    let app = create_router(state);

    // Bind to the specified address
    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  GET|POST /timers                 - List or add timers");
    info!("  GET|DELETE /timers/:id           - Read or remove a timer");
    info!("  POST /timers/:id/start|pause|reset");
    info!("  PUT  /timers/:id/remaining       - Adjust remaining time");
    info!("  GET  /steps?recipe_id=&step_index= - Timer for a recipe step");
    info!("  GET  /alert                      - Currently alerting timer");
    info!("  POST /alert/:id/dismiss|snooze");
    info!("  GET  /recipes/:recipe_id/checks  - Recorded step checklist");
    info!("  GET  /status                     - Engine status");
    info!("  GET  /health                     - Health check");

    // Setup graceful shutdown
    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    driver.unmount();
    info!("Server shutdown complete");
    Ok(())
}
