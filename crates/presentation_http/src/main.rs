//! remindd HTTP Server
//!
//! Main entry point: wires the store, engine and notification transport
//! together, then runs either the self-driven polling loop or event mode,
//! where the delayed-callback service drives the webhooks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use application::ports::SystemClock;
use application::services::{
    AlertSchedulePublisher, NotificationDispatcher, ReminderEngine, SchedulingReminderStore,
    TriggerService,
};
use infrastructure::adapters::{
    EmailSenderConfig, HttpCallbackQueue, HttpEmailSender, QueueClientConfig,
};
use infrastructure::config::AppConfig;
use infrastructure::persistence::{SqliteReminderStore, create_pool};
use infrastructure::scheduler::{PollingScheduler, spawn_cleanup_job};
use presentation_http::{AppState, SigningKeys, routes};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    init_tracing(&config.server.log_format);
    if let Some(e) = config_error {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    info!("remindd v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        host = %config.server.host,
        port = config.server.port,
        use_polling = config.engine.use_polling,
        tick_interval_ms = config.engine.effective_tick_interval_ms(),
        "Configuration loaded"
    );

    // Storage
    let pool = create_pool(&config.database).context("failed to open database")?;
    let sqlite_store = Arc::new(SqliteReminderStore::new(Arc::new(pool)));

    // In event mode every store mutation is mirrored into the
    // delayed-callback queue; in polling mode the decorator passes through.
    let publisher = if config.engine.use_polling {
        None
    } else {
        let queue = HttpCallbackQueue::new(QueueClientConfig::from(&config.queue))
            .map_err(|e| anyhow::anyhow!("failed to initialize callback queue client: {e}"))?;
        Some(Arc::new(AlertSchedulePublisher::new(
            Arc::new(queue),
            Arc::new(SystemClock),
            config.webhook.base_url.clone(),
        )))
    };
    let store = Arc::new(SchedulingReminderStore::new(
        Arc::clone(&sqlite_store),
        publisher.clone(),
    ));

    // Notification transport
    if config.notifier.api_key.is_none() {
        warn!("notifier.api_key not configured; notification delivery will fail");
    }
    let sender = HttpEmailSender::new(EmailSenderConfig::from(&config.notifier))
        .map_err(|e| anyhow::anyhow!("failed to initialize email sender: {e}"))?;
    let dispatcher = NotificationDispatcher::new(Arc::new(sender));

    // Engine and trigger service
    let engine = Arc::new(ReminderEngine::new(
        Arc::clone(&store),
        dispatcher,
        Arc::new(SystemClock),
        config.engine.to_engine_config(),
    ));
    let trigger_service = Arc::new(TriggerService::new(Arc::clone(&engine), Arc::clone(&store)));

    let signing_keys = SigningKeys::from_config(&config.webhook);
    if signing_keys.is_none() {
        warn!("webhook signing keys not configured; callbacks will be rejected");
    }

    // Mode selection
    let mut polling_scheduler = None;
    let mut cleanup_jobs = None;
    let mut scheduler_stats = None;

    if config.engine.use_polling {
        let interval = Duration::from_millis(
            u64::try_from(config.engine.effective_tick_interval_ms()).unwrap_or(3000),
        );
        let mut scheduler = PollingScheduler::new(Arc::clone(&engine), interval);
        scheduler.start();
        scheduler_stats = Some(scheduler.stats_handle());
        polling_scheduler = Some(scheduler);

        let jobs = spawn_cleanup_job(Arc::clone(&engine), &config.engine.cleanup_cron)
            .await
            .map_err(|e| anyhow::anyhow!("failed to schedule cleanup job: {e}"))?;
        cleanup_jobs = Some(jobs);
        info!("Polling mode active");
    } else if let Some(ref publisher) = publisher {
        info!("Event mode active; alerts arrive via webhooks");
        // The remote schedule is the only GC path in event mode
        match publisher.schedule_cleanup(&config.engine.cleanup_cron).await {
            Ok(id) => info!(schedule_id = %id, "Cleanup schedule registered"),
            Err(e) => warn!(error = %e, "Failed to register cleanup schedule"),
        }
    }

    // HTTP server
    let state = AppState {
        engine: Arc::clone(&engine),
        trigger_service,
        store: Arc::clone(&sqlite_store),
        signing_keys,
        scheduler_stats,
    };
    let app = routes::create_router(state).layer(TraceLayer::new_for_http());

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Finish any in-progress tick, then stop
    if let Some(mut scheduler) = polling_scheduler {
        scheduler.stop().await;
    }
    if let Some(mut jobs) = cleanup_jobs {
        let _ = jobs.shutdown().await;
    }
    info!("Shutdown complete");
    Ok(())
}

fn init_tracing(log_format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "remindd_server=info,presentation_http=info,infrastructure=info,application=info,tower_http=info".into());

    if log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
