use axum::serve;
use dotenvy::dotenv;
use secure_link::{create_router, AppState, Config, LinkEngine};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const DEFAULT_TRACING_LEVEL: &str = "secure_link=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    _ = dotenv();
    configure_tracing();
    let config = Config::from_env().expect("Invalid configuration");
    let engine = Arc::new(LinkEngine::new(config.store(), config.codec()));
    sweep(&engine).await;
    let _scheduler = configure_scheduler(&config.sweep_cron, engine.clone()).await;
    let listener = create_listener(config.server_address).await;
    let mut state = AppState::new(engine);
    if let Some(digest) = config.admin_api_key_sha3.as_deref() {
        state = state.with_admin_key_sha3(digest);
    } else {
        tracing::warn!("ADMIN_API_KEY_SHA3 is not set, admin endpoints are unauthenticated");
    }
    serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server failed to start");
    tracing::info!("Server shut down gracefully");
}

fn configure_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or(DEFAULT_TRACING_LEVEL.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn sweep(engine: &LinkEngine) {
    match engine.sweep().await {
        Ok(0) => tracing::debug!("Sweep found no expired links"),
        Ok(removed) => tracing::info!("Sweep removed {} expired links", removed),
        Err(err) => tracing::error!("Sweeping expired links failed: {}", err),
    }
}

async fn configure_scheduler(cron_expression: &str, engine: Arc<LinkEngine>) -> JobScheduler {
    let scheduler = JobScheduler::new()
        .await
        .expect("Creating scheduler failed");
    scheduler
        .add(create_sweeping_job(cron_expression, engine))
        .await
        .expect("Adding sweeping job to scheduler failed");
    scheduler.start().await.expect("Starting scheduler failed");
    scheduler
}

fn create_sweeping_job(cron_expression: &str, engine: Arc<LinkEngine>) -> Job {
    Job::new_async(cron_expression, move |_, _| {
        let engine = engine.clone();
        Box::pin(async move { sweep(&engine).await })
    })
    .expect("Creating sweeping job failed")
}

async fn create_listener(server_address: SocketAddr) -> TcpListener {
    let listener = TcpListener::bind(server_address)
        .await
        .expect("Creating tcp listener failed");
    tracing::info!("Listening on address: {}", server_address);
    listener
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Installing Ctrl+C handler failed");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Installing SIGTERM handler failed")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Server shutting down gracefully...");
}
