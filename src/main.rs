use clap::Parser;
use constitucheck::{auth, config, web};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "ConstituCheck admin portal", long_about = None)]
struct Args {
    /// Bind address (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Identity provider: "memory" or "firebase" (overrides IDENTITY_PROVIDER)
    #[arg(long)]
    provider: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load .env file if it exists
    if let Err(e) = dotenvy::dotenv() {
        println!("No .env file found, using environment variables: {}", e);
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if args.json_logs {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let mut settings = config::get_settings().clone();
    if let Some(host) = args.host {
        settings.host = host;
    }
    if let Some(port) = args.port {
        settings.port = port;
    }
    if let Some(provider) = args.provider.as_deref() {
        settings.identity_provider = config::ProviderKind::parse(provider)
            .ok_or_else(|| anyhow::anyhow!("unknown identity provider: {}", provider))?;
    }

    info!("Starting {} {}...", settings.app_name, settings.version);

    let provider = auth::build_provider(&settings)?;

    let addr: SocketAddr = settings.address().parse()?;
    let sweep_every = Duration::from_secs(settings.client_sweep_interval_secs.max(1));
    let max_idle = Duration::from_secs(settings.client_idle_ttl_secs);
    let anonymous_idle = Duration::from_secs(settings.client_anonymous_ttl_secs);

    let state = web::AppState::new(settings, provider);
    let clients = Arc::clone(&state.clients);
    let sweeper = clients.spawn_sweeper(sweep_every, max_idle, anonymous_idle);

    let app = web::router(state);

    info!("ConstituCheck started on http://{}", addr);

    // Start server with graceful shutdown
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    clients.dispose_all();
    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutting down ConstituCheck...");
        },
        _ = terminate => {
            info!("Shutting down ConstituCheck...");
        },
    }
}
