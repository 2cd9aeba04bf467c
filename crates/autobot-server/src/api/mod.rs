//! HTTP API
//!
//! | Method | Path | Purpose |
//! |--------|------|---------|
//! | GET | `/` | service status and uptime |
//! | GET | `/vehiclestore/status` | history size and last log entry |
//! | GET | `/lookup?country=&hash=\|regnr=\|vin=` | vehicle lookup with remote fallback |
//! | PATCH | `/vehicle?hash=&op=enable\|disable` | toggle a record's disabled flag |

pub mod handlers;
pub mod middleware;

use crate::config::WebServiceConfig;
use crate::lookup::LookupRegistry;
use crate::scheduler::SchedulerState;
use crate::store::VehicleStore;
use axum::{
    routing::{get, patch},
    Router,
};
use chrono::{DateTime, Local};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tokio::sync::watch;
use tracing::info;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VehicleStore>,
    pub lookups: LookupRegistry,
    pub started_at: DateTime<Local>,
    pub scheduler: Option<watch::Receiver<SchedulerState>>,
}

impl AppState {
    pub fn new(store: Arc<VehicleStore>, lookups: LookupRegistry) -> Self {
        Self {
            store,
            lookups,
            started_at: Local::now(),
            scheduler: None,
        }
    }

    pub fn with_scheduler(mut self, state: watch::Receiver<SchedulerState>) -> Self {
        self.scheduler = Some(state);
        self
    }
}

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(handlers::service_status))
        .route("/vehiclestore/status", get(handlers::store_status))
        .route("/lookup", get(handlers::lookup))
        .route("/vehicle", patch(handlers::patch_vehicle))
        .with_state(state)
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(cors_origins))
}

/// Bind and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: &WebServiceConfig, state: AppState) -> anyhow::Result<()> {
    let app = router(state, &config.cors_origins);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
