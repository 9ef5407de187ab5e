//! grievance-server - standalone REST server for the grievance lifecycle.
//!
//! Configuration is read from the environment (and `.env`); see
//! `grievance_server::config` for the variables.

use std::sync::Arc;

use anyhow::Context;
use grievance_core::{memory::MemoryStore, GrievanceService, GrievanceServiceImpl};
use grievance_postgres::{run_migrations, PgStores};
use grievance_server::config::{ServerConfig, StoreBackend};
use grievance_server::router::build_router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,grievance_server=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let service: Arc<dyn GrievanceService> = match &config.store {
        StoreBackend::Postgres(db) => {
            let pool = db.connect().await.context("failed to connect to database")?;
            if config.run_migrations {
                run_migrations(&pool).await.context("failed to run migrations")?;
            }
            let stores = PgStores::from_pool(pool);
            Arc::new(
                GrievanceServiceImpl::new(stores.grievances, stores.reference, stores.activity)
                    .with_policy(config.policy),
            )
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            let store = Arc::new(MemoryStore::new().with_campus_reference());
            Arc::new(
                GrievanceServiceImpl::new(store.clone(), store.clone(), store)
                    .with_policy(config.policy),
            )
        }
    };
    tracing::info!(policy = config.policy.as_str(), "grievance service ready");

    let app = build_router(service).layer(
        ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        ),
    );

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_addr))?;
    tracing::info!("grievance-server listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
