use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use hoja_enfermeria::{
    db::migrations::run_migrations, router, seed::seed_demo_employees, AppConfig, AppState,
    MemoryStore, PgStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;

    let state = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .connect(database_url)
                .await
                .context("Failed to connect to database")?;

            // Verify database connection
            sqlx::query("SELECT 1")
                .execute(&pool)
                .await
                .context("Database connection failed")?;
            tracing::info!("✓ Database connected successfully");

            if config.run_migrations {
                run_migrations(&pool)
                    .await
                    .context("Failed to run migrations")?;
            }

            AppState::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("⚠ DATABASE_URL not set - using in-memory store, data is lost on exit");
            AppState::new(MemoryStore::new())
        }
    };

    if config.seed_demo {
        seed_demo_employees(state.store.as_ref())
            .await
            .context("Failed to seed demo employees")?;
    }

    let addr = config.bind_addr().map_err(anyhow::Error::msg)?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    tracing::info!("🚀 Server running on http://{}", addr);
    tracing::info!("📋 Nursing sheets at http://{}/hojasenfermerias/{{id}}", addr);

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}
