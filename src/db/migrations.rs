use sqlx::postgres::PgPool;
use sqlx::{Executor, Row};

/// Schema files, applied in this order. Embedded so the binary does not
/// depend on its working directory.
pub const MIGRATIONS: &[(&str, &str)] = &[
    (
        "0001_create_producto_servicios",
        include_str!("../../migrations/0001_create_producto_servicios.sql"),
    ),
    (
        "0002_create_users",
        include_str!("../../migrations/0002_create_users.sql"),
    ),
    (
        "0003_create_pacientes_estancias",
        include_str!("../../migrations/0003_create_pacientes_estancias.sql"),
    ),
    (
        "0004_create_hojas_enfermerias",
        include_str!("../../migrations/0004_create_hojas_enfermerias.sql"),
    ),
];

/// Run every migration not yet recorded in the tracking table.
///
/// Each file runs in its own transaction together with its tracking row, so
/// a failed file leaves no half-applied schema behind.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::Error> {
    init_migrations_tracker(pool).await?;
    let applied = applied_migrations(pool).await?;

    let mut count = 0;
    for (name, sql) in MIGRATIONS {
        if applied.iter().any(|a| a == name) {
            tracing::debug!("Skipping applied migration {}", name);
            continue;
        }

        tracing::info!("Running migration: {}", name);
        let mut tx = pool.begin().await?;
        (&mut *tx).execute(*sql).await?;
        sqlx::query("INSERT INTO migrations (name) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(*name)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        count += 1;
    }

    tracing::info!("✓ Migrations up to date ({} applied now)", count);
    Ok(count)
}

/// Create the migrations table (for tracking applied migrations)
pub async fn init_migrations_tracker(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn applied_migrations(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT name FROM migrations ORDER BY name")
        .fetch_all(pool)
        .await?;
    rows.iter().map(|row| row.try_get("name")).collect()
}
