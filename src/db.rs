use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::errors::AppError;

pub async fn init_pool(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::Unexpected(format!("migrations failed: {e}")))?;
    log::info!("Database migrations complete");
    Ok(())
}
