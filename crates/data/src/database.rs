use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub struct DatabaseClient {
    pool: PgPool,
}

impl DatabaseClient {
    /// Creates a new database client connected to the specified `PostgreSQL` database.
    ///
    /// # Errors
    /// Returns an error if the database connection cannot be established.
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Returns a handle to the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Closes the pool, waiting for in-flight connections to finish.
    ///
    /// The pipeline closes the store connection before formatting begins
    /// so nothing is held across the chunking and delivery phases.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
