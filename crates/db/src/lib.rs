use std::{str::FromStr, time::Duration};

use sqlx::{
    Error, SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tracing::info;

pub mod models;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct DBService {
    pub pool: SqlitePool,
}

impl DBService {
    /// Open (creating if needed) the database at `database_url` and apply pending migrations.
    pub async fn new(database_url: &str) -> Result<DBService, Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;
        Self::migrate(&pool).await?;
        info!(database_url, "Database ready");
        Ok(DBService { pool })
    }

    /// Single-connection in-memory database, mostly for tests.
    pub async fn new_in_memory() -> Result<DBService, Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::migrate(&pool).await?;
        Ok(DBService { pool })
    }

    async fn migrate(pool: &SqlitePool) -> Result<(), Error> {
        sqlx::migrate!("./migrations").run(pool).await?;
        Ok(())
    }
}
