use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use std::str::FromStr;

pub type Connection = sqlx::SqliteConnection;
pub type Pool = SqlitePool;

// SQLITE_CONSTRAINT_CHECK extended result code.
const CHECK_CONSTRAINT: &str = "275";

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Infrastructure(sqlx::Error),
    #[error("Resource not found")]
    NotFound,
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),
    #[error("Stored row is invalid: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return RepositoryError::NotFound;
        }

        let check_failure = err
            .as_database_error()
            .filter(|db_err| db_err.code().as_deref() == Some(CHECK_CONSTRAINT))
            .map(|db_err| db_err.message().to_string());

        match check_failure {
            Some(msg) => RepositoryError::CheckViolation(msg),
            None => RepositoryError::Infrastructure(err),
        }
    }
}

/// Handle to the ledger store. Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct Database {
    pub pool: Pool,
}

impl Database {
    pub async fn new(connection_string: &str) -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::from_str(connection_string)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        tracing::debug!("Opened database {}", connection_string);
        Ok(Self { pool })
    }

    /// A private in-memory ledger. The pool pins a single connection that
    /// never expires, because SQLite drops an in-memory database together
    /// with its last connection.
    pub async fn in_memory() -> sqlx::Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        let migrator = sqlx::migrate!("../../migrations");
        tracing::info!("Applying {} migration(s)", migrator.iter().count());
        migrator.run(&self.pool).await
    }

    pub async fn begin(&self) -> Result<UnitOfWork<'_>, RepositoryError> {
        Ok(UnitOfWork {
            tx: self.pool.begin().await?,
        })
    }
}

/// One database transaction. Dropped without `commit` it rolls back.
pub struct UnitOfWork<'a> {
    tx: sqlx::Transaction<'a, Sqlite>,
}

impl UnitOfWork<'_> {
    pub async fn commit(self) -> Result<(), RepositoryError> {
        Ok(self.tx.commit().await?)
    }

    pub fn connection(&mut self) -> &mut Connection {
        &mut self.tx
    }
}

/// Migrated in-memory database for tests in this and downstream crates.
pub async fn get_test_db() -> Database {
    let db = Database::in_memory()
        .await
        .expect("Failed to open in-memory database");
    db.run_migrations().await.expect("Failed to run migrations");
    db
}
