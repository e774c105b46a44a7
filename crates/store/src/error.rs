use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: Uuid },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

impl StoreError {
    pub fn not_found(what: &'static str, id: Uuid) -> Self {
        StoreError::NotFound { what, id }
    }
}
