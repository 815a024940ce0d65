use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {detail}")]
    AlreadyExists { entity: &'static str, detail: String },

    #[error("Foreign key violation on {entity}: {detail}")]
    ForeignKeyViolation { entity: &'static str, detail: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),
}

impl DatabaseError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DatabaseError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn already_exists(entity: &'static str, detail: impl Into<String>) -> Self {
        DatabaseError::AlreadyExists {
            entity,
            detail: detail.into(),
        }
    }

    pub fn foreign_key(entity: &'static str, detail: impl Into<String>) -> Self {
        DatabaseError::ForeignKeyViolation {
            entity,
            detail: detail.into(),
        }
    }

    /// Translate a driver error raised while writing `entity`, surfacing
    /// constraint violations as their own variants.
    pub fn from_sqlx(entity: &'static str, error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_error) = &error {
            let detail = db_error
                .constraint()
                .map_or_else(|| db_error.message().to_string(), str::to_string);
            if db_error.is_unique_violation() {
                return Self::already_exists(entity, detail);
            }
            if db_error.is_foreign_key_violation() {
                return Self::foreign_key(entity, detail);
            }
        }
        match error {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                DatabaseError::ConnectionFailed(error.to_string())
            }
            other => DatabaseError::SqlxError(other),
        }
    }

    /// Whether retrying later could succeed.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, DatabaseError::ConnectionFailed(_))
    }
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
