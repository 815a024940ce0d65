//! Storage layer for the opt-out service
//!
//! Entities, the broker traits services depend on, and two backends:
//!
//! - [`PgStorage`]: Postgres through sqlx, schema managed by embedded
//!   migrations
//! - [`MemoryStorage`]: process-local tables with the same uniqueness and
//!   reference rules, for development and tests
//!
//! Plus [`AuditLogger`], which writes audit rows through whichever backend is
//! active.
//!
//! # Example
//!
//! ```rust,no_run
//! use database_layer::{DatabasePool, PgStorage, PoolConfig, PatientStore};
//!
//! # async fn run() -> Result<(), database_layer::DatabaseError> {
//! let pool = DatabasePool::new("postgresql://localhost/optout", &PoolConfig::default()).await?;
//! pool.run_migrations().await?;
//!
//! let storage = PgStorage::new(pool);
//! let patient = storage.find_patient_by_nhs_number("9434765919").await?;
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod connection;
pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod store;

pub use audit::{AuditEvent, AuditLevel, AuditLogger, AuditType};
pub use connection::{DatabasePool, PoolConfig};
pub use error::*;
pub use memory::MemoryStorage;
pub use models::*;
pub use postgres::PgStorage;
pub use store::*;
