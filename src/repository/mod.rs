//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM over SQLite.

pub mod batch;
pub mod context;
pub mod job;
pub mod meta;
pub mod models;
pub mod pool;
pub mod util;

pub use batch::JobBatch;
pub use context::DbContext;
pub use job::{JobOrder, JobPage, JobQuery, JobRepository};
pub use meta::MetaRepository;
pub use pool::{DbError, SqlitePool};
