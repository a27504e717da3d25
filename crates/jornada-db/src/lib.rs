//! Persistence layer: models, PostgreSQL pool and migrations, query
//! functions, and the [`store::RecordStore`] seam used by the services.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;
