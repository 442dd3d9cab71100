//! Storage layer
//!
//! SQLite (embedded) behind a single connection pool; the schema is created
//! at startup if absent.

pub mod db;

pub use db::Database;
