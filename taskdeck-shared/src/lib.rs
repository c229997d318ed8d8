//! # Taskdeck Shared Library
//!
//! Domain types, persistence and integrations used by the Taskdeck API server.
//!
//! ## Module Organization
//!
//! - `auth`: password digests, bearer tokens, request auth context
//! - `models`: database models and their SQL
//! - `db`: connection pool and migrations
//! - `store`: user and task store traits with PostgreSQL and in-memory backends
//! - `cache`: Redis/in-memory cache and the cache-aside task reader
//! - `storage`: object storage and avatar ingestion

pub mod auth;
pub mod cache;
pub mod db;
pub mod models;
pub mod storage;
pub mod store;

/// Current version of the Taskdeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
