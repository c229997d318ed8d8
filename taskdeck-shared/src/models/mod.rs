//! Database models for Taskdeck
//!
//! # Models
//!
//! - `user`: user accounts, credentials and avatar URL
//! - `task`: to-do items
//!
//! Each model exposes its SQL as associated functions taking a `&PgPool`.
//! The rest of the application reaches them through the store traits in
//! [`crate::store`].

pub mod task;
pub mod user;
