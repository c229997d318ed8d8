//! # Taskdeck API Server Library
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from environment variables
//! - `error`: error handling and HTTP response mapping
//! - `routes`: route handlers
//! - `telemetry`: tracing subscriber setup

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod telemetry;
