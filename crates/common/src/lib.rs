//! Shared utilities, configuration, and error handling for Unifest
//!
//! This crate provides common functionality used across the Unifest application:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - Shared database error types

pub mod config;
pub mod db;
pub mod error;

pub use config::Config;
pub use db::RepositoryError;
pub use error::{Error, Result};
