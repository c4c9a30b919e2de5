//! Common utilities and shared types for warden.
//!
//! This crate provides the foundational pieces used across all warden crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//!
//! # Example
//!
//! ```no_run
//! use warden_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("Mute role: {}", config.platform.mute_role);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;

pub use config::{Config, DatabaseConfig, PlatformConfig, ReversalConfig};
pub use error::{AppError, AppResult};
