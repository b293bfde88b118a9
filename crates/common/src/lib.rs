//! Common utilities and shared types for the Moz Solidária backend.
//!
//! This crate provides foundational components used across all workspace crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error taxonomy via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based identifiers and slugs via [`IdGenerator`]
//! - **Telemetry**: Operational counters via [`Telemetry`]
//!
//! # Example
//!
//! ```no_run
//! use mozsolidaria_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id = IdGenerator::new().generate();
//!     println!("{} -> {id}", config.server.url);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod telemetry;

pub use config::{Config, ExportConfig};
pub use error::{AppError, AppResult};
pub use id::{IdGenerator, slugify};
pub use telemetry::{Telemetry, TelemetrySnapshot, Timer, get_telemetry};
