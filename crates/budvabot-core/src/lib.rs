//! # Budva Bot Core
//! Shared types, error enum, and configuration.

pub mod config;
pub mod error;
pub mod types;

pub use config::BotConfig;
pub use error::{BotError, Result};
