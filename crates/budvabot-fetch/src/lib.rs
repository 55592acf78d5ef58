//! # Budva Bot Fetchers
//!
//! One module per external data source. Every fetcher performs a single
//! outbound request with a bounded timeout and returns `Some(value)` on
//! success or `None` on any expected failure mode (network error, non-2xx
//! status, missing field, unparsable payload). Failures are logged, never
//! propagated — interactive handlers reply "data unavailable" and
//! scheduled polls simply skip the cycle.

pub mod llm;
pub mod noaa;
pub mod solar;
pub mod water;
pub mod weather;

pub use llm::CommentaryClient;
pub use solar::SolarClient;
pub use weather::{ForecastEntry, WeatherClient};

use std::time::Duration;

/// Every outbound fetch carries this timeout; a timed-out fetch is
/// treated the same as a network error.
pub(crate) const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
