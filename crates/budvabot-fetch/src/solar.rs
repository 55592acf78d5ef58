//! NASA DONKI solar flare fetcher and summary formatting.

use budvabot_core::types::FlareEvent;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

const DONKI_FLR_URL: &str = "https://api.nasa.gov/DONKI/FLR";

#[derive(Debug, Deserialize)]
struct DonkiFlare {
    #[serde(rename = "classType")]
    class_type: Option<String>,
    #[serde(rename = "beginTime")]
    begin_time: Option<String>,
}

#[derive(Clone)]
pub struct SolarClient {
    client: reqwest::Client,
    api_key: String,
}

impl SolarClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
        }
    }

    /// Flare events from the last three days, or `None` on any failure.
    /// An empty list is a successful fetch with nothing recorded.
    pub async fn flare_events(&self) -> Option<Vec<FlareEvent>> {
        let now = Utc::now();
        let start = (now - Duration::days(2)).format("%Y-%m-%d").to_string();
        let end = now.format("%Y-%m-%d").to_string();

        let resp = self
            .client
            .get(DONKI_FLR_URL)
            .query(&[
                ("startDate", start),
                ("endDate", end),
                ("api_key", self.api_key.clone()),
            ])
            .timeout(crate::FETCH_TIMEOUT)
            .send()
            .await;

        let resp = match resp {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::warn!("DONKI API returned {}", r.status());
                return None;
            }
            Err(e) => {
                tracing::warn!("DONKI fetch failed: {e}");
                return None;
            }
        };

        match resp.json::<Vec<DonkiFlare>>().await {
            Ok(raw) => Some(collect_events(raw)),
            Err(e) => {
                tracing::warn!("Unparsable DONKI payload: {e}");
                None
            }
        }
    }
}

fn collect_events(raw: Vec<DonkiFlare>) -> Vec<FlareEvent> {
    raw.into_iter()
        .map(|f| FlareEvent {
            class_type: f.class_type.unwrap_or_else(|| "unknown".into()),
            begin_time: f.begin_time.unwrap_or_else(|| "unknown time".into()),
        })
        .collect()
}

/// Severity marker per flare class letter.
pub fn class_marker(class_type: &str) -> &'static str {
    match class_type.chars().next() {
        Some('A') | Some('B') => "🟢",
        Some('C') => "🟡",
        Some('M') => "🟠",
        Some('X') => "🔴",
        _ => "⚪",
    }
}

/// One summary line per event; begin times are rendered in UTC when the
/// API timestamp parses, verbatim otherwise.
pub fn format_flare_summary(events: &[FlareEvent]) -> String {
    if events.is_empty() {
        return "No solar flares recorded in the last 3 days.".into();
    }
    let lines: Vec<String> = events
        .iter()
        .map(|e| {
            let time = format_begin_time(&e.begin_time);
            format!(
                "{} Class {} flare began at {}",
                class_marker(&e.class_type),
                e.class_type,
                time
            )
        })
        .collect();
    format!(
        "*Solar flares over the last 3 days:*\n{}",
        lines.join("\n")
    )
}

fn format_begin_time(begin_time: &str) -> String {
    let normalized = begin_time.replace('Z', "+00:00");
    match DateTime::parse_from_rfc3339(&normalized) {
        Ok(dt) => dt
            .with_timezone(&Utc)
            .format("%d.%m.%Y %H:%M UTC")
            .to_string(),
        Err(_) => begin_time.to_string(),
    }
}
