//! Sea-water temperature scrape for Budva.
//!
//! Best effort by design: the page structure is not under our control, so
//! any structural mismatch yields `None` rather than a parse error.

use regex::Regex;
use scraper::{Html, Selector};

const WATER_URL: &str = "https://world-weather.ru/pogoda/montenegro/budva/water/";
// The page blocks non-browser clients.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64)";

/// Current sea-water temperature in °C, or `None` on any failure.
pub async fn water_temp(client: &reqwest::Client) -> Option<f64> {
    let resp = client
        .get(WATER_URL)
        .header("User-Agent", USER_AGENT)
        .timeout(crate::FETCH_TIMEOUT)
        .send()
        .await;

    let resp = match resp {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            tracing::warn!("Water page returned {}", r.status());
            return None;
        }
        Err(e) => {
            tracing::warn!("Water page fetch failed: {e}");
            return None;
        }
    };

    match resp.text().await {
        Ok(html) => extract_water_temp(&html),
        Err(e) => {
            tracing::warn!("Water page body read failed: {e}");
            None
        }
    }
}

/// Locate the known temperature element and pull the first signed
/// integer out of its text.
pub fn extract_water_temp(html: &str) -> Option<f64> {
    let doc = Html::parse_document(html);
    let selector = Selector::parse("#weather-now-number").ok()?;
    let element = doc.select(&selector).next()?;
    let text: String = element.text().collect();

    let re = Regex::new(r"([-+]?\d+)").ok()?;
    let captured = re.captures(&text)?.get(1)?.as_str();
    captured.parse::<f64>().ok()
}
