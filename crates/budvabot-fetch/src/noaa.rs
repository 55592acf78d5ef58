//! NOAA SWPC plain-text bulletin fetcher.
//!
//! The forecast discussion is a fixed-layout text file with named section
//! headers. We return the text under a header, or `None` when the layout
//! has shifted.

const DISCUSSION_URL: &str = "https://services.swpc.noaa.gov/text/discussion.txt";

const GEOMAGNETIC_HEADER: &str = "Geomagnetic Activity";

/// The geomagnetic activity section of the SWPC forecast discussion,
/// or `None` on any failure.
pub async fn geomagnetic_forecast(client: &reqwest::Client) -> Option<String> {
    let resp = client
        .get(DISCUSSION_URL)
        .timeout(crate::FETCH_TIMEOUT)
        .send()
        .await;

    let resp = match resp {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            tracing::warn!("SWPC discussion returned {}", r.status());
            return None;
        }
        Err(e) => {
            tracing::warn!("SWPC discussion fetch failed: {e}");
            return None;
        }
    };

    match resp.text().await {
        Ok(text) => extract_section(&text, GEOMAGNETIC_HEADER),
        Err(e) => {
            tracing::warn!("SWPC discussion body read failed: {e}");
            None
        }
    }
}

/// Text between the named header line and the next header (a line ending
/// in "..." by SWPC convention) or end of input. Empty sections count as
/// a structural mismatch.
pub fn extract_section(bulletin: &str, header: &str) -> Option<String> {
    let mut lines = bulletin.lines();
    lines.by_ref().find(|l| l.contains(header))?;

    let mut section = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if trimmed.ends_with("...") && !section.is_empty() {
            break;
        }
        if !trimmed.is_empty() {
            section.push(trimmed.to_string());
        }
    }

    if section.is_empty() {
        None
    } else {
        Some(section.join("\n"))
    }
}
