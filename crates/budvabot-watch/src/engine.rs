//! Background poll loops.
//!
//! One tokio task per monitored activity, each driven by its own
//! `tokio::time::interval`. Tasks own their detection state (detector,
//! seen-set), so observation is single-writer by construction, and they
//! never call into the registry while holding any lock across an await.

use std::sync::Arc;

use budvabot_core::types::{FlareEvent, MessageFormat};
use budvabot_fetch::solar::{self, SolarClient};
use budvabot_fetch::water;
use budvabot_notify::Dispatcher;
use budvabot_store::SubscriberRegistry;
use tokio::task::JoinHandle;

use crate::detector::{ChangeDetector, DropEvent};
use crate::seen::SeenFlares;

/// Notification text for a water-temperature drop.
pub fn drop_notice(event: &DropEvent) -> String {
    format!(
        "Sea temperature dropped! Now: {}°C, was: {}°C.",
        event.current, event.previous
    )
}

/// Retain only events not yet announced.
pub fn filter_new_flares(seen: &mut SeenFlares, events: Vec<FlareEvent>) -> Vec<FlareEvent> {
    events
        .into_iter()
        .filter(|e| seen.first_sight(e))
        .collect()
}

/// Poll the water-temperature page and notify all subscribers on a
/// strict decrease. The task owns its detector.
pub fn spawn_water_watch(
    client: reqwest::Client,
    registry: Arc<SubscriberRegistry>,
    dispatcher: Arc<Dispatcher>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Water watch started (every {interval_secs}s)");
        let mut detector = ChangeDetector::new();
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

        loop {
            interval.tick().await;
            let sample = water::water_temp(&client).await;
            match detector.observe(sample) {
                Some(event) => {
                    let recipients = registry.chat_ids().await;
                    tracing::info!(
                        "Water dropped {} -> {}, notifying {} chat(s)",
                        event.previous,
                        event.current,
                        recipients.len()
                    );
                    dispatcher
                        .deliver(&recipients, &drop_notice(&event), MessageFormat::Plain)
                        .await;
                }
                None => {
                    tracing::debug!("Water check: no drop (sample: {sample:?})");
                }
            }
        }
    })
}

/// Poll DONKI for flare events and announce each one on first sight.
pub fn spawn_flare_watch(
    solar: SolarClient,
    registry: Arc<SubscriberRegistry>,
    dispatcher: Arc<Dispatcher>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!("Flare watch started (every {interval_secs}s)");
        let mut seen = SeenFlares::default();
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(interval_secs));

        loop {
            interval.tick().await;
            let Some(events) = solar.flare_events().await else {
                // Skipped cycle; the next poll covers the same window.
                continue;
            };
            let fresh = filter_new_flares(&mut seen, events);
            if fresh.is_empty() {
                tracing::debug!("Flare check: nothing new");
                continue;
            }
            let summary = solar::format_flare_summary(&fresh);
            let recipients = registry.chat_ids().await;
            tracing::info!(
                "{} new flare(s), notifying {} chat(s)",
                fresh.len(),
                recipients.len()
            );
            dispatcher
                .deliver(&recipients, &summary, MessageFormat::Markdown)
                .await;
        }
    })
}
