//! Interactive command surface.
//!
//! Each handler builds a reply string from the registry and fetchers;
//! the update loop in `main` sends it back to the invoking chat. Pure
//! reply builders are split out so handlers are testable without a bot.

use std::sync::Arc;

use budvabot_core::types::ZodiacSign;
use budvabot_fetch::{CommentaryClient, ForecastEntry, SolarClient, WeatherClient, noaa, solar, water};
use budvabot_store::SubscriberRegistry;

/// Everything a handler needs, shared by the update loop.
pub struct BotContext {
    pub registry: Arc<SubscriberRegistry>,
    pub weather: WeatherClient,
    pub solar: SolarClient,
    pub commentary: CommentaryClient,
    /// Shared client for the scrape/bulletin fetchers.
    pub http: reqwest::Client,
}

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Temp,
    Water,
    Forecast,
    Solar,
    Geomag,
    Sign(String),
    Horoscope,
    Alert { kind: String, threshold: String },
    Unknown,
}

/// Parse a message text into a command. A `@botname` suffix on the
/// command word is stripped, as Telegram appends it in group chats.
pub fn parse_command(text: &str) -> Option<Command> {
    let mut parts = text.trim().split_whitespace();
    let word = parts.next()?;
    if !word.starts_with('/') {
        return None;
    }
    let name = word.split('@').next().unwrap_or(word);

    let command = match name {
        "/start" => Command::Start,
        "/temp" => Command::Temp,
        "/water" => Command::Water,
        "/forecast" => Command::Forecast,
        "/solar" => Command::Solar,
        "/geomag" => Command::Geomag,
        "/sign" => Command::Sign(parts.collect::<Vec<_>>().join(" ")),
        "/horoscope" => Command::Horoscope,
        "/alert" => {
            let kind = parts.next().unwrap_or_default().to_string();
            let threshold = parts.next().unwrap_or_default().to_string();
            Command::Alert { kind, threshold }
        }
        _ => Command::Unknown,
    };
    Some(command)
}

/// Route one command to its handler and return the reply text.
pub async fn handle_command(ctx: &BotContext, chat_id: i64, command: Command) -> String {
    match command {
        Command::Start => handle_start(ctx, chat_id).await,
        Command::Temp => handle_temp(ctx, chat_id).await,
        Command::Water => water_reply(water::water_temp(&ctx.http).await),
        Command::Forecast => handle_forecast(ctx, chat_id).await,
        Command::Solar => handle_solar(ctx).await,
        Command::Geomag => geomag_reply(noaa::geomagnetic_forecast(&ctx.http).await),
        Command::Sign(name) => handle_sign(ctx, chat_id, &name).await,
        Command::Horoscope => handle_horoscope(ctx, chat_id).await,
        Command::Alert { kind, threshold } => handle_alert(ctx, chat_id, &kind, &threshold).await,
        Command::Unknown => "Unknown command. Try /temp, /water, /forecast or /solar.".into(),
    }
}

/// A location message overwrites the subscriber's coordinate.
pub async fn handle_location(ctx: &BotContext, chat_id: i64, lat: f64, lon: f64) -> String {
    match ctx.registry.set_location(chat_id, lat, lon).await {
        Ok(()) => "Location saved. Weather commands now use it.".into(),
        Err(e) => {
            tracing::error!("Failed to save location for chat {chat_id}: {e}");
            "Could not save your location, please try again later.".into()
        }
    }
}

async fn handle_start(ctx: &BotContext, chat_id: i64) -> String {
    match ctx.registry.ensure_subscriber(chat_id).await {
        Ok(()) => {
            "Bot started! Send your location to get weather for your area. \
             You will also receive sea-temperature and solar-flare alerts for Budva."
                .into()
        }
        Err(e) => {
            tracing::error!("Failed to register chat {chat_id}: {e}");
            "Could not register this chat, please try again later.".into()
        }
    }
}

async fn handle_temp(ctx: &BotContext, chat_id: i64) -> String {
    let Some(coord) = ctx.registry.coordinate(chat_id).await else {
        return NO_LOCATION_REPLY.into();
    };
    temp_reply(
        ctx.weather
            .current_temp(coord.latitude, coord.longitude)
            .await,
    )
}

async fn handle_forecast(ctx: &BotContext, chat_id: i64) -> String {
    let Some(coord) = ctx.registry.coordinate(chat_id).await else {
        return NO_LOCATION_REPLY.into();
    };
    let current = ctx
        .weather
        .current_temp(coord.latitude, coord.longitude)
        .await;
    let entries = ctx
        .weather
        .forecast(coord.latitude, coord.longitude)
        .await;
    forecast_reply(current, entries)
}

async fn handle_solar(ctx: &BotContext) -> String {
    match ctx.solar.flare_events().await {
        Some(events) => solar::format_flare_summary(&events),
        None => "Failed to retrieve solar flare data.".into(),
    }
}

async fn handle_sign(ctx: &BotContext, chat_id: i64, name: &str) -> String {
    if name.trim().is_empty() {
        return sign_usage();
    }
    let sign: ZodiacSign = match name.parse() {
        Ok(sign) => sign,
        Err(_) => return sign_usage(),
    };
    match ctx.registry.set_sign(chat_id, sign).await {
        Ok(()) => format!("Sign saved: {sign}. Use /horoscope whenever you like."),
        Err(e) => {
            tracing::error!("Failed to save sign for chat {chat_id}: {e}");
            "Could not save your sign, please try again later.".into()
        }
    }
}

async fn handle_horoscope(ctx: &BotContext, chat_id: i64) -> String {
    let Some(sign) = ctx.registry.sign(chat_id).await else {
        return "Set your sign first, e.g. /sign leo".into();
    };
    let prompt = format!("Write a short, playful daily horoscope for {sign}.");
    match ctx
        .commentary
        .commentary("You are a witty seaside-resort astrologer.", &prompt)
        .await
    {
        Some(text) => text,
        None => format!("The stars are quiet for {sign} today. Try again later."),
    }
}

async fn handle_alert(ctx: &BotContext, chat_id: i64, kind: &str, threshold: &str) -> String {
    if kind.is_empty() {
        return "Usage: /alert <kind> <threshold>, e.g. /alert water 20".into();
    }
    let threshold: f64 = match threshold.parse() {
        Ok(v) => v,
        Err(_) => return "Threshold must be a number, e.g. /alert water 20".into(),
    };
    match ctx.registry.set_alert(chat_id, kind, threshold).await {
        Ok(()) => format!("Alert saved: {kind} at {threshold}."),
        Err(e) => {
            tracing::error!("Failed to save alert for chat {chat_id}: {e}");
            "Could not save your alert, please try again later.".into()
        }
    }
}

// --- Pure reply builders ---

pub const NO_LOCATION_REPLY: &str =
    "No location set. Send your location to get weather for your area.";

pub fn temp_reply(temp: Option<f64>) -> String {
    match temp {
        Some(t) => format!("Current air temperature: {t}°C"),
        None => "Failed to retrieve temperature data.".into(),
    }
}

pub fn water_reply(temp: Option<f64>) -> String {
    match temp {
        Some(t) => format!("Sea temperature in Budva: {t}°C"),
        None => "Failed to retrieve sea temperature data.".into(),
    }
}

pub fn forecast_reply(current: Option<f64>, entries: Option<Vec<ForecastEntry>>) -> String {
    let Some(entries) = entries else {
        return "Failed to retrieve the forecast.".into();
    };
    let mut lines = Vec::with_capacity(entries.len() + 1);
    if let Some(t) = current {
        lines.push(format!("Current air temperature: {t}°C"));
    }
    for entry in entries {
        lines.push(format!(
            "{}: {}°C, {}",
            entry.dt_txt, entry.temp, entry.description
        ));
    }
    lines.join("\n")
}

pub fn geomag_reply(section: Option<String>) -> String {
    match section {
        Some(text) => format!("Geomagnetic activity forecast:\n{text}"),
        None => "Failed to retrieve the geomagnetic forecast.".into(),
    }
}

fn sign_usage() -> String {
    let signs: Vec<&str> = ZodiacSign::ALL.iter().map(|s| s.as_str()).collect();
    format!("Unknown sign. Valid signs: {}.", signs.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use budvabot_core::config::LlmConfig;
    use budvabot_store::MemoryStore;
    use std::sync::atomic::Ordering;

    async fn test_ctx() -> BotContext {
        test_ctx_with(MemoryStore::new()).await
    }

    async fn test_ctx_with(store: MemoryStore) -> BotContext {
        BotContext {
            registry: Arc::new(
                SubscriberRegistry::load(Arc::new(store)).await.unwrap(),
            ),
            weather: WeatherClient::new("test-key".into()),
            solar: SolarClient::new("test-key".into()),
            commentary: CommentaryClient::new(&LlmConfig::default()),
            http: reqwest::Client::new(),
        }
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("/start"), Some(Command::Start));
        assert_eq!(parse_command("/temp@budvabot"), Some(Command::Temp));
        assert_eq!(
            parse_command("/sign leo"),
            Some(Command::Sign("leo".into()))
        );
        assert_eq!(
            parse_command("/alert water 20"),
            Some(Command::Alert {
                kind: "water".into(),
                threshold: "20".into()
            })
        );
        assert_eq!(parse_command("/frobnicate"), Some(Command::Unknown));
        assert_eq!(parse_command("hello there"), None);
        assert_eq!(parse_command(""), None);
    }

    #[tokio::test]
    async fn test_start_registers_subscriber() {
        let ctx = test_ctx().await;
        let reply = handle_command(&ctx, 42, Command::Start).await;
        assert!(reply.starts_with("Bot started"));
        assert_eq!(ctx.registry.chat_ids().await, vec![42]);
    }

    #[tokio::test]
    async fn test_temp_without_location() {
        let ctx = test_ctx().await;
        let reply = handle_command(&ctx, 42, Command::Temp).await;
        assert_eq!(reply, NO_LOCATION_REPLY);
    }

    #[test]
    fn test_failed_fetch_replies() {
        assert_eq!(temp_reply(None), "Failed to retrieve temperature data.");
        assert_eq!(
            water_reply(None),
            "Failed to retrieve sea temperature data."
        );
        assert_eq!(forecast_reply(Some(20.0), None), "Failed to retrieve the forecast.");
    }

    #[test]
    fn test_successful_replies() {
        assert_eq!(temp_reply(Some(24.5)), "Current air temperature: 24.5°C");
        assert_eq!(water_reply(Some(22.0)), "Sea temperature in Budva: 22°C");
    }

    #[test]
    fn test_forecast_reply_lines() {
        let entries = vec![
            ForecastEntry {
                dt_txt: "2024-07-01 12:00:00".into(),
                temp: 27.1,
                description: "clear sky".into(),
            },
            ForecastEntry {
                dt_txt: "2024-07-01 15:00:00".into(),
                temp: 28.4,
                description: "few clouds".into(),
            },
        ];
        let reply = forecast_reply(Some(26.0), Some(entries));
        assert!(reply.starts_with("Current air temperature: 26°C\n"));
        assert!(reply.contains("2024-07-01 12:00:00: 27.1°C, clear sky"));
        assert!(reply.contains("2024-07-01 15:00:00: 28.4°C, few clouds"));
    }

    #[tokio::test]
    async fn test_invalid_sign_leaves_state_unchanged() {
        let ctx = test_ctx().await;
        ctx.registry
            .set_sign(42, ZodiacSign::Leo)
            .await
            .unwrap();

        let reply = handle_command(&ctx, 42, Command::Sign("banana".into())).await;
        assert!(reply.starts_with("Unknown sign."));
        assert!(reply.contains("aquarius"));
        assert_eq!(ctx.registry.sign(42).await, Some(ZodiacSign::Leo));
    }

    #[tokio::test]
    async fn test_valid_sign_is_saved() {
        let ctx = test_ctx().await;
        let reply = handle_command(&ctx, 42, Command::Sign("Scorpio".into())).await;
        assert!(reply.contains("scorpio"));
        assert_eq!(ctx.registry.sign(42).await, Some(ZodiacSign::Scorpio));
    }

    #[tokio::test]
    async fn test_horoscope_requires_sign() {
        let ctx = test_ctx().await;
        let reply = handle_command(&ctx, 42, Command::Horoscope).await;
        assert!(reply.contains("/sign"));
    }

    #[tokio::test]
    async fn test_horoscope_falls_back_without_llm() {
        let ctx = test_ctx().await;
        ctx.registry.set_sign(42, ZodiacSign::Pisces).await.unwrap();
        let reply = handle_command(&ctx, 42, Command::Horoscope).await;
        assert!(reply.contains("pisces"));
    }

    #[tokio::test]
    async fn test_alert_validation_and_save() {
        let ctx = test_ctx().await;
        let reply = handle_command(
            &ctx,
            42,
            Command::Alert {
                kind: "water".into(),
                threshold: "warm".into(),
            },
        )
        .await;
        assert!(reply.starts_with("Threshold must be a number"));

        let reply = handle_command(
            &ctx,
            42,
            Command::Alert {
                kind: "water".into(),
                threshold: "20".into(),
            },
        )
        .await;
        assert_eq!(reply, "Alert saved: water at 20.");
    }

    #[tokio::test]
    async fn test_location_save_failure_is_reported() {
        let store = MemoryStore::new();
        store.fail_writes.store(true, Ordering::Relaxed);
        let ctx = test_ctx_with(store).await;

        let reply = handle_location(&ctx, 42, 42.28, 18.84).await;
        assert!(reply.starts_with("Could not save your location"));
        assert!(ctx.registry.coordinate(42).await.is_none());
    }

    #[tokio::test]
    async fn test_location_save_success() {
        let ctx = test_ctx().await;
        let reply = handle_location(&ctx, 42, 42.28, 18.84).await;
        assert_eq!(reply, "Location saved. Weather commands now use it.");
        assert!(ctx.registry.coordinate(42).await.is_some());
    }
}
