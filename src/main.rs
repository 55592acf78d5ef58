//! Budva Bot entry point: config, wiring, watch loops, update loop.

mod commands;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use budvabot_core::BotConfig;
use budvabot_core::types::OutboundMessage;
use budvabot_fetch::{CommentaryClient, SolarClient, WeatherClient};
use budvabot_notify::{Dispatcher, TelegramChannel};
use budvabot_store::{SqliteStore, SubscriberRegistry};
use budvabot_watch::{spawn_flare_watch, spawn_water_watch};

use commands::{BotContext, Command, handle_command, handle_location, parse_command};

#[derive(Parser, Debug)]
#[command(name = "budvabot", about = "Budva weather, sea, and space-weather bot")]
struct Args {
    /// Path to the TOML config file.
    #[arg(short, long, default_value = "budvabot.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = BotConfig::load(&args.config).context("loading config")?;
    // No loops, no polling on partial configuration.
    config.validate().context("validating config")?;

    let store = SqliteStore::open(std::path::Path::new(&config.database_path))
        .context("opening subscriber store")?;
    let registry = Arc::new(SubscriberRegistry::load(Arc::new(store)).await?);

    let channel = Arc::new(TelegramChannel::new(config.telegram_bot_token.clone()));
    let me = channel.get_me().await.context("connecting to Telegram")?;
    tracing::info!(
        "Telegram bot: @{} ({})",
        me.username.as_deref().unwrap_or("unknown"),
        me.first_name
    );

    let dispatcher = Arc::new(Dispatcher::new(
        channel.clone(),
        config.dispatch.pacing_ms,
        config.dispatch.max_send_retries,
    ));

    let ctx = BotContext {
        registry: registry.clone(),
        weather: WeatherClient::new(config.openweather_api_key.clone()),
        solar: SolarClient::new(config.nasa_api_key.clone()),
        commentary: CommentaryClient::new(&config.llm),
        http: reqwest::Client::new(),
    };
    // Watch tasks run for the whole process lifetime.
    let _water_watch = spawn_water_watch(
        ctx.http.clone(),
        registry.clone(),
        dispatcher.clone(),
        config.watch.water_check_secs,
    );
    let _flare_watch = spawn_flare_watch(
        SolarClient::new(config.nasa_api_key.clone()),
        registry.clone(),
        dispatcher.clone(),
        config.watch.flare_check_secs,
    );

    run_update_loop(channel, ctx).await
}

/// Long-poll Telegram updates and reply to the invoking chat. Proactive
/// fan-out lives in the watch loops; this loop only ever answers one
/// chat at a time.
async fn run_update_loop(channel: Arc<TelegramChannel>, ctx: BotContext) -> anyhow::Result<()> {
    tracing::info!("Update loop started");
    loop {
        let updates = match channel.get_updates().await {
            Ok(updates) => updates,
            Err(e) => {
                tracing::error!("Polling error: {e}");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                continue;
            }
        };

        for update in updates {
            let Some(message) = update.message else {
                continue;
            };
            if message.from.as_ref().is_some_and(|u| u.is_bot) {
                continue;
            }
            let chat_id = message.chat.id;

            let reply = if let Some(location) = message.location {
                Some((
                    handle_location(&ctx, chat_id, location.latitude, location.longitude).await,
                    budvabot_core::types::MessageFormat::Plain,
                ))
            } else if let Some(command) = message.text.as_deref().and_then(parse_command) {
                let format = match command {
                    Command::Solar => budvabot_core::types::MessageFormat::Markdown,
                    _ => budvabot_core::types::MessageFormat::Plain,
                };
                Some((handle_command(&ctx, chat_id, command).await, format))
            } else {
                None
            };

            if let Some((text, format)) = reply {
                let outbound = OutboundMessage {
                    chat_id,
                    text,
                    format,
                };
                if let Err(e) = channel.send_message(&outbound).await {
                    tracing::warn!("Reply to chat {chat_id} failed: {e}");
                }
            }
        }
    }
}
