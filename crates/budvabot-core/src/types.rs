//! Core data model: subscribers, zodiac signs, alert rules, flare events,
//! and outbound messages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A geographic coordinate (latitude, longitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// A chat that has interacted with the bot and may receive proactive
/// notifications. The coordinate is overwritten wholesale on every new
/// location message, never merged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscriber {
    pub chat_id: i64,
    pub coordinate: Option<Coordinate>,
    pub zodiac_sign: Option<ZodiacSign>,
    #[serde(default)]
    pub alert_rules: Vec<AlertRule>,
}

impl Subscriber {
    pub fn new(chat_id: i64) -> Self {
        Self {
            chat_id,
            coordinate: None,
            zodiac_sign: None,
            alert_rules: Vec::new(),
        }
    }
}

/// A per-chat alert rule, upserted per (chat, kind).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub kind: String,
    pub threshold: f64,
}

/// The twelve zodiac signs. Parsing is case-insensitive; anything else
/// is a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZodiacSign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl ZodiacSign {
    pub const ALL: [ZodiacSign; 12] = [
        ZodiacSign::Aries,
        ZodiacSign::Taurus,
        ZodiacSign::Gemini,
        ZodiacSign::Cancer,
        ZodiacSign::Leo,
        ZodiacSign::Virgo,
        ZodiacSign::Libra,
        ZodiacSign::Scorpio,
        ZodiacSign::Sagittarius,
        ZodiacSign::Capricorn,
        ZodiacSign::Aquarius,
        ZodiacSign::Pisces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ZodiacSign::Aries => "aries",
            ZodiacSign::Taurus => "taurus",
            ZodiacSign::Gemini => "gemini",
            ZodiacSign::Cancer => "cancer",
            ZodiacSign::Leo => "leo",
            ZodiacSign::Virgo => "virgo",
            ZodiacSign::Libra => "libra",
            ZodiacSign::Scorpio => "scorpio",
            ZodiacSign::Sagittarius => "sagittarius",
            ZodiacSign::Capricorn => "capricorn",
            ZodiacSign::Aquarius => "aquarius",
            ZodiacSign::Pisces => "pisces",
        }
    }
}

impl fmt::Display for ZodiacSign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ZodiacSign {
    type Err = crate::error::BotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sign = match s.trim().to_lowercase().as_str() {
            "aries" => ZodiacSign::Aries,
            "taurus" => ZodiacSign::Taurus,
            "gemini" => ZodiacSign::Gemini,
            "cancer" => ZodiacSign::Cancer,
            "leo" => ZodiacSign::Leo,
            "virgo" => ZodiacSign::Virgo,
            "libra" => ZodiacSign::Libra,
            "scorpio" => ZodiacSign::Scorpio,
            "sagittarius" => ZodiacSign::Sagittarius,
            "capricorn" => ZodiacSign::Capricorn,
            "aquarius" => ZodiacSign::Aquarius,
            "pisces" => ZodiacSign::Pisces,
            other => {
                return Err(crate::error::BotError::InvalidInput(format!(
                    "unknown zodiac sign: {other}"
                )));
            }
        };
        Ok(sign)
    }
}

/// A solar flare event as reported by NASA DONKI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlareEvent {
    /// Category letter plus magnitude, e.g. "M1.2".
    pub class_type: String,
    /// ISO-8601 begin time as reported by the API.
    pub begin_time: String,
}

impl FlareEvent {
    /// Stable identity used for first-sight deduplication.
    pub fn key(&self) -> String {
        format!("{}|{}", self.class_type, self.begin_time)
    }
}

/// Message text formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MessageFormat {
    #[default]
    Plain,
    Markdown,
    Html,
}

/// A message headed for one Telegram chat. Created by whichever component
/// needs to talk to a subscriber, consumed exactly once by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(default)]
    pub format: MessageFormat,
}

impl OutboundMessage {
    pub fn plain(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            format: MessageFormat::Plain,
        }
    }

    pub fn markdown(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            format: MessageFormat::Markdown,
        }
    }
}
