use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ProrabError;

/// Top-level Prorab configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub yandex: YandexConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: default_log_level(),
        }
    }
}

/// Telegram bot config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token. Overridable via the `TELEGRAM_KEY` env var.
    #[serde(default)]
    pub bot_token: String,
    /// Allowed Telegram user ids. Empty = allow all.
    #[serde(default)]
    pub allowed_users: Vec<i64>,
}

/// Yandex Cloud foundation-models config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YandexConfig {
    /// Long-lived OAuth token exchanged for IAM tokens.
    /// Overridable via the `OAUTH_TOKEN` env var.
    #[serde(default)]
    pub oauth_token: String,
    /// Cloud folder id used to compose the model URI.
    /// Overridable via the `FOLDER_ID` env var.
    #[serde(default)]
    pub folder_id: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for YandexConfig {
    fn default() -> Self {
        Self {
            oauth_token: String::new(),
            folder_id: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Conversation history config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
        }
    }
}

/// Daily broadcast schedule config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Target chat for broadcasts. Overridable via the `CHAT_ID` env var.
    /// Empty = broadcasts are skipped at startup.
    #[serde(default)]
    pub chat_id: String,
    /// IANA timezone name the times below are evaluated in.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Morning greeting time, "HH:MM".
    #[serde(default = "default_morning")]
    pub morning: String,
    /// Night greeting time, "HH:MM".
    #[serde(default = "default_night")]
    pub night: String,
    /// Hours (0-23) at which a random filler message is broadcast.
    #[serde(default = "default_random_hours")]
    pub random_hours: Vec<u32>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chat_id: String::new(),
            timezone: default_timezone(),
            morning: default_morning(),
            night: default_night(),
            random_hours: default_random_hours(),
        }
    }
}

impl ScheduleConfig {
    /// Resolve the configured timezone name.
    pub fn tz(&self) -> Result<Tz, ProrabError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ProrabError::Config(format!("invalid timezone '{}'", self.timezone)))
    }

    pub fn morning_time(&self) -> Result<NaiveTime, ProrabError> {
        parse_time(&self.morning)
    }

    pub fn night_time(&self) -> Result<NaiveTime, ProrabError> {
        parse_time(&self.night)
    }
}

/// Parse a "HH:MM" time-of-day.
pub fn parse_time(s: &str) -> Result<NaiveTime, ProrabError> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|e| ProrabError::Config(format!("invalid time '{s}': {e}")))
}

fn default_name() -> String {
    "prorab".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_model() -> String {
    "yandexgpt".to_string()
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1000
}

fn default_max_messages() -> usize {
    20
}

fn default_true() -> bool {
    true
}

fn default_timezone() -> String {
    "Europe/Moscow".to_string()
}

fn default_morning() -> String {
    "08:00".to_string()
}

fn default_night() -> String {
    "22:00".to_string()
}

fn default_random_hours() -> Vec<u32> {
    vec![10, 12, 14, 16, 18, 20]
}

/// Load configuration from a TOML file, then apply env overrides.
///
/// Falls back to defaults if the file does not exist; credentials can then
/// come entirely from the environment.
pub fn load(path: &str) -> Result<Config, ProrabError> {
    let path = Path::new(path);
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ProrabError::Config(format!("failed to read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| ProrabError::Config(format!("failed to parse config: {e}")))?
    } else {
        tracing::info!("Config file not found at {}, using defaults", path.display());
        Config::default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Apply the recognized environment overrides on top of file values.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(v) = std::env::var("OAUTH_TOKEN") {
        config.yandex.oauth_token = v;
    }
    if let Ok(v) = std::env::var("FOLDER_ID") {
        config.yandex.folder_id = v;
    }
    if let Ok(v) = std::env::var("TELEGRAM_KEY") {
        config.telegram.bot_token = v;
    }
    if let Ok(v) = std::env::var("CHAT_ID") {
        config.schedule.chat_id = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.yandex.model, "yandexgpt");
        assert_eq!(cfg.yandex.temperature, 0.3);
        assert_eq!(cfg.yandex.max_tokens, 1000);
        assert_eq!(cfg.history.max_messages, 20);
        assert!(cfg.schedule.enabled);
        assert_eq!(cfg.schedule.timezone, "Europe/Moscow");
        assert_eq!(cfg.schedule.morning, "08:00");
        assert_eq!(cfg.schedule.night, "22:00");
        assert_eq!(cfg.schedule.random_hours, vec![10, 12, 14, 16, 18, 20]);
    }

    #[test]
    fn test_parse_partial_toml() {
        let cfg: Config = toml::from_str(
            r#"
            [telegram]
            bot_token = "123:abc"

            [yandex]
            folder_id = "b1gfolder"

            [schedule]
            chat_id = "-100500"
            random_hours = [9, 15]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.telegram.bot_token, "123:abc");
        assert_eq!(cfg.yandex.folder_id, "b1gfolder");
        // Unset fields keep their defaults.
        assert_eq!(cfg.yandex.model, "yandexgpt");
        assert_eq!(cfg.schedule.chat_id, "-100500");
        assert_eq!(cfg.schedule.random_hours, vec![9, 15]);
        assert_eq!(cfg.schedule.morning, "08:00");
    }

    #[test]
    fn test_schedule_tz_and_times() {
        let cfg = ScheduleConfig::default();
        assert_eq!(cfg.tz().unwrap(), chrono_tz::Europe::Moscow);
        assert_eq!(
            cfg.morning_time().unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );
        assert_eq!(
            cfg.night_time().unwrap(),
            NaiveTime::from_hms_opt(22, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_invalid_timezone_rejected() {
        let cfg = ScheduleConfig {
            timezone: "Mars/Olympus".into(),
            ..Default::default()
        };
        assert!(matches!(cfg.tz(), Err(ProrabError::Config(_))));
    }

    #[test]
    fn test_invalid_time_rejected() {
        assert!(parse_time("8 o'clock").is_err());
        assert!(parse_time("25:00").is_err());
        assert!(parse_time("08:30").is_ok());
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let cfg = load("/nonexistent/prorab-config.toml").unwrap();
        assert_eq!(cfg.history.max_messages, 20);
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        std::env::set_var("FOLDER_ID", "env-folder");
        let mut cfg = Config::default();
        cfg.yandex.folder_id = "file-folder".into();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.yandex.folder_id, "env-folder");
        std::env::remove_var("FOLDER_ID");
    }
}
