//! Built-in bot commands. These answer instantly, without a model call.

use prorab_core::config::ScheduleConfig;

/// Known bot commands.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// `/start`: reset the conversation and greet.
    Start,
    /// `/random`: one random filler message.
    Random,
    /// `/schedule`: report broadcast schedule status.
    ScheduleStatus,
    /// `/schedule start`: (re)register the daily broadcasts for this chat.
    ScheduleStart,
    /// Any other `/` prefix.
    Unknown,
}

impl Command {
    /// Parse a command from message text. Returns `None` for free text,
    /// which routes to the conversation flow.
    pub fn parse(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let first = words.next()?;
        if !first.starts_with('/') {
            return None;
        }
        // Group chats address commands as /start@botname.
        let cmd = first.split('@').next().unwrap_or(first);
        match cmd {
            "/start" => Some(Self::Start),
            "/random" => Some(Self::Random),
            "/schedule" => match words.next() {
                Some("start") => Some(Self::ScheduleStart),
                _ => Some(Self::ScheduleStatus),
            },
            _ => Some(Self::Unknown),
        }
    }
}

/// Human-readable schedule status for `/schedule`.
pub fn schedule_status(config: &ScheduleConfig, registered: bool) -> String {
    if !config.enabled {
        return "Расписание выключено в конфигурации.".to_string();
    }
    let hours = config
        .random_hours
        .iter()
        .map(|h| format!("{h:02}:00"))
        .collect::<Vec<_>>()
        .join(", ");
    let state = if registered {
        "Расписание запущено"
    } else {
        "Расписание не запущено (отправь /schedule start)"
    };
    format!(
        "{state}.\nУтро: {}, ночь: {}, случайные: {hours} ({}).",
        config.morning, config.night, config.timezone
    )
}
