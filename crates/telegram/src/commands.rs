use nomorejokes_core::flows::SessionEvent;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Generate,
    Publish,
    Cancel,
    Unknown(String),
}

impl BotCommand {
    /// The conversation event a command maps to. Unknown commands map to
    /// nothing and are dropped.
    pub fn session_event(&self) -> Option<SessionEvent> {
        match self {
            Self::Start | Self::Help => Some(SessionEvent::StartRequested),
            Self::Generate | Self::Publish => Some(SessionEvent::GenerateRequested),
            Self::Cancel => Some(SessionEvent::CancelRequested),
            Self::Unknown(_) => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Generate => "generate",
            Self::Publish => "publish",
            Self::Cancel => "cancel",
            Self::Unknown(name) => name,
        }
    }
}

/// Parses `/command`, `/command@BotName` and `/command args`.
///
/// Returns `None` for text that is not a command, and for commands
/// addressed to a different bot when `bot_username` is known.
pub fn parse_command(text: &str, bot_username: Option<&str>) -> Option<BotCommand> {
    let token = text.trim_start().split_whitespace().next()?;
    let body = token.strip_prefix('/')?;
    if body.is_empty() {
        return None;
    }

    let (name, addressee) = match body.split_once('@') {
        Some((name, addressee)) => (name, Some(addressee)),
        None => (body, None),
    };

    if let (Some(addressee), Some(bot_username)) = (addressee, bot_username) {
        if !addressee.eq_ignore_ascii_case(bot_username.trim_start_matches('@')) {
            return None;
        }
    }

    let name = name.to_ascii_lowercase();
    Some(match name.as_str() {
        "start" => BotCommand::Start,
        "help" => BotCommand::Help,
        "generate" => BotCommand::Generate,
        "publish" => BotCommand::Publish,
        "cancel" => BotCommand::Cancel,
        _ => BotCommand::Unknown(name),
    })
}

#[cfg(test)]
mod tests {
    use nomorejokes_core::flows::SessionEvent;

    use super::{parse_command, BotCommand};

    #[test]
    fn parses_known_commands_case_insensitively() {
        assert_eq!(parse_command("/start", None), Some(BotCommand::Start));
        assert_eq!(parse_command("/HELP", None), Some(BotCommand::Help));
        assert_eq!(parse_command("  /generate now", None), Some(BotCommand::Generate));
        assert_eq!(parse_command("/publish", None), Some(BotCommand::Publish));
        assert_eq!(parse_command("/cancel", None), Some(BotCommand::Cancel));
    }

    #[test]
    fn plain_text_is_not_a_command() {
        assert_eq!(parse_command("Mars rover finds water", None), None);
        assert_eq!(parse_command("/", None), None);
        assert_eq!(parse_command("", None), None);
    }

    #[test]
    fn addressed_commands_must_match_this_bot() {
        assert_eq!(
            parse_command("/generate@NoMoreJokesBot", Some("nomorejokesbot")),
            Some(BotCommand::Generate)
        );
        assert_eq!(parse_command("/generate@OtherBot", Some("NoMoreJokesBot")), None);
        assert_eq!(parse_command("/generate@OtherBot", None), Some(BotCommand::Generate));
    }

    #[test]
    fn unknown_commands_map_to_no_event() {
        let command = parse_command("/weather", None).expect("command");
        assert_eq!(command, BotCommand::Unknown("weather".to_string()));
        assert_eq!(command.session_event(), None);
    }

    #[test]
    fn publish_is_an_alias_for_generate() {
        assert_eq!(BotCommand::Publish.session_event(), Some(SessionEvent::GenerateRequested));
        assert_eq!(BotCommand::Help.session_event(), Some(SessionEvent::StartRequested));
    }
}
