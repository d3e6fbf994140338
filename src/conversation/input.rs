//! Classification of inbound private messages.
//!
//! Every message is classified exactly once, before it reaches the state
//! machine: anything starting with `/` is a [`Command`], never workflow data.

/// A slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`: greeting and contact request.
    Start,
    /// `/help`: usage and data disclaimer.
    Help,
    /// `/valentine`: begin a new valentine.
    Valentine,
    /// `/cancel`: abandon the current draft.
    Cancel,
    /// `/block [reason]`: admin chat only.
    Block {
        /// Free-text reason, `None` when omitted or blank.
        reason: Option<String>,
    },
    /// `/who`: admin chat only.
    Who,
    /// Any other command name.
    Unknown(String),
}

/// A classified inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A slash command.
    Command(Command),
    /// Free text that may carry workflow data.
    Text(String),
    /// Anything without text (stickers, photos, ...).
    Unsupported,
}

/// Classify the text of an inbound message.
pub fn classify(text: Option<&str>) -> Input {
    match text {
        None => Input::Unsupported,
        Some(t) => match parse_command(t) {
            Some(cmd) => Input::Command(cmd),
            None => Input::Text(t.to_owned()),
        },
    }
}

/// Parse a slash command, returning `None` for non-command text.
///
/// Handles bot-mention suffixes like `/help@cupid_bot`.
pub fn parse_command(text: &str) -> Option<Command> {
    let without_slash = text.trim_start().strip_prefix('/')?;
    let (full_command, args) = match without_slash.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (without_slash, ""),
    };
    let command = full_command.split('@').next().unwrap_or(full_command);

    let parsed = match command.to_ascii_lowercase().as_str() {
        "start" => Command::Start,
        "help" => Command::Help,
        "valentine" => Command::Valentine,
        "cancel" => Command::Cancel,
        "who" => Command::Who,
        "block" => Command::Block {
            reason: (!args.is_empty()).then(|| args.to_owned()),
        },
        _ => Command::Unknown(command.to_owned()),
    };
    Some(parsed)
}

/// Case-insensitive token match ignoring surrounding whitespace.
pub(crate) fn is_token(text: &str, token: &str) -> bool {
    text.trim().eq_ignore_ascii_case(token)
}
