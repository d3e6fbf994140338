//! Slash command responses.
//!
//! Each function returns an HTML-formatted response string.

use crate::moderation::render::NO_USERNAME;
use crate::store::User;
use crate::telegram::ui::escape_html;

/// Greeting for `/start`.
pub fn handle_start(channel_link: Option<&str>) -> String {
    let mut lines = vec!["Hi! I can help you send a valentine \u{1F48C}".to_owned()];
    if let Some(link) = channel_link {
        lines.push(String::new());
        lines.push(format!(
            "Sent valentines are published <a href=\"{}\">here</a> \u{1F4EB}",
            escape_html(link)
        ));
    }
    lines.push(String::new());
    lines.push("To continue, confirm your phone number with the button below.".to_owned());
    lines.push("Then send /help to learn more.".to_owned());
    lines.join("\n")
}

/// Usage and data-collection notice for `/help`.
pub fn handle_help(cooldown_minutes: i64) -> String {
    [
        "<b>Available commands:</b>".to_owned(),
        String::new(),
        "/start — start the bot".to_owned(),
        "/help — show this message".to_owned(),
        "/valentine — send a valentine".to_owned(),
        "/cancel — abandon the valentine you are writing".to_owned(),
        String::new(),
        format!(
            "You will see a preview and confirm before anything is sent. \
             Only text is accepted, one valentine every {cooldown_minutes} minutes."
        ),
        String::new(),
        "<b>Disclaimer:</b> we store your name, username and phone number, and the \
         text and recipient of each valentine, so that we can contact you if \
         something goes wrong."
            .to_owned(),
    ]
    .join("\n")
}

/// Sender details for `/who`.
pub fn who_card(user: &User, submissions: usize) -> String {
    let username = match user.user_name.as_deref().filter(|u| !u.is_empty()) {
        Some(u) => format!("@{}", escape_html(u)),
        None => NO_USERNAME.to_owned(),
    };
    let status = if user.blocked {
        format!("yes ({})", escape_html(&user.blocked_reason))
    } else {
        "no".to_owned()
    };
    let phone = user.phone.trim_start_matches('+');

    format!(
        "<b>Sender</b>\n\
         Username: {username}\n\
         Name: {name}\n\
         Phone: https://t.me/+{phone}\n\
         Telegram id: <code>{id}</code>\n\
         Blocked: {status}\n\
         Valentines sent: {submissions}",
        name = escape_html(&user.full_name),
        phone = escape_html(phone),
        id = user.external_id,
    )
}

/// Hint for admin commands issued without a reply.
pub fn handle_admin_usage() -> String {
    "Reply to a valentine in this chat with /who or /block [reason].".to_owned()
}
