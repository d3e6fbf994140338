//! HTML escaping and reply keyboards for Telegram messages.
//!
//! All replies use HTML parse mode (never MarkdownV2).

use teloxide::types::{ButtonRequest, KeyboardButton, KeyboardMarkup, KeyboardRemove, ReplyMarkup};

use crate::workflow::Keyboard;

/// Escape special HTML characters in user-provided text.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// One-tap button asking Telegram to share the user's own contact.
pub fn contact_keyboard() -> KeyboardMarkup {
    let share = KeyboardButton::new("\u{1F4F1} Share phone number").request(ButtonRequest::Contact);
    KeyboardMarkup::new(vec![vec![share]])
        .resize_keyboard()
        .one_time_keyboard()
}

/// `Yes` / `No` for the anonymity question.
pub fn yes_no_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new("Yes"), KeyboardButton::new("No")]])
        .resize_keyboard()
        .one_time_keyboard()
}

/// `Send` / `Cancel` under the preview.
pub fn send_cancel_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![
        KeyboardButton::new("Send"),
        KeyboardButton::new("Cancel"),
    ]])
    .resize_keyboard()
    .one_time_keyboard()
}

/// Telegram markup for a workflow keyboard; `None` leaves the keyboard as is.
pub fn reply_markup(keyboard: Keyboard) -> Option<ReplyMarkup> {
    match keyboard {
        Keyboard::Keep => None,
        Keyboard::Remove => Some(ReplyMarkup::KeyboardRemove(KeyboardRemove::new())),
        Keyboard::RequestContact => Some(ReplyMarkup::Keyboard(contact_keyboard())),
        Keyboard::YesNo => Some(ReplyMarkup::Keyboard(yes_no_keyboard())),
        Keyboard::SendCancel => Some(ReplyMarkup::Keyboard(send_cancel_keyboard())),
    }
}
