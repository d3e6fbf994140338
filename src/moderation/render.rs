//! Text renderings of a valentine.
//!
//! The public post and the preview are HTML and honour the anonymity
//! choice. The admin post is plain text and always names the real sender.

use crate::conversation::Valentine;
use crate::store::User;
use crate::telegram::ui::escape_html;

/// Sender label shown in place of a name for anonymous valentines.
pub const ANONYMOUS: &str = "Anonymous";

/// Shown when the sender has no Telegram username.
pub const NO_USERNAME: &str = "no username";

/// `Name | @handle`, or `Name | no username`.
pub fn display_identity(name: &str, handle: Option<&str>) -> String {
    match handle.filter(|h| !h.is_empty()) {
        Some(h) => format!("{name} | @{h}"),
        None => format!("{name} | {NO_USERNAME}"),
    }
}

/// Sender label for the public post.
pub fn sender_label(name: &str, handle: Option<&str>, anonymous: bool) -> String {
    if anonymous {
        ANONYMOUS.to_owned()
    } else {
        display_identity(name, handle)
    }
}

/// HTML card shared by the preview and the public post.
fn card(sender: &str, valentine: &Valentine) -> String {
    format!(
        "<b>From:</b> {sender}\n<b>To:</b> {recipient}\n\n{body}",
        sender = escape_html(sender),
        recipient = escape_html(&valentine.recipient),
        body = escape_html(&valentine.body),
    )
}

/// Preview shown to the sender before confirmation.
pub fn preview(name: &str, handle: Option<&str>, valentine: &Valentine) -> String {
    card(&sender_label(name, handle, valentine.anonymous), valentine)
}

/// Post for the public channel, with the call-to-action footer.
pub fn public_post(sender: &User, valentine: &Valentine, footer: &str) -> String {
    let label = sender_label(
        &sender.full_name,
        sender.user_name.as_deref(),
        valentine.anonymous,
    );
    let card = card(&label, valentine);
    if footer.is_empty() {
        card
    } else {
        format!("{card}\n\n{}", escape_html(footer))
    }
}

/// Plain-text post for the admin chat. Always identifies the sender.
pub fn admin_post(sender: &User, valentine: &Valentine) -> String {
    format!(
        "From: {identity} (id {id})\nAnonymous: {anonymous}\nTo: {recipient}\n\n{body}",
        identity = display_identity(&sender.full_name, sender.user_name.as_deref()),
        id = sender.external_id,
        anonymous = if valentine.anonymous { "yes" } else { "no" },
        recipient = valentine.recipient,
        body = valentine.body,
    )
}
