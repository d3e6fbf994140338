//! Telegram adapter: reply formatting, slash command texts, the outbox used
//! for channel/admin posts, and the teloxide dispatcher.
//!
//! Private chats are routed to [`Workflow::handle_private`] and
//! [`Workflow::handle_contact`]; group chats to [`Workflow::handle_admin`].
//! The dispatcher processes updates of one chat sequentially and different
//! chats concurrently.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::{ChatId, Contact, ParseMode, Recipient, User, UserId};
use tracing::{debug, info, warn};

use crate::moderation::{Destination, DispatchError, Outbox, TextFormat};
use crate::workflow::{Profile, Reply, SharedContact, Workflow};

pub mod commands;
pub mod ui;

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

/// [`Outbox`] posting through the Bot API.
#[derive(Debug, Clone)]
pub struct TelegramOutbox {
    bot: Bot,
    channel: Recipient,
    admin_chat: ChatId,
}

impl TelegramOutbox {
    /// Create an outbox for the given public channel and admin chat.
    pub fn new(bot: Bot, channel: Recipient, admin_chat: ChatId) -> Self {
        Self {
            bot,
            channel,
            admin_chat,
        }
    }
}

#[async_trait]
impl Outbox for TelegramOutbox {
    async fn post(
        &self,
        destination: Destination,
        text: &str,
        format: TextFormat,
    ) -> Result<i64, DispatchError> {
        let target = match destination {
            Destination::Public => self.channel.clone(),
            Destination::Admin => Recipient::Id(self.admin_chat),
        };

        let mut request = self.bot.send_message(target, text);
        if format == TextFormat::Html {
            request = request.parse_mode(ParseMode::Html);
        }

        let message = request.await.map_err(|e| DispatchError {
            destination,
            reason: e.to_string(),
        })?;
        Ok(i64::from(message.id.0))
    }
}

/// Parse a channel setting: a numeric chat id or a `@username`.
pub fn parse_recipient(raw: &str) -> Recipient {
    let raw = raw.trim();
    match raw.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) if raw.starts_with('@') => Recipient::ChannelUsername(raw.to_owned()),
        Err(_) => Recipient::ChannelUsername(format!("@{raw}")),
    }
}

/// Call-to-action footer for public posts: the bot's own `@username`.
///
/// # Errors
///
/// Returns an error if `getMe` fails.
pub async fn bot_footer(bot: &Bot) -> anyhow::Result<String> {
    let me = bot.get_me().await?;
    Ok(me
        .user
        .username
        .map(|u| format!("@{u}"))
        .unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Shared dependencies injected into teloxide handlers via `dptree::deps!`.
#[derive(Clone)]
struct SharedState {
    workflow: Arc<Workflow>,
}

/// Run the Telegram bot until Ctrl+C.
pub async fn run_telegram(bot: Bot, workflow: Arc<Workflow>) -> anyhow::Result<()> {
    let shared = SharedState { workflow };

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handle_message));

    info!("telegram dispatcher starting");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![shared])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("telegram dispatcher stopped");
    Ok(())
}

/// Handle an incoming Telegram message.
async fn handle_message(bot: Bot, msg: Message, state: SharedState) -> ResponseResult<()> {
    if !msg.chat.is_private() {
        let reply_to = msg.reply_to_message().map(|m| i64::from(m.id.0));
        if let Some(reply) = state
            .workflow
            .handle_admin(msg.chat.id.0, msg.text(), reply_to)
            .await
        {
            send_reply(&bot, msg.chat.id, &reply).await?;
        }
        return Ok(());
    }

    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let Some(profile) = profile_of(user) else {
        warn!(telegram_id = user.id.0, "user id out of range, message ignored");
        return Ok(());
    };
    debug!(user_id = profile.id, "private message received");

    if let Some(contact) = msg.contact() {
        let reply = state
            .workflow
            .handle_contact(&profile, &shared_contact(contact))
            .await;
        return send_reply(&bot, msg.chat.id, &reply).await;
    }

    let replies = state.workflow.handle_private(&profile, msg.text()).await;
    for reply in &replies {
        send_reply(&bot, msg.chat.id, reply).await?;
    }
    Ok(())
}

/// Send one workflow reply as HTML with its keyboard.
async fn send_reply(bot: &Bot, chat_id: ChatId, reply: &Reply) -> ResponseResult<()> {
    let mut request = bot
        .send_message(chat_id, reply.text.clone())
        .parse_mode(ParseMode::Html);
    if let Some(markup) = ui::reply_markup(reply.keyboard) {
        request = request.reply_markup(markup);
    }
    request.await?;
    Ok(())
}

/// Store id for a Telegram user id; `None` if it does not fit in `i64`.
pub fn external_id(id: UserId) -> Option<i64> {
    i64::try_from(id.0).ok()
}

fn profile_of(user: &User) -> Option<Profile> {
    Some(Profile {
        id: external_id(user.id)?,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    })
}

fn shared_contact(contact: &Contact) -> SharedContact {
    SharedContact {
        user_id: contact.user_id.and_then(external_id),
        first_name: contact.first_name.clone(),
        last_name: contact.last_name.clone(),
        phone: contact.phone_number.clone(),
    }
}
