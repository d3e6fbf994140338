//! Cupid: a Telegram bot for sending valentines.
//!
//! Registered users write a valentine in a private chat, choose whether it
//! is signed, preview it and confirm. Confirmed valentines are published to
//! a public channel and mirrored with the sender's identity to an admin
//! chat, where moderators can look up or block the sender by replying to
//! the mirrored post.
//!
//! See `DESIGN.md` for the architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod logging;
pub mod store;

pub mod conversation;
pub mod guard;
pub mod moderation;

pub mod telegram;
pub mod workflow;
