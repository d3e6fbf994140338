//! Replies sent to users during the valentine workflow.

use crate::conversation::{Prompt, Rejection, Valentine, MAX_BODY_CHARS, MAX_RECIPIENT_CHARS};
use crate::guard::Denial;
use crate::moderation::render;
use crate::store::User;
use crate::telegram::ui::escape_html;

use super::{Keyboard, Reply};

/// Question for the next workflow step.
pub fn prompt(prompt: Prompt) -> Reply {
    match prompt {
        Prompt::Body => Reply::new(
            "Write the text of your valentine \u{1F48C}\n\nCancel: /cancel",
            Keyboard::Remove,
        ),
        Prompt::Recipient => Reply::new(
            "Who is it for?\n\nYou can give a username and a name, e.g. <i>@alex Alex</i>",
            Keyboard::Remove,
        ),
        Prompt::Anonymity => Reply::new("Send it anonymously?", Keyboard::YesNo),
    }
}

/// Why the last input was refused.
pub fn rejected(rejection: Rejection) -> Reply {
    match rejection {
        Rejection::BodyTooLong => Reply::new(
            format!("Your message is too long. Please keep it under {MAX_BODY_CHARS} characters."),
            Keyboard::Remove,
        ),
        Rejection::BodyEmpty | Rejection::ExpectedBody => Reply::new(
            "Please send the text of your valentine, or /cancel.",
            Keyboard::Remove,
        ),
        Rejection::RecipientTooLong => Reply::new(
            format!(
                "The recipient name is too long. Please keep it under {MAX_RECIPIENT_CHARS} characters."
            ),
            Keyboard::Remove,
        ),
        Rejection::RecipientEmpty | Rejection::ExpectedRecipient => Reply::new(
            "Please tell me who the valentine is for, or /cancel.",
            Keyboard::Remove,
        ),
        Rejection::ExpectedYesNo => {
            Reply::new("Please answer <b>Yes</b> or <b>No</b>, or /cancel.", Keyboard::YesNo)
        }
        Rejection::ExpectedSendCancel => Reply::new(
            "Please choose <b>Send</b> or <b>Cancel</b>.",
            Keyboard::SendCancel,
        ),
        Rejection::NothingInProgress => {
            Reply::new("Send /valentine to write a valentine.", Keyboard::Remove)
        }
    }
}

/// Guard refusal.
pub fn denied(denial: &Denial) -> Reply {
    match denial {
        Denial::NotRegistered => Reply::new(
            "Please confirm your phone number first. After that you can use /valentine.",
            Keyboard::RequestContact,
        ),
        Denial::Blocked { reason } => Reply::new(
            format!(
                "You are blocked ({}). Please contact the administrators.",
                escape_html(reason)
            ),
            Keyboard::Remove,
        ),
        Denial::CooldownActive { remaining } => Reply::new(
            format!(
                "Not so fast, you already sent a valentine \u{1F48C}\n\nTry again in about {} min.",
                remaining.num_minutes().max(1)
            ),
            Keyboard::Remove,
        ),
        Denial::Unavailable => internal_error(),
    }
}

/// Preview of the final post followed by the confirmation question.
///
/// The card is built from the registered `sender`, exactly as it will be
/// published.
pub fn preview(sender: &User, valentine: &Valentine) -> Vec<Reply> {
    let intro = if valentine.anonymous {
        "Okay, nobody will see your name. Your valentine will look like this:"
    } else {
        "Okay, the valentine will be signed with your name. It will look like this:"
    };
    let card = render::preview(&sender.full_name, sender.user_name.as_deref(), valentine);
    vec![
        Reply::new(intro, Keyboard::Remove),
        Reply::new(card, Keyboard::SendCancel),
    ]
}

/// Confirmation after a successful dispatch.
pub fn sent(channel_link: Option<&str>) -> Reply {
    let text = match channel_link {
        Some(link) => format!(
            "Your valentine has been sent! \u{1F4EB} Find it <a href=\"{}\">here</a> \u{1F48C}",
            escape_html(link)
        ),
        None => "Your valentine has been sent! \u{1F4EB}".to_owned(),
    };
    Reply::new(text, Keyboard::Remove)
}

/// `/cancel` acknowledgement.
pub fn cancelled() -> Reply {
    Reply::new("Cancelled.", Keyboard::Remove)
}

/// `cancel` at the confirmation step.
pub fn discarded() -> Reply {
    Reply::new("The valentine will not be sent.", Keyboard::Remove)
}

/// A post could not be delivered.
pub fn dispatch_failed() -> Reply {
    Reply::new(
        "Sorry, your valentine could not be delivered. Please try again later.",
        Keyboard::Remove,
    )
}

/// Store or other internal failure.
pub fn internal_error() -> Reply {
    Reply::new(
        "Something went wrong on our side. Please contact support.",
        Keyboard::Remove,
    )
}

/// Contact registration succeeded.
pub fn registered() -> Reply {
    Reply::new(
        "Thanks for confirming your phone number! Send /valentine to write a valentine.",
        Keyboard::Remove,
    )
}

/// Contact shared by an already registered user.
pub fn already_registered() -> Reply {
    Reply::new(
        "You have already confirmed your phone number!\n\nSend /valentine",
        Keyboard::Remove,
    )
}

/// The shared contact is not the sender's own.
pub fn foreign_contact() -> Reply {
    Reply::new(
        "Please share your own contact using the button below.",
        Keyboard::RequestContact,
    )
}

/// `/block` succeeded.
pub fn sender_blocked(reason: &str) -> Reply {
    Reply::new(
        format!("User blocked. Reason: {}", escape_html(reason)),
        Keyboard::Keep,
    )
}

/// Moderation lookup found no submission.
pub fn sender_not_found() -> Reply {
    Reply::new("User not found!", Keyboard::Keep)
}
