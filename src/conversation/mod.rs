//! Per-user valentine workflow as an explicit finite-state machine.
//!
//! [`Conversation::step`] is a pure transition function: it takes the current
//! state and draft plus one classified [`Input`] and returns the next
//! conversation together with an [`Effect`] for the caller to carry out.
//! Effects that need the store or the transport ([`Effect::CheckGuard`],
//! [`Effect::Dispatch`]) are executed by the workflow, never here.
//!
//! ```text
//! Idle --/valentine + guard--> AwaitingBody --text--> AwaitingRecipient
//!      --text--> AwaitingAnonymity --yes|no--> AwaitingConfirmation
//!      --send|cancel--> Idle
//! ```
//!
//! `/cancel` returns to `Idle` from every state.

pub mod input;
pub mod sessions;

pub use self::input::{classify, Command, Input};
pub use self::sessions::Conversations;

use tracing::debug;

use self::input::is_token;

/// Maximum body length in characters.
pub const MAX_BODY_CHARS: usize = 500;

/// Maximum recipient label length in characters.
pub const MAX_RECIPIENT_CHARS: usize = 64;

/// Workflow position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum State {
    /// No valentine in progress.
    #[default]
    Idle,
    /// Waiting for the message text.
    AwaitingBody,
    /// Waiting for the recipient label.
    AwaitingRecipient,
    /// Waiting for `yes` or `no`.
    AwaitingAnonymity,
    /// Preview shown, waiting for `send` or `cancel`.
    AwaitingConfirmation,
}

/// In-progress valentine. Fields fill in as the workflow advances.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Message text.
    pub body: Option<String>,
    /// Recipient label.
    pub recipient: Option<String>,
    /// Whether the sender stays anonymous in the public post.
    pub anonymous: Option<bool>,
}

impl Draft {
    /// The finished valentine, once every field is set.
    pub fn complete(&self) -> Option<Valentine> {
        Some(Valentine {
            body: self.body.clone()?,
            recipient: self.recipient.clone()?,
            anonymous: self.anonymous?,
        })
    }
}

/// A fully composed valentine, ready for preview or dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Valentine {
    /// Message text.
    pub body: String,
    /// Recipient label.
    pub recipient: String,
    /// Whether the public post hides the sender.
    pub anonymous: bool,
}

/// Question asked after a successful transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Ask for the message text.
    Body,
    /// Ask for the recipient.
    Recipient,
    /// Ask whether to send anonymously.
    Anonymity,
}

/// Input refused in the current state. The state does not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Body longer than [`MAX_BODY_CHARS`].
    BodyTooLong,
    /// Body empty or whitespace only.
    BodyEmpty,
    /// Something other than text while waiting for the body.
    ExpectedBody,
    /// Recipient longer than [`MAX_RECIPIENT_CHARS`].
    RecipientTooLong,
    /// Recipient empty or whitespace only.
    RecipientEmpty,
    /// Something other than text while waiting for the recipient.
    ExpectedRecipient,
    /// Anything but `yes`/`no` while waiting for the anonymity choice.
    ExpectedYesNo,
    /// Anything but `send`/`cancel` at the confirmation step.
    ExpectedSendCancel,
    /// Free text or an unrelated command with no valentine in progress.
    NothingInProgress,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Run the submission guard; on allow, continue with [`Conversation::admit`].
    CheckGuard,
    /// Ask the next question.
    Prompt(Prompt),
    /// Tell the user why the input was refused.
    Reject(Rejection),
    /// Show how the final post will look, then ask for confirmation.
    Preview(Valentine),
    /// Send the valentine.
    Dispatch(Valentine),
    /// `/cancel`: draft discarded.
    Cancelled,
    /// `cancel` at confirmation: the valentine will not be sent.
    Discarded,
}

/// Result of [`Conversation::step`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Conversation after the input.
    pub conversation: Conversation,
    /// What the caller must do next.
    pub effect: Effect,
}

/// One user's workflow state and draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    state: State,
    draft: Draft,
}

impl Conversation {
    /// A fresh, idle conversation.
    pub fn new() -> Self {
        Self::default()
    }

    /// The conversation right after the guard approved a new valentine.
    pub fn admit() -> Self {
        Self {
            state: State::AwaitingBody,
            draft: Draft::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> State {
        self.state
    }

    /// Current draft.
    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Returns `true` when no valentine is in progress.
    pub fn is_idle(&self) -> bool {
        self.state == State::Idle
    }

    /// Advance by one input.
    pub fn step(&self, input: &Input) -> Transition {
        let transition = match input {
            Input::Command(Command::Cancel) => self.to_idle(Effect::Cancelled),
            _ => match self.state {
                State::Idle => self.on_idle(input),
                State::AwaitingBody => self.on_body(input),
                State::AwaitingRecipient => self.on_recipient(input),
                State::AwaitingAnonymity => self.on_anonymity(input),
                State::AwaitingConfirmation => self.on_confirmation(input),
            },
        };
        debug!(
            from = ?self.state,
            to = ?transition.conversation.state,
            effect = ?transition.effect,
            "conversation step"
        );
        transition
    }

    fn on_idle(&self, input: &Input) -> Transition {
        match input {
            Input::Command(Command::Valentine) => self.stay(Effect::CheckGuard),
            _ => self.stay(Effect::Reject(Rejection::NothingInProgress)),
        }
    }

    fn on_body(&self, input: &Input) -> Transition {
        match input {
            Input::Command(Command::Valentine) => self.stay(Effect::Prompt(Prompt::Body)),
            Input::Text(text) => {
                if text.chars().count() > MAX_BODY_CHARS {
                    self.stay(Effect::Reject(Rejection::BodyTooLong))
                } else if text.trim().is_empty() {
                    self.stay(Effect::Reject(Rejection::BodyEmpty))
                } else {
                    let mut next = self.clone();
                    next.state = State::AwaitingRecipient;
                    next.draft.body = Some(text.clone());
                    Transition {
                        conversation: next,
                        effect: Effect::Prompt(Prompt::Recipient),
                    }
                }
            }
            _ => self.stay(Effect::Reject(Rejection::ExpectedBody)),
        }
    }

    fn on_recipient(&self, input: &Input) -> Transition {
        match input {
            Input::Command(Command::Valentine) => self.stay(Effect::Prompt(Prompt::Recipient)),
            Input::Text(text) => {
                if text.chars().count() > MAX_RECIPIENT_CHARS {
                    self.stay(Effect::Reject(Rejection::RecipientTooLong))
                } else if text.trim().is_empty() {
                    self.stay(Effect::Reject(Rejection::RecipientEmpty))
                } else {
                    let mut next = self.clone();
                    next.state = State::AwaitingAnonymity;
                    next.draft.recipient = Some(text.clone());
                    Transition {
                        conversation: next,
                        effect: Effect::Prompt(Prompt::Anonymity),
                    }
                }
            }
            _ => self.stay(Effect::Reject(Rejection::ExpectedRecipient)),
        }
    }

    fn on_anonymity(&self, input: &Input) -> Transition {
        let anonymous = match input {
            Input::Text(text) if is_token(text, "yes") => true,
            Input::Text(text) if is_token(text, "no") => false,
            _ => return self.stay(Effect::Reject(Rejection::ExpectedYesNo)),
        };

        let mut next = self.clone();
        next.draft.anonymous = Some(anonymous);
        match next.draft.complete() {
            Some(valentine) => {
                next.state = State::AwaitingConfirmation;
                Transition {
                    conversation: next,
                    effect: Effect::Preview(valentine),
                }
            }
            // Unreachable through `step`; recover by starting over.
            None => self.to_idle(Effect::Cancelled),
        }
    }

    fn on_confirmation(&self, input: &Input) -> Transition {
        match input {
            Input::Text(text) if is_token(text, "send") => match self.draft.complete() {
                Some(valentine) => self.to_idle(Effect::Dispatch(valentine)),
                None => self.to_idle(Effect::Cancelled),
            },
            Input::Text(text) if is_token(text, "cancel") => self.to_idle(Effect::Discarded),
            _ => self.stay(Effect::Reject(Rejection::ExpectedSendCancel)),
        }
    }

    fn stay(&self, effect: Effect) -> Transition {
        Transition {
            conversation: self.clone(),
            effect,
        }
    }

    fn to_idle(&self, effect: Effect) -> Transition {
        Transition {
            conversation: Self::new(),
            effect,
        }
    }
}
