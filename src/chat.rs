//! Chat transcript state and the request/reply cycle.
//!
//! The transcript is append-only. At most one request is pending; its id
//! gates which reply is allowed to land.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::client::{ChatError, FinSageClient};
use crate::input::TextInput;

pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { role: Role::User, text: text.into() }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self { role: Role::Bot, text: text.into() }
    }
}

/// What a caller needs to dispatch one accepted submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub id: u64,
    pub text: String,
    pub cancel: CancellationToken,
}

#[derive(Debug)]
struct Pending {
    id: u64,
    cancel: CancellationToken,
}

#[derive(Debug, Default)]
pub struct ChatState {
    messages: Vec<Message>,
    pub input: TextInput,
    pending: Option<Pending>,
    next_id: u64,

    // View state: `follow` pins the transcript to the newest message
    pub scroll: u16,
    pub max_scroll: u16,
    pub follow: bool,
}

impl ChatState {
    pub fn new() -> Self {
        Self {
            follow: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_id(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.id)
    }

    /// Accept the current input as a user message.
    ///
    /// Returns `None` without touching any state when the input is blank
    /// or a request is already in flight.
    pub fn submit(&mut self) -> Option<Submission> {
        if self.input.value().trim().is_empty() || self.is_loading() {
            return None;
        }

        let text = self.input.take();
        self.push(Message::user(text.clone()));

        self.next_id += 1;
        let id = self.next_id;
        let cancel = CancellationToken::new();
        self.pending = Some(Pending { id, cancel: cancel.clone() });
        debug!(id, "chat request submitted");

        Some(Submission { id, text, cancel })
    }

    /// Land the outcome of request `id`. Returns false when the reply is
    /// stale (cancelled or superseded) and was dropped.
    pub fn resolve(&mut self, id: u64, result: Result<String, ChatError>) -> bool {
        if self.pending_id() != Some(id) {
            debug!(id, "dropping stale reply");
            return false;
        }
        self.pending = None;

        match result {
            Ok(reply) => self.push(Message::bot(reply)),
            Err(ChatError::Cancelled) => {
                info!(id, "chat request cancelled");
                self.follow = true;
            }
            Err(e) => {
                error!(id, error = %e, "chat request failed");
                self.push(Message::bot(FALLBACK_REPLY));
            }
        }
        true
    }

    /// Abort the pending request, if any. No bot message is appended.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.cancel.cancel();
                info!(id = pending.id, "cancelled in-flight chat request");
                true
            }
            None => false,
        }
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.follow = true;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        if self.follow {
            self.scroll = self.max_scroll;
            self.follow = false;
        }
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
        if self.scroll >= self.max_scroll {
            self.scroll_to_bottom();
        }
    }

    pub fn scroll_to_top(&mut self) {
        self.follow = false;
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow = true;
        self.scroll = self.max_scroll;
    }

    /// Called by the renderer once the wrapped transcript height is known.
    pub fn set_viewport(&mut self, content_lines: u16, height: u16) {
        self.max_scroll = content_lines.saturating_sub(height);
        if self.follow {
            self.scroll = self.max_scroll;
        } else {
            self.scroll = self.scroll.min(self.max_scroll);
        }
    }
}

/// Run one query and hold a successful reply for `reply_delay` so the
/// typing indicator is visible. Cancellation wins over both phases.
pub async fn run_query(
    client: &FinSageClient,
    text: &str,
    cancel: &CancellationToken,
    reply_delay: Duration,
) -> Result<String, ChatError> {
    let reply = client.query(text, cancel).await?;

    if !reply_delay.is_zero() {
        tokio::select! {
            _ = cancel.cancelled() => return Err(ChatError::Cancelled),
            _ = tokio::time::sleep(reply_delay) => {}
        }
    }

    Ok(reply)
}
