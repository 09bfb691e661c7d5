//! What a command handler gets to work with.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::debug;

/// A monotonic id source for transactions and timers.
#[derive(Debug)]
pub struct IdCounter {
    next: AtomicU64,
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::new(1)
    }
}

impl IdCounter {
    pub fn new(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// Make sure ids handed out from now on are greater than `id`.
    pub fn skip_past(&self, id: u64) {
        self.next.fetch_max(id.saturating_add(1), Ordering::Relaxed);
    }
}

/// The id of one request, shown in replies that report a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Txn(pub u64);

impl fmt::Display for Txn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn {}", self.0)
    }
}

/// Sends reply messages to whoever prints them.
#[derive(Debug, Clone)]
pub struct Replies {
    sender: mpsc::UnboundedSender<String>,
}

impl Replies {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn send(&self, message: impl Into<String>) {
        if self.sender.send(message.into()).is_err() {
            debug!("reply receiver gone, dropping message");
        }
    }
}

/// Passed by value to every handler.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub txn: Txn,
    pub replies: Replies,
}

impl CommandContext {
    pub fn new(txn: Txn, replies: Replies) -> Self {
        Self { txn, replies }
    }

    pub fn reply(&self, message: impl Into<String>) {
        self.replies.send(message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SettingsState {
    greeting: String,
    quiet: bool,
}

/// Bot-wide settings changed with the `set` command.
#[derive(Debug)]
pub struct Settings {
    state: Mutex<SettingsState>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state: Mutex::new(SettingsState {
                greeting: "Hello!".to_string(),
                quiet: false,
            }),
        }
    }
}

impl Settings {
    fn lock(&self) -> MutexGuard<'_, SettingsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn greeting(&self) -> String {
        self.lock().greeting.clone()
    }

    pub fn set_greeting(&self, greeting: impl Into<String>) {
        self.lock().greeting = greeting.into();
    }

    /// Quiet mode suppresses timer activation notices.
    pub fn quiet(&self) -> bool {
        self.lock().quiet
    }

    pub fn set_quiet(&self, quiet: bool) {
        self.lock().quiet = quiet;
    }
}
