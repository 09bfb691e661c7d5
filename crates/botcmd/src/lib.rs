//! A console chat bot built on `botcmd-parser`, `botcmd-commands` and
//! `botcmd-scheduler`.
//!
//! Lines typed on stdin are commands; replies go to stdout. Besides a few
//! built-in commands the bot can schedule any command to run later with
//! `at`, `every`, `until` and `daily`.

pub mod bot;
pub mod builtin;
pub mod config;
pub mod context;
pub mod control;
pub mod state;
pub mod timers;

pub use bot::Bot;
pub use config::{Args, Config};
pub use context::{CommandContext, IdCounter, Replies, Settings, Txn};
pub use control::Control;
pub use state::{StateError, StateStore, TimerInfo};
pub use timers::AppTimers;
