//! Errors raised while turning a line into a command call.

use botcmd_parser::ParseFail;
use thiserror::Error;

use crate::invocation::Invocation;

/// The line held no words at all.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Empty command line")]
pub struct InvocationParseError;

/// A word of an echoed command line, possibly highlighted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedWord {
    pub word: String,
    pub marked: bool,
}

/// A registered command rejected its arguments.
///
/// Displays as the failure message followed by the command line with the
/// offending word wrapped in underscores.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}\n{}", marked_line(.marked_words.as_slice()))]
pub struct CommandParseError {
    pub message: String,
    pub marked_words: Vec<MarkedWord>,
}

impl CommandParseError {
    /// Marks the argument at `fail.consumed`; the command name itself is
    /// never marked. A failure past the last argument marks nothing.
    pub fn new(fail: ParseFail, invocation: &Invocation) -> Self {
        let mut marked_words = vec![MarkedWord {
            word: invocation.name.clone(),
            marked: false,
        }];
        marked_words.extend(invocation.args.iter().enumerate().map(|(idx, word)| MarkedWord {
            word: word.clone(),
            marked: idx == fail.consumed,
        }));
        Self {
            message: fail.message,
            marked_words,
        }
    }

    /// The echoed command line, e.g. `climate _maybe_`.
    pub fn marked_line(&self) -> String {
        marked_line(&self.marked_words)
    }

    pub fn marked_word(&self) -> Option<&str> {
        self.marked_words
            .iter()
            .find(|word| word.marked)
            .map(|word| word.word.as_str())
    }
}

fn marked_line(words: &[MarkedWord]) -> String {
    words
        .iter()
        .map(|word| {
            if word.marked {
                format!("_{}_", word.word)
            } else {
                word.word.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),

    #[error("No such command: {0}")]
    UnknownCommand(String),

    #[error(transparent)]
    Handler(#[from] anyhow::Error),
}
