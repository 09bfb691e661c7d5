use std::sync::{Arc, Weak};

use botcmd_parser::{ParseFail, ParseResult, Parsed, Parser};
use tracing::debug;

use crate::command::Command;
use crate::error::{CommandError, CommandParseError};
use crate::invocation::Invocation;

/// An ordered set of commands looked up by case-insensitive name.
///
/// Names need not be unique, but only the first registered command with a
/// given name is reachable.
pub struct Commands<C> {
    commands: Vec<Arc<dyn Command<C>>>,
}

impl<C> Default for Commands<C> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

impl<C> Commands<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: impl Command<C> + 'static) {
        self.commands.push(Arc::new(command));
    }

    /// Register a command that may also live in other registries.
    pub fn register_shared(&mut self, command: Arc<dyn Command<C>>) {
        self.commands.push(command);
    }

    pub fn find(&self, name: &str) -> Option<&Arc<dyn Command<C>>> {
        self.commands
            .iter()
            .find(|command| command.name().eq_ignore_ascii_case(name))
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|command| command.name())
    }

    /// Validate an invocation without running it.
    pub fn check(&self, invocation: &Invocation) -> Result<(), CommandError> {
        let command = self
            .find(&invocation.name)
            .ok_or_else(|| CommandError::UnknownCommand(invocation.name.clone()))?;
        command
            .check(&invocation.arg_words())
            .map_err(|fail| CommandParseError::new(fail, invocation).into())
    }

    /// Parse the arguments of the named command and run its handler.
    pub async fn invoke(&self, context: C, invocation: &Invocation) -> Result<(), CommandError> {
        let command = self
            .find(&invocation.name)
            .ok_or_else(|| CommandError::UnknownCommand(invocation.name.clone()))?;
        debug!(command = command.name(), args = ?invocation.args, "invoking");
        let run = command.prepare(context, invocation)?;
        run.await?;
        Ok(())
    }

    /// One `name: description` line per command, in registration order.
    pub fn help(&self) -> String {
        self.commands
            .iter()
            .map(|command| format!("{}: {}", command.name(), command.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// This registry as a parser of `[name, args...]`.
    pub fn parser(self: &Arc<Self>) -> CommandsParser<C> {
        CommandsParser::new(Arc::downgrade(self))
    }
}

/// Parses a whole command line into an [`Invoker`] for a registry.
///
/// The registry is held weakly so that a command inside it can embed a
/// parser over that same registry.
pub struct CommandsParser<C> {
    commands: Weak<Commands<C>>,
}

impl<C> CommandsParser<C> {
    pub fn new(commands: Weak<Commands<C>>) -> Self {
        Self { commands }
    }
}

impl<C> Clone for CommandsParser<C> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
        }
    }
}

impl<C> Parser for CommandsParser<C> {
    type Output = Invoker<C>;

    /// Consumes all tokens. The named command must exist and accept its
    /// arguments; argument failures are reported at their position in the
    /// whole line.
    fn parse(&self, args: &[&str]) -> ParseResult<Invoker<C>> {
        let Some((name, rest)) = args.split_first() else {
            return Err(ParseFail::new("No command name", 0));
        };
        let Some(commands) = self.commands.upgrade() else {
            return Err(ParseFail::new("No commands available", 0));
        };
        let Some(command) = commands.find(name) else {
            return Err(ParseFail::new(format!("No such command: {name}"), 0));
        };
        command.check(rest).map_err(|fail| fail.offset(1))?;
        let invocation = Invocation::new(*name, rest.iter().copied());
        Ok(Parsed::new(
            Invoker {
                commands: commands.clone(),
                invocation,
            },
            args.len(),
        ))
    }
}

/// A command line bound to a registry, to be run later with a context.
pub struct Invoker<C> {
    commands: Arc<Commands<C>>,
    invocation: Invocation,
}

impl<C> Invoker<C> {
    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    pub async fn call(&self, context: C) -> Result<(), CommandError> {
        self.commands.invoke(context, &self.invocation).await
    }
}

impl<C> Clone for Invoker<C> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            invocation: self.invocation.clone(),
        }
    }
}

impl<C> std::fmt::Debug for Invoker<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("invocation", &self.invocation)
            .finish()
    }
}
