//! Chat command registry.
//!
//! A line is split into an [`Invocation`], looked up by name in
//! [`Commands`], and its arguments are parsed with the command's own
//! parser before the async handler runs with the caller's context.

pub mod command;
pub mod error;
pub mod invocation;
pub mod registry;

pub use command::{BoxFuture, Command, Function};
pub use error::{CommandError, CommandParseError, InvocationParseError, MarkedWord};
pub use invocation::Invocation;
pub use registry::{Commands, CommandsParser, Invoker};
