use std::future::Future;
use std::pin::Pin;

use botcmd_parser::{ParseFail, Parser};

use crate::error::CommandParseError;
use crate::invocation::Invocation;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A named command that can be invoked with a context value.
pub trait Command<C>: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Validate the arguments without running anything.
    ///
    /// `args` excludes the command name; a failure's `consumed` indexes
    /// into it.
    fn check(&self, args: &[&str]) -> Result<(), ParseFail>;

    /// Parse the arguments and bind them to the handler.
    ///
    /// Parsing happens here, before the returned future is polled.
    fn prepare(
        &self,
        context: C,
        invocation: &Invocation,
    ) -> Result<BoxFuture<anyhow::Result<()>>, CommandParseError>;
}

/// A command made of an argument parser and an async handler.
pub struct Function<P, F> {
    name: String,
    description: String,
    parser: P,
    handler: F,
}

impl<P, F> Function<P, F> {
    pub fn new<C, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parser: P,
        handler: F,
    ) -> Self
    where
        P: Parser,
        F: Fn(C, P::Output) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parser,
            handler,
        }
    }
}

impl<C, P, F, Fut> Command<C> for Function<P, F>
where
    P: Parser + Send + Sync,
    F: Fn(C, P::Output) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn check(&self, args: &[&str]) -> Result<(), ParseFail> {
        self.parser.parse(args).map(|_| ())
    }

    fn prepare(
        &self,
        context: C,
        invocation: &Invocation,
    ) -> Result<BoxFuture<anyhow::Result<()>>, CommandParseError> {
        let parsed = self
            .parser
            .parse(&invocation.arg_words())
            .map_err(|fail| CommandParseError::new(fail, invocation))?;
        Ok(Box::pin((self.handler)(context, parsed.value)))
    }
}
