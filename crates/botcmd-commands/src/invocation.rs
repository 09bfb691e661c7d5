use tracing::debug;

use crate::error::InvocationParseError;

/// A command name and its argument words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a command line on runs of whitespace. The first word is the
    /// command name.
    pub fn parse(line: &str) -> Result<Self, InvocationParseError> {
        let mut words = line.split_whitespace();
        let name = words.next().ok_or(InvocationParseError)?;
        let invocation = Self::new(name, words);
        debug!(name = %invocation.name, args = ?invocation.args, "parsed invocation");
        Ok(invocation)
    }

    /// The arguments as a token slice for a parser.
    pub fn arg_words(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }

    /// Name and arguments as the words of the original line.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.args.iter().map(String::as_str))
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.words().collect::<Vec<_>>().join(" "))
    }
}
