use std::path::PathBuf;

use clap::Parser;

/// Command line of the `botcmd` binary.
#[derive(Parser, Debug)]
#[command(name = "botcmd")]
#[command(about = "Console chat bot with scheduled commands")]
#[command(version)]
pub struct Args {
    /// Prefix that marks a line as a command
    #[arg(long, value_name = "PREFIX", default_value = "!")]
    pub prefix: String,

    /// Treat every line as a command
    #[arg(long, conflicts_with = "prefix")]
    pub no_prefix: bool,

    /// Where timers are saved between runs
    #[arg(long, value_name = "FILE")]
    pub state_file: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `botcmd_scheduler=debug`
    #[arg(long, value_name = "FILTER")]
    pub log: Option<String>,
}

/// Runtime settings of the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub prefix: Option<String>,
    pub state_file: Option<PathBuf>,
    pub log_filter: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            prefix: Some("!".to_string()),
            state_file: None,
            log_filter: None,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn no_prefix(mut self) -> Self {
        self.prefix = None;
        self
    }

    pub fn state_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_file = Some(path.into());
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.log_filter = Some(filter.into());
        self
    }
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        let mut config = Config::new().prefix(args.prefix);
        if args.no_prefix {
            config = config.no_prefix();
        }
        if let Some(path) = args.state_file {
            config = config.state_file(path);
        }
        if let Some(filter) = args.log {
            config = config.log_filter(filter);
        }
        config
    }
}
