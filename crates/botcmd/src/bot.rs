use std::sync::Arc;

use botcmd_commands::Commands;
use tracing::info;

use crate::builtin;
use crate::config::Config;
use crate::context::{CommandContext, IdCounter, Replies, Settings};
use crate::control::Control;
use crate::state::StateStore;
use crate::timers::AppTimers;

/// Everything the console bot is made of, wired together.
pub struct Bot {
    commands: Arc<Commands<CommandContext>>,
    timers: Arc<AppTimers>,
    settings: Arc<Settings>,
    control: Control,
}

impl Bot {
    pub fn new(config: &Config, replies: Replies) -> Self {
        let settings = Arc::new(Settings::default());
        let txns = Arc::new(IdCounter::default());
        let store = StateStore::new(config.state_file.clone());

        let mut timers = None;
        let commands = Arc::new_cyclic(|registry| {
            let mut commands = Commands::new();
            builtin::register(&mut commands, registry.clone(), settings.clone());
            let app_timers = AppTimers::new(
                registry.clone(),
                settings.clone(),
                replies.clone(),
                txns.clone(),
                store,
            );
            app_timers.register(&mut commands);
            timers = Some(app_timers);
            commands
        });
        let timers = timers.expect("timers are created with the registry");

        let control = Control::new(commands.clone(), replies, txns, config.prefix.clone());
        Self {
            commands,
            timers,
            settings,
            control,
        }
    }

    /// Restore saved timers and start running them.
    pub fn start(&self) -> anyhow::Result<()> {
        let loaded = self.timers.load()?;
        info!(loaded, "restored timers");
        self.timers.start()?;
        Ok(())
    }

    pub fn stop(&self) -> anyhow::Result<()> {
        self.timers.stop()?;
        Ok(())
    }

    pub fn commands(&self) -> &Arc<Commands<CommandContext>> {
        &self.commands
    }

    pub fn timers(&self) -> &Arc<AppTimers> {
        &self.timers
    }

    pub fn settings(&self) -> &Arc<Settings> {
        &self.settings
    }

    pub fn control(&self) -> &Control {
        &self.control
    }
}
