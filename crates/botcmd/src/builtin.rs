//! Commands that need nothing but the console.

use std::sync::{Arc, Weak};

use anyhow::Context as _;
use botcmd_commands::{Commands, Function, Invoker};
use botcmd_parser::{Bool, Empty, Parser, RestAsStr};

use crate::context::{CommandContext, Settings};

/// Register `ping`, `help`, `echo`, `set` and `greet`.
///
/// `registry` is the registry being built, listed by `help`.
pub fn register(
    commands: &mut Commands<CommandContext>,
    registry: Weak<Commands<CommandContext>>,
    settings: Arc<Settings>,
) {
    commands.register(Function::new(
        "ping",
        "Ping the bot",
        Empty,
        |context: CommandContext, ()| async move {
            context.reply("pong");
            anyhow::Ok(())
        },
    ));

    commands.register(Function::new(
        "help",
        "List commands",
        Empty,
        move |context: CommandContext, ()| {
            let registry = registry.clone();
            async move {
                let commands = registry.upgrade().context("command registry is gone")?;
                context.reply(commands.help());
                anyhow::Ok(())
            }
        },
    ));

    commands.register(Function::new(
        "echo",
        "Reply with the given text",
        RestAsStr,
        |context: CommandContext, text: String| async move {
            context.reply(text);
            anyhow::Ok(())
        },
    ));

    let nested = settings_commands(&settings);
    commands.register(Function::new(
        "set",
        "Change a setting: set greeting <text> or set quiet <on|off>",
        nested.parser(),
        move |context: CommandContext, invoker: Invoker<CommandContext>| {
            let nested = nested.clone();
            async move {
                nested.invoke(context, invoker.invocation()).await?;
                anyhow::Ok(())
            }
        },
    ));

    commands.register(Function::new(
        "greet",
        "Say the greeting",
        Empty,
        move |context: CommandContext, ()| {
            let greeting = settings.greeting();
            async move {
                context.reply(greeting);
                anyhow::Ok(())
            }
        },
    ));
}

fn settings_commands(settings: &Arc<Settings>) -> Arc<Commands<CommandContext>> {
    let mut commands = Commands::new();

    let greeting_settings = settings.clone();
    commands.register(Function::new(
        "greeting",
        "Text said by greet",
        RestAsStr,
        move |context: CommandContext, greeting: String| {
            let settings = greeting_settings.clone();
            async move {
                context.reply(format!("Greeting set to \"{greeting}\""));
                settings.set_greeting(greeting);
                anyhow::Ok(())
            }
        },
    ));

    let quiet_settings = settings.clone();
    commands.register(Function::new(
        "quiet",
        "Suppress timer notices",
        Bool.remaining(),
        move |context: CommandContext, quiet: bool| {
            let settings = quiet_settings.clone();
            async move {
                settings.set_quiet(quiet);
                context.reply(if quiet { "Quiet mode on" } else { "Quiet mode off" });
                anyhow::Ok(())
            }
        },
    ));

    Arc::new(commands)
}
