use std::sync::Arc;

use botcmd_commands::{CommandError, Commands, Invocation};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, error, info};

use crate::context::{CommandContext, IdCounter, Replies, Txn};

/// The reply for a command that did not run to completion.
pub(crate) fn failure_reply(txn: Txn, error: &CommandError) -> String {
    match error {
        CommandError::Parse(error) => {
            format!("{txn}\n{}\n{}", error.message, error.marked_line())
        }
        CommandError::UnknownCommand(name) => format!("No such command: {name}"),
        CommandError::Handler(_) => format!("{txn}: Failed to process request"),
    }
}

/// Reads command lines and dispatches them to a registry.
pub struct Control {
    commands: Arc<Commands<CommandContext>>,
    replies: Replies,
    txns: Arc<IdCounter>,
    prefix: Option<String>,
}

impl Control {
    /// With `prefix` set only lines starting with it are commands.
    pub fn new(
        commands: Arc<Commands<CommandContext>>,
        replies: Replies,
        txns: Arc<IdCounter>,
        prefix: Option<String>,
    ) -> Self {
        Self {
            commands,
            replies,
            txns,
            prefix,
        }
    }

    /// Handle lines until `input` is exhausted.
    pub async fn run<R>(&self, input: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            self.handle_line(&line).await;
        }
        info!("input closed");
        Ok(())
    }

    pub async fn handle_line(&self, line: &str) {
        let line = line.trim_start();
        let body = match &self.prefix {
            Some(prefix) => match line.strip_prefix(prefix.as_str()) {
                Some(body) => body,
                None => {
                    debug!(line, "not a command");
                    return;
                }
            },
            None => line,
        };
        let invocation = match Invocation::parse(body) {
            Ok(invocation) => invocation,
            Err(error) => {
                debug!(%error, "ignoring empty message");
                return;
            }
        };

        let txn = Txn(self.txns.next());
        info!(%txn, command = %invocation, "received");
        let context = CommandContext::new(txn, self.replies.clone());
        if let Err(error) = self.commands.invoke(context, &invocation).await {
            match &error {
                CommandError::Handler(cause) => {
                    error!(%txn, ?cause, "failure processing command")
                }
                other => debug!(%txn, error = %other, "rejected command"),
            }
            self.replies.send(failure_reply(txn, &error));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use botcmd_commands::Function;
    use botcmd_parser::{Bool, Empty, Parser};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn commands() -> Arc<Commands<CommandContext>> {
        let mut commands = Commands::new();
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
            "lights",
            "Switch the lights",
            Bool.remaining(),
            |_context: CommandContext, _on: bool| async {
                Err::<(), _>(anyhow::anyhow!("lights are unreachable"))
            },
        ));
        Arc::new(commands)
    }

    fn control(prefix: Option<&str>) -> (Control, UnboundedReceiver<String>) {
        let (replies, receiver) = Replies::channel();
        let control = Control::new(
            commands(),
            replies,
            Arc::new(IdCounter::default()),
            prefix.map(str::to_string),
        );
        (control, receiver)
    }

    fn drain(receiver: &mut UnboundedReceiver<String>) -> Vec<String> {
        let mut replies = Vec::new();
        while let Ok(reply) = receiver.try_recv() {
            replies.push(reply);
        }
        replies
    }

    #[tokio::test]
    async fn test_prefix_required() {
        let (control, mut receiver) = control(Some("!"));
        control.handle_line("ping").await;
        control.handle_line("   ").await;
        control.handle_line("!").await;
        assert!(drain(&mut receiver).is_empty());
        control.handle_line("!ping").await;
        control.handle_line("  ! PING").await;
        assert_eq!(drain(&mut receiver), ["pong", "pong"]);
    }

    #[tokio::test]
    async fn test_empty_command_takes_no_txn() {
        let (control, mut receiver) = control(Some("!"));
        control.handle_line("!").await;
        control.handle_line("!   ").await;
        control.handle_line("!lights maybe").await;
        assert_eq!(
            drain(&mut receiver),
            ["txn 1\nInvalid argument \"maybe\" for boolean\nlights _maybe_"]
        );
    }

    #[tokio::test]
    async fn test_without_prefix() {
        let (control, mut receiver) = control(None);
        control.handle_line("ping").await;
        assert_eq!(drain(&mut receiver), ["pong"]);
    }

    #[tokio::test]
    async fn test_failure_replies() {
        let (control, mut receiver) = control(None);
        control.handle_line("lights maybe").await;
        control.handle_line("sing").await;
        control.handle_line("lights on").await;
        assert_eq!(
            drain(&mut receiver),
            [
                "txn 1\nInvalid argument \"maybe\" for boolean\nlights _maybe_",
                "No such command: sing",
                "txn 3: Failed to process request",
            ]
        );
    }

    #[tokio::test]
    async fn test_run_reads_all_lines() {
        let (control, mut receiver) = control(Some("!"));
        let input: &[u8] = b"!ping\nhello\n!ping\n";
        control.run(input).await.unwrap();
        assert_eq!(drain(&mut receiver), ["pong", "pong"]);
    }
}
