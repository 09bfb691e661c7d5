//! botcmd console bot

use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use botcmd::{Args, Bot, Config, Replies};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from(Args::parse());

    let filter = match &config.log_filter {
        Some(filter) => EnvFilter::try_new(filter)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(prefix = ?config.prefix, state_file = ?config.state_file, "starting botcmd");

    let (replies, mut receiver) = Replies::channel();
    let printer = tokio::spawn(async move {
        while let Some(message) = receiver.recv().await {
            println!("{message}");
        }
    });

    let bot = Bot::new(&config, replies);
    bot.start()?;
    bot.control().run(BufReader::new(tokio::io::stdin())).await?;
    bot.stop()?;
    drop(bot);

    printer.await?;
    Ok(())
}
