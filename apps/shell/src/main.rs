#![allow(clippy::print_stdout, clippy::print_stderr)]

mod args;
mod commands;
mod prompt;

use crate::args::Cli;
use crate::prompt::Prompt;
use anyhow::Context;
use clap::Parser;
use ksafe::VaultManager;
use ksafe::domain::config::{KeepsafeConfig, LoggingConfig};
use ksafe::kernel::config::load_config;
use ksafe_logger::{LevelFilter, Logger, parse_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config: KeepsafeConfig =
        load_config(cli.config.as_deref()).context("Configuration is malformed")?;
    let _logger = init_logger(&config.logging, cli.verbose)?;

    let manager = VaultManager::from_config(&config, None).await.context("Cannot open the vault")?;

    commands::run(&manager, Prompt::new(cli.password_stdin), cli.command).await
}

fn init_logger(config: &LoggingConfig, verbose: bool) -> anyhow::Result<Logger> {
    let level = if verbose { LevelFilter::DEBUG } else { parse_level(&config.level)? };
    let builder = Logger::builder().name(env!("CARGO_BIN_NAME")).level(level).console(true);

    let logger = match &config.dir {
        Some(dir) => builder.path(dir).json(config.json).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}
