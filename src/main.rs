use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use savoir_sync::cli::args::{Cli, Commands};
use savoir_sync::cli::commands::{self, AppContext};
use savoir_sync::config::Config;
use savoir_sync::logging;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        print!("{}", commands::generate_completions(shell)?);
        return Ok(());
    }

    let mut config = Config::load().context("failed to load configuration")?;
    cli.apply_overrides(&mut config);
    logging::init(&config.logging.filter);
    config.general.color.apply();

    let format = cli.output.unwrap_or(config.general.default_output);
    let ctx = AppContext::open(config).context("failed to open the offline queue")?;

    let output = match cli.command {
        Commands::Status => commands::status(&ctx.queue, format)?,
        Commands::List { limit } => commands::list(&ctx.queue, limit, format)?,
        Commands::Submit(args) => commands::submit(&ctx, args, format)?,
        Commands::Flush => commands::flush(&ctx.queue, format)?,
        Commands::Clear { force } => commands::clear(&ctx.queue, force, format)?,
        Commands::Watch { interval, once } => commands::watch(&ctx, interval, once, format)?,
        Commands::Completions { .. } => String::new(),
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
