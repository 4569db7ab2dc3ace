//! Repack CLI - extract, create and convert ZIP/RAR archives.

mod cli;
mod commands;
mod error;
mod output;
mod progress;

use anyhow::Result;
use clap::Parser;
use repack_core::ToolAvailability;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging(cli.verbose);

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);
    let show_progress = !cli.quiet && !cli.json && progress::CliProgress::should_show();

    match &cli.command {
        cli::Commands::Completion(args) => {
            commands::completion::execute(args.shell);
            Ok(())
        }
        command => {
            let tools = ToolAvailability::probe();
            let ctx = commands::Context {
                tools: &tools,
                formatter: &*formatter,
                show_progress,
            };
            match command {
                cli::Commands::Extract(args) => commands::extract::execute(args, &ctx),
                cli::Commands::Compress(args) => commands::compress::execute(args, &ctx),
                cli::Commands::Convert(args) => commands::convert::execute(args, &ctx),
                cli::Commands::Info(args) => commands::info::execute(args, &ctx),
                cli::Commands::Formats => commands::formats::execute(&ctx),
                cli::Commands::Completion(_) => Ok(()),
            }
        }
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
