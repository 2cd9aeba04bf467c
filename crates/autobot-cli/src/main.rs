//! Autobot CLI - Main entry point

use autobot_cli::{commands, AppContext, Cli, Commands};
use autobot_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use clap::Parser;
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Serving logs at info; other commands keep the console quiet unless verbose
    let level = match (&cli.command, cli.verbose) {
        (_, true) => LogLevel::Debug,
        (Commands::Serve { .. }, false) => LogLevel::Info,
        (_, false) => LogLevel::Warn,
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("autobot")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().with_env_overrides().unwrap_or(log_config);

    // The CLI works without logging
    let _guard = init_logging(&log_config).ok();

    if let Err(e) = execute_command(&cli).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn execute_command(cli: &Cli) -> autobot_cli::Result<()> {
    match &cli.command {
        Commands::Init => return commands::init::run(&cli.config).await,
        Commands::Version => {
            commands::version::run();
            return Ok(());
        },
        _ => {},
    }

    let ctx = AppContext::bootstrap(&cli.config).await?;
    match &cli.command {
        Commands::Sync {
            provider,
            source_file,
            force,
        } => commands::sync::run(&ctx, provider, source_file.clone(), *force).await,
        Commands::Clear => commands::clear::run(&ctx).await,
        Commands::Status => commands::status::run(&ctx).await,
        Commands::Lookup {
            country,
            key,
            disabled,
            json,
        } => commands::lookup::run(&ctx, *country, key, *disabled, *json).await,
        Commands::Disable { hash } => commands::state::disable(&ctx, *hash).await,
        Commands::Enable { hash } => commands::state::enable(&ctx, *hash).await,
        Commands::Query(args) => commands::query::run(&ctx, args).await,
        Commands::Serve {
            port,
            no_sync,
            provider,
        } => commands::serve::run(&ctx, *port, *no_sync, provider).await,
        Commands::Init | Commands::Version => Ok(()),
    }
}
