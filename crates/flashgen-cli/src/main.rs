//! CLI entry point - the composition root.

use std::process::ExitCode;

use clap::Parser;
use flashgen_cli::{Cli, CliError, Commands, companion_config, handlers, init_logging};

fn main() -> ExitCode {
    // Load .env before parsing so clap's env fallbacks see it
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(err.downcast_ref::<CliError>().map_or(1, CliError::exit_code))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = companion_config(&cli)?;

    match cli.command {
        Commands::Status { json } => handlers::status::execute(config, json),
        Commands::Start => handlers::start::execute(config),
        Commands::Stop { force } => handlers::stop::execute(config, force),
        Commands::Exercise { front, back } => handlers::exercise::execute(config, &front, &back),
        Commands::Practice { front, back } => handlers::practice::execute(config, &front, &back),
    }
}
