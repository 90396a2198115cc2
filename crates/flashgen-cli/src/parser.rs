//! Main CLI parser and top-level argument handling.
//!
//! Global options override the companion configuration. Each also reads
//! the matching `FLASHGEN_COMPANION_*` environment variable.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the flashcard exercise companion.
#[derive(Debug, Parser)]
#[command(name = "flashgen")]
#[command(about = "Launch, query and stop the local exercise-generation companion")]
#[command(version)]
pub struct Cli {
    /// Host the companion listens on
    #[arg(long, global = true, env = "FLASHGEN_COMPANION_HOST")]
    pub host: Option<String>,

    /// Port the companion listens on
    #[arg(short, long, global = true, env = "FLASHGEN_COMPANION_PORT")]
    pub port: Option<u16>,

    /// Interpreter used to run the companion script
    #[arg(long, global = true, env = "FLASHGEN_COMPANION_INTERPRETER")]
    pub interpreter: Option<PathBuf>,

    /// Companion script passed to the interpreter
    #[arg(long, global = true, env = "FLASHGEN_COMPANION_SCRIPT")]
    pub script: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parser_builds() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::parse_from([
            "flashgen",
            "stop",
            "--force",
            "--port",
            "8123",
            "--interpreter",
            "/opt/python/bin/python3",
        ]);
        assert_eq!(cli.port, Some(8123));
        assert_eq!(
            cli.interpreter,
            Some(PathBuf::from("/opt/python/bin/python3"))
        );
        assert_eq!(cli.command, Commands::Stop { force: true });
    }

    #[test]
    fn test_exercise_requires_both_sides() {
        assert!(Cli::try_parse_from(["flashgen", "exercise", "--front", "run"]).is_err());

        let cli = Cli::parse_from(["flashgen", "exercise", "--front", "run", "--back", "to run"]);
        assert_eq!(
            cli.command,
            Commands::Exercise {
                front: "run".to_string(),
                back: "to run".to_string(),
            }
        );
    }
}
