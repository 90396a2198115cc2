//! Available subcommands.

use clap::Subcommand;

/// Operations on the companion service.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Show whether the companion port is listening and answering
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Launch the companion (or reuse a running one) and wait for Ctrl-C
    Start,

    /// Stop the companion listening on the port
    Stop {
        /// Kill whatever listens on the port, even if flashgen did not start it
        #[arg(short, long)]
        force: bool,
    },

    /// Generate one exercise sentence for a flashcard
    Exercise {
        /// Front side of the card (the word to practise)
        #[arg(long)]
        front: String,
        /// Back side of the card (translation or definition)
        #[arg(long)]
        back: String,
    },

    /// Generate an exercise, then read and check your answer from stdin
    Practice {
        /// Front side of the card (the word to practise)
        #[arg(long)]
        front: String,
        /// Back side of the card (translation or definition)
        #[arg(long)]
        back: String,
    },
}
