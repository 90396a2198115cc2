//! Exercise command handler.
//!
//! One-shot version of the application lifecycle: bring the companion up,
//! ask for one sentence, stop what we started.

use anyhow::Result;
use flashgen_core::{CompanionConfig, Exercise, PromptRequest};
use flashgen_runtime::CompanionService;
use tracing::{debug, warn};

use crate::error::CliError;

pub fn execute(config: CompanionConfig, front: &str, back: &str) -> Result<()> {
    let exercise = generate(config, PromptRequest::new(front, back))?;
    println!("{}", exercise.sentence);
    Ok(())
}

/// ensure_running, request, stop. The companion is stopped on every path.
pub(crate) fn generate(
    config: CompanionConfig,
    request: PromptRequest,
) -> Result<Exercise, CliError> {
    let service = CompanionService::start(config)?;

    eprintln!("Generating custom task...");
    let result = service.generate_exercise(request);

    let outcome = service.shutdown()?;
    debug!(?outcome, "Companion released");

    let exercise = result.map_err(CliError::Unavailable)?;
    if !exercise.has_blank() {
        warn!(sentence = %exercise.sentence, "Generated sentence has no blank");
    }
    Ok(exercise)
}
