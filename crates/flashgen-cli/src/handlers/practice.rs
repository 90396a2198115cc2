//! Practice command handler: exercise plus answer check.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use flashgen_core::{CompanionConfig, PromptRequest};

use super::exercise::generate;
use crate::presentation::describe_verdict;

pub fn execute(config: CompanionConfig, front: &str, back: &str) -> Result<()> {
    let exercise = generate(config, PromptRequest::new(front, back))?;
    println!("{}", exercise.sentence);

    print!("Your answer: ");
    io::stdout().flush()?;
    let answer = read_answer(&mut io::stdin().lock())?;

    println!("{}", describe_verdict(exercise.check_answer(&answer), &exercise));
    Ok(())
}

/// Read one line, trimmed.
fn read_answer(input: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Failed to read answer")?;
    Ok(line.trim().to_string())
}
