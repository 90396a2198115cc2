//! Command handlers.
//!
//! Each handler takes the validated [`flashgen_core::CompanionConfig`],
//! drives the blocking `CompanionService` API and formats the result for
//! the terminal. No process or HTTP code lives here.

pub mod exercise;
pub mod practice;
pub mod start;
pub mod status;
pub mod stop;
