//! Reporting of scan results.
//!
//! This module handles:
//! - Colored console output
//! - JSON output formatting

pub mod console;

pub use console::ConsoleOutput;
