// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human/JSON rendering (spec §6: "all commands accept
//! `--output-format {human,json}`"); grounded on the teacher's
//! `crates/cli/src/output.rs::OutputFormat` enum.

use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Print a single JSON line (spec §6: "JSON output is a single line
/// terminated by `\n`").
pub fn print_json(value: &impl Serialize) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{line}"),
        Err(e) => eprintln!("failed to serialize output: {e}"),
    }
}

/// Render a millisecond duration as `Ns`/`Nm Ns`/`Nh Nm` (spec §6 `status`
/// human rendering shows task elapsed time).
pub fn format_elapsed(ms: i64) -> String {
    substrate_core::time_fmt::format_elapsed_ms(ms.max(0) as u64)
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
