//! Shared output helpers for commands.

use serde::Serialize;

use crate::OutputFormat;

/// Print `value` as pretty JSON when JSON output is selected.
///
/// Text output is formatted by each command, so this is a no-op for
/// [`OutputFormat::Text`].
pub fn print<T: Serialize>(value: &T, format: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    if let OutputFormat::Json = format {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to serialize output: {}", e),
        }
    }
}

/// "yes"/"NO" marker used in text reports.
pub fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "NO" }
}
