//! Command handlers for the Askbase CLI.

pub mod ask;
pub mod check;
pub mod expand;
pub mod retrieve;

pub use ask::AskCommand;
pub use check::CheckCommand;
pub use expand::ExpandCommand;
pub use retrieve::RetrieveCommand;

use askbase_core::{AppError, AppResult};

/// Pretty-print a serializable value to stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> AppResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Serialization(format!("Failed to serialize output: {}", e)))?;
    println!("{}", json);
    Ok(())
}
