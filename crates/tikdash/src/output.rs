//! Output rendering: `tabled` tables or JSON via serde.

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render a list either as a table (via `to_row`) or as JSON of the
/// original data.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                return Ok("(none)".into());
            }
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(Table::new(rows).with(Style::rounded()).to_string())
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
    }
}

/// Render a single item: a pre-formatted detail block or JSON.
pub fn render_single<T: Serialize>(
    format: OutputFormat,
    data: &T,
    detail: impl Fn(&T) -> String,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(detail(data)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(data)?),
    }
}
