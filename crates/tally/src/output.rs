//! Output formatting: table or JSON.
//!
//! Tables are built column-by-column from the view state's displayed
//! columns, so the header set follows the active grouping.

use std::io::{self, Write};

use tabled::{builder::Builder, settings::Style};

use tally_core::AggregationState;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Render a settled view state in the chosen format.
pub fn render_state(format: OutputFormat, state: &AggregationState) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(render_table(state)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(state)?),
        OutputFormat::JsonCompact => Ok(serde_json::to_string(state)?),
    }
}

fn render_table(state: &AggregationState) -> String {
    if state.show_no_data() {
        return "No data".into();
    }

    let columns = state.displayed_columns();
    let mut builder = Builder::default();
    builder.push_record(columns.iter().map(|c| c.label()));
    for record in state.data().iter() {
        builder.push_record(columns.iter().map(|c| record.cell(*c)));
    }

    let table = builder.build().with(Style::rounded()).to_string();
    format!("{table}\n{}", page_footer(state))
}

fn page_footer(state: &AggregationState) -> String {
    format!(
        "Page {} of {} ({} records, {} per page)",
        state.current_page().saturating_add(1),
        state.total_pages().max(1),
        state.total_elements(),
        state.page_size(),
    )
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}
