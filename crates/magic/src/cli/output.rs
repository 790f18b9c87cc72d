//! Output formatting utilities for CLI commands

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};
use magic_contribution::{Diagnostic, Diagnostics, Severity};

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    println!("{}", build_table(headers, rows));
}

fn build_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        table.add_row(row);
    }
    table
}

fn severity_cell(severity: Severity) -> Cell {
    let color = match severity {
        Severity::Warning => Color::Yellow,
        Severity::Error => Color::Red,
    };
    Cell::new(severity.to_string()).fg(color)
}

fn context_text(diagnostic: &Diagnostic) -> String {
    diagnostic
        .context
        .as_ref()
        .map(|ctx| ctx.to_string())
        .unwrap_or_default()
}

/// Print errors then warnings as one table; nothing when there are none.
pub fn print_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        ["Severity", "Message", "Where"]
            .iter()
            .map(|h| Cell::new(h).fg(Color::Cyan))
            .collect::<Vec<_>>(),
    );
    for diagnostic in diagnostics.iter() {
        table.add_row(vec![
            severity_cell(diagnostic.severity),
            Cell::new(&diagnostic.message),
            Cell::new(context_text(diagnostic)),
        ]);
    }

    println!();
    println!(
        "{} warning(s), {} error(s)",
        diagnostics.warnings().len(),
        diagnostics.errors().len()
    );
    println!("{}", table);
}
