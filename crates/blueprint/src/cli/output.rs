//! Output formatting utilities for CLI commands

use blueprint_schema::{Column, EditSession, Schema};
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, Color, ContentArrangement, Table};

const COLUMN_HEADERS: [&str; 6] = ["#", "Inbound", "Outbound", "Transformer", "Options", "Mapping"];

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);
    table
}

/// Print a table with headers and rows
pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut table = new_table(headers);
    for row in rows {
        table.add_row(row);
    }
    println!("{}", table);
}

fn column_cells(position: String, column: &Column, outbound: String) -> Vec<String> {
    vec![
        position,
        column.inbound_name.clone(),
        outbound,
        column.transformer.to_string(),
        column.column_creation_options.trim().to_string(),
        column.supporting_column().unwrap_or("").to_string(),
    ]
}

/// One row per column, in schema order.
pub fn schema_rows(schema: &Schema) -> Vec<Vec<String>> {
    schema
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| column_cells(i.to_string(), column, column.outbound_name.clone()))
        .collect()
}

pub fn print_schema(schema: &Schema) {
    println!("EVENT: {} ({} columns)", schema.event_name, schema.columns.len());
    print_table(&COLUMN_HEADERS, schema_rows(schema));
}

/// Baseline with staged changes marked: deletions red, renames yellow,
/// additions green at the end.
pub fn print_session_preview(schema: &Schema, session: &EditSession) {
    let mut table = new_table(&COLUMN_HEADERS);

    for (i, column) in schema.columns.iter().enumerate() {
        let current = session
            .name_map()
            .get(&column.outbound_name)
            .unwrap_or(column.outbound_name.as_str());
        let (outbound, color) = if session.is_staged_for_delete(i) {
            (format!("{} (delete)", column.outbound_name), Some(Color::Red))
        } else if current != column.outbound_name {
            (format!("{} -> {}", column.outbound_name, current), Some(Color::Yellow))
        } else {
            (column.outbound_name.clone(), None)
        };
        let cells: Vec<Cell> = column_cells(i.to_string(), column, outbound)
            .into_iter()
            .map(|text| match color {
                Some(c) => Cell::new(text).fg(c),
                None => Cell::new(text),
            })
            .collect();
        table.add_row(cells);
    }

    for column in session.additions() {
        let cells: Vec<Cell> = column_cells("+".to_string(), column, column.outbound_name.clone())
            .into_iter()
            .map(|text| Cell::new(text).fg(Color::Green))
            .collect();
        table.add_row(cells);
    }

    let summary = session.summary();
    println!(
        "EVENT: {} (+{} added, -{} deleted, {} renamed)",
        schema.event_name, summary.additions, summary.deletes, summary.renames
    );
    println!("{}", table);
}
