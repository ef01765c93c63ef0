use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use crossterm::style::Stylize;

use record_grid::core::RenderState;
use record_grid::state::edit_session::SessionState;

/// Build the table for the current page. Cells holding a search match are bold.
pub fn build_table(state: &RenderState) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let headers: Vec<Cell> = state
        .columns
        .iter()
        .map(|column| Cell::new(&column.title).add_attribute(Attribute::Bold))
        .collect();
    table.set_header(headers);

    for record in &state.rows {
        let row: Vec<Cell> = state
            .columns
            .iter()
            .map(|column| {
                let cell = Cell::new(record.get_as_string(&column.field));
                if state.highlight_for(record.key, &column.field).is_some() {
                    cell.add_attribute(Attribute::Bold)
                } else {
                    cell
                }
            })
            .collect();
        table.add_row(row);
    }

    table
}

pub fn display_page(state: &RenderState) {
    if let Some(error) = &state.load_error {
        eprintln!("{}", format!("Load error: {}", error).red());
    }

    if state.rows.is_empty() {
        println!("{}", "No records found.".yellow());
        return;
    }

    println!("{}", build_table(state));
    println!("\n{}", status_line(state).green());
}

pub fn status_line(state: &RenderState) -> String {
    let mut status = format!(
        "Page {} of {} ({} records)",
        state.page, state.page_count, state.total_rows
    );
    if let SessionState::Editing { key, .. } = &state.session {
        status.push_str(&format!(", editing record {}", key));
    }
    if let Some(key) = state.pending_delete {
        status.push_str(&format!(", delete of {} pending", key));
    }
    status
}
