//! Plain-text rendering of tabular results

use sf_core::TabularResult;

const ELLIPSIS: &str = "...";

/// Render `table` as an ASCII grid.
///
/// At most `max_rows` rows are shown; cells longer than `max_cell_length`
/// characters are cut and end in `...`.
///
/// # Examples
/// ```
/// use sf_core::{SqlValue, TabularResult};
/// use sf_compare::format_as_text_table;
///
/// let table = TabularResult::from_names(
///     &["Id", "Name"],
///     vec![vec![SqlValue::Int(1), SqlValue::from("A")]],
/// ).unwrap();
/// assert_eq!(
///     format_as_text_table(&table, 10, 20),
///     "| Id | Name |\n|----|------|\n| 1  | A    |"
/// );
/// ```
pub fn format_as_text_table(table: &TabularResult, max_rows: usize, max_cell_length: usize) -> String {
    if table.column_count() == 0 {
        return "(no columns)".to_string();
    }

    let header: Vec<String> = table
        .column_names()
        .map(|name| truncate_cell(name, max_cell_length))
        .collect();
    let body: Vec<Vec<String>> = table
        .rows()
        .iter()
        .take(max_rows)
        .map(|row| {
            row.iter()
                .map(|value| truncate_cell(&value.to_string(), max_cell_length))
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in &body {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(body.len() + 3);
    lines.push(render_line(&header, &widths));
    lines.push(format!(
        "|{}|",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("|")
    ));
    for row in &body {
        lines.push(render_line(row, &widths));
    }

    if table.row_count() == 0 {
        lines.push("(0 rows)".to_string());
    } else if table.row_count() > max_rows {
        let hidden = table.row_count() - max_rows;
        lines.push(format!("... {} more row(s)", hidden));
    }
    lines.join("\n")
}

/// Cut `text` to at most `max_len` characters, marking the cut.
pub fn truncate_cell(text: &str, max_len: usize) -> String {
    let text = text.replace(['\r', '\n'], " ");
    if text.chars().count() <= max_len {
        return text;
    }
    if max_len <= ELLIPSIS.len() {
        return text.chars().take(max_len).collect();
    }
    let kept: String = text.chars().take(max_len - ELLIPSIS.len()).collect();
    format!("{kept}{ELLIPSIS}")
}

fn render_line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!(" {:<width$} ", cell, width = width))
        .collect();
    format!("|{}|", padded.join("|"))
}
