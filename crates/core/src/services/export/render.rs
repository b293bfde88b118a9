//! Format renderers over a flattened table.

use serde_json::Value;

use super::pdf::PdfDocument;
use super::title::{format_title, wrap_text};

/// Rows of one area, already flattened to cells.
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<Value>>,
}

impl ExportTable {
    /// Rows as JSON objects keyed by column.
    #[must_use]
    pub fn row_objects(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|cells| {
                let object: serde_json::Map<String, Value> = self
                    .columns
                    .iter()
                    .zip(cells)
                    .map(|(column, cell)| ((*column).to_string(), cell.clone()))
                    .collect();
                Value::Object(object)
            })
            .collect()
    }
}

/// Plain-text form of a cell: `null` is empty, lists are joined with `; `.
#[must_use]
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join("; "),
        Value::Object(_) => value.to_string(),
    }
}

fn escape_csv(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// RFC 4180 CSV with a header row and CRLF line endings.
#[must_use]
pub fn render_csv(table: &ExportTable) -> Vec<u8> {
    let mut csv = String::new();

    let header: Vec<String> = table.columns.iter().map(|c| escape_csv(c)).collect();
    csv.push_str(&header.join(","));
    csv.push_str("\r\n");

    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|c| escape_csv(&cell_text(c))).collect();
        csv.push_str(&cells.join(","));
        csv.push_str("\r\n");
    }

    csv.into_bytes()
}

/// Lay out a table as a titled text document.
///
/// Each record becomes a block of `column: value` lines; the summary, when
/// present, is listed first.
#[must_use]
pub fn pdf_document(
    filename: &str,
    generated_at: &str,
    summary: Option<&Value>,
    table: &ExportTable,
    title_width: usize,
    body_width: usize,
) -> PdfDocument {
    let mut body = Vec::new();
    body.push(format!("Generated at {generated_at}"));
    body.push(format!("Records: {}", table.rows.len()));
    body.push(String::new());

    if let Some(Value::Object(summary)) = summary {
        body.push("Summary".to_string());
        for (key, value) in summary {
            push_field(&mut body, key, value, body_width);
        }
        body.push(String::new());
    }

    for (index, row) in table.rows.iter().enumerate() {
        body.push(format!("#{}", index + 1));
        for (column, cell) in table.columns.iter().zip(row) {
            push_field(&mut body, column, cell, body_width);
        }
        body.push(String::new());
    }

    PdfDocument {
        title_lines: format_title(filename, title_width),
        body_lines: body,
    }
}

fn push_field(body: &mut Vec<String>, key: &str, value: &Value, width: usize) {
    match value {
        Value::Object(nested) => {
            body.push(format!("  {key}:"));
            for (inner_key, inner) in nested {
                push_indented(body, "    ", &format!("{inner_key}: {}", cell_text(inner)), width);
            }
        }
        other => push_indented(body, "  ", &format!("{key}: {}", cell_text(other)), width),
    }
}

fn push_indented(body: &mut Vec<String>, indent: &str, text: &str, width: usize) {
    let available = width.saturating_sub(indent.len());
    body.extend(
        wrap_text(text, available)
            .into_iter()
            .map(|line| format!("{indent}{line}")),
    );
}
