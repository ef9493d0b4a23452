//! Decides how a query result should be displayed.
//!
//! Identifier and audit columns are dropped first, then the shape of what
//! is left picks the rendering:
//! - one string-like column plus at least one numeric column -> `graph`
//! - a single value (at most one column and one row)         -> `text`
//! - anything else                                            -> `table`
//!
//! Column types are read from the first row only; rows are assumed to be
//! homogeneous per column.

use crate::application::use_cases::value_formatter::format_if_date;
use crate::domain::query_result::{CellValue, QueryResult, RenderingType};
use once_cell::sync::Lazy;
use regex::Regex;

static ID_COLUMN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bID\b").unwrap());

pub const AUDIT_COLUMNS: &[&str] = &["UPDATEDAT"];

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedResult {
    pub result: QueryResult,
    pub rendering_type: RenderingType,
}

pub fn is_hidden_column(column: &str) -> bool {
    ID_COLUMN_PATTERN.is_match(column) || AUDIT_COLUMNS.contains(&column)
}

/// Drop hidden columns from the header and from every row, keeping order.
pub fn filter_columns(result: QueryResult) -> QueryResult {
    let keep: Vec<bool> = result
        .columns
        .iter()
        .map(|column| !is_hidden_column(column))
        .collect();

    let columns = result
        .columns
        .into_iter()
        .zip(&keep)
        .filter_map(|(column, keep)| keep.then_some(column))
        .collect();

    let rows = result
        .rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&keep)
                .filter_map(|(value, keep)| keep.then_some(value))
                .collect()
        })
        .collect();

    QueryResult { columns, rows }
}

fn decide(first_row: &[CellValue], column_count: usize, row_count: usize) -> RenderingType {
    let numeric = first_row.iter().filter(|v| v.is_numeric()).count();
    let string_like = first_row.len() - numeric;

    if string_like == 1 && numeric >= 1 {
        RenderingType::Graph
    } else if column_count <= 1 && row_count <= 1 {
        RenderingType::Text
    } else {
        RenderingType::Table
    }
}

pub fn classify(result: QueryResult) -> ClassifiedResult {
    if result.is_empty() {
        return ClassifiedResult {
            result,
            rendering_type: RenderingType::Text,
        };
    }

    let filtered = filter_columns(result);
    if filtered.columns.is_empty() {
        return ClassifiedResult {
            result: filtered,
            rendering_type: RenderingType::Text,
        };
    }

    let rendering_type = decide(&filtered.rows[0], filtered.columns.len(), filtered.rows.len());

    let rows = filtered
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(format_if_date).collect())
        .collect();

    tracing::debug!(
        columns = filtered.columns.len(),
        rendering_type = ?rendering_type,
        "Classified query result"
    );

    ClassifiedResult {
        result: QueryResult {
            columns: filtered.columns,
            rows,
        },
        rendering_type,
    }
}
