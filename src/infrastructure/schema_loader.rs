use crate::domain::error::{AppError, Result};
use crate::domain::schema::Schema;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// Read, parse and validate the schema file. Any failure aborts startup.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AppError::SchemaError(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let schema = parse_schema(&text)?;
    info!(
        path = %path.display(),
        tables = schema.len(),
        "Loaded schema"
    );
    Ok(schema)
}

pub fn parse_schema(text: &str) -> Result<Schema> {
    let schema: Schema = serde_json::from_str(text)
        .map_err(|e| AppError::SchemaError(format!("Invalid schema JSON: {}", e)))?;
    validate_schema(&schema)?;
    Ok(schema)
}

pub fn validate_schema(schema: &Schema) -> Result<()> {
    if schema.is_empty() {
        return Err(AppError::SchemaError("Schema has no tables".to_string()));
    }

    for (table, spec) in schema.tables() {
        let mut seen = HashSet::new();
        for column in &spec.columns {
            if !seen.insert(column.as_str()) {
                return Err(AppError::SchemaError(format!(
                    "Table '{}' declares column '{}' more than once",
                    table, column
                )));
            }
        }

        for (column, referenced) in &spec.foreign_keys {
            if !seen.contains(column.as_str()) {
                warn!(
                    table,
                    column = column.as_str(),
                    "Foreign key column is not declared in the table's columns"
                );
            }
            if !schema.contains_table(referenced) {
                warn!(
                    table,
                    referenced = referenced.as_str(),
                    "Foreign key references a table missing from the schema"
                );
            }
        }
    }
    Ok(())
}
