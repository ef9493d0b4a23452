use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// A single decoded cell returned by the executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<FixedOffset>),
}

impl CellValue {
    pub fn is_numeric(&self) -> bool {
        matches!(self, CellValue::Integer(_) | CellValue::Float(_))
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Integer(value.into())
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.rows.is_empty()
    }
}

pub const ACK_MESSAGE: &str = "Query executed successfully";

/// What the executor hands back: rows for reads, an acknowledgement otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExecutionOutcome {
    Rows(QueryResult),
    Acknowledged { message: String },
}

impl ExecutionOutcome {
    pub fn acknowledged() -> Self {
        ExecutionOutcome::Acknowledged {
            message: ACK_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderingType {
    Graph,
    Table,
    Text,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedResponse {
    pub prompt: String,
    pub generated_query: String,
    pub execution_result: ExecutionOutcome,
    pub rendering_type: RenderingType,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuery {
    pub prompt: String,
    pub generated_query: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rendered_response_wire_format() {
        let response = RenderedResponse {
            prompt: "weight per vessel".into(),
            generated_query: "SELECT NAME, WEIGHT FROM vessels".into(),
            execution_result: ExecutionOutcome::Rows(QueryResult::new(
                vec!["NAME".into(), "WEIGHT".into()],
                vec![vec!["Aurora".into(), CellValue::Float(12.5)]],
            )),
            rendering_type: RenderingType::Graph,
            description: "good".into(),
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "prompt": "weight per vessel",
                "generatedQuery": "SELECT NAME, WEIGHT FROM vessels",
                "executionResult": { "columns": ["NAME", "WEIGHT"], "rows": [["Aurora", 12.5]] },
                "renderingType": "graph",
                "description": "good"
            })
        );
    }

    #[test]
    fn test_acknowledgement_serializes_as_message() {
        assert_eq!(
            serde_json::to_value(ExecutionOutcome::acknowledged()).unwrap(),
            json!({ "message": "Query executed successfully" })
        );
    }

    #[test]
    fn test_null_cell_serializes_as_null() {
        assert_eq!(serde_json::to_value(CellValue::Null).unwrap(), json!(null));
    }
}
