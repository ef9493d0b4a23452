//! Declarative relational schema handed to the query generator.
//!
//! The on-disk format is a JSON object keyed by table name:
//! ```json
//! {
//!   "vessels": {
//!     "columns": ["ID", "NAME", "ASSIGNEDCRADLE"],
//!     "foreign_keys": { "ASSIGNEDCRADLE": "cradles" }
//!   },
//!   "cradles": { "columns": ["ID", "STATUS"] }
//! }
//! ```
//! Tables are kept in a `BTreeMap` so every walk over the schema visits
//! tables in lexicographic order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub columns: Vec<String>,
    /// Local column name -> referenced table name.
    #[serde(default)]
    pub foreign_keys: BTreeMap<String, String>,
}

impl TableSpec {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            foreign_keys: BTreeMap::new(),
        }
    }

    pub fn with_foreign_key(mut self, column: &str, table: &str) -> Self {
        self.foreign_keys
            .insert(column.to_string(), table.to_string());
        self
    }

    pub fn referenced_tables(&self) -> impl Iterator<Item = &str> {
        self.foreign_keys.values().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    tables: BTreeMap<String, TableSpec>,
}

impl Schema {
    pub fn new(tables: BTreeMap<String, TableSpec>) -> Self {
        Self { tables }
    }

    pub fn with_table(mut self, name: &str, spec: TableSpec) -> Self {
        self.tables.insert(name.to_string(), spec);
        self
    }

    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.get(name)
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableSpec)> {
        self.tables.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Context containing every table, used when relevance resolution finds nothing.
    pub fn full_context(&self) -> RelevantSchemaContext {
        RelevantSchemaContext {
            tables: self.tables.clone(),
        }
    }
}

/// Subset of the schema relevant to a single prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RelevantSchemaContext {
    tables: BTreeMap<String, TableSpec>,
}

impl RelevantSchemaContext {
    /// Pairs each name with its `TableSpec`; names absent from the schema are skipped.
    pub fn from_table_names<'a, I>(schema: &Schema, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let tables = names
            .into_iter()
            .filter_map(|name| {
                schema
                    .table(name)
                    .map(|spec| (name.to_string(), spec.clone()))
            })
            .collect();
        Self { tables }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.tables.keys().map(String::as_str).collect()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.tables).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_schema_file_format() {
        let raw = r#"{
            "vessels": {
                "columns": ["ID", "NAME", "ASSIGNEDCRADLE"],
                "foreign_keys": { "ASSIGNEDCRADLE": "cradles" }
            },
            "cradles": { "columns": ["ID", "STATUS"] }
        }"#;

        let schema: Schema = serde_json::from_str(raw).unwrap();
        assert_eq!(schema.len(), 2);

        let vessels = schema.table("vessels").unwrap();
        assert_eq!(vessels.columns, vec!["ID", "NAME", "ASSIGNEDCRADLE"]);
        assert_eq!(
            vessels.referenced_tables().collect::<Vec<_>>(),
            vec!["cradles"]
        );

        // foreign_keys is optional
        assert!(schema.table("cradles").unwrap().foreign_keys.is_empty());
    }

    #[test]
    fn test_tables_iterate_in_name_order() {
        let schema = Schema::default()
            .with_table("vessels", TableSpec::new(&["ID"]))
            .with_table("assets", TableSpec::new(&["ID"]))
            .with_table("cradles", TableSpec::new(&["ID"]));

        let names: Vec<&str> = schema.tables().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["assets", "cradles", "vessels"]);
    }

    #[test]
    fn test_context_skips_unknown_tables() {
        let schema = Schema::default().with_table("cradles", TableSpec::new(&["ID"]));
        let context = RelevantSchemaContext::from_table_names(&schema, ["cradles", "ghosts"]);

        assert_eq!(context.table_names(), vec!["cradles"]);
        assert!(!context.contains("ghosts"));
    }

    #[test]
    fn test_context_json_matches_schema_layout() {
        let schema = Schema::default().with_table(
            "vessels",
            TableSpec::new(&["NAME", "ASSIGNEDCRADLE"]).with_foreign_key("ASSIGNEDCRADLE", "cradles"),
        );
        let json: serde_json::Value = serde_json::from_str(&schema.full_context().to_json()).unwrap();

        assert_eq!(json["vessels"]["columns"][1], "ASSIGNEDCRADLE");
        assert_eq!(json["vessels"]["foreign_keys"]["ASSIGNEDCRADLE"], "cradles");
    }
}
