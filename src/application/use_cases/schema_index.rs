//! Lexical index over a schema for prompt-to-table matching.
//!
//! Every table name and every column name is expanded into its
//! {verbatim, singular, plural} variants and each variant points at the
//! owning table. Table and column variants are kept apart so the resolver
//! can score a prompt word against both independently.
//!
//! Collisions: when two tables (or a table's columns and another table's
//! columns) produce the same variant, the first one seen wins. Tables are
//! visited in name order and columns in declaration order, so the winner
//! is stable across runs and rebuilds.

use crate::application::use_cases::inflection::lexical_variants;
use crate::domain::schema::Schema;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct VariantEntry {
    pub variant: String,
    pub table: String,
}

#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    table_variants: Vec<VariantEntry>,
    column_variants: Vec<VariantEntry>,
}

impl LexicalIndex {
    /// Build the index. Pure function of `schema`.
    pub fn build(schema: &Schema) -> Self {
        let mut table_variants = Vec::new();
        let mut column_variants = Vec::new();
        let mut seen_tables = HashSet::new();
        let mut seen_columns = HashSet::new();

        for (table, spec) in schema.tables() {
            Self::insert_variants(table, table, &mut table_variants, &mut seen_tables);
            for column in &spec.columns {
                Self::insert_variants(column, table, &mut column_variants, &mut seen_columns);
            }
        }

        tracing::debug!(
            tables = schema.len(),
            table_variants = table_variants.len(),
            column_variants = column_variants.len(),
            "Built lexical index"
        );

        Self {
            table_variants,
            column_variants,
        }
    }

    fn insert_variants(
        word: &str,
        table: &str,
        entries: &mut Vec<VariantEntry>,
        seen: &mut HashSet<String>,
    ) {
        for variant in lexical_variants(word) {
            if seen.insert(variant.clone()) {
                entries.push(VariantEntry {
                    variant,
                    table: table.to_string(),
                });
            }
        }
    }

    pub fn table_variants(&self) -> &[VariantEntry] {
        &self.table_variants
    }

    pub fn column_variants(&self) -> &[VariantEntry] {
        &self.column_variants
    }

    pub fn table_for_table_variant(&self, variant: &str) -> Option<&str> {
        Self::lookup(&self.table_variants, variant)
    }

    pub fn table_for_column_variant(&self, variant: &str) -> Option<&str> {
        Self::lookup(&self.column_variants, variant)
    }

    fn lookup<'a>(entries: &'a [VariantEntry], variant: &str) -> Option<&'a str> {
        entries
            .iter()
            .find(|entry| entry.variant == variant)
            .map(|entry| entry.table.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::TableSpec;

    fn dock_schema() -> Schema {
        Schema::default()
            .with_table(
                "vessels",
                TableSpec::new(&["ID", "NAME", "ASSIGNEDCRADLE"])
                    .with_foreign_key("ASSIGNEDCRADLE", "cradles"),
            )
            .with_table("cradles", TableSpec::new(&["ID", "STATUS"]))
    }

    #[test]
    fn test_table_variants_include_singular_and_plural() {
        let index = LexicalIndex::build(&dock_schema());

        assert_eq!(index.table_for_table_variant("vessels"), Some("vessels"));
        assert_eq!(index.table_for_table_variant("vessel"), Some("vessels"));
        assert_eq!(index.table_for_table_variant("cradle"), Some("cradles"));
        assert_eq!(index.table_for_table_variant("status"), None);
    }

    #[test]
    fn test_column_variants_point_at_owning_table() {
        let index = LexicalIndex::build(&dock_schema());

        assert_eq!(index.table_for_column_variant("statuses"), Some("cradles"));
        assert_eq!(index.table_for_column_variant("assignedcradle"), Some("vessels"));
        assert_eq!(index.table_for_column_variant("names"), Some("vessels"));
    }

    #[test]
    fn test_colliding_column_variant_first_table_wins() {
        // Both tables declare ID; "cradles" sorts before "vessels".
        let index = LexicalIndex::build(&dock_schema());
        assert_eq!(index.table_for_column_variant("id"), Some("cradles"));

        let ids = index
            .column_variants()
            .iter()
            .filter(|entry| entry.variant == "id")
            .count();
        assert_eq!(ids, 1);
    }

    #[test]
    fn test_build_is_deterministic() {
        let first = LexicalIndex::build(&dock_schema());
        let second = LexicalIndex::build(&dock_schema());
        assert_eq!(first.table_variants(), second.table_variants());
        assert_eq!(first.column_variants(), second.column_variants());
    }

    #[test]
    fn test_empty_schema_has_empty_index() {
        let index = LexicalIndex::build(&Schema::default());
        assert!(index.table_variants().is_empty());
        assert!(index.column_variants().is_empty());
    }
}
