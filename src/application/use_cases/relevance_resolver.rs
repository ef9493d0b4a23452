//! Prompt -> relevant schema subset.
//!
//! Each prompt word is fuzzy-matched against table-name variants and,
//! independently, against column-name variants. Every table contributed by
//! an accepted match is kept (a word that hits a table and a column of a
//! different table adds both), then the set is closed over foreign keys so
//! the generator always sees the tables needed for joins.

use crate::application::use_cases::fuzzy::extract_one;
use crate::application::use_cases::schema_index::{LexicalIndex, VariantEntry};
use crate::domain::schema::{RelevantSchemaContext, Schema};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashSet};

static WORD_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

pub static STOP_WORDS: &[&str] = &[
    "is", "as", "list", "all", "get", "retrieve", "find", "to", "for", "on", "by", "in", "and",
    "of", "the", "from", "assigned",
];

pub const DEFAULT_MATCH_THRESHOLD: f64 = 60.0;

/// Which side of the index produced a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchSource {
    Table,
    Column,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenMatch {
    pub token: String,
    pub variant: String,
    pub table: String,
    pub score: f64,
    pub source: MatchSource,
}

pub struct RelevanceResolver {
    /// A candidate is accepted only when its score is strictly above this.
    threshold: f64,
}

impl Default for RelevanceResolver {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl RelevanceResolver {
    pub fn with_threshold(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Lowercased word tokens in prompt order, stop words removed.
    pub fn tokenize(prompt: &str) -> Vec<String> {
        let lowered = prompt.to_lowercase();
        WORD_PATTERN
            .find_iter(&lowered)
            .map(|m| m.as_str())
            .filter(|word| !STOP_WORDS.contains(word))
            .map(str::to_string)
            .collect()
    }

    fn best_match(
        &self,
        token: &str,
        entries: &[VariantEntry],
        source: MatchSource,
    ) -> Option<TokenMatch> {
        let (variant, score) = extract_one(token, entries.iter().map(|e| e.variant.as_str()))?;
        if score <= self.threshold {
            return None;
        }
        let entry = entries.iter().find(|e| e.variant == variant)?;
        Some(TokenMatch {
            token: token.to_string(),
            variant: entry.variant.clone(),
            table: entry.table.clone(),
            score,
            source,
        })
    }

    /// All accepted matches for the prompt, table match before column match per token.
    pub fn match_tokens(&self, prompt: &str, index: &LexicalIndex) -> Vec<TokenMatch> {
        let mut matches = Vec::new();
        for token in Self::tokenize(prompt) {
            if let Some(m) = self.best_match(&token, index.table_variants(), MatchSource::Table) {
                matches.push(m);
            }
            if let Some(m) = self.best_match(&token, index.column_variants(), MatchSource::Column)
            {
                matches.push(m);
            }
        }
        matches
    }

    /// Tables the prompt refers to directly, before foreign-key expansion.
    pub fn matched_tables(&self, prompt: &str, index: &LexicalIndex) -> BTreeSet<String> {
        self.match_tokens(prompt, index)
            .into_iter()
            .map(|m| m.table)
            .collect()
    }

    /// Resolve the prompt into the foreign-key-closed set of relevant tables.
    /// An empty result means nothing matched; choosing a fallback is up to the caller.
    pub fn resolve(
        &self,
        prompt: &str,
        schema: &Schema,
        index: &LexicalIndex,
    ) -> RelevantSchemaContext {
        let matches = self.match_tokens(prompt, index);
        for m in &matches {
            tracing::debug!(
                token = %m.token,
                variant = %m.variant,
                table = %m.table,
                score = m.score,
                source = ?m.source,
                "Prompt token matched schema"
            );
        }

        let matched: BTreeSet<String> = matches.into_iter().map(|m| m.table).collect();
        let closure = foreign_key_closure(schema, matched.iter().map(String::as_str));

        tracing::info!(
            matched = matched.len(),
            relevant = closure.len(),
            "Resolved relevant tables"
        );

        RelevantSchemaContext::from_table_names(schema, closure.iter().map(String::as_str))
    }
}

/// Every table reachable from `start` by following foreign keys, `start` included.
/// Uses an explicit worklist and visited set, so cycles terminate.
pub fn foreign_key_closure<'a, I>(schema: &Schema, start: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut visited: HashSet<String> = HashSet::new();
    let mut stack: Vec<String> = Vec::new();

    for table in start {
        if visited.insert(table.to_string()) {
            stack.push(table.to_string());
        }
    }

    while let Some(table) = stack.pop() {
        let Some(spec) = schema.table(&table) else {
            continue;
        };
        for referenced in spec.referenced_tables() {
            if !schema.contains_table(referenced) {
                tracing::warn!(
                    table = %table,
                    referenced = %referenced,
                    "Foreign key references a table missing from the schema"
                );
                continue;
            }
            if visited.insert(referenced.to_string()) {
                stack.push(referenced.to_string());
            }
        }
    }

    visited.into_iter().collect()
}
