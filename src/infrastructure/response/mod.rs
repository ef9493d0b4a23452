use once_cell::sync::Lazy;
use regex::Regex;

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

static REASONING_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<reasoning>[\s\S]*?</reasoning>").unwrap());

static CODE_FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```[A-Za-z]*\s*([\s\S]*?)\s*```").unwrap());

static SQL_LABEL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*sql\s*:\s*").unwrap());

static MULTIPLE_NEWLINES_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Cleans LLM response by removing reasoning artifacts.
pub fn clean_llm_response(response: &str) -> String {
    let mut cleaned = THINK_TAG_PATTERN.replace_all(response, "").to_string();
    cleaned = REASONING_TAG_PATTERN.replace_all(&cleaned, "").to_string();
    cleaned = cleaned.trim().to_string();

    MULTIPLE_NEWLINES_PATTERN
        .replace_all(&cleaned, "\n\n")
        .to_string()
}

/// Pulls the SQL statement out of a model response.
/// Chat models like to wrap it in a Markdown fence or prefix it with `SQL:`.
pub fn extract_sql(response: &str) -> String {
    let cleaned = clean_llm_response(response);

    let body = match CODE_FENCE_PATTERN.captures(&cleaned) {
        Some(caps) => caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
        None => cleaned,
    };

    SQL_LABEL_PATTERN.replace(&body, "").trim().to_string()
}

/// Drops a single trailing `;` so drivers that reject terminators accept the statement.
pub fn strip_statement_terminator(sql: &str) -> &str {
    let trimmed = sql.trim();
    trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end()
}
