pub mod description;
pub mod fuzzy;
pub mod inflection;
pub mod nl_query;
pub mod query_generator;
pub mod relevance_resolver;
pub mod render_classifier;
pub mod schema_index;
pub mod value_formatter;
