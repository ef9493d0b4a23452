pub mod decode;
pub mod executor;

pub use executor::{DbExecutorConfig, QueryExecutor, SqlxQueryExecutor};
