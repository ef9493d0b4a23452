pub mod use_cases;

pub use use_cases::description::{DescriptionGenerator, LlmDescriber, PlaceholderDescriber};
pub use use_cases::nl_query::NlQueryUseCase;
pub use use_cases::query_generator::{LlmQueryGenerator, QueryGenerator};
