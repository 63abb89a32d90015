pub mod date;
pub mod engine;
pub mod plan;
pub mod registry;
mod tokenize;

pub use date::word_to_date;
pub use engine::FilterEngine;
pub use plan::{FilterContext, FilterPlan, Predicate, SortOrder};
pub use registry::{Directive, FilterRegistry};
pub use tokenize::tokenize;
