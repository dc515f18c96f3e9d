//! Template-driven synthetic record generation.
//!
//! A JSON template is walked once per record; string leaves are evaluated as
//! small function expressions (`int(1,10)`, `date(...)`, `seq()`, ...) and the
//! results are serialized as JSON lines or CSV.

pub mod args;
pub mod calendar;
pub mod engine;
pub mod errors;
pub mod expression;
pub mod functions;
pub mod model;
pub mod output;
pub mod pattern;
pub mod random;
pub mod state;
pub mod template;
pub mod value;
pub mod walker;

pub use engine::{GenerationEngine, GenerationResult, generate};
pub use errors::GenerationError;
pub use functions::{EvalContext, evaluate};
pub use model::{GenerateOptions, GenerationReport};
pub use state::GeneratorState;
pub use template::Template;
pub use value::GeneratedValue;
