pub mod config;
pub mod engine;
pub mod expression;
pub mod function;
pub mod record;
pub mod syntax;

pub use config::EngineConfig;
pub use engine::Engine;
pub use expression::{CompiledExpression, ErrorKind, ExpressionError, ExpressionResult, Value};
pub use record::{extract, ParameterMapping, Record};
