//! Expression evaluation framework for rule matching.
//!
//! This module provides:
//! - Expression AST representation and dynamic values
//! - Static resolution of function names and result kinds
//! - Compiled, reusable expressions
//! - Expression evaluation against parameter mappings

pub mod compiled;
pub mod error;
pub mod eval;
pub mod expr;
pub mod operator;
pub mod resolver;
pub mod value;

pub use compiled::{CompiledExpression, Compiler};
pub use error::{ArgumentProblem, ErrorKind, ExpressionError, ExpressionResult};
pub use eval::{coerce_bool, Environment, ExpressionEvaluator};
pub use expr::{Expression, Literal};
pub use operator::{BinaryOperator, UnaryOperator};
pub use resolver::Resolver;
pub use value::{Value, ValueKind};
