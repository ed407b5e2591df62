//! Error types for expression compilation and evaluation.

use crate::expression::ValueKind;
use std::fmt;
use thiserror::Error;

/// What was wrong with the arguments passed to a function
#[derive(Debug, Clone, PartialEq)]
pub enum ArgumentProblem {
    /// Wrong number of arguments
    Count { expected: usize, actual: usize },

    /// Argument at `position` had to be a string
    NotAString { position: usize, actual: ValueKind },

    /// Argument at `position` had to be a sequence
    NotASequence { position: usize, actual: ValueKind },

    /// Sequence element at `index` was not record-shaped
    NotARecord { index: usize, actual: ValueKind },

    /// Free-form reason, for host-registered functions
    Other(String),
}

impl fmt::Display for ArgumentProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentProblem::Count { expected, actual } => {
                write!(f, "expected {} arguments, but got {}", expected, actual)
            }
            ArgumentProblem::NotAString { position, actual } => {
                write!(f, "argument {} must be a string, got {}", position, actual)
            }
            ArgumentProblem::NotASequence { position, actual } => {
                write!(f, "argument {} must be a sequence, got {}", position, actual)
            }
            ArgumentProblem::NotARecord { index, actual } => {
                write!(f, "element {} must be a record, got {}", index, actual)
            }
            ArgumentProblem::Other(reason) => write!(f, "{}", reason),
        }
    }
}

/// Coarse classification of an [`ExpressionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    UnknownFunction,
    InvalidArgument,
    TypeMismatch,
    UnsupportedRecordShape,
    PatternError,
    DuplicateFunction,
    Arithmetic,
    RecursionLimit,
}

/// Errors that can occur while compiling or evaluating expressions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },

    #[error("{function}: {problem}")]
    InvalidArgument {
        function: String,
        problem: ArgumentProblem,
    },

    #[error("Type mismatch in {operation}: {}", describe_operands(.left, .right))]
    TypeMismatch {
        operation: String,
        left: ValueKind,
        right: Option<ValueKind>,
    },

    #[error("Unsupported record shape at field '{field}': {reason}")]
    UnsupportedRecordShape { field: String, reason: String },

    #[error("Invalid pattern '{pattern}': {message}")]
    PatternError { pattern: String, message: String },

    #[error("Function already registered: {name}")]
    DuplicateFunction { name: String },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Integer overflow in operator {operator}")]
    ArithmeticOverflow { operator: String },

    #[error("Nesting depth limit of {limit} exceeded")]
    RecursionLimit { limit: usize },

    #[error("{function}: element {index}: {source}")]
    InElement {
        function: String,
        index: usize,
        source: Box<ExpressionError>,
    },
}

fn describe_operands(left: &ValueKind, right: &Option<ValueKind>) -> String {
    match right {
        Some(right) => format!("left={}, right={}", left, right),
        None => format!("operand={}", left),
    }
}

impl ExpressionError {
    /// Kind of this error; element annotations report the kind of the underlying error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExpressionError::Syntax { .. } => ErrorKind::Syntax,
            ExpressionError::UnknownFunction { .. } => ErrorKind::UnknownFunction,
            ExpressionError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            ExpressionError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            ExpressionError::UnsupportedRecordShape { .. } => ErrorKind::UnsupportedRecordShape,
            ExpressionError::PatternError { .. } => ErrorKind::PatternError,
            ExpressionError::DuplicateFunction { .. } => ErrorKind::DuplicateFunction,
            ExpressionError::DivisionByZero | ExpressionError::ArithmeticOverflow { .. } => {
                ErrorKind::Arithmetic
            }
            ExpressionError::RecursionLimit { .. } => ErrorKind::RecursionLimit,
            ExpressionError::InElement { source, .. } => source.kind(),
        }
    }

    /// Innermost error once element annotations are stripped
    pub fn root_cause(&self) -> &ExpressionError {
        match self {
            ExpressionError::InElement { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn invalid_argument(function: &str, problem: ArgumentProblem) -> Self {
        ExpressionError::InvalidArgument {
            function: function.to_string(),
            problem,
        }
    }

    pub(crate) fn type_mismatch(
        operation: impl Into<String>,
        left: ValueKind,
        right: Option<ValueKind>,
    ) -> Self {
        ExpressionError::TypeMismatch {
            operation: operation.into(),
            left,
            right,
        }
    }

    pub(crate) fn in_element(function: &str, index: usize, source: ExpressionError) -> Self {
        ExpressionError::InElement {
            function: function.to_string(),
            index,
            source: Box::new(source),
        }
    }
}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
