//! Operator definitions for expressions.

use crate::expression::ValueKind;

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Pattern matching
    RegexMatch,
    RegexNotMatch,

    // Logical
    And,
    Or,
}

impl BinaryOperator {
    /// Get the output kind of this operator given statically known operand kinds.
    ///
    /// Returns `None` when the pairing can never evaluate successfully.
    pub fn output_kind(&self, left: ValueKind, right: ValueKind) -> Option<ValueKind> {
        use ValueKind::*;

        match self {
            BinaryOperator::Add => match (left, right) {
                (String, String) => Some(String),
                _ => numeric_output(left, right),
            },

            BinaryOperator::Sub | BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => {
                numeric_output(left, right)
            }

            BinaryOperator::Eq | BinaryOperator::Ne => match (left, right) {
                (Boolean, Boolean) | (String, String) => Some(Boolean),
                _ => numeric_output(left, right).map(|_| Boolean),
            },

            BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge => {
                match (left, right) {
                    (String, String) => Some(Boolean),
                    _ => numeric_output(left, right).map(|_| Boolean),
                }
            }

            BinaryOperator::RegexMatch | BinaryOperator::RegexNotMatch => match (left, right) {
                (String, String) => Some(Boolean),
                _ => None,
            },

            BinaryOperator::And | BinaryOperator::Or => match (left, right) {
                (Boolean, Boolean) => Some(Boolean),
                _ => None,
            },
        }
    }

    /// Output kind when at least one operand kind is only known at runtime
    pub fn dynamic_output_kind(&self) -> Option<ValueKind> {
        if self.is_arithmetic() {
            None
        } else {
            Some(ValueKind::Boolean)
        }
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Sub
                | BinaryOperator::Mul
                | BinaryOperator::Div
                | BinaryOperator::Mod
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::RegexMatch => "=~",
            BinaryOperator::RegexNotMatch => "!~",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }
}

fn numeric_output(left: ValueKind, right: ValueKind) -> Option<ValueKind> {
    match (left, right) {
        (ValueKind::Integer, ValueKind::Integer) => Some(ValueKind::Integer),
        (ValueKind::Integer | ValueKind::Float, ValueKind::Integer | ValueKind::Float) => {
            Some(ValueKind::Float)
        }
        _ => None,
    }
}

/// Unary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Not,
    Minus,
}

impl UnaryOperator {
    /// Get the output kind of this operator given the operand kind
    pub fn output_kind(&self, operand: ValueKind) -> Option<ValueKind> {
        match self {
            UnaryOperator::Not => match operand {
                ValueKind::Boolean => Some(ValueKind::Boolean),
                _ => None,
            },

            UnaryOperator::Minus => match operand {
                ValueKind::Integer => Some(ValueKind::Integer),
                ValueKind::Float => Some(ValueKind::Float),
                _ => None,
            },
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Minus => "-",
        }
    }
}
