//! Expression AST definitions.

use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::expression::Value;
use std::collections::BTreeSet;

/// Literal value in an expression
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self { value }
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal constant value
    Literal(Literal),

    /// Field reference resolved against the parameter mapping
    Identifier(String),

    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Call of a registered function
    FunctionCall { name: String, args: Vec<Expression> },
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(Literal::new(value.into()))
    }

    /// Create a field reference expression
    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Identifier(name.into())
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// Create a function call expression
    pub fn call(name: impl Into<String>, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.into(),
            args,
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Or, left, right)
    }

    pub fn not_expr(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Not, operand)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    /// Names of all functions called anywhere in this expression
    pub fn function_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_function_names(&mut names);
        names
    }

    fn collect_function_names(&self, names: &mut BTreeSet<String>) {
        match self {
            Expression::Literal(_) | Expression::Identifier(_) => {}
            Expression::BinaryOp { left, right, .. } => {
                left.collect_function_names(names);
                right.collect_function_names(names);
            }
            Expression::UnaryOp { operand, .. } => operand.collect_function_names(names),
            Expression::FunctionCall { name, args } => {
                names.insert(name.clone());
                for arg in args {
                    arg.collect_function_names(names);
                }
            }
        }
    }

    /// Names of all fields referenced in this expression
    pub fn field_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_field_names(&mut names);
        names
    }

    fn collect_field_names(&self, names: &mut BTreeSet<String>) {
        match self {
            Expression::Literal(_) => {}
            Expression::Identifier(name) => {
                names.insert(name.clone());
            }
            Expression::BinaryOp { left, right, .. } => {
                left.collect_field_names(names);
                right.collect_field_names(names);
            }
            Expression::UnaryOp { operand, .. } => operand.collect_field_names(names),
            Expression::FunctionCall { args, .. } => {
                for arg in args {
                    arg.collect_field_names(names);
                }
            }
        }
    }
}
