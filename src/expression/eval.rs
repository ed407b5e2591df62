//! Expression evaluation implementation.

use crate::config::EngineConfig;
use crate::engine::Caches;
use crate::expression::{
    BinaryOperator, Expression, ExpressionError, ExpressionResult, UnaryOperator, Value,
};
use crate::function::{CallContext, FunctionRegistry};
use crate::record::ParameterMapping;
use std::cmp::Ordering;

/// Engine state an evaluation runs against
#[derive(Clone, Copy)]
pub struct Environment<'a> {
    pub registry: &'a FunctionRegistry,
    pub caches: &'a Caches,
    pub config: &'a EngineConfig,
}

impl<'a> Environment<'a> {
    pub fn new(
        registry: &'a FunctionRegistry,
        caches: &'a Caches,
        config: &'a EngineConfig,
    ) -> Self {
        Self {
            registry,
            caches,
            config,
        }
    }
}

/// Evaluator for expressions
pub struct ExpressionEvaluator<'a> {
    /// The field values to evaluate against
    params: &'a ParameterMapping,
    env: Environment<'a>,
    /// Function call nesting depth
    depth: usize,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Create a new top-level evaluator
    pub fn new(params: &'a ParameterMapping, env: Environment<'a>) -> Self {
        Self::nested(params, env, 0)
    }

    pub(crate) fn nested(params: &'a ParameterMapping, env: Environment<'a>, depth: usize) -> Self {
        Self { params, env, depth }
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExpressionResult<Value> {
        match expr {
            Expression::Literal(lit) => Ok(lit.value.clone()),

            Expression::Identifier(name) => Ok(self.params.lookup(name).clone()),

            Expression::BinaryOp { op, left, right } => self.evaluate_binary_op(*op, left, right),

            Expression::UnaryOp { op, operand } => {
                let operand_val = self.evaluate(operand)?;
                evaluate_unary_op(*op, operand_val)
            }

            Expression::FunctionCall { name, args } => self.evaluate_call(name, args),
        }
    }

    /// `&&` and `||` only evaluate the right side when the left does not decide
    fn evaluate_logical(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> ExpressionResult<Value> {
        let left_val = truthy(op, self.evaluate(left)?)?;

        match (op, left_val) {
            (BinaryOperator::And, false) => Ok(Value::Boolean(false)),
            (BinaryOperator::Or, true) => Ok(Value::Boolean(true)),
            _ => {
                let right_val = truthy(op, self.evaluate(right)?)?;
                Ok(Value::Boolean(right_val))
            }
        }
    }

    fn evaluate_call(&self, name: &str, args: &[Expression]) -> ExpressionResult<Value> {
        let function = self
            .env
            .registry
            .get(name)
            .ok_or_else(|| ExpressionError::UnknownFunction {
                name: name.to_string(),
            })?;

        let values = args
            .iter()
            .map(|arg| self.evaluate(arg))
            .collect::<ExpressionResult<Vec<_>>>()?;

        let ctx = CallContext::new(self.env, self.depth, name);
        function.call(&ctx, &values)
    }

    /// Evaluate a binary operation; only the logical operators decide
    /// whether the right side is evaluated
    fn evaluate_binary_op(
        &self,
        op: BinaryOperator,
        left: &Expression,
        right: &Expression,
    ) -> ExpressionResult<Value> {
        match op {
            BinaryOperator::And | BinaryOperator::Or => self.evaluate_logical(op, left, right),

            BinaryOperator::Add
            | BinaryOperator::Sub
            | BinaryOperator::Mul
            | BinaryOperator::Div
            | BinaryOperator::Mod => {
                evaluate_arithmetic(op, self.evaluate(left)?, self.evaluate(right)?)
            }

            BinaryOperator::Eq
            | BinaryOperator::Ne
            | BinaryOperator::Lt
            | BinaryOperator::Le
            | BinaryOperator::Gt
            | BinaryOperator::Ge => {
                compare_values(op, &self.evaluate(left)?, &self.evaluate(right)?)
            }

            BinaryOperator::RegexMatch | BinaryOperator::RegexNotMatch => {
                self.evaluate_regex(op, &self.evaluate(left)?, &self.evaluate(right)?)
            }
        }
    }

    fn evaluate_regex(
        &self,
        op: BinaryOperator,
        subject: &Value,
        pattern: &Value,
    ) -> ExpressionResult<Value> {
        let negate = op == BinaryOperator::RegexNotMatch;

        match (subject, pattern) {
            (Value::Missing, Value::String(_)) => Ok(Value::Boolean(negate)),
            (Value::String(subject), Value::String(pattern)) => {
                let regex = self.env.caches.pattern(pattern, self.env.config)?;
                Ok(Value::Boolean(regex.is_match(subject) != negate))
            }
            _ => Err(ExpressionError::type_mismatch(
                op.as_str(),
                subject.kind(),
                Some(pattern.kind()),
            )),
        }
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(op: UnaryOperator, operand: Value) -> ExpressionResult<Value> {
    match (op, operand) {
        (UnaryOperator::Not, Value::Boolean(b)) => Ok(Value::Boolean(!b)),
        (UnaryOperator::Not, Value::Missing) => Ok(Value::Boolean(true)),

        (UnaryOperator::Minus, Value::Missing) => Ok(Value::Missing),
        (UnaryOperator::Minus, Value::Integer(n)) => n
            .checked_neg()
            .map(Value::Integer)
            .ok_or_else(|| overflow(op.as_str())),
        (UnaryOperator::Minus, Value::Float(x)) => Ok(Value::Float(-x)),

        (op, operand) => Err(ExpressionError::type_mismatch(
            op.as_str(),
            operand.kind(),
            None,
        )),
    }
}

fn evaluate_arithmetic(op: BinaryOperator, left: Value, right: Value) -> ExpressionResult<Value> {
    match (&left, &right) {
        (Value::Missing, _) | (_, Value::Missing) => Ok(Value::Missing),

        (Value::Integer(a), Value::Integer(b)) => {
            let (a, b) = (*a, *b);
            let result = match op {
                BinaryOperator::Add => a.checked_add(b),
                BinaryOperator::Sub => a.checked_sub(b),
                BinaryOperator::Mul => a.checked_mul(b),
                BinaryOperator::Div if b == 0 => return Err(ExpressionError::DivisionByZero),
                BinaryOperator::Div => a.checked_div(b),
                BinaryOperator::Mod if b == 0 => return Err(ExpressionError::DivisionByZero),
                _ => a.checked_rem(b),
            };
            result
                .map(Value::Integer)
                .ok_or_else(|| overflow(op.as_str()))
        }

        (Value::String(a), Value::String(b)) if op == BinaryOperator::Add => {
            Ok(Value::String(format!("{}{}", a, b)))
        }

        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => {
                if matches!(op, BinaryOperator::Div | BinaryOperator::Mod)
                    && matches!(right, Value::Integer(0))
                {
                    return Err(ExpressionError::DivisionByZero);
                }
                let result = match op {
                    BinaryOperator::Add => a + b,
                    BinaryOperator::Sub => a - b,
                    BinaryOperator::Mul => a * b,
                    BinaryOperator::Div => a / b,
                    _ => a % b,
                };
                Ok(Value::Float(result))
            }
            _ => Err(ExpressionError::type_mismatch(
                op.as_str(),
                left.kind(),
                Some(right.kind()),
            )),
        },
    }
}

/// Compare two values
fn compare_values(op: BinaryOperator, left: &Value, right: &Value) -> ExpressionResult<Value> {
    let ordering = match (left, right) {
        (Value::Missing, _) | (_, Value::Missing) => {
            let both = left.is_missing() && right.is_missing();
            let result = match op {
                BinaryOperator::Eq => both,
                BinaryOperator::Ne => !both,
                _ => false,
            };
            return Ok(Value::Boolean(result));
        }
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Boolean(a), Value::Boolean(b))
            if matches!(op, BinaryOperator::Eq | BinaryOperator::Ne) =>
        {
            Some(a.cmp(b))
        }
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => {
                return Err(ExpressionError::type_mismatch(
                    op.as_str(),
                    left.kind(),
                    Some(right.kind()),
                ))
            }
        },
    };

    // NaN compares unequal to everything
    let result = match ordering {
        None => op == BinaryOperator::Ne,
        Some(ordering) => match op {
            BinaryOperator::Eq => ordering == Ordering::Equal,
            BinaryOperator::Ne => ordering != Ordering::Equal,
            BinaryOperator::Lt => ordering == Ordering::Less,
            BinaryOperator::Le => ordering != Ordering::Greater,
            BinaryOperator::Gt => ordering == Ordering::Greater,
            BinaryOperator::Ge => ordering != Ordering::Less,
            _ => false,
        },
    };
    Ok(Value::Boolean(result))
}

/// Operand of a logical operator; `Missing` is false
fn truthy(op: BinaryOperator, value: Value) -> ExpressionResult<bool> {
    match value {
        Value::Boolean(b) => Ok(b),
        Value::Missing => Ok(false),
        other => Err(ExpressionError::type_mismatch(
            op.as_str(),
            other.kind(),
            None,
        )),
    }
}

fn overflow(operator: &str) -> ExpressionError {
    ExpressionError::ArithmeticOverflow {
        operator: operator.to_string(),
    }
}

/// Coerce the result of a whole expression to a boolean.
///
/// `Missing` is false; any non-boolean is a type mismatch reported against
/// `source`.
pub fn coerce_bool(value: Value, source: &str) -> ExpressionResult<bool> {
    match value {
        Value::Boolean(b) => Ok(b),
        Value::Missing => Ok(false),
        other => Err(ExpressionError::type_mismatch(
            format!("condition '{}'", source),
            other.kind(),
            None,
        )),
    }
}
