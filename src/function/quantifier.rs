//! `any` / `all` quantifiers over sequences of records.

use crate::expression::{
    ArgumentProblem, CompiledExpression, ExpressionError, ExpressionResult, Value, ValueKind,
};
use crate::function::{CallContext, Function};
use std::sync::Arc;

/// Evaluates a sub-expression against each element of a sequence.
///
/// The signature is position-fixed: `(subExpression: string, elements: sequence)`.
/// The sub-expression is compiled on first use, so an empty sequence never
/// compiles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    /// True on the first element that satisfies the sub-expression
    Any,
    /// False on the first element that does not satisfy the sub-expression
    All,
}

impl Quantifier {
    pub fn name(&self) -> &'static str {
        match self {
            Quantifier::Any => "any",
            Quantifier::All => "all",
        }
    }

    /// Element result that ends the scan early
    fn decisive(&self) -> bool {
        matches!(self, Quantifier::Any)
    }
}

impl Function for Quantifier {
    fn call(&self, ctx: &CallContext<'_>, args: &[Value]) -> ExpressionResult<Value> {
        let name = self.name();

        if args.len() != 2 {
            return Err(ExpressionError::invalid_argument(
                name,
                ArgumentProblem::Count {
                    expected: 2,
                    actual: args.len(),
                },
            ));
        }

        let source = match &args[0] {
            Value::String(source) => source,
            other => {
                return Err(ExpressionError::invalid_argument(
                    name,
                    ArgumentProblem::NotAString {
                        position: 0,
                        actual: other.kind(),
                    },
                ))
            }
        };

        let elements: &[Value] = match &args[1] {
            Value::List(elements) => elements,
            Value::Missing => &[],
            other => {
                return Err(ExpressionError::invalid_argument(
                    name,
                    ArgumentProblem::NotASequence {
                        position: 1,
                        actual: other.kind(),
                    },
                ))
            }
        };

        let mut compiled: Option<Arc<CompiledExpression>> = None;

        for (index, element) in elements.iter().enumerate() {
            let params = element.as_record().ok_or_else(|| {
                ExpressionError::invalid_argument(
                    name,
                    ArgumentProblem::NotARecord {
                        index,
                        actual: element.kind(),
                    },
                )
            })?;

            let expr = match compiled.as_ref() {
                Some(expr) => Arc::clone(expr),
                None => {
                    let expr = ctx.compile(source)?;
                    compiled = Some(Arc::clone(&expr));
                    expr
                }
            };

            let satisfied = ctx
                .evaluate_bool(&expr, params)
                .map_err(|e| ExpressionError::in_element(name, index, e))?;
            log::trace!("{}: element {} -> {}", name, index, satisfied);

            if satisfied == self.decisive() {
                return Ok(Value::Boolean(self.decisive()));
            }
        }

        Ok(Value::Boolean(!self.decisive()))
    }

    fn return_kind(&self) -> Option<ValueKind> {
        Some(ValueKind::Boolean)
    }
}
