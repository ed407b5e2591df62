//! Static checks run on a parsed expression before it is handed out.

use crate::expression::{Expression, ExpressionError, ExpressionResult, UnaryOperator, ValueKind};
use crate::function::FunctionRegistry;

/// Resolves function names and infers result kinds where they are known
pub struct Resolver<'a> {
    registry: &'a FunctionRegistry,
    /// Unregistered function names are rejected instead of deferred to evaluation
    strict: bool,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a FunctionRegistry, strict: bool) -> Self {
        Self { registry, strict }
    }

    /// Check an expression and return its result kind when it is statically known.
    ///
    /// Kinds are advisory. Operand kinds are only checked during evaluation,
    /// where short circuiting may skip an operand entirely.
    pub fn check(&self, expr: &Expression) -> ExpressionResult<Option<ValueKind>> {
        match expr {
            Expression::Literal(lit) => Ok(Some(lit.value.kind())),

            Expression::Identifier(_) => Ok(None),

            Expression::BinaryOp { op, left, right } => {
                let left_kind = self.check(left)?;
                let right_kind = self.check(right)?;

                if op.is_logical() {
                    return Ok(Some(ValueKind::Boolean));
                }

                match (left_kind, right_kind) {
                    (Some(lk), Some(rk)) => Ok(op.output_kind(lk, rk).or(op.dynamic_output_kind())),
                    _ => Ok(op.dynamic_output_kind()),
                }
            }

            Expression::UnaryOp { op, operand } => {
                let kind = self.check(operand)?;
                match op {
                    UnaryOperator::Not => Ok(Some(ValueKind::Boolean)),
                    UnaryOperator::Minus => Ok(kind.and_then(|k| op.output_kind(k))),
                }
            }

            Expression::FunctionCall { name, args } => {
                for arg in args {
                    self.check(arg)?;
                }

                match self.registry.get(name) {
                    Some(function) => Ok(function.return_kind()),
                    None if self.strict => {
                        Err(ExpressionError::UnknownFunction { name: name.clone() })
                    }
                    None => Ok(None),
                }
            }
        }
    }

    /// Check that an expression can be used as a condition.
    ///
    /// Unlike [`Resolver::check`] this rejects a statically known non-boolean
    /// result.
    pub fn check_predicate(&self, expr: &Expression) -> ExpressionResult<()> {
        match self.check(expr)? {
            Some(ValueKind::Boolean) | None => Ok(()),
            Some(other) => Err(ExpressionError::type_mismatch("condition", other, None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::ErrorKind;
    use crate::syntax::parse;

    fn check(source: &str, strict: bool) -> ExpressionResult<Option<ValueKind>> {
        let registry = FunctionRegistry::builtin();
        let expr = parse(source, 64).unwrap();
        Resolver::new(&registry, strict).check(&expr)
    }

    #[test]
    fn test_inferred_kinds() {
        assert_eq!(check("1 + 2", true).unwrap(), Some(ValueKind::Integer));
        assert_eq!(check("1 + 2.0", true).unwrap(), Some(ValueKind::Float));
        assert_eq!(check("ID + 2", true).unwrap(), None);
        assert_eq!(check("ID > 2", true).unwrap(), Some(ValueKind::Boolean));
        assert_eq!(check("!Enabled", true).unwrap(), Some(ValueKind::Boolean));
        assert_eq!(
            check("regexMatch(tag, 'x') && any('ID > 1', Tags)", true).unwrap(),
            Some(ValueKind::Boolean)
        );
    }

    #[test]
    fn test_operand_kinds_are_not_rejected() {
        // Mismatched operands surface at evaluation, if they are reached at all
        assert_eq!(check("'abc' > 1", true).unwrap(), Some(ValueKind::Boolean));
        assert_eq!(check("ID > 1 && 5", true).unwrap(), Some(ValueKind::Boolean));
        assert_eq!(
            check("false && 'a' > 1", true).unwrap(),
            Some(ValueKind::Boolean)
        );
        assert_eq!(check("!'x'", true).unwrap(), Some(ValueKind::Boolean));
        assert_eq!(check("-true", true).unwrap(), None);
        assert_eq!(check("'a' - 1", true).unwrap(), None);
    }

    #[test]
    fn test_function_resolution() {
        let err = check("lookup(ID) > 1", true).unwrap_err();
        assert_eq!(
            err,
            ExpressionError::UnknownFunction {
                name: "lookup".to_string()
            }
        );

        // Deferred to evaluation when not strict
        assert_eq!(check("lookup(ID) > 1", false).unwrap(), Some(ValueKind::Boolean));

        // Arguments are resolved too
        let err = check("regexMatch(lookup(ID), 'x')", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownFunction);
    }

    #[test]
    fn test_check_predicate() {
        let registry = FunctionRegistry::builtin();
        let resolver = Resolver::new(&registry, true);

        assert!(resolver.check_predicate(&parse("ID > 1", 64).unwrap()).is_ok());
        assert!(resolver.check_predicate(&parse("Enabled", 64).unwrap()).is_ok());

        let err = resolver
            .check_predicate(&parse("1 + 2", 64).unwrap())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }
}
