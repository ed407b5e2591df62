//! `regexMatch(subject, pattern)` built-in.

use crate::expression::{ArgumentProblem, ExpressionError, ExpressionResult, Value, ValueKind};
use crate::function::{CallContext, Function};

/// Reports whether `subject` contains a match for the regular expression `pattern`
pub struct RegexMatch;

impl RegexMatch {
    pub const NAME: &'static str = "regexMatch";
}

impl Function for RegexMatch {
    fn call(&self, ctx: &CallContext<'_>, args: &[Value]) -> ExpressionResult<Value> {
        validate_string_args(Self::NAME, 2, args, &[0])?;

        let (subject, pattern) = match (&args[0], &args[1]) {
            (Value::String(subject), Value::String(pattern)) => (subject, pattern),
            // An absent subject never matches
            _ => return Ok(Value::Boolean(false)),
        };

        let regex = ctx.pattern(pattern)?;
        Ok(Value::Boolean(regex.is_match(subject)))
    }

    fn return_kind(&self) -> Option<ValueKind> {
        Some(ValueKind::Boolean)
    }
}

/// Check that exactly `expected` arguments were passed and all are strings.
///
/// Positions listed in `may_be_missing` also accept [`Value::Missing`].
pub fn validate_string_args(
    function: &str,
    expected: usize,
    args: &[Value],
    may_be_missing: &[usize],
) -> ExpressionResult<()> {
    if args.len() != expected {
        return Err(ExpressionError::invalid_argument(
            function,
            ArgumentProblem::Count {
                expected,
                actual: args.len(),
            },
        ));
    }

    for (position, arg) in args.iter().enumerate() {
        match arg {
            Value::String(_) => {}
            Value::Missing if may_be_missing.contains(&position) => {}
            other => {
                return Err(ExpressionError::invalid_argument(
                    function,
                    ArgumentProblem::NotAString {
                        position,
                        actual: other.kind(),
                    },
                ))
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::Caches;
    use crate::expression::eval::Environment;
    use crate::function::FunctionRegistry;

    fn call(args: &[Value]) -> (ExpressionResult<Value>, usize) {
        let registry = FunctionRegistry::builtin();
        let caches = Caches::new(16);
        let config = EngineConfig::default();
        let env = Environment::new(&registry, &caches, &config);
        let ctx = CallContext::new(env, 0, RegexMatch::NAME);
        let result = RegexMatch.call(&ctx, args);
        (result, caches.pattern_count())
    }

    const TAG_PATTERN: &str = "^JIRA:[A-Za-z]{3}[A-Za-z]*$";

    #[test]
    fn test_tag_patterns() {
        for (tag, expected) in [
            ("JIRA:EPLT", true),
            ("FOO:BAR", false),
            ("JIRA:TS", false),
            ("JIRA:TLA", true),
            ("JIRA:EP123", false),
            ("JIRA:EP12", false),
            ("EXTRA_STUFF kljalkj JIRA:EPLT EXTRA", false),
        ] {
            let (result, _) = call(&[Value::from(tag), Value::from(TAG_PATTERN)]);
            assert_eq!(result.unwrap(), Value::Boolean(expected), "tag {}", tag);
        }
    }

    #[test]
    fn test_unanchored_search() {
        let (result, _) = call(&[Value::from("xx JIRA:EPLT yy"), Value::from("JIRA:[A-Z]+")]);
        assert_eq!(result.unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_argument_count_is_validated_before_matching() {
        let (result, patterns) = call(&[Value::from("JIRA:EPLT")]);
        assert_eq!(
            result.unwrap_err(),
            ExpressionError::InvalidArgument {
                function: "regexMatch".to_string(),
                problem: ArgumentProblem::Count {
                    expected: 2,
                    actual: 1
                },
            }
        );
        assert_eq!(patterns, 0);

        let (result, patterns) = call(&[
            Value::from("JIRA:EPLT"),
            Value::from(TAG_PATTERN),
            Value::from("extra"),
        ]);
        assert!(matches!(
            result.unwrap_err(),
            ExpressionError::InvalidArgument {
                problem: ArgumentProblem::Count {
                    expected: 2,
                    actual: 3
                },
                ..
            }
        ));
        assert_eq!(patterns, 0);
    }

    #[test]
    fn test_argument_types_are_validated_before_matching() {
        let (result, patterns) = call(&[Value::from(12i64), Value::from(TAG_PATTERN)]);
        assert_eq!(
            result.unwrap_err(),
            ExpressionError::InvalidArgument {
                function: "regexMatch".to_string(),
                problem: ArgumentProblem::NotAString {
                    position: 0,
                    actual: ValueKind::Integer
                },
            }
        );
        assert_eq!(patterns, 0);

        let (result, patterns) = call(&[Value::from("JIRA:EPLT"), Value::Boolean(true)]);
        assert!(matches!(
            result.unwrap_err(),
            ExpressionError::InvalidArgument {
                problem: ArgumentProblem::NotAString { position: 1, .. },
                ..
            }
        ));
        assert_eq!(patterns, 0);

        // A missing pattern is still an error
        let (result, _) = call(&[Value::from("JIRA:EPLT"), Value::Missing]);
        assert!(matches!(
            result.unwrap_err(),
            ExpressionError::InvalidArgument {
                problem: ArgumentProblem::NotAString { position: 1, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_missing_subject_does_not_match() {
        let (result, patterns) = call(&[Value::Missing, Value::from(".*")]);
        assert_eq!(result.unwrap(), Value::Boolean(false));
        assert_eq!(patterns, 0);
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let (result, _) = call(&[Value::from("abc"), Value::from("([a-z]")]);
        assert!(matches!(
            result.unwrap_err(),
            ExpressionError::PatternError { ref pattern, .. } if pattern == "([a-z]"
        ));
    }
}
