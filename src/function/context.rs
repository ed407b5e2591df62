//! Context handed to functions while they run.

use crate::expression::eval::{coerce_bool, Environment, ExpressionEvaluator};
use crate::expression::{CompiledExpression, Compiler, ExpressionError, ExpressionResult, Value};
use crate::function::FunctionRegistry;
use crate::record::ParameterMapping;
use regex::Regex;
use std::sync::Arc;

/// Gives a running function access to the engine that called it, so it can
/// compile and evaluate sub-expressions or reuse compiled patterns.
pub struct CallContext<'a> {
    env: Environment<'a>,
    depth: usize,
    function: &'a str,
}

impl<'a> CallContext<'a> {
    pub(crate) fn new(env: Environment<'a>, depth: usize, function: &'a str) -> Self {
        Self {
            env,
            depth,
            function,
        }
    }

    /// Name the function was invoked under
    pub fn function_name(&self) -> &str {
        self.function
    }

    /// Call nesting depth of this invocation (0 for a top-level call)
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn registry(&self) -> &FunctionRegistry {
        self.env.registry
    }

    /// Compile a sub-expression, reusing the engine's cache
    pub fn compile(&self, source: &str) -> ExpressionResult<Arc<CompiledExpression>> {
        let compiler = Compiler::new(self.env.registry, self.env.config);
        self.env
            .caches
            .expression(source, |source| compiler.compile(source))
    }

    /// Evaluate a compiled sub-expression one call level deeper
    pub fn evaluate(
        &self,
        compiled: &CompiledExpression,
        params: &ParameterMapping,
    ) -> ExpressionResult<Value> {
        let depth = self.depth + 1;
        if depth > self.env.config.max_depth {
            return Err(ExpressionError::RecursionLimit {
                limit: self.env.config.max_depth,
            });
        }
        ExpressionEvaluator::nested(params, self.env, depth).evaluate(compiled.root())
    }

    /// Evaluate a compiled sub-expression and coerce the result to a boolean
    pub fn evaluate_bool(
        &self,
        compiled: &CompiledExpression,
        params: &ParameterMapping,
    ) -> ExpressionResult<bool> {
        let value = self.evaluate(compiled, params)?;
        coerce_bool(value, compiled.source())
    }

    /// Compiled regular expression for `pattern`
    pub fn pattern(&self, pattern: &str) -> ExpressionResult<Arc<Regex>> {
        self.env.caches.pattern(pattern, self.env.config)
    }
}
