//! Compiled, reusable expressions.

use crate::config::EngineConfig;
use crate::expression::{Expression, ExpressionResult, Resolver, ValueKind};
use crate::function::FunctionRegistry;
use crate::syntax::parse;
use std::collections::BTreeSet;
use std::fmt;

/// A parsed and resolved expression.
///
/// Immutable once built; evaluating it never changes it, so one instance can
/// be shared across threads and evaluated against any number of records.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: String,
    root: Expression,
    functions: BTreeSet<String>,
    result_kind: Option<ValueKind>,
}

impl CompiledExpression {
    /// Source text this expression was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expression {
        &self.root
    }

    /// Names of every function the expression calls
    pub fn functions(&self) -> &BTreeSet<String> {
        &self.functions
    }

    /// Names of the fields the expression reads (sub-expression strings excluded)
    pub fn fields(&self) -> BTreeSet<String> {
        self.root.field_names()
    }

    /// Result kind when it is known without evaluating
    pub fn result_kind(&self) -> Option<ValueKind> {
        self.result_kind
    }
}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

/// Turns source text into [`CompiledExpression`]s
pub struct Compiler<'a> {
    registry: &'a FunctionRegistry,
    config: &'a EngineConfig,
}

impl<'a> Compiler<'a> {
    pub fn new(registry: &'a FunctionRegistry, config: &'a EngineConfig) -> Self {
        Self { registry, config }
    }

    /// Parse and resolve `source`. Nothing is evaluated.
    pub fn compile(&self, source: &str) -> ExpressionResult<CompiledExpression> {
        let root = parse(source, self.config.max_depth)?;
        let result_kind =
            Resolver::new(self.registry, self.config.strict_functions).check(&root)?;
        let functions = root.function_names();

        log::debug!(
            "compiled expression {:?} (functions: {:?}, result: {:?})",
            source,
            functions,
            result_kind
        );

        Ok(CompiledExpression {
            source: source.to_string(),
            root,
            functions,
            result_kind,
        })
    }

    /// Compile `source` and require it to be usable as a condition
    pub fn compile_predicate(&self, source: &str) -> ExpressionResult<CompiledExpression> {
        let compiled = self.compile(source)?;
        Resolver::new(self.registry, self.config.strict_functions)
            .check_predicate(compiled.root())?;
        Ok(compiled)
    }
}
