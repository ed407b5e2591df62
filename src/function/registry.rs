//! Named function registry.

use crate::expression::{ExpressionError, ExpressionResult, Value, ValueKind};
use crate::function::quantifier::Quantifier;
use crate::function::regex_match::RegexMatch;
use crate::function::CallContext;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A callable that expressions can invoke by name
pub trait Function: Send + Sync {
    fn call(&self, ctx: &CallContext<'_>, args: &[Value]) -> ExpressionResult<Value>;

    /// Kind of value this function always returns, if fixed
    fn return_kind(&self) -> Option<ValueKind> {
        None
    }
}

/// Adapter for host closures that only need their arguments
pub struct HostFunction<F> {
    f: F,
}

impl<F> HostFunction<F>
where
    F: Fn(&[Value]) -> ExpressionResult<Value> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Function for HostFunction<F>
where
    F: Fn(&[Value]) -> ExpressionResult<Value> + Send + Sync,
{
    fn call(&self, _ctx: &CallContext<'_>, args: &[Value]) -> ExpressionResult<Value> {
        (self.f)(args)
    }
}

/// Mapping from function name to callable
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with `regexMatch`, `any` and `all`
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .functions
            .insert(RegexMatch::NAME.to_string(), Arc::new(RegexMatch));
        for quantifier in [Quantifier::Any, Quantifier::All] {
            registry
                .functions
                .insert(quantifier.name().to_string(), Arc::new(quantifier));
        }
        registry
    }

    /// Register a function under a name that is not yet taken
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: Arc<dyn Function>,
    ) -> ExpressionResult<()> {
        let name = name.into();
        if self.functions.contains_key(&name) {
            return Err(ExpressionError::DuplicateFunction { name });
        }
        self.functions.insert(name, function);
        Ok(())
    }

    /// Register a host closure
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> ExpressionResult<()>
    where
        F: Fn(&[Value]) -> ExpressionResult<Value> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(HostFunction::new(f)))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}
