//! The rule engine: compiles expressions and evaluates them against records.

pub mod cache;

pub use cache::Caches;

use crate::config::EngineConfig;
use crate::expression::eval::{coerce_bool, Environment, ExpressionEvaluator};
use crate::expression::{CompiledExpression, Compiler, ExpressionResult, Value};
use crate::function::{Function, FunctionRegistry};
use crate::record::{extract, ParameterMapping, Record};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// Handle to a rule engine.
///
/// Cloning is cheap and clones share the registry and caches. The engine can
/// be used from many threads at once.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    /// Replaced wholesale on registration so evaluations never hold the lock
    registry: RwLock<Arc<FunctionRegistry>>,
    caches: Caches,
    config: EngineConfig,
}

impl Engine {
    /// Create an engine with the built-in functions and default configuration
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_registry(FunctionRegistry::builtin(), config)
    }

    /// Create an engine over a prepared registry
    pub fn with_registry(registry: FunctionRegistry, config: EngineConfig) -> Self {
        log::debug!(
            "creating engine with functions {:?} and {:?}",
            registry.names(),
            config
        );
        Self {
            inner: Arc::new(EngineInner {
                registry: RwLock::new(Arc::new(registry)),
                caches: Caches::new(config.cache_capacity),
                config,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Snapshot of the current function registry
    pub fn registry(&self) -> Arc<FunctionRegistry> {
        Arc::clone(&self.inner.registry.read())
    }

    /// Register a function; fails if the name is already taken
    pub fn register(&self, name: &str, function: Arc<dyn Function>) -> ExpressionResult<()> {
        let mut registry = self.inner.registry.write();
        let mut updated = FunctionRegistry::clone(&registry);
        updated.register(name, function)?;
        *registry = Arc::new(updated);
        log::debug!("registered function {}", name);
        Ok(())
    }

    /// Register a host closure
    pub fn register_fn<F>(&self, name: &str, f: F) -> ExpressionResult<()>
    where
        F: Fn(&[Value]) -> ExpressionResult<Value> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(crate::function::HostFunction::new(f)))
    }

    /// Compile `source` against the current registry
    pub fn compile(&self, source: &str) -> ExpressionResult<CompiledExpression> {
        let registry = self.registry();
        Compiler::new(&registry, &self.inner.config).compile(source)
    }

    /// Compile `source` and require a result usable as a condition
    pub fn compile_predicate(&self, source: &str) -> ExpressionResult<CompiledExpression> {
        let registry = self.registry();
        Compiler::new(&registry, &self.inner.config).compile_predicate(source)
    }

    /// Evaluate a compiled expression against a parameter mapping
    pub fn evaluate(
        &self,
        compiled: &CompiledExpression,
        params: &ParameterMapping,
    ) -> ExpressionResult<Value> {
        let registry = self.registry();
        let env = Environment::new(&registry, &self.inner.caches, &self.inner.config);
        ExpressionEvaluator::new(params, env).evaluate(compiled.root())
    }

    /// Evaluate a compiled expression as a condition over a record
    pub fn evaluate_record<R: Record + ?Sized>(
        &self,
        compiled: &CompiledExpression,
        record: &R,
    ) -> ExpressionResult<bool> {
        let params = record.to_parameters()?;
        let value = self.evaluate(compiled, &params)?;
        coerce_bool(value, compiled.source())
    }

    /// Evaluate a compiled expression as a condition over any serializable value
    pub fn evaluate_serialize<T: Serialize + ?Sized>(
        &self,
        compiled: &CompiledExpression,
        value: &T,
    ) -> ExpressionResult<bool> {
        let params = extract(value)?;
        self.evaluate_record(compiled, &params)
    }

    pub fn cached_expressions(&self) -> usize {
        self.inner.caches.expression_count()
    }

    pub fn cached_patterns(&self) -> usize {
        self.inner.caches.pattern_count()
    }

    pub fn clear_caches(&self) {
        self.inner.caches.clear();
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::{ErrorKind, ExpressionError};
    use serde_json::json;
    use std::thread;

    #[test]
    fn test_compile_and_evaluate() {
        let engine = Engine::new();
        let compiled = engine.compile("ID > 1 && Key == 'checkout'").unwrap();

        let params = ParameterMapping::new().with("ID", 2).with("Key", "checkout");
        assert_eq!(
            engine.evaluate(&compiled, &params).unwrap(),
            Value::Boolean(true)
        );

        let record = json!({"ID": 1, "Key": "checkout"});
        assert!(!engine.evaluate_record(&compiled, &record).unwrap());
    }

    #[test]
    fn test_evaluate_record_requires_condition() {
        let engine = Engine::new();
        let compiled = engine.compile("ID + 1").unwrap();

        let err = engine
            .evaluate_record(&compiled, &json!({"ID": 1}))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);

        assert!(!engine
            .evaluate_record(&engine.compile("Enabled").unwrap(), &json!({}))
            .unwrap());
    }

    #[test]
    fn test_unreached_operand_kinds_compile() {
        let engine = Engine::new();

        let compiled = engine.compile("false && 'a' > 1").unwrap();
        assert!(!engine.evaluate_record(&compiled, &json!({})).unwrap());

        let compiled = engine.compile("Enabled || ID + 'x'").unwrap();
        assert!(engine
            .evaluate_record(&compiled, &json!({"Enabled": true}))
            .unwrap());

        let compiled = engine.compile("true && 'a' > 1").unwrap();
        let err = engine.evaluate_record(&compiled, &json!({})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_register_after_compile() {
        let engine = Engine::new();

        let err = engine.compile("double(ID) == 4").unwrap_err();
        assert_eq!(
            err,
            ExpressionError::UnknownFunction {
                name: "double".to_string()
            }
        );

        engine
            .register_fn("double", |args| match args {
                [Value::Integer(n)] => Ok(Value::Integer(n * 2)),
                _ => Ok(Value::Missing),
            })
            .unwrap();

        let compiled = engine.compile("double(ID) == 4").unwrap();
        assert!(engine
            .evaluate_record(&compiled, &ParameterMapping::new().with("ID", 2))
            .unwrap());

        let err = engine.register_fn("double", |_| Ok(Value::Missing)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateFunction);

        // Clones share the registry
        let clone = engine.clone();
        assert!(clone.registry().contains("double"));
    }

    #[test]
    fn test_lenient_engine_fails_at_evaluation() {
        let engine = Engine::with_config(EngineConfig {
            strict_functions: false,
            ..EngineConfig::default()
        });

        let compiled = engine.compile("later(ID)").unwrap();
        let err = engine
            .evaluate(&compiled, &ParameterMapping::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownFunction);

        engine.register_fn("later", |_| Ok(Value::Boolean(true))).unwrap();
        assert_eq!(
            engine.evaluate(&compiled, &ParameterMapping::new()).unwrap(),
            Value::Boolean(true)
        );
    }

    #[test]
    fn test_subexpressions_are_cached() {
        let engine = Engine::new();
        let compiled = engine
            .compile(r#"any("regexMatch(Value, '^JIRA:')", Tags)"#)
            .unwrap();
        let record = json!({"Tags": [{"Value": "FOO:BAR"}, {"Value": "JIRA:TS"}]});

        assert!(engine.evaluate_record(&compiled, &record).unwrap());
        assert!(engine.evaluate_record(&compiled, &record).unwrap());
        assert_eq!(engine.cached_expressions(), 1);
        assert_eq!(engine.cached_patterns(), 1);

        engine.clear_caches();
        assert_eq!(engine.cached_expressions(), 0);
    }

    #[test]
    fn test_nested_quantifier_depth_limit() {
        let engine = Engine::with_config(EngineConfig {
            max_depth: 2,
            ..EngineConfig::default()
        });
        // Each level evaluates its own Rule field against its Items
        let compiled = engine.compile("any(Rule, Items)").unwrap();
        let nested = |levels: usize| {
            let mut record = json!({"Rule": "true"});
            for _ in 0..levels {
                record = json!({"Rule": "any(Rule, Items)", "Items": [record]});
            }
            record
        };

        assert!(!engine.evaluate_record(&compiled, &nested(2)).unwrap());

        let err = engine.evaluate_record(&compiled, &nested(3)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecursionLimit);
        assert_eq!(err.root_cause(), &ExpressionError::RecursionLimit { limit: 2 });
    }

    #[test]
    fn test_concurrent_evaluation() {
        let engine = Engine::new();
        let compiled = engine
            .compile(r#"any("regexMatch(Value, '^JIRA:[A-Za-z]{3}[A-Za-z]*$')", Tags)"#)
            .unwrap();

        let matching = json!({"Tags": [{"Value": "FOO:BAR"}, {"Value": "JIRA:EPLT"}]});
        let other = json!({"Tags": [{"Value": "JIRA:TS"}]});

        thread::scope(|s| {
            for i in 0..8 {
                let engine = engine.clone();
                let compiled = &compiled;
                let (record, expected) = if i % 2 == 0 {
                    (&matching, true)
                } else {
                    (&other, false)
                };
                s.spawn(move || {
                    for _ in 0..100 {
                        assert_eq!(engine.evaluate_record(compiled, record).unwrap(), expected);
                    }
                });
            }
        });
    }
}
