//! Shared caches of compiled sub-expressions and regex patterns.

use crate::config::EngineConfig;
use crate::expression::{CompiledExpression, ExpressionError, ExpressionResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use regex::{Regex, RegexBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Map holding at most `capacity` entries, even under concurrent inserts
struct Bounded<V> {
    map: DashMap<String, Arc<V>>,
    /// Slots taken, reserved before the insert that fills them
    used: AtomicUsize,
    capacity: usize,
}

impl<V> Bounded<V> {
    fn new(capacity: usize) -> Self {
        Self {
            map: DashMap::new(),
            used: AtomicUsize::new(0),
            capacity,
        }
    }

    fn get(&self, key: &str) -> Option<Arc<V>> {
        self.map.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Store `value` if a slot is free. Returns the value now cached under
    /// `key`, which is an earlier one when another thread got there first.
    fn insert(&self, key: &str, value: Arc<V>) -> (Arc<V>, bool) {
        let reserved = self
            .used
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .is_ok();
        if !reserved {
            return (self.get(key).unwrap_or(value), false);
        }

        match self.map.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                self.used.fetch_sub(1, Ordering::SeqCst);
                (Arc::clone(entry.get()), true)
            }
            Entry::Vacant(entry) => {
                entry.insert(Arc::clone(&value));
                (value, true)
            }
        }
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn clear(&self) {
        self.map.retain(|_, _| {
            self.used.fetch_sub(1, Ordering::SeqCst);
            false
        });
    }
}

/// Caches keyed by source text.
///
/// Entries are never evicted. Once a cache holds `capacity` entries, new
/// results are still returned but not stored.
pub struct Caches {
    expressions: Bounded<CompiledExpression>,
    patterns: Bounded<Regex>,
}

impl Caches {
    pub fn new(capacity: usize) -> Self {
        Self {
            expressions: Bounded::new(capacity),
            patterns: Bounded::new(capacity),
        }
    }

    /// Cached compilation of `source`, compiling with `compile` on a miss.
    ///
    /// Failed compilations are not cached.
    pub fn expression<F>(&self, source: &str, compile: F) -> ExpressionResult<Arc<CompiledExpression>>
    where
        F: FnOnce(&str) -> ExpressionResult<CompiledExpression>,
    {
        if let Some(compiled) = self.expressions.get(source) {
            return Ok(compiled);
        }

        let compiled = Arc::new(compile(source)?);
        let (compiled, stored) = self.expressions.insert(source, compiled);
        if !stored {
            log::debug!("expression cache full, not storing {:?}", source);
        }
        Ok(compiled)
    }

    /// Cached regular expression for `pattern`, bounded by the config's limits
    pub fn pattern(&self, pattern: &str, config: &EngineConfig) -> ExpressionResult<Arc<Regex>> {
        if let Some(regex) = self.patterns.get(pattern) {
            return Ok(regex);
        }

        if pattern.len() > config.max_pattern_length {
            return Err(ExpressionError::PatternError {
                pattern: pattern.to_string(),
                message: format!(
                    "pattern is {} bytes long, the limit is {}",
                    pattern.len(),
                    config.max_pattern_length
                ),
            });
        }

        let regex = RegexBuilder::new(pattern)
            .size_limit(config.regex_size_limit)
            .build()
            .map_err(|e| ExpressionError::PatternError {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
        let (regex, stored) = self.patterns.insert(pattern, Arc::new(regex));
        if stored {
            log::debug!("caching pattern {:?}", pattern);
        }
        Ok(regex)
    }

    pub fn expression_count(&self) -> usize {
        self.expressions.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn clear(&self) {
        self.expressions.clear();
        self.patterns.clear();
    }
}
