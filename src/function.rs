//! Functions callable from expressions.
//!
//! Built-ins are `regexMatch` and the `any`/`all` quantifiers; hosts add their
//! own through [`FunctionRegistry::register`].

pub mod context;
pub mod quantifier;
pub mod regex_match;
pub mod registry;

pub use context::CallContext;
pub use quantifier::Quantifier;
pub use regex_match::{validate_string_args, RegexMatch};
pub use registry::{Function, FunctionRegistry, HostFunction};
