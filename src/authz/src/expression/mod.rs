//! Attribute expression language for ABAC rules
//!
//! A rule subject such as `resource.author_id == subject.id` is parsed once,
//! cached, and evaluated against the subject, resource and optional domain of
//! each request. Evaluation never fails: unresolved attributes compare as
//! "absent" and simply fail to match.

pub mod ast;
pub mod context;
pub mod engine;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;

pub use context::EvalContext;
pub use engine::{Expression, ExpressionEngine};
pub use error::{MatcherError, Result};
pub use parser::ExpressionParser;
