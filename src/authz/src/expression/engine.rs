//! Expression engine with parsed-expression caching

use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use super::ast::Expr;
use super::context::EvalContext;
use super::error::Result;
use super::eval::evaluate_expr;
use super::parser::ExpressionParser;

/// A parsed attribute expression
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

impl Expression {
    /// Parse an expression
    ///
    /// # Errors
    /// Returns a `MatcherError` for malformed syntax or an unknown path root
    pub fn parse(source: &str) -> Result<Self> {
        let root = ExpressionParser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            root,
        })
    }

    /// Original expression text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parsed syntax tree
    pub fn ast(&self) -> &Expr {
        &self.root
    }

    /// Evaluate against the given entities. Never fails.
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> bool {
        evaluate_expr(&self.root, ctx)
    }
}

impl fmt::Display for Expression {
    /// Normalised form of the expression; parses back to the same tree
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)
    }
}

/// Engine for compiling and evaluating attribute expressions
///
/// Compiled expressions are cached by source text, so rules that are
/// evaluated repeatedly are parsed once. The cache is a `DashMap`, so one
/// engine can be shared across threads.
#[derive(Debug, Default)]
pub struct ExpressionEngine {
    /// Compiled expression cache (thread-safe)
    cache: Arc<DashMap<String, Arc<Expression>>>,
}

impl ExpressionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile an expression and cache the result
    ///
    /// # Errors
    /// Returns error if the expression cannot be parsed. Failures are not cached.
    pub fn compile(&self, source: &str) -> Result<Arc<Expression>> {
        if let Some(expression) = self.cache.get(source) {
            return Ok(expression.clone());
        }

        let expression = Arc::new(Expression::parse(source)?);
        self.cache.insert(source.to_string(), expression.clone());

        Ok(expression)
    }

    /// Compile (or fetch from cache) and evaluate in one call
    pub fn evaluate_expression(&self, source: &str, ctx: &EvalContext<'_>) -> Result<bool> {
        let expression = self.compile(source)?;
        Ok(expression.evaluate(ctx))
    }

    /// Clear the compiled expression cache
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Number of cached expressions
    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
