//! Attribute expression syntax tree

use serde_json::Value;
use std::fmt::{self, Write};

/// Entity a path is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Root {
    Subject,
    Resource,
    Domain,
}

impl Root {
    /// Parse a root keyword
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "subject" => Some(Root::Subject),
            "resource" => Some(Root::Resource),
            "domain" => Some(Root::Domain),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Root::Subject => "subject",
            Root::Resource => "resource",
            Root::Domain => "domain",
        }
    }
}

/// Dotted attribute path such as `resource.owner.id`
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub root: Root,
    /// Attribute names below the root (never empty)
    pub segments: Vec<String>,
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Bool(bool),
}

impl Literal {
    /// Convert the literal into an attribute value for comparison
    pub fn to_value(&self) -> Value {
        match self {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Literal::Bool(b) => Value::Bool(*b),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Path(Path),
    Literal(Literal),
    Group(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Ge => ">=",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Lt => "<",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Bare operand, evaluated for truthiness
    Operand(Operand),
    Compare {
        left: Operand,
        op: CompareOp,
        right: Operand,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root.as_str())?;
        for segment in &self.segments {
            write!(f, ".{}", segment)?;
        }
        Ok(())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => {
                f.write_char('"')?;
                for c in s.chars() {
                    match c {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        '\t' => f.write_str("\\t")?,
                        '\r' => f.write_str("\\r")?,
                        other => f.write_char(other)?,
                    }
                }
                f.write_char('"')
            }
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Path(p) => write!(f, "{}", p),
            Operand::Literal(l) => write!(f, "{}", l),
            Operand::Group(e) => write!(f, "({})", e),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Operand(o) => write!(f, "{}", o),
            Expr::Compare { left, op, right } => write!(f, "{} {} {}", left, op.as_str(), right),
            Expr::Logical { op, left, right } => {
                let symbol = match op {
                    LogicalOp::And => "&&",
                    LogicalOp::Or => "||",
                };
                write!(f, "{} {} {}", left, symbol, right)
            }
        }
    }
}
