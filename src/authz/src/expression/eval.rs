//! Expression evaluation with type-coerced comparisons
//!
//! Evaluation is total: missing attributes resolve to "absent", which makes
//! `==` false, `!=` true and every ordering comparison false.

use super::ast::{CompareOp, Expr, LogicalOp, Operand};
use super::context::EvalContext;
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;

/// Evaluate an expression to a boolean
pub fn evaluate_expr(expr: &Expr, ctx: &EvalContext<'_>) -> bool {
    match expr {
        Expr::Operand(operand) => truthy(resolve_operand(operand, ctx).as_deref()),
        Expr::Compare { left, op, right } => {
            let left = resolve_operand(left, ctx);
            let right = resolve_operand(right, ctx);
            compare(*op, left.as_deref(), right.as_deref())
        }
        Expr::Logical { op, left, right } => {
            let left_result = evaluate_expr(left, ctx);
            match op {
                LogicalOp::And => left_result && evaluate_expr(right, ctx),
                LogicalOp::Or => left_result || evaluate_expr(right, ctx),
            }
        }
    }
}

fn resolve_operand<'a>(operand: &Operand, ctx: &EvalContext<'a>) -> Option<Cow<'a, Value>> {
    let value = match operand {
        Operand::Path(path) => ctx.resolve(path)?,
        Operand::Literal(literal) => Cow::Owned(literal.to_value()),
        Operand::Group(inner) => Cow::Owned(Value::Bool(evaluate_expr(inner, ctx))),
    };

    // JSON null is indistinguishable from a missing attribute
    if value.is_null() {
        None
    } else {
        Some(value)
    }
}

/// Compare two resolved operands; `None` is the absent sentinel
pub fn compare(op: CompareOp, left: Option<&Value>, right: Option<&Value>) -> bool {
    let (left, right) = match (left, right) {
        (Some(l), Some(r)) => (l, r),
        _ => return op == CompareOp::Ne,
    };

    match op {
        CompareOp::Eq => loose_eq(left, right),
        CompareOp::Ne => !loose_eq(left, right),
        CompareOp::Gt => ordering(left, right) == Some(Ordering::Greater),
        CompareOp::Lt => ordering(left, right) == Some(Ordering::Less),
        CompareOp::Ge => matches!(ordering(left, right), Some(Ordering::Greater | Ordering::Equal)),
        CompareOp::Le => matches!(ordering(left, right), Some(Ordering::Less | Ordering::Equal)),
    }
}

/// Type-coerced equality
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    if let (Some(l), Some(r)) = (as_number(left), as_number(right)) {
        return l == r;
    }

    match (left, right) {
        (Value::Bool(l), Value::Bool(r)) => l == r,
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            as_bool_str(s) == Some(*b)
        }
        (Value::Bool(b), Value::Number(n)) | (Value::Number(n), Value::Bool(b)) => {
            n.as_f64().map_or(false, |n| (n != 0.0) == *b)
        }
        (Value::String(l), Value::String(r)) => l == r,
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => left == right,
        _ => false,
    }
}

/// Ordering between two values, or `None` if they are incomparable
pub fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    if let (Some(l), Some(r)) = (as_number(left), as_number(right)) {
        return l.partial_cmp(&r);
    }

    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Truthiness of a bare operand
pub fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map_or(false, |n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty() && as_bool_str(s) != Some(false),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}

fn as_bool_str(s: &str) -> Option<bool> {
    match s {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
