// File: src/interpreter/value.rs
//
// Runtime value types for Ruff candidate scripts.

use crate::ast::FuncDef;
use crate::errors::AnalysisError;
use std::fmt;
use std::sync::Arc;

/// A runtime value.
///
/// Collections are reference counted so passing them around is cheap; writes go
/// through `Arc::make_mut`, which only copies when a value is actually shared.
#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Arc<String>),
    Array(Arc<Vec<Value>>),
    Function(Arc<FuncDef>),
    Null,
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Null => "null",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(arr) => !arr.is_empty(),
            Value::Function(_) => true,
            Value::Null => false,
        }
    }

    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn expect_number(&self, context: &str) -> Result<f64, AnalysisError> {
        self.as_f64().ok_or_else(|| {
            AnalysisError::type_error(format!(
                "{} expects a number, got {}",
                context,
                self.type_name()
            ))
        })
    }

    /// Converts to a non-negative integer count (sizes, indexes, repetitions)
    pub fn expect_count(&self, context: &str) -> Result<usize, AnalysisError> {
        match self {
            Value::Int(n) if *n >= 0 => Ok(*n as usize),
            Value::Float(n) if *n >= 0.0 && n.is_finite() => Ok(n.floor() as usize),
            _ => Err(AnalysisError::type_error(format!(
                "{} expects a non-negative number, got {}",
                context, self
            ))),
        }
    }

    /// Loose equality: numbers compare by value regardless of int/float
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => match (self.as_f64(), other.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.loose_eq(other)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match item {
                        Value::Str(s) => write!(f, "\"{}\"", s)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                write!(f, "]")
            }
            Value::Function(def) => write!(f, "<func {}({})>", def.name, def.params.join(", ")),
            Value::Null => write!(f, "null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(3.0).to_string(), "3");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        let arr = Value::Array(Arc::new(vec![Value::Int(1), Value::Str(Arc::new("a".into()))]));
        assert_eq!(arr.to_string(), "[1, \"a\"]");
    }

    #[test]
    fn test_loose_equality() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::Bool(true));
        assert_eq!(Value::Null, Value::Null);
    }

    #[test]
    fn test_expect_count() {
        assert_eq!(Value::Float(3.7).expect_count("range").unwrap(), 3);
        assert!(Value::Int(-1).expect_count("range").is_err());
        assert!(Value::Null.expect_count("range").is_err());
    }
}
