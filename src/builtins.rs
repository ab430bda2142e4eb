// File: src/builtins.rs
//
// Built-in native functions available to candidate scripts.
// Pure helpers live here; builtins that need interpreter state (`print`,
// `push`, `throw`) are handled by the interpreter itself.

use crate::errors::{AnalysisError, SourceLocation};
use crate::interpreter::Value;
use std::sync::Arc;

/// Every builtin name, including the interpreter-handled ones
pub const BUILTIN_NAMES: &[&str] = &[
    "print", "push", "throw", "len", "array", "range", "min", "max", "abs", "floor", "ceil",
    "sqrt", "log", "log2", "pow", "int",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_NAMES.contains(&name)
}

fn arity(name: &str, args: &[Value], expected: usize) -> Result<(), AnalysisError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(AnalysisError::type_error(format!(
            "{}() takes {} argument{}, got {}",
            name,
            expected,
            if expected == 1 { "" } else { "s" },
            args.len()
        )))
    }
}

/// Integer-valued floats stay integers so loop counters do not drift into floats
fn number(x: f64) -> Value {
    if x.fract() == 0.0 && x.abs() < 9.0e15 {
        Value::Int(x as i64)
    } else {
        Value::Float(x)
    }
}

/// Bounds of `range(end)` / `range(start, end)` as a half-open interval
pub fn range_bounds(args: &[Value]) -> Result<(i64, i64), AnalysisError> {
    let bound = |v: &Value| -> Result<i64, AnalysisError> {
        let x = v.expect_number("range()")?;
        if !x.is_finite() {
            return Err(AnalysisError::type_error("range() bounds must be finite"));
        }
        Ok(x.ceil() as i64)
    };
    match args {
        [end] => Ok((0, bound(end)?)),
        [start, end] => Ok((bound(start)?, bound(end)?)),
        _ => Err(AnalysisError::type_error(format!(
            "range() takes 1 or 2 arguments, got {}",
            args.len()
        ))),
    }
}

/// Calls a pure builtin. Returns None when `name` is not one of them.
pub fn call(name: &str, args: &[Value], max_len: usize) -> Option<Result<Value, AnalysisError>> {
    let result = match name {
        "len" => len(args),
        "array" => array(args, max_len),
        "range" => range_bounds(args).and_then(|(start, end)| {
            let count = end.saturating_sub(start).max(0) as usize;
            if count > max_len {
                return Err(collection_limit(count, max_len));
            }
            Ok(Value::Array(Arc::new((start..end).map(Value::Int).collect())))
        }),
        "abs" | "floor" | "ceil" | "sqrt" | "log" | "log2" | "int" => unary_math(name, args),
        "min" | "max" | "pow" => binary_math(name, args),
        _ => return None,
    };
    Some(result)
}

pub fn collection_limit(requested: usize, max_len: usize) -> AnalysisError {
    AnalysisError::runtime_error(
        format!(
            "Collection of {} elements exceeds the sandbox limit of {}",
            requested, max_len
        ),
        SourceLocation::unknown(),
    )
}

fn len(args: &[Value]) -> Result<Value, AnalysisError> {
    arity("len", args, 1)?;
    match &args[0] {
        Value::Array(items) => Ok(Value::Int(items.len() as i64)),
        Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
        other => Err(AnalysisError::type_error(format!(
            "len() expects an array or string, got {}",
            other.type_name()
        ))),
    }
}

fn array(args: &[Value], max_len: usize) -> Result<Value, AnalysisError> {
    if args.is_empty() || args.len() > 2 {
        return Err(AnalysisError::type_error(format!(
            "array() takes 1 or 2 arguments, got {}",
            args.len()
        )));
    }
    let count = args[0].expect_count("array()")?;
    if count > max_len {
        return Err(collection_limit(count, max_len));
    }
    let fill = args.get(1).cloned().unwrap_or(Value::Int(0));
    Ok(Value::Array(Arc::new(vec![fill; count])))
}

fn unary_math(name: &str, args: &[Value]) -> Result<Value, AnalysisError> {
    arity(name, args, 1)?;
    if let ("abs", Value::Int(n)) = (name, &args[0]) {
        return Ok(n.checked_abs().map(Value::Int).unwrap_or(Value::Float((*n as f64).abs())));
    }
    let x = args[0].expect_number(&format!("{}()", name))?;
    Ok(match name {
        "abs" => Value::Float(x.abs()),
        "floor" | "int" => number(x.floor()),
        "ceil" => number(x.ceil()),
        "sqrt" => Value::Float(x.sqrt()),
        "log" => Value::Float(x.ln()),
        "log2" => Value::Float(x.log2()),
        _ => return Err(AnalysisError::undefined_function(name, SourceLocation::unknown())),
    })
}

fn binary_math(name: &str, args: &[Value]) -> Result<Value, AnalysisError> {
    arity(name, args, 2)?;
    if let (Value::Int(a), Value::Int(b)) = (&args[0], &args[1]) {
        match name {
            "min" => return Ok(Value::Int(*a.min(b))),
            "max" => return Ok(Value::Int(*a.max(b))),
            _ => {}
        }
    }
    let a = args[0].expect_number(&format!("{}()", name))?;
    let b = args[1].expect_number(&format!("{}()", name))?;
    Ok(match name {
        "min" => Value::Float(a.min(b)),
        "max" => Value::Float(a.max(b)),
        _ => Value::Float(a.powf(b)),
    })
}
