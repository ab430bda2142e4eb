// File: src/interpreter/mod.rs
//
// Tree-walking interpreter for Ruff candidate scripts.
// Executes programs by traversing the Abstract Syntax Tree (AST).
//
// The interpreter is the sandbox the analyzer measures candidates in, so
// besides ordinary evaluation it enforces execution limits:
// - a wall-clock deadline, checked cooperatively every few hundred ticks
//   (loop iterations and calls), which cancels runaway candidates mid-call
// - a maximum call depth, so deep recursion fails cleanly instead of
//   overflowing the host stack
// - a maximum collection length, so a candidate cannot exhaust memory
//
// Every fault is returned as an `AnalysisError`; nothing in here panics on
// candidate input.

mod control_flow;
mod environment;
mod value;

pub use environment::Environment;
pub use value::Value;

use control_flow::ControlFlow;

use crate::ast::{Expr, FuncDef, Stmt};
use crate::builtins;
use crate::errors::{find_closest_match, AnalysisError, ErrorKind, SourceLocation};
use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// How many ticks pass between deadline checks. `Instant::now()` is cheap but
/// not free, and the loop bodies being timed are often tiny.
const DEADLINE_CHECK_INTERVAL: u64 = 256;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 10_000;
pub const DEFAULT_MAX_COLLECTION_LEN: usize = 50_000_000;

/// Host stack one level of script recursion may use. A script call passes
/// through several evaluator frames (call, block, statement, expression).
pub const STACK_BYTES_PER_CALL: usize = 32 * 1024;
const BASE_STACK_BYTES: usize = 8 * 1024 * 1024;

/// Stack size for a thread that runs scripts nested up to `max_call_depth` calls
pub fn worker_stack_size(max_call_depth: usize) -> usize {
    BASE_STACK_BYTES.saturating_add(max_call_depth.saturating_mul(STACK_BYTES_PER_CALL))
}

/// Execution limits applied to everything the interpreter runs
#[derive(Debug, Clone)]
pub struct Limits {
    pub deadline: Option<Instant>,
    pub max_call_depth: usize,
    pub max_collection_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            deadline: None,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_collection_len: DEFAULT_MAX_COLLECTION_LEN,
        }
    }
}

#[derive(Debug)]
pub struct Interpreter {
    env: Environment,
    functions: HashMap<String, Arc<FuncDef>>,
    limits: Limits,
    call_depth: usize,
    ticks: u64,
    output: Option<Arc<Mutex<Vec<u8>>>>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_limits(Limits::default())
    }

    pub fn with_limits(limits: Limits) -> Self {
        Interpreter {
            env: Environment::new(),
            functions: HashMap::new(),
            limits,
            call_depth: 0,
            ticks: 0,
            output: None,
        }
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.limits.deadline = deadline;
    }

    /// Redirect `print` output into a buffer instead of stdout
    pub fn set_output(&mut self, output: Arc<Mutex<Vec<u8>>>) {
        self.output = Some(output);
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Replaces the global environment, e.g. to reset state between runs
    pub fn set_env(&mut self, env: Environment) {
        self.env = env;
    }

    pub fn function(&self, name: &str) -> Option<Arc<FuncDef>> {
        self.functions.get(name).cloned()
    }

    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.keys().cloned().collect();
        names.sort();
        names
    }

    /// Runs a whole program in the global scope.
    ///
    /// Top-level functions are registered before anything executes, so they
    /// may be called before their definition. A top-level `return` stops the
    /// program and yields its value.
    pub fn eval_program(&mut self, stmts: &[Stmt]) -> Result<Option<Value>, AnalysisError> {
        for stmt in stmts {
            if let Stmt::FuncDef(def) = stmt {
                self.functions.insert(def.name.clone(), def.clone());
            }
        }

        match self.eval_stmts(stmts)? {
            ControlFlow::Return(value) => Ok(Some(value)),
            ControlFlow::Break | ControlFlow::Continue => Err(AnalysisError::runtime_error(
                "'break' or 'continue' outside of a loop",
                SourceLocation::unknown(),
            )),
            ControlFlow::None => Ok(None),
        }
    }

    /// Runs interactive input at the top level. The value of a trailing
    /// expression statement (or a top-level `return`) is handed back for display.
    pub fn eval_interactive(&mut self, stmts: &[Stmt]) -> Result<Option<Value>, AnalysisError> {
        for stmt in stmts {
            if let Stmt::FuncDef(def) = stmt {
                self.functions.insert(def.name.clone(), def.clone());
            }
        }
        let (last, init) = match stmts.split_last() {
            Some(split) => split,
            None => return Ok(None),
        };
        if let ControlFlow::Return(value) = self.eval_stmts(init)? {
            return Ok(Some(value));
        }
        match last {
            Stmt::ExprStmt(expr) => self.eval_expr(expr).map(Some),
            stmt => match self.eval_stmt(stmt)? {
                ControlFlow::Return(value) => Ok(Some(value)),
                _ => Ok(None),
            },
        }
    }

    /// Calls a named user function with already-evaluated arguments
    pub fn call_function(&mut self, name: &str, args: Vec<Value>) -> Result<Value, AnalysisError> {
        let def = self.functions.get(name).cloned().ok_or_else(|| {
            self.undefined_function_error(name, &SourceLocation::unknown())
        })?;
        self.call_user(&def, args, &def.location.clone())
    }

    fn call_user(
        &mut self,
        def: &Arc<FuncDef>,
        args: Vec<Value>,
        location: &SourceLocation,
    ) -> Result<Value, AnalysisError> {
        if args.len() != def.params.len() {
            return Err(AnalysisError::type_error(format!(
                "Function '{}' expects {} argument{}, got {}",
                def.name,
                def.params.len(),
                if def.params.len() == 1 { "" } else { "s" },
                args.len()
            ))
            .or_at(location));
        }
        if self.call_depth >= self.limits.max_call_depth {
            return Err(AnalysisError::runtime_error(
                format!("Maximum call depth of {} exceeded", self.limits.max_call_depth),
                location.clone(),
            )
            .with_help("deep recursion is capped to protect the host process"));
        }
        self.tick()?;

        let saved = self.env.call_frame();
        for (param, arg) in def.params.iter().zip(args) {
            self.env.define(param.clone(), arg);
        }
        self.call_depth += 1;

        let result = self.eval_stmts(&def.body);

        // Restore before propagating so try/except in the caller sees its own scopes
        self.call_depth -= 1;
        self.env.restore_frame(saved);

        match result? {
            ControlFlow::Return(value) => Ok(value),
            // No explicit return - function returns null
            _ => Ok(Value::Null),
        }
    }

    /// Counts one unit of work and enforces the deadline
    fn tick(&mut self) -> Result<(), AnalysisError> {
        self.ticks = self.ticks.wrapping_add(1);
        if self.ticks % DEADLINE_CHECK_INTERVAL == 0 {
            if let Some(deadline) = self.limits.deadline {
                if Instant::now() >= deadline {
                    return Err(AnalysisError::timeout("Execution deadline exceeded"));
                }
            }
        }
        Ok(())
    }

    /// Helper to write output to either the output buffer or stdout
    fn write_output(&self, msg: &str) {
        if let Some(out) = &self.output {
            if let Ok(mut buffer) = out.lock() {
                let _ = writeln!(buffer, "{}", msg);
            }
        } else {
            println!("{}", msg);
        }
    }

    /// Evaluates a list of statements sequentially, stopping on break/continue/return
    fn eval_stmts(&mut self, stmts: &[Stmt]) -> Result<ControlFlow, AnalysisError> {
        for stmt in stmts {
            let flow = self.eval_stmt(stmt)?;
            if flow != ControlFlow::None {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::None)
    }

    /// Evaluates statements in a fresh scope that is popped even on error
    fn eval_scoped(&mut self, stmts: &[Stmt]) -> Result<ControlFlow, AnalysisError> {
        self.env.push_scope();
        let result = self.eval_stmts(stmts);
        self.env.pop_scope();
        result
    }

    /// Runs one loop iteration's body and reports whether the loop should stop
    fn loop_body(&mut self, body: &[Stmt]) -> Result<Option<ControlFlow>, AnalysisError> {
        self.tick()?;
        match self.eval_stmts(body)? {
            ControlFlow::Break => Ok(Some(ControlFlow::None)),
            ControlFlow::Continue | ControlFlow::None => Ok(None),
            ret @ ControlFlow::Return(_) => Ok(Some(ret)),
        }
    }

    fn eval_stmt(&mut self, stmt: &Stmt) -> Result<ControlFlow, AnalysisError> {
        match stmt {
            Stmt::Let { name, value, mutable: _ } => {
                let val = self.eval_expr(value)?;
                self.env.define(name.clone(), val);
            }
            Stmt::Assign { target, value } => {
                let val = self.eval_expr(value)?;
                self.assign(target, val)?;
            }
            Stmt::FuncDef(def) => {
                self.functions.insert(def.name.clone(), def.clone());
            }
            Stmt::ExprStmt(expr) => {
                self.eval_expr(expr)?;
            }
            Stmt::Return(expr) => {
                let value = match expr {
                    Some(e) => self.eval_expr(e)?,
                    None => Value::Null,
                };
                return Ok(ControlFlow::Return(value));
            }
            Stmt::If { condition, then_branch, else_branch } => {
                if self.eval_expr(condition)?.is_truthy() {
                    return self.eval_scoped(then_branch);
                } else if let Some(else_branch) = else_branch {
                    return self.eval_scoped(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                return self.eval_while(Some(condition), body);
            }
            Stmt::Loop { condition, body } => {
                return self.eval_while(condition.as_ref(), body);
            }
            Stmt::For { var, iterable, body } => {
                self.env.push_scope();
                let result = self.eval_for(var, iterable, body);
                self.env.pop_scope();
                return result;
            }
            Stmt::Break => return Ok(ControlFlow::Break),
            Stmt::Continue => return Ok(ControlFlow::Continue),
            Stmt::TryExcept { try_block, except_var, except_block } => {
                return match self.eval_scoped(try_block) {
                    Ok(flow) => Ok(flow),
                    // Cancellation must always win over candidate error handling
                    Err(err) if err.kind == ErrorKind::Timeout => Err(err),
                    Err(err) => {
                        self.env.push_scope();
                        self.env.define(except_var.clone(), Value::Str(Arc::new(err.message)));
                        let result = self.eval_stmts(except_block);
                        self.env.pop_scope();
                        result
                    }
                };
            }
        }
        Ok(ControlFlow::None)
    }

    fn eval_while(
        &mut self,
        condition: Option<&Expr>,
        body: &[Stmt],
    ) -> Result<ControlFlow, AnalysisError> {
        self.env.push_scope();
        let result = self.run_while(condition, body);
        self.env.pop_scope();
        result
    }

    fn run_while(
        &mut self,
        condition: Option<&Expr>,
        body: &[Stmt],
    ) -> Result<ControlFlow, AnalysisError> {
        loop {
            if let Some(condition) = condition {
                if !self.eval_expr(condition)?.is_truthy() {
                    return Ok(ControlFlow::None);
                }
            }
            if let Some(flow) = self.loop_body(body)? {
                return Ok(flow);
            }
        }
    }

    fn eval_for(
        &mut self,
        var: &str,
        iterable: &Expr,
        body: &[Stmt],
    ) -> Result<ControlFlow, AnalysisError> {
        // `for i in range(..)` iterates without materializing the range
        if let Expr::Call { callee, args, location } = iterable {
            if callee == "range" && !self.functions.contains_key("range") {
                let args = self.eval_args(args)?;
                let (start, end) = builtins::range_bounds(&args).map_err(|e| e.or_at(location))?;
                return self.iterate(var, (start..end).map(Value::Int), body);
            }
        }

        match self.eval_expr(iterable)? {
            Value::Int(n) => self.iterate(var, (0..n.max(0)).map(Value::Int), body),
            Value::Float(n) if n.is_finite() => {
                self.iterate(var, (0..n.ceil().max(0.0) as i64).map(Value::Int), body)
            }
            Value::Array(items) => self.iterate(var, items.iter().cloned(), body),
            Value::Str(s) => self.iterate(
                var,
                s.chars().map(|c| Value::Str(Arc::new(c.to_string()))),
                body,
            ),
            other => Err(AnalysisError::type_error(format!(
                "Cannot iterate over {}",
                other.type_name()
            ))),
        }
    }

    fn iterate(
        &mut self,
        var: &str,
        items: impl Iterator<Item = Value>,
        body: &[Stmt],
    ) -> Result<ControlFlow, AnalysisError> {
        for item in items {
            self.env.define(var.to_string(), item);
            if let Some(flow) = self.loop_body(body)? {
                return Ok(flow);
            }
        }
        Ok(ControlFlow::None)
    }

    fn assign(&mut self, target: &Expr, value: Value) -> Result<(), AnalysisError> {
        match target {
            Expr::Identifier(name, _) => {
                self.env.set(name, value);
                Ok(())
            }
            Expr::IndexAccess { location, .. } => {
                // Flatten m[i][j] into the root variable and the index path
                let mut indexes = Vec::new();
                let mut node = target;
                while let Expr::IndexAccess { object, index, .. } = node {
                    indexes.push(self.eval_expr(index)?);
                    node = object;
                }
                indexes.reverse();
                let name = match node {
                    Expr::Identifier(name, _) => name,
                    _ => {
                        return Err(AnalysisError::runtime_error(
                            "Only variables can be index-assigned",
                            location.clone(),
                        ))
                    }
                };
                self.assign_index(name, &indexes, value).map_err(|e| e.or_at(location))
            }
            _ => Err(AnalysisError::runtime_error("Invalid assignment target", SourceLocation::unknown())),
        }
    }

    fn assign_index(&mut self, name: &str, indexes: &[Value], value: Value) -> Result<(), AnalysisError> {
        let mut slot = match self.env.get_mut(name) {
            Some(slot) => slot,
            None => return Err(AnalysisError::undefined_variable(name, SourceLocation::unknown())),
        };
        for index in indexes {
            slot = match slot {
                Value::Array(items) => {
                    let len = items.len();
                    let i = checked_index(index, len)?;
                    &mut Arc::make_mut(items)[i]
                }
                other => {
                    return Err(AnalysisError::type_error(format!(
                        "Cannot index into {}",
                        other.type_name()
                    )))
                }
            };
        }
        *slot = value;
        Ok(())
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, AnalysisError> {
        args.iter().map(|arg| self.eval_expr(arg)).collect()
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, AnalysisError> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(n) => Ok(Value::Float(*n)),
            Expr::String(s) => Ok(Value::Str(Arc::new(s.clone()))),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Null => Ok(Value::Null),
            Expr::Identifier(name, location) => {
                if let Some(value) = self.env.get(name) {
                    return Ok(value.clone());
                }
                if let Some(def) = self.functions.get(name) {
                    return Ok(Value::Function(def.clone()));
                }
                let mut err = AnalysisError::undefined_variable(name, location.clone());
                if let Some(suggestion) = find_closest_match(name, &self.env.names()) {
                    err = err.with_suggestion(suggestion.to_string());
                }
                Err(err)
            }
            Expr::ArrayLiteral(items) => {
                let values = self.eval_args(items)?;
                Ok(Value::Array(Arc::new(values)))
            }
            Expr::UnaryOp { op, operand } => {
                let val = self.eval_expr(operand)?;
                match (op.as_str(), val) {
                    ("-", Value::Int(n)) => {
                        Ok(n.checked_neg().map(Value::Int).unwrap_or(Value::Float(-(n as f64))))
                    }
                    ("-", Value::Float(n)) => Ok(Value::Float(-n)),
                    ("!", val) => Ok(Value::Bool(!val.is_truthy())),
                    (op, val) => Err(AnalysisError::type_error(format!(
                        "Unary '{}' is not defined for {}",
                        op,
                        val.type_name()
                    ))),
                }
            }
            Expr::BinaryOp { left, op, right, location } => {
                // Short-circuit logical operators
                match op.as_str() {
                    "&&" => {
                        let l = self.eval_expr(left)?;
                        if !l.is_truthy() {
                            return Ok(Value::Bool(false));
                        }
                        return Ok(Value::Bool(self.eval_expr(right)?.is_truthy()));
                    }
                    "||" => {
                        let l = self.eval_expr(left)?;
                        if l.is_truthy() {
                            return Ok(Value::Bool(true));
                        }
                        return Ok(Value::Bool(self.eval_expr(right)?.is_truthy()));
                    }
                    _ => {}
                }
                let l = self.eval_expr(left)?;
                let r = self.eval_expr(right)?;
                binary_op(op, l, r).map_err(|e| e.or_at(location))
            }
            Expr::IndexAccess { object, index, location } => {
                let obj = self.eval_expr(object)?;
                let idx = self.eval_expr(index)?;
                match obj {
                    Value::Array(items) => {
                        let i = checked_index(&idx, items.len()).map_err(|e| e.or_at(location))?;
                        Ok(items[i].clone())
                    }
                    Value::Str(s) => {
                        let len = s.chars().count();
                        let i = checked_index(&idx, len).map_err(|e| e.or_at(location))?;
                        Ok(s.chars().nth(i).map(|c| Value::Str(Arc::new(c.to_string()))).unwrap_or(Value::Null))
                    }
                    other => Err(AnalysisError::type_error(format!(
                        "Cannot index into {}",
                        other.type_name()
                    ))
                    .or_at(location)),
                }
            }
            Expr::Call { callee, args, location } => self.eval_call(callee, args, location),
        }
    }

    fn eval_call(
        &mut self,
        callee: &str,
        args: &[Expr],
        location: &SourceLocation,
    ) -> Result<Value, AnalysisError> {
        // Functions held in variables, then named user functions, then builtins
        let user_fn = match self.env.get(callee) {
            Some(Value::Function(def)) => Some(def.clone()),
            _ => self.functions.get(callee).cloned(),
        };
        if let Some(def) = user_fn {
            let values = self.eval_args(args)?;
            return self.call_user(&def, values, location);
        }

        match callee {
            "print" => {
                let values = self.eval_args(args)?;
                let line: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                self.write_output(&line.join(" "));
                Ok(Value::Null)
            }
            "throw" => {
                let values = self.eval_args(args)?;
                let message = values
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                Err(AnalysisError::runtime_error(message, location.clone()))
            }
            "push" => self.eval_push(args, location),
            _ => {
                let values = self.eval_args(args)?;
                match builtins::call(callee, &values, self.limits.max_collection_len) {
                    Some(result) => result.map_err(|e| e.or_at(location)),
                    None => Err(self.undefined_function_error(callee, location)),
                }
            }
        }
    }

    /// `push(arr, value)` appends in place when `arr` names a variable,
    /// otherwise returns a new array. Returns the new length in place.
    fn eval_push(&mut self, args: &[Expr], location: &SourceLocation) -> Result<Value, AnalysisError> {
        if args.len() != 2 {
            return Err(AnalysisError::type_error(format!(
                "push() takes 2 arguments, got {}",
                args.len()
            ))
            .or_at(location));
        }
        let value = self.eval_expr(&args[1])?;
        let max_len = self.limits.max_collection_len;

        if let Expr::Identifier(name, _) = &args[0] {
            if let Some(Value::Array(items)) = self.env.get_mut(name) {
                if items.len() >= max_len {
                    return Err(builtins::collection_limit(items.len() + 1, max_len).or_at(location));
                }
                let items = Arc::make_mut(items);
                items.push(value);
                return Ok(Value::Int(items.len() as i64));
            }
        }

        match self.eval_expr(&args[0])? {
            Value::Array(items) => {
                if items.len() >= max_len {
                    return Err(builtins::collection_limit(items.len() + 1, max_len).or_at(location));
                }
                let mut items = items.as_ref().clone();
                items.push(value);
                Ok(Value::Array(Arc::new(items)))
            }
            other => Err(AnalysisError::type_error(format!(
                "push() expects an array, got {}",
                other.type_name()
            ))
            .or_at(location)),
        }
    }

    fn undefined_function_error(&self, name: &str, location: &SourceLocation) -> AnalysisError {
        let mut candidates = self.function_names();
        candidates.extend(builtins::BUILTIN_NAMES.iter().map(|s| s.to_string()));
        let mut err = AnalysisError::undefined_function(name, location.clone());
        if let Some(suggestion) = find_closest_match(name, &candidates) {
            err = err.with_suggestion(suggestion.to_string());
        }
        err
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn checked_index(index: &Value, len: usize) -> Result<usize, AnalysisError> {
    let i = match index {
        Value::Int(n) => *n,
        Value::Float(n) if n.fract() == 0.0 => *n as i64,
        other => {
            return Err(AnalysisError::type_error(format!(
                "Index must be an integer, got {}",
                other
            )))
        }
    };
    if i < 0 || i as usize >= len {
        return Err(AnalysisError::runtime_error(
            format!("Index {} out of bounds for length {}", i, len),
            SourceLocation::unknown(),
        ));
    }
    Ok(i as usize)
}

/// Applies a non-short-circuit binary operator
fn binary_op(op: &str, l: Value, r: Value) -> Result<Value, AnalysisError> {
    match op {
        "==" => return Ok(Value::Bool(l.loose_eq(&r))),
        "!=" => return Ok(Value::Bool(!l.loose_eq(&r))),
        "+" => {
            if matches!(l, Value::Str(_)) || matches!(r, Value::Str(_)) {
                return Ok(Value::Str(Arc::new(format!("{}{}", l, r))));
            }
            if let (Value::Array(a), Value::Array(b)) = (&l, &r) {
                let mut joined = a.as_ref().clone();
                joined.extend(b.iter().cloned());
                return Ok(Value::Array(Arc::new(joined)));
            }
        }
        "<" | ">" | "<=" | ">=" => {
            if let (Value::Str(a), Value::Str(b)) = (&l, &r) {
                return Ok(Value::Bool(compare(op, a.as_str().cmp(b.as_str()))));
            }
        }
        _ => {}
    }

    if let (Value::Int(a), Value::Int(b)) = (&l, &r) {
        let (a, b) = (*a, *b);
        // Integer overflow promotes to float instead of wrapping
        let promoted = |x: f64| Value::Float(x);
        return match op {
            "+" => Ok(a.checked_add(b).map(Value::Int).unwrap_or_else(|| promoted(a as f64 + b as f64))),
            "-" => Ok(a.checked_sub(b).map(Value::Int).unwrap_or_else(|| promoted(a as f64 - b as f64))),
            "*" => Ok(a.checked_mul(b).map(Value::Int).unwrap_or_else(|| promoted(a as f64 * b as f64))),
            "/" => {
                if b == 0 {
                    Err(AnalysisError::division_by_zero())
                } else if a % b == 0 {
                    Ok(a.checked_div(b).map(Value::Int).unwrap_or_else(|| promoted(a as f64 / b as f64)))
                } else {
                    Ok(Value::Float(a as f64 / b as f64))
                }
            }
            "%" => {
                if b == 0 {
                    Err(AnalysisError::division_by_zero())
                } else {
                    Ok(Value::Int(a.checked_rem(b).unwrap_or(0)))
                }
            }
            "<" | ">" | "<=" | ">=" => Ok(Value::Bool(compare(op, a.cmp(&b)))),
            _ => Err(unsupported(op, &l, &r)),
        };
    }

    let (a, b) = match (l.as_f64(), r.as_f64()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(unsupported(op, &l, &r)),
    };
    match op {
        "+" => Ok(Value::Float(a + b)),
        "-" => Ok(Value::Float(a - b)),
        "*" => Ok(Value::Float(a * b)),
        "/" | "%" if b == 0.0 => Err(AnalysisError::division_by_zero()),
        "/" => Ok(Value::Float(a / b)),
        "%" => Ok(Value::Float(a % b)),
        "<" | ">" | "<=" | ">=" => match a.partial_cmp(&b) {
            Some(ordering) => Ok(Value::Bool(compare(op, ordering))),
            None => Ok(Value::Bool(false)),
        },
        _ => Err(unsupported(op, &l, &r)),
    }
}

fn compare(op: &str, ordering: std::cmp::Ordering) -> bool {
    use std::cmp::Ordering::*;
    match op {
        "<" => ordering == Less,
        ">" => ordering == Greater,
        "<=" => ordering != Greater,
        _ => ordering != Less,
    }
}

fn unsupported(op: &str, l: &Value, r: &Value) -> AnalysisError {
    AnalysisError::type_error(format!(
        "Operator '{}' is not defined for {} and {}",
        op,
        l.type_name(),
        r.type_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;
    use std::time::Duration;

    fn run(source: &str) -> Result<Option<Value>, AnalysisError> {
        let program = parse_program(source).unwrap();
        Interpreter::new().eval_program(&program)
    }

    #[test]
    fn test_integer_overflow_promotes() {
        let value = run("return 9223372036854775807 + 1").unwrap().unwrap();
        assert!(matches!(value, Value::Float(_)));
    }

    #[test]
    fn test_exact_division_stays_integer() {
        assert!(matches!(run("return 10 / 2").unwrap(), Some(Value::Int(5))));
        assert!(matches!(run("return 7 / 2").unwrap(), Some(Value::Float(f)) if f == 3.5));
    }

    #[test]
    fn test_division_by_zero() {
        let err = run("let x := 0\nreturn 1 / x").unwrap_err();
        assert_eq!(err.kind, ErrorKind::DivisionByZero);
        assert_eq!(err.location.line, 2);
    }

    #[test]
    fn test_deadline_cancels_infinite_loop() {
        let program = parse_program("func spin(n) { loop { n := n + 1 } }").unwrap();
        let mut interp = Interpreter::new();
        interp.eval_program(&program).unwrap();
        interp.set_deadline(Some(Instant::now() + Duration::from_millis(20)));
        let started = Instant::now();
        let err = interp.call_function("spin", vec![Value::Int(0)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_timeout_is_not_catchable() {
        let program = parse_program(
            "func spin(n) { try { loop { n := n + 1 } } except e { return -1 } }",
        )
        .unwrap();
        let mut interp = Interpreter::new();
        interp.eval_program(&program).unwrap();
        interp.set_deadline(Some(Instant::now() + Duration::from_millis(10)));
        let err = interp.call_function("spin", vec![Value::Int(0)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
    }

    #[test]
    fn test_call_depth_limit() {
        let program = parse_program("func down(n) { return down(n + 1) }").unwrap();
        let mut interp = Interpreter::with_limits(Limits { max_call_depth: 50, ..Limits::default() });
        interp.eval_program(&program).unwrap();
        let err = interp.call_function("down", vec![Value::Int(0)]).unwrap_err();
        assert!(err.message.contains("Maximum call depth of 50"));
    }

    #[test]
    fn test_scopes_restored_after_caught_error() {
        let source = r#"
            func fail(n) { throw("bad " + n) }
            mut caught := ""
            try { fail(3) } except e { caught := e }
            return caught
        "#;
        let value = run(source).unwrap().unwrap();
        assert_eq!(value.to_string(), "bad 3");
    }

    #[test]
    fn test_undefined_variable_suggestion() {
        let err = run("let total := 1\nreturn totl + 1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedVariable);
        assert_eq!(err.suggestion.as_deref(), Some("total"));
    }

    #[test]
    fn test_print_to_buffer() {
        let program = parse_program("print(\"n =\", 3, [1, 2])").unwrap();
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let mut interp = Interpreter::new();
        interp.set_output(buffer.clone());
        interp.eval_program(&program).unwrap();
        let out = String::from_utf8(buffer.lock().unwrap().clone()).unwrap();
        assert_eq!(out, "n = 3 [1, 2]\n");
    }
}
