// File: src/sandbox.rs
//
// Sandbox executor: turns candidate source into something the measurer can
// invoke with a size `n`.
//
// Compilation parses the source, runs its top-level statements once, finds the
// entry function and smoke-tests it with a small input. Anything that goes
// wrong up to that point is a `CompileError`; after it, faults are per-call
// runtime errors the measurer recovers from.

use crate::ast::Stmt;
use crate::config::Config;
use crate::errors::{find_closest_match, AnalysisError, ErrorKind, SourceLocation};
use crate::interpreter::{worker_stack_size, Environment, Interpreter, Limits, Value};
use crate::parser::parse_program;
use std::thread;
use std::time::Instant;
use tracing::debug;

/// Anything the measurer can time.
///
/// `deadline` is the instant by which the call must have finished. Implementors
/// that can stop mid-call should return a `Timeout` error once it passes;
/// others may ignore it and the measurer checks the elapsed time afterwards.
pub trait Candidate {
    fn invoke(&mut self, n: u64, deadline: Option<Instant>) -> Result<(), AnalysisError>;

    /// Estimated loop-nesting depth, used by the adaptive sampler
    fn loop_depth(&self) -> Option<usize> {
        None
    }
}

/// A compiled candidate script bound to its entry function
#[derive(Debug)]
pub struct CompiledCandidate {
    interpreter: Interpreter,
    globals: Environment,
    entry: String,
    loop_depth: usize,
}

impl CompiledCandidate {
    pub fn entry_point(&self) -> &str {
        &self.entry
    }

    /// Calls the entry function once with `n` in a fresh copy of the globals
    pub fn run(&mut self, n: u64, deadline: Option<Instant>) -> Result<Value, AnalysisError> {
        self.interpreter.set_env(self.globals.clone());
        self.interpreter.set_deadline(deadline);
        let arg = Value::Int(i64::try_from(n).unwrap_or(i64::MAX));
        let result = self.interpreter.call_function(&self.entry, vec![arg]);
        self.interpreter.set_deadline(None);
        result
    }
}

impl Candidate for CompiledCandidate {
    fn invoke(&mut self, n: u64, deadline: Option<Instant>) -> Result<(), AnalysisError> {
        self.run(n, deadline).map(|_| ())
    }

    fn loop_depth(&self) -> Option<usize> {
        Some(self.loop_depth)
    }
}

/// Wraps a native closure as a candidate.
///
/// The closure cannot be interrupted, so deadlines are only enforced by the
/// measurer after it returns. Errors become runtime errors.
pub struct FnCandidate<F> {
    f: F,
    depth_hint: Option<usize>,
}

impl<F> FnCandidate<F>
where
    F: FnMut(u64) -> Result<(), String>,
{
    pub fn new(f: F) -> Self {
        Self { f, depth_hint: None }
    }

    pub fn with_loop_depth(mut self, depth: usize) -> Self {
        self.depth_hint = Some(depth);
        self
    }
}

impl<F> Candidate for FnCandidate<F>
where
    F: FnMut(u64) -> Result<(), String>,
{
    fn invoke(&mut self, n: u64, _deadline: Option<Instant>) -> Result<(), AnalysisError> {
        (self.f)(n).map_err(|msg| AnalysisError::runtime_error(msg, SourceLocation::unknown()))
    }

    fn loop_depth(&self) -> Option<usize> {
        self.depth_hint
    }
}

pub struct Sandbox;

impl Sandbox {
    /// Compiles `source` into a candidate, smoke-testing the entry function.
    pub fn compile(source: &str, config: &Config) -> Result<CompiledCandidate, AnalysisError> {
        let program = parse_program(source)
            .map_err(|e| AnalysisError::compile_error(e.with_source_from(source)))?;

        let mut interpreter = Interpreter::with_limits(Limits {
            deadline: None,
            max_call_depth: config.max_call_depth,
            max_collection_len: config.max_collection_len,
        });

        // Top-level code runs once, under the same ceiling as a single trial
        interpreter.set_deadline(Some(Instant::now() + config.per_trial_timeout()));
        interpreter
            .eval_program(&program)
            .map_err(|e| AnalysisError::compile_error(e.with_source_from(source)))?;
        interpreter.set_deadline(None);

        let entry = config.entry_point.clone();
        let def = match interpreter.function(&entry) {
            Some(def) => def,
            None => {
                let mut err = AnalysisError::new(
                    ErrorKind::CompileError,
                    format!("Entry function '{}' is not defined", entry),
                    SourceLocation::unknown(),
                )
                .with_help(format!("define `func {}(n) {{ ... }}`", entry));
                if let Some(suggestion) = find_closest_match(&entry, &interpreter.function_names()) {
                    err = err.with_suggestion(suggestion.to_string());
                }
                return Err(err);
            }
        };
        if def.params.len() != 1 {
            return Err(AnalysisError::new(
                ErrorKind::CompileError,
                format!(
                    "Entry function '{}' must take exactly one parameter, found {}",
                    entry,
                    def.params.len()
                ),
                def.location.clone(),
            )
            .with_source_from(source));
        }

        let loop_depth = function_depth(&interpreter, &entry, &mut Vec::new());
        let globals = interpreter.env().clone();
        let mut candidate = CompiledCandidate { interpreter, globals, entry, loop_depth };

        let smoke_deadline = Instant::now() + config.per_trial_timeout();
        candidate.run(config.smoke_input, Some(smoke_deadline)).map_err(|e| {
            AnalysisError::compile_error(e.with_source_from(source))
                .with_note(format!("smoke invocation with n = {} failed", config.smoke_input))
        })?;

        debug!(entry = %candidate.entry, loop_depth, "candidate compiled");
        Ok(candidate)
    }
}

/// Runs `f` on a thread whose stack fits `max_call_depth` nested script calls.
///
/// Script recursion is evaluated recursively on the host stack, so anything
/// that runs candidate code with the configured depth limit goes through here.
/// A panic on the worker comes back as a runtime error.
pub fn run_on_worker<T, F>(max_call_depth: usize, f: F) -> Result<T, AnalysisError>
where
    T: Send,
    F: FnOnce() -> Result<T, AnalysisError> + Send,
{
    thread::scope(|scope| {
        let worker = thread::Builder::new()
            .name("ruff-bigo-worker".to_string())
            .stack_size(worker_stack_size(max_call_depth))
            .spawn_scoped(scope, f)
            .map_err(|e| AnalysisError::io(format!("Cannot start worker thread: {}", e)))?;

        match worker.join() {
            Ok(result) => result,
            Err(payload) => {
                let detail = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(AnalysisError::runtime_error(
                    format!("Worker thread panicked: {}", detail),
                    SourceLocation::unknown(),
                ))
            }
        }
    })
}

/// Deepest loop nesting reachable from a user function, following calls.
/// Recursive cycles contribute nothing beyond their first visit.
fn function_depth(interp: &Interpreter, name: &str, visiting: &mut Vec<String>) -> usize {
    if visiting.iter().any(|v| v == name) {
        return 0;
    }
    let def = match interp.function(name) {
        Some(def) => def,
        None => return 0,
    };
    visiting.push(name.to_string());
    let depth = block_depth(interp, &def.body, visiting);
    visiting.pop();
    depth
}

fn block_depth(interp: &Interpreter, stmts: &[Stmt], visiting: &mut Vec<String>) -> usize {
    stmts.iter().map(|stmt| stmt_depth(interp, stmt, visiting)).max().unwrap_or(0)
}

fn stmt_depth(interp: &Interpreter, stmt: &Stmt, visiting: &mut Vec<String>) -> usize {
    // Nested definitions are not executed where they appear
    if let Stmt::FuncDef(_) = stmt {
        return 0;
    }

    let mut called = Vec::new();
    for expr in stmt.exprs() {
        expr.called_functions(&mut called);
    }
    let through_calls = called
        .iter()
        .map(|name| function_depth(interp, name, visiting))
        .max()
        .unwrap_or(0);
    let nested = stmt
        .blocks()
        .into_iter()
        .map(|block| block_depth(interp, block, visiting))
        .max()
        .unwrap_or(0);

    usize::from(stmt.is_loop()) + through_calls.max(nested)
}
