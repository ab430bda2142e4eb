// File: src/lib.rs
//
// Library interface for ruff-bigo, an empirical time-complexity estimator
// for Ruff candidate scripts.
// Exposes the candidate language, the sandbox and the analysis pipeline.

pub mod analysis;
pub mod ast;
pub mod builtins;
pub mod config;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod sandbox;

pub use analysis::{
    estimate_complexity, ComplexityClass, ConfidenceTier, EstimationReport, Estimator, MeasurementSeries,
    SamplePoint,
};
pub use config::Config;
pub use errors::{AnalysisError, ErrorKind};
pub use sandbox::{Candidate, CompiledCandidate, FnCandidate, Sandbox};
