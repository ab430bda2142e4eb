// File: src/errors.rs
//
// Error handling and reporting for the complexity analyzer.
// A single structured error type carries both candidate-script diagnostics
// (parse and runtime faults) and pipeline outcomes (compile failures, budget
// bailouts, degenerate fits), with source locations and pretty-printed output.

use colored::Colorize;
use serde::Serialize;
use std::fmt;

/// Source location information for tracking where code appears in a candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn unknown() -> Self {
        Self { line: 0, column: 0 }
    }

    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Types of errors that can occur while compiling, running or analyzing a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Source failed to parse or failed the smoke invocation. Fatal for a run.
    CompileError,
    /// A single invocation threw. Recovered by the measurer.
    RuntimeError,
    /// The global time budget ran out. Carried by `Termination::BudgetExceeded`
    /// inside the report rather than returned as an error.
    BudgetExceeded,
    /// Not enough usable points to fit a growth model. Carried by
    /// `Termination::DegenerateFit`.
    DegenerateFit,
    ParseError,
    TypeError,
    UndefinedVariable,
    UndefinedFunction,
    DivisionByZero,
    /// An invocation hit its wall-clock deadline and was cancelled.
    Timeout,
    InvalidConfig,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::CompileError => write!(f, "Compile Error"),
            ErrorKind::RuntimeError => write!(f, "Runtime Error"),
            ErrorKind::BudgetExceeded => write!(f, "Budget Exceeded"),
            ErrorKind::DegenerateFit => write!(f, "Degenerate Fit"),
            ErrorKind::ParseError => write!(f, "Parse Error"),
            ErrorKind::TypeError => write!(f, "Type Error"),
            ErrorKind::UndefinedVariable => write!(f, "Undefined Variable"),
            ErrorKind::UndefinedFunction => write!(f, "Undefined Function"),
            ErrorKind::DivisionByZero => write!(f, "Division By Zero"),
            ErrorKind::Timeout => write!(f, "Timeout"),
            ErrorKind::InvalidConfig => write!(f, "Invalid Configuration"),
            ErrorKind::Io => write!(f, "I/O Error"),
        }
    }
}

/// A structured error with location information
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: SourceLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl AnalysisError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            kind,
            message: message.into(),
            location,
            source_line: None,
            suggestion: None,
            help: None,
            note: None,
        }
    }

    pub fn with_source(mut self, source_line: String) -> Self {
        self.source_line = Some(source_line);
        self
    }

    pub fn with_suggestion(mut self, suggestion: String) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Fills in a location for errors raised without one (builtins, arithmetic)
    pub fn or_at(mut self, location: &SourceLocation) -> Self {
        if !self.location.is_known() {
            self.location = location.clone();
        }
        self
    }

    /// Create a parse error
    pub fn parse_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::ParseError, message, location)
    }

    /// Create a runtime error
    pub fn runtime_error(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::RuntimeError, message, location)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message, SourceLocation::unknown())
    }

    /// Create an undefined variable error
    pub fn undefined_variable(name: &str, location: SourceLocation) -> Self {
        Self::new(
            ErrorKind::UndefinedVariable,
            format!("Variable '{}' is not defined", name),
            location,
        )
    }

    /// Create an undefined function error
    pub fn undefined_function(name: &str, location: SourceLocation) -> Self {
        Self::new(
            ErrorKind::UndefinedFunction,
            format!("Function '{}' is not defined", name),
            location,
        )
    }

    pub fn division_by_zero() -> Self {
        Self::new(ErrorKind::DivisionByZero, "Division by zero", SourceLocation::unknown())
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message, SourceLocation::unknown())
    }

    /// Wraps a script diagnostic as a fatal compile error, keeping its text verbatim
    pub fn compile_error(cause: AnalysisError) -> Self {
        let message = if cause.kind == ErrorKind::CompileError {
            cause.message.clone()
        } else {
            format!("{}: {}", cause.kind, cause.message)
        };
        Self {
            kind: ErrorKind::CompileError,
            message,
            location: cause.location,
            source_line: cause.source_line,
            suggestion: cause.suggestion,
            help: cause.help,
            note: cause.note,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidConfig, message, SourceLocation::unknown())
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message, SourceLocation::unknown())
    }

    /// Attaches the offending source line when the location is known
    pub fn with_source_from(self, source: &str) -> Self {
        if !self.location.is_known() || self.source_line.is_some() {
            return self;
        }
        match source.lines().nth(self.location.line - 1) {
            Some(line) => {
                let line = line.to_string();
                self.with_source(line)
            }
            None => self,
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind_str = format!("{}", self.kind);
        writeln!(f, "{}: {}", kind_str.red().bold(), self.message.bold())?;

        if self.location.is_known() {
            let location_str = format!("  --> {}", self.location);
            writeln!(f, "{}", location_str.bright_blue())?;
        }

        if let Some(ref source) = self.source_line {
            let line_num = self.location.line;
            let col_num = self.location.column;

            writeln!(f, "   {}", "|".bright_blue())?;
            writeln!(
                f,
                "{} {} {}",
                format!("{:3}", line_num).bright_blue(),
                "|".bright_blue(),
                source
            )?;
            writeln!(
                f,
                "   {} {}{}",
                "|".bright_blue(),
                " ".repeat(col_num.saturating_sub(1)),
                "^".red().bold()
            )?;
            writeln!(f, "   {}", "|".bright_blue())?;
        }

        if let Some(ref help) = self.help {
            writeln!(
                f,
                "   {} {}",
                "=".bright_yellow(),
                format!("help: {}", help).bright_yellow()
            )?;
        }

        if let Some(ref suggestion) = self.suggestion {
            writeln!(
                f,
                "   {} {}",
                "=".bright_green(),
                format!("Did you mean '{}'?", suggestion).bright_green()
            )?;
        }

        if let Some(ref note) = self.note {
            writeln!(f, "   {} {}", "=".bright_cyan(), format!("note: {}", note).bright_cyan())?;
        }

        Ok(())
    }
}

impl std::error::Error for AnalysisError {}

/// Computes the Levenshtein distance between two strings
/// Used for "Did you mean?" suggestions
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let s1_chars: Vec<char> = s1.chars().collect();
    let s2_chars: Vec<char> = s2.chars().collect();

    if s1_chars.is_empty() {
        return s2_chars.len();
    }
    if s2_chars.is_empty() {
        return s1_chars.len();
    }

    // Two rolling rows are enough
    let mut prev: Vec<usize> = (0..=s2_chars.len()).collect();
    let mut curr = vec![0; s2_chars.len() + 1];

    for (i, c1) in s1_chars.iter().enumerate() {
        curr[0] = i + 1;
        for (j, c2) in s2_chars.iter().enumerate() {
            let cost = usize::from(c1 != c2);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[s2_chars.len()]
}

/// Find the closest match from a list of candidates using Levenshtein distance
/// Returns None if no good match is found (distance > 3)
pub fn find_closest_match<'a>(target: &str, candidates: &'a [String]) -> Option<&'a str> {
    let mut best_match = None;
    let mut best_distance = usize::MAX;

    for candidate in candidates {
        let distance = levenshtein_distance(target, candidate);
        if distance <= 3 && distance < best_distance {
            best_distance = distance;
            best_match = Some(candidate.as_str());
        }
    }

    best_match
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("algoritmo", "algoritmo"), 0);
        assert_eq!(levenshtein_distance("algoritmo", "algorithm"), 2);
    }

    #[test]
    fn test_find_closest_match() {
        let names = vec!["helper".to_string(), "algorithm".to_string()];
        assert_eq!(find_closest_match("algoritmo", &names), Some("algorithm"));
        assert_eq!(find_closest_match("completely_different", &names), None);
    }

    #[test]
    fn test_compile_error_keeps_diagnostic() {
        let cause = AnalysisError::runtime_error("boom", SourceLocation::new(3, 5));
        let err = AnalysisError::compile_error(cause);
        assert_eq!(err.kind, ErrorKind::CompileError);
        assert_eq!(err.message, "Runtime Error: boom");
        assert_eq!(err.location, SourceLocation::new(3, 5));
    }

    #[test]
    fn test_with_source_from() {
        let source = "func algoritmo(n) {\n  return $\n}";
        let err = AnalysisError::parse_error("Unexpected character '$'", SourceLocation::new(2, 10))
            .with_source_from(source);
        assert_eq!(err.source_line.as_deref(), Some("  return $"));
        let rendered = err.to_string();
        assert!(rendered.contains("Unexpected character"));
        assert!(rendered.contains("2:10"));
    }
}
