// File: src/interpreter/control_flow.rs
//
// Control flow signals for loop statements and early returns.
//
// Statement evaluation returns a ControlFlow so break/continue/return unwind
// through nested blocks without using errors for ordinary control transfer.

use super::value::Value;

/// Outcome of evaluating a statement or a block
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ControlFlow {
    /// Normal execution, continue to next statement
    None,
    /// Break statement encountered, exit the innermost loop
    Break,
    /// Continue statement encountered, skip to next loop iteration
    Continue,
    /// Return statement encountered, unwind to the enclosing call
    Return(Value),
}
