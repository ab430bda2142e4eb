// File: src/ast.rs
//
// Abstract Syntax Tree (AST) definitions for Ruff candidate scripts.
//
// Expressions (Expr) represent values and computations, while Statements (Stmt)
// represent actions and control flow. Nodes that can fail at runtime carry the
// source location of the token that produced them.

use crate::errors::SourceLocation;
use std::sync::Arc;

/// Represents an expression - something that evaluates to a value
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Identifier(String, SourceLocation),
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
    Null,
    ArrayLiteral(Vec<Expr>),
    UnaryOp {
        op: String,
        operand: Box<Expr>,
    },
    BinaryOp {
        left: Box<Expr>,
        op: String,
        right: Box<Expr>,
        location: SourceLocation,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
        location: SourceLocation,
    },
    IndexAccess {
        object: Box<Expr>,
        index: Box<Expr>,
        location: SourceLocation,
    },
}

/// A user-defined function. Bodies are shared so calls never copy the tree.
#[derive(Debug, PartialEq)]
pub struct FuncDef {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub location: SourceLocation,
}

/// Represents a statement - an action or declaration
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        name: String,
        value: Expr,
        mutable: bool,
    },
    /// `target := value` where target is an identifier or an index expression
    Assign {
        target: Expr,
        value: Expr,
    },
    FuncDef(Arc<FuncDef>),
    ExprStmt(Expr),
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    /// `loop { }` or `loop while cond { }`
    Loop {
        condition: Option<Expr>,
        body: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    For {
        var: String,
        iterable: Expr,
        body: Vec<Stmt>,
    },
    Break,
    Continue,
    TryExcept {
        try_block: Vec<Stmt>,
        except_var: String,
        except_block: Vec<Stmt>,
    },
}

impl Stmt {
    /// Returns the nested statement blocks of a compound statement
    pub fn blocks(&self) -> Vec<&[Stmt]> {
        match self {
            Stmt::If { then_branch, else_branch, .. } => {
                let mut blocks = vec![then_branch.as_slice()];
                if let Some(else_branch) = else_branch {
                    blocks.push(else_branch.as_slice());
                }
                blocks
            }
            Stmt::Loop { body, .. } | Stmt::While { body, .. } | Stmt::For { body, .. } => {
                vec![body.as_slice()]
            }
            Stmt::TryExcept { try_block, except_block, .. } => {
                vec![try_block.as_slice(), except_block.as_slice()]
            }
            Stmt::FuncDef(def) => vec![def.body.as_slice()],
            _ => Vec::new(),
        }
    }

    /// True for the iteration constructs (`loop`, `while`, `for`)
    pub fn is_loop(&self) -> bool {
        matches!(self, Stmt::Loop { .. } | Stmt::While { .. } | Stmt::For { .. })
    }

    /// Expressions evaluated directly by this statement (not by nested blocks)
    pub fn exprs(&self) -> Vec<&Expr> {
        match self {
            Stmt::Let { value, .. } => vec![value],
            Stmt::Assign { target, value } => vec![target, value],
            Stmt::ExprStmt(expr) => vec![expr],
            Stmt::Return(Some(expr)) => vec![expr],
            Stmt::If { condition, .. } | Stmt::While { condition, .. } => vec![condition],
            Stmt::Loop { condition: Some(condition), .. } => vec![condition],
            Stmt::For { iterable, .. } => vec![iterable],
            _ => Vec::new(),
        }
    }
}

impl Expr {
    /// Names of every function called anywhere inside this expression
    pub fn called_functions(&self, out: &mut Vec<String>) {
        match self {
            Expr::Call { callee, args, .. } => {
                out.push(callee.clone());
                for arg in args {
                    arg.called_functions(out);
                }
            }
            Expr::ArrayLiteral(items) => {
                for item in items {
                    item.called_functions(out);
                }
            }
            Expr::UnaryOp { operand, .. } => operand.called_functions(out),
            Expr::BinaryOp { left, right, .. } => {
                left.called_functions(out);
                right.called_functions(out);
            }
            Expr::IndexAccess { object, index, .. } => {
                object.called_functions(out);
                index.called_functions(out);
            }
            _ => {}
        }
    }
}
