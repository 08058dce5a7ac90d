//! IR Operations
//!
//! Branch conditions and arithmetic operators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Branch condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cond {
    Eq,
    Neq,
    LtEq,
    Lt,
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cond_str = match self {
            Cond::Eq => "eq",
            Cond::Neq => "neq",
            Cond::LtEq => "lteq",
            Cond::Lt => "lt",
        };
        write!(f, "{cond_str}")
    }
}

/// Arithmetic operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            ArithOp::Add => "add",
            ArithOp::Sub => "sub",
            ArithOp::Mul => "mul",
            ArithOp::Div => "div",
        };
        write!(f, "{op_str}")
    }
}
