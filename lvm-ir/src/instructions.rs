//! IR Instructions
//!
//! Operands are register slots of the enclosing function; block targets are
//! indices into the same function's block list and are not validated here.

use lvm_common::{BlockIndex, Slot};
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::{ArithOp, CalleeId, Cond};

/// Conditional transfer: `if operands[0] <cond> operands[1] goto to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub to: BlockIndex,
    pub cond: Cond,
    pub operands: [Slot; 2],
}

/// Unconditional transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jump {
    pub to: BlockIndex,
}

/// `save = source[0] <op> source[1]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArithmeticOp {
    pub op: ArithOp,
    pub save: Slot,
    pub source: [Slot; 2],
}

/// Call; arguments and results are matched to the callee's parameters and
/// results by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoke {
    pub callee: CalleeId,
    pub args: Vec<Slot>,
    pub results: Vec<Slot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Branch(Branch),
    Jump(Jump),
    Arithmetic(ArithmeticOp),
    Invoke(Invoke),
    /// Return the values held in the result registers
    Return,
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(self, Instruction::Jump(_) | Instruction::Return)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Branch(Branch { to, cond, operands: [a, b] }) => {
                write!(f, "br.{cond} %{a}, %{b}, bb{to}")
            }
            Instruction::Jump(Jump { to }) => write!(f, "jmp bb{to}"),
            Instruction::Arithmetic(ArithmeticOp { op, save, source: [a, b] }) => {
                write!(f, "%{save} = {op} %{a}, %{b}")
            }
            Instruction::Invoke(Invoke { callee, args, results }) => {
                for (i, r) in results.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "%{r}")?;
                }
                if !results.is_empty() {
                    write!(f, " = ")?;
                }
                write!(f, "invoke {callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "%{arg}")?;
                }
                write!(f, ")")
            }
            Instruction::Return => write!(f, "ret"),
        }
    }
}
