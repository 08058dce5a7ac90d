//! Basic Block Management

use serde::{Deserialize, Serialize};
use crate::Instruction;

/// Straight-line instruction sequence, addressed by its index in the
/// owning function
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new() -> Self {
        Self { instructions: Vec::new() }
    }

    pub fn with_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn add_instruction(&mut self, instr: Instruction) {
        self.instructions.push(instr);
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Whether control never falls through to the next block
    pub fn has_terminator(&self) -> bool {
        self.instructions.last().is_some_and(Instruction::is_terminator)
    }
}
