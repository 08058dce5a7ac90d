//! Callees
//!
//! Anything invocable: a native function linked from outside, an inline-only
//! function expanded at every call site, or a compiled function.
//! Inline functions must not reach themselves through `Invoke`; expansion
//! has no way to terminate such a cycle.

use lvm_common::Slot;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::{BasicBlock, FuncType, TypeId};

/// Index of a callee inside its `Module`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CalleeId(pub(crate) u32);

impl CalleeId {
    /// Id of the callee at `index` in insertion order, for references to
    /// callees not yet added
    pub fn new(index: u32) -> Self {
        CalleeId(index)
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CalleeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Register file and blocks of a function with a body.
///
/// Registers `0..P` hold the parameters, `P..P+R` the results, the rest
/// are scratch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncBody {
    pub registers: Vec<TypeId>,
    pub blocks: Vec<BasicBlock>,
}

impl FuncBody {
    pub fn new(registers: Vec<TypeId>, blocks: Vec<BasicBlock>) -> Self {
        Self { registers, blocks }
    }

    pub fn register(&self, slot: Slot) -> Option<TypeId> {
        self.registers.get(slot as usize).copied()
    }
}

/// External function implemented in C, called through its link symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeFunc {
    pub name: String,
    pub ty: FuncType,
    pub symbol: String,
}

/// Inline-only function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncInline {
    pub name: String,
    pub ty: FuncType,
    pub body: FuncBody,
}

/// Compiled function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncImpl {
    pub name: String,
    pub ty: FuncType,
    pub body: FuncBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Callee {
    Native(NativeFunc),
    Inline(FuncInline),
    Impl(FuncImpl),
}

impl Callee {
    pub fn identify(&self) -> &str {
        match self {
            Callee::Native(f) => &f.name,
            Callee::Inline(f) => &f.name,
            Callee::Impl(f) => &f.name,
        }
    }

    pub fn func_type(&self) -> &FuncType {
        match self {
            Callee::Native(f) => &f.ty,
            Callee::Inline(f) => &f.ty,
            Callee::Impl(f) => &f.ty,
        }
    }

    /// Blocks and registers; natives have none
    pub fn body(&self) -> Option<&FuncBody> {
        match self {
            Callee::Native(_) => None,
            Callee::Inline(f) => Some(&f.body),
            Callee::Impl(f) => Some(&f.body),
        }
    }
}
