//! LangVM C Backend - Type Model and Intermediate Representation
//! 
//! This crate defines the values the front-end hands to the C generator:
//! 
//! - `basic` - primitive type codes and their bands
//! - `signature` - flattened type signatures
//! - `types` - the closed set of type variants
//! - `table` - the type arena with the recursive-embedding check
//! - `ops`, `instructions`, `blocks` - basic-block IR
//! - `callee` - native, inline and compiled functions
//! - `module` - a complete compilation unit

pub use self::basic::BasicType;
pub use self::signature::TypeSignature;
pub use self::types::{
    ArrayType, Field, FuncPrototype, FuncTrait, FuncType, PointerKind, PointerType,
    StructuredType, Type, TypeAlias, TypeId,
};
pub use self::table::{TypeError, TypeTable};
pub use self::ops::{ArithOp, Cond};
pub use self::instructions::{ArithmeticOp, Branch, Instruction, Invoke, Jump};
pub use self::blocks::BasicBlock;
pub use self::callee::{Callee, CalleeId, FuncBody, FuncImpl, FuncInline, NativeFunc};
pub use self::module::{Module, ModuleError};
pub use lvm_common::{BlockIndex, Slot};

mod basic;
mod signature;
mod types;
mod table;
mod ops;
mod instructions;
mod blocks;
mod callee;
mod module;
