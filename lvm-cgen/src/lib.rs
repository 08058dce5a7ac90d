//! LangVM C Backend - C Source Generation
//! 
//! This crate turns a `Module` into C99 source. It includes:
//! 
//! - Declarator synthesis for every type variant
//! - Header assembly in forward-reference order
//! - Lowering of function bodies to labels and `goto`
//! - Atomic output of the generated files

pub mod error;
pub mod names;
pub mod emit;
mod generator;
mod decl;
mod header;
mod body;

pub use error::CodegenError;
pub use emit::{write_all_atomic, write_atomic, CUnit};
pub use generator::CGenerator;

use lvm_ir::Module;

/// Main entry point for C generation
pub fn generate_c(module: &Module) -> Result<CUnit, CodegenError> {
    CGenerator::new(module).generate()
}

#[cfg(test)]
mod tests;
