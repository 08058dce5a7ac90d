//! C Generator
//!
//! Walks a `Module` and produces one translation unit. The generator holds
//! nothing but a borrow of its input, so generating twice yields the same
//! text.

use log::debug;
use lvm_ir::{Module, TypeTable};
use crate::{CUnit, CodegenError};

pub struct CGenerator<'m> {
    pub(crate) module: &'m Module,
}

impl<'m> CGenerator<'m> {
    pub fn new(module: &'m Module) -> Self {
        Self { module }
    }

    pub(crate) fn types(&self) -> &'m TypeTable {
        &self.module.types
    }

    /// Header followed by function bodies; any error aborts the whole unit
    pub fn generate(&self) -> Result<CUnit, CodegenError> {
        debug!("generating C for module '{}' ({} types)", self.module.name, self.types().len());
        let header = self.generate_header()?;
        let body = self.generate_body()?;
        debug!("generated {} header bytes, {} body bytes", header.len(), body.len());
        Ok(CUnit { header, body })
    }
}
