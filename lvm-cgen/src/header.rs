//! Header assembly
//!
//! Order is load-bearing for forward references and must stay exactly:
//! include guard and `<stdint.h>`, forward tags for every struct and trait,
//! their bodies, then one prototype per compiled function. Each group keeps
//! input order.

use log::trace;
use lvm_ir::{Field, Type, TypeId};
use std::collections::HashSet;
use std::fmt::Write;
use crate::{CGenerator, CodegenError};

impl<'m> CGenerator<'m> {
    pub fn generate_header(&self) -> Result<String, CodegenError> {
        let mut out = String::new();
        writeln!(out, "#pragma once")?;
        writeln!(out, "#include <stdint.h>")?;

        for (_, ty) in self.types().iter() {
            match ty {
                Type::Structured(s) => writeln!(out, "struct {};", s.name)?,
                Type::Trait(t) => writeln!(out, "struct {};", t.name)?,
                Type::Basic(_) | Type::Pointer(_) | Type::Array(_) | Type::Func(_) | Type::Alias(_) => {}
            }
        }

        let mut complete = HashSet::new();
        for (id, ty) in self.types().iter() {
            match ty {
                Type::Structured(s) => {
                    for field in &s.fields {
                        self.check_complete(&s.name, field, &complete)?;
                    }
                    trace!("struct body {}", s.name);
                    writeln!(out, "{};", self.struct_body(s)?)?;
                    complete.insert(id);
                }
                Type::Trait(t) => {
                    trace!("trait body {}", t.name);
                    writeln!(out, "{};", self.trait_body(t)?)?;
                    complete.insert(id);
                }
                Type::Basic(_) | Type::Pointer(_) | Type::Array(_) | Type::Func(_) | Type::Alias(_) => {}
            }
        }

        // prototypes name parameters the way the definitions do
        for func in self.module.impls() {
            writeln!(out, "{};", self.function_declarator(&self.definition_params(&func.ty), &func.name)?)?;
        }
        Ok(out)
    }

    /// A field held by value needs the complete body of its struct type;
    /// C rejects incomplete types there.
    fn check_complete(
        &self,
        structure: &str,
        field: &Field,
        complete: &HashSet<TypeId>,
    ) -> Result<(), CodegenError> {
        let mut ty = self.types().resolve_alias(field.ty)?;
        // arrays hold their elements by value
        while let Type::Array(array) = self.types().get(ty)? {
            ty = self.types().resolve_alias(array.element)?;
        }
        match self.types().get(ty)? {
            Type::Structured(_) | Type::Trait(_) if !complete.contains(&ty) => Err(CodegenError::BodyOrder {
                structure: structure.to_string(),
                needs: self.types().identify(ty)?,
            }),
            Type::Structured(_) | Type::Trait(_) | Type::Basic(_) | Type::Pointer(_)
            | Type::Array(_) | Type::Func(_) | Type::Alias(_) => Ok(()),
        }
    }
}
