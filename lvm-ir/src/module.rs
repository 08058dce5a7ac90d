//! Module
//!
//! A complete compilation unit: the type arena plus every callee, both in
//! the order the front-end produced them.

use lvm_common::TargetConfig;
use std::collections::HashMap;
use std::fmt::{self, Write};
use thiserror::Error;
use crate::{Callee, CalleeId, FuncImpl, FuncType, TypeError, TypeTable};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModuleError {
    #[error("callee '{0}' is already defined")]
    DuplicateCallee(String),

    #[error("callee '{callee}': {source}")]
    BadSignature {
        callee: String,
        #[source]
        source: TypeError,
    },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("formatting failed")]
    Format(#[from] fmt::Error),
}

impl From<ModuleError> for lvm_common::CompilerError {
    fn from(err: ModuleError) -> Self {
        lvm_common::CompilerError::type_error(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub types: TypeTable,
    callees: Vec<Callee>,
    callee_names: HashMap<String, CalleeId>,
}

impl Module {
    pub fn new(name: impl Into<String>, target: TargetConfig) -> Self {
        Self {
            name: name.into(),
            types: TypeTable::new(target),
            callees: Vec::new(),
            callee_names: HashMap::new(),
        }
    }

    /// Id the next `add_callee` will return, for self-recursive bodies
    pub fn next_callee_id(&self) -> CalleeId {
        CalleeId(self.callees.len() as u32)
    }

    /// Register a callee. Its function type and register types must refer
    /// to existing types.
    pub fn add_callee(&mut self, callee: Callee) -> Result<CalleeId, ModuleError> {
        let name = callee.identify().to_string();
        if self.callee_names.contains_key(&name) {
            return Err(ModuleError::DuplicateCallee(name));
        }
        let mut referenced = field_types(callee.func_type());
        if let Some(body) = callee.body() {
            referenced.extend(body.registers.iter().copied());
        }
        for ty in referenced {
            if let Err(source) = self.types.get(ty) {
                return Err(ModuleError::BadSignature { callee: name, source });
            }
        }

        let id = self.next_callee_id();
        log::trace!("callee {} = {}", id, name);
        self.callees.push(callee);
        self.callee_names.insert(name, id);
        Ok(id)
    }

    pub fn callee(&self, id: CalleeId) -> Option<&Callee> {
        self.callees.get(id.index())
    }

    pub fn lookup_callee(&self, name: &str) -> Option<CalleeId> {
        self.callee_names.get(name).copied()
    }

    /// Every callee in input order
    pub fn callees(&self) -> impl Iterator<Item = (CalleeId, &Callee)> {
        self.callees
            .iter()
            .enumerate()
            .map(|(i, c)| (CalleeId(i as u32), c))
    }

    /// Compiled functions in input order
    pub fn impls(&self) -> impl Iterator<Item = &FuncImpl> {
        self.callees.iter().filter_map(|c| match c {
            Callee::Impl(f) => Some(f),
            Callee::Native(_) | Callee::Inline(_) => None,
        })
    }

    /// Human-readable listing of the types and function bodies
    pub fn dump(&self) -> Result<String, ModuleError> {
        let mut out = String::new();
        writeln!(out, "module {}", self.name)?;
        for (id, ty) in self.types.iter() {
            writeln!(out, "type {} {} = {} {}", id, self.types.identify(id)?, ty.kind(), self.types.signature(id)?)?;
        }
        for (id, callee) in self.callees() {
            let kind = match callee {
                Callee::Native(n) => format!("native \"{}\"", n.symbol),
                Callee::Inline(_) => "inline".to_string(),
                Callee::Impl(_) => "impl".to_string(),
            };
            writeln!(out, "{} {} {}", kind, id, callee.identify())?;
            if let Some(body) = callee.body() {
                for (slot, ty) in body.registers.iter().enumerate() {
                    writeln!(out, "  %{}: {}", slot, self.types.identify(*ty)?)?;
                }
                for (index, block) in body.blocks.iter().enumerate() {
                    writeln!(out, "bb{index}:")?;
                    for instr in &block.instructions {
                        writeln!(out, "  {instr}")?;
                    }
                }
            }
        }
        Ok(out)
    }
}

fn field_types(func: &FuncType) -> Vec<crate::TypeId> {
    func.params.iter().chain(&func.results).map(|f| f.ty).collect()
}
