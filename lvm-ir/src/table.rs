//! Type Arena
//!
//! Owns every type of a module in insertion order. Insertion order is the
//! "input order" the C generator preserves, and a type can only refer to
//! types inserted before it, with one exception: fields are added to a
//! declared structure later, which is where recursive embedding is checked.

use log::{debug, trace};
use lvm_common::TargetConfig;
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;
use crate::{BasicType, Field, FuncType, StructuredType, Type, TypeId, TypeSignature};

/// Errors raised while building the type model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("unknown type id {0}")]
    UnknownType(TypeId),

    #[error("type name '{0}' is already defined")]
    DuplicateName(String),

    #[error("type {id} is a {kind}, expected a struct")]
    NotAStruct { id: TypeId, kind: &'static str },

    #[error("struct '{structure}' already has a field named '{field}'")]
    DuplicateField { structure: String, field: String },

    #[error("field '{field}' would embed struct '{structure}' in itself (via {})", path.join(" -> "))]
    RecursiveEmbedding {
        structure: String,
        field: String,
        path: Vec<String>,
    },
}

impl From<TypeError> for lvm_common::CompilerError {
    fn from(err: TypeError) -> Self {
        lvm_common::CompilerError::type_error(err.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    target: TargetConfig,
    types: Vec<Type>,
    names: HashMap<String, TypeId>,
    basics: HashMap<BasicType, TypeId>,
}

impl TypeTable {
    pub fn new(target: TargetConfig) -> Self {
        Self {
            target,
            types: Vec::new(),
            names: HashMap::new(),
            basics: HashMap::new(),
        }
    }

    pub fn target(&self) -> TargetConfig {
        self.target
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All types in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (TypeId, &Type)> {
        self.types
            .iter()
            .enumerate()
            .map(|(i, ty)| (TypeId(i as u32), ty))
    }

    pub fn get(&self, id: TypeId) -> Result<&Type, TypeError> {
        self.types.get(id.index()).ok_or(TypeError::UnknownType(id))
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.names.get(name).copied()
    }

    /// Insert a type. Referenced ids must already exist. A structured type
    /// is inserted field by field so its signature is always derived here.
    pub fn add(&mut self, ty: Type) -> Result<TypeId, TypeError> {
        for referenced in ty.referenced() {
            self.get(referenced)?;
        }

        let ty = match ty {
            Type::Structured(structure) => return self.add_structured(structure),
            Type::Basic(basic) => return Ok(self.basic(basic)),
            other => other,
        };

        if let Some(name) = ty.name() {
            if self.names.contains_key(name) {
                return Err(TypeError::DuplicateName(name.to_string()));
            }
        }
        Ok(self.push(ty))
    }

    fn add_structured(&mut self, structure: StructuredType) -> Result<TypeId, TypeError> {
        {
            let mut seen = HashSet::new();
            for field in &structure.fields {
                if !seen.insert(field.name.as_str()) {
                    return Err(TypeError::DuplicateField {
                        structure: structure.name.clone(),
                        field: field.name.clone(),
                    });
                }
            }
        }
        let id = self.declare_struct(structure.name)?;
        for field in structure.fields {
            self.add_field(id, field)?;
        }
        Ok(id)
    }

    /// Interned basic type
    pub fn basic(&mut self, basic: BasicType) -> TypeId {
        if let Some(&id) = self.basics.get(&basic) {
            return id;
        }
        let id = self.push(Type::Basic(basic));
        self.basics.insert(basic, id);
        id
    }

    /// Register an empty structured type; fields follow via `add_field`.
    pub fn declare_struct(&mut self, name: impl Into<String>) -> Result<TypeId, TypeError> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(TypeError::DuplicateName(name));
        }
        Ok(self.push(Type::Structured(StructuredType::new(name))))
    }

    /// Append a field to a declared structure.
    ///
    /// Rejected without modifying the structure when the field type reaches
    /// the structure by value. Pointers, arrays, function types and traits
    /// are indirections and stop the search.
    pub fn add_field(&mut self, structure: TypeId, field: Field) -> Result<(), TypeError> {
        let name = match self.get(structure)? {
            Type::Structured(s) => {
                if s.field(&field.name).is_some() {
                    return Err(TypeError::DuplicateField {
                        structure: s.name.clone(),
                        field: field.name,
                    });
                }
                s.name.clone()
            }
            other => return Err(TypeError::NotAStruct { id: structure, kind: other.kind() }),
        };
        self.get(field.ty)?;

        let mut visited = HashSet::new();
        let mut path = Vec::new();
        if self.reaches(field.ty, structure, &mut visited, &mut path)? {
            debug!("rejected field '{}' of struct '{}': recursive embedding", field.name, name);
            return Err(TypeError::RecursiveEmbedding {
                structure: name,
                field: field.name,
                path,
            });
        }

        let field_signature = self.signature(field.ty)?;
        trace!("struct '{}' += field '{}' {}", name, field.name, field_signature);
        if let Some(Type::Structured(s)) = self.types.get_mut(structure.index()) {
            s.signature.extend(&field_signature);
            s.fields.push(field);
        }
        Ok(())
    }

    /// Depth-first search over by-value edges. On success `path` holds the
    /// names of the nominal types walked, ending with the target.
    fn reaches(
        &self,
        from: TypeId,
        target: TypeId,
        visited: &mut HashSet<TypeId>,
        path: &mut Vec<String>,
    ) -> Result<bool, TypeError> {
        let ty = self.get(from)?;
        if let Some(name) = ty.name() {
            path.push(name.to_string());
        }
        if from == target {
            return Ok(true);
        }
        if visited.insert(from) {
            let next: Vec<TypeId> = match ty {
                Type::Structured(s) => s.fields.iter().map(|f| f.ty).collect(),
                Type::Alias(a) => vec![a.target],
                Type::Basic(_) | Type::Pointer(_) | Type::Array(_) | Type::Func(_) | Type::Trait(_) => Vec::new(),
            };
            for id in next {
                if self.reaches(id, target, visited, path)? {
                    return Ok(true);
                }
            }
        }
        if ty.name().is_some() {
            path.pop();
        }
        Ok(false)
    }

    /// Names of every structure embedded by value, transitively
    pub fn recorded_types(&self, id: TypeId) -> Result<BTreeSet<String>, TypeError> {
        let mut recorded = BTreeSet::new();
        let mut stack = vec![id];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            match self.get(current)? {
                Type::Structured(s) => {
                    if current != id {
                        recorded.insert(s.name.clone());
                    }
                    stack.extend(s.fields.iter().map(|f| f.ty));
                }
                Type::Alias(a) => stack.push(a.target),
                Type::Basic(_) | Type::Pointer(_) | Type::Array(_) | Type::Func(_) | Type::Trait(_) => {}
            }
        }
        Ok(recorded)
    }

    /// Follow alias chains to the underlying type
    pub fn resolve_alias(&self, mut id: TypeId) -> Result<TypeId, TypeError> {
        while let Type::Alias(alias) = self.get(id)? {
            id = alias.target;
        }
        Ok(id)
    }

    /// Stable display identifier
    pub fn identify(&self, id: TypeId) -> Result<String, TypeError> {
        Ok(match self.get(id)? {
            Type::Basic(b) => b.identify().to_string(),
            Type::Pointer(p) => format!("ptrOf_{}", self.identify(p.pointee)?),
            Type::Array(a) => format!("arrOf_{}_{:x}", self.identify(a.element)?, a.capacity),
            Type::Structured(s) => s.name.clone(),
            Type::Func(f) => self.identify_func(f)?,
            Type::Trait(t) => t.name.clone(),
            Type::Alias(a) => a.name.clone(),
        })
    }

    fn identify_func(&self, func: &FuncType) -> Result<String, TypeError> {
        let join = |fields: &[Field]| -> Result<String, TypeError> {
            let ids = fields
                .iter()
                .map(|f| self.identify(f.ty))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids.join("_"))
        };
        Ok(format!("funcOf_{}__{}", join(&func.params)?, join(&func.results)?))
    }

    /// Flattened signature. Structured types return their stored
    /// signature, so the recursion always bottoms out.
    pub fn signature(&self, id: TypeId) -> Result<TypeSignature, TypeError> {
        let uptr = BasicType::uptr(self.target.pointer_width);
        Ok(match self.get(id)? {
            Type::Basic(b) => TypeSignature::of_basic(*b),
            Type::Pointer(p) => TypeSignature::pointer(uptr, &self.signature(p.pointee)?),
            // arrays decay to the address of their first element
            Type::Array(a) => TypeSignature::pointer(uptr, &self.signature(a.element)?),
            Type::Structured(s) => s.signature.clone(),
            Type::Func(_) => TypeSignature::pointer(uptr, &TypeSignature::new()),
            Type::Trait(t) => {
                let mut sig = TypeSignature::new();
                for _ in &t.prototypes {
                    sig.extend(&TypeSignature::pointer(uptr, &TypeSignature::new()));
                }
                sig
            }
            Type::Alias(a) => self.signature(a.target)?,
        })
    }

    fn push(&mut self, ty: Type) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        if let Some(name) = ty.name() {
            self.names.insert(name.to_string(), id);
        }
        trace!("type {} = {} {}", id, ty.kind(), ty.name().unwrap_or(""));
        self.types.push(ty);
        id
    }
}
