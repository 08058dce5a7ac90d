//! Type Model
//!
//! Defines the closed set of type variants. Composite types refer to their
//! components by `TypeId`, an index into the owning `TypeTable`; identity and
//! signatures are resolved through the table.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::{BasicType, TypeSignature};

/// Stable index of a type inside its `TypeTable`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A named slot: struct field, parameter or result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
}

impl Field {
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self { name: name.into(), ty }
    }
}

/// Flavour of a pointer type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerKind {
    /// Never null, always checked
    #[default]
    Safe,
    /// Raw pointer, never checked
    Unsafe,
    /// May be null. When `checked` is true the dangling pointer checker
    /// is NOT applied.
    Nullable { checked: bool },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointerType {
    pub kind: PointerKind,
    pub pointee: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayType {
    pub element: TypeId,
    pub capacity: u64,
}

/// Record type. Embedding itself by value (directly or transitively) is
/// rejected by `TypeTable::add_field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredType {
    pub name: String,
    pub fields: Vec<Field>,
    /// Concatenation of the field signatures, grown as fields are added
    pub signature: TypeSignature,
}

impl StructuredType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            signature: TypeSignature::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncType {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
}

impl FuncType {
    pub fn new(params: Vec<Field>, results: Vec<Field>) -> Self {
        Self { params, results }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncPrototype {
    pub name: String,
    pub ty: FuncType,
}

/// A named set of method prototypes, realized as a function-pointer table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuncTrait {
    pub name: String,
    pub prototypes: Vec<FuncPrototype>,
}

impl FuncTrait {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), prototypes: Vec::new() }
    }

    pub fn with_prototype(mut self, name: impl Into<String>, ty: FuncType) -> Self {
        self.prototypes.push(FuncPrototype { name: name.into(), ty });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeAlias {
    pub name: String,
    pub target: TypeId,
}

/// Type Model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Type {
    Basic(BasicType),
    Pointer(PointerType),
    Array(ArrayType),
    Structured(StructuredType),
    Func(FuncType),
    Trait(FuncTrait),
    Alias(TypeAlias),
}

impl Type {
    pub fn pointer(pointee: TypeId) -> Self {
        Type::Pointer(PointerType { kind: PointerKind::Safe, pointee })
    }

    pub fn unsafe_pointer(pointee: TypeId) -> Self {
        Type::Pointer(PointerType { kind: PointerKind::Unsafe, pointee })
    }

    pub fn nullable_pointer(pointee: TypeId, checked: bool) -> Self {
        Type::Pointer(PointerType { kind: PointerKind::Nullable { checked }, pointee })
    }

    pub fn array(element: TypeId, capacity: u64) -> Self {
        Type::Array(ArrayType { element, capacity })
    }

    pub fn alias(name: impl Into<String>, target: TypeId) -> Self {
        Type::Alias(TypeAlias { name: name.into(), target })
    }

    /// Name under which the type is registered, for nominal variants
    pub fn name(&self) -> Option<&str> {
        match self {
            Type::Structured(s) => Some(&s.name),
            Type::Trait(t) => Some(&t.name),
            Type::Alias(a) => Some(&a.name),
            Type::Basic(_) | Type::Pointer(_) | Type::Array(_) | Type::Func(_) => None,
        }
    }

    /// Variant name, for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Type::Basic(_) => "basic",
            Type::Pointer(_) => "pointer",
            Type::Array(_) => "array",
            Type::Structured(_) => "struct",
            Type::Func(_) => "func",
            Type::Trait(_) => "trait",
            Type::Alias(_) => "alias",
        }
    }

    /// Type ids this type refers to directly
    pub fn referenced(&self) -> Vec<TypeId> {
        match self {
            Type::Basic(_) => Vec::new(),
            Type::Pointer(p) => vec![p.pointee],
            Type::Array(a) => vec![a.element],
            Type::Structured(s) => s.fields.iter().map(|f| f.ty).collect(),
            Type::Func(f) => func_refs(f),
            Type::Trait(t) => t.prototypes.iter().flat_map(|p| func_refs(&p.ty)).collect(),
            Type::Alias(a) => vec![a.target],
        }
    }
}

fn func_refs(func: &FuncType) -> Vec<TypeId> {
    func.params.iter().chain(&func.results).map(|f| f.ty).collect()
}
