//! JSON module descriptions
//!
//! Reads the description the front-end emits and builds a `Module` from it.
//! Every struct name is declared before any field is added, so structs may
//! point at themselves and at each other regardless of order.

use log::{debug, trace};
use lvm_common::{CompilerError, PointerWidth, TargetConfig};
use lvm_ir::{
    ArithOp, ArithmeticOp, BasicBlock, BasicType, Branch, Callee, CalleeId, Cond, Field, FuncBody,
    FuncImpl, FuncInline, FuncTrait, FuncType, Instruction, Invoke, Jump, Module, ModuleError,
    NativeFunc, PointerKind, PointerType, Slot, Type, TypeError, TypeId,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid module description: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unknown type '{0}'")]
    UnknownType(String),

    #[error("unknown callee '{0}'")]
    UnknownCallee(String),

    #[error("duplicate callee '{0}'")]
    DuplicateCallee(String),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error(transparent)]
    Module(#[from] ModuleError),
}

impl From<LoadError> for CompilerError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Read { path, source } => CompilerError::IoError {
                message: format!("{path}: {source}"),
            },
            other => CompilerError::load_error(other.to_string()),
        }
    }
}

/// A type written in a description: a basic mnemonic or declared name, or
/// an anonymous composite.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeRef {
    Named(String),
    Pointer {
        ptr: Box<TypeRef>,
        #[serde(default)]
        kind: PointerKindDesc,
    },
    Array {
        array: Box<TypeRef>,
        capacity: u64,
    },
    Func {
        func: SignatureDesc,
    },
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerKindDesc {
    #[default]
    Safe,
    Unsafe,
    Nullable,
    Checked,
}

impl From<PointerKindDesc> for PointerKind {
    fn from(kind: PointerKindDesc) -> Self {
        match kind {
            PointerKindDesc::Safe => PointerKind::Safe,
            PointerKindDesc::Unsafe => PointerKind::Unsafe,
            PointerKindDesc::Nullable => PointerKind::Nullable { checked: false },
            PointerKindDesc::Checked => PointerKind::Nullable { checked: true },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDesc {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignatureDesc {
    #[serde(default)]
    pub params: Vec<FieldDesc>,
    #[serde(default)]
    pub results: Vec<FieldDesc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrototypeDesc {
    pub name: String,
    #[serde(flatten)]
    pub signature: SignatureDesc,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeDecl {
    Struct {
        name: String,
        #[serde(default)]
        fields: Vec<FieldDesc>,
    },
    Trait {
        name: String,
        #[serde(default)]
        prototypes: Vec<PrototypeDesc>,
    },
    Alias {
        name: String,
        target: TypeRef,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum InstrDesc {
    Add { save: Slot, source: [Slot; 2] },
    Sub { save: Slot, source: [Slot; 2] },
    Mul { save: Slot, source: [Slot; 2] },
    Div { save: Slot, source: [Slot; 2] },
    Br { to: u32, cond: Cond, operands: [Slot; 2] },
    Jmp { to: u32 },
    Invoke {
        callee: String,
        #[serde(default)]
        args: Vec<Slot>,
        #[serde(default)]
        results: Vec<Slot>,
    },
    Ret,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BodyDesc {
    #[serde(default)]
    pub registers: Vec<TypeRef>,
    #[serde(default)]
    pub blocks: Vec<Vec<InstrDesc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CalleeDecl {
    Native {
        name: String,
        symbol: String,
        #[serde(flatten)]
        signature: SignatureDesc,
    },
    Inline {
        name: String,
        #[serde(flatten)]
        signature: SignatureDesc,
        #[serde(flatten)]
        body: BodyDesc,
    },
    Impl {
        name: String,
        #[serde(flatten)]
        signature: SignatureDesc,
        #[serde(flatten)]
        body: BodyDesc,
    },
}

impl CalleeDecl {
    fn name(&self) -> &str {
        match self {
            CalleeDecl::Native { name, .. } | CalleeDecl::Inline { name, .. } | CalleeDecl::Impl { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDesc {
    pub name: String,
    #[serde(default)]
    pub target: TargetConfig,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
    #[serde(default)]
    pub callees: Vec<CalleeDecl>,
}

/// Read and build a module; `pointer_width` overrides the description's
/// target.
pub fn load_module(path: &Path, pointer_width: Option<PointerWidth>) -> Result<Module, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.display().to_string(),
        source,
    })?;
    load_str(&text, pointer_width)
}

pub fn load_str(text: &str, pointer_width: Option<PointerWidth>) -> Result<Module, LoadError> {
    let mut desc: ModuleDesc = serde_json::from_str(text)?;
    if let Some(width) = pointer_width {
        desc.target.pointer_width = width;
    }
    build_module(&desc)
}

pub fn build_module(desc: &ModuleDesc) -> Result<Module, LoadError> {
    debug!(
        "building module '{}': {} type declarations, {} callees, {}-byte pointers",
        desc.name,
        desc.types.len(),
        desc.callees.len(),
        desc.target.pointer_width
    );
    let mut module = Module::new(desc.name.clone(), desc.target);

    for decl in &desc.types {
        if let TypeDecl::Struct { name, .. } = decl {
            module.types.declare_struct(name.clone())?;
        }
    }
    for decl in &desc.types {
        match decl {
            TypeDecl::Struct { name, fields } => {
                let id = module.types.lookup(name).ok_or_else(|| LoadError::UnknownType(name.clone()))?;
                for field in fields {
                    let field = resolve_field(&mut module, field)?;
                    module.types.add_field(id, field)?;
                }
            }
            TypeDecl::Trait { name, prototypes } => {
                let mut func_trait = FuncTrait::new(name.clone());
                for prototype in prototypes {
                    let ty = resolve_signature(&mut module, &prototype.signature)?;
                    func_trait = func_trait.with_prototype(prototype.name.clone(), ty);
                }
                module.types.add(Type::Trait(func_trait))?;
            }
            TypeDecl::Alias { name, target } => {
                let target = resolve_type(&mut module, target)?;
                module.types.add(Type::alias(name.clone(), target))?;
            }
        }
    }

    let mut callee_ids = HashMap::new();
    for (index, decl) in desc.callees.iter().enumerate() {
        if callee_ids.insert(decl.name(), CalleeId::new(index as u32)).is_some() {
            return Err(LoadError::DuplicateCallee(decl.name().to_string()));
        }
    }
    for decl in &desc.callees {
        let callee = build_callee(&mut module, decl, &callee_ids)?;
        let id = module.add_callee(callee)?;
        trace!("callee {} = {}", decl.name(), id);
    }
    Ok(module)
}

fn resolve_type(module: &mut Module, ty: &TypeRef) -> Result<TypeId, LoadError> {
    match ty {
        TypeRef::Named(name) => match BasicType::from_mnemonic(name) {
            Some(basic) => Ok(module.types.basic(basic)),
            None => module.types.lookup(name).ok_or_else(|| LoadError::UnknownType(name.clone())),
        },
        TypeRef::Pointer { ptr, kind } => {
            let pointee = resolve_type(module, ptr)?;
            let pointer = PointerType { kind: (*kind).into(), pointee };
            Ok(module.types.add(Type::Pointer(pointer))?)
        }
        TypeRef::Array { array, capacity } => {
            let element = resolve_type(module, array)?;
            Ok(module.types.add(Type::array(element, *capacity))?)
        }
        TypeRef::Func { func } => {
            let func = resolve_signature(module, func)?;
            Ok(module.types.add(Type::Func(func))?)
        }
    }
}

fn resolve_field(module: &mut Module, field: &FieldDesc) -> Result<Field, LoadError> {
    Ok(Field::new(field.name.clone(), resolve_type(module, &field.ty)?))
}

fn resolve_signature(module: &mut Module, signature: &SignatureDesc) -> Result<FuncType, LoadError> {
    let params = signature
        .params
        .iter()
        .map(|p| resolve_field(module, p))
        .collect::<Result<Vec<_>, _>>()?;
    let results = signature
        .results
        .iter()
        .map(|r| resolve_field(module, r))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FuncType::new(params, results))
}

fn build_body(
    module: &mut Module,
    body: &BodyDesc,
    callee_ids: &HashMap<&str, CalleeId>,
) -> Result<FuncBody, LoadError> {
    let registers = body
        .registers
        .iter()
        .map(|r| resolve_type(module, r))
        .collect::<Result<Vec<_>, _>>()?;
    let blocks = body
        .blocks
        .iter()
        .map(|instrs| {
            instrs
                .iter()
                .map(|i| build_instruction(i, callee_ids))
                .collect::<Result<Vec<_>, _>>()
                .map(BasicBlock::with_instructions)
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FuncBody::new(registers, blocks))
}

fn build_instruction(instr: &InstrDesc, callee_ids: &HashMap<&str, CalleeId>) -> Result<Instruction, LoadError> {
    let arith = |op, save: &Slot, source: &[Slot; 2]| {
        Instruction::Arithmetic(ArithmeticOp { op, save: *save, source: *source })
    };
    Ok(match instr {
        InstrDesc::Add { save, source } => arith(ArithOp::Add, save, source),
        InstrDesc::Sub { save, source } => arith(ArithOp::Sub, save, source),
        InstrDesc::Mul { save, source } => arith(ArithOp::Mul, save, source),
        InstrDesc::Div { save, source } => arith(ArithOp::Div, save, source),
        InstrDesc::Br { to, cond, operands } => Instruction::Branch(Branch { to: *to, cond: *cond, operands: *operands }),
        InstrDesc::Jmp { to } => Instruction::Jump(Jump { to: *to }),
        InstrDesc::Invoke { callee, args, results } => {
            let id = callee_ids
                .get(callee.as_str())
                .copied()
                .ok_or_else(|| LoadError::UnknownCallee(callee.clone()))?;
            Instruction::Invoke(Invoke { callee: id, args: args.clone(), results: results.clone() })
        }
        InstrDesc::Ret => Instruction::Return,
    })
}

fn build_callee(
    module: &mut Module,
    decl: &CalleeDecl,
    callee_ids: &HashMap<&str, CalleeId>,
) -> Result<Callee, LoadError> {
    match decl {
        CalleeDecl::Native { name, symbol, signature } => Ok(Callee::Native(NativeFunc {
            name: name.clone(),
            ty: resolve_signature(module, signature)?,
            symbol: symbol.clone(),
        })),
        CalleeDecl::Inline { name, signature, body } => Ok(Callee::Inline(FuncInline {
            name: name.clone(),
            ty: resolve_signature(module, signature)?,
            body: build_body(module, body, callee_ids)?,
        })),
        CalleeDecl::Impl { name, signature, body } => Ok(Callee::Impl(FuncImpl {
            name: name.clone(),
            ty: resolve_signature(module, signature)?,
            body: build_body(module, body, callee_ids)?,
        })),
    }
}
