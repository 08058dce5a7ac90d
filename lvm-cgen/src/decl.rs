//! Declarator synthesis
//!
//! C declarators are built inside out: the name is wrapped by each layer of
//! the type until a base type is reached. `declaration(ty, "")` gives the
//! bare type text.

use lvm_ir::{ArrayType, BasicType, FuncTrait, FuncType, StructuredType, Type, TypeId};
use crate::names::c_type_name;
use crate::{CGenerator, CodegenError};

fn join(ty: &str, name: &str) -> String {
    if name.is_empty() {
        ty.to_string()
    } else {
        format!("{ty} {name}")
    }
}

impl<'m> CGenerator<'m> {
    pub fn basic_type_name(&self, basic: BasicType) -> Result<&'static str, CodegenError> {
        c_type_name(basic).ok_or(CodegenError::UnknownBasicType { code: basic.code() })
    }

    /// Type text without a declared name
    pub fn type_text(&self, ty: TypeId) -> Result<String, CodegenError> {
        self.declaration(ty, "")
    }

    /// Declare `name` with type `ty`
    pub fn declaration(&self, ty: TypeId, name: &str) -> Result<String, CodegenError> {
        match self.types().get(ty)? {
            Type::Basic(basic) => Ok(join(self.basic_type_name(*basic)?, name)),
            Type::Structured(s) => Ok(join(&format!("struct {}", s.name), name)),
            Type::Trait(t) => Ok(join(&format!("struct {}", t.name), name)),
            Type::Func(func) => self.func_pointer_declaration(func, name),
            Type::Array(array) => self.array_declaration(array, name),
            Type::Pointer(pointer) => {
                let pointee = self.types().resolve_alias(pointer.pointee)?;
                let inner = match self.types().get(pointee)? {
                    Type::Array(_) => format!("(*{name})"),
                    Type::Basic(_) | Type::Pointer(_) | Type::Structured(_) | Type::Func(_)
                    | Type::Trait(_) | Type::Alias(_) => format!("*{name}"),
                };
                self.declaration(pointer.pointee, &inner)
            }
            // aliases are transparent in the generated C
            Type::Alias(alias) => self.declaration(alias.target, name),
        }
    }

    /// `<element> name[<capacity in hex>]`
    pub fn array_declaration(&self, array: &ArrayType, name: &str) -> Result<String, CodegenError> {
        self.declaration(array.element, &format!("{}[{:x}]", name, array.capacity))
    }

    pub fn array_type(&self, array: &ArrayType) -> Result<String, CodegenError> {
        self.array_declaration(array, "")
    }

    /// Result type text: `void`, the single result, or an anonymous aggregate
    pub fn result_type(&self, func: &FuncType) -> Result<String, CodegenError> {
        match func.results.as_slice() {
            [] => Ok("void".to_string()),
            [single] => self.type_text(single.ty),
            many => {
                let mut s = String::from("struct{");
                for result in many {
                    s += &self.declaration(result.ty, &result.name)?;
                    s += ";";
                }
                s += "}";
                Ok(s)
            }
        }
    }

    /// Comma-joined parameter declarators; `void` when there are none
    pub fn parameter_list(&self, func: &FuncType) -> Result<String, CodegenError> {
        if func.params.is_empty() {
            return Ok("void".to_string());
        }
        let params = func
            .params
            .iter()
            .map(|p| self.declaration(p.ty, &p.name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(params.join(","))
    }

    /// `<result> name(<params>)`, used for prototypes and definitions
    pub fn function_declarator(&self, func: &FuncType, name: &str) -> Result<String, CodegenError> {
        let declarator = format!("{}({})", name, self.parameter_list(func)?);
        match func.results.as_slice() {
            [single] => {
                let result = self.types().resolve_alias(single.ty)?;
                match self.types().get(result)? {
                    Type::Array(_) => Err(CodegenError::unsupported(format!(
                        "array-typed result '{}' of '{}'", single.name, name
                    ))),
                    // composing keeps pointer and function-pointer results valid C
                    Type::Basic(_) | Type::Pointer(_) | Type::Structured(_) | Type::Func(_)
                    | Type::Trait(_) | Type::Alias(_) => self.declaration(single.ty, &declarator),
                }
            }
            [] | [_, _, ..] => Ok(join(&self.result_type(func)?, &declarator)),
        }
    }

    /// `<result> (*name)(<params>)`
    pub fn func_pointer_declaration(&self, func: &FuncType, name: &str) -> Result<String, CodegenError> {
        self.function_declarator(func, &format!("(*{name})"))
    }

    /// Function pointer type text with no name
    pub fn func_type(&self, func: &FuncType) -> Result<String, CodegenError> {
        self.func_pointer_declaration(func, "")
    }

    /// `struct Name{<field>;...}`
    pub fn struct_body(&self, structure: &StructuredType) -> Result<String, CodegenError> {
        let mut s = format!("struct {}{{", structure.name);
        for field in &structure.fields {
            s += &self.declaration(field.ty, &field.name)?;
            s += ";";
        }
        s += "}";
        Ok(s)
    }

    /// `struct Name{<fn pointer>;...}`
    pub fn trait_body(&self, func_trait: &FuncTrait) -> Result<String, CodegenError> {
        let mut s = format!("struct {}{{", func_trait.name);
        for prototype in &func_trait.prototypes {
            s += &self.func_pointer_declaration(&prototype.ty, &prototype.name)?;
            s += ";";
        }
        s += "}";
        Ok(s)
    }
}
