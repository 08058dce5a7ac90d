//! Function body lowering
//!
//! Every register becomes a C local `r<N>`, every block a label `bb<N>`.
//! Branches and jumps become `goto`. Calls to compiled and native functions
//! capture a single result through a `<callee>_ret` temporary. Inline
//! callees are expanded in a nested C block whose registers and labels carry
//! an `i<N>_` prefix unique within the enclosing function.

use log::{debug, trace};
use lvm_common::Slot;
use lvm_ir::{
    ArithOp, Callee, CalleeId, Cond, FuncBody, FuncImpl, FuncInline, FuncType, Instruction,
    Invoke, NativeFunc, Type, TypeId,
};
use std::collections::HashSet;
use std::fmt::Write;
use crate::{CGenerator, CodegenError};

const INDENT: &str = "    ";

fn c_cond(cond: Cond) -> &'static str {
    match cond {
        Cond::Eq => "==",
        Cond::Neq => "!=",
        Cond::LtEq => "<=",
        Cond::Lt => "<",
    }
}

fn c_arith(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "+",
        ArithOp::Sub => "-",
        ArithOp::Mul => "*",
        ArithOp::Div => "/",
    }
}

/// Where `Return` transfers control
enum Exit {
    Return,
    Goto(String),
}

/// A function body being lowered, either the definition itself or an
/// inline expansion inside it
struct Frame<'a> {
    function: &'a str,
    ty: &'a FuncType,
    body: &'a FuncBody,
    prefix: String,
    exit: Exit,
}

impl Frame<'_> {
    fn register(&self, slot: Slot) -> Result<String, CodegenError> {
        if (slot as usize) < self.body.registers.len() {
            Ok(format!("{}r{}", self.prefix, slot))
        } else {
            Err(CodegenError::UndefinedRegister {
                function: self.function.to_string(),
                slot,
            })
        }
    }

    fn label(&self, block: u32) -> String {
        format!("{}bb{}", self.prefix, block)
    }

    /// First result register
    fn result_slot(&self) -> Slot {
        self.ty.params.len() as Slot
    }
}

struct BodyLowering<'g, 'm> {
    gen: &'g CGenerator<'m>,
    natives: &'g mut Vec<&'m NativeFunc>,
    ret_temps: Vec<(String, TypeId)>,
    inline_stack: Vec<(CalleeId, String)>,
    next_inline: u32,
    out: String,
}

impl<'g, 'm> BodyLowering<'g, 'm> {
    fn new(gen: &'g CGenerator<'m>, natives: &'g mut Vec<&'m NativeFunc>) -> Self {
        Self {
            gen,
            natives,
            ret_temps: Vec::new(),
            inline_stack: Vec::new(),
            next_inline: 0,
            out: String::new(),
        }
    }

    /// The register file must cover parameters and results, and every
    /// register must be assignable in C.
    fn check_registers(&self, frame: &Frame) -> Result<(), CodegenError> {
        let needed = frame.ty.params.len() + frame.ty.results.len();
        if frame.body.registers.len() < needed {
            return Err(CodegenError::UndefinedRegister {
                function: frame.function.to_string(),
                slot: frame.body.registers.len() as Slot,
            });
        }
        let types = self.gen.types();
        for (slot, ty) in frame.body.registers.iter().enumerate() {
            let resolved = types.resolve_alias(*ty)?;
            match types.get(resolved)? {
                Type::Array(_) => {
                    return Err(CodegenError::unsupported(format!(
                        "array-typed register %{} in '{}'", slot, frame.function
                    )))
                }
                Type::Basic(_) | Type::Pointer(_) | Type::Structured(_) | Type::Func(_)
                | Type::Trait(_) | Type::Alias(_) => {}
            }
        }
        Ok(())
    }

    fn declare_registers(&mut self, frame: &Frame, depth: usize) -> Result<(), CodegenError> {
        let indent = INDENT.repeat(depth);
        for (slot, ty) in frame.body.registers.iter().enumerate() {
            let decl = self.gen.declaration(*ty, &frame.register(slot as Slot)?)?;
            writeln!(self.out, "{indent}{decl};")?;
        }
        Ok(())
    }

    fn lower_blocks(&mut self, frame: &Frame, depth: usize) -> Result<(), CodegenError> {
        let label_indent = INDENT.repeat(depth - 1);
        for (index, block) in frame.body.blocks.iter().enumerate() {
            writeln!(self.out, "{}{}:", label_indent, frame.label(index as u32))?;
            for instr in &block.instructions {
                self.lower_instruction(frame, instr, depth)?;
            }
        }
        Ok(())
    }

    fn lower_instruction(&mut self, frame: &Frame, instr: &Instruction, depth: usize) -> Result<(), CodegenError> {
        let indent = INDENT.repeat(depth);
        trace!("{}: {}", frame.function, instr);
        match instr {
            Instruction::Arithmetic(arith) => {
                let [a, b] = arith.source;
                writeln!(
                    self.out,
                    "{indent}{} = {} {} {};",
                    frame.register(arith.save)?,
                    frame.register(a)?,
                    c_arith(arith.op),
                    frame.register(b)?,
                )?;
            }
            Instruction::Branch(branch) => {
                let [a, b] = branch.operands;
                writeln!(
                    self.out,
                    "{indent}if ({} {} {}) goto {};",
                    frame.register(a)?,
                    c_cond(branch.cond),
                    frame.register(b)?,
                    frame.label(branch.to),
                )?;
            }
            Instruction::Jump(jump) => {
                writeln!(self.out, "{indent}goto {};", frame.label(jump.to))?;
            }
            Instruction::Invoke(invoke) => self.lower_invoke(frame, invoke, depth)?,
            Instruction::Return => match &frame.exit {
                Exit::Goto(label) => writeln!(self.out, "{indent}goto {label};")?,
                Exit::Return => self.emit_return(frame, depth)?,
            },
        }
        Ok(())
    }

    fn emit_return(&mut self, frame: &Frame, depth: usize) -> Result<(), CodegenError> {
        let indent = INDENT.repeat(depth);
        match frame.ty.results.as_slice() {
            [] => writeln!(self.out, "{indent}return;")?,
            [_] => writeln!(self.out, "{indent}return {};", frame.register(frame.result_slot())?)?,
            many => {
                return Err(CodegenError::unsupported(format!(
                    "return of {} results from '{}'", many.len(), frame.function
                )))
            }
        }
        Ok(())
    }

    fn lower_invoke(&mut self, frame: &Frame, invoke: &Invoke, depth: usize) -> Result<(), CodegenError> {
        let module = self.gen.module;
        let callee = module.callee(invoke.callee).ok_or(CodegenError::UndefinedCallee(invoke.callee))?;
        let ty = callee.func_type();
        if ty.params.len() != invoke.args.len() || ty.results.len() != invoke.results.len() {
            return Err(CodegenError::ArityMismatch {
                callee: callee.identify().to_string(),
                expected_args: ty.params.len(),
                expected_results: ty.results.len(),
                args: invoke.args.len(),
                results: invoke.results.len(),
            });
        }

        let args = invoke
            .args
            .iter()
            .map(|slot| frame.register(*slot))
            .collect::<Result<Vec<_>, _>>()?;
        let results = invoke
            .results
            .iter()
            .map(|slot| frame.register(*slot))
            .collect::<Result<Vec<_>, _>>()?;

        match callee {
            Callee::Native(native) => {
                self.use_native(native)?;
                self.emit_call(&native.symbol, &native.name, ty, &args, &results, depth)
            }
            Callee::Impl(func) => self.emit_call(&func.name, &func.name, ty, &args, &results, depth),
            Callee::Inline(inline) => self.expand_inline(invoke.callee, inline, &args, &results, depth),
        }
    }

    /// Record a native for its `extern` prototype. Natives sharing a link
    /// symbol must agree on the prototype C sees.
    fn use_native(&mut self, native: &'m NativeFunc) -> Result<(), CodegenError> {
        match self.natives.iter().find(|n| n.symbol == native.symbol) {
            None => self.natives.push(native),
            Some(seen) => {
                let first = self.gen.function_declarator(&seen.ty, &seen.symbol)?;
                let second = self.gen.function_declarator(&native.ty, &native.symbol)?;
                if first != second {
                    return Err(CodegenError::ConflictingSymbol {
                        symbol: native.symbol.clone(),
                        first: seen.name.clone(),
                        second: native.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn emit_call(
        &mut self,
        symbol: &str,
        name: &str,
        ty: &FuncType,
        args: &[String],
        results: &[String],
        depth: usize,
    ) -> Result<(), CodegenError> {
        let indent = INDENT.repeat(depth);
        let call = format!("{}({})", symbol, args.join(", "));
        match ty.results.as_slice() {
            [] => writeln!(self.out, "{indent}{call};")?,
            [result] => {
                let temp = format!("{name}_ret");
                if !self.ret_temps.iter().any(|(t, _)| *t == temp) {
                    self.ret_temps.push((temp.clone(), result.ty));
                }
                writeln!(self.out, "{indent}{temp} = {call};")?;
                for dest in results {
                    writeln!(self.out, "{indent}{dest} = {temp};")?;
                }
            }
            many => {
                return Err(CodegenError::unsupported(format!(
                    "call to '{}' returning {} results", name, many.len()
                )))
            }
        }
        Ok(())
    }

    fn expand_inline(
        &mut self,
        id: CalleeId,
        inline: &FuncInline,
        args: &[String],
        results: &[String],
        depth: usize,
    ) -> Result<(), CodegenError> {
        if self.inline_stack.iter().any(|(active, _)| *active == id) {
            let mut chain: Vec<String> = self.inline_stack.iter().map(|(_, name)| name.clone()).collect();
            chain.push(inline.name.clone());
            return Err(CodegenError::RecursiveInline { chain });
        }

        let prefix = format!("i{}_", self.next_inline);
        self.next_inline += 1;
        let end = format!("{prefix}end");
        debug!("expanding inline '{}' as {}", inline.name, prefix);
        let frame = Frame {
            function: &inline.name,
            ty: &inline.ty,
            body: &inline.body,
            prefix,
            exit: Exit::Goto(end.clone()),
        };
        self.check_registers(&frame)?;

        let outer = INDENT.repeat(depth);
        let inner = INDENT.repeat(depth + 1);
        writeln!(self.out, "{outer}{{")?;
        self.declare_registers(&frame, depth + 1)?;
        for (slot, arg) in args.iter().enumerate() {
            writeln!(self.out, "{inner}{} = {arg};", frame.register(slot as Slot)?)?;
        }

        self.inline_stack.push((id, inline.name.clone()));
        self.lower_blocks(&frame, depth + 1)?;
        self.inline_stack.pop();

        writeln!(self.out, "{outer}{end}:;")?;
        for (k, dest) in results.iter().enumerate() {
            let source = frame.register(frame.result_slot() + k as Slot)?;
            writeln!(self.out, "{inner}{dest} = {source};")?;
        }
        writeln!(self.out, "{outer}}}")?;
        Ok(())
    }
}

/// C99 keywords, never usable as parameter names
const C_KEYWORDS: [&str; 37] = [
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while", "_Bool", "_Complex", "_Imaginary",
];

/// Names the definition itself generates: registers and call temporaries
fn is_generated_name(name: &str) -> bool {
    name.is_empty()
        || name.ends_with("_ret")
        || (name.len() > 1 && name.starts_with('r') && name[1..].bytes().all(|b| b.is_ascii_digit()))
}

impl<'m> CGenerator<'m> {
    /// Identifiers with file scope in the body: compiled functions and the
    /// link symbols of natives. A parameter of the same name would shadow
    /// them inside the definition.
    fn file_scope_names(&self) -> HashSet<&'m str> {
        self.module
            .callees()
            .filter_map(|(_, callee)| match callee {
                Callee::Impl(func) => Some(func.name.as_str()),
                Callee::Native(native) => Some(native.symbol.as_str()),
                Callee::Inline(_) => None,
            })
            .collect()
    }

    /// Parameter names for a definition. A declared name is kept unless it
    /// is empty, a C keyword, a generated name, a file-scope name or a
    /// repeat of an earlier parameter; the rest get `p<index>`, suffixed
    /// until unique.
    pub(crate) fn definition_params(&self, func: &FuncType) -> FuncType {
        let reserved = self.file_scope_names();
        let unusable = |name: &str| {
            is_generated_name(name) || C_KEYWORDS.contains(&name) || reserved.contains(name)
        };

        let mut taken = HashSet::new();
        let keep: Vec<bool> = func
            .params
            .iter()
            .map(|p| !unusable(&p.name) && taken.insert(p.name.clone()))
            .collect();

        let params = func
            .params
            .iter()
            .zip(keep)
            .enumerate()
            .map(|(i, (p, kept))| {
                let mut param = p.clone();
                if !kept {
                    let mut name = format!("p{i}");
                    let mut suffix = 1;
                    while taken.contains(&name) || reserved.contains(name.as_str()) {
                        name = format!("p{i}_{suffix}");
                        suffix += 1;
                    }
                    taken.insert(name.clone());
                    param.name = name;
                }
                param
            })
            .collect();
        FuncType::new(params, func.results.clone())
    }

    /// Extern prototypes for the natives in use, then every definition
    pub fn generate_body(&self) -> Result<String, CodegenError> {
        let mut natives = Vec::new();
        let mut definitions = Vec::new();
        for func in self.module.impls() {
            definitions.push(self.function_definition(func, &mut natives)?);
        }

        let mut out = String::new();
        for native in &natives {
            writeln!(out, "extern {};", self.function_declarator(&native.ty, &native.symbol)?)?;
        }
        for definition in &definitions {
            if !out.is_empty() {
                writeln!(out)?;
            }
            out.push_str(definition);
        }
        Ok(out)
    }

    fn function_definition(
        &self,
        func: &'m FuncImpl,
        natives: &mut Vec<&'m NativeFunc>,
    ) -> Result<String, CodegenError> {
        debug!("lowering function '{}' ({} blocks)", func.name, func.body.blocks.len());
        if func.ty.results.len() > 1 {
            return Err(CodegenError::unsupported(format!(
                "definition of '{}' with {} results", func.name, func.ty.results.len()
            )));
        }

        let frame = Frame {
            function: &func.name,
            ty: &func.ty,
            body: &func.body,
            prefix: String::new(),
            exit: Exit::Return,
        };
        let mut lowering = BodyLowering::new(self, natives);
        lowering.check_registers(&frame)?;
        lowering.lower_blocks(&frame, 1)?;
        // falling off the last block returns
        if !func.body.blocks.last().is_some_and(|b| b.has_terminator()) {
            lowering.emit_return(&frame, 1)?;
        }
        let statements = std::mem::take(&mut lowering.out);
        let ret_temps = std::mem::take(&mut lowering.ret_temps);

        let named = self.definition_params(&func.ty);
        let mut out = String::new();
        writeln!(out, "{} {{", self.function_declarator(&named, &func.name)?)?;
        lowering.declare_registers(&frame, 1)?;
        out.push_str(&lowering.out);
        for (temp, ty) in &ret_temps {
            writeln!(out, "{INDENT}{};", self.declaration(*ty, temp)?)?;
        }
        for (slot, param) in named.params.iter().enumerate() {
            writeln!(out, "{INDENT}{} = {};", frame.register(slot as Slot)?, param.name)?;
        }
        out.push_str(&statements);
        writeln!(out, "}}")?;
        Ok(out)
    }
}
