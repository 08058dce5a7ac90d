//! Generator tests

use super::*;
use lvm_common::TargetConfig;
use lvm_ir::{
    ArithOp, ArithmeticOp, BasicBlock, BasicType, Branch, Callee, CalleeId, Cond, Field, FuncBody, FuncImpl,
    FuncInline, FuncType, Instruction, Invoke, Jump, NativeFunc, Type, TypeId,
};
use pretty_assertions::assert_eq;

fn module() -> Module {
    Module::new("test", TargetConfig::default())
}

fn field(name: &str, ty: TypeId) -> Field {
    Field::new(name, ty)
}

fn add_point(module: &mut Module) -> TypeId {
    let f32_ty = module.types.basic(BasicType::F32);
    let id = module.types.declare_struct("Point").unwrap();
    module.types.add_field(id, field("x", f32_ty)).unwrap();
    module.types.add_field(id, field("y", f32_ty)).unwrap();
    id
}

fn arith(op: ArithOp, save: u32, a: u32, b: u32) -> Instruction {
    Instruction::Arithmetic(ArithmeticOp { op, save, source: [a, b] })
}

fn block(instructions: Vec<Instruction>) -> BasicBlock {
    BasicBlock::with_instructions(instructions)
}

#[test]
fn test_struct_declaration() {
    let mut module = module();
    add_point(&mut module);
    let unit = generate_c(&module).unwrap();
    assert_eq!(
        unit.header,
        "#pragma once\n#include <stdint.h>\nstruct Point;\nstruct Point{float x;float y;};\n"
    );
    assert_eq!(unit.body, "");
}

#[test]
fn test_declarators() {
    let mut module = module();
    let u8_ty = module.types.basic(BasicType::U8);
    let s32 = module.types.basic(BasicType::S32);
    let arr = module.types.add(Type::array(u8_ty, 10)).unwrap();
    let empty = module.types.add(Type::array(u8_ty, 0)).unwrap();
    let arr_ptr = module.types.add(Type::pointer(arr)).unwrap();
    let s32_ptr = module.types.add(Type::nullable_pointer(s32, true)).unwrap();
    let alias = module.types.add(Type::alias("Byte", u8_ty)).unwrap();
    let binary = FuncType::new(vec![field("a", s32), field("b", s32)], vec![]);
    let fn_ty = module.types.add(Type::Func(binary.clone())).unwrap();
    let getter = FuncType::new(vec![], vec![field("p", s32_ptr)]);

    let gen = CGenerator::new(&module);
    assert_eq!(gen.declaration(arr, "buf").unwrap(), "uint8_t buf[a]");
    assert_eq!(gen.declaration(empty, "none").unwrap(), "uint8_t none[0]");
    assert_eq!(gen.type_text(arr).unwrap(), "uint8_t [a]");
    assert_eq!(gen.declaration(arr_ptr, "p").unwrap(), "uint8_t (*p)[a]");
    assert_eq!(gen.declaration(s32_ptr, "q").unwrap(), "int32_t *q");
    assert_eq!(gen.declaration(alias, "c").unwrap(), "uint8_t c");
    assert_eq!(gen.func_pointer_declaration(&binary, "f").unwrap(), "void (*f)(int32_t a,int32_t b)");
    assert_eq!(gen.declaration(fn_ty, "cb").unwrap(), "void (*cb)(int32_t a,int32_t b)");
    assert_eq!(gen.function_declarator(&getter, "get").unwrap(), "int32_t *get(void)");
}

#[test]
fn test_multiple_results_use_anonymous_struct() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let f64_ty = module.types.basic(BasicType::F64);
    let ty = FuncType::new(vec![], vec![field("q", s32), field("r", f64_ty)]);
    let gen = CGenerator::new(&module);
    assert_eq!(gen.result_type(&ty).unwrap(), "struct{int32_t q;double r;}");
}

#[test]
fn test_trait_declaration() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let func_trait = lvm_ir::FuncTrait::new("Shape")
        .with_prototype("area", FuncType::new(vec![], vec![field("a", s32)]));
    module.types.add(Type::Trait(func_trait)).unwrap();

    let unit = generate_c(&module).unwrap();
    assert!(unit.header.contains("struct Shape;\n"));
    assert!(unit.header.contains("struct Shape{int32_t (*area)(void);};\n"));
}

#[test]
fn test_unknown_basic_code() {
    let mut module = module();
    let bad = module.types.basic(BasicType::U_END);
    let gen = CGenerator::new(&module);
    assert_eq!(gen.declaration(bad, "x"), Err(CodegenError::UnknownBasicType { code: 0o15 }));
}

#[test]
fn test_forward_tags_precede_bodies() {
    let mut module = module();
    let node = module.types.declare_struct("Node").unwrap();
    let list = module.types.declare_struct("List").unwrap();
    let node_ptr = module.types.add(Type::pointer(node)).unwrap();
    let list_ptr = module.types.add(Type::pointer(list)).unwrap();
    module.types.add_field(node, field("next", node_ptr)).unwrap();
    module.types.add_field(node, field("owner", list_ptr)).unwrap();
    module.types.add_field(list, field("head", node_ptr)).unwrap();

    let unit = generate_c(&module).unwrap();
    let lines: Vec<&str> = unit.header.lines().collect();
    assert_eq!(
        lines,
        vec![
            "#pragma once",
            "#include <stdint.h>",
            "struct Node;",
            "struct List;",
            "struct Node{struct Node *next;struct List *owner;};",
            "struct List{struct Node *head;};",
        ]
    );
}

#[test]
fn test_header_groups_in_order() {
    let mut module = module();
    let point = add_point(&mut module);
    let f32_ty = module.types.basic(BasicType::F32);
    let point_ptr = module.types.add(Type::pointer(point)).unwrap();
    let area = FuncType::new(vec![field("p", point_ptr)], vec![field("a", f32_ty)]);
    let shape = lvm_ir::FuncTrait::new("Shape").with_prototype("area", area.clone());
    module.types.add(Type::Trait(shape)).unwrap();
    let body = FuncBody::new(vec![point_ptr, f32_ty], vec![block(vec![Instruction::Return])]);
    module
        .add_callee(Callee::Impl(FuncImpl { name: "point_area".to_string(), ty: area, body }))
        .unwrap();

    let unit = generate_c(&module).unwrap();
    let lines: Vec<&str> = unit.header.lines().collect();
    assert_eq!(
        lines,
        vec![
            "#pragma once",
            "#include <stdint.h>",
            "struct Point;",
            "struct Shape;",
            "struct Point{float x;float y;};",
            "struct Shape{float (*area)(struct Point *p);};",
            "float point_area(struct Point *p);",
        ]
    );
}

#[test]
fn test_by_value_field_needs_earlier_body() {
    let mut module = module();
    let u8_ty = module.types.basic(BasicType::U8);
    let outer = module.types.declare_struct("Outer").unwrap();
    let inner = module.types.declare_struct("Inner").unwrap();
    module.types.add_field(inner, field("v", u8_ty)).unwrap();
    module.types.add_field(outer, field("inner", inner)).unwrap();

    assert_eq!(
        generate_c(&module),
        Err(CodegenError::BodyOrder {
            structure: "Outer".to_string(),
            needs: "Inner".to_string(),
        })
    );
}

#[test]
fn test_generation_is_deterministic() {
    let mut module = module();
    let point = add_point(&mut module);
    let ptr = module.types.add(Type::pointer(point)).unwrap();
    let ty = FuncType::new(vec![field("p", ptr)], vec![]);
    let body = FuncBody::new(vec![ptr], vec![block(vec![Instruction::Return])]);
    module
        .add_callee(Callee::Impl(FuncImpl { name: "touch".to_string(), ty, body }))
        .unwrap();

    let first = generate_c(&module).unwrap();
    let second = generate_c(&module).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.combined(), second.combined());
}

#[test]
fn test_function_body_lowering() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let ty = FuncType::new(vec![field("a", s32), field("b", s32)], vec![field("sum", s32)]);
    let body = FuncBody::new(
        vec![s32, s32, s32],
        vec![block(vec![arith(ArithOp::Add, 2, 0, 1), Instruction::Return])],
    );
    module
        .add_callee(Callee::Impl(FuncImpl { name: "add".to_string(), ty, body }))
        .unwrap();

    let unit = generate_c(&module).unwrap();
    assert!(unit.header.ends_with("int32_t add(int32_t a,int32_t b);\n"));
    assert_eq!(
        unit.body,
        "int32_t add(int32_t a,int32_t b) {\n\
         \x20   int32_t r0;\n\
         \x20   int32_t r1;\n\
         \x20   int32_t r2;\n\
         \x20   r0 = a;\n\
         \x20   r1 = b;\n\
         bb0:\n\
         \x20   r2 = r0 + r1;\n\
         \x20   return r2;\n\
         }\n"
    );
}

#[test]
fn test_branches_become_gotos() {
    let mut module = module();
    let u32_ty = module.types.basic(BasicType::U32);
    // count up to n
    let ty = FuncType::new(vec![field("n", u32_ty)], vec![field("i", u32_ty)]);
    let body = FuncBody::new(
        vec![u32_ty, u32_ty, u32_ty],
        vec![
            block(vec![Instruction::Jump(Jump { to: 1 })]),
            block(vec![
                Instruction::Branch(Branch { to: 2, cond: Cond::LtEq, operands: [0, 1] }),
                arith(ArithOp::Add, 1, 1, 2),
                Instruction::Jump(Jump { to: 1 }),
            ]),
            block(vec![Instruction::Return]),
        ],
    );
    module
        .add_callee(Callee::Impl(FuncImpl { name: "count".to_string(), ty, body }))
        .unwrap();

    let body = generate_c(&module).unwrap().body;
    assert!(body.contains("bb0:\n    goto bb1;\nbb1:\n"));
    assert!(body.contains("    if (r0 <= r1) goto bb2;\n"));
    assert!(body.contains("    r1 = r1 + r2;\n"));
    assert!(body.ends_with("bb2:\n    return r1;\n}\n"));
}

#[test]
fn test_generated_parameter_names() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let ty = FuncType::new(vec![field("", s32), field("r1", s32)], vec![]);
    let body = FuncBody::new(vec![s32, s32], vec![]);
    module
        .add_callee(Callee::Impl(FuncImpl { name: "f".to_string(), ty, body }))
        .unwrap();

    let body = generate_c(&module).unwrap().body;
    assert!(body.starts_with("void f(int32_t p0,int32_t p1) {\n"));
    assert!(body.contains("    r0 = p0;\n    r1 = p1;\n    return;\n"));
}

#[test]
fn test_generated_names_skip_declared_params() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let ty = FuncType::new(vec![field("p1", s32), field("", s32)], vec![]);
    let body = FuncBody::new(vec![s32, s32], vec![]);
    module
        .add_callee(Callee::Impl(FuncImpl { name: "f".to_string(), ty, body }))
        .unwrap();

    let unit = generate_c(&module).unwrap();
    assert!(unit.header.ends_with("void f(int32_t p1,int32_t p1_1);\n"));
    assert!(unit.body.starts_with("void f(int32_t p1,int32_t p1_1) {\n"));
    assert!(unit.body.contains("    r0 = p1;\n    r1 = p1_1;\n"));
}

#[test]
fn test_params_do_not_shadow_called_functions() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let emit = module
        .add_callee(Callee::Native(NativeFunc {
            name: "emit".to_string(),
            ty: FuncType::new(vec![field("v", s32)], vec![]),
            symbol: "g".to_string(),
        }))
        .unwrap();
    let ty = FuncType::new(vec![field("g", s32), field("int", s32), field("f", s32)], vec![]);
    let body = FuncBody::new(
        vec![s32, s32, s32],
        vec![block(vec![
            Instruction::Invoke(Invoke { callee: emit, args: vec![0], results: vec![] }),
            Instruction::Return,
        ])],
    );
    module
        .add_callee(Callee::Impl(FuncImpl { name: "f".to_string(), ty, body }))
        .unwrap();

    let body = generate_c(&module).unwrap().body;
    assert!(body.contains("void f(int32_t p0,int32_t p1,int32_t p2) {\n"));
    assert!(body.contains("    r0 = p0;\n    r1 = p1;\n    r2 = p2;\n"));
    assert!(body.contains("    g(r0);\n"));
}

fn native(name: &str, symbol: &str, param: TypeId) -> Callee {
    Callee::Native(NativeFunc {
        name: name.to_string(),
        ty: FuncType::new(vec![field("v", param)], vec![]),
        symbol: symbol.to_string(),
    })
}

fn calling(module: &mut Module, callees: &[CalleeId], arg: TypeId) {
    let calls = callees
        .iter()
        .map(|id| Instruction::Invoke(Invoke { callee: *id, args: vec![0], results: vec![] }))
        .collect();
    let body = FuncBody::new(vec![arg], vec![block(calls)]);
    module
        .add_callee(Callee::Impl(FuncImpl { name: "run".to_string(), ty: FuncType::default(), body }))
        .unwrap();
}

#[test]
fn test_natives_sharing_a_symbol() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let first = module.add_callee(native("put_a", "put", s32)).unwrap();
    let second = module.add_callee(native("put_b", "put", s32)).unwrap();
    calling(&mut module, &[first, second], s32);

    let body = generate_c(&module).unwrap().body;
    assert_eq!(body.matches("extern void put(int32_t v);").count(), 1);
    assert!(body.contains("    put(r0);\n    put(r0);\n"));
}

#[test]
fn test_natives_with_conflicting_prototypes() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let u8_ty = module.types.basic(BasicType::U8);
    let first = module.add_callee(native("put_int", "put", s32)).unwrap();
    let second = module.add_callee(native("put_byte", "put", u8_ty)).unwrap();
    calling(&mut module, &[first, second], s32);

    assert_eq!(
        generate_c(&module),
        Err(CodegenError::ConflictingSymbol {
            symbol: "put".to_string(),
            first: "put_int".to_string(),
            second: "put_byte".to_string(),
        })
    );
}

#[test]
fn test_native_calls_are_declared_extern() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let print = module
        .add_callee(Callee::Native(NativeFunc {
            name: "print".to_string(),
            ty: FuncType::new(vec![field("v", s32)], vec![]),
            symbol: "lvm_print".to_string(),
        }))
        .unwrap();
    let read = module
        .add_callee(Callee::Native(NativeFunc {
            name: "read".to_string(),
            ty: FuncType::new(vec![], vec![field("v", s32)]),
            symbol: "lvm_read".to_string(),
        }))
        .unwrap();
    let body = FuncBody::new(
        vec![s32],
        vec![block(vec![
            Instruction::Invoke(Invoke { callee: read, args: vec![], results: vec![0] }),
            Instruction::Invoke(Invoke { callee: print, args: vec![0], results: vec![] }),
            Instruction::Invoke(Invoke { callee: print, args: vec![0], results: vec![] }),
            Instruction::Return,
        ])],
    );
    module
        .add_callee(Callee::Impl(FuncImpl { name: "echo".to_string(), ty: FuncType::default(), body }))
        .unwrap();

    let unit = generate_c(&module).unwrap();
    assert_eq!(
        unit.body,
        "extern int32_t lvm_read(void);\n\
         extern void lvm_print(int32_t v);\n\
         \n\
         void echo(void) {\n\
         \x20   int32_t r0;\n\
         \x20   int32_t read_ret;\n\
         bb0:\n\
         \x20   read_ret = lvm_read();\n\
         \x20   r0 = read_ret;\n\
         \x20   lvm_print(r0);\n\
         \x20   lvm_print(r0);\n\
         \x20   return;\n\
         }\n"
    );
    // natives are not part of the header
    assert!(!unit.header.contains("lvm_"));
}

#[test]
fn test_inline_expansion() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let inc = module
        .add_callee(Callee::Inline(FuncInline {
            name: "inc".to_string(),
            ty: FuncType::new(vec![field("x", s32)], vec![field("y", s32)]),
            body: FuncBody::new(
                vec![s32, s32, s32],
                vec![block(vec![arith(ArithOp::Add, 1, 0, 2), Instruction::Return])],
            ),
        }))
        .unwrap();
    let body = FuncBody::new(
        vec![s32, s32],
        vec![block(vec![
            Instruction::Invoke(Invoke { callee: inc, args: vec![0], results: vec![1] }),
            Instruction::Return,
        ])],
    );
    let ty = FuncType::new(vec![field("a", s32)], vec![field("b", s32)]);
    module
        .add_callee(Callee::Impl(FuncImpl { name: "f".to_string(), ty, body }))
        .unwrap();

    let unit = generate_c(&module).unwrap();
    // inline callees get no prototype
    assert!(!unit.header.contains("inc("));
    assert_eq!(
        unit.body,
        "int32_t f(int32_t a) {\n\
         \x20   int32_t r0;\n\
         \x20   int32_t r1;\n\
         \x20   r0 = a;\n\
         bb0:\n\
         \x20   {\n\
         \x20       int32_t i0_r0;\n\
         \x20       int32_t i0_r1;\n\
         \x20       int32_t i0_r2;\n\
         \x20       i0_r0 = r0;\n\
         \x20   i0_bb0:\n\
         \x20       i0_r1 = i0_r0 + i0_r2;\n\
         \x20       goto i0_end;\n\
         \x20   i0_end:;\n\
         \x20       r1 = i0_r1;\n\
         \x20   }\n\
         \x20   return r1;\n\
         }\n"
    );
}

#[test]
fn test_recursive_inline_is_rejected() {
    let mut module = module();
    let id = module.next_callee_id();
    let body = FuncBody::new(
        vec![],
        vec![block(vec![Instruction::Invoke(Invoke { callee: id, args: vec![], results: vec![] })])],
    );
    module
        .add_callee(Callee::Inline(FuncInline { name: "again".to_string(), ty: FuncType::default(), body: body.clone() }))
        .unwrap();
    module
        .add_callee(Callee::Impl(FuncImpl { name: "start".to_string(), ty: FuncType::default(), body }))
        .unwrap();

    assert_eq!(
        generate_c(&module),
        Err(CodegenError::RecursiveInline {
            chain: vec!["again".to_string(), "again".to_string()],
        })
    );
}

#[test]
fn test_arity_mismatch() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let ty = FuncType::new(vec![field("x", s32)], vec![]);
    let target = module
        .add_callee(Callee::Impl(FuncImpl {
            name: "sink".to_string(),
            ty: ty.clone(),
            body: FuncBody::new(vec![s32], vec![]),
        }))
        .unwrap();
    let body = FuncBody::new(
        vec![s32],
        vec![block(vec![Instruction::Invoke(Invoke { callee: target, args: vec![0, 0], results: vec![] })])],
    );
    module
        .add_callee(Callee::Impl(FuncImpl { name: "caller".to_string(), ty: FuncType::default(), body }))
        .unwrap();

    assert_eq!(
        generate_c(&module),
        Err(CodegenError::ArityMismatch {
            callee: "sink".to_string(),
            expected_args: 1,
            expected_results: 0,
            args: 2,
            results: 0,
        })
    );
}

#[test]
fn test_undefined_register() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let body = FuncBody::new(vec![s32], vec![block(vec![arith(ArithOp::Mul, 0, 0, 9)])]);
    module
        .add_callee(Callee::Impl(FuncImpl { name: "f".to_string(), ty: FuncType::default(), body }))
        .unwrap();

    assert_eq!(
        generate_c(&module),
        Err(CodegenError::UndefinedRegister { function: "f".to_string(), slot: 9 })
    );
}

#[test]
fn test_multiple_result_definition_is_unsupported() {
    let mut module = module();
    let s32 = module.types.basic(BasicType::S32);
    let ty = FuncType::new(vec![], vec![field("q", s32), field("r", s32)]);
    let body = FuncBody::new(vec![s32, s32], vec![]);
    module
        .add_callee(Callee::Impl(FuncImpl { name: "divmod".to_string(), ty, body }))
        .unwrap();

    assert!(matches!(generate_c(&module), Err(CodegenError::Unsupported { .. })));
}

#[test]
fn test_split_output_is_written_atomically() {
    let mut module = module();
    add_point(&mut module);
    let unit = generate_c(&module).unwrap();

    let dir = std::env::temp_dir().join(format!("lvm-cgen-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let source = dir.join("out.c");
    let header = dir.join("out.h");
    unit.write_to(&source, Some(&header)).unwrap();

    assert_eq!(std::fs::read_to_string(&header).unwrap(), unit.header);
    let written = std::fs::read_to_string(&source).unwrap();
    assert!(written.starts_with("#include \"out.h\"\n\n"));
    let leftovers = std::fs::read_dir(&dir)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().path().to_string_lossy().ends_with(".tmp"))
        .count();
    assert_eq!(leftovers, 0);

    unit.write_to(&source, None).unwrap();
    assert_eq!(std::fs::read_to_string(&source).unwrap(), unit.combined());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_write_into_missing_directory_fails() {
    let path = std::env::temp_dir()
        .join(format!("lvm-cgen-missing-{}", std::process::id()))
        .join("out.c");
    assert!(matches!(write_atomic(&path, "int x;"), Err(CodegenError::Io { .. })));
    assert!(!path.exists());
}

#[test]
fn test_failed_staging_replaces_nothing() {
    let dir = std::env::temp_dir().join(format!("lvm-cgen-staging-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let header = dir.join("kept.h");
    let source = dir.join("missing").join("out.c");

    let result = write_all_atomic(&[(header.as_path(), "int x;".to_string()), (source.as_path(), String::new())]);
    assert!(matches!(result, Err(CodegenError::Io { .. })));
    assert!(!header.exists());
    assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);
    std::fs::remove_dir_all(&dir).unwrap();
}
