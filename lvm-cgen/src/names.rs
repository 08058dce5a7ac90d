//! Basic type to C type name mapping

use lvm_ir::BasicType;

/// Fixed-width C names from `<stdint.h>`
const C_TYPE_NAMES: [(BasicType, &str); 10] = [
    (BasicType::U8, "uint8_t"),
    (BasicType::U16, "uint16_t"),
    (BasicType::U32, "uint32_t"),
    (BasicType::U64, "uint64_t"),
    (BasicType::S8, "int8_t"),
    (BasicType::S16, "int16_t"),
    (BasicType::S32, "int32_t"),
    (BasicType::S64, "int64_t"),
    (BasicType::F32, "float"),
    (BasicType::F64, "double"),
];

/// C spelling of a basic type, `None` for codes outside the table
pub fn c_type_name(basic: BasicType) -> Option<&'static str> {
    C_TYPE_NAMES
        .iter()
        .find(|(code, _)| *code == basic)
        .map(|(_, name)| *name)
}
