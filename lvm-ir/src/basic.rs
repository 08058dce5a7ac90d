//! Primitive Types
//!
//! A basic type is a single byte code. The high bits pick a category band
//! (unsigned, signed, float) and the low three bits a size class, where
//! class `c` means `1 << (c - 1)` bytes.

use lvm_common::PointerWidth;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive numeric type code
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BasicType(u8);

impl BasicType {
    /// Ends a nested pointer signature
    pub const TERMINATE: BasicType = BasicType(0);

    pub const U_BEGIN: BasicType = BasicType(0o10);
    pub const U8: BasicType = BasicType(0o11);
    pub const U16: BasicType = BasicType(0o12);
    pub const U32: BasicType = BasicType(0o13);
    pub const U64: BasicType = BasicType(0o14);
    pub const U_END: BasicType = BasicType(0o15);

    pub const S_BEGIN: BasicType = BasicType(0o20);
    pub const S8: BasicType = BasicType(0o21);
    pub const S16: BasicType = BasicType(0o22);
    pub const S32: BasicType = BasicType(0o23);
    pub const S64: BasicType = BasicType(0o24);
    pub const S_END: BasicType = BasicType(0o25);

    // 0o31 and 0o32 are reserved for 8 and 16 bit floats.
    pub const F_BEGIN: BasicType = BasicType(0o30);
    pub const F32: BasicType = BasicType(0o33);
    pub const F64: BasicType = BasicType(0o34);
    pub const F_END: BasicType = BasicType(0o35);

    /// Base of the pointer-sized code; deliberately outside every band
    const PTR_BASE: u8 = 0o40;

    /// All codes that belong to a band, in band order
    pub const DEFINED: [BasicType; 10] = [
        BasicType::U8, BasicType::U16, BasicType::U32, BasicType::U64,
        BasicType::S8, BasicType::S16, BasicType::S32, BasicType::S64,
        BasicType::F32, BasicType::F64,
    ];

    /// Wrap a raw code without validation
    pub const fn from_code(code: u8) -> Self {
        BasicType(code)
    }

    pub const fn code(&self) -> u8 {
        self.0
    }

    /// The pointer-sized unsigned code for a target
    pub fn uptr(width: PointerWidth) -> Self {
        BasicType(Self::PTR_BASE | size_class(width.bytes()))
    }

    /// Size in bytes decoded from the low three bits
    pub fn size(&self) -> u32 {
        match self.0 & 0o7 {
            0 => 0,
            class => 1 << (class - 1),
        }
    }

    pub fn is_unsigned(&self) -> bool {
        *self > Self::U_BEGIN && *self < Self::U_END
    }

    pub fn is_signed(&self) -> bool {
        *self > Self::S_BEGIN && *self < Self::S_END
    }

    pub fn is_float(&self) -> bool {
        matches!(*self, Self::F32 | Self::F64)
    }

    /// Whether the code belongs to one of the three bands
    pub fn is_defined(&self) -> bool {
        self.is_unsigned() || self.is_signed() || self.is_float()
    }

    pub fn is_uptr(&self) -> bool {
        self.0 & !0o7 == Self::PTR_BASE && self.size() >= 4
    }

    /// Short mnemonic used in identifiers
    pub fn identify(&self) -> &'static str {
        match *self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::S8 => "i8",
            Self::S16 => "i16",
            Self::S32 => "i32",
            Self::S64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
            Self::TERMINATE => "end",
            other if other.is_uptr() => "uptr",
            _ => "?",
        }
    }

    /// Inverse of `identify` for the defined codes
    pub fn from_mnemonic(name: &str) -> Option<Self> {
        Self::DEFINED.iter().copied().find(|b| b.identify() == name)
    }
}

fn size_class(bytes: u8) -> u8 {
    // trailing_zeros of a power of two is log2
    bytes.trailing_zeros() as u8 + 1
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identify())
    }
}
