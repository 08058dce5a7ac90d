//! Target configuration
//!
//! The pointer width of the target machine is an explicit input to the type
//! model rather than a property of the host running the compiler, so a
//! 64-bit host can generate code for a 32-bit target.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::CompilerError;

/// Size of a target pointer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PointerWidth {
    /// 4-byte pointers (32-bit targets)
    Four,
    /// 8-byte pointers (64-bit targets)
    #[default]
    Eight,
}

impl PointerWidth {
    /// Pointer size in bytes
    pub fn bytes(&self) -> u8 {
        match self {
            PointerWidth::Four => 4,
            PointerWidth::Eight => 8,
        }
    }
}

impl TryFrom<u8> for PointerWidth {
    type Error = CompilerError;

    fn try_from(bytes: u8) -> Result<Self, Self::Error> {
        match bytes {
            4 => Ok(PointerWidth::Four),
            8 => Ok(PointerWidth::Eight),
            other => Err(CompilerError::InternalError {
                message: format!("unsupported pointer width {other}, expected 4 or 8"),
            }),
        }
    }
}

impl From<PointerWidth> for u8 {
    fn from(width: PointerWidth) -> Self {
        width.bytes()
    }
}

impl fmt::Display for PointerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bytes())
    }
}

/// Target machine description handed to the type model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default)]
    pub pointer_width: PointerWidth,
}

impl TargetConfig {
    pub fn new(pointer_width: PointerWidth) -> Self {
        Self { pointer_width }
    }
}
