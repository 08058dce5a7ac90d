//! LangVM C Backend - Common Types and Utilities
//! 
//! This crate contains shared identifiers, the target configuration, and the
//! umbrella error type used across all components of the LangVM C backend.

pub mod error;
pub mod target;

pub use error::CompilerError;
pub use target::{PointerWidth, TargetConfig};

/// Register slot index inside a function's register file
pub type Slot = u32;

/// Basic block index inside the owning function's block sequence
pub type BlockIndex = u32;
