//! Type Signatures
//!
//! A signature is the flattened shape of a type: the sequence of primitive
//! codes it lays out as, with pointers encoded as `U_PTR <pointee...> TERMINATE`.
//! Two types with equal signatures are interchangeable at the ABI level.

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::BasicType;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeSignature {
    pub sequence: Vec<BasicType>,
}

impl TypeSignature {
    pub fn new() -> Self {
        Self { sequence: Vec::new() }
    }

    pub fn of_basic(basic: BasicType) -> Self {
        Self { sequence: vec![basic] }
    }

    /// `[uptr] ++ pointee ++ [TERMINATE]`
    pub fn pointer(uptr: BasicType, pointee: &TypeSignature) -> Self {
        let mut sequence = Vec::with_capacity(pointee.len() + 2);
        sequence.push(uptr);
        sequence.extend_from_slice(&pointee.sequence);
        sequence.push(BasicType::TERMINATE);
        Self { sequence }
    }

    /// Append another signature in place
    pub fn extend(&mut self, other: &TypeSignature) {
        self.sequence.extend_from_slice(&other.sequence);
    }

    pub fn as_slice(&self) -> &[BasicType] {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Raw codes, for hashing or wire formats
    pub fn codes(&self) -> Vec<u8> {
        self.sequence.iter().map(|b| b.code()).collect()
    }
}

impl From<Vec<BasicType>> for TypeSignature {
    fn from(sequence: Vec<BasicType>) -> Self {
        Self { sequence }
    }
}

impl fmt::Display for TypeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, code) in self.sequence.iter().enumerate() {
            if i > 0 { write!(f, " ")?; }
            write!(f, "{code}")?;
        }
        write!(f, "]")
    }
}
