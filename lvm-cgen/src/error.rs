//! Code generation errors
//!
//! Every error aborts the current generation pass. Nothing is written when
//! generation fails, so a failed pass never leaves partial C source behind.

use lvm_common::{CompilerError, Slot};
use lvm_ir::{CalleeId, TypeError};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodegenError {
    #[error("basic type code {code:#o} has no C equivalent")]
    UnknownBasicType { code: u8 },

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("undefined callee {0}")]
    UndefinedCallee(CalleeId),

    #[error("function '{function}' uses register %{slot}, which is not declared")]
    UndefinedRegister { function: String, slot: Slot },

    #[error("'{callee}' takes {expected_args} argument(s) and {expected_results} result(s), invoked with {args} and {results}")]
    ArityMismatch {
        callee: String,
        expected_args: usize,
        expected_results: usize,
        args: usize,
        results: usize,
    },

    #[error("struct '{structure}' embeds '{needs}' by value before its body is emitted")]
    BodyOrder { structure: String, needs: String },

    #[error("natives '{first}' and '{second}' share link symbol '{symbol}' with different prototypes")]
    ConflictingSymbol { symbol: String, first: String, second: String },

    #[error("recursive inline expansion: {}", chain.join(" -> "))]
    RecursiveInline { chain: Vec<String> },

    #[error("not yet supported: {construct}")]
    Unsupported { construct: String },

    #[error("failed to write {path}: {message}")]
    Io { path: String, message: String },

    #[error("formatting failed")]
    Format(#[from] fmt::Error),
}

impl CodegenError {
    pub fn unsupported(construct: impl Into<String>) -> Self {
        CodegenError::Unsupported { construct: construct.into() }
    }
}

impl From<CodegenError> for CompilerError {
    fn from(err: CodegenError) -> Self {
        match err {
            CodegenError::Io { path, message } => CompilerError::IoError {
                message: format!("{path}: {message}"),
            },
            other => CompilerError::codegen_error(other.to_string()),
        }
    }
}
