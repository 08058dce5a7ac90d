//! Error handling for the LangVM C backend
//!
//! Each phase defines its own error enum; all of them convert into
//! `CompilerError` so the driver can report a single type.

use thiserror::Error;

/// Main error type that encompasses all phases of the backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("Type error: {message}")]
    Type { message: String },

    #[error("Code generation error: {message}")]
    Codegen { message: String },

    #[error("Module load error: {message}")]
    Load { message: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Internal compiler error: {message}")]
    InternalError { message: String },
}

impl CompilerError {
    /// Create a type model error
    pub fn type_error(message: String) -> Self {
        CompilerError::Type { message }
    }

    /// Create a codegen error
    pub fn codegen_error(message: String) -> Self {
        CompilerError::Codegen { message }
    }

    /// Create a module load error
    pub fn load_error(message: String) -> Self {
        CompilerError::Load { message }
    }
}

/// Convert from std::io::Error
impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

/// Convert from String (for simple error cases)
impl From<String> for CompilerError {
    fn from(message: String) -> Self {
        CompilerError::InternalError { message }
    }
}
