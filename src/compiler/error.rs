use crate::reflector::ReflectionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    /// Expression outside the supported grammar, or a reference that does
    /// not resolve. The message names the location of the expression.
    #[error("{message}")]
    UnableToCompileNode {
        message: String,
        /// Constant that could not be resolved, `Class::NAME` for class
        /// constants.
        constant_name: Option<String>,
        class_name: Option<String>,
    },

    #[error("Cyclic constant reference: {}", .chain.join(" -> "))]
    CyclicConstantReference { chain: Vec<String> },

    #[error(transparent)]
    Reflection(Box<ReflectionError>),
}

impl CompileError {
    pub(crate) fn unable(message: impl Into<String>) -> Self {
        CompileError::UnableToCompileNode {
            message: message.into(),
            constant_name: None,
            class_name: None,
        }
    }

    /// Unresolved constant named by this error, if any.
    pub fn constant_name(&self) -> Option<&str> {
        match self {
            CompileError::UnableToCompileNode { constant_name, .. } => constant_name.as_deref(),
            _ => None,
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            CompileError::UnableToCompileNode { class_name, .. } => class_name.as_deref(),
            _ => None,
        }
    }
}

/// Compile errors raised while reflecting a referenced symbol are passed
/// through unwrapped.
impl From<ReflectionError> for CompileError {
    fn from(err: ReflectionError) -> Self {
        match err {
            ReflectionError::Compile(inner) => inner,
            other => CompileError::Reflection(Box::new(other)),
        }
    }
}
