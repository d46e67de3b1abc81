//! Template error types.

use thiserror::Error;

/// Error raised while lexing or parsing template text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template: {name}:{line}:{column}: {message}")]
pub struct ParseError {
    /// Name the template was registered under
    pub name: String,
    /// 1-based line of the offending action
    pub line: usize,
    /// 1-based column of the offending action
    pub column: usize,
    /// Byte offset of the offending action in the template text
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(name: &str, pos: Pos, message: impl Into<String>) -> Self {
        Self {
            name: name.to_owned(),
            line: pos.line,
            column: pos.column,
            offset: pos.offset,
            message: message.into(),
        }
    }
}

/// Error raised while executing a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    #[error("template: no template {0:?} associated with the set")]
    NoSuchTemplate(String),

    #[error("template: {name}: {message}")]
    Eval { name: String, message: String },

    #[error("template: {name}: exceeded maximum template depth ({depth})")]
    TooDeep { name: String, depth: usize },
}

/// Error returned by a template function.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FuncError(pub String);

impl From<&str> for FuncError {
    fn from(message: &str) -> Self {
        Self(message.to_owned())
    }
}

impl From<String> for FuncError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

/// Position of an item inside template text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}
