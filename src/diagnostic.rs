//! Position-decorated file errors.
//!
//! A [`FileError`] wraps a message from front matter or template parsing
//! with the file position it refers to and a short source snippet:
//!
//! ```text
//! "content/post.md:3:7": expected `=`
//!   2 | title = "Post"
//! > 3 | draft true
//!   4 | +++
//! ```

use std::{fmt, path::Path};
use thiserror::Error;

/// Lines of context shown on each side of the error line.
const CONTEXT_LINES: usize = 2;

/// A location inside a file. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub filename: String,
    pub line: usize,
    pub column: usize,
    /// Byte offset, when the error source reported one.
    pub offset: Option<usize>,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}:{}:{}\"", self.filename, self.line, self.column)
    }
}

/// Source lines around the error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    pub lines: Vec<String>,
    /// 1-based number of `lines[0]`.
    pub first_line: usize,
    /// Index of the error line within `lines`.
    pub pos: usize,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = (self.first_line + self.lines.len()).to_string().len();
        for (i, line) in self.lines.iter().enumerate() {
            let marker = if i == self.pos { '>' } else { ' ' };
            writeln!(f, "{marker} {:>width$} | {line}", self.first_line + i)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub struct FileError {
    pub position: Position,
    /// File type derived from the extension (`md`, `toml`, `html`, ...)
    /// or from the parser that failed (`json`, `toml`).
    pub file_type: String,
    pub message: String,
    pub context: Option<ErrorContext>,
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)?;
        if let Some(context) = &self.context {
            write!(f, "\n{context}")?;
        }
        Ok(())
    }
}

impl FileError {
    /// Error at line 1, column 1 of `filename`.
    pub fn new(filename: &str, message: impl Into<String>) -> Self {
        let file_type = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_owned();
        Self {
            position: Position {
                filename: filename.to_owned(),
                line: 1,
                column: 1,
                offset: None,
            },
            file_type,
            message: message.into(),
            context: None,
        }
    }

    /// Override the detected file type.
    pub fn with_file_type(mut self, file_type: &str) -> Self {
        self.file_type = file_type.to_owned();
        self
    }

    /// Position the error by line and column and attach context from `source`.
    pub fn at_line(mut self, source: &str, line: usize, column: usize) -> Self {
        self.position.line = line.max(1);
        self.position.column = column.max(1);
        self.context = context_for(source, self.position.line);
        self
    }

    /// Position the error by byte offset, locating its line in `source`.
    pub fn at_offset(mut self, source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source[..floor_char_boundary(source, offset)];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;

        self.position.offset = Some(offset);
        self.at_line(source, line, column)
    }

    /// Shift the position down by `lines`, for errors reported against a
    /// fragment (front matter block) of a larger file.
    pub fn shifted(mut self, full_source: &str, lines: usize) -> Self {
        let line = self.position.line + lines;
        let column = self.position.column;
        self.position.offset = None;
        self.at_line(full_source, line, column)
    }
}

fn context_for(source: &str, line: usize) -> Option<ErrorContext> {
    let all: Vec<&str> = source.lines().collect();
    if line == 0 || line > all.len() {
        return None;
    }
    let index = line - 1;
    let start = index.saturating_sub(CONTEXT_LINES);
    let end = (index + CONTEXT_LINES + 1).min(all.len());
    Some(ErrorContext {
        lines: all[start..end].iter().map(|l| (*l).to_owned()).collect(),
        first_line: start + 1,
        pos: index - start,
    })
}

fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

// ============================================================================
// Tests
// ============================================================================
