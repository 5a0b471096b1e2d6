//! Error types for the build pipeline

use std::io;
use std::ops::Range;

use thiserror::Error;

/// Result type for builder operations.
pub type BuildResult<T> = Result<T, BuildError>;

/// Failure to load the raw content of a logical path.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The path is unknown to the reader.
    #[error("cannot find module '{0}'")]
    NotFound(String),

    /// The path resolved to a file that could not be read.
    #[error("cannot read module '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Failure reported by a [`Compiler`](crate::Compiler) for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{file}: {message}")]
pub struct CompileError {
    /// Logical path of the unit being compiled
    pub file: String,
    pub message: String,
    /// Byte range in the unit's source, when the compiler knows it
    pub span: Option<Range<usize>>,
}

impl CompileError {
    pub fn new(file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            message: message.into(),
            span: None,
        }
    }

    pub fn with_span(mut self, span: Range<usize>) -> Self {
        self.span = Some(span);
        self
    }
}

/// Any failure that aborts a build.
///
/// Both variants are transparent: the caller sees the originating error
/// unchanged.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}
