//! The compile-one-unit capability

use crate::error::CompileError;

/// Metadata handed to the compiler alongside a unit's source.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompileOptions {
    /// Logical path the source came from (diagnostics only)
    pub file: String,
    /// Set when the unit is linked as a dependency rather than built standalone
    pub requirable: bool,
}

impl CompileOptions {
    /// Options for a unit built on its own
    pub fn standalone(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            requirable: false,
        }
    }

    /// Options for a unit linked in as somebody's dependency
    pub fn requirable(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            requirable: true,
        }
    }
}

/// Output of compiling a single unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledUnit {
    pub compiled: String,
    /// Logical paths this unit depends on, in the order they were declared
    pub requires: Vec<String>,
}

impl CompiledUnit {
    pub fn new(compiled: impl Into<String>) -> Self {
        Self {
            compiled: compiled.into(),
            requires: Vec::new(),
        }
    }

    pub fn with_requires<I, S>(mut self, requires: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires = requires.into_iter().map(Into::into).collect();
        self
    }
}

/// Turns source text into output text and reports its direct requires.
///
/// One call is one unit; implementations must not carry state between
/// calls that would change the result for identical inputs.
pub trait Compiler {
    fn compile(&self, source: &str, options: &CompileOptions) -> Result<CompiledUnit, CompileError>;
}

impl<T: Compiler + ?Sized> Compiler for &T {
    fn compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompiledUnit, CompileError> {
        (**self).compile(source, options)
    }
}

impl<T: Compiler + ?Sized> Compiler for Box<T> {
    fn compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompiledUnit, CompileError> {
        (**self).compile(source, options)
    }
}
