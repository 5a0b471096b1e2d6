//! Kiln Build Library
//!
//! Dependency-resolving build pipeline. Given a logical module path, the
//! [`Builder`] reads it through a [`PathReader`], compiles it with a
//! [`Compiler`], walks the requires the compiler reports, and links every
//! module exactly once in dependency-first order.

pub mod error;
pub mod reader;
pub mod compiler;
pub mod classify;
pub mod graph;
pub mod builder;

pub use error::{BuildError, BuildResult, CompileError, ReadError};
pub use reader::{MemoryPathReader, PathReader};
pub use compiler::{CompileOptions, CompiledUnit, Compiler};
pub use classify::{Classify, ExtensionClassifier, UnitKind};
pub use graph::RequireGraph;
pub use builder::{Builder, Fragment, LinkedBuild};
