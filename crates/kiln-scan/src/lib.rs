//! Kiln require scanner
//!
//! A [`Compiler`](kiln_build::Compiler) backend that only understands
//! `require` directives. It reports them as the unit's requires, rewrites
//! them into runtime calls, and leaves every other byte of the source alone.

pub mod token;
pub mod lexer;
pub mod compiler;

pub use token::{Span, Token, TokenKind};
pub use lexer::Lexer;
pub use compiler::{ScanCompiler, ScanOptions};
