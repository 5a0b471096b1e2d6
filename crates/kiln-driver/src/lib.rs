//! Kiln Compiler Driver Library
//!
//! Filesystem-backed module loading for the `kiln` command-line tool.

pub mod fs_reader;

pub use fs_reader::FsPathReader;
