//! Reading logical paths from load-path directories

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use kiln_build::{PathReader, ReadError};
use tracing::trace;

/// Source extensions tried when a logical path has no exact match
pub const DEFAULT_EXTENSIONS: &[&str] = &["rb"];

/// Reads modules by searching an ordered list of load paths.
#[derive(Debug, Clone)]
pub struct FsPathReader {
    load_paths: Vec<PathBuf>,
    extensions: Vec<String>,
}

impl FsPathReader {
    /// Create a reader over the given load paths with the default extensions
    pub fn new(load_paths: Vec<PathBuf>) -> Self {
        Self {
            load_paths,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replace the list of source extensions (with or without leading dot)
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim_start_matches('.').to_string())
            .collect();
        self
    }

    pub fn load_paths(&self) -> &[PathBuf] {
        &self.load_paths
    }

    /// Find the file a logical path refers to, if any
    pub fn expand(&self, path: &str) -> Option<PathBuf> {
        let logical = Path::new(path);

        if logical.is_absolute() {
            return self.try_candidates(logical);
        }

        self.load_paths
            .iter()
            .find_map(|dir| self.try_candidates(&dir.join(logical)))
    }

    /// Try the exact path, then the path with each extension appended
    fn try_candidates(&self, target: &Path) -> Option<PathBuf> {
        if target.is_file() {
            return Some(target.to_path_buf());
        }

        for ext in &self.extensions {
            let mut with_ext = target.as_os_str().to_owned();
            with_ext.push(".");
            with_ext.push(ext);
            let candidate = PathBuf::from(with_ext);
            trace!(candidate = %candidate.display(), "trying");
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        None
    }
}

impl PathReader for FsPathReader {
    fn read(&self, path: &str) -> Result<String, ReadError> {
        let full_path = self
            .expand(path)
            .ok_or_else(|| ReadError::NotFound(path.to_string()))?;

        fs::read_to_string(&full_path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ReadError::NotFound(path.to_string()),
            _ => ReadError::Io {
                path: path.to_string(),
                source,
            },
        })
    }
}
