//! Loading raw module content by logical path

use std::collections::BTreeMap;

use crate::error::ReadError;

/// Maps a logical path to its raw textual content.
pub trait PathReader {
    fn read(&self, path: &str) -> Result<String, ReadError>;
}

impl<T: PathReader + ?Sized> PathReader for &T {
    fn read(&self, path: &str) -> Result<String, ReadError> {
        (**self).read(path)
    }
}

impl<T: PathReader + ?Sized> PathReader for Box<T> {
    fn read(&self, path: &str) -> Result<String, ReadError> {
        (**self).read(path)
    }
}

/// Reader over sources held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryPathReader {
    sources: BTreeMap<String, String>,
}

impl MemoryPathReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the content for a path
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.sources.insert(path.into(), content.into());
    }

    /// Builder-style variant of [`insert`](Self::insert)
    pub fn with(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }
}

impl PathReader for MemoryPathReader {
    fn read(&self, path: &str) -> Result<String, ReadError> {
        self.sources
            .get(path)
            .cloned()
            .ok_or_else(|| ReadError::NotFound(path.to_string()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryPathReader {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut reader = Self::new();
        for (path, content) in iter {
            reader.insert(path, content);
        }
        reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_known_path() {
        let reader = MemoryPathReader::new().with("foo/bar.rb", "file source");
        assert_eq!(reader.read("foo/bar.rb").unwrap(), "file source");
    }

    #[test]
    fn test_unknown_path_is_not_found() {
        let reader = MemoryPathReader::new().with("foo", "x");
        match reader.read("foo.rb") {
            Err(ReadError::NotFound(path)) => assert_eq!(path, "foo.rb"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_paths_are_not_normalized() {
        let reader: MemoryPathReader = [("./foo", "a")].into_iter().collect();
        assert_eq!(reader.read("./foo").unwrap(), "a");
        assert!(reader.read("foo").is_err());
    }

    #[test]
    fn test_borrowed_reader() {
        let reader = MemoryPathReader::new().with("a", "1");
        fn read_through<R: PathReader>(reader: R) -> String {
            reader.read("a").unwrap()
        }
        assert_eq!(read_through(&reader), "1");
    }
}
