//! Deciding whether a module is compiled or passed through verbatim

/// How a module's content contributes to the linked output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    /// Handed to the compiler; its requires are followed
    Compile,
    /// Emitted as-is and never scanned for requires
    Asset,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Compile => "compile",
            UnitKind::Asset => "asset",
        }
    }
}

/// Classification predicate over logical paths.
pub trait Classify {
    fn classify(&self, path: &str) -> UnitKind;
}

impl<F> Classify for F
where
    F: Fn(&str) -> UnitKind,
{
    fn classify(&self, path: &str) -> UnitKind {
        self(path)
    }
}

/// Treats paths whose trailing name ends in one of the given extensions as assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionClassifier {
    extensions: Vec<String>,
}

impl ExtensionClassifier {
    /// Extensions may be given with or without the leading dot.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_string())
            .filter(|ext| !ext.is_empty())
            .collect();
        Self { extensions }
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}

impl Default for ExtensionClassifier {
    fn default() -> Self {
        Self::new(["js"])
    }
}

impl Classify for ExtensionClassifier {
    fn classify(&self, path: &str) -> UnitKind {
        let name = path.rsplit('/').next().unwrap_or(path);
        let is_asset = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => self.extensions.iter().any(|e| e == ext),
            _ => false,
        };

        if is_asset {
            UnitKind::Asset
        } else {
            UnitKind::Compile
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_treats_js_as_asset() {
        let classifier = ExtensionClassifier::default();
        assert_eq!(classifier.classify("foo.js"), UnitKind::Asset);
        assert_eq!(classifier.classify("vendor/jquery.min.js"), UnitKind::Asset);
        assert_eq!(classifier.classify("foo"), UnitKind::Compile);
        assert_eq!(classifier.classify("foo/bar.rb"), UnitKind::Compile);
    }

    #[test]
    fn test_only_trailing_name_counts() {
        let classifier = ExtensionClassifier::default();
        assert_eq!(classifier.classify("lib.js/helpers"), UnitKind::Compile);
        assert_eq!(classifier.classify("dir/.js"), UnitKind::Compile);
        assert_eq!(classifier.classify("foo.jsx"), UnitKind::Compile);
    }

    #[test]
    fn test_custom_extensions() {
        let classifier = ExtensionClassifier::new([".css", "js"]);
        assert_eq!(classifier.extensions(), ["css", "js"]);
        assert_eq!(classifier.classify("style.css"), UnitKind::Asset);
        assert_eq!(classifier.classify("app.js"), UnitKind::Asset);
    }

    #[test]
    fn test_closure_classifier() {
        let classifier = |path: &str| {
            if path.starts_with("vendor/") {
                UnitKind::Asset
            } else {
                UnitKind::Compile
            }
        };
        assert_eq!(classifier.classify("vendor/x"), UnitKind::Asset);
        assert_eq!(classifier.classify("app"), UnitKind::Compile);
    }
}
