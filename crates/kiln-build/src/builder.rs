//! Linking a module and everything it transitively requires

use std::collections::HashSet;

use tracing::{debug, trace, warn};

use crate::classify::{Classify, ExtensionClassifier, UnitKind};
use crate::compiler::{CompileOptions, Compiler};
use crate::error::{BuildError, BuildResult};
use crate::graph::RequireGraph;
use crate::reader::PathReader;

/// Separator placed between linked fragments
const FRAGMENT_SEPARATOR: &str = "\n";

/// Output contributed by a single module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub path: String,
    pub kind: UnitKind,
    pub text: String,
}

/// Result of linking an entry module.
#[derive(Debug, Clone, Default)]
pub struct LinkedBuild {
    /// Fragments in dependency-first order; the entry is always last
    pub fragments: Vec<Fragment>,
    pub graph: RequireGraph,
}

impl LinkedBuild {
    /// The linked artifact text
    pub fn output(&self) -> String {
        self.fragments
            .iter()
            .map(|f| f.text.as_str())
            .collect::<Vec<_>>()
            .join(FRAGMENT_SEPARATOR)
    }

    pub fn into_output(self) -> String {
        self.output()
    }
}

/// State for one `build` call, threaded through the recursion.
struct ResolverContext {
    visited: HashSet<String>,
    linked: LinkedBuild,
}

impl ResolverContext {
    fn new<I, S>(prerequired: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            visited: prerequired.into_iter().map(Into::into).collect(),
            linked: LinkedBuild::default(),
        }
    }

    fn emit(&mut self, path: &str, kind: UnitKind, text: String) {
        self.linked.fragments.push(Fragment {
            path: path.to_string(),
            kind,
            text,
        });
    }
}

/// Orchestrates a [`PathReader`] and a [`Compiler`] into linked artifacts.
pub struct Builder<R, C> {
    reader: R,
    compiler: C,
    classifier: Box<dyn Classify>,
}

impl<R: PathReader, C: Compiler> Builder<R, C> {
    /// Create a builder that passes `.js` leaves through verbatim
    pub fn new(reader: R, compiler: C) -> Self {
        Self {
            reader,
            compiler,
            classifier: Box::new(ExtensionClassifier::default()),
        }
    }

    /// Replace the predicate deciding which paths are pass-through assets
    pub fn with_classifier(mut self, classifier: impl Classify + 'static) -> Self {
        self.classifier = Box::new(classifier);
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Compile in-memory source on its own.
    ///
    /// The reader is never consulted and the unit's requires are not
    /// linked; `path` only labels diagnostics.
    pub fn build_from_string(&self, source: &str, path: &str) -> BuildResult<String> {
        let unit = self.compiler.compile(source, &CompileOptions::standalone(path))?;
        Ok(unit.compiled)
    }

    /// Link `entry` with every module it transitively requires.
    ///
    /// Modules in `prerequired` are assumed to exist already and
    /// contribute nothing. Any read or compile failure aborts the build.
    pub fn build<I, S>(&self, entry: &str, prerequired: I) -> BuildResult<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(self.build_linked(entry, prerequired)?.into_output())
    }

    /// Like [`build`](Self::build), but keeps the per-module fragments
    /// and the require graph.
    pub fn build_linked<I, S>(&self, entry: &str, prerequired: I) -> BuildResult<LinkedBuild>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ctx = ResolverContext::new(prerequired);

        // The entry is processed even when it was listed as prerequired
        ctx.visited.insert(entry.to_string());
        self.process(entry, false, &mut ctx)?;

        if let Some(cycle) = ctx.linked.graph.find_cycle() {
            warn!(
                cycle = %cycle.join(" -> "),
                "require cycle detected; later occurrences were skipped"
            );
        }

        debug!(entry, modules = ctx.linked.fragments.len(), "linked build");
        Ok(ctx.linked)
    }

    fn require(&self, path: &str, ctx: &mut ResolverContext) -> Result<(), BuildError> {
        if !ctx.visited.insert(path.to_string()) {
            trace!(path, "already linked or prerequired, skipping");
            return Ok(());
        }
        self.process(path, true, ctx)
    }

    fn process(
        &self,
        path: &str,
        is_dependency: bool,
        ctx: &mut ResolverContext,
    ) -> Result<(), BuildError> {
        let content = self.reader.read(path)?;

        match self.classifier.classify(path) {
            UnitKind::Asset => {
                debug!(path, "passing asset through");
                ctx.emit(path, UnitKind::Asset, content);
            }
            UnitKind::Compile => {
                let options = CompileOptions {
                    file: path.to_string(),
                    requirable: is_dependency,
                };
                let unit = self.compiler.compile(&content, &options)?;
                debug!(
                    path,
                    requirable = is_dependency,
                    requires = unit.requires.len(),
                    "compiled"
                );

                ctx.linked.graph.add_module(path, unit.requires.clone());
                for required in &unit.requires {
                    self.require(required, ctx)?;
                }

                ctx.emit(path, UnitKind::Compile, unit.compiled);
            }
        }

        Ok(())
    }
}
