//! Require-directive compiler backend

use kiln_build::{CompileError, CompileOptions, CompiledUnit, Compiler};

use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};

/// Settings for [`ScanCompiler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Name of the runtime object that provides `require` and `define`
    pub runtime: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            runtime: "Kiln".to_string(),
        }
    }
}

/// Compiles units by rewriting their `require` directives.
///
/// A directive is the identifier `require` at the start of a statement
/// (line start or after `;`) followed by a string literal, optionally in
/// parentheses. Only the directive itself is rewritten; the rest of its
/// line passes through. Requirable units are wrapped in a `define` call
/// keyed on their logical path.
#[derive(Debug, Clone, Default)]
pub struct ScanCompiler {
    options: ScanOptions,
}

/// A require directive found in the source
struct Directive {
    span: Span,
    path: String,
}

impl ScanCompiler {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    fn scan(&self, source: &str, file: &str) -> Result<Vec<Directive>, CompileError> {
        let tokens = Lexer::new(source).tokenize();

        let mut directives = Vec::new();
        let mut at_statement_start = true;
        let mut i = 0;

        while i < tokens.len() {
            let token = &tokens[i];
            if at_statement_start && token.is_ident("require") {
                let (directive, next) = parse_directive(source, &tokens, i, file)?;
                directives.push(directive);
                at_statement_start = false;
                i = next;
                continue;
            }
            at_statement_start = token.kind == TokenKind::Newline
                || (token.kind == TokenKind::Other && token.value == ";");
            i += 1;
        }

        Ok(directives)
    }

    fn rewrite(&self, source: &str, directives: &[Directive]) -> String {
        let mut out = String::with_capacity(source.len());
        let mut last = 0;

        for directive in directives {
            out.push_str(&source[last..directive.span.start]);
            out.push_str(&format!("{}.require({})", self.options.runtime, quote(&directive.path)));
            last = directive.span.end;
        }
        out.push_str(&source[last..]);
        out
    }
}

/// Parse `require 'path'` or `require('path')` starting at `tokens[start]`.
/// Returns the directive and the index of the first token after it.
fn parse_directive(
    source: &str,
    tokens: &[Token],
    start: usize,
    file: &str,
) -> Result<(Directive, usize), CompileError> {
    let keyword = &tokens[start];
    let mut i = start + 1;

    let parenthesised = tokens[i].kind == TokenKind::LParen;
    if parenthesised {
        i += 1;
    }

    let literal = &tokens[i];
    match literal.kind {
        TokenKind::StringLiteral => {}
        TokenKind::Error => {
            return Err(
                CompileError::new(file, literal.value.clone()).with_span(literal.span.range())
            );
        }
        _ => return Err(expected_literal(file, literal, keyword)),
    }
    // Double-quoted literals interpolate
    if source[literal.span.start..].starts_with('"') && literal.value.contains("#{") {
        return Err(CompileError::new(file, "require path cannot be interpolated")
            .with_span(literal.span.range()));
    }
    i += 1;

    let mut end = literal.span.end;
    if parenthesised {
        if tokens[i].kind != TokenKind::RParen {
            return Err(CompileError::new(file, "expected ')' after require path")
                .with_span(tokens[i].span.range()));
        }
        end = tokens[i].span.end;
        i += 1;
    }

    let directive = Directive {
        span: Span::new(keyword.span.start, end),
        path: literal.value.clone(),
    };
    Ok((directive, i))
}

fn expected_literal(file: &str, found: &Token, keyword: &Token) -> CompileError {
    let span = if found.kind == TokenKind::Eof || found.kind == TokenKind::Newline {
        keyword.span
    } else {
        found.span
    };
    CompileError::new(file, "require expects a string literal").with_span(span.range())
}

/// Quote a string as a double-quoted JS literal
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

impl Compiler for ScanCompiler {
    fn compile(
        &self,
        source: &str,
        options: &CompileOptions,
    ) -> Result<CompiledUnit, CompileError> {
        let directives = self.scan(source, &options.file)?;
        let body = self.rewrite(source, &directives);

        let compiled = if options.requirable {
            format!(
                "{}.define({}, function() {{\n{}\n}});",
                self.options.runtime,
                quote(&options.file),
                body.trim_end_matches('\n')
            )
        } else {
            body
        };

        Ok(CompiledUnit {
            compiled,
            requires: directives.into_iter().map(|d| d.path).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str, options: CompileOptions) -> Result<CompiledUnit, CompileError> {
        ScanCompiler::default().compile(source, &options)
    }

    #[test]
    fn test_source_without_requires_is_unchanged() {
        let unit = compile("puts 'hello'\n", CompileOptions::standalone("main.rb")).unwrap();
        assert_eq!(unit.compiled, "puts 'hello'\n");
        assert!(unit.requires.is_empty());
    }

    #[test]
    fn test_requires_in_source_order() {
        let source = "require 'foo'\n  require(\"bar/baz\") # vendored\nputs 1\n";
        let unit = compile(source, CompileOptions::standalone("main.rb")).unwrap();

        assert_eq!(unit.requires, ["foo", "bar/baz"]);
        assert_eq!(
            unit.compiled,
            "Kiln.require(\"foo\")\n  Kiln.require(\"bar/baz\") # vendored\nputs 1\n"
        );
    }

    #[test]
    fn test_require_mid_line_is_not_a_directive() {
        let source = "x = require 'foo'\nfoo.require 'bar'\n";
        let unit = compile(source, CompileOptions::standalone("a")).unwrap();
        assert!(unit.requires.is_empty());
    }

    #[test]
    fn test_requirable_unit_is_wrapped() {
        let unit = compile("require 'b'\nputs 2\n", CompileOptions::requirable("lib/a")).unwrap();
        assert_eq!(
            unit.compiled,
            "Kiln.define(\"lib/a\", function() {\nKiln.require(\"b\")\nputs 2\n});"
        );
        assert_eq!(unit.requires, ["b"]);
    }

    #[test]
    fn test_custom_runtime_name() {
        let compiler = ScanCompiler::new(ScanOptions {
            runtime: "Opal".to_string(),
        });
        let unit = compiler.compile("require 'x'", &CompileOptions::standalone("m")).unwrap();
        assert_eq!(unit.compiled, "Opal.require(\"x\")");
    }

    #[test]
    fn test_require_without_literal_is_an_error() {
        let err =
            compile("puts 1\nrequire foo\n", CompileOptions::standalone("main.rb")).unwrap_err();
        assert_eq!(err.file, "main.rb");
        assert_eq!(err.message, "require expects a string literal");
        assert_eq!(err.span, Some(15..18));
    }

    #[test]
    fn test_interpolated_require_is_an_error() {
        let err =
            compile("require \"lib/#{name}\"\n", CompileOptions::standalone("m")).unwrap_err();
        assert_eq!(err.message, "require path cannot be interpolated");

        // Single quotes do not interpolate
        let unit = compile("require 'lib/#{name}'\n", CompileOptions::standalone("m")).unwrap();
        assert_eq!(unit.requires, ["lib/#{name}"]);
    }

    #[test]
    fn test_rest_of_line_passes_through() {
        let source = "require 'json' unless defined?(JSON)\n";
        let unit = compile(source, CompileOptions::standalone("m")).unwrap();
        assert_eq!(unit.requires, ["json"]);
        assert_eq!(unit.compiled, "Kiln.require(\"json\") unless defined?(JSON)\n");
    }

    #[test]
    fn test_semicolon_starts_another_directive() {
        let source = "require 'a'; require('b'); puts 1\n";
        let unit = compile(source, CompileOptions::standalone("m")).unwrap();
        assert_eq!(unit.requires, ["a", "b"]);
        assert_eq!(unit.compiled, "Kiln.require(\"a\"); Kiln.require(\"b\"); puts 1\n");
    }

    #[test]
    fn test_heredoc_with_apostrophe_compiles() {
        let source = "require 'a'\ntext = <<~EOS\n  it's fine\nEOS\nputs text\n";
        let unit = compile(source, CompileOptions::standalone("m")).unwrap();
        assert_eq!(unit.requires, ["a"]);
        assert_eq!(
            unit.compiled,
            "Kiln.require(\"a\")\ntext = <<~EOS\n  it's fine\nEOS\nputs text\n"
        );
    }

    #[test]
    fn test_require_inside_heredoc_is_text() {
        let source = "doc = <<~TXT\nrequire \"x\"\nTXT\n";
        let unit = compile(source, CompileOptions::standalone("m")).unwrap();
        assert!(unit.requires.is_empty());
        assert_eq!(unit.compiled, source);
    }

    #[test]
    fn test_stray_quote_outside_directive_is_opaque() {
        let source = "q = ?'\nputs q\nrequire 'later'\n";
        let unit = compile(source, CompileOptions::standalone("m")).unwrap();
        assert_eq!(unit.requires, ["later"]);

        let source = "pattern = %q(don't)\nrequire 'b'\n";
        let unit = compile(source, CompileOptions::standalone("m")).unwrap();
        assert_eq!(unit.requires, ["b"]);
    }

    #[test]
    fn test_unterminated_require_path_reports_span() {
        let err = compile("require 'foo\n", CompileOptions::standalone("m")).unwrap_err();
        assert_eq!(err.message, "Unterminated string literal");
        assert_eq!(err.span, Some(8..12));
    }

    #[test]
    fn test_unclosed_paren_is_an_error() {
        let err = compile("require('a' 'b')\n", CompileOptions::standalone("m")).unwrap_err();
        assert_eq!(err.message, "expected ')' after require path");
        assert_eq!(err.span, Some(12..15));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote(r#"a"b\c"#), r#""a\"b\\c""#);
    }
}
