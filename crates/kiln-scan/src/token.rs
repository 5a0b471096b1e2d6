/// Byte range of a token in its source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }
}

/// The kinds of tokens the scanner distinguishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    /// Quoted string; `value` holds the unescaped contents
    StringLiteral,
    /// Literal the scanner skips over whole: regexes, `%q(..)` forms,
    /// `?c` characters, `$'`-style globals and heredoc openers
    Literal,
    LParen,
    RParen,
    Newline,
    /// Any other single character
    Other,
    Error,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub value: String,
}

impl Token {
    pub(crate) fn new(kind: TokenKind, span: Span, value: String) -> Self {
        Self { kind, span, value }
    }

    pub fn is_ident(&self, name: &str) -> bool {
        self.kind == TokenKind::Ident && self.value == name
    }
}
