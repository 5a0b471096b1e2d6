use crate::token::{Span, Token, TokenKind};

/// Identifiers after which an expression operand is expected
const OPERAND_KEYWORDS: &[&str] = &[
    "if", "unless", "elsif", "when", "while", "until", "and", "or", "not", "return", "then",
    "do", "in", "puts", "print", "p",
];

/// Letters allowed between `%` and the delimiter of a percent literal
const PERCENT_KINDS: &str = "qQwWiIrsx";

/// Heredoc whose body starts on the line after its opener
struct Heredoc {
    terminator: String,
    /// `<<~` and `<<-` allow the terminator to be indented
    indented: bool,
}

/// Tokenizer for require scanning.
///
/// Only identifiers, string literals, parentheses and line breaks are
/// significant. `#` comments, whitespace and heredoc bodies are skipped;
/// regexes and other literal forms come back as opaque `Literal` tokens.
pub struct Lexer<'a> {
    source: &'a str,
    chars: std::str::CharIndices<'a>,
    current_pos: usize,
    current_char: Option<char>,
    pending_heredocs: Vec<Heredoc>,
    /// Last token produced on the current line
    last: Option<Token>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer from source code.
    pub fn new(source: &'a str) -> Self {
        let mut chars = source.char_indices();
        let current_char = chars.next().map(|(_, c)| c);
        Self {
            source,
            chars,
            current_pos: 0,
            current_char,
            pending_heredocs: Vec::new(),
            last: None,
        }
    }

    /// Tokenizes the entire source and returns all tokens, ending with `Eof`.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Gets the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_blanks_and_comments();

        let start = self.current_pos;

        let token = match self.current_char {
            None => Token::new(TokenKind::Eof, Span::new(start, start), String::new()),
            Some(ch) => match ch {
                '\n' => {
                    let token = self.single(TokenKind::Newline);
                    self.skip_heredoc_bodies();
                    token
                }
                '"' | '\'' => self.read_string_literal(ch),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                '?' if self.operand_expected()
                    && self.peek().is_some_and(|c| !c.is_whitespace()) =>
                {
                    self.read_char_literal()
                }
                '%' if self.operand_expected() => match self.percent_delimiter() {
                    Some(open) => self.read_percent_literal(open),
                    None => self.single(TokenKind::Other),
                },
                '/' if self.slash_starts_regex() => self.read_regex(),
                '<' if self.peek() == Some('<') => self.read_heredoc_opener(),
                '$' => self.read_global(),
                _ if ch.is_alphabetic() || ch == '_' => self.read_identifier(),
                _ => self.single(TokenKind::Other),
            },
        };

        self.last = match token.kind {
            TokenKind::Newline | TokenKind::Eof => None,
            _ => Some(token.clone()),
        };
        token
    }

    fn advance(&mut self) {
        if let Some((pos, ch)) = self.chars.next() {
            self.current_pos = pos;
            self.current_char = Some(ch);
        } else {
            self.current_pos = self.source.len();
            self.current_char = None;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.clone().next().map(|(_, c)| c)
    }

    fn advance_to(&mut self, pos: usize) {
        while self.current_pos < pos && self.current_char.is_some() {
            self.advance();
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.current_pos;
        let value = self.current_char.map(String::from).unwrap_or_default();
        self.advance();
        Token::new(kind, Span::new(start, self.current_pos), value)
    }

    /// Token covering `start..current_pos` with the raw source as its value
    fn raw(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(
            kind,
            Span::new(start, self.current_pos),
            self.source[start..self.current_pos].to_string(),
        )
    }

    /// Whether the previous token leaves the parser expecting an operand,
    /// which decides between `/regex/` and division, `?c` and a ternary.
    fn operand_expected(&self) -> bool {
        let Some(last) = &self.last else {
            return true;
        };
        match last.kind {
            TokenKind::Ident => OPERAND_KEYWORDS.contains(&last.value.as_str()),
            TokenKind::StringLiteral | TokenKind::Literal | TokenKind::RParen => false,
            TokenKind::Other => {
                !(last.value.chars().all(char::is_alphanumeric)
                    || last.value == "]"
                    || last.value == "}")
            }
            _ => true,
        }
    }

    /// `split /,/` is a regex argument; `a / b` and `a/b` are division.
    fn slash_starts_regex(&self) -> bool {
        if self.operand_expected() {
            return true;
        }
        let after_ident = self.last.as_ref().is_some_and(|t| t.kind == TokenKind::Ident);
        let space_before = self.source[..self.current_pos]
            .ends_with(|c: char| c == ' ' || c == '\t');
        let space_after = self.peek().map_or(true, char::is_whitespace);
        after_ident && space_before && !space_after
    }

    /// Scan ahead from the current (opening) delimiter for its match
    fn is_closed(&self, open: char, close: char, single_line: bool) -> bool {
        let mut rest = self.chars.clone().map(|(_, c)| c);
        let mut depth = 0usize;
        while let Some(ch) = rest.next() {
            if ch == '\\' {
                rest.next();
            } else if ch == close {
                if depth == 0 {
                    return true;
                }
                depth -= 1;
            } else if ch == open {
                depth += 1;
            } else if ch == '\n' && single_line {
                return false;
            }
        }
        false
    }

    /// Consume through the delimiter matching the current one
    fn consume_delimited(&mut self, open: char, close: char) {
        self.advance(); // Skip opening delimiter
        let mut depth = 0usize;
        while let Some(ch) = self.current_char {
            self.advance();
            if ch == '\\' {
                self.advance();
            } else if ch == close {
                if depth == 0 {
                    return;
                }
                depth -= 1;
            } else if ch == open {
                depth += 1;
            }
        }
    }

    /// Error token running to the end of the current line; lexing resumes there
    fn unterminated(&mut self, start: usize, what: &str) -> Token {
        while !matches!(self.current_char, None | Some('\n')) {
            self.advance();
        }
        Token::new(
            TokenKind::Error,
            Span::new(start, self.current_pos),
            format!("Unterminated {}", what),
        )
    }

    fn skip_blanks_and_comments(&mut self) {
        while let Some(ch) = self.current_char {
            match ch {
                '\n' => break,
                '#' => {
                    // Runs up to, not including, the line break
                    while !matches!(self.current_char, None | Some('\n')) {
                        self.advance();
                    }
                }
                _ if ch.is_whitespace() => self.advance(),
                _ => break,
            }
        }
    }

    fn read_string_literal(&mut self, quote: char) -> Token {
        let start = self.current_pos;
        if !self.is_closed(quote, quote, false) {
            return self.unterminated(start, "string literal");
        }
        self.advance(); // Skip opening quote

        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if ch == quote {
                self.advance(); // Skip closing quote
                break;
            } else if ch == '\\' {
                self.advance();
                if let Some(escaped) = self.current_char {
                    let unescaped = match escaped {
                        'n' if quote == '"' => '\n',
                        't' if quote == '"' => '\t',
                        '\\' | '\'' | '"' => escaped,
                        _ => {
                            value.push('\\');
                            escaped
                        }
                    };
                    value.push(unescaped);
                    self.advance();
                }
            } else {
                value.push(ch);
                self.advance();
            }
        }

        Token::new(TokenKind::StringLiteral, Span::new(start, self.current_pos), value)
    }

    /// `?a`, `?'`, `?\n`
    fn read_char_literal(&mut self) -> Token {
        let start = self.current_pos;
        self.advance(); // Skip '?'
        if self.current_char == Some('\\') {
            self.advance();
        }
        self.advance();
        self.raw(TokenKind::Literal, start)
    }

    /// Delimiter of a `%q(..)`-style literal starting at the current `%`
    fn percent_delimiter(&self) -> Option<char> {
        let mut rest = self.chars.clone().map(|(_, c)| c);
        let mut ch = rest.next()?;
        if PERCENT_KINDS.contains(ch) {
            ch = rest.next()?;
        }
        if ch.is_alphanumeric() || ch.is_whitespace() || ch == '=' {
            None
        } else {
            Some(ch)
        }
    }

    fn read_percent_literal(&mut self, open: char) -> Token {
        let start = self.current_pos;
        while self.current_char != Some(open) {
            self.advance();
        }
        let close = match open {
            '(' => ')',
            '[' => ']',
            '{' => '}',
            '<' => '>',
            other => other,
        };
        if !self.is_closed(open, close, false) {
            return self.unterminated(start, "percent literal");
        }
        self.consume_delimited(open, close);
        self.raw(TokenKind::Literal, start)
    }

    fn read_regex(&mut self) -> Token {
        let start = self.current_pos;
        if !self.is_closed('/', '/', true) {
            return self.unterminated(start, "regex literal");
        }
        self.consume_delimited('/', '/');
        while self.current_char.is_some_and(|c| c.is_ascii_alphabetic()) {
            self.advance();
        }
        self.raw(TokenKind::Literal, start)
    }

    /// `$'`, `$"`, `$0`, `$stdout`
    fn read_global(&mut self) -> Token {
        let start = self.current_pos;
        self.advance(); // Skip '$'
        match self.current_char {
            Some(c) if c.is_alphanumeric() || c == '_' => {
                while self.current_char.is_some_and(|c| c.is_alphanumeric() || c == '_') {
                    self.advance();
                }
            }
            Some(c) if !c.is_whitespace() => self.advance(),
            _ => {}
        }
        self.raw(TokenKind::Literal, start)
    }

    /// `<<~ID`, `<<-ID`, `<<ID` (uppercase) or a quoted id. Anything else is
    /// a plain `<<` operator.
    fn read_heredoc_opener(&mut self) -> Token {
        let start = self.current_pos;
        match parse_heredoc_opener(&self.source[start..]) {
            Some((heredoc, len)) => {
                self.pending_heredocs.push(heredoc);
                self.advance_to(start + len);
                self.raw(TokenKind::Literal, start)
            }
            None => self.single(TokenKind::Other),
        }
    }

    /// Skip the bodies of heredocs opened on the line just ended, leaving
    /// the cursor on the line break after the last terminator.
    fn skip_heredoc_bodies(&mut self) {
        let source = self.source;
        let pending = std::mem::take(&mut self.pending_heredocs);

        for (i, heredoc) in pending.iter().enumerate() {
            if i > 0 && self.current_char == Some('\n') {
                self.advance();
            }
            while self.current_char.is_some() {
                let line_start = self.current_pos;
                let line_end = source[line_start..]
                    .find('\n')
                    .map_or(source.len(), |n| line_start + n);
                let line = source[line_start..line_end].trim_end_matches('\r');
                let is_terminator = if heredoc.indented {
                    line.trim() == heredoc.terminator
                } else {
                    line == heredoc.terminator
                };

                self.advance_to(line_end);
                if is_terminator {
                    break;
                }
                self.advance(); // Skip the line break
            }
        }
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.current_pos;
        let mut value = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' || ch == '?' || ch == '!' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::new(TokenKind::Ident, Span::new(start, self.current_pos), value)
    }
}

/// Parse a heredoc opener at the start of `rest` (which begins with `<<`).
/// Returns the heredoc and the opener's length in bytes.
fn parse_heredoc_opener(rest: &str) -> Option<(Heredoc, usize)> {
    let after_arrows = &rest[2..];
    let (indented, id_part) = match after_arrows.chars().next()? {
        '~' | '-' => (true, &after_arrows[1..]),
        _ => (false, after_arrows),
    };

    let (terminator, id_len) = match id_part.chars().next()? {
        quote @ ('\'' | '"' | '`') => {
            let close = id_part[1..].find(quote)?;
            let id = &id_part[1..1 + close];
            if id.is_empty() || id.contains('\n') {
                return None;
            }
            (id.to_string(), close + 2)
        }
        c if c.is_alphabetic() || c == '_' => {
            // `a <<b` is an append; bare openers need an uppercase id
            if !indented && !c.is_uppercase() {
                return None;
            }
            let len = id_part
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(id_part.len());
            (id_part[..len].to_string(), len)
        }
        _ => return None,
    };

    let len = rest.len() - id_part.len() + id_len;
    Some((Heredoc { terminator, indented }, len))
}
