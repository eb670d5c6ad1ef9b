use std::{fmt, iter::Peekable, str::CharIndices};

use crate::error::{QueryError, QueryResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    Ident(String),
    Number(f64),
    Duration(String),
    Str(String),
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    /// `==`
    EqlEql,
    /// `!=`
    Neq,
    Gtr,
    Lss,
    Gte,
    Lte,
    /// `=`
    Eql,
    /// `=~`
    EqlRegex,
    /// `!~`
    NeqRegex,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Ident(s) => write!(f, "identifier {s:?}"),
            TokenKind::Number(n) => write!(f, "number {n}"),
            TokenKind::Duration(d) => write!(f, "duration {d:?}"),
            TokenKind::Str(s) => write!(f, "string {s:?}"),
            TokenKind::Eof => f.write_str("end of input"),
            other => write!(f, "{:?}", other.symbol()),
        }
    }
}

impl TokenKind {
    fn symbol(&self) -> &'static str {
        match self {
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Add => "+",
            TokenKind::Sub => "-",
            TokenKind::Mul => "*",
            TokenKind::Div => "/",
            TokenKind::Mod => "%",
            TokenKind::Pow => "^",
            TokenKind::EqlEql => "==",
            TokenKind::Neq => "!=",
            TokenKind::Gtr => ">",
            TokenKind::Lss => "<",
            TokenKind::Gte => ">=",
            TokenKind::Lte => "<=",
            TokenKind::Eql => "=",
            TokenKind::EqlRegex => "=~",
            TokenKind::NeqRegex => "!~",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character.
    pub pos: usize,
}

/// Splits the source into tokens; the result always ends with [`TokenKind::Eof`].
pub(crate) fn tokenize(src: &str) -> QueryResult<Vec<Token>> {
    let mut lexer = Lexer {
        src,
        chars: src.char_indices().peekable(),
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    src: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl Lexer<'_> {
    fn next_token(&mut self) -> QueryResult<Token> {
        self.skip_trivia();

        let Some(&(pos, c)) = self.chars.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                pos: self.src.len(),
            });
        };

        let kind = match c {
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            ',' => self.single(TokenKind::Comma),
            '+' => self.single(TokenKind::Add),
            '-' => self.single(TokenKind::Sub),
            '*' => self.single(TokenKind::Mul),
            '/' => self.single(TokenKind::Div),
            '%' => self.single(TokenKind::Mod),
            '^' => self.single(TokenKind::Pow),
            '=' => {
                self.chars.next();
                if self.eat('=') {
                    TokenKind::EqlEql
                } else if self.eat('~') {
                    TokenKind::EqlRegex
                } else {
                    TokenKind::Eql
                }
            }
            '!' => {
                self.chars.next();
                if self.eat('=') {
                    TokenKind::Neq
                } else if self.eat('~') {
                    TokenKind::NeqRegex
                } else {
                    return Err(QueryError::UnexpectedChar { pos, found: '!' });
                }
            }
            '>' => {
                self.chars.next();
                if self.eat('=') { TokenKind::Gte } else { TokenKind::Gtr }
            }
            '<' => {
                self.chars.next();
                if self.eat('=') { TokenKind::Lte } else { TokenKind::Lss }
            }
            '"' | '\'' | '`' => self.string(pos, c)?,
            c if c.is_ascii_digit() => self.number(pos)?,
            '.' if self.src[pos + 1..].starts_with(|n: char| n.is_ascii_digit()) => {
                self.number(pos)?
            }
            c if is_ident_start(c) => TokenKind::Ident(self.ident(pos)),
            other => return Err(QueryError::UnexpectedChar { pos, found: other }),
        };

        Ok(Token { kind, pos })
    }

    fn skip_trivia(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else if c == '#' {
                while let Some((_, c)) = self.chars.next() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.chars.next();
        kind
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if(|&(_, c)| c == expected).is_some()
    }

    /// Advance until the byte offset `end`.
    fn skip_to(&mut self, end: usize) {
        while self.chars.next_if(|&(i, _)| i < end).is_some() {}
    }

    fn ident(&mut self, start: usize) -> String {
        let len = self.src[start..]
            .find(|c: char| !is_ident_continue(c))
            .unwrap_or(self.src.len() - start);
        self.skip_to(start + len);
        self.src[start..start + len].to_string()
    }

    fn number(&mut self, start: usize) -> QueryResult<TokenKind> {
        let rest = &self.src[start..];

        if let Some(len) = duration_len(rest) {
            self.skip_to(start + len);
            return Ok(TokenKind::Duration(rest[..len].to_string()));
        }

        let (len, value) = if let Some(hex) = rest
            .strip_prefix("0x")
            .or_else(|| rest.strip_prefix("0X"))
        {
            let digits = hex.bytes().take_while(u8::is_ascii_hexdigit).count();
            let value = u64::from_str_radix(&hex[..digits], 16).map(|v| v as f64);
            (digits + 2, value.ok())
        } else {
            let len = decimal_len(rest);
            (len, rest[..len].parse::<f64>().ok())
        };

        let trailing = rest[len..].starts_with(is_ident_continue);
        match value {
            Some(value) if !trailing => {
                self.skip_to(start + len);
                Ok(TokenKind::Number(value))
            }
            _ => {
                let end = rest
                    .find(|c: char| !is_ident_continue(c) && c != '.')
                    .unwrap_or(rest.len());
                Err(QueryError::InvalidNumber {
                    pos: start,
                    text: rest[..end].to_string(),
                })
            }
        }
    }

    fn string(&mut self, start: usize, quote: char) -> QueryResult<TokenKind> {
        self.chars.next();
        let mut out = String::new();

        while let Some((_, c)) = self.chars.next() {
            match c {
                c if c == quote => return Ok(TokenKind::Str(out)),
                '\\' if quote != '`' => {
                    let Some((_, escaped)) = self.chars.next() else {
                        break;
                    };
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '\\' | '"' | '\'' => out.push(escaped),
                        other => {
                            out.push('\\');
                            out.push(other);
                        }
                    }
                }
                c => out.push(c),
            }
        }

        Err(QueryError::UnterminatedString { pos: start })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

/// Length of a duration literal (`5m`, `1h30m`, `250ms`) at the start of `s`.
fn duration_len(s: &str) -> Option<usize> {
    let b = s.as_bytes();
    let mut i = 0;
    let mut segments = 0;

    loop {
        let start = i;
        while i < b.len() && b[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            break;
        }
        let unit = if b[i..].starts_with(b"ms") {
            2
        } else if matches!(b.get(i), Some(b's' | b'm' | b'h' | b'd' | b'w' | b'y')) {
            1
        } else {
            0
        };
        if unit == 0 {
            i = start;
            break;
        }
        i += unit;
        segments += 1;
    }

    if segments == 0 || s[i..].starts_with(is_ident_continue) {
        return None;
    }
    Some(i)
}

/// Length of `digits[.digits][(e|E)[+-]digits]` at the start of `s`.
fn decimal_len(s: &str) -> usize {
    let b = s.as_bytes();
    let digits = |from: usize| b[from..].iter().take_while(|c| c.is_ascii_digit()).count();

    let mut i = digits(0);
    if b.get(i) == Some(&b'.') {
        i += 1 + digits(i + 1);
    }
    if matches!(b.get(i), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(b.get(i + 1), Some(b'+' | b'-')));
        let exp = digits(i + 1 + sign);
        if exp > 0 {
            i += 1 + sign + exp;
        }
    }
    i
}
