//! Lexical analysis: byte stream to token sequence.
//!
//! The lexer walks the source as bytes, tracking the current line and the
//! byte index at which that line started so token positions can be
//! reported as 1-based `line:column` pairs. It never aborts: bytes it
//! cannot recognize become [`TokenKind::Unknown`] tokens and surface later
//! as parse errors.

use std::fmt;

use crate::ast::{Pos, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    Unknown,
    Eof,

    // Punctuation
    Semicolon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,

    // Operators
    Equals,
    DoubleEquals,
    Plus,
    Minus,
    Asterisk,
    Slash,

    // Keywords
    KeywordReturn,
    KeywordIf,
    KeywordElse,
    KeywordDo,
    KeywordWhile,
    KeywordFor,
    KeywordSwitch,
    KeywordContinue,
    KeywordBreak,
    KeywordConst,
    KeywordVoid,
    KeywordInt,
    KeywordSigned,
    KeywordUnsigned,
    KeywordLong,
    KeywordShort,
    KeywordChar,
    KeywordFloat,
    KeywordDouble,

    // Variable tokens
    Identifier(&'a str),
    Integer {
        value: u64,
        is_long: bool,
        is_signed: bool,
    },
}

/// Payload-free discriminant of a [`TokenKind`], used where tokens are
/// compared or reported by kind alone (the parser's expectations).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenTag {
    Unknown,
    Eof,
    Semicolon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Equals,
    DoubleEquals,
    Plus,
    Minus,
    Asterisk,
    Slash,
    KeywordReturn,
    KeywordIf,
    KeywordElse,
    KeywordDo,
    KeywordWhile,
    KeywordFor,
    KeywordSwitch,
    KeywordContinue,
    KeywordBreak,
    KeywordConst,
    KeywordVoid,
    KeywordInt,
    KeywordSigned,
    KeywordUnsigned,
    KeywordLong,
    KeywordShort,
    KeywordChar,
    KeywordFloat,
    KeywordDouble,
    Identifier,
    Integer,
}

impl<'a> TokenKind<'a> {
    pub fn tag(&self) -> TokenTag {
        match self {
            TokenKind::Unknown => TokenTag::Unknown,
            TokenKind::Eof => TokenTag::Eof,
            TokenKind::Semicolon => TokenTag::Semicolon,
            TokenKind::LeftParen => TokenTag::LeftParen,
            TokenKind::RightParen => TokenTag::RightParen,
            TokenKind::LeftBrace => TokenTag::LeftBrace,
            TokenKind::RightBrace => TokenTag::RightBrace,
            TokenKind::LeftBracket => TokenTag::LeftBracket,
            TokenKind::RightBracket => TokenTag::RightBracket,
            TokenKind::Comma => TokenTag::Comma,
            TokenKind::Equals => TokenTag::Equals,
            TokenKind::DoubleEquals => TokenTag::DoubleEquals,
            TokenKind::Plus => TokenTag::Plus,
            TokenKind::Minus => TokenTag::Minus,
            TokenKind::Asterisk => TokenTag::Asterisk,
            TokenKind::Slash => TokenTag::Slash,
            TokenKind::KeywordReturn => TokenTag::KeywordReturn,
            TokenKind::KeywordIf => TokenTag::KeywordIf,
            TokenKind::KeywordElse => TokenTag::KeywordElse,
            TokenKind::KeywordDo => TokenTag::KeywordDo,
            TokenKind::KeywordWhile => TokenTag::KeywordWhile,
            TokenKind::KeywordFor => TokenTag::KeywordFor,
            TokenKind::KeywordSwitch => TokenTag::KeywordSwitch,
            TokenKind::KeywordContinue => TokenTag::KeywordContinue,
            TokenKind::KeywordBreak => TokenTag::KeywordBreak,
            TokenKind::KeywordConst => TokenTag::KeywordConst,
            TokenKind::KeywordVoid => TokenTag::KeywordVoid,
            TokenKind::KeywordInt => TokenTag::KeywordInt,
            TokenKind::KeywordSigned => TokenTag::KeywordSigned,
            TokenKind::KeywordUnsigned => TokenTag::KeywordUnsigned,
            TokenKind::KeywordLong => TokenTag::KeywordLong,
            TokenKind::KeywordShort => TokenTag::KeywordShort,
            TokenKind::KeywordChar => TokenTag::KeywordChar,
            TokenKind::KeywordFloat => TokenTag::KeywordFloat,
            TokenKind::KeywordDouble => TokenTag::KeywordDouble,
            TokenKind::Identifier(_) => TokenTag::Identifier,
            TokenKind::Integer { .. } => TokenTag::Integer,
        }
    }
}

impl TokenTag {
    /// Human-readable name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            TokenTag::Unknown => "unknown token",
            TokenTag::Eof => "end of input",
            TokenTag::Semicolon => "`;`",
            TokenTag::LeftParen => "`(`",
            TokenTag::RightParen => "`)`",
            TokenTag::LeftBrace => "`{`",
            TokenTag::RightBrace => "`}`",
            TokenTag::LeftBracket => "`[`",
            TokenTag::RightBracket => "`]`",
            TokenTag::Comma => "`,`",
            TokenTag::Equals => "`=`",
            TokenTag::DoubleEquals => "`==`",
            TokenTag::Plus => "`+`",
            TokenTag::Minus => "`-`",
            TokenTag::Asterisk => "`*`",
            TokenTag::Slash => "`/`",
            TokenTag::KeywordReturn => "`return`",
            TokenTag::KeywordIf => "`if`",
            TokenTag::KeywordElse => "`else`",
            TokenTag::KeywordDo => "`do`",
            TokenTag::KeywordWhile => "`while`",
            TokenTag::KeywordFor => "`for`",
            TokenTag::KeywordSwitch => "`switch`",
            TokenTag::KeywordContinue => "`continue`",
            TokenTag::KeywordBreak => "`break`",
            TokenTag::KeywordConst => "`const`",
            TokenTag::KeywordVoid => "`void`",
            TokenTag::KeywordInt => "`int`",
            TokenTag::KeywordSigned => "`signed`",
            TokenTag::KeywordUnsigned => "`unsigned`",
            TokenTag::KeywordLong => "`long`",
            TokenTag::KeywordShort => "`short`",
            TokenTag::KeywordChar => "`char`",
            TokenTag::KeywordFloat => "`float`",
            TokenTag::KeywordDouble => "`double`",
            TokenTag::Identifier => "identifier",
            TokenTag::Integer => "integer literal",
        }
    }
}

impl fmt::Display for TokenTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

struct Lexer<'a> {
    source: &'a str,
    index: usize,
    line: usize,
    line_start: usize,
}

fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_letter_or_underscore(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_word_byte(c: u8) -> bool {
    is_letter_or_underscore(c) || c.is_ascii_digit()
}

/// Parse an integer literal word: base prefix, digits, then optional
/// `u`/`U` and `l`/`L` suffixes. Returns `None` if any character of the
/// word is not consumed (e.g. a digit invalid for the base, or trailing
/// junk after the suffixes).
fn parse_integer_literal(word: &str) -> Option<(u64, bool, bool)> {
    let bytes = word.as_bytes();
    let mut index = 0usize;

    // detect base
    let mut base = 10u64;
    if bytes.len() >= 2 && bytes[0] == b'0' {
        match bytes[1] {
            b'x' | b'X' => {
                base = 16;
                index += 2;
            }
            b'b' | b'B' => {
                base = 2;
                index += 2;
            }
            _ => {
                base = 8;
                index += 1;
            }
        }
    }

    // parse value
    let mut value = 0u64;
    while index < bytes.len() {
        let c = bytes[index];

        let digit_value = match c {
            b'0'..=b'9' => u64::from(c - b'0'),
            b'a'..=b'f' if base == 16 => u64::from(c - b'a') + 10,
            b'A'..=b'F' if base == 16 => u64::from(c - b'A') + 10,
            _ => break,
        };

        if digit_value >= base {
            return None;
        }

        value = value.wrapping_mul(base).wrapping_add(digit_value);
        index += 1;
    }

    let mut is_signed = true;
    let mut is_long = false;

    // unsigned suffix
    if index < bytes.len() && matches!(bytes[index], b'u' | b'U') {
        is_signed = false;
        index += 1;
    }

    // long suffix
    if index < bytes.len() && matches!(bytes[index], b'l' | b'L') {
        is_long = true;
        index += 1;
    }

    if index == bytes.len() {
        Some((value, is_long, is_signed))
    } else {
        None
    }
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Lexer {
            source,
            index: 0,
            line: 1,
            line_start: 0,
        }
    }

    /// The byte at the cursor, or NUL at and past end of input.
    fn peek(&self) -> u8 {
        self.source.as_bytes().get(self.index).copied().unwrap_or(0)
    }

    fn advance(&mut self) -> u8 {
        let c = self.peek();
        self.index += 1;

        if c == b'\n' {
            self.line += 1;
            self.line_start = self.index;
        }

        c
    }

    /// 1-based column of the most recently consumed byte.
    fn column(&self) -> usize {
        self.index - self.line_start
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            column: self.column(),
        }
    }

    fn skip_whitespace(&mut self) {
        while is_whitespace(self.peek()) {
            self.advance();
        }
    }

    /// Consume a maximal run of letters, digits and underscores.
    fn next_word(&mut self) -> &'a str {
        let start = self.index;
        while is_word_byte(self.peek()) {
            self.advance();
        }
        &self.source[start..self.index]
    }

    fn next_token(&mut self) -> Token<'a> {
        self.skip_whitespace();

        let start_index = self.index;
        let c = self.advance();
        let start = self.pos();

        let kind = match c {
            0 => TokenKind::Eof,
            b';' => TokenKind::Semicolon,
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'{' => TokenKind::LeftBrace,
            b'}' => TokenKind::RightBrace,
            b'[' => TokenKind::LeftBracket,
            b']' => TokenKind::RightBracket,
            b',' => TokenKind::Comma,
            b'=' => {
                if self.peek() == b'=' {
                    self.advance();
                    TokenKind::DoubleEquals
                } else {
                    TokenKind::Equals
                }
            }
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Asterisk,
            b'/' => TokenKind::Slash,
            c if c.is_ascii_digit() => {
                self.index = start_index;
                let word = self.next_word();

                match parse_integer_literal(word) {
                    Some((value, is_long, is_signed)) => TokenKind::Integer {
                        value,
                        is_long,
                        is_signed,
                    },
                    None => TokenKind::Unknown,
                }
            }
            c if is_letter_or_underscore(c) => {
                self.index = start_index;
                let word = self.next_word();

                match word {
                    "return" => TokenKind::KeywordReturn,
                    "if" => TokenKind::KeywordIf,
                    "else" => TokenKind::KeywordElse,
                    "do" => TokenKind::KeywordDo,
                    "while" => TokenKind::KeywordWhile,
                    "for" => TokenKind::KeywordFor,
                    "switch" => TokenKind::KeywordSwitch,
                    "continue" => TokenKind::KeywordContinue,
                    "break" => TokenKind::KeywordBreak,
                    "const" => TokenKind::KeywordConst,
                    "void" => TokenKind::KeywordVoid,
                    "int" => TokenKind::KeywordInt,
                    "signed" => TokenKind::KeywordSigned,
                    "unsigned" => TokenKind::KeywordUnsigned,
                    "long" => TokenKind::KeywordLong,
                    "short" => TokenKind::KeywordShort,
                    "char" => TokenKind::KeywordChar,
                    "float" => TokenKind::KeywordFloat,
                    "double" => TokenKind::KeywordDouble,
                    _ => TokenKind::Identifier(word),
                }
            }
            _ => TokenKind::Unknown,
        };

        let end = self.pos();
        Token {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Tokenize the whole source. The returned sequence always ends with a
/// single [`TokenKind::Eof`] token.
pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);

        if done {
            break;
        }
    }

    tokens
}
