// lexer.rs — Tokenizer for dotted channel names
//
// Channel names come in two shapes: `name` and `category.name`. The lexer
// splits a name into identifier and dot tokens; the parser decides whether
// the resulting sequence is an acceptable channel name.
//
// Preconditions: input is valid UTF-8.
// Postconditions: returns all tokens with byte-offset spans, plus any lex errors.
// Failure modes: characters outside the C identifier alphabet produce `LexError`;
//                lexing continues.
// Side effects: none.

use logos::Logos;
use std::fmt;

/// Byte-offset span in a name string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// A lexer error with location.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

/// Result of lexing: tokens plus any errors (non-fatal).
#[derive(Debug)]
pub struct LexResult {
    pub tokens: Vec<(Token, Span)>,
    pub errors: Vec<LexError>,
}

/// Channel name tokens.
///
/// No whitespace is skipped: a space inside a channel name is an error, the
/// same as any other character a C identifier cannot contain.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    #[token(".")]
    Dot,

    /// Identifier: `[a-zA-Z_][a-zA-Z0-9_]*`
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Ident,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Dot => write!(f, "."),
            Token::Ident => write!(f, "<ident>"),
        }
    }
}

// ── Public API ──

/// Lex a channel name into tokens.
///
/// Lexing is non-fatal: unrecognised characters are collected as errors and
/// the lexer continues past them.
pub fn lex(name: &str) -> LexResult {
    let lexer = Token::lexer(name);
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for (result, range) in lexer.spanned() {
        let span = Span {
            start: range.start,
            end: range.end,
        };
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => errors.push(LexError {
                span,
                message: match name.get(span.start..span.end) {
                    Some(text) => format!("unexpected character: {:?}", text),
                    None => format!("unexpected byte at offset {}", span.start),
                },
            }),
        }
    }

    LexResult { tokens, errors }
}

/// True if `text` is a single bare C identifier.
pub fn is_identifier(text: &str) -> bool {
    let result = lex(text);
    result.errors.is_empty()
        && matches!(result.tokens.as_slice(), [(Token::Ident, span)] if span.end == text.len())
}

// ── Tests ──
