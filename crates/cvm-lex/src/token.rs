//! Token kinds and the [`Token`] type.
//!
//! Tokens partition into structural, type-keyword, control-keyword,
//! literal, identifier, and operator classes. `TokenKind` is a closed
//! enumeration of exactly those, so the parser's `match` over kinds is
//! exhaustive and the compiler flags any grammar construct left unhandled.

use cvm_util::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Structural
    Comma,
    Semicolon,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,

    // Type keyword
    Int,

    // Control keywords
    If,
    Else,
    While,
    Return,
    Break,

    // Literals
    IntegerLiteral,
    StringLiteral,

    // Identifier
    Identifier,

    // Operators
    Assign,   // =
    Plus,     // +
    Minus,    // -
    Star,     // *
    Slash,    // /
    Greater,  // >
    GreaterEq, // >=
    Less,     // <
    LessEq,   // <=
    Eq,       // ==
    NotEq,    // !=
    Amp,      // &
    AmpAmp,   // &&
    Pipe,     // |
    PipePipe, // ||
    Caret,    // ^
    Tilde,    // ~
    Bang,     // !
    Shl,      // <<
    Shr,      // >>

    Eof,
}

impl TokenKind {
    /// The fixed mnemonic for every token kind whose text never varies
    /// (everything but identifiers and literals).
    pub fn fixed_text(&self) -> Option<&'static str> {
        use TokenKind::*;
        Some(match self {
            Comma => ",",
            Semicolon => ";",
            LBrace => "{",
            RBrace => "}",
            LBracket => "[",
            RBracket => "]",
            LParen => "(",
            RParen => ")",
            Int => "int",
            If => "if",
            Else => "else",
            While => "while",
            Return => "return",
            Break => "break",
            Assign => "=",
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Greater => ">",
            GreaterEq => ">=",
            Less => "<",
            LessEq => "<=",
            Eq => "==",
            NotEq => "!=",
            Amp => "&",
            AmpAmp => "&&",
            Pipe => "|",
            PipePipe => "||",
            Caret => "^",
            Tilde => "~",
            Bang => "!",
            Shl => "<<",
            Shr => ">>",
            Eof => "<eof>",
            IntegerLiteral | StringLiteral | Identifier => return None,
        })
    }
}

/// A single lexeme: its kind, the span of source text it covers, and the
/// (row, column) of its first character (carried on `span.pos`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}
