//! The lexer proper: a single left-to-right scan.
//!
//! A token boundary falls on whitespace or on one of the delimiter bytes
//! `,;{}[]()=><+-*/&|~^!`, except while inside a string literal. At a
//! delimiter boundary, [`Lexer`] first tries to match one of the eight
//! two-character operators (`==`, `!=`, `>=`, `<=`, `<<`, `>>`, `&&`, `||`)
//! before falling back to the single-character delimiter.

use crate::cursor::Cursor;
use crate::error::LexError;
use crate::token::{Token, TokenKind};
use cvm_util::{Pos, Span};

const DELIMITERS: &[u8] = b",;{}[]()=><+-*/&|~^!";

fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_delimiter(b: u8) -> bool {
    DELIMITERS.contains(&b)
}

fn is_digit(b: u8) -> bool {
    b.is_ascii_digit()
}

fn is_alpha(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn is_alnum(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

/// Turns a nul-terminated source buffer into a flat token sequence.
///
/// `Lexer` is a pure function of its input: it borrows the buffer and
/// produces tokens whose spans reference it, per the data model's lifetime
/// rule that tokens are valid only as long as the source buffer is.
pub struct Lexer<'a> {
    source: &'a str,
    cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            cursor: Cursor::new(source),
        }
    }

    /// Lex the entire buffer, returning every token in source order,
    /// terminated by a single `TokenKind::Eof` token at end of input.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.cursor.current() {
            if is_blank(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let start_offset = self.cursor.offset();
        let start_pos = self.cursor.pos();

        let Some(b) = self.cursor.current() else {
            return Ok(self.make_token(TokenKind::Eof, start_offset, start_pos));
        };

        if is_alpha(b) {
            return Ok(self.scan_identifier_or_keyword(start_offset, start_pos));
        }
        if is_digit(b) {
            return Ok(self.scan_integer(start_offset, start_pos));
        }
        if b == b'"' {
            return self.scan_string(start_offset, start_pos);
        }
        if is_delimiter(b) {
            return Ok(self.scan_delimiter(start_offset, start_pos));
        }

        // Falls through none of the validators: unknown token.
        self.cursor.advance();
        let span = Span::new(start_offset as u32, self.cursor.offset() as u32, start_pos);
        Err(LexError::UnknownToken {
            text: span.text(self.source).to_string(),
            span,
        })
    }

    fn make_token(&self, kind: TokenKind, start_offset: usize, start_pos: Pos) -> Token {
        let span = Span::new(start_offset as u32, self.cursor.offset() as u32, start_pos);
        Token { kind, span }
    }

    fn scan_identifier_or_keyword(&mut self, start_offset: usize, start_pos: Pos) -> Token {
        while let Some(b) = self.cursor.current() {
            if is_alnum(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        let text = &self.source[start_offset..self.cursor.offset()];
        let kind = match text {
            "int" => TokenKind::Int,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "return" => TokenKind::Return,
            "break" => TokenKind::Break,
            _ => TokenKind::Identifier,
        };
        self.make_token(kind, start_offset, start_pos)
    }

    fn scan_integer(&mut self, start_offset: usize, start_pos: Pos) -> Token {
        while let Some(b) = self.cursor.current() {
            if is_digit(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }
        self.make_token(TokenKind::IntegerLiteral, start_offset, start_pos)
    }

    fn scan_string(&mut self, start_offset: usize, start_pos: Pos) -> Result<Token, LexError> {
        self.cursor.advance(); // opening quote
        loop {
            match self.cursor.current() {
                None => {
                    let span =
                        Span::new(start_offset as u32, self.cursor.offset() as u32, start_pos);
                    return Err(LexError::UnknownToken {
                        text: span.text(self.source).to_string(),
                        span,
                    });
                }
                Some(b'\n') => {
                    let span =
                        Span::new(start_offset as u32, self.cursor.offset() as u32, start_pos);
                    return Err(LexError::NewlineInString { span });
                }
                Some(b'"') => {
                    self.cursor.advance();
                    return Ok(self.make_token(TokenKind::StringLiteral, start_offset, start_pos));
                }
                Some(_) => self.cursor.advance(),
            }
        }
    }

    /// Two-character delimiters tried before falling back to one character.
    const TWO_CHAR: &'static [(u8, u8, TokenKind)] = &[
        (b'=', b'=', TokenKind::Eq),
        (b'!', b'=', TokenKind::NotEq),
        (b'>', b'=', TokenKind::GreaterEq),
        (b'<', b'=', TokenKind::LessEq),
        (b'<', b'<', TokenKind::Shl),
        (b'>', b'>', TokenKind::Shr),
        (b'&', b'&', TokenKind::AmpAmp),
        (b'|', b'|', TokenKind::PipePipe),
    ];

    fn scan_delimiter(&mut self, start_offset: usize, start_pos: Pos) -> Token {
        let first = self.cursor.current().unwrap();
        if let Some(second) = self.cursor.peek_at(1) {
            if let Some(&(_, _, kind)) = Self::TWO_CHAR
                .iter()
                .find(|(a, b, _)| *a == first && *b == second)
            {
                self.cursor.advance();
                self.cursor.advance();
                return self.make_token(kind, start_offset, start_pos);
            }
        }

        let kind = match first {
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'=' => TokenKind::Assign,
            b'>' => TokenKind::Greater,
            b'<' => TokenKind::Less,
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b'/' => TokenKind::Slash,
            b'&' => TokenKind::Amp,
            b'|' => TokenKind::Pipe,
            b'~' => TokenKind::Tilde,
            b'^' => TokenKind::Caret,
            b'!' => TokenKind::Bang,
            _ => unreachable!("byte {} is not in DELIMITERS", first as char),
        };
        self.cursor.advance();
        self.make_token(kind, start_offset, start_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("int main if else while return break x"),
            vec![
                TokenKind::Int,
                TokenKind::Identifier,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::Return,
                TokenKind::Break,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators_win_over_one_char() {
        assert_eq!(
            kinds("a==b"),
            vec![
                TokenKind::Identifier,
                TokenKind::Eq,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
        assert_eq!(
            kinds("a<=b<c"),
            vec![
                TokenKind::Identifier,
                TokenKind::LessEq,
                TokenKind::Identifier,
                TokenKind::Less,
                TokenKind::Identifier,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn integer_literal_spans_digits() {
        let tokens = Lexer::new("42;").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::IntegerLiteral);
        assert_eq!(tokens[0].text("42;"), "42");
    }

    #[test]
    fn string_literal_includes_quotes() {
        let src = "\"hello\"";
        let tokens = Lexer::new(src).tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].text(src), "\"hello\"");
    }

    #[test]
    fn newline_in_string_is_an_error() {
        let err = Lexer::new("\"abc\ndef\"").tokenize().unwrap_err();
        assert!(matches!(err, LexError::NewlineInString { .. }));
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = Lexer::new("@").tokenize().unwrap_err();
        assert!(matches!(err, LexError::UnknownToken { .. }));
    }

    #[test]
    fn rows_and_columns_track_newlines() {
        let tokens = Lexer::new("x\ny").tokenize().unwrap();
        assert_eq!(tokens[0].span.pos, Pos { row: 1, col: 1 });
        assert_eq!(tokens[1].span.pos, Pos { row: 2, col: 1 });
    }

    #[test]
    fn lex_round_trip_reproduces_source() {
        let src = "int main ( ) { return 0 ; }";
        let tokens = Lexer::new(src).tokenize().unwrap();
        let mut rebuilt = String::new();
        let mut cursor = 0usize;
        for tok in &tokens {
            if tok.kind == TokenKind::Eof {
                break;
            }
            rebuilt.push_str(&src[cursor..tok.span.start as usize]);
            rebuilt.push_str(tok.text(src));
            cursor = tok.span.end as usize;
        }
        rebuilt.push_str(&src[cursor..]);
        assert_eq!(rebuilt, src);
    }

    // Testable Property 1: lex round-trip, checked against randomly
    // generated well-formed sources rather than one fixed example.
    mod props {
        use super::*;
        use proptest::prelude::*;

        /// One lexeme from each class the lexer recognises: keywords,
        /// identifiers, integers, a short string literal, and every
        /// structural/operator delimiter (both one- and two-character).
        fn lexeme_strategy() -> impl Strategy<Value = String> {
            prop_oneof![
                Just("int".to_string()),
                Just("if".to_string()),
                Just("else".to_string()),
                Just("while".to_string()),
                Just("return".to_string()),
                Just("break".to_string()),
                "[a-zA-Z][a-zA-Z0-9]{0,5}".prop_map(|s| s),
                "[0-9]{1,6}".prop_map(|s| s),
                Just("\"abc\"".to_string()),
                Just(",".to_string()),
                Just(";".to_string()),
                Just("{".to_string()),
                Just("}".to_string()),
                Just("(".to_string()),
                Just(")".to_string()),
                Just("==".to_string()),
                Just("!=".to_string()),
                Just(">=".to_string()),
                Just("<=".to_string()),
                Just("<<".to_string()),
                Just(">>".to_string()),
                Just("&&".to_string()),
                Just("||".to_string()),
                Just("+".to_string()),
                Just("-".to_string()),
                Just("*".to_string()),
                Just("/".to_string()),
            ]
        }

        fn whitespace_strategy() -> impl Strategy<Value = String> {
            prop::collection::vec(prop_oneof![Just(' '), Just('\t'), Just('\n')], 0..3)
                .prop_map(|chars| chars.into_iter().collect())
        }

        proptest! {
            #[test]
            fn round_trip_reproduces_source(
                lexemes in prop::collection::vec(lexeme_strategy(), 1..20),
                gaps in prop::collection::vec(whitespace_strategy(), 21),
            ) {
                let mut src = gaps[0].clone();
                for (i, lexeme) in lexemes.iter().enumerate() {
                    src.push_str(lexeme);
                    src.push_str(&gaps[i + 1]);
                }

                // Adjacent lexemes without an intervening gap can fuse into
                // a different token stream (e.g. "i" + "f" -> "if"); only
                // check the round-trip property on inputs the lexer accepts.
                let Ok(tokens) = Lexer::new(&src).tokenize() else {
                    return Ok(());
                };

                let mut rebuilt = String::new();
                let mut cursor = 0usize;
                for tok in &tokens {
                    if tok.kind == TokenKind::Eof {
                        break;
                    }
                    rebuilt.push_str(&src[cursor..tok.span.start as usize]);
                    rebuilt.push_str(tok.text(&src));
                    cursor = tok.span.end as usize;
                }
                rebuilt.push_str(&src[cursor..]);
                prop_assert_eq!(rebuilt, src);
            }
        }
    }
}
