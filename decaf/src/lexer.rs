//! Hand-written scanner. Kept thin and lightly documented relative to the
//! AST/visitor core: the expression/statement grammar is an external,
//! well-understood collaborator, not where this crate's design effort
//! goes.

use crate::error::{Diagnostics, LexError};
use crate::token::{keyword_kind, LiteralValue, Token, TokenKind};
use util::{parse_float_literal, parse_int_literal};

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
}

const MAX_IDENT_LEN: usize = 31;

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Lexer<'a> {
        Lexer {
            src: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn peek2(&self) -> Option<u8> {
        self.src.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        if c == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Tokenizes the whole input, reporting lexical errors into `diag` and
    /// skipping the offending character rather than aborting, matching the
    /// original's "keep going after a bad char" recovery.
    pub fn tokenize(mut self, diag: &mut Diagnostics) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace();
            let (line, col) = (self.line, self.col);
            let c = match self.peek() {
                None => {
                    tokens.push(Token::new(TokenKind::Eof, "", line, col));
                    break;
                }
                Some(c) => c,
            };

            if c.is_ascii_digit() {
                tokens.push(self.scan_number(diag, line, col));
            } else if c == b'"' {
                tokens.push(self.scan_string(diag, line, col));
            } else if c.is_ascii_alphabetic() || c == b'_' {
                tokens.push(self.scan_word(diag, line, col));
            } else if let Some(tok) = self.scan_operator(line, col) {
                tokens.push(tok);
            } else {
                self.advance();
                diag.lex_error(LexError::IllegalChar { ch: c as char, line, col });
            }
        }
        tokens
    }

    fn scan_number(&mut self, diag: &mut Diagnostics, line: u32, col: u32) -> Token {
        let start = self.pos;
        while self.peek().map_or(false, |c| c.is_ascii_alphanumeric()) {
            self.advance();
        }
        let mut is_float = false;
        if self.peek() == Some(b'.') && self.peek2().map_or(false, |c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                self.advance();
            }
            if matches!(self.peek(), Some(b'e') | Some(b'E')) {
                self.advance();
                if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                    self.advance();
                }
                while self.peek().map_or(false, |c| c.is_ascii_digit()) {
                    self.advance();
                }
            }
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap().to_owned();

        if is_float {
            match parse_float_literal(&text) {
                Ok(v) => Token::new(TokenKind::DoubleConstant, text, line, col).with_value(LiteralValue::Double(v)),
                Err(_) => {
                    diag.lex_error(LexError::NumberOverflow { text: text.clone(), line, col });
                    Token::new(TokenKind::DoubleConstant, text, line, col).with_value(LiteralValue::Double(0.0))
                }
            }
        } else {
            match parse_int_literal(&text) {
                Ok(v) => Token::new(TokenKind::IntConstant, text, line, col).with_value(LiteralValue::Int(v)),
                Err(_) => {
                    diag.lex_error(LexError::NumberOverflow { text: text.clone(), line, col });
                    Token::new(TokenKind::IntConstant, text, line, col).with_value(LiteralValue::Int(0))
                }
            }
        }
    }

    fn scan_string(&mut self, diag: &mut Diagnostics, line: u32, col: u32) -> Token {
        self.advance(); // opening quote
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == b'"' || c == b'\n' {
                break;
            }
            self.advance();
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap().to_owned();
        if self.peek() == Some(b'"') {
            self.advance();
        } else {
            diag.lex_error(LexError::TooLong {
                text: text.clone(),
                line,
                col,
            });
        }
        Token::new(TokenKind::StringConstant, text, line, col)
    }

    fn scan_word(&mut self, diag: &mut Diagnostics, line: u32, col: u32) -> Token {
        let start = self.pos;
        while self.peek().map_or(false, |c| c.is_ascii_alphanumeric() || c == b'_') {
            self.advance();
        }
        let text = std::str::from_utf8(&self.src[start..self.pos]).unwrap().to_owned();
        if text.len() > MAX_IDENT_LEN {
            diag.lex_error(LexError::TooLong {
                text: text.clone(),
                line,
                col,
            });
        }
        let kind = keyword_kind(&text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, line, col)
    }

    fn scan_operator(&mut self, line: u32, col: u32) -> Option<Token> {
        let c = self.peek()?;
        let two = self.peek2();
        let (kind, len) = match (c, two) {
            (b'<', Some(b'=')) => (TokenKind::LessEqual, 2),
            (b'>', Some(b'=')) => (TokenKind::GreaterEqual, 2),
            (b'=', Some(b'=')) => (TokenKind::EqualEqual, 2),
            (b'!', Some(b'=')) => (TokenKind::NotEqual, 2),
            (b'&', Some(b'&')) => (TokenKind::AndAnd, 2),
            (b'|', Some(b'|')) => (TokenKind::OrOr, 2),
            (b'+', _) => (TokenKind::Plus, 1),
            (b'-', _) => (TokenKind::Minus, 1),
            (b'*', _) => (TokenKind::Star, 1),
            (b'/', _) => (TokenKind::Slash, 1),
            (b'%', _) => (TokenKind::Percent, 1),
            (b'<', _) => (TokenKind::Less, 1),
            (b'>', _) => (TokenKind::Greater, 1),
            (b'=', _) => (TokenKind::Assign, 1),
            (b'!', _) => (TokenKind::Bang, 1),
            (b'[', _) => (TokenKind::LBracket, 1),
            (b'.', _) => (TokenKind::Dot, 1),
            (b';', _) => (TokenKind::Semicolon, 1),
            (b',', _) => (TokenKind::Comma, 1),
            (b']', _) => (TokenKind::RBracket, 1),
            (b'(', _) => (TokenKind::LParen, 1),
            (b')', _) => (TokenKind::RParen, 1),
            (b'{', _) => (TokenKind::LBrace, 1),
            (b'}', _) => (TokenKind::RBrace, 1),
            _ => return None,
        };
        let start = self.pos;
        for _ in 0..len {
            self.advance();
        }
        let lexeme = std::str::from_utf8(&self.src[start..self.pos]).unwrap().to_owned();
        Some(Token::new(kind, lexeme, line, col))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut diag = Diagnostics::new();
        Lexer::new(src).tokenize(&mut diag).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_a_declaration_and_assignment() {
        assert_eq!(
            kinds("int a; a = 3 + 4;"),
            vec![
                TokenKind::IntType,
                TokenKind::Identifier,
                TokenKind::Semicolon,
                TokenKind::Identifier,
                TokenKind::Assign,
                TokenKind::IntConstant,
                TokenKind::Plus,
                TokenKind::IntConstant,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn two_char_operators_are_not_split() {
        assert_eq!(
            kinds("a <= b && c"),
            vec![
                TokenKind::Identifier,
                TokenKind::LessEqual,
                TokenKind::Identifier,
                TokenKind::AndAnd,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn illegal_character_is_reported_and_skipped() {
        let mut diag = Diagnostics::new();
        let tokens = Lexer::new("a $ b").tokenize(&mut diag);
        assert_eq!(diag.lex_error_count(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[1].kind, TokenKind::Identifier);
    }

    #[test]
    fn float_literal_carries_its_value() {
        let mut diag = Diagnostics::new();
        let tokens = Lexer::new("2.5").tokenize(&mut diag);
        assert_eq!(tokens[0].value, Some(LiteralValue::Double(2.5)));
    }
}
