use crate::error;
use crate::token::TokenType::*;
use crate::token::{Literal, Token, TokenType};
use std::collections::HashMap;

/// The first step in any compiler or interpreter is scanning. The scanner
/// takes in raw source code as a series of characters and groups it into
/// a series of chunks we call tokens. These are the meaningful "words" and
/// "punctuation" that make up the language's grammar.
pub struct Scanner {
    /// The raw source code
    source: Vec<char>,

    /// A list to fill with tokens the scanner is going to generate
    tokens: Vec<Token>,

    /// These fields are used to keep track of where the scanner is in the source code.
    /// 'start' points to the first character in the lexeme being scanned.
    /// 'current' points at the character currently being considered.
    /// 'line' field tracks what source line current is on.
    start: usize,
    current: usize,
    line: usize,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: vec![],
            current: 0,
            start: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(&mut self) -> Vec<Token> {
        while !self.is_at_end() {
            // We are at the beginning of the next lexeme.
            self.start = self.current;
            self.scan_token();
        }
        self.tokens.push(Token::new(EOF, String::new(), None, self.line));
        self.tokens.clone()
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    /// Scans a single token. This is the real heart of the scanner.
    fn scan_token(&mut self) {
        let ln = self.line;
        let c = self.advance();
        match c {
            '(' => self.add_token(LEFT_PAREN),
            ')' => self.add_token(RIGHT_PAREN),
            '{' => self.add_token(LEFT_BRACE),
            '}' => self.add_token(RIGHT_BRACE),
            ',' => self.add_token(COMMA),
            '.' => self.add_token(DOT),
            '-' => self.add_token(MINUS),
            '+' => self.add_token(PLUS),
            ';' => self.add_token(SEMICOLON),
            '*' => self.add_token(STAR),

            '!' => match self.match_next('=') {
                true => self.add_token(BANG_EQUAL),
                false => self.add_token(BANG),
            },
            '=' => match self.match_next('=') {
                true => self.add_token(EQUAL_EQUAL),
                false => self.add_token(EQUAL),
            },
            '<' => match self.match_next('=') {
                true => self.add_token(LESS_EQUAL),
                false => self.add_token(LESS),
            },
            '>' => match self.match_next('=') {
                true => self.add_token(GREATER_EQUAL),
                false => self.add_token(GREATER),
            },

            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,

            '/' => self.comment(),
            '"' => self.string(),
            d if is_digit(d) => self.number(),
            a if is_alpha(a) => self.identifier(),

            _ => {
                error::error_at_line(ln, format!("Unexpected character: {c}"));
            }
        }
    }

    fn comment(&mut self) {
        // Comment goes until the end of the line. Comments are lexemes but
        // they aren't meaningful, so we don't call add_token().
        if self.match_next('/') {
            while self.peek() != '\n' && !self.is_at_end() {
                self.advance();
            }
        } else {
            self.add_token(SLASH)
        }
    }

    fn string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            // Multi-line strings are allowed.
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            error::error_at_line(self.line, "Unterminated string.".to_string());
            return;
        }

        // The closing ".
        self.advance();

        let value: String = self.source[self.start + 1..self.current - 1].iter().collect();
        self.add_token_with_literal(STRING, Some(Literal::Str(value)));
    }

    fn number(&mut self) {
        while is_digit(self.peek()) {
            self.advance();
        }

        if self.peek() == '.' && is_digit(self.peek_next()) {
            self.advance();
            while is_digit(self.peek()) {
                self.advance();
            }
        }

        let value: String = self.source[self.start..self.current].iter().collect();
        let n: f64 = value.parse().expect("scanner guaranteed a valid number lexeme");
        self.add_token_with_literal(NUMBER, Some(Literal::Number(n)));
    }

    fn identifier(&mut self) {
        while is_alpha_numeric(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let token_type: TokenType = keywords().get(text.as_str()).copied().unwrap_or(IDENTIFIER);
        self.add_token(token_type);
    }

    /// Consumes the next character in the source file and returns it.
    fn advance(&mut self) -> char {
        let res = self.source[self.current];
        self.current += 1;
        res
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.add_token_with_literal(token_type, None);
    }

    fn add_token_with_literal(&mut self, token_type: TokenType, literal: Option<Literal>) {
        let text: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(token_type, text, literal, self.line));
    }

    /// Like `advance`, but conditional: only consumes the current character
    /// if it's what we're looking for.
    fn match_next(&mut self, expected: char) -> bool {
        if self.is_at_end() {
            return false;
        }
        if self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    /// One character of lookahead.
    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.source.len() {
            return '\0';
        }
        self.source[self.current + 1]
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alpha_numeric(c: char) -> bool {
    is_alpha(c) || is_digit(c)
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn keywords() -> HashMap<&'static str, TokenType> {
    HashMap::from([
        ("and", AND),
        ("class", CLASS),
        ("else", ELSE),
        ("false", FALSE),
        ("for", FOR),
        ("fun", FUN),
        ("if", IF),
        ("nil", NIL),
        ("or", OR),
        ("print", PRINT),
        ("return", RETURN),
        ("super", SUPER),
        ("this", THIS),
        ("true", TRUE),
        ("var", VAR),
        ("while", WHILE),
        ("break", BREAK),
        ("continue", CONTINUE),
        ("static", STATIC),
        ("get", GET),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(src: &str) -> Vec<TokenType> {
        Scanner::new(src).scan_tokens().into_iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn empty_source_is_just_eof() {
        assert_eq!(types(""), vec![EOF]);
    }

    #[test]
    fn single_and_double_char_operators() {
        assert_eq!(types("!=<=!"), vec![BANG_EQUAL, LESS_EQUAL, BANG, EOF]);
    }

    #[test]
    fn keywords_vs_identifiers() {
        assert_eq!(types("class classy"), vec![CLASS, IDENTIFIER, EOF]);
    }

    #[test]
    fn break_and_continue_are_keywords() {
        assert_eq!(types("break continue"), vec![BREAK, CONTINUE, EOF]);
    }

    #[test]
    fn number_literal_is_captured() {
        let tokens = Scanner::new("123.5").scan_tokens();
        match &tokens[0].literal {
            Some(Literal::Number(n)) => assert_eq!(*n, 123.5),
            other => panic!("expected a number literal, got {other:?}"),
        }
    }

    #[test]
    fn line_numbers_advance_across_newlines() {
        let tokens = Scanner::new("var a;\nvar b;").scan_tokens();
        let line_of_second_var = tokens.iter().filter(|t| t.token_type == VAR).nth(1).unwrap().line;
        assert_eq!(line_of_second_var, 2);
    }
}
