// A lexeme is the raw sequence of characters in the source code that represents a meaningful unit
// A token is a categorized representation of a lexeme, pairing it with its type

use crate::error::{Diagnostic, Reporter};
use crate::token::{Literal, Token, TokenType, KEYWORDS};

pub struct Scanner<'s> {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    reporter: &'s dyn Reporter,
}

impl<'s> Scanner<'s> {
    pub fn new(source: &str, reporter: &'s dyn Reporter) -> Self {
        Self {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            reporter,
        }
    }

    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens.push(Token::new(TokenType::Eof, "", None, self.line));
        self.tokens
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenType::LeftParen),
            ')' => self.add_token(TokenType::RightParen),
            '{' => self.add_token(TokenType::LeftBrace),
            '}' => self.add_token(TokenType::RightBrace),
            ',' => self.add_token(TokenType::Comma),
            '.' => self.add_token(TokenType::Dot),
            '-' => self.add_token(TokenType::Minus),
            '+' => self.add_token(TokenType::Plus),
            ';' => self.add_token(TokenType::Semicolon),
            '*' => self.add_token(TokenType::Star),

            // can be double char
            '!' => {
                let t = if self.r#match('=') { TokenType::BangEqual } else { TokenType::Bang };
                self.add_token(t);
            }
            '=' => {
                let t = if self.r#match('=') { TokenType::EqualEqual } else { TokenType::Equal };
                self.add_token(t);
            }
            '<' => {
                let t = if self.r#match('=') { TokenType::LessEqual } else { TokenType::Less };
                self.add_token(t);
            }
            '>' => {
                let t = if self.r#match('=') { TokenType::GreaterEqual } else { TokenType::Greater };
                self.add_token(t);
            }

            // can be comment
            '/' => {
                if self.r#match('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenType::Slash);
                }
            }

            ' ' | '\t' | '\r' => (),

            '\n' => self.line += 1,

            '"' => self.string(),

            c => {
                if c.is_ascii_digit() {
                    self.number();
                } else if c.is_alphabetic() || c == '_' {
                    self.identifier();
                } else {
                    self.reporter.diagnostic(Diagnostic::at_line(self.line, "Unexpected character."));
                }
            }
        }
    }

    // consume characters until we reach the closing "
    fn string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.reporter.diagnostic(Diagnostic::at_line(self.line, "Unterminated string."));
            return;
        }

        // the closing "
        self.advance();

        let value: String = self.source[(self.start + 1)..(self.current - 1)].iter().collect();
        self.add_token_with_literal(TokenType::String, Some(Literal::Str(value)));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // consume the .
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let value: f64 = text.parse().expect("scanned number lexeme is always valid f64 syntax");
        self.add_token_with_literal(TokenType::Number, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let token_type = KEYWORDS.get(text.as_str()).cloned().unwrap_or(TokenType::Identifier);
        self.add_token(token_type);
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    // it's like advance but doesn't consume the next character
    fn peek(&self) -> char {
        self.source.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.source.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn add_token(&mut self, token_type: TokenType) {
        self.add_token_with_literal(token_type, None);
    }

    fn add_token_with_literal(&mut self, token_type: TokenType, literal: Option<Literal>) {
        let text: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(token_type, &text, literal, self.line));
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    // we only consume the current character if that is what we are looking for
    fn r#match(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectingReporter;

    fn scan(source: &str) -> Vec<Token> {
        let reporter = CollectingReporter::default();
        Scanner::new(source, &reporter).scan_tokens()
    }

    #[test]
    fn scans_single_and_double_char_operators() {
        let tokens = scan("!= == <= >= < >");
        let types: Vec<_> = tokens.iter().map(|t| t.token_type).collect();
        assert_eq!(
            types,
            vec![
                TokenType::BangEqual,
                TokenType::EqualEqual,
                TokenType::LessEqual,
                TokenType::GreaterEqual,
                TokenType::Less,
                TokenType::Greater,
                TokenType::Eof,
            ]
        );
    }

    #[test]
    fn line_comments_are_skipped() {
        let tokens = scan("1 // a comment\n2");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].token_type, TokenType::Number);
        assert_eq!(tokens[1].token_type, TokenType::Number);
    }

    #[test]
    fn strings_capture_their_trimmed_value() {
        let tokens = scan("\"hello\"");
        match &tokens[0].literal {
            Some(Literal::Str(s)) => assert_eq!(s, "hello"),
            other => panic!("expected Str literal, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_string_reports_error() {
        let reporter = CollectingReporter::default();
        let tokens = Scanner::new("\"abc", &reporter).scan_tokens();
        assert!(reporter.had_error());
        assert_eq!(tokens.last().unwrap().token_type, TokenType::Eof);
    }

    #[test]
    fn numbers_allow_a_fractional_part() {
        let tokens = scan("123.45");
        match &tokens[0].literal {
            Some(Literal::Number(n)) => assert_eq!(*n, 123.45),
            other => panic!("expected Number literal, got {other:?}"),
        }
    }

    #[test]
    fn keywords_are_distinguished_from_identifiers() {
        let tokens = scan("class orange");
        assert_eq!(tokens[0].token_type, TokenType::Class);
        assert_eq!(tokens[1].token_type, TokenType::Identifier);
    }

    #[test]
    fn multiline_source_tracks_line_numbers() {
        let tokens = scan("1\n2\n3");
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 2);
        assert_eq!(tokens[2].line, 3);
    }
}
