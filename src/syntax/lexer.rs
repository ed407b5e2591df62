// Expression lexer - tokenizes rule expressions

use super::token::{Spanned, Token};
use crate::expression::{ExpressionError, ExpressionResult};

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let input: Vec<char> = input.chars().collect();
        let current_char = input.first().copied();
        Lexer {
            input,
            position: 0,
            current_char,
        }
    }

    /// Get the next token from the input
    pub fn next_token(&mut self) -> ExpressionResult<Spanned> {
        self.skip_whitespace();

        let offset = self.position;
        let ch = match self.current_char {
            Some(ch) => ch,
            None => return Ok(Spanned::new(Token::Eof, offset)),
        };

        let token = match ch {
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '%' => self.single(Token::Percent),
            '(' => self.single(Token::LeftParen),
            ')' => self.single(Token::RightParen),
            ',' => self.single(Token::Comma),
            '=' => {
                self.advance();
                match self.current_char {
                    Some('=') => self.single(Token::Equal),
                    Some('~') => self.single(Token::RegexMatch),
                    _ => return Err(self.error(offset, "expected '==' or '=~' after '='")),
                }
            }
            '!' => {
                self.advance();
                match self.current_char {
                    Some('=') => self.single(Token::NotEqual),
                    Some('~') => self.single(Token::RegexNotMatch),
                    _ => Token::Bang,
                }
            }
            '<' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.single(Token::LessEqual)
                } else {
                    Token::Less
                }
            }
            '>' => {
                self.advance();
                if self.current_char == Some('=') {
                    self.single(Token::GreaterEqual)
                } else {
                    Token::Greater
                }
            }
            '&' => {
                self.advance();
                if self.current_char == Some('&') {
                    self.single(Token::And)
                } else {
                    return Err(self.error(offset, "expected '&&'"));
                }
            }
            '|' => {
                self.advance();
                if self.current_char == Some('|') {
                    self.single(Token::Or)
                } else {
                    return Err(self.error(offset, "expected '||'"));
                }
            }
            '"' | '\'' => self.read_string(ch, offset)?,
            '[' => self.read_bracketed_identifier(offset)?,
            c if c.is_ascii_alphabetic() || c == '_' => self.read_identifier(),
            c if c.is_ascii_digit() => self.read_number(),
            other => {
                return Err(self.error(offset, &format!("unexpected character '{}'", other)));
            }
        };

        Ok(Spanned::new(token, offset))
    }

    /// Consume the current character and yield `token`
    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Peek at the next character without advancing
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    fn error(&self, offset: usize, message: &str) -> ExpressionError {
        ExpressionError::Syntax {
            offset,
            message: message.to_string(),
        }
    }

    /// Skip whitespace characters
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read an identifier or keyword
    fn read_identifier(&mut self) -> Token {
        let mut identifier = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                identifier.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::keyword_from_str(&identifier).unwrap_or(Token::Identifier(identifier))
    }

    /// Read a bracketed identifier (e.g., [Rollout Percent])
    fn read_bracketed_identifier(&mut self, offset: usize) -> ExpressionResult<Token> {
        self.advance(); // Skip opening bracket
        let mut identifier = String::new();

        loop {
            match self.current_char {
                Some(']') => {
                    self.advance();
                    break;
                }
                Some(ch) => {
                    identifier.push(ch);
                    self.advance();
                }
                None => return Err(self.error(offset, "unterminated bracketed identifier")),
            }
        }

        if identifier.is_empty() {
            return Err(self.error(offset, "empty bracketed identifier"));
        }

        Ok(Token::Identifier(identifier))
    }

    /// Read a string literal delimited by `quote`.
    ///
    /// Unknown escapes are kept verbatim so regex escapes such as `\d` survive.
    fn read_string(&mut self, quote: char, offset: usize) -> ExpressionResult<Token> {
        self.advance(); // Skip opening quote
        let mut string = String::new();

        loop {
            match self.current_char {
                Some(ch) if ch == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    match self.peek() {
                        Some('n') => string.push('\n'),
                        Some('t') => string.push('\t'),
                        Some('r') => string.push('\r'),
                        Some(c @ ('"' | '\'' | '\\')) => string.push(c),
                        Some(c) => {
                            string.push('\\');
                            string.push(c);
                        }
                        None => return Err(self.error(offset, "unterminated string literal")),
                    }
                    self.advance();
                    self.advance();
                }
                Some(ch) => {
                    string.push(ch);
                    self.advance();
                }
                None => return Err(self.error(offset, "unterminated string literal")),
            }
        }

        Ok(Token::String(string))
    }

    /// Read a number (integer or decimal)
    fn read_number(&mut self) -> Token {
        let mut number = String::new();
        let mut has_dot = false;

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.' && !has_dot && self.peek().is_some_and(|c| c.is_ascii_digit()) {
                has_dot = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::Number(number)
    }

    /// Tokenize the entire input
    pub fn tokenize(&mut self) -> ExpressionResult<Vec<Spanned>> {
        let mut tokens = Vec::new();

        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                break;
            }
        }

        Ok(tokens)
    }
}
