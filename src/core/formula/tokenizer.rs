//! Formula tokenizer
//!
//! Converts transform formulas like "=round(X * 1.1, 2)" into a sequence of
//! tokens that can be parsed into an AST.

use std::iter::Peekable;
use std::str::Chars;

/// A token in a formula expression
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// An integer literal (e.g., 123)
    Integer(i64),
    /// A float literal (e.g., 45.67, 1.5e10)
    Float(f64),
    /// A string literal (e.g., "kg" or 'kg')
    Text(String),
    /// An identifier: the variable X, a constant, or a function name (optionally `math.` prefixed)
    Identifier(String),
    /// Arithmetic operators: + - * / // % ** ^
    Operator(String),
    /// Opening parenthesis
    OpenParen,
    /// Closing parenthesis
    CloseParen,
    /// Comma separator for function arguments
    Comma,
}

/// Error during tokenization
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizeError {
    pub message: String,
    pub position: usize,
}

impl TokenizeError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for TokenizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Tokenize error at position {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for TokenizeError {}

/// Tokenizer for formula expressions
pub struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
    position: usize,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given formula string
    pub fn new(formula: &'a str) -> Self {
        // Spreadsheet users often type a leading '='
        let formula = formula.trim_start();
        let formula = formula.strip_prefix('=').unwrap_or(formula);
        Self {
            chars: formula.chars().peekable(),
            position: 0,
        }
    }

    /// Tokenize the entire formula into a vector of tokens
    pub fn tokenize(mut self) -> Result<Vec<Token>, TokenizeError> {
        let mut tokens = Vec::new();

        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }

        Ok(tokens)
    }

    /// Get the next token, or None if at end of input
    fn next_token(&mut self) -> Result<Option<Token>, TokenizeError> {
        self.skip_whitespace();

        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let token = match c {
            '"' | '\'' => self.read_string()?,

            '(' => {
                self.advance();
                Token::OpenParen
            }
            ')' => {
                self.advance();
                Token::CloseParen
            }
            ',' => {
                self.advance();
                Token::Comma
            }

            '+' | '-' | '%' | '^' => {
                self.advance();
                Token::Operator(c.to_string())
            }
            '*' => self.read_doubled_operator('*'),
            '/' => self.read_doubled_operator('/'),

            c if c.is_ascii_digit() || c == '.' => self.read_number()?,

            c if c.is_alphabetic() || c == '_' => self.read_identifier(),

            c => {
                return Err(TokenizeError::new(
                    format!("Unexpected character: '{}'", c),
                    self.position,
                ));
            }
        };
        Ok(Some(token))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c.is_some() {
            self.position += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    /// `*` or `**`, `/` or `//`
    fn read_doubled_operator(&mut self, c: char) -> Token {
        self.advance();
        if self.peek() == Some(c) {
            self.advance();
            Token::Operator(format!("{}{}", c, c))
        } else {
            Token::Operator(c.to_string())
        }
    }

    /// Read a string literal (double or single quoted, doubled quote escapes)
    fn read_string(&mut self) -> Result<Token, TokenizeError> {
        let start_pos = self.position;
        let quote = self.advance().unwrap_or('"');
        let mut value = String::new();

        loop {
            match self.advance() {
                None => {
                    return Err(TokenizeError::new("Unterminated string literal", start_pos));
                }
                Some(c) if c == quote => {
                    if self.peek() == Some(quote) {
                        value.push(quote);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => value.push(c),
            }
        }

        Ok(Token::Text(value))
    }

    /// Read a number (integer, decimal, or scientific notation)
    fn read_number(&mut self) -> Result<Token, TokenizeError> {
        let start_pos = self.position;
        let mut num_str = String::new();
        let mut is_float = false;

        self.read_digits(&mut num_str);

        if self.peek() == Some('.') {
            is_float = true;
            num_str.push('.');
            self.advance();
            self.read_digits(&mut num_str);
        }

        if let Some(c @ ('e' | 'E')) = self.peek() {
            is_float = true;
            num_str.push(c);
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                num_str.push(sign);
                self.advance();
            }
            self.read_digits(&mut num_str);
        }

        if !is_float {
            // Literals beyond i64 degrade to floats rather than failing
            if let Ok(i) = num_str.parse::<i64>() {
                return Ok(Token::Integer(i));
            }
        }

        num_str
            .parse::<f64>()
            .map(Token::Float)
            .map_err(|_| TokenizeError::new(format!("Invalid number: {}", num_str), start_pos))
    }

    fn read_digits(&mut self, out: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                out.push(c);
                self.advance();
            } else {
                break;
            }
        }
    }

    /// Read an identifier (X, pi, sqrt, math.sqrt)
    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                ident.push(c);
                self.advance();
            } else {
                break;
            }
        }

        Token::Identifier(ident)
    }
}

/// Convenience function to tokenize a formula string
pub fn tokenize(formula: &str) -> Result<Vec<Token>, TokenizeError> {
    Tokenizer::new(formula).tokenize()
}

/// Rewrite the standalone variable `x` to `X`
///
/// Only whole identifiers are rewritten: `max`, `exp`, `math.x` and text
/// inside string literals are left alone. Scanning follows the tokenizer's
/// rules, so number exponents like `1e5` are never mistaken for identifiers.
pub fn normalize_variable(formula: &str) -> String {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '"' || c == '\'' {
            out.push(c);
            i += 1;
            while i < chars.len() {
                let d = chars[i];
                out.push(d);
                i += 1;
                if d == c {
                    if chars.get(i) == Some(&c) {
                        out.push(c);
                        i += 1;
                    } else {
                        break;
                    }
                }
            }
        } else if c.is_ascii_digit() || c == '.' {
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                out.push(chars[i]);
                i += 1;
            }
            if matches!(chars.get(i), Some('e' | 'E')) {
                out.push(chars[i]);
                i += 1;
                if matches!(chars.get(i), Some('+' | '-')) {
                    out.push(chars[i]);
                    i += 1;
                }
                while i < chars.len() && chars[i].is_ascii_digit() {
                    out.push(chars[i]);
                    i += 1;
                }
            }
        } else if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
            {
                i += 1;
            }
            let ident: String = chars[start..i].iter().collect();
            if ident == "x" {
                out.push('X');
            } else {
                out.push_str(&ident);
            }
        } else {
            out.push(c);
            i += 1;
        }
    }

    out
}
