//! Formula parser
//!
//! Converts a sequence of tokens into an Abstract Syntax Tree (AST).
//! Uses recursive descent parsing with operator precedence.

use super::tokenizer::Token;

/// Deepest expression tree the parser will build
pub const MAX_DEPTH: usize = 200;

/// Abstract Syntax Tree node for formula expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// An integer literal
    Integer(i64),
    /// A float literal
    Float(f64),
    /// A string literal
    Text(String),
    /// A name: the variable X or a constant such as pi
    Reference(String),
    /// Function call: name(arg1, arg2, ...)
    FunctionCall { name: String, args: Vec<Expr> },
    /// Binary operation: left op right
    BinaryOp {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary operation: -expr or +expr
    UnaryOp { op: String, operand: Box<Expr> },
}

/// Error during parsing
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Parse error at token {}: {}",
            self.position, self.message
        )
    }
}

impl std::error::Error for ParseError {}

/// Parser for formula tokens
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            depth: 0,
        }
    }

    /// Parse the tokens into an AST
    pub fn parse(mut self) -> Result<Expr, ParseError> {
        if self.tokens.is_empty() {
            return Err(ParseError::new("Empty expression", 0));
        }
        let expr = self.expression()?;

        if !self.is_at_end() {
            return Err(ParseError::new(
                format!("Unexpected token after expression: {:?}", self.peek()),
                self.position,
            ));
        }

        Ok(expr)
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.position += 1;
        }
    }

    fn match_token(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the current token if it is one of the given operators
    fn match_any_operator(&mut self, ops: &[&str]) -> Option<String> {
        if let Some(Token::Operator(s)) = self.peek() {
            if ops.contains(&s.as_str()) {
                let op = s.clone();
                self.advance();
                return Some(op);
            }
        }
        None
    }

    /// Descend one level, failing once the tree would exceed `MAX_DEPTH`
    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::new(
                format!("Expression nested deeper than {} levels", MAX_DEPTH),
                self.position,
            ));
        }
        Ok(())
    }

    fn leave(&mut self, levels: usize) {
        self.depth -= levels;
    }

    fn expression(&mut self) -> Result<Expr, ParseError> {
        self.term()
    }

    /// Term: factor (( "+" | "-" ) factor)*
    fn term(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.factor()?;
        let mut chained = 0;

        while let Some(op) = self.match_any_operator(&["+", "-"]) {
            self.enter()?;
            chained += 1;
            let right = self.factor()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.leave(chained);

        Ok(left)
    }

    /// Factor: unary (( "*" | "/" | "//" | "%" ) unary)*
    fn factor(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.unary()?;
        let mut chained = 0;

        while let Some(op) = self.match_any_operator(&["*", "/", "//", "%"]) {
            self.enter()?;
            chained += 1;
            let right = self.unary()?;
            left = Expr::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        self.leave(chained);

        Ok(left)
    }

    /// Unary: ( "-" | "+" ) unary | power
    ///
    /// Sits above power so `-2 ** 2` is `-(2 ** 2)`.
    fn unary(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let expr = if let Some(op) = self.match_any_operator(&["-", "+"]) {
            let operand = self.unary()?;
            Expr::UnaryOp {
                op,
                operand: Box::new(operand),
            }
        } else {
            self.power()?
        };
        self.leave(1);
        Ok(expr)
    }

    /// Power: call ( ( "**" | "^" ) unary )?   (right-associative)
    fn power(&mut self) -> Result<Expr, ParseError> {
        let left = self.call()?;

        if self.match_any_operator(&["**", "^"]).is_some() {
            let right = self.unary()?;
            Ok(Expr::BinaryOp {
                op: "**".to_string(),
                left: Box::new(left),
                right: Box::new(right),
            })
        } else {
            Ok(left)
        }
    }

    /// Call: primary ( "(" arguments? ")" )?
    fn call(&mut self) -> Result<Expr, ParseError> {
        let expr = self.primary()?;

        if !self.match_token(&Token::OpenParen) {
            return Ok(expr);
        }

        let Expr::Reference(name) = expr else {
            return Err(ParseError::new(
                "Only named functions can be called",
                self.position - 1,
            ));
        };

        let args = self.arguments()?;
        if !self.match_token(&Token::CloseParen) {
            return Err(ParseError::new(
                "Expected ')' after function arguments",
                self.position,
            ));
        }

        Ok(Expr::FunctionCall { name, args })
    }

    /// Arguments: ( expr ( "," expr )* )?
    fn arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = Vec::new();

        if let Some(Token::CloseParen) = self.peek() {
            return Ok(args);
        }

        args.push(self.expression()?);

        while self.match_token(&Token::Comma) {
            args.push(self.expression()?);
        }

        Ok(args)
    }

    /// Primary: INTEGER | FLOAT | STRING | IDENTIFIER | "(" expr ")"
    fn primary(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().cloned();

        match token {
            Some(Token::Integer(i)) => {
                self.advance();
                Ok(Expr::Integer(i))
            }
            Some(Token::Float(n)) => {
                self.advance();
                Ok(Expr::Float(n))
            }
            Some(Token::Text(s)) => {
                self.advance();
                Ok(Expr::Text(s))
            }
            Some(Token::Identifier(name)) => {
                self.advance();
                Ok(Expr::Reference(name))
            }
            Some(Token::OpenParen) => {
                self.advance();
                let expr = self.expression()?;
                if !self.match_token(&Token::CloseParen) {
                    return Err(ParseError::new(
                        "Expected ')' after expression",
                        self.position,
                    ));
                }
                Ok(expr)
            }
            Some(token) => Err(ParseError::new(
                format!("Unexpected token: {:?}", token),
                self.position,
            )),
            None => Err(ParseError::new(
                "Unexpected end of expression",
                self.position,
            )),
        }
    }
}

/// Convenience function to parse tokens into an AST
pub fn parse(tokens: Vec<Token>) -> Result<Expr, ParseError> {
    Parser::new(tokens).parse()
}
