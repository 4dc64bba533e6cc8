//! Single-variable formula engine
//!
//! A formula is an arithmetic expression over the variable `X` (written `X`
//! or `x`) plus a whitelisted math namespace. The pipeline is:
//!
//! 1. normalize a standalone `x` to `X`
//! 2. tokenize
//! 3. parse into an AST (compiled once per mapping)
//! 4. evaluate with `X` bound to the source cell value

pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod tokenizer;

use std::fmt;

use thiserror::Error;

pub use evaluator::{EvalContext, EvalError, Value};
pub use parser::{Expr, ParseError};
pub use tokenizer::{normalize_variable, TokenizeError};

/// Anything that can go wrong turning a formula string into a value
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("formula is empty")]
    Empty,

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// A compiled formula, ready to be applied to many values
#[derive(Debug, Clone, PartialEq)]
pub struct Formula {
    normalized: String,
    ast: Expr,
}

impl Formula {
    /// Normalize, tokenize and parse `source`
    pub fn compile(source: &str) -> Result<Self, FormulaError> {
        if source.trim().is_empty() {
            return Err(FormulaError::Empty);
        }
        let normalized = normalize_variable(source);
        let tokens = tokenizer::tokenize(&normalized)?;
        let ast = parser::parse(tokens)?;
        Ok(Self {
            normalized,
            ast,
        })
    }

    /// The formula after `x` → `X` rewriting
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// Evaluate with `X` bound to `x`
    pub fn eval(&self, x: impl Into<Value>) -> Result<Value, FormulaError> {
        let value = evaluator::evaluate(&self.ast, &EvalContext::new(x))?;
        if let Value::Float(n) = value {
            if !n.is_finite() {
                return Err(EvalError::new(format!("result is not a finite number: {}", n)).into());
            }
        }
        Ok(value)
    }
}

/// Compile and evaluate `formula` once
pub fn evaluate(formula: &str, x: impl Into<Value>) -> Result<Value, FormulaError> {
    Formula::compile(formula)?.eval(x)
}

/// Live preview shown while a formula is being edited: the result at X=1
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaPreview {
    /// Nothing entered yet
    Prompt,
    Result(Value),
    Invalid,
}

/// Evaluate `formula` with X=1 for an editing preview
pub fn preview(formula: &str) -> FormulaPreview {
    if formula.trim().is_empty() {
        return FormulaPreview::Prompt;
    }
    match evaluate(formula, 1) {
        Ok(value) => FormulaPreview::Result(value),
        Err(_) => FormulaPreview::Invalid,
    }
}

impl fmt::Display for FormulaPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaPreview::Prompt => write!(f, "X=1 -> (enter formula)"),
            FormulaPreview::Result(value) => write!(f, "X=1 -> {}", value),
            FormulaPreview::Invalid => write!(f, "Invalid equation"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_uppercase_and_lowercase_variable() {
        assert_eq!(evaluate("X*2", 5).unwrap(), Value::Integer(10));
        assert_eq!(evaluate("x+1", 3).unwrap(), Value::Integer(4));
        assert_eq!(evaluate("=x*10", 7).unwrap(), Value::Integer(70));
    }

    #[test]
    fn test_evaluate_division_by_zero_fails() {
        assert!(matches!(evaluate("X/0", 5), Err(FormulaError::Eval(_))));
    }

    #[test]
    fn test_evaluate_rejects_non_whitelisted_calls() {
        assert!(evaluate("os.system('ls')", 1).is_err());
        assert!(evaluate("__import__('os')", 1).is_err());
        assert!(evaluate("open('f')", 1).is_err());
    }

    #[test]
    fn test_evaluate_math_namespace() {
        assert_eq!(evaluate("max(x, 1)", 5).unwrap(), Value::Integer(5));
        assert_eq!(evaluate("math.sqrt(X)", 9).unwrap(), Value::Float(3.0));
        assert_eq!(evaluate("round(x * pi, 2)", 1).unwrap(), Value::Float(3.14));
    }

    #[test]
    fn test_evaluate_empty_formula() {
        assert_eq!(evaluate("   ", 1), Err(FormulaError::Empty));
    }

    #[test]
    fn test_evaluate_rejects_non_finite_result() {
        assert!(evaluate("inf", 1).is_err());
        assert!(evaluate("X * nan", 1).is_err());
    }

    #[test]
    fn test_compile_once_eval_many() {
        let formula = Formula::compile("x * 10 + 1").unwrap();
        assert_eq!(formula.normalized(), "X * 10 + 1");
        assert_eq!(formula.eval(1).unwrap(), Value::Integer(11));
        assert_eq!(formula.eval(2.5).unwrap(), Value::Float(26.0));
    }

    #[test]
    fn test_compile_reports_syntax_errors() {
        assert!(matches!(Formula::compile("X +"), Err(FormulaError::Parse(_))));
        assert!(matches!(
            Formula::compile("X @ 2"),
            Err(FormulaError::Tokenize(_))
        ));
    }

    #[test]
    fn test_preview_strings() {
        assert_eq!(preview("").to_string(), "X=1 -> (enter formula)");
        assert_eq!(preview("X*2").to_string(), "X=1 -> 2");
        assert_eq!(preview("X/4").to_string(), "X=1 -> 0.2500");
        assert_eq!(preview("X/0").to_string(), "Invalid equation");
        assert_eq!(preview("X +").to_string(), "Invalid equation");
    }
}
