//! Formula evaluator
//!
//! Walks an AST with the single variable `X` bound. Integer arithmetic stays
//! integral until it overflows; `/` always produces a float.

use super::functions;
use super::parser::Expr;
use crate::types::CellValue;

/// Value type that can be returned from evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    /// Date or time serial; passes through `X` but takes no part in arithmetic
    DateTime(f64),
    /// An empty source cell
    Empty,
}

impl Value {
    /// Numeric view; booleans count as 0/1, text and empty have none
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(n) => Some(*n),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Text(_) | Value::DateTime(_) | Value::Empty => None,
        }
    }

    /// Integer view for integers and booleans
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Boolean(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::DateTime(_) => "datetime",
            Value::Empty => "empty",
        }
    }
}

/// Floats render with 4 decimals; everything else in its natural form
impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{:.4}", n),
            Value::Text(s) => write!(f, "{}", s),
            Value::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Value::DateTime(serial) => write!(f, "{}", serial),
            Value::Empty => Ok(()),
        }
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<CellValue> for Value {
    fn from(cell: CellValue) -> Self {
        match cell {
            CellValue::Empty => Value::Empty,
            CellValue::Integer(i) => Value::Integer(i),
            CellValue::Float(n) => Value::Float(n),
            CellValue::Text(s) => Value::Text(s),
            CellValue::Boolean(b) => Value::Boolean(b),
            CellValue::DateTime(serial) => Value::DateTime(serial),
            CellValue::Error(e) => Value::Text(e),
        }
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Integer(i) => CellValue::Integer(i),
            Value::Float(n) => CellValue::Float(n),
            Value::Text(s) => CellValue::Text(s),
            Value::Boolean(b) => CellValue::Boolean(b),
            Value::DateTime(serial) => CellValue::DateTime(serial),
            Value::Empty => CellValue::Empty,
        }
    }
}

/// Evaluation context: the value bound to `X`
#[derive(Debug, Clone)]
pub struct EvalContext {
    pub x: Value,
}

impl EvalContext {
    pub fn new(x: impl Into<Value>) -> Self {
        Self { x: x.into() }
    }
}

/// Error during evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn division_by_zero() -> Self {
        Self::new("Division by zero")
    }

    pub(crate) fn domain(func: &str) -> Self {
        Self::new(format!("{}: math domain error", func))
    }

    pub(crate) fn overflow(func: &str) -> Self {
        Self::new(format!("{}: numerical result out of range", func))
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Eval error: {}", self.message)
    }
}

impl std::error::Error for EvalError {}

/// Evaluate an expression in the given context
pub fn evaluate(expr: &Expr, ctx: &EvalContext) -> Result<Value, EvalError> {
    match expr {
        Expr::Integer(i) => Ok(Value::Integer(*i)),

        Expr::Float(n) => Ok(Value::Float(*n)),

        Expr::Text(s) => Ok(Value::Text(s.clone())),

        Expr::Reference(name) => evaluate_reference(name, ctx),

        Expr::FunctionCall { name, args } => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            functions::call(name, &values)
        }

        Expr::BinaryOp { op, left, right } => {
            let left_val = evaluate(left, ctx)?;
            let right_val = evaluate(right, ctx)?;
            evaluate_binary_op(op, &left_val, &right_val)
        }

        Expr::UnaryOp { op, operand } => {
            let val = evaluate(operand, ctx)?;
            evaluate_unary_op(op, &val)
        }
    }
}

/// Resolve a bare name: the variable X or a math constant
fn evaluate_reference(name: &str, ctx: &EvalContext) -> Result<Value, EvalError> {
    if name == "X" {
        return Ok(ctx.x.clone());
    }
    functions::constant(name)
        .map(Value::Float)
        .ok_or_else(|| EvalError::new(format!("Unknown name: {}", name)))
}

enum Number {
    Int(i64),
    Float(f64),
}

fn operand(value: &Value, op: &str) -> Result<Number, EvalError> {
    match value {
        Value::Float(n) => Ok(Number::Float(*n)),
        other => other.as_integer().map(Number::Int).ok_or_else(|| {
            EvalError::new(format!(
                "Unsupported operand type for {}: {}",
                op,
                other.type_name()
            ))
        }),
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(op: &str, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if let ("+", Value::Text(l), Value::Text(r)) = (op, left, right) {
        return Ok(Value::Text(format!("{}{}", l, r)));
    }

    match (operand(left, op)?, operand(right, op)?) {
        (Number::Int(l), Number::Int(r)) => integer_op(op, l, r),
        (l, r) => float_op(op, to_f64(l), to_f64(r)).map(Value::Float),
    }
}

fn to_f64(n: Number) -> f64 {
    match n {
        Number::Int(i) => i as f64,
        Number::Float(f) => f,
    }
}

/// Integer arithmetic; overflow falls back to float arithmetic
fn integer_op(op: &str, l: i64, r: i64) -> Result<Value, EvalError> {
    let exact = match op {
        "+" => l.checked_add(r),
        "-" => l.checked_sub(r),
        "*" => l.checked_mul(r),
        "//" => {
            if r == 0 {
                return Err(EvalError::division_by_zero());
            }
            l.checked_div(r).map(|q| {
                if l % r != 0 && ((l < 0) != (r < 0)) {
                    q - 1
                } else {
                    q
                }
            })
        }
        "%" => {
            if r == 0 {
                return Err(EvalError::division_by_zero());
            }
            // Result takes the sign of the divisor
            let rem = l.checked_rem(r).unwrap_or(0);
            Some(if rem != 0 && ((rem < 0) != (r < 0)) {
                rem + r
            } else {
                rem
            })
        }
        "**" if r >= 0 => u32::try_from(r).ok().and_then(|e| l.checked_pow(e)),
        _ => None,
    };

    match exact {
        Some(i) => Ok(Value::Integer(i)),
        None => float_op(op, l as f64, r as f64).map(Value::Float),
    }
}

/// Float arithmetic with domain and overflow checks
pub(crate) fn float_op(op: &str, l: f64, r: f64) -> Result<f64, EvalError> {
    let result = match op {
        "+" => l + r,
        "-" => l - r,
        "*" => l * r,
        "/" => {
            if r == 0.0 {
                return Err(EvalError::division_by_zero());
            }
            l / r
        }
        "//" => {
            if r == 0.0 {
                return Err(EvalError::division_by_zero());
            }
            (l / r).floor()
        }
        "%" => {
            if r == 0.0 {
                return Err(EvalError::division_by_zero());
            }
            let rem = l % r;
            if rem != 0.0 && ((rem < 0.0) != (r < 0.0)) {
                rem + r
            } else {
                rem
            }
        }
        "**" => {
            if l == 0.0 && r < 0.0 {
                return Err(EvalError::new(
                    "Division by zero: 0 cannot be raised to a negative power",
                ));
            }
            if l < 0.0 && r.is_finite() && r.fract() != 0.0 {
                return Err(EvalError::domain("**"));
            }
            l.powf(r)
        }
        _ => return Err(EvalError::new(format!("Unknown operator: {}", op))),
    };

    if result.is_infinite() && l.is_finite() && r.is_finite() {
        return Err(EvalError::overflow(op));
    }
    Ok(result)
}

/// Evaluate a unary operation
fn evaluate_unary_op(op: &str, operand_val: &Value) -> Result<Value, EvalError> {
    match (op, operand(operand_val, op)?) {
        ("-", Number::Int(i)) => Ok(i
            .checked_neg()
            .map(Value::Integer)
            .unwrap_or(Value::Float(-(i as f64)))),
        ("-", Number::Float(n)) => Ok(Value::Float(-n)),
        ("+", Number::Int(i)) => Ok(Value::Integer(i)),
        ("+", Number::Float(n)) => Ok(Value::Float(n)),
        _ => Err(EvalError::new(format!("Unknown unary operator: {}", op))),
    }
}
