//! Whitelisted math namespace
//!
//! Names resolve case-insensitively, bare or with a `math.` prefix.
//! Nothing outside this table is reachable from a formula.

use std::f64::consts;

use super::evaluator::{float_op, EvalError, Value};

fn canonical(name: &str) -> String {
    let lower = name.to_lowercase();
    match lower.strip_prefix("math.") {
        Some(stripped) => stripped.to_string(),
        None => lower,
    }
}

/// Look up a math constant
pub fn constant(name: &str) -> Option<f64> {
    match canonical(name).as_str() {
        "pi" => Some(consts::PI),
        "e" => Some(consts::E),
        "tau" => Some(consts::TAU),
        "inf" => Some(f64::INFINITY),
        "nan" => Some(f64::NAN),
        _ => None,
    }
}

/// Call a whitelisted function with already-evaluated arguments
pub fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    let func = canonical(name);
    let f = func.as_str();

    match f {
        // ═══════════════════════════════════════════════════════════════════════
        // POWER & LOGARITHMS
        // ═══════════════════════════════════════════════════════════════════════
        "sqrt" => unary(f, args, |x| {
            if x < 0.0 {
                Err(EvalError::domain(f))
            } else {
                Ok(x.sqrt())
            }
        }),
        "exp" => unary(f, args, |x| Ok(x.exp())),
        "expm1" => unary(f, args, |x| Ok(x.exp_m1())),
        "log" => {
            require_args_range(f, args, 1, 2)?;
            let x = number(f, &args[0])?;
            if x <= 0.0 {
                return Err(EvalError::domain(f));
            }
            if args.len() == 1 {
                return Ok(Value::Float(x.ln()));
            }
            let base = number(f, &args[1])?;
            if base <= 0.0 {
                return Err(EvalError::domain(f));
            }
            if base == 1.0 {
                return Err(EvalError::division_by_zero());
            }
            Ok(Value::Float(x.ln() / base.ln()))
        }
        "log10" => unary(f, args, |x| positive(f, x).map(f64::log10)),
        "log2" => unary(f, args, |x| positive(f, x).map(f64::log2)),
        "log1p" => unary(f, args, |x| {
            if x <= -1.0 {
                Err(EvalError::domain(f))
            } else {
                Ok(x.ln_1p())
            }
        }),
        "pow" => {
            require_args(f, args, 2)?;
            let base = number(f, &args[0])?;
            let exponent = number(f, &args[1])?;
            float_op("**", base, exponent).map(Value::Float)
        }

        // ═══════════════════════════════════════════════════════════════════════
        // TRIGONOMETRY
        // ═══════════════════════════════════════════════════════════════════════
        "sin" => unary(f, args, |x| Ok(x.sin())),
        "cos" => unary(f, args, |x| Ok(x.cos())),
        "tan" => unary(f, args, |x| Ok(x.tan())),
        "asin" => unary(f, args, |x| unit_interval(f, x).map(f64::asin)),
        "acos" => unary(f, args, |x| unit_interval(f, x).map(f64::acos)),
        "atan" => unary(f, args, |x| Ok(x.atan())),
        "atan2" => binary(f, args, |y, x| Ok(y.atan2(x))),
        "sinh" => unary(f, args, |x| Ok(x.sinh())),
        "cosh" => unary(f, args, |x| Ok(x.cosh())),
        "tanh" => unary(f, args, |x| Ok(x.tanh())),
        "asinh" => unary(f, args, |x| Ok(x.asinh())),
        "acosh" => unary(f, args, |x| {
            if x < 1.0 {
                Err(EvalError::domain(f))
            } else {
                Ok(x.acosh())
            }
        }),
        "atanh" => unary(f, args, |x| {
            if x.abs() >= 1.0 {
                Err(EvalError::domain(f))
            } else {
                Ok(x.atanh())
            }
        }),
        "degrees" => unary(f, args, |x| Ok(x.to_degrees())),
        "radians" => unary(f, args, |x| Ok(x.to_radians())),
        "hypot" => binary(f, args, |x, y| Ok(x.hypot(y))),

        // ═══════════════════════════════════════════════════════════════════════
        // ROUNDING & MAGNITUDE
        // ═══════════════════════════════════════════════════════════════════════
        "fabs" => unary(f, args, |x| Ok(x.abs())),
        "abs" => {
            require_args(f, args, 1)?;
            match &args[0] {
                Value::Float(x) => Ok(Value::Float(x.abs())),
                other => {
                    let i = integer(f, other)?;
                    Ok(i.checked_abs()
                        .map(Value::Integer)
                        .unwrap_or(Value::Float((i as f64).abs())))
                }
            }
        }
        "floor" => to_integral(f, args, f64::floor),
        "ceil" => to_integral(f, args, f64::ceil),
        "trunc" => to_integral(f, args, f64::trunc),
        "round" => round(f, args),
        "fmod" => binary(f, args, |x, y| {
            if y == 0.0 {
                Err(EvalError::domain(f))
            } else {
                Ok(x % y)
            }
        }),
        "copysign" => binary(f, args, |x, y| Ok(x.copysign(y))),

        // ═══════════════════════════════════════════════════════════════════════
        // INTEGER & AGGREGATE
        // ═══════════════════════════════════════════════════════════════════════
        "factorial" => {
            require_args(f, args, 1)?;
            let n = integer(f, &args[0])?;
            if n < 0 {
                return Err(EvalError::new(
                    "factorial: not defined for negative values",
                ));
            }
            factorial(n)
        }
        "gcd" => {
            let mut acc: i64 = 0;
            for arg in args {
                acc = gcd(acc, integer(f, arg)?);
            }
            Ok(Value::Integer(acc))
        }
        "min" | "max" => {
            if args.is_empty() {
                return Err(EvalError::new(format!("{} requires at least 1 argument", f)));
            }
            let mut best = &args[0];
            let mut best_num = number(f, best)?;
            for arg in &args[1..] {
                let n = number(f, arg)?;
                let better = if f == "min" { n < best_num } else { n > best_num };
                if better {
                    best = arg;
                    best_num = n;
                }
            }
            Ok(best.clone())
        }

        _ => Err(EvalError::new(format!("Unknown function: {}", name))),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HELPERS
// ═══════════════════════════════════════════════════════════════════════════

/// Require exactly N arguments
fn require_args(func: &str, args: &[Value], count: usize) -> Result<(), EvalError> {
    if args.len() != count {
        return Err(EvalError::new(format!(
            "{} requires {} argument(s), got {}",
            func,
            count,
            args.len()
        )));
    }
    Ok(())
}

/// Require between min and max arguments
fn require_args_range(func: &str, args: &[Value], min: usize, max: usize) -> Result<(), EvalError> {
    if args.len() < min || args.len() > max {
        return Err(EvalError::new(format!(
            "{} requires {}-{} arguments, got {}",
            func,
            min,
            max,
            args.len()
        )));
    }
    Ok(())
}

fn number(func: &str, value: &Value) -> Result<f64, EvalError> {
    value.as_number().ok_or_else(|| {
        EvalError::new(format!(
            "{} requires a number, got {}",
            func,
            value.type_name()
        ))
    })
}

fn integer(func: &str, value: &Value) -> Result<i64, EvalError> {
    value.as_integer().ok_or_else(|| {
        EvalError::new(format!(
            "{} requires an integer, got {}",
            func,
            value.type_name()
        ))
    })
}

/// Reject results that blew up from finite input
fn finite(func: &str, input: f64, result: f64) -> Result<f64, EvalError> {
    if result.is_infinite() && input.is_finite() {
        Err(EvalError::overflow(func))
    } else {
        Ok(result)
    }
}

fn positive(func: &str, x: f64) -> Result<f64, EvalError> {
    if x <= 0.0 {
        Err(EvalError::domain(func))
    } else {
        Ok(x)
    }
}

fn unit_interval(func: &str, x: f64) -> Result<f64, EvalError> {
    if !(-1.0..=1.0).contains(&x) {
        Err(EvalError::domain(func))
    } else {
        Ok(x)
    }
}

fn unary(
    func: &str,
    args: &[Value],
    op: impl Fn(f64) -> Result<f64, EvalError>,
) -> Result<Value, EvalError> {
    require_args(func, args, 1)?;
    let x = number(func, &args[0])?;
    let result = op(x)?;
    finite(func, x, result).map(Value::Float)
}

fn binary(
    func: &str,
    args: &[Value],
    op: impl Fn(f64, f64) -> Result<f64, EvalError>,
) -> Result<Value, EvalError> {
    require_args(func, args, 2)?;
    let a = number(func, &args[0])?;
    let b = number(func, &args[1])?;
    let result = op(a, b)?;
    finite(func, a.min(b), result).map(Value::Float)
}

/// floor / ceil / trunc: integers pass through, floats become integers
fn to_integral(func: &str, args: &[Value], op: fn(f64) -> f64) -> Result<Value, EvalError> {
    require_args(func, args, 1)?;
    match &args[0] {
        Value::Float(x) => float_to_integer(func, op(*x)),
        other => integer(func, other).map(Value::Integer),
    }
}

fn float_to_integer(func: &str, x: f64) -> Result<Value, EvalError> {
    if x.is_nan() {
        return Err(EvalError::new(format!("{}: cannot convert NaN to integer", func)));
    }
    if x.is_infinite() || x < i64::MIN as f64 || x >= i64::MAX as f64 {
        return Err(EvalError::overflow(func));
    }
    Ok(Value::Integer(x as i64))
}

/// round(x) → integer (ties to even); round(x, digits) keeps the input type
fn round(func: &str, args: &[Value]) -> Result<Value, EvalError> {
    require_args_range(func, args, 1, 2)?;
    let digits = match args.get(1) {
        Some(d) => Some(integer(func, d)?),
        None => None,
    };

    match (&args[0], digits) {
        (Value::Float(x), None) => float_to_integer(func, x.round_ties_even()),
        (Value::Float(x), Some(d)) => {
            let d = d.clamp(-308, 308) as i32;
            let scale = 10_f64.powi(d);
            let scaled = x * scale;
            if !scaled.is_finite() {
                return Ok(Value::Float(*x));
            }
            Ok(Value::Float(scaled.round_ties_even() / scale))
        }
        (other, None) => integer(func, other).map(Value::Integer),
        (other, Some(d)) => {
            let i = integer(func, other)?;
            if d >= 0 {
                return Ok(Value::Integer(i));
            }
            let Some(scale) = u32::try_from(-d).ok().and_then(|e| 10_i64.checked_pow(e)) else {
                return Ok(Value::Integer(0));
            };
            let rounded = (i as f64 / scale as f64).round_ties_even() as i64;
            Ok(rounded
                .checked_mul(scale)
                .map(Value::Integer)
                .unwrap_or(Value::Float(rounded as f64 * scale as f64)))
        }
    }
}

fn factorial(n: i64) -> Result<Value, EvalError> {
    let mut exact: Option<i64> = Some(1);
    let mut approx = 1.0_f64;
    for k in 2..=n {
        exact = exact.and_then(|acc| acc.checked_mul(k));
        approx *= k as f64;
        if approx.is_infinite() {
            return Err(EvalError::overflow("factorial"));
        }
    }
    Ok(exact.map(Value::Integer).unwrap_or(Value::Float(approx)))
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    i64::try_from(a).unwrap_or(i64::MAX)
}
