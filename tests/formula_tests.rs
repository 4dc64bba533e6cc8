//! Formula engine and column label tests through the public API

#![allow(clippy::approx_constant)] // Test values intentionally use approximate PI/E

use royalbit_cellxfer::core::column::{column_label, resolve, MAX_COLUMN};
use royalbit_cellxfer::core::formula::{evaluate, preview, Formula, FormulaError, Value};
use royalbit_cellxfer::TransferError;

// ═══════════════════════════════════════════════════════════════════════════
// COLUMN LABELS
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_single_letters_are_alphabetical() {
    for (i, c) in ('a'..='z').enumerate() {
        assert_eq!(resolve(&c.to_string()).unwrap(), i as u32 + 1);
    }
}

#[test]
fn test_two_letters_follow_first_letter_major_order() {
    let mut expected = 27;
    for major in 'a'..='z' {
        for minor in 'a'..='z' {
            let label = format!("{}{}", major, minor);
            assert_eq!(resolve(&label).unwrap(), expected, "label {}", label);
            expected += 1;
        }
    }
    assert_eq!(expected - 1, MAX_COLUMN);
}

#[test]
fn test_labels_are_case_insensitive() {
    assert_eq!(resolve("AB").unwrap(), resolve("ab").unwrap());
    assert_eq!(resolve("Zz").unwrap(), 702);
}

#[test]
fn test_invalid_labels() {
    for label in ["", "abc", "a1", "1", "-", "é", "a b"] {
        assert!(
            matches!(resolve(label), Err(TransferError::InvalidColumnLabel { .. })),
            "label {:?}",
            label
        );
    }
}

#[test]
fn test_label_round_trip_over_full_range() {
    for index in 1..=MAX_COLUMN {
        let label = column_label(index).unwrap();
        assert_eq!(resolve(&label).unwrap(), index);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// EVALUATION
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_basic_evaluation() {
    assert_eq!(evaluate("X*2", 5).unwrap(), Value::Integer(10));
    assert_eq!(evaluate("x+1", 3).unwrap(), Value::Integer(4));
}

#[test]
fn test_division_by_zero_is_formula_error() {
    assert!(matches!(evaluate("X/0", 1), Err(FormulaError::Eval(_))));
}

#[test]
fn test_namespace_escape_is_rejected() {
    for formula in [
        "os.system('ls')",
        "__import__('os').system('ls')",
        "exec('1')",
        "X.__class__",
        "open('/etc/passwd')",
    ] {
        assert!(evaluate(formula, 1).is_err(), "formula {:?}", formula);
    }
}

#[test]
fn test_x_inside_other_names_is_not_rewritten() {
    // `max` and `exp` contain an x; only the standalone variable is rewritten
    assert_eq!(evaluate("max(x, 10)", 3).unwrap(), Value::Integer(10));
    assert_eq!(evaluate("exp(0) + x", 1).unwrap(), Value::Float(2.0));
    assert_eq!(
        evaluate("x + ' box'", "a").unwrap(),
        Value::Text("a box".to_string())
    );
}

#[test]
fn test_deeply_nested_formula_is_an_error_not_a_crash() {
    let formula = format!("{}X{}", "(".repeat(5000), ")".repeat(5000));
    assert!(matches!(evaluate(&formula, 1), Err(FormulaError::Parse(_))));

    let chain = format!("{}X", "-".repeat(5000));
    assert!(matches!(Formula::compile(&chain), Err(FormulaError::Parse(_))));
}

#[test]
fn test_math_functions() {
    assert_eq!(evaluate("sqrt(X)", 16).unwrap(), Value::Float(4.0));
    assert_eq!(evaluate("math.floor(X / 3)", 10).unwrap(), Value::Integer(3));
    assert_eq!(evaluate("round(X * 1.1, 2)", 7).unwrap(), Value::Float(7.7));
    assert_eq!(evaluate("abs(X) ** 2", -3).unwrap(), Value::Integer(9));
    match evaluate("math.sin(math.pi / 2) * X", 2).unwrap() {
        Value::Float(n) => assert!((n - 2.0).abs() < 1e-12),
        other => panic!("Expected float, got {:?}", other),
    }
}

#[test]
fn test_unit_conversions() {
    assert_eq!(evaluate("X * 2.54", 10).unwrap().to_string(), "25.4000");
    assert_eq!(evaluate("(X - 32) * 5 / 9", 212).unwrap(), Value::Float(100.0));
}

#[test]
fn test_type_errors() {
    assert!(evaluate("X * 2", "abc").is_err());
    assert!(evaluate("X + 1", Value::Empty).is_err());
}

#[test]
fn test_compiled_formula_is_reusable() {
    let formula = Formula::compile("x * 10").unwrap();
    for (x, expected) in [(1, 10), (7, 70), (-2, -20)] {
        assert_eq!(formula.eval(x).unwrap(), Value::Integer(expected));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// DRY-RUN PREVIEW
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn test_preview_formatting() {
    assert_eq!(preview("X*2").to_string(), "X=1 -> 2");
    assert_eq!(preview("X/3").to_string(), "X=1 -> 0.3333");
    assert_eq!(preview("  ").to_string(), "X=1 -> (enter formula)");
    assert_eq!(preview("os.system('ls')").to_string(), "Invalid equation");
}
