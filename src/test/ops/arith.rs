use super::*;
use crate::instruction::Instruction::*;

fn binary(op: Instruction, a: Value, b: Value) -> Result<Value, Fault> {
    let (vm, _, result) = run(vec![Push(a), Push(b), op, Store("r".to_owned())]);
    result.map(|_| vm.memory().get("r").cloned().unwrap())
}

#[test]
fn add() {
    assert_eq!(
        binary(Add, Value::Int(42), Value::Int(64)).unwrap(),
        Value::Int(106)
    );
}

#[test]
fn second_popped_operand_is_the_left_operand() {
    assert_eq!(
        binary(Sub, Value::Int(10), Value::Int(4)).unwrap(),
        Value::Int(6)
    );
    assert_eq!(
        binary(Div, Value::Int(12), Value::Int(4)).unwrap(),
        Value::Int(3)
    );
}

#[test]
fn mul() {
    assert_eq!(
        binary(Mul, Value::Int(-3), Value::Int(7)).unwrap(),
        Value::Int(-21)
    );
}

#[test]
fn integer_division_truncates() {
    assert_eq!(
        binary(Div, Value::Int(7), Value::Int(2)).unwrap(),
        Value::Int(3)
    );
    assert_eq!(
        binary(Div, Value::Int(-7), Value::Int(2)).unwrap(),
        Value::Int(-3)
    );
}

#[test]
fn integer_division_by_zero_faults() {
    match binary(Div, Value::Int(1), Value::Int(0)) {
        Err(Fault::DivisionByZero) => {}
        other => panic!("expected division by zero, got {:?}", other),
    }
}

#[test]
fn float_division_by_zero_is_infinite() {
    assert_eq!(
        binary(Div, Value::Float(1.0), Value::Float(0.0)).unwrap(),
        Value::Float(std::f64::INFINITY)
    );
}

#[test]
fn float_operand_promotes() {
    assert_eq!(
        binary(Add, Value::Int(1), Value::Float(0.5)).unwrap(),
        Value::Float(1.5)
    );
    assert_eq!(
        binary(Mul, Value::Float(2.5), Value::Int(2)).unwrap(),
        Value::Float(5.0)
    );
}

#[test]
fn add_concatenates_strings() {
    assert_eq!(
        binary(
            Add,
            Value::Str("foo".to_owned()),
            Value::Str("bar".to_owned())
        )
        .unwrap(),
        Value::Str("foobar".to_owned())
    );
}

#[test]
fn other_string_operators_fault() {
    match binary(
        Sub,
        Value::Str("a".to_owned()),
        Value::Str("b".to_owned()),
    ) {
        Err(Fault::TypeMismatch { op, .. }) => assert_eq!(op, "-"),
        other => panic!("expected type mismatch, got {:?}", other),
    }
}

#[test]
fn integer_arithmetic_wraps() {
    assert_eq!(
        binary(Add, Value::Int(i64::max_value()), Value::Int(1)).unwrap(),
        Value::Int(i64::min_value())
    );
}

#[test]
fn arith_with_one_operand_underflows() {
    let (_, _, result) = run(vec![Push(Value::Int(1)), Add]);

    match result {
        Err(Fault::StackUnderflow(op)) => assert_eq!(op, "+"),
        other => panic!("expected stack underflow, got {:?}", other),
    }
}
