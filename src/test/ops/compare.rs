use super::*;
use crate::instruction::Instruction::*;

fn compare(op: Instruction, a: Value, b: Value) -> Result<Value, Fault> {
    let (vm, _, result) = run(vec![Push(a), Push(b), op, Store("r".to_owned())]);
    result.map(|_| vm.memory().get("r").cloned().unwrap())
}

#[test]
fn comparisons_yield_integer_flags() {
    assert_eq!(
        compare(Lt, Value::Int(1), Value::Int(2)).unwrap(),
        Value::Int(1)
    );
    assert_eq!(
        compare(Lt, Value::Int(2), Value::Int(1)).unwrap(),
        Value::Int(0)
    );
    assert_eq!(
        compare(Le, Value::Int(2), Value::Int(2)).unwrap(),
        Value::Int(1)
    );
    assert_eq!(
        compare(Gt, Value::Int(3), Value::Int(2)).unwrap(),
        Value::Int(1)
    );
    assert_eq!(
        compare(Ge, Value::Int(1), Value::Int(2)).unwrap(),
        Value::Int(0)
    );
}

#[test]
fn equality() {
    assert_eq!(
        compare(Eq, Value::Int(5), Value::Int(5)).unwrap(),
        Value::Int(1)
    );
    assert_eq!(
        compare(Neq, Value::Int(5), Value::Int(5)).unwrap(),
        Value::Int(0)
    );
    assert_eq!(
        compare(Eq, Value::Bool(true), Value::Bool(true)).unwrap(),
        Value::Int(1)
    );
}

#[test]
fn numeric_comparison_promotes() {
    assert_eq!(
        compare(Lt, Value::Int(1), Value::Float(1.5)).unwrap(),
        Value::Int(1)
    );
    assert_eq!(
        compare(Eq, Value::Float(2.0), Value::Int(2)).unwrap(),
        Value::Int(1)
    );
}

#[test]
fn strings_compare_lexicographically() {
    assert_eq!(
        compare(
            Lt,
            Value::Str("abc".to_owned()),
            Value::Str("abd".to_owned())
        )
        .unwrap(),
        Value::Int(1)
    );
    assert_eq!(
        compare(
            Eq,
            Value::Str("same".to_owned()),
            Value::Str("same".to_owned())
        )
        .unwrap(),
        Value::Int(1)
    );
}

#[test]
fn equality_across_kinds_is_false() {
    assert_eq!(
        compare(Eq, Value::Int(1), Value::Str("1".to_owned())).unwrap(),
        Value::Int(0)
    );
    assert_eq!(
        compare(Neq, Value::Bool(true), Value::Int(1)).unwrap(),
        Value::Int(1)
    );
}

#[test]
fn ordering_across_kinds_faults() {
    match compare(Lt, Value::Int(1), Value::Str("1".to_owned())) {
        Err(Fault::TypeMismatch { op, .. }) => assert_eq!(op, "<"),
        other => panic!("expected type mismatch, got {:?}", other),
    }
}
