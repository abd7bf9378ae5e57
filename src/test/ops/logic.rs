use super::*;
use crate::instruction::Instruction::*;

fn logic(op: Instruction, a: Value, b: Value) -> Value {
    let (vm, _, _) = run_ok(vec![Push(a), Push(b), op, Store("r".to_owned())]);
    vm.memory().get("r").cloned().unwrap()
}

#[test]
fn and() {
    assert_eq!(
        logic(And, Value::Bool(true), Value::Bool(true)),
        Value::Bool(true)
    );
    assert_eq!(
        logic(And, Value::Bool(true), Value::Bool(false)),
        Value::Bool(false)
    );
}

#[test]
fn or() {
    assert_eq!(
        logic(Or, Value::Bool(false), Value::Bool(true)),
        Value::Bool(true)
    );
    assert_eq!(
        logic(Or, Value::Bool(false), Value::Bool(false)),
        Value::Bool(false)
    );
}

#[test]
fn operands_combine_by_truthiness() {
    assert_eq!(logic(And, Value::Int(1), Value::Int(2)), Value::Bool(true));
    assert_eq!(logic(And, Value::Int(1), Value::Int(0)), Value::Bool(false));
    assert_eq!(
        logic(Or, Value::Str(String::new()), Value::Int(0)),
        Value::Bool(false)
    );
    assert_eq!(
        logic(Or, Value::Str("x".to_owned()), Value::Int(0)),
        Value::Bool(true)
    );
}
