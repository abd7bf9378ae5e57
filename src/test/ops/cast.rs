use super::*;
use crate::instruction::Instruction::*;
use crate::value::Type;

fn cast_to(target: Type, value: Value) -> Result<Value, Fault> {
    let (vm, _, result) = run(vec![Push(value), Cast(target), Store("r".to_owned())]);
    result.map(|_| vm.memory().get("r").cloned().unwrap())
}

#[test]
fn int_to_float() {
    assert_eq!(cast_to(Type::Float, Value::Int(3)).unwrap(), Value::Float(3.0));
}

#[test]
fn float_to_int_truncates() {
    assert_eq!(cast_to(Type::Int, Value::Float(3.9)).unwrap(), Value::Int(3));
    assert_eq!(
        cast_to(Type::Int, Value::Float(-3.9)).unwrap(),
        Value::Int(-3)
    );
}

#[test]
fn bool_to_int() {
    assert_eq!(cast_to(Type::Int, Value::Bool(true)).unwrap(), Value::Int(1));
    assert_eq!(cast_to(Type::Int, Value::Bool(false)).unwrap(), Value::Int(0));
}

#[test]
fn to_bool_follows_truthiness() {
    assert_eq!(cast_to(Type::Bool, Value::Int(0)).unwrap(), Value::Bool(false));
    assert_eq!(
        cast_to(Type::Bool, Value::Str("x".to_owned())).unwrap(),
        Value::Bool(true)
    );
}

#[test]
fn to_string_uses_display_form() {
    assert_eq!(
        cast_to(Type::Str, Value::Int(11)).unwrap(),
        Value::Str("11".to_owned())
    );
    assert_eq!(
        cast_to(Type::Str, Value::Bool(true)).unwrap(),
        Value::Str("true".to_owned())
    );
}

#[test]
fn invalid_cast_faults() {
    match cast_to(Type::Int, Value::Array(vec![])) {
        Err(Fault::InvalidCast { target, .. }) => assert_eq!(target, Type::Int),
        other => panic!("expected invalid cast, got {:?}", other),
    }
}
