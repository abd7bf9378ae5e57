use super::*;
use crate::instruction::Instruction::*;

fn array_alloc(name: &str, len: usize) -> Instruction {
    Alloc {
        name: name.to_owned(),
        value: Some(Value::Array(vec![Value::Int(0); len])),
    }
}

#[test]
fn store_and_load_by_constant_index() {
    let (vm, _, _) = run_ok(vec![
        array_alloc("a", 3),
        Push(Value::Int(7)),
        StoreIndex {
            array: "a".to_owned(),
            index: Operand::Const(Value::Int(1)),
        },
        LoadIndex {
            array: "a".to_owned(),
            index: Operand::Const(Value::Int(1)),
        },
    ]);

    assert_eq!(vm.stack(), &[Value::Int(7)]);
    assert_eq!(
        vm.memory().get("a"),
        Some(&Value::Array(vec![
            Value::Int(0),
            Value::Int(7),
            Value::Int(0)
        ]))
    );
}

#[test]
fn index_may_come_from_memory() {
    let (vm, _, _) = run_ok(vec![
        array_alloc("a", 2),
        Push(Value::Int(1)),
        Store("i".to_owned()),
        Push(Value::Str("stored".to_owned())),
        StoreIndex {
            array: "a".to_owned(),
            index: Operand::Name("i".to_owned()),
        },
        LoadIndex {
            array: "a".to_owned(),
            index: Operand::Name("i".to_owned()),
        },
    ]);

    assert_eq!(vm.stack(), &[Value::Str("stored".to_owned())]);
}

#[test]
fn out_of_bounds_index_faults() {
    let (_, _, result) = run(vec![
        array_alloc("a", 2),
        LoadIndex {
            array: "a".to_owned(),
            index: Operand::Const(Value::Int(2)),
        },
    ]);

    match result {
        Err(Fault::IndexOutOfBounds { array, index }) => {
            assert_eq!(array, "a");
            assert_eq!(index, 2);
        }
        other => panic!("expected out-of-bounds fault, got {:?}", other),
    }
}

#[test]
fn negative_index_faults() {
    let (_, _, result) = run(vec![
        array_alloc("a", 2),
        Push(Value::Int(0)),
        StoreIndex {
            array: "a".to_owned(),
            index: Operand::Const(Value::Int(-1)),
        },
    ]);

    match result {
        Err(Fault::IndexOutOfBounds { index, .. }) => assert_eq!(index, -1),
        other => panic!("expected out-of-bounds fault, got {:?}", other),
    }
}

#[test]
fn non_integer_index_faults() {
    let (_, _, result) = run(vec![
        array_alloc("a", 2),
        LoadIndex {
            array: "a".to_owned(),
            index: Operand::Const(Value::Str("one".to_owned())),
        },
    ]);

    match result {
        Err(Fault::NonIntegerIndex { array, .. }) => assert_eq!(array, "a"),
        other => panic!("expected non-integer index fault, got {:?}", other),
    }
}

#[test]
fn indexing_a_scalar_faults() {
    let (_, _, result) = run(vec![
        Alloc {
            name: "x".to_owned(),
            value: None,
        },
        LoadIndex {
            array: "x".to_owned(),
            index: Operand::Const(Value::Int(0)),
        },
    ]);

    match result {
        Err(Fault::NotAnArray(name)) => assert_eq!(name, "x"),
        other => panic!("expected not-an-array fault, got {:?}", other),
    }
}
