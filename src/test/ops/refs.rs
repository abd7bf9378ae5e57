use super::*;
use crate::instruction::Instruction::*;

#[test]
fn load_addr_pushes_a_reference() {
    let (vm, _, _) = run_ok(vec![LoadAddr("x".to_owned())]);

    assert_eq!(vm.stack(), &[Value::Ref("x".to_owned())]);
}

#[test]
fn deref_peeks_and_pushes_the_referenced_value() {
    let (vm, _, _) = run_ok(vec![
        Push(Value::Int(9)),
        Store("x".to_owned()),
        LoadAddr("x".to_owned()),
        Deref,
    ]);

    // The reference stays below the loaded value.
    assert_eq!(
        vm.stack(),
        &[Value::Ref("x".to_owned()), Value::Int(9)]
    );
}

#[test]
fn store_at_addr_writes_through_the_reference() {
    let (vm, _, _) = run_ok(vec![
        Alloc {
            name: "x".to_owned(),
            value: None,
        },
        LoadAddr("x".to_owned()),
        Push(Value::Int(5)),
        StoreAtAddr,
    ]);

    assert_eq!(vm.memory().get("x"), Some(&Value::Int(5)));
    assert!(vm.stack().is_empty());
}

#[test]
fn deref_of_non_reference_faults() {
    let (_, _, result) = run(vec![Push(Value::Int(3)), Deref]);

    match result {
        Err(Fault::InvalidReference(value)) => assert_eq!(value, Value::Int(3)),
        other => panic!("expected invalid reference fault, got {:?}", other),
    }
}

#[test]
fn store_at_addr_to_non_reference_faults() {
    let (_, _, result) = run(vec![
        Push(Value::Int(1)),
        Push(Value::Int(2)),
        StoreAtAddr,
    ]);

    match result {
        Err(Fault::InvalidReference(value)) => assert_eq!(value, Value::Int(1)),
        other => panic!("expected invalid reference fault, got {:?}", other),
    }
}
