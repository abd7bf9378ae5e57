use super::*;
use crate::instruction::Instruction::*;

#[test]
fn alloc_defaults_to_zero() {
    let (vm, _, exit) = run_ok(vec![Alloc {
        name: "x".to_owned(),
        value: None,
    }]);

    assert_eq!(exit, ExitCode::Completed);
    assert_eq!(vm.memory().get("x"), Some(&Value::Int(0)));
}

#[test]
fn alloc_with_initial_value() {
    let (vm, _, _) = run_ok(vec![Alloc {
        name: "a".to_owned(),
        value: Some(Value::Array(vec![Value::Int(0); 3])),
    }]);

    assert_eq!(
        vm.memory().get("a"),
        Some(&Value::Array(vec![Value::Int(0); 3]))
    );
}

#[test]
fn push_and_pop() {
    let (vm, _, _) = run_ok(vec![
        Push(Value::Int(1)),
        Push(Value::Str("two".to_owned())),
        Pop,
    ]);

    assert_eq!(vm.stack(), &[Value::Int(1)]);
}

#[test]
fn store_then_load() {
    let (vm, _, _) = run_ok(vec![
        Push(Value::Int(42)),
        Store("x".to_owned()),
        Load("x".to_owned()),
        Load("x".to_owned()),
    ]);

    assert_eq!(vm.stack(), &[Value::Int(42), Value::Int(42)]);
    assert_eq!(vm.memory().get("x"), Some(&Value::Int(42)));
}

#[test]
fn load_of_unallocated_variable_faults() {
    let (_, _, result) = run(vec![Load("ghost".to_owned())]);

    match result {
        Err(Fault::UndefinedVariable(name)) => assert_eq!(name, "ghost"),
        other => panic!("expected undefined variable fault, got {:?}", other),
    }
}

#[test]
fn pop_of_empty_stack_faults() {
    let (_, _, result) = run(vec![Pop]);

    match result {
        Err(Fault::StackUnderflow(op)) => assert_eq!(op, "POP"),
        other => panic!("expected stack underflow, got {:?}", other),
    }
}

#[test]
fn store_of_empty_stack_faults() {
    let (_, _, result) = run(vec![Store("x".to_owned())]);

    match result {
        Err(Fault::StackUnderflow(op)) => assert_eq!(op, "STORE"),
        other => panic!("expected stack underflow, got {:?}", other),
    }
}
