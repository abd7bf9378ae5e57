use super::*;
use crate::instruction::Instruction::*;

#[test]
fn jump_skips_over_code() {
    let (vm, _, _) = run_ok(vec![
        Jump("end".to_owned()),
        Push(Value::Int(1)),
        Store("x".to_owned()),
        Label("end".to_owned()),
    ]);

    assert_eq!(vm.memory().get("x"), None);
}

#[test]
fn jump_if_true_taken() {
    let (vm, _, _) = run_ok(vec![
        Push(Value::Int(1)),
        JumpIfTrue("end".to_owned()),
        Push(Value::Int(1)),
        Store("x".to_owned()),
        Label("end".to_owned()),
    ]);

    assert_eq!(vm.memory().get("x"), None);
}

#[test]
fn jump_if_true_not_taken() {
    let (vm, _, _) = run_ok(vec![
        Push(Value::Int(0)),
        JumpIfTrue("end".to_owned()),
        Push(Value::Int(1)),
        Store("x".to_owned()),
        Label("end".to_owned()),
    ]);

    assert_eq!(vm.memory().get("x"), Some(&Value::Int(1)));
}

#[test]
fn jump_if_true_pops_the_condition() {
    let (vm, _, _) = run_ok(vec![
        Push(Value::Bool(true)),
        JumpIfTrue("end".to_owned()),
        Label("end".to_owned()),
    ]);

    assert!(vm.stack().is_empty());
}

#[test]
fn backward_jump_loops() {
    // Counts to three with a hand-written loop.
    let (vm, _, exit) = run_ok(vec![
        Alloc {
            name: "i".to_owned(),
            value: None,
        },
        Label("loop".to_owned()),
        Load("i".to_owned()),
        Push(Value::Int(1)),
        Add,
        Store("i".to_owned()),
        Load("i".to_owned()),
        Push(Value::Int(3)),
        Lt,
        JumpIfTrue("loop".to_owned()),
        Halt,
    ]);

    assert_eq!(exit, ExitCode::Halted);
    assert_eq!(vm.memory().get("i"), Some(&Value::Int(3)));
}
