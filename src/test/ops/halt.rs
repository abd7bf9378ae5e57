use super::*;
use crate::instruction::Instruction::*;

#[test]
fn halt_stops_execution() {
    let (vm, _, exit) = run_ok(vec![
        Halt,
        Push(Value::Int(1)),
        Store("x".to_owned()),
    ]);

    assert_eq!(exit, ExitCode::Halted);
    assert_eq!(vm.memory().get("x"), None);
}

#[test]
fn running_off_the_end_completes() {
    let (_, _, exit) = run_ok(vec![Push(Value::Int(1))]);

    assert_eq!(exit, ExitCode::Completed);
}

#[test]
fn empty_program_completes() {
    let (_, _, exit) = run_ok(vec![]);

    assert_eq!(exit, ExitCode::Completed);
}

#[test]
fn stack_contents_at_halt_are_unconstrained() {
    let (vm, _, exit) = run_ok(vec![
        Push(Value::Int(1)),
        Push(Value::Str("leftover".to_owned())),
        Halt,
    ]);

    assert_eq!(exit, ExitCode::Halted);
    assert_eq!(vm.stack().len(), 2);
}
