use super::*;
use crate::instruction::Instruction::*;

#[test]
fn print_writes_one_prefixed_line() {
    let (_, output, _) = run_ok(vec![Push(Value::Str("Hello World".to_owned())), Print]);

    assert_eq!(output, ">> Hello World\n");
}

#[test]
fn print_uses_host_display_forms() {
    let (_, output, _) = run_ok(vec![
        Push(Value::Int(11)),
        Print,
        Push(Value::Float(2.5)),
        Print,
        Push(Value::Bool(true)),
        Print,
    ]);

    assert_eq!(output, ">> 11\n>> 2.5\n>> true\n");
}

#[test]
fn print_pops_its_operand() {
    let (vm, _, _) = run_ok(vec![Push(Value::Int(1)), Push(Value::Int(2)), Print]);

    assert_eq!(vm.stack(), &[Value::Int(1)]);
}

#[test]
fn print_of_empty_stack_faults() {
    let (_, _, result) = run(vec![Print]);

    match result {
        Err(Fault::StackUnderflow(op)) => assert_eq!(op, "PRINT"),
        other => panic!("expected stack underflow, got {:?}", other),
    }
}
