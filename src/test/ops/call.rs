use super::*;
use crate::instruction::Instruction::*;

#[test]
fn call_leaves_return_value_on_the_stack() {
    let (vm, _, exit) = run_ok(vec![
        Push(Value::Int(5)),
        Push(Value::Int(6)),
        Call("add".to_owned()),
        Store("r".to_owned()),
        Halt,
        Label("add".to_owned()),
        Store("b".to_owned()),
        Store("a".to_owned()),
        Load("a".to_owned()),
        Load("b".to_owned()),
        Add,
        Ret,
    ]);

    assert_eq!(exit, ExitCode::Halted);
    assert_eq!(vm.memory().get("r"), Some(&Value::Int(11)));
}

#[test]
fn ret_restores_the_caller_memory_snapshot() {
    let (vm, _, _) = run_ok(vec![
        Push(Value::Int(1)),
        Store("x".to_owned()),
        Call("clobber".to_owned()),
        Halt,
        Label("clobber".to_owned()),
        Push(Value::Int(99)),
        Store("x".to_owned()),
        Push(Value::Int(0)),
        Ret,
    ]);

    // The callee's writes vanish with its environment.
    assert_eq!(vm.memory().get("x"), Some(&Value::Int(1)));
    assert_eq!(vm.stack(), &[Value::Int(0)]);
}

#[test]
fn nested_calls_unwind_in_order() {
    let (vm, _, _) = run_ok(vec![
        Call("outer".to_owned()),
        Store("r".to_owned()),
        Halt,
        Label("outer".to_owned()),
        Call("inner".to_owned()),
        Push(Value::Int(1)),
        Add,
        Ret,
        Label("inner".to_owned()),
        Push(Value::Int(41)),
        Ret,
    ]);

    assert_eq!(vm.memory().get("r"), Some(&Value::Int(42)));
}

#[test]
fn function_bodies_are_skipped_in_linear_flow() {
    // No HALT: execution runs off the end, but the body of `f` must not run.
    let (vm, output, exit) = run_ok(vec![
        Call("f".to_owned()),
        Pop,
        Label("f".to_owned()),
        Push(Value::Str("ran".to_owned())),
        Print,
        Push(Value::Int(0)),
        Ret,
    ]);

    assert_eq!(exit, ExitCode::Completed);
    assert_eq!(output, ">> ran\n");
    assert!(vm.stack().is_empty());
}

#[test]
fn ret_without_call_faults() {
    let (_, _, result) = run(vec![Push(Value::Int(0)), Ret]);

    match result {
        Err(Fault::ReturnWithoutCall) => {}
        other => panic!("expected return-without-call fault, got {:?}", other),
    }
}
