//! Lowering from three-address code to machine instructions.
//!
//! Emission keeps two growing lists. The cursor starts in the main list and
//! switches permanently to the function list at the first label that names a
//! function; the final code is the main list followed by the function list,
//! so function bodies form a contiguous tail that the machine can step over.
//!
//! Operands lower to `PUSH` for constants and `LOAD` for names, with one
//! exception kept from the analyzer's literal registry: the source of a copy
//! whose name resolves to a registered literal symbol is inlined as a `PUSH`
//! of the literal's value.

use crate::symbol::{SymbolKind, SymbolTable};
use crate::tac::{Tac, TacOp};
use expvm::{Instruction, Operand, Type, Value};
use std::collections::HashSet;
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum EmitError {
    /// Array sizes must be compile-time integer constants.
    NonConstantArraySize { array: String },
    NegativeArraySize { array: String, size: i64 },
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EmitError::NonConstantArraySize { array } => {
                write!(f, "size of array '{}' is not a constant", array)
            }
            EmitError::NegativeArraySize { array, size } => {
                write!(f, "array '{}' has negative size {}", array, size)
            }
        }
    }
}

impl StdError for EmitError {}

pub fn emit(tac: &[Tac], symbols: &SymbolTable) -> Result<Vec<Instruction>, EmitError> {
    let functions = function_names(tac, symbols);

    let mut main_code: Vec<Instruction> = Vec::new();
    let mut function_code: Vec<Instruction> = Vec::new();
    let mut in_functions = false;

    let mut index = 0;
    while index < tac.len() {
        let instr = &tac[index];

        if instr.op == TacOp::Label && functions.contains(instr.result.as_deref().unwrap()) {
            in_functions = true;
        }
        let code = if in_functions {
            &mut function_code
        } else {
            &mut main_code
        };

        match &instr.op {
            TacOp::Alloc => {
                let name = instr.result.clone().unwrap();
                let value = alloc_value(instr, &name, symbols)?;
                code.push(Instruction::Alloc { name, value });
            }
            TacOp::Copy => {
                push_copy_source(code, instr.arg1.as_ref().unwrap(), symbols);
                code.push(Instruction::Store(instr.result.clone().unwrap()));
            }
            TacOp::Cast(target) => {
                push_operand(code, instr.arg1.as_ref().unwrap());
                code.push(Instruction::Cast(target.clone()));
                code.push(Instruction::Store(instr.result.clone().unwrap()));
            }
            TacOp::Load => {
                code.push(Instruction::LoadIndex {
                    array: operand_name(instr.arg1.as_ref().unwrap()),
                    index: instr.arg2.clone().unwrap(),
                });
                code.push(Instruction::Store(instr.result.clone().unwrap()));
            }
            TacOp::Store => {
                push_operand(code, instr.arg1.as_ref().unwrap());
                code.push(Instruction::StoreIndex {
                    array: instr.result.clone().unwrap(),
                    index: instr.arg2.clone().unwrap(),
                });
            }
            TacOp::Label => {
                code.push(Instruction::Label(instr.result.clone().unwrap()));
            }
            TacOp::Goto => {
                code.push(Instruction::Jump(instr.result.clone().unwrap()));
            }
            TacOp::IfZ => {
                // Jump past the branch-taken jump when the condition holds.
                let label = instr.result.clone().unwrap();
                let not_label = format!("NOT_{}", label);
                push_operand(code, instr.arg1.as_ref().unwrap());
                code.push(Instruction::JumpIfTrue(not_label.clone()));
                code.push(Instruction::Jump(label));
                code.push(Instruction::Label(not_label));
            }
            TacOp::Param => {
                // The caller pushed arguments left to right, so a run of
                // params binds them by popping in reverse declaration order.
                let mut params = Vec::new();
                while let Some(param) = tac.get(index) {
                    if param.op != TacOp::Param {
                        break;
                    }
                    params.push(param.result.clone().unwrap());
                    index += 1;
                }
                for name in params.into_iter().rev() {
                    code.push(Instruction::Store(name));
                }
                continue;
            }
            TacOp::Arg => {
                push_operand(code, instr.arg1.as_ref().unwrap());
            }
            TacOp::Call => {
                code.push(Instruction::Call(operand_name(instr.arg1.as_ref().unwrap())));
                code.push(Instruction::Store(instr.result.clone().unwrap()));
            }
            TacOp::Ret => {
                if let Some(value) = &instr.arg1 {
                    push_operand(code, value);
                }
                code.push(Instruction::Ret);
            }
            TacOp::Print => code.push(Instruction::Print),
            TacOp::Halt => code.push(Instruction::Halt),
            op => {
                push_operand(code, instr.arg1.as_ref().unwrap());
                push_operand(code, instr.arg2.as_ref().unwrap());
                code.push(binary_instruction(op));
                code.push(Instruction::Store(instr.result.clone().unwrap()));
            }
        }
        index += 1;
    }

    main_code.append(&mut function_code);
    Ok(main_code)
}

/// Every name the emitter must treat as a function label: call targets plus
/// all declared function symbols, so that a never-called function still
/// moves out of the main flow.
fn function_names(tac: &[Tac], symbols: &SymbolTable) -> HashSet<String> {
    let mut functions = HashSet::new();
    for instr in tac {
        if instr.op == TacOp::Call {
            if let Some(Operand::Name(name)) = &instr.arg1 {
                functions.insert(name.clone());
            }
        }
    }
    collect_function_symbols(symbols, &mut functions);
    functions
}

fn collect_function_symbols(table: &SymbolTable, functions: &mut HashSet<String>) {
    for symbol in table.symbols() {
        if matches!(symbol.kind, SymbolKind::Func { .. }) {
            functions.insert(symbol.name.clone());
        }
    }
    for child in table.children() {
        collect_function_symbols(child, functions);
    }
}

fn alloc_value(
    instr: &Tac,
    name: &str,
    symbols: &SymbolTable,
) -> Result<Option<Value>, EmitError> {
    let is_array = matches!(
        symbols.deep_get(name).and_then(|symbol| symbol.ty()),
        Some(Type::Array(_))
    );
    if !is_array {
        return Ok(None);
    }

    let size = match &instr.arg1 {
        Some(Operand::Const(Value::Int(size))) => *size,
        _ => {
            return Err(EmitError::NonConstantArraySize {
                array: name.to_owned(),
            })
        }
    };
    if size < 0 {
        return Err(EmitError::NegativeArraySize {
            array: name.to_owned(),
            size,
        });
    }
    Ok(Some(Value::Array(vec![Value::Int(0); size as usize])))
}

fn operand_name(operand: &Operand) -> String {
    match operand {
        Operand::Name(name) => name.clone(),
        Operand::Const(_) => unreachable!("name operand expected"),
    }
}

fn push_operand(code: &mut Vec<Instruction>, operand: &Operand) {
    match operand {
        Operand::Const(value) => code.push(Instruction::Push(value.clone())),
        Operand::Name(name) => code.push(Instruction::Load(name.clone())),
    }
}

fn push_copy_source(code: &mut Vec<Instruction>, source: &Operand, symbols: &SymbolTable) {
    match source {
        Operand::Const(value) => code.push(Instruction::Push(value.clone())),
        Operand::Name(name) => {
            match symbols.deep_get(name).and_then(|symbol| symbol.literal_value()) {
                Some(value) => code.push(Instruction::Push(value.clone())),
                None => code.push(Instruction::Load(name.clone())),
            }
        }
    }
}

fn binary_instruction(op: &TacOp) -> Instruction {
    match op {
        TacOp::Add => Instruction::Add,
        TacOp::Sub => Instruction::Sub,
        TacOp::Mul => Instruction::Mul,
        TacOp::Div => Instruction::Div,
        TacOp::Eq => Instruction::Eq,
        TacOp::Ne => Instruction::Neq,
        TacOp::Lt => Instruction::Lt,
        TacOp::Le => Instruction::Le,
        TacOp::Gt => Instruction::Gt,
        TacOp::Ge => Instruction::Ge,
        TacOp::And => Instruction::And,
        TacOp::Or => Instruction::Or,
        _ => unreachable!("not a binary operator"),
    }
}
