use crate::executable::Executable;
use crate::instruction::{Instruction, Operand};
use crate::value::{self, ArithOp, Relation, Type, Value, ValueError};
use indexmap::IndexMap;
use std::error::Error as StdError;
use std::fmt;
use std::io::Write;

/// The flat name-to-value mapping holding every user variable.
///
/// Calls snapshot it wholesale and returns restore it wholesale, so callees
/// get a private environment and the only channel back to the caller is the
/// evaluation stack. Insertion order is kept so memory dumps are stable.
pub type StaticMemory = IndexMap<String, Value>;

/// Saved caller context, pushed by `CALL` and popped by `RET`.
#[derive(Clone, Debug)]
struct Frame {
    return_pc: usize,
    memory: StaticMemory,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExitCode {
    Halted,    // HALT instruction was executed
    Completed, // Program counter ran past the last instruction
}

#[derive(Debug)]
pub enum Fault {
    UndefinedVariable(String),
    UndefinedLabel(String),
    StackUnderflow(&'static str),
    ReturnWithoutCall,
    InvalidReference(Value),
    NotAnArray(String),
    NonIntegerIndex { array: String, index: Value },
    IndexOutOfBounds { array: String, index: i64 },
    DivisionByZero,
    TypeMismatch { op: &'static str, lhs: Value, rhs: Value },
    InvalidCast { value: Value, target: Type },
    Io(std::io::Error),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Fault::UndefinedVariable(name) => write!(f, "variable '{}' is not allocated", name),
            Fault::UndefinedLabel(name) => write!(f, "label '{}' does not exist", name),
            Fault::StackUnderflow(op) => {
                write!(f, "{} executed with an empty evaluation stack", op)
            }
            Fault::ReturnWithoutCall => f.write_str("RET executed without an active CALL"),
            Fault::InvalidReference(value) => {
                write!(f, "reference operation on a non-reference value: {}", value)
            }
            Fault::NotAnArray(name) => write!(f, "variable '{}' is not an array", name),
            Fault::NonIntegerIndex { array, index } => {
                write!(f, "index into '{}' is not an integer: {}", array, index)
            }
            Fault::IndexOutOfBounds { array, index } => {
                write!(f, "index {} is out of bounds for '{}'", index, array)
            }
            Fault::DivisionByZero => f.write_str("division by zero"),
            Fault::TypeMismatch { op, lhs, rhs } => write!(
                f,
                "operator '{}' cannot combine {} and {}",
                op,
                lhs.type_name(),
                rhs.type_name()
            ),
            Fault::InvalidCast { value, target } => {
                write!(f, "cannot cast {} to {}", value.type_name(), target)
            }
            Fault::Io(err) => write!(f, "output failed: {}", err),
        }
    }
}

impl StdError for Fault {}

impl From<ValueError> for Fault {
    fn from(err: ValueError) -> Fault {
        match err {
            ValueError::DivisionByZero => Fault::DivisionByZero,
            ValueError::TypeMismatch { op, lhs, rhs } => Fault::TypeMismatch { op, lhs, rhs },
            ValueError::InvalidCast { value, target } => Fault::InvalidCast { value, target },
        }
    }
}

enum Step {
    Next,
    Jump(usize),
    Stop,
}

/// The stack interpreter.
///
/// `run` executes an [`Executable`](../executable/struct.Executable.html)
/// from the first instruction until `HALT`, the end of the code, or a fault.
/// The final machine state stays observable afterwards, which the tests use
/// to assert on memory and stack contents.
#[derive(Debug, Default)]
pub struct Vm {
    stack: Vec<Value>,
    memory: StaticMemory,
    call_stack: Vec<Frame>,
    pc: usize,
}

impl Vm {
    pub fn new() -> Vm {
        Vm::default()
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack[..]
    }

    pub fn memory(&self) -> &StaticMemory {
        &self.memory
    }

    pub fn run<W: Write>(
        &mut self,
        executable: &Executable,
        output: &mut W,
    ) -> Result<ExitCode, Fault> {
        self.stack.clear();
        self.memory.clear();
        self.call_stack.clear();
        self.pc = 0;

        let code = executable.instructions();
        while self.pc < code.len() {
            // Function bodies reached in linear flow are stepped over; they
            // only execute through CALL.
            if let Instruction::Label(name) = &code[self.pc] {
                if let Some(extent) = executable.function(name) {
                    self.pc = extent.end + 1;
                    continue;
                }
            }

            match self.step(&code[self.pc], executable, output)? {
                Step::Next => self.pc += 1,
                Step::Jump(target) => self.pc = target,
                Step::Stop => return Ok(ExitCode::Halted),
            }
        }

        Ok(ExitCode::Completed)
    }

    fn step<W: Write>(
        &mut self,
        instruction: &Instruction,
        executable: &Executable,
        output: &mut W,
    ) -> Result<Step, Fault> {
        match instruction {
            Instruction::Alloc { name, value } => {
                let initial = value.clone().unwrap_or(Value::Int(0));
                self.memory.insert(name.clone(), initial);
            }
            Instruction::Push(value) => self.stack.push(value.clone()),
            Instruction::Pop => {
                self.pop("POP")?;
            }
            Instruction::Load(name) => {
                let value = self.load(name)?;
                self.stack.push(value);
            }
            Instruction::Store(name) => {
                let value = self.pop("STORE")?;
                self.memory.insert(name.clone(), value);
            }
            Instruction::Add => self.arith(ArithOp::Add)?,
            Instruction::Sub => self.arith(ArithOp::Sub)?,
            Instruction::Mul => self.arith(ArithOp::Mul)?,
            Instruction::Div => self.arith(ArithOp::Div)?,
            Instruction::Eq => self.relate(Relation::Eq)?,
            Instruction::Neq => self.relate(Relation::Ne)?,
            Instruction::Lt => self.relate(Relation::Lt)?,
            Instruction::Le => self.relate(Relation::Le)?,
            Instruction::Gt => self.relate(Relation::Gt)?,
            Instruction::Ge => self.relate(Relation::Ge)?,
            Instruction::And => {
                let (a, b) = self.operands("AND")?;
                self.stack.push(Value::Bool(a.is_truthy() && b.is_truthy()));
            }
            Instruction::Or => {
                let (a, b) = self.operands("OR")?;
                self.stack.push(Value::Bool(a.is_truthy() || b.is_truthy()));
            }
            Instruction::Cast(target) => {
                let value = self.pop("CAST")?;
                self.stack.push(value::cast(&value, target)?);
            }
            Instruction::Print => {
                let value = self.pop("PRINT")?;
                writeln!(output, ">> {}", value).map_err(Fault::Io)?;
            }
            Instruction::Label(_) => {}
            Instruction::Jump(label) => {
                return Ok(Step::Jump(self.target(executable, label)?));
            }
            Instruction::JumpIfTrue(label) => {
                let condition = self.pop("JMP_IF_TRUE")?;
                if condition.is_truthy() {
                    return Ok(Step::Jump(self.target(executable, label)?));
                }
            }
            Instruction::Call(label) => {
                let target = self.target(executable, label)?;
                self.call_stack.push(Frame {
                    return_pc: self.pc,
                    memory: self.memory.clone(),
                });
                // Resume just past the function's label.
                return Ok(Step::Jump(target + 1));
            }
            Instruction::Ret => {
                let frame = self.call_stack.pop().ok_or(Fault::ReturnWithoutCall)?;
                self.memory = frame.memory;
                return Ok(Step::Jump(frame.return_pc + 1));
            }
            Instruction::LoadIndex { array, index } => {
                let index = self.index(array, index)?;
                let value = self.element(array, index)?;
                self.stack.push(value);
            }
            Instruction::StoreIndex { array, index } => {
                let value = self.pop("STORE_INDEX")?;
                let index = self.index(array, index)?;
                *self.element_mut(array, index)? = value;
            }
            Instruction::LoadAddr(name) => self.stack.push(Value::Ref(name.clone())),
            Instruction::Deref => {
                let referenced = match self.stack.last() {
                    Some(Value::Ref(name)) => self.load(&name.clone())?,
                    Some(other) => return Err(Fault::InvalidReference(other.clone())),
                    None => return Err(Fault::StackUnderflow("DEREF")),
                };
                self.stack.push(referenced);
            }
            Instruction::StoreAtAddr => {
                let value = self.pop("STORE_AT_ADDR")?;
                match self.pop("STORE_AT_ADDR")? {
                    Value::Ref(name) => {
                        self.memory.insert(name, value);
                    }
                    other => return Err(Fault::InvalidReference(other)),
                }
            }
            Instruction::Halt => return Ok(Step::Stop),
        }

        Ok(Step::Next)
    }

    fn target(&self, executable: &Executable, label: &str) -> Result<usize, Fault> {
        executable
            .label(label)
            .ok_or_else(|| Fault::UndefinedLabel(label.to_owned()))
    }

    fn load(&self, name: &str) -> Result<Value, Fault> {
        self.memory
            .get(name)
            .cloned()
            .ok_or_else(|| Fault::UndefinedVariable(name.to_owned()))
    }

    fn pop(&mut self, op: &'static str) -> Result<Value, Fault> {
        self.stack.pop().ok_or(Fault::StackUnderflow(op))
    }

    /// Pops both operands of a binary operator; the second-popped value is
    /// the left operand.
    fn operands(&mut self, op: &'static str) -> Result<(Value, Value), Fault> {
        let b = self.pop(op)?;
        let a = self.pop(op)?;
        Ok((a, b))
    }

    fn arith(&mut self, op: ArithOp) -> Result<(), Fault> {
        let (a, b) = self.operands(op.symbol())?;
        self.stack.push(value::arith(op, &a, &b)?);
        Ok(())
    }

    fn relate(&mut self, rel: Relation) -> Result<(), Fault> {
        let (a, b) = self.operands(rel.symbol())?;
        self.stack.push(value::relate(rel, &a, &b)?);
        Ok(())
    }

    fn index(&self, array: &str, index: &Operand) -> Result<i64, Fault> {
        let value = match index {
            Operand::Const(value) => value.clone(),
            Operand::Name(name) => self.load(name)?,
        };
        match value {
            Value::Int(i) => Ok(i),
            other => Err(Fault::NonIntegerIndex {
                array: array.to_owned(),
                index: other,
            }),
        }
    }

    fn element(&self, array: &str, index: i64) -> Result<Value, Fault> {
        match self.memory.get(array) {
            Some(Value::Array(elements)) => elements
                .get(checked_index(array, index, elements.len())?)
                .cloned()
                .ok_or_else(|| Fault::IndexOutOfBounds {
                    array: array.to_owned(),
                    index,
                }),
            Some(_) => Err(Fault::NotAnArray(array.to_owned())),
            None => Err(Fault::UndefinedVariable(array.to_owned())),
        }
    }

    fn element_mut(&mut self, array: &str, index: i64) -> Result<&mut Value, Fault> {
        match self.memory.get_mut(array) {
            Some(Value::Array(elements)) => {
                let len = elements.len();
                elements
                    .get_mut(checked_index(array, index, len)?)
                    .ok_or_else(|| Fault::IndexOutOfBounds {
                        array: array.to_owned(),
                        index,
                    })
            }
            Some(_) => Err(Fault::NotAnArray(array.to_owned())),
            None => Err(Fault::UndefinedVariable(array.to_owned())),
        }
    }
}

fn checked_index(array: &str, index: i64, len: usize) -> Result<usize, Fault> {
    if index < 0 || index as usize >= len {
        Err(Fault::IndexOutOfBounds {
            array: array.to_owned(),
            index,
        })
    } else {
        Ok(index as usize)
    }
}
