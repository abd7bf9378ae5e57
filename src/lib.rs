//! Stack virtual machine for the EXP language.
//!
//! This crate defines the data model shared by the whole toolchain (runtime
//! [`Value`](value/enum.Value.html)s, bytecode
//! [`Instruction`](instruction/enum.Instruction.html)s and the
//! [`Executable`](executable/struct.Executable.html) container) as well as the
//! interpreter itself ([`Vm`](vm/struct.Vm.html)).
//!
//! The machine is a plain stack interpreter: instructions push and pop values
//! on a single evaluation stack, named variables live in a flat static memory,
//! and a call saves the caller's program counter together with a full snapshot
//! of static memory. Compilation from EXP source to an `Executable` lives in
//! the `expc` crate; the on-disk container format lives in `expfile`.

pub mod executable;
pub mod instruction;
pub mod value;
pub mod vm;

pub use crate::executable::{Executable, ExecutableError, FunctionExtent};
pub use crate::instruction::{Instruction, Operand};
pub use crate::value::{ArithOp, Relation, Type, Value, ValueError};
pub use crate::vm::{ExitCode, Fault, StaticMemory, Vm};
