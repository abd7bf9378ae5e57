use crate::instruction::Instruction;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

/// Index range of a function body in the instruction list, from its `LABEL`
/// to its final instruction, both inclusive.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FunctionExtent {
    pub start: usize,
    pub end: usize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExecutableError {
    /// A label name is defined by more than one `LABEL` instruction.
    DuplicateLabel(String),
    /// A jump or call names a label that is never defined.
    UndefinedLabel(String),
}

impl fmt::Display for ExecutableError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExecutableError::DuplicateLabel(name) => {
                write!(f, "label '{}' is defined more than once", name)
            }
            ExecutableError::UndefinedLabel(name) => {
                write!(f, "jump target '{}' is not defined", name)
            }
        }
    }
}

impl StdError for ExecutableError {}

/// A validated, runnable instruction list.
///
/// Construction performs the machine's pre-pass once: it resolves every label
/// to its index, rejects duplicate or missing jump targets, and records the
/// extent of every function body (a function is any `CALL` target) so the
/// interpreter can step over bodies it meets in linear flow without scanning
/// for a `RET`.
#[derive(Clone, Debug, PartialEq)]
pub struct Executable {
    instructions: Vec<Instruction>,
    labels: HashMap<String, usize>,
    functions: HashMap<String, FunctionExtent>,
}

impl Executable {
    pub fn new(instructions: Vec<Instruction>) -> Result<Executable, ExecutableError> {
        let mut labels = HashMap::new();
        for (index, instruction) in instructions.iter().enumerate() {
            if let Instruction::Label(name) = instruction {
                if labels.insert(name.clone(), index).is_some() {
                    return Err(ExecutableError::DuplicateLabel(name.clone()));
                }
            }
        }

        let mut called = Vec::new();
        for instruction in &instructions {
            let target = match instruction {
                Instruction::Jump(name)
                | Instruction::JumpIfTrue(name)
                | Instruction::Call(name) => name,
                _ => continue,
            };
            if !labels.contains_key(target) {
                return Err(ExecutableError::UndefinedLabel(target.clone()));
            }
            if let Instruction::Call(name) = instruction {
                called.push(name.clone());
            }
        }

        // Function bodies are emitted contiguously at the end of the code, so
        // each one extends to the instruction before the next function label.
        let mut starts: Vec<(usize, String)> = called
            .iter()
            .map(|name| (labels[name], name.clone()))
            .collect();
        starts.sort();
        starts.dedup();

        let mut functions = HashMap::new();
        for (i, (start, name)) in starts.iter().enumerate() {
            let end = match starts.get(i + 1) {
                Some((next_start, _)) => next_start - 1,
                None => instructions.len() - 1,
            };
            functions.insert(name.clone(), FunctionExtent { start: *start, end });
        }

        Ok(Executable {
            instructions,
            labels,
            functions,
        })
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions[..]
    }

    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// The extent of the named function, if the name is a call target.
    pub fn function(&self, name: &str) -> Option<FunctionExtent> {
        self.functions.get(name).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }
}
