//! Compiler for the EXP language.
//!
//! The main function provided by this crate is [`compile`](fn.compile.html),
//! which accepts EXP source text and produces a runnable
//! [`Executable`](../expvm/executable/struct.Executable.html) for the `expvm`
//! machine. Each pipeline stage is also exported on its own — [`parse`],
//! [`analyze`], [`lower`], [`optimize`] and [`emit`] — so callers can inspect
//! the intermediate artifacts, which the `expx` binary does in verbose mode.
//!
//! [`parse`]: parser/fn.parse.html
//! [`analyze`]: analyzer/fn.analyze.html
//! [`lower`]: lower/fn.lower.html
//! [`optimize`]: optimizer/fn.optimize.html
//! [`emit`]: emit/fn.emit.html
//!
//! # The EXP Language
//!
//! A program is one or more `namespace Name { … }` blocks. Declarations and
//! statements inside a namespace:
//!
//! Form | Example
//! -----|--------
//! Typed variable        | `int x;` or `int x = 1;`
//! Inferred variable     | `auto msg = "hi";`
//! Array                 | `float samples[16];`
//! Function              | `int soma(int a, int b) { return a + b; }`
//! Conditional           | `if (x < 3) { … } else { … }`
//! Assignment            | `x = 1;` or `samples[2] = 0.5;`
//! Output                | `print(x);`
//! Stop                  | `halt();`
//!
//! Expressions support the operators `|| && == != < <= > >= + - * /`, the
//! unary forms `-x` and `!x`, calls `f(args)`, array indexing `a[i]`,
//! qualified references `ns.name`, parentheses, and `int`, `float`, `bool`
//! and `string` literals. Comments run from `//` to the end of the line.
//!
//! # Pipeline
//!
//! Source text is parsed into an AST, type-checked against a scope tree,
//! lowered to three-address code, optionally optimized, and emitted as stack
//! bytecode:
//!
//! ```text
//! parse -> analyze -> lower -> [optimize] -> emit -> Executable
//! ```
//!
//! Compilation never produces partial output: the first failing stage aborts
//! with an [`Error`](enum.Error.html) describing the offending construct.

mod analyzer;
mod ast;
mod emit;
mod lower;
mod optimizer;
mod parser;
mod symbol;
mod tac;


pub use crate::analyzer::{analyze, SemanticError};
pub use crate::ast::{BinOp, Block, Expr, FunctionDecl, Namespace, Program, Stmt, Target};
pub use crate::emit::{emit, EmitError};
pub use crate::lower::lower;
pub use crate::optimizer::{
    eliminate_common_subexpressions, eliminate_dead_code, fold_constants, optimize,
    propagate_constants, propagate_copies,
};
pub use crate::parser::{parse, ExpParser, Rule};
pub use crate::symbol::{Param, Symbol, SymbolKind, SymbolTable};
pub use crate::tac::{Tac, TacOp};

use expvm::{Executable, ExecutableError};
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Parse(parser::Error),
    Semantic(SemanticError),
    Emit(EmitError),
    Link(ExecutableError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "{}", err),
            Error::Semantic(err) => write!(f, "semantic error: {}", err),
            Error::Emit(err) => write!(f, "emit error: {}", err),
            Error::Link(err) => write!(f, "invalid bytecode: {}", err),
        }
    }
}

impl StdError for Error {}

impl From<parser::Error> for Error {
    fn from(err: parser::Error) -> Error {
        Error::Parse(err)
    }
}

impl From<SemanticError> for Error {
    fn from(err: SemanticError) -> Error {
        Error::Semantic(err)
    }
}

impl From<EmitError> for Error {
    fn from(err: EmitError) -> Error {
        Error::Emit(err)
    }
}

impl From<ExecutableError> for Error {
    fn from(err: ExecutableError) -> Error {
        Error::Link(err)
    }
}

/// Compiles EXP source text into a runnable executable.
pub fn compile(source: &str, optimize_tac: bool) -> Result<Executable, Error> {
    let program = parse(source)?;
    let symbols = analyze(&program)?;
    let mut tac = lower(&program);
    if optimize_tac {
        tac = optimize(tac);
    }
    let instructions = emit(&tac, &symbols)?;
    Ok(Executable::new(instructions)?)
}
