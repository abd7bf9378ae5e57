use expvm::{ArithOp, Operand, Relation, Type};
use std::fmt;

/// Three-address code operators.
///
/// Every non-branch instruction has at most two source operands and one
/// destination. Jump operators keep the target label in `result`, matching
/// the printed form the optimizer uses for its fixed point.
#[derive(Clone, Debug, PartialEq)]
pub enum TacOp {
    /// `alloc size -> name`: declare storage.
    Alloc,
    /// `= src -> dst`: copy.
    Copy,
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    /// `cast_T src -> dst`: coerce to `T`.
    Cast(Type),
    /// `load array index -> dst`: read `array[index]`.
    Load,
    /// `store src index -> array`: write `array[index]`.
    Store,
    Label,
    Goto,
    /// `ifz cond -> label`: jump when the condition is zero or false.
    IfZ,
    /// `param -> name`: bind an incoming argument.
    Param,
    /// `arg value`: push an outgoing argument.
    Arg,
    /// `call fname argc -> dst`.
    Call,
    /// `ret value`.
    Ret,
    Print,
    Halt,
}

impl TacOp {
    /// The host arithmetic operator, for the constant folder.
    pub fn arith(&self) -> Option<ArithOp> {
        match self {
            TacOp::Add => Some(ArithOp::Add),
            TacOp::Sub => Some(ArithOp::Sub),
            TacOp::Mul => Some(ArithOp::Mul),
            TacOp::Div => Some(ArithOp::Div),
            _ => None,
        }
    }

    pub fn relation(&self) -> Option<Relation> {
        match self {
            TacOp::Eq => Some(Relation::Eq),
            TacOp::Ne => Some(Relation::Ne),
            TacOp::Lt => Some(Relation::Lt),
            TacOp::Le => Some(Relation::Le),
            TacOp::Gt => Some(Relation::Gt),
            TacOp::Ge => Some(Relation::Ge),
            _ => None,
        }
    }
}

impl fmt::Display for TacOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TacOp::Alloc => f.write_str("alloc"),
            TacOp::Copy => f.write_str("="),
            TacOp::Add => f.write_str("+"),
            TacOp::Sub => f.write_str("-"),
            TacOp::Mul => f.write_str("*"),
            TacOp::Div => f.write_str("/"),
            TacOp::Eq => f.write_str("=="),
            TacOp::Ne => f.write_str("!="),
            TacOp::Lt => f.write_str("<"),
            TacOp::Le => f.write_str("<="),
            TacOp::Gt => f.write_str(">"),
            TacOp::Ge => f.write_str(">="),
            TacOp::And => f.write_str("&&"),
            TacOp::Or => f.write_str("||"),
            TacOp::Cast(target) => write!(f, "cast_{}", target),
            TacOp::Load => f.write_str("load"),
            TacOp::Store => f.write_str("store"),
            TacOp::Label => f.write_str("label"),
            TacOp::Goto => f.write_str("goto"),
            TacOp::IfZ => f.write_str("ifz"),
            TacOp::Param => f.write_str("param"),
            TacOp::Arg => f.write_str("arg"),
            TacOp::Call => f.write_str("call"),
            TacOp::Ret => f.write_str("ret"),
            TacOp::Print => f.write_str("PRINT"),
            TacOp::Halt => f.write_str("HALT"),
        }
    }
}

/// One three-address instruction.
#[derive(Clone, Debug, PartialEq)]
pub struct Tac {
    pub op: TacOp,
    pub arg1: Option<Operand>,
    pub arg2: Option<Operand>,
    pub result: Option<String>,
}

impl Tac {
    pub fn new(
        op: TacOp,
        arg1: Option<Operand>,
        arg2: Option<Operand>,
        result: Option<String>,
    ) -> Tac {
        Tac {
            op,
            arg1,
            arg2,
            result,
        }
    }

    /// The name the instruction writes, if any. For `store` this is the
    /// array being written into.
    pub fn dest(&self) -> Option<&str> {
        match self.op {
            TacOp::Alloc
            | TacOp::Store
            | TacOp::Copy
            | TacOp::Add
            | TacOp::Sub
            | TacOp::Mul
            | TacOp::Div
            | TacOp::Eq
            | TacOp::Ne
            | TacOp::Lt
            | TacOp::Le
            | TacOp::Gt
            | TacOp::Ge
            | TacOp::And
            | TacOp::Or
            | TacOp::Cast(_)
            | TacOp::Load
            | TacOp::Call
            | TacOp::Param => self.result.as_deref(),
            _ => None,
        }
    }
}

/// The canonical printed form; the optimizer's fixed point compares these.
impl fmt::Display for Tac {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let result = self.result.as_deref().unwrap_or("_");
        match (&self.arg1, &self.arg2) {
            (Some(arg1), Some(arg2)) => {
                write!(f, "{} -> {} {} {}", result, arg1, self.op, arg2)
            }
            (Some(arg1), None) => write!(f, "{} -> {} {}", result, self.op, arg1),
            _ => write!(f, "{} {}", self.op, result),
        }
    }
}
