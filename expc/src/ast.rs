use expvm::{Type, Value};

/// Binary operators of the source language.
///
/// The parser also produces these for the unary forms: `-x` is desugared to
/// `0 - x` and `!x` to `x == false`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinOp {
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
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div)
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Literal value; its static type follows from the value's kind.
    Literal(Value),
    Var(String),
    /// `namespace.name`
    Qualified { namespace: String, name: String },
    Index {
        array: String,
        index: Box<Expr>,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Cast {
        target: Type,
        expr: Box<Expr>,
    },
    Call {
        name: String,
        args: Vec<Expr>,
    },
}

/// Assignment target: a plain variable or one array element.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    Var(String),
    Index { array: String, index: Expr },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    Decl {
        name: String,
        ty: Type,
    },
    AutoDecl {
        name: String,
        expr: Expr,
    },
    ArrayDecl {
        name: String,
        elem: Type,
        size: Expr,
    },
    Assign {
        target: Target,
        expr: Expr,
    },
    If {
        cond: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    Block(Block),
    Function(FunctionDecl),
    Return(Expr),
    Print(Vec<Expr>),
    Halt,
    Expr(Expr),
}

#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<(String, Type)>,
    pub return_type: Type,
    pub body: Block,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Namespace {
    pub name: String,
    pub decls: Vec<Stmt>,
}

/// A whole compilation unit: one or more namespaces.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub namespaces: Vec<Namespace>,
}
