//! Lowering from the AST to three-address code.
//!
//! Expression visitors return an [`Operand`](../../expvm/instruction/enum.Operand.html):
//! literals become inline constants, variable references become names, and
//! compound expressions evaluate into fresh temporaries `t0, t1, …`.
//! Function bodies are lowered after all top-level code so that the emitted
//! list is main code followed by a contiguous run of function bodies; every
//! body ends with a `ret` (a `ret 0` is appended when the source falls off
//! the end of a function).

use crate::ast::*;
use crate::tac::{Tac, TacOp};
use expvm::{Operand, Value};
use std::collections::VecDeque;

pub fn lower(program: &Program) -> Vec<Tac> {
    let mut generator = Generator::default();
    generator.program(program);
    generator.instructions
}

#[derive(Default)]
struct Generator {
    instructions: Vec<Tac>,
    pending_functions: VecDeque<FunctionDecl>,
    next_temp: usize,
}

impl Generator {
    fn temp(&mut self) -> String {
        let name = format!("t{}", self.next_temp);
        self.next_temp += 1;
        name
    }

    /// Labels reuse the temporary counter with an `L` prefix.
    fn label(&mut self) -> String {
        format!("L{}", self.temp())
    }

    fn push(
        &mut self,
        op: TacOp,
        arg1: Option<Operand>,
        arg2: Option<Operand>,
        result: Option<String>,
    ) {
        self.instructions.push(Tac::new(op, arg1, arg2, result));
    }

    fn program(&mut self, program: &Program) {
        for namespace in &program.namespaces {
            for stmt in &namespace.decls {
                self.stmt(stmt);
            }
        }

        // Function bodies go after all top-level code; bodies may declare
        // further functions, which queue behind them.
        while let Some(function) = self.pending_functions.pop_front() {
            self.function(&function);
        }
    }

    fn function(&mut self, function: &FunctionDecl) {
        self.push(TacOp::Label, None, None, Some(function.name.clone()));
        for (name, _) in &function.params {
            self.push(TacOp::Param, None, None, Some(name.clone()));
        }
        self.block(&function.body);

        // A body that falls off its end still returns.
        if !matches!(self.instructions.last(), Some(tac) if tac.op == TacOp::Ret) {
            self.push(
                TacOp::Ret,
                Some(Operand::Const(Value::Int(0))),
                None,
                None,
            );
        }
    }

    fn block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl { name, .. } => {
                self.push(
                    TacOp::Alloc,
                    Some(Operand::Const(Value::Int(1))),
                    None,
                    Some(name.clone()),
                );
            }
            Stmt::AutoDecl { name, expr } => {
                self.push(
                    TacOp::Alloc,
                    Some(Operand::Const(Value::Int(1))),
                    None,
                    Some(name.clone()),
                );
                let value = self.expr(expr);
                self.push(TacOp::Copy, Some(value), None, Some(name.clone()));
            }
            Stmt::ArrayDecl { name, size, .. } => {
                let size = self.expr(size);
                self.push(TacOp::Alloc, Some(size), None, Some(name.clone()));
            }
            Stmt::Assign { target, expr } => {
                let value = self.expr(expr);
                match target {
                    Target::Var(name) => {
                        self.push(TacOp::Copy, Some(value), None, Some(name.clone()));
                    }
                    Target::Index { array, index } => {
                        let index = self.expr(index);
                        self.push(TacOp::Store, Some(value), Some(index), Some(array.clone()));
                    }
                }
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.expr(cond);
                let label_else = self.label();
                let label_end = self.label();

                self.push(TacOp::IfZ, Some(cond), None, Some(label_else.clone()));
                self.block(then_branch);
                self.push(TacOp::Goto, None, None, Some(label_end.clone()));
                self.push(TacOp::Label, None, None, Some(label_else));
                if let Some(else_branch) = else_branch {
                    self.block(else_branch);
                }
                self.push(TacOp::Label, None, None, Some(label_end));
            }
            Stmt::Block(block) => self.block(block),
            Stmt::Function(function) => self.pending_functions.push_back(function.clone()),
            Stmt::Return(expr) => {
                let value = self.expr(expr);
                self.push(TacOp::Ret, Some(value), None, None);
            }
            Stmt::Print(args) => {
                for arg in args {
                    self.arg(arg);
                }
                self.push(TacOp::Print, None, None, None);
            }
            Stmt::Halt => self.push(TacOp::Halt, None, None, None),
            Stmt::Expr(expr) => {
                self.expr(expr);
            }
        }
    }

    fn expr(&mut self, expr: &Expr) -> Operand {
        match expr {
            Expr::Literal(value) => Operand::Const(value.clone()),
            Expr::Var(name) => Operand::Name(name.clone()),
            // Static memory is one flat namespace, so a qualified reference
            // resolves to the bare variable name.
            Expr::Qualified { name, .. } => Operand::Name(name.clone()),
            Expr::Index { array, index } => {
                let index = self.expr(index);
                let temp = self.temp();
                self.push(
                    TacOp::Load,
                    Some(Operand::Name(array.clone())),
                    Some(index),
                    Some(temp.clone()),
                );
                Operand::Name(temp)
            }
            Expr::Binary { op, left, right } => {
                let left = self.expr(left);
                let right = self.expr(right);
                let temp = self.temp();
                self.push(binop_tac(*op), Some(left), Some(right), Some(temp.clone()));
                Operand::Name(temp)
            }
            Expr::Cast { target, expr } => {
                let value = self.expr(expr);
                let temp = self.temp();
                self.push(
                    TacOp::Cast(target.clone()),
                    Some(value),
                    None,
                    Some(temp.clone()),
                );
                Operand::Name(temp)
            }
            Expr::Call { name, args } => {
                for arg in args {
                    self.arg(arg);
                }
                let temp = self.temp();
                self.push(
                    TacOp::Call,
                    Some(Operand::Name(name.clone())),
                    Some(Operand::Const(Value::Int(args.len() as i64))),
                    Some(temp.clone()),
                );
                Operand::Name(temp)
            }
        }
    }

    /// Emits one outgoing argument. Literals and plain variable references
    /// pass through as operands; anything else evaluates into a temporary.
    fn arg(&mut self, arg: &Expr) {
        let operand = match arg {
            Expr::Literal(value) => Operand::Const(value.clone()),
            Expr::Var(name) => Operand::Name(name.clone()),
            other => self.expr(other),
        };
        self.push(TacOp::Arg, Some(operand), None, None);
    }
}

fn binop_tac(op: BinOp) -> TacOp {
    match op {
        BinOp::Add => TacOp::Add,
        BinOp::Sub => TacOp::Sub,
        BinOp::Mul => TacOp::Mul,
        BinOp::Div => TacOp::Div,
        BinOp::Eq => TacOp::Eq,
        BinOp::Ne => TacOp::Ne,
        BinOp::Lt => TacOp::Lt,
        BinOp::Le => TacOp::Le,
        BinOp::Gt => TacOp::Gt,
        BinOp::Ge => TacOp::Ge,
        BinOp::And => TacOp::And,
        BinOp::Or => TacOp::Or,
    }
}
