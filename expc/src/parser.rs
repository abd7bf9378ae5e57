//! Front-end: parses EXP source text into the AST.
//!
//! Parsing is implemented with [pest]; the grammar lives in `exp.pest`. The
//! grammar subsumes tokenization, so lexical and syntax errors are both
//! reported as location-annotated [`Error`](type.Error.html)s naming the
//! constructs the parser expected.
//!
//! [pest]: https://docs.rs/pest/

use crate::ast::*;
use expvm::{Type, Value};
use matches::debug_assert_matches;
use pest::iterators::Pair;
use pest::{Parser, Span};
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "exp.pest"]
pub struct ExpParser;

pub type Error = pest::error::Error<Rule>;

pub type Result<T> = std::result::Result<T, Error>;

pub fn parse(input: &str) -> Result<Program> {
    let pair = ExpParser::parse(Rule::program, input)?.next().unwrap();
    process_program(pair)
}

fn new_parser_error(span: Span, message: String) -> Error {
    Error::new_from_span(pest::error::ErrorVariant::CustomError { message }, span)
}

fn process_program(pair: Pair<Rule>) -> Result<Program> {
    debug_assert_matches!(pair.as_rule(), Rule::program);

    let mut namespaces = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::namespace {
            namespaces.push(process_namespace(inner)?);
        }
    }
    Ok(Program { namespaces })
}

fn process_namespace(pair: Pair<Rule>) -> Result<Namespace> {
    let mut pairs = pair.into_inner();
    let name = pairs.next().unwrap().as_str().to_owned();

    let mut decls = Vec::new();
    for statement in pairs {
        process_statement(statement, &mut decls)?;
    }
    Ok(Namespace { name, decls })
}

fn process_block(pair: Pair<Rule>) -> Result<Block> {
    debug_assert_matches!(pair.as_rule(), Rule::block);

    let mut stmts = Vec::new();
    for statement in pair.into_inner() {
        process_statement(statement, &mut stmts)?;
    }
    Ok(Block { stmts })
}

fn process_statement(pair: Pair<Rule>, out: &mut Vec<Stmt>) -> Result<()> {
    debug_assert_matches!(pair.as_rule(), Rule::statement);

    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::function_decl => out.push(Stmt::Function(process_function(inner)?)),
        Rule::array_decl => {
            let mut pairs = inner.into_inner();
            let elem = process_type(&pairs.next().unwrap());
            let name = pairs.next().unwrap().as_str().to_owned();
            let size = process_expr(pairs.next().unwrap())?;
            out.push(Stmt::ArrayDecl { name, elem, size });
        }
        Rule::var_decl => {
            let mut pairs = inner.into_inner();
            let ty = process_type(&pairs.next().unwrap());
            let name = pairs.next().unwrap().as_str().to_owned();
            out.push(Stmt::Decl {
                name: name.clone(),
                ty,
            });
            // `T x = e;` is a declaration followed by an assignment.
            if let Some(init) = pairs.next() {
                let expr = process_expr(init)?;
                out.push(Stmt::Assign {
                    target: Target::Var(name),
                    expr,
                });
            }
        }
        Rule::auto_decl => {
            let mut pairs = inner.into_inner();
            let name = pairs.next().unwrap().as_str().to_owned();
            let expr = process_expr(pairs.next().unwrap())?;
            out.push(Stmt::AutoDecl { name, expr });
        }
        Rule::if_stmt => {
            let mut pairs = inner.into_inner();
            let cond = process_expr(pairs.next().unwrap())?;
            let then_branch = process_block(pairs.next().unwrap())?;
            let else_branch = match pairs.next() {
                Some(clause) => Some(process_block(clause.into_inner().next().unwrap())?),
                None => None,
            };
            out.push(Stmt::If {
                cond,
                then_branch,
                else_branch,
            });
        }
        Rule::return_stmt => {
            let expr = process_expr(inner.into_inner().next().unwrap())?;
            out.push(Stmt::Return(expr));
        }
        Rule::print_stmt => {
            let args = match inner.into_inner().next() {
                Some(list) => process_args(list)?,
                None => Vec::new(),
            };
            out.push(Stmt::Print(args));
        }
        Rule::halt_stmt => {
            if let Some(args) = inner.into_inner().next() {
                return Err(new_parser_error(
                    args.as_span(),
                    "halt takes no arguments".to_owned(),
                ));
            }
            out.push(Stmt::Halt);
        }
        Rule::assign_stmt => {
            let mut pairs = inner.into_inner();
            let name = pairs.next().unwrap().as_str().to_owned();
            let next = pairs.next().unwrap();
            if next.as_rule() == Rule::index_suffix {
                let index = process_expr(next.into_inner().next().unwrap())?;
                let expr = process_expr(pairs.next().unwrap())?;
                out.push(Stmt::Assign {
                    target: Target::Index { array: name, index },
                    expr,
                });
            } else {
                let expr = process_expr(next)?;
                out.push(Stmt::Assign {
                    target: Target::Var(name),
                    expr,
                });
            }
        }
        Rule::block => out.push(Stmt::Block(process_block(inner)?)),
        Rule::expr_stmt => {
            let expr = process_expr(inner.into_inner().next().unwrap())?;
            out.push(Stmt::Expr(expr));
        }
        _ => unreachable!(),
    }
    Ok(())
}

fn process_function(pair: Pair<Rule>) -> Result<FunctionDecl> {
    let mut pairs = pair.into_inner();
    let return_type = process_type(&pairs.next().unwrap());
    let name = pairs.next().unwrap().as_str().to_owned();

    let mut params = Vec::new();
    let mut next = pairs.next().unwrap();
    if next.as_rule() == Rule::param_list {
        for param in next.into_inner() {
            let mut parts = param.into_inner();
            let ty = process_type(&parts.next().unwrap());
            let param_name = parts.next().unwrap().as_str().to_owned();
            params.push((param_name, ty));
        }
        next = pairs.next().unwrap();
    }

    let body = process_block(next)?;
    Ok(FunctionDecl {
        name,
        params,
        return_type,
        body,
    })
}

fn process_type(pair: &Pair<Rule>) -> Type {
    debug_assert_matches!(pair.as_rule(), Rule::type_name);
    // The grammar only matches the four scalar type names.
    pair.as_str().parse().unwrap()
}

fn process_args(pair: Pair<Rule>) -> Result<Vec<Expr>> {
    debug_assert_matches!(pair.as_rule(), Rule::arg_list);
    pair.into_inner().map(process_expr).collect()
}

fn process_expr(pair: Pair<Rule>) -> Result<Expr> {
    match pair.as_rule() {
        Rule::expr => process_expr(pair.into_inner().next().unwrap()),
        Rule::logical_or
        | Rule::logical_and
        | Rule::equality
        | Rule::relational
        | Rule::additive
        | Rule::multiplicative => process_binary(pair),
        Rule::unary => process_unary(pair),
        Rule::primary => process_primary(pair),
        _ => unreachable!(),
    }
}

fn process_binary(pair: Pair<Rule>) -> Result<Expr> {
    let mut pairs = pair.into_inner();
    let mut expr = process_expr(pairs.next().unwrap())?;
    while let Some(op) = pairs.next() {
        let right = process_expr(pairs.next().unwrap())?;
        expr = Expr::Binary {
            op: process_binop(&op),
            left: Box::new(expr),
            right: Box::new(right),
        };
    }
    Ok(expr)
}

fn process_binop(pair: &Pair<Rule>) -> BinOp {
    match pair.as_str() {
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "==" => BinOp::Eq,
        "!=" => BinOp::Ne,
        "<" => BinOp::Lt,
        "<=" => BinOp::Le,
        ">" => BinOp::Gt,
        ">=" => BinOp::Ge,
        "&&" => BinOp::And,
        "||" => BinOp::Or,
        _ => unreachable!(),
    }
}

fn process_unary(pair: Pair<Rule>) -> Result<Expr> {
    let mut ops = Vec::new();
    for inner in pair.into_inner() {
        if inner.as_rule() == Rule::un_op {
            ops.push(inner.as_str().to_owned());
            continue;
        }

        let mut expr = process_primary(inner)?;
        // Innermost operator binds first.
        for op in ops.iter().rev() {
            expr = match op.as_str() {
                "-" => Expr::Binary {
                    op: BinOp::Sub,
                    left: Box::new(Expr::Literal(Value::Int(0))),
                    right: Box::new(expr),
                },
                "!" => Expr::Binary {
                    op: BinOp::Eq,
                    left: Box::new(expr),
                    right: Box::new(Expr::Literal(Value::Bool(false))),
                },
                _ => unreachable!(),
            };
        }
        return Ok(expr);
    }
    unreachable!()
}

fn process_primary(pair: Pair<Rule>) -> Result<Expr> {
    let inner = pair.into_inner().next().unwrap();
    match inner.as_rule() {
        Rule::literal => process_literal(inner),
        Rule::call => {
            let mut pairs = inner.into_inner();
            let name = pairs.next().unwrap().as_str().to_owned();
            let args = match pairs.next() {
                Some(list) => process_args(list)?,
                None => Vec::new(),
            };
            Ok(Expr::Call { name, args })
        }
        Rule::qualified_ref => {
            let mut pairs = inner.into_inner();
            let namespace = pairs.next().unwrap().as_str().to_owned();
            let name = pairs.next().unwrap().as_str().to_owned();
            Ok(Expr::Qualified { namespace, name })
        }
        Rule::array_access => {
            let mut pairs = inner.into_inner();
            let array = pairs.next().unwrap().as_str().to_owned();
            let index = process_expr(pairs.next().unwrap())?;
            Ok(Expr::Index {
                array,
                index: Box::new(index),
            })
        }
        Rule::paren_expr => process_expr(inner.into_inner().next().unwrap()),
        Rule::var_ref => Ok(Expr::Var(inner.as_str().to_owned())),
        _ => unreachable!(),
    }
}

fn process_literal(pair: Pair<Rule>) -> Result<Expr> {
    let inner = pair.into_inner().next().unwrap();
    let span = inner.as_span();
    let value = match inner.as_rule() {
        Rule::float_literal => Value::Float(inner.as_str().parse().map_err(|_| {
            new_parser_error(span, "float literal is out of range".to_owned())
        })?),
        Rule::int_literal => Value::Int(inner.as_str().parse().map_err(|_| {
            new_parser_error(span, "integer literal is out of range".to_owned())
        })?),
        Rule::string_literal => {
            let quoted = inner.as_str();
            Value::Str(quoted[1..quoted.len() - 1].to_owned())
        }
        Rule::bool_literal => Value::Bool(inner.as_str() == "true"),
        _ => unreachable!(),
    };
    Ok(Expr::Literal(value))
}
