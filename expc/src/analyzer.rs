//! Semantic analysis: type checking and symbol table construction.
//!
//! The analyzer walks the AST with a stack of scopes (global, one per
//! namespace, one per function body) and returns the finished scope tree.
//! Every expression is typed; ill-typed programs are rejected with a
//! [`SemanticError`](enum.SemanticError.html) naming the offending construct.

use crate::ast::*;
use crate::symbol::{Param, SymbolKind, SymbolTable};
use expvm::{Type, Value};
use std::error::Error as StdError;
use std::fmt;

#[derive(Clone, Debug, PartialEq)]
pub enum SemanticError {
    Undeclared { name: String, scope: String },
    Duplicate { name: String, scope: String },
    UnknownNamespace { namespace: String },
    NotAVariable { name: String },
    NotAFunction { name: String },
    NotAnArray { name: String },
    AssignMismatch { name: String, expected: Type, found: Type },
    ElementMismatch { array: String, expected: Type, found: Type },
    IndexNotInt { array: String, found: Type },
    ArraySizeNotInt { array: String, found: Type },
    ConditionNotBool { found: Type },
    OperandMismatch { op: BinOp, left: Type, right: Type },
    LogicalOperandNotBool { op: BinOp, left: Type, right: Type },
    WrongArity { name: String, expected: usize, found: usize },
    ArgumentMismatch { function: String, param: String, expected: Type, found: Type },
}

impl fmt::Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SemanticError::Undeclared { name, scope } => {
                write!(f, "identifier '{}' is not declared in scope '{}'", name, scope)
            }
            SemanticError::Duplicate { name, scope } => {
                write!(f, "identifier '{}' is already declared in scope '{}'", name, scope)
            }
            SemanticError::UnknownNamespace { namespace } => {
                write!(f, "namespace '{}' does not exist", namespace)
            }
            SemanticError::NotAVariable { name } => {
                write!(f, "'{}' is not a variable", name)
            }
            SemanticError::NotAFunction { name } => {
                write!(f, "'{}' is not a function", name)
            }
            SemanticError::NotAnArray { name } => write!(f, "'{}' is not an array", name),
            SemanticError::AssignMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "variable '{}' has type '{}' but the expression has type '{}'",
                name, expected, found
            ),
            SemanticError::ElementMismatch {
                array,
                expected,
                found,
            } => write!(
                f,
                "elements of '{}' have type '{}' but the expression has type '{}'",
                array, expected, found
            ),
            SemanticError::IndexNotInt { array, found } => write!(
                f,
                "index into '{}' must have type 'int', found '{}'",
                array, found
            ),
            SemanticError::ArraySizeNotInt { array, found } => write!(
                f,
                "size of array '{}' must have type 'int', found '{}'",
                array, found
            ),
            SemanticError::ConditionNotBool { found } => write!(
                f,
                "if condition must have type 'bool', found '{}'",
                found
            ),
            SemanticError::OperandMismatch { op, left, right } => write!(
                f,
                "operator '{}' applied to incompatible types '{}' and '{}'",
                op.symbol(),
                left,
                right
            ),
            SemanticError::LogicalOperandNotBool { op, left, right } => write!(
                f,
                "operator '{}' requires boolean operands, found '{}' and '{}'",
                op.symbol(),
                left,
                right
            ),
            SemanticError::WrongArity {
                name,
                expected,
                found,
            } => write!(
                f,
                "function '{}' expects {} argument(s) but received {}",
                name, expected, found
            ),
            SemanticError::ArgumentMismatch {
                function,
                param,
                expected,
                found,
            } => write!(
                f,
                "argument '{}' of '{}' must have type '{}', found '{}'",
                param, function, expected, found
            ),
        }
    }
}

impl StdError for SemanticError {}

/// Type checks `program` and returns the global symbol table with its child
/// scopes attached.
pub fn analyze(program: &Program) -> Result<SymbolTable, SemanticError> {
    let mut analyzer = Analyzer::new();
    analyzer.program(program)?;
    Ok(analyzer.finish())
}

struct Analyzer {
    scopes: Vec<SymbolTable>,
}

impl Analyzer {
    fn new() -> Analyzer {
        let mut global = SymbolTable::new("global");
        global
            .insert(
                "print",
                SymbolKind::Func {
                    params: vec![Param::untyped("value")],
                    return_type: Type::Void,
                },
            )
            .unwrap();
        global
            .insert(
                "halt",
                SymbolKind::Func {
                    params: Vec::new(),
                    return_type: Type::Void,
                },
            )
            .unwrap();

        Analyzer {
            scopes: vec![global],
        }
    }

    fn finish(mut self) -> SymbolTable {
        debug_assert!(self.scopes.len() == 1);
        self.scopes.pop().unwrap()
    }

    fn enter(&mut self, scope_name: &str) {
        self.scopes.push(SymbolTable::new(scope_name));
    }

    fn exit(&mut self) {
        let child = self.scopes.pop().unwrap();
        self.current().add_child(child);
    }

    fn current(&mut self) -> &mut SymbolTable {
        self.scopes.last_mut().unwrap()
    }

    /// Parent-walking lookup through the scope stack.
    fn lookup(&self, name: &str) -> Result<&crate::symbol::Symbol, SemanticError> {
        for scope in self.scopes.iter().rev() {
            if let Some(symbol) = scope.get(name) {
                return Ok(symbol);
            }
        }
        Err(SemanticError::Undeclared {
            name: name.to_owned(),
            scope: self.scopes.last().unwrap().scope_name.clone(),
        })
    }

    fn variable_type(&self, name: &str) -> Result<Type, SemanticError> {
        match self.lookup(name)?.ty() {
            Some(ty) => Ok(ty.clone()),
            None => Err(SemanticError::NotAVariable {
                name: name.to_owned(),
            }),
        }
    }

    fn element_type(&self, array: &str) -> Result<Type, SemanticError> {
        match self.variable_type(array)? {
            Type::Array(elem) => Ok(*elem),
            _ => Err(SemanticError::NotAnArray {
                name: array.to_owned(),
            }),
        }
    }

    fn program(&mut self, program: &Program) -> Result<(), SemanticError> {
        for namespace in &program.namespaces {
            self.enter(&namespace.name);
            let result = self.stmts(&namespace.decls);
            self.exit();
            result?;
        }
        Ok(())
    }

    fn stmts(&mut self, stmts: &[Stmt]) -> Result<(), SemanticError> {
        for stmt in stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<(), SemanticError> {
        match stmt {
            Stmt::Decl { name, ty } => {
                self.current().insert(name, SymbolKind::Var { ty: ty.clone() })
            }
            Stmt::AutoDecl { name, expr } => {
                let ty = self.type_of(expr)?;
                self.current().insert(name, SymbolKind::Var { ty })
            }
            Stmt::ArrayDecl { name, elem, size } => {
                let size_type = self.type_of(size)?;
                if size_type != Type::Int {
                    return Err(SemanticError::ArraySizeNotInt {
                        array: name.clone(),
                        found: size_type,
                    });
                }
                self.current().insert(
                    name,
                    SymbolKind::Var {
                        ty: Type::Array(Box::new(elem.clone())),
                    },
                )
            }
            Stmt::Assign { target, expr } => self.assign(target, expr),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_type = self.type_of(cond)?;
                if cond_type != Type::Bool {
                    return Err(SemanticError::ConditionNotBool { found: cond_type });
                }
                self.stmts(&then_branch.stmts)?;
                if let Some(else_branch) = else_branch {
                    self.stmts(&else_branch.stmts)?;
                }
                Ok(())
            }
            Stmt::Block(block) => self.stmts(&block.stmts),
            Stmt::Function(function) => self.function(function),
            Stmt::Return(expr) => self.type_of(expr).map(|_| ()),
            Stmt::Print(args) => {
                if args.len() != 1 {
                    return Err(SemanticError::WrongArity {
                        name: "print".to_owned(),
                        expected: 1,
                        found: args.len(),
                    });
                }
                // Any value prints.
                self.type_of(&args[0]).map(|_| ())
            }
            Stmt::Halt => Ok(()),
            Stmt::Expr(expr) => self.type_of(expr).map(|_| ()),
        }
    }

    fn assign(&mut self, target: &Target, expr: &Expr) -> Result<(), SemanticError> {
        match target {
            Target::Var(name) => {
                let expected = self.variable_type(name)?;
                let found = self.type_of(expr)?;
                if expected != found {
                    return Err(SemanticError::AssignMismatch {
                        name: name.clone(),
                        expected,
                        found,
                    });
                }
                Ok(())
            }
            Target::Index { array, index } => {
                let expected = self.element_type(array)?;
                let index_type = self.type_of(index)?;
                if index_type != Type::Int {
                    return Err(SemanticError::IndexNotInt {
                        array: array.clone(),
                        found: index_type,
                    });
                }
                let found = self.type_of(expr)?;
                if expected != found {
                    return Err(SemanticError::ElementMismatch {
                        array: array.clone(),
                        expected,
                        found,
                    });
                }
                Ok(())
            }
        }
    }

    fn function(&mut self, function: &FunctionDecl) -> Result<(), SemanticError> {
        let params = function
            .params
            .iter()
            .map(|(name, ty)| Param::typed(name, ty.clone()))
            .collect();
        self.current().insert(
            &function.name,
            SymbolKind::Func {
                params,
                return_type: function.return_type.clone(),
            },
        )?;

        self.enter(&function.name);
        let result = (|| {
            for (name, ty) in &function.params {
                self.current()
                    .insert(name, SymbolKind::Var { ty: ty.clone() })?;
            }
            self.stmts(&function.body.stmts)
        })();
        self.exit();
        result
    }

    fn type_of(&mut self, expr: &Expr) -> Result<Type, SemanticError> {
        match expr {
            Expr::Literal(value) => {
                // Arrays and refs have no literal syntax.
                let ty = value.literal_type().unwrap();
                self.scopes[0].register_literal(ty.clone(), value.clone());
                Ok(ty)
            }
            Expr::Var(name) => self.variable_type(name),
            Expr::Qualified { namespace, name } => self.qualified(namespace, name),
            Expr::Index { array, index } => {
                let elem = self.element_type(array)?;
                let index_type = self.type_of(index)?;
                if index_type != Type::Int {
                    return Err(SemanticError::IndexNotInt {
                        array: array.clone(),
                        found: index_type,
                    });
                }
                Ok(elem)
            }
            Expr::Binary { op, left, right } => {
                let left = self.type_of(left)?;
                let right = self.type_of(right)?;
                if op.is_arithmetic() {
                    if left != right {
                        return Err(SemanticError::OperandMismatch {
                            op: *op,
                            left,
                            right,
                        });
                    }
                    Ok(left)
                } else if op.is_comparison() {
                    Ok(Type::Bool)
                } else {
                    if left != Type::Bool || right != Type::Bool {
                        return Err(SemanticError::LogicalOperandNotBool {
                            op: *op,
                            left,
                            right,
                        });
                    }
                    Ok(Type::Bool)
                }
            }
            Expr::Cast { target, expr } => {
                self.type_of(expr)?;
                Ok(target.clone())
            }
            Expr::Call { name, args } => self.call(name, args),
        }
    }

    fn qualified(&mut self, namespace: &str, name: &str) -> Result<Type, SemanticError> {
        // Namespaces are children of the global scope; a namespace can only
        // refer to one that was analyzed before it.
        let symbol = self.scopes[0]
            .child(namespace)
            .ok_or_else(|| SemanticError::UnknownNamespace {
                namespace: namespace.to_owned(),
            })?
            .get(name)
            .ok_or_else(|| SemanticError::Undeclared {
                name: name.to_owned(),
                scope: namespace.to_owned(),
            })?;
        match symbol.ty() {
            Some(ty) => Ok(ty.clone()),
            None => Err(SemanticError::NotAVariable {
                name: name.to_owned(),
            }),
        }
    }

    fn call(&mut self, name: &str, args: &[Expr]) -> Result<Type, SemanticError> {
        let (params, return_type) = match &self.lookup(name)?.kind {
            SymbolKind::Func {
                params,
                return_type,
            } => (params.clone(), return_type.clone()),
            _ => {
                return Err(SemanticError::NotAFunction {
                    name: name.to_owned(),
                })
            }
        };

        if params.len() != args.len() {
            return Err(SemanticError::WrongArity {
                name: name.to_owned(),
                expected: params.len(),
                found: args.len(),
            });
        }

        for (arg, param) in args.iter().zip(&params) {
            let found = self.type_of(arg)?;
            if let Some(expected) = &param.ty {
                if found != *expected {
                    return Err(SemanticError::ArgumentMismatch {
                        function: name.to_owned(),
                        param: param.name.clone(),
                        expected: expected.clone(),
                        found,
                    });
                }
            }
        }

        Ok(return_type)
    }
}
