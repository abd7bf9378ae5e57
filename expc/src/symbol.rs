use crate::analyzer::SemanticError;
use expvm::{Type, Value};
use indexmap::IndexMap;
use std::fmt;

/// Declared function parameter. The built-in `print` leaves its parameter
/// untyped so any value can be printed.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Option<Type>,
}

impl Param {
    pub fn typed(name: &str, ty: Type) -> Param {
        Param {
            name: name.to_owned(),
            ty: Some(ty),
        }
    }

    pub fn untyped(name: &str) -> Param {
        Param {
            name: name.to_owned(),
            ty: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SymbolKind {
    Var {
        ty: Type,
    },
    /// A registered literal, coalesced by value within its scope.
    Literal {
        ty: Type,
        value: Value,
    },
    Func {
        params: Vec<Param>,
        return_type: Type,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub scope: String,
    pub kind: SymbolKind,
}

impl Symbol {
    /// The symbol's value type; `None` for functions.
    pub fn ty(&self) -> Option<&Type> {
        match &self.kind {
            SymbolKind::Var { ty } | SymbolKind::Literal { ty, .. } => Some(ty),
            SymbolKind::Func { .. } => None,
        }
    }

    pub fn literal_value(&self) -> Option<&Value> {
        match &self.kind {
            SymbolKind::Literal { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            SymbolKind::Var { ty } => write!(f, "{}:{} ({})", self.name, ty, self.scope),
            SymbolKind::Literal { ty, value } => {
                write!(f, "{}:{} ({}) = {}", self.name, ty, self.scope, value)
            }
            SymbolKind::Func {
                params,
                return_type,
            } => {
                write!(f, "{}(", self.name)?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match &param.ty {
                        Some(ty) => write!(f, "{}:{}", param.name, ty)?,
                        None => write!(f, "{}:any", param.name)?,
                    }
                }
                write!(f, ") -> {} [{}]", return_type, self.scope)
            }
        }
    }
}

/// One lexical scope.
///
/// Tables form a tree rooted at the global scope, with a child per namespace
/// and per function. Parent-walking lookup is performed by the analyzer's
/// scope stack; the finished tree is kept for the bytecode emitter, which
/// resolves array declarations and registered literals by name.
#[derive(Clone, Debug, PartialEq)]
pub struct SymbolTable {
    pub scope_name: String,
    symbols: IndexMap<String, Symbol>,
    children: Vec<SymbolTable>,
    literal_count: usize,
}

impl SymbolTable {
    pub fn new(scope_name: &str) -> SymbolTable {
        SymbolTable {
            scope_name: scope_name.to_owned(),
            symbols: IndexMap::new(),
            children: Vec::new(),
            literal_count: 0,
        }
    }

    pub fn insert(&mut self, name: &str, kind: SymbolKind) -> Result<(), SemanticError> {
        if self.symbols.contains_key(name) {
            return Err(SemanticError::Duplicate {
                name: name.to_owned(),
                scope: self.scope_name.clone(),
            });
        }
        self.symbols.insert(
            name.to_owned(),
            Symbol {
                name: name.to_owned(),
                scope: self.scope_name.clone(),
                kind,
            },
        );
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn symbols(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.values()
    }

    pub fn add_child(&mut self, child: SymbolTable) {
        self.children.push(child);
    }

    pub fn children(&self) -> impl Iterator<Item = &SymbolTable> {
        self.children.iter()
    }

    pub fn child(&self, scope_name: &str) -> Option<&SymbolTable> {
        self.children
            .iter()
            .find(|child| child.scope_name == scope_name)
    }

    /// Looks `name` up in this scope and then depth-first in all child
    /// scopes. Used by the emitter, which sees flat variable names.
    pub fn deep_get(&self, name: &str) -> Option<&Symbol> {
        if let Some(symbol) = self.get(name) {
            return Some(symbol);
        }
        self.children
            .iter()
            .find_map(|child| child.deep_get(name))
    }

    /// Registers a literal value, coalescing by value: registering the same
    /// value twice yields the same name.
    pub fn register_literal(&mut self, ty: Type, value: Value) -> String {
        if let Some(existing) = self
            .symbols
            .values()
            .find(|symbol| symbol.literal_value() == Some(&value))
        {
            return existing.name.clone();
        }

        let name = format!("literal_{}", self.literal_count);
        self.literal_count += 1;
        self.insert(&name, SymbolKind::Literal { ty, value })
            .unwrap();
        name
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        writeln!(f, "{}Scope '{}':", indent, self.scope_name)?;
        for symbol in self.symbols.values() {
            writeln!(f, "{}  {}", indent, symbol)?;
        }
        for child in &self.children {
            child.fmt_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}
