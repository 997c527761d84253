//! Symbols for variables and functions.
//!
//! Symbols are shared through `Rc` and compared structurally, so they work
//! as map keys without relying on pointer identity. The compile-time
//! constant of a variable and the declaration span of a function are
//! attached data, not identity.

use crate::types::TypeSymbol;
use crate::value::Value;
use quill_core::text::TextSpan;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Where a variable lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Declared by a top-level statement, even inside a nested top-level block.
    Global,
    Local,
    Parameter { index: usize },
}

#[derive(Debug, Clone)]
pub struct VariableSymbol {
    pub name: String,
    pub kind: VariableKind,
    pub ty: TypeSymbol,
    pub is_readonly: bool,
    /// Known value of a read-only variable with a constant initializer.
    pub constant: Option<Value>,
    /// Assigned by the binder in declaration order. Keeps a shadowing
    /// declaration distinct from the one it shadows.
    pub ordinal: u32,
}

impl VariableSymbol {
    pub fn new(name: impl Into<String>, kind: VariableKind, ty: TypeSymbol, ordinal: u32) -> Self {
        Self {
            name: name.into(),
            kind,
            ty,
            is_readonly: false,
            constant: None,
            ordinal,
        }
    }

    pub fn readonly(mut self, constant: Option<Value>) -> Self {
        self.is_readonly = true;
        self.constant = constant;
        self
    }

    pub fn is_global(&self) -> bool {
        self.kind == VariableKind::Global
    }
}

impl PartialEq for VariableSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.kind == other.kind
            && self.ty == other.ty
            && self.is_readonly == other.is_readonly
            && self.ordinal == other.ordinal
    }
}

impl Eq for VariableSymbol {}

impl Hash for VariableSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.kind.hash(state);
        self.ty.hash(state);
        self.is_readonly.hash(state);
        self.ordinal.hash(state);
    }
}

impl fmt::Display for VariableSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    pub name: String,
    pub parameters: Vec<Rc<VariableSymbol>>,
    pub return_type: TypeSymbol,
    /// Span of the declaring identifier. `None` for built-ins, host
    /// functions, and synthesized entry points.
    pub declaration: Option<TextSpan>,
}

impl FunctionSymbol {
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<Rc<VariableSymbol>>,
        return_type: TypeSymbol,
        declaration: Option<TextSpan>,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            return_type,
            declaration,
        }
    }

    /// A function with typed parameters `p0, p1, ...` and no source declaration.
    pub fn external(name: impl Into<String>, parameter_types: &[TypeSymbol], return_type: TypeSymbol) -> Self {
        let parameters = parameter_types
            .iter()
            .enumerate()
            .map(|(index, ty)| {
                Rc::new(VariableSymbol::new(
                    format!("p{}", index),
                    VariableKind::Parameter { index },
                    ty.clone(),
                    index as u32,
                ))
            })
            .collect();
        Self::new(name, parameters, return_type, None)
    }

    /// Signature text such as `add(a: int, b: int): int`.
    pub fn signature(&self) -> String {
        let parameters: Vec<String> = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect();
        format!("{}({}): {}", self.name, parameters.join(", "), self.return_type)
    }
}

impl PartialEq for FunctionSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.parameters == other.parameters
            && self.return_type == other.return_type
    }
}

impl Eq for FunctionSymbol {}

impl Hash for FunctionSymbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.parameters.hash(state);
        self.return_type.hash(state);
    }
}

impl fmt::Display for FunctionSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Anything a name can resolve to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    Variable(Rc<VariableSymbol>),
    Function(Rc<FunctionSymbol>),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Variable(v) => &v.name,
            Symbol::Function(f) => &f.name,
        }
    }
}
