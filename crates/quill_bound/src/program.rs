//! The bound program aggregate.

use crate::symbol::{FunctionSymbol, VariableSymbol};
use crate::tree::BoundBlockStatement;
use indexmap::IndexMap;
use quill_diagnostics::DiagnosticCollection;
use std::rc::Rc;

/// Function bodies keyed by their symbol, in declaration order.
pub type FunctionBodies = IndexMap<Rc<FunctionSymbol>, BoundBlockStatement>;

/// The result of binding a set of compilation units. Immutable once built;
/// a later REPL submission refers back to it through `previous`.
#[derive(Debug)]
pub struct BoundProgram {
    pub previous: Option<Rc<BoundProgram>>,
    pub module_name: String,
    pub diagnostics: DiagnosticCollection,
    /// Variables declared by top-level statements of this submission.
    pub globals: Vec<Rc<VariableSymbol>>,
    /// `$global` in script mode.
    pub global_function: Option<Rc<FunctionSymbol>>,
    /// `main` in program mode, explicit or synthesized.
    pub main_function: Option<Rc<FunctionSymbol>>,
    /// Lowered bodies of every function declared in this submission.
    pub functions: FunctionBodies,
    /// Bodies as bound, before lowering. Only kept when requested.
    pub unlowered_functions: Option<FunctionBodies>,
    /// Host functions the program was bound against.
    pub references: Vec<Rc<FunctionSymbol>>,
    /// First variable ordinal free for the next submission.
    pub next_ordinal: u32,
    pub is_valid: bool,
}

impl BoundProgram {
    /// The function a run starts at.
    pub fn entry_point(&self) -> Option<&Rc<FunctionSymbol>> {
        self.global_function.as_ref().or(self.main_function.as_ref())
    }

    /// This program followed by every earlier submission, newest first.
    pub fn chain(&self) -> impl Iterator<Item = &BoundProgram> {
        std::iter::successors(Some(self), |program| program.previous.as_deref())
    }

    /// The lowered body of `function`, searching earlier submissions too.
    pub fn function_body(&self, function: &FunctionSymbol) -> Option<&BoundBlockStatement> {
        self.chain().find_map(|program| program.functions.get(function))
    }

    /// The body as bound before lowering, when the program kept it.
    pub fn unlowered_body(&self, function: &FunctionSymbol) -> Option<&BoundBlockStatement> {
        self.chain().find_map(|program| {
            program
                .unlowered_functions
                .as_ref()
                .and_then(|bodies| bodies.get(function))
        })
    }

    /// The newest declaration of a function called `name`.
    pub fn lookup_function(&self, name: &str) -> Option<&Rc<FunctionSymbol>> {
        self.chain()
            .find_map(|program| program.functions.keys().find(|f| f.name == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::BoundStatement;
    use crate::types::TypeSymbol;

    fn program(previous: Option<Rc<BoundProgram>>, functions: FunctionBodies) -> BoundProgram {
        BoundProgram {
            previous,
            module_name: "test".into(),
            diagnostics: DiagnosticCollection::new(),
            globals: Vec::new(),
            global_function: None,
            main_function: None,
            functions,
            unlowered_functions: None,
            references: Vec::new(),
            next_ordinal: 0,
            is_valid: true,
        }
    }

    #[test]
    fn test_lookup_walks_previous_submissions() {
        let old = Rc::new(FunctionSymbol::new("f", Vec::new(), TypeSymbol::Int, None));
        let mut first = FunctionBodies::new();
        first.insert(old.clone(), BoundBlockStatement::new(vec![BoundStatement::Nop]));

        let newer = Rc::new(FunctionSymbol::new("f", Vec::new(), TypeSymbol::String, None));
        let mut second = FunctionBodies::new();
        second.insert(newer.clone(), BoundBlockStatement::default());

        let current = program(Some(Rc::new(program(None, first))), second);
        assert_eq!(current.lookup_function("f"), Some(&newer));
        assert_eq!(current.function_body(&old).map(|b| b.statements.len()), Some(1));
        assert!(current.lookup_function("g").is_none());
        assert_eq!(current.chain().count(), 2);
    }
}
