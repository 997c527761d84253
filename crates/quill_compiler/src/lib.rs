//! quill_compiler: Compiler orchestration.
//!
//! Parses the source texts, binds and lowers them into a program, and runs
//! it. A compilation can be continued by a later submission that sees every
//! global and function declared before it.

mod error;

pub use error::CompileError;

use log::debug;
use quill_binder::ProgramBinder;
use quill_bound::printer::BoundTreePrinter;
use quill_bound::{BoundProgram, FunctionSymbol, Value};
use quill_core::arena::SyntaxArena;
use quill_diagnostics::DiagnosticCollection;
use quill_evaluator::{Evaluator, Globals, Host};
use quill_lowerer::ControlFlowGraph;
use quill_options::CompilerOptions;
use quill_parser::parse_text;
use std::rc::Rc;

/// A named piece of source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceText {
    pub file_name: String,
    pub text: String,
}

impl SourceText {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            text: text.into(),
        }
    }

    /// Read a source file from disk.
    pub fn load(path: &str) -> Result<Self, CompileError> {
        let text = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(Self::new(path, text))
    }
}

/// One bound submission and the diagnostics that produced it.
pub struct Compilation {
    options: CompilerOptions,
    references: Vec<Rc<FunctionSymbol>>,
    sources: Vec<SourceText>,
    program: Rc<BoundProgram>,
    diagnostics: DiagnosticCollection,
}

impl Compilation {
    pub fn new(sources: Vec<SourceText>, options: CompilerOptions) -> Self {
        Self::with_references(sources, options, Vec::new())
    }

    /// Compile with host functions that source code may call.
    pub fn with_references(
        sources: Vec<SourceText>,
        options: CompilerOptions,
        references: Vec<Rc<FunctionSymbol>>,
    ) -> Self {
        Self::build(None, sources, options, references)
    }

    /// Compile `sources` as the next submission after this one.
    pub fn continue_with(&self, sources: Vec<SourceText>) -> Self {
        Self::build(
            Some(self.program.clone()),
            sources,
            self.options.clone(),
            self.references.clone(),
        )
    }

    fn build(
        previous: Option<Rc<BoundProgram>>,
        sources: Vec<SourceText>,
        options: CompilerOptions,
        references: Vec<Rc<FunctionSymbol>>,
    ) -> Self {
        let arena = SyntaxArena::new();
        let mut diagnostics = DiagnosticCollection::new();
        let mut units = Vec::with_capacity(sources.len());
        for source in &sources {
            let (unit, parse_diagnostics) = parse_text(arena.bump(), &source.file_name, &source.text);
            diagnostics.extend(parse_diagnostics);
            units.push(unit);
        }

        let module_name = options.module_name_for(sources.first().map(|s| s.file_name.as_str()));
        let (program, is_valid) = ProgramBinder::new(module_name, options.is_script())
            .references(references.clone())
            .previous(previous)
            .keep_unlowered(options.show_tree())
            .bind(&units);

        diagnostics.extend_from_slice(program.diagnostics.diagnostics());
        if options.warnings_as_errors() {
            diagnostics.promote_warnings();
        }
        debug!(
            "compiled {} source(s) into '{}': {} diagnostic(s), valid = {}",
            sources.len(),
            program.module_name,
            diagnostics.len(),
            is_valid
        );

        Self {
            options,
            references,
            sources,
            program: Rc::new(program),
            diagnostics,
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn sources(&self) -> &[SourceText] {
        &self.sources
    }

    pub fn program(&self) -> &Rc<BoundProgram> {
        &self.program
    }

    /// Syntax and binding diagnostics, in that order.
    pub fn diagnostics(&self) -> &DiagnosticCollection {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors() || !self.program.is_valid
    }

    /// Run the entry point of this submission.
    pub fn evaluate(&self, globals: &mut Globals, host: &mut dyn Host) -> Result<Value, CompileError> {
        self.check()?;
        Ok(Evaluator::new(&self.program, globals, host).run()?)
    }

    /// Run the bodies as bound, before lowering, where they were kept.
    pub fn evaluate_unlowered(&self, globals: &mut Globals, host: &mut dyn Host) -> Result<Value, CompileError> {
        self.check()?;
        Ok(Evaluator::new(&self.program, globals, host).unlowered().run()?)
    }

    fn check(&self) -> Result<(), CompileError> {
        if self.has_errors() {
            return Err(CompileError::Failed(self.diagnostics.error_count().max(1)));
        }
        Ok(())
    }

    /// The bound bodies before lowering. Empty unless `showTree` is set.
    pub fn print_tree(&self) -> String {
        let mut printer = BoundTreePrinter::new();
        if let Some(functions) = &self.program.unlowered_functions {
            for (function, body) in functions {
                printer.print_function(function, body);
            }
        }
        printer.finish()
    }

    /// The lowered bodies of every function.
    pub fn print_program(&self) -> String {
        quill_bound::printer::print_program(&self.program)
    }

    /// The control-flow graph of `function` in Graphviz form.
    pub fn control_flow_graph(&self, function: &str) -> Option<String> {
        let symbol = self.program.functions.keys().find(|f| f.name == function)?;
        let body = self.program.function_body(symbol)?;
        Some(ControlFlowGraph::build(&body.statements).to_dot())
    }

    /// Graphs of every function, each preceded by a comment naming it.
    pub fn control_flow_graphs(&self) -> String {
        let mut out = String::new();
        for (function, body) in &self.program.functions {
            out.push_str("// ");
            out.push_str(&function.signature());
            out.push('\n');
            out.push_str(&ControlFlowGraph::build(&body.statements).to_dot());
        }
        out
    }
}
