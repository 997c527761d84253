//! The binder implementation.
//!
//! Walks the syntax trees of a submission and produces a typed, lowered
//! [`BoundProgram`]. Binding runs in two passes:
//! - Pass 1 declares every function signature into the root scope, so
//!   forward references and mutual recursion resolve
//! - Pass 2 binds the top-level statements, then each function body
//!   against the populated root scope
//!
//! Each body is lowered as soon as it is bound and checked for a return on
//! every path.

use crate::conversion::{classify, Conversion};
use crate::operators::{binary_operator, resolve_binary, resolve_unary, unary_operator};
use crate::reporter::BindReporter;
use crate::scope::Scope;
use log::debug;
use quill_bound::builtins;
use quill_bound::label::LabelGenerator;
use quill_bound::program::FunctionBodies;
use quill_bound::*;
use quill_core::text::TextSpan;
use quill_diagnostics::{messages, Diagnostic};
use quill_evaluator::fold;
use quill_lowerer::{all_paths_return, lower};
use quill_syntax::{
    ArrayCreationExpression, AssignmentExpression, BinaryExpression, BlockStatement, CallExpression,
    CompilationUnit, DoWhileStatement, Expression, ForStatement, FunctionDeclaration, Identifier,
    IfStatement, JumpStatement, LiteralValue, PostfixExpression, ReturnStatement, Statement,
    SyntaxKind, TernaryExpression, TypeClause, UnaryExpression, VariableDeclaration, WhileStatement,
};
use rustc_hash::FxHashSet;
use std::rc::Rc;

/// Name of the synthesized function holding a script's top-level statements.
pub const GLOBAL_FUNCTION_NAME: &str = "$global";
/// Name of the program entry point.
pub const MAIN_FUNCTION_NAME: &str = "main";

/// Bind a standalone set of compilation units.
pub fn bind_program(
    module_name: &str,
    references: &[Rc<FunctionSymbol>],
    is_script: bool,
    units: &[CompilationUnit<'_>],
) -> (BoundProgram, bool) {
    ProgramBinder::new(module_name, is_script)
        .references(references.to_vec())
        .bind(units)
}

/// Bind a submission on top of the chain ending at `previous`.
pub fn bind_submission(
    previous: Option<Rc<BoundProgram>>,
    module_name: &str,
    references: &[Rc<FunctionSymbol>],
    is_script: bool,
    units: &[CompilationUnit<'_>],
) -> (BoundProgram, bool) {
    ProgramBinder::new(module_name, is_script)
        .references(references.to_vec())
        .previous(previous)
        .bind(units)
}

/// Configures and runs the binding of one submission.
#[derive(Debug)]
pub struct ProgramBinder {
    module_name: String,
    is_script: bool,
    references: Vec<Rc<FunctionSymbol>>,
    previous: Option<Rc<BoundProgram>>,
    keep_unlowered: bool,
}

impl ProgramBinder {
    pub fn new(module_name: impl Into<String>, is_script: bool) -> Self {
        Self {
            module_name: module_name.into(),
            is_script,
            references: Vec::new(),
            previous: None,
            keep_unlowered: false,
        }
    }

    /// Host functions callable from source.
    pub fn references(mut self, references: Vec<Rc<FunctionSymbol>>) -> Self {
        self.references = references;
        self
    }

    pub fn previous(mut self, previous: Option<Rc<BoundProgram>>) -> Self {
        self.previous = previous;
        self
    }

    /// Also keep each body as bound, before lowering.
    pub fn keep_unlowered(mut self, keep: bool) -> Self {
        self.keep_unlowered = keep;
        self
    }

    pub fn bind(self, units: &[CompilationUnit<'_>]) -> (BoundProgram, bool) {
        let mut reporter = BindReporter::new();
        let first_ordinal = self.previous.as_ref().map_or(0, |p| p.next_ordinal);
        let mut binder = Binder::new(self.is_script, first_ordinal);
        binder.seed_history(self.previous.as_deref());
        binder.seed_root(&mut reporter, &self.references);

        let mut bodies = Bodies {
            functions: FunctionBodies::default(),
            unlowered: self.keep_unlowered.then(FunctionBodies::default),
        };

        // Pass 1: signatures.
        let mut declared = Vec::new();
        for unit in units {
            reporter.set_file(&unit.file_name);
            for declaration in unit.functions() {
                if let Some(function) = binder.declare_function(&mut reporter, declaration) {
                    declared.push((function, declaration, unit.file_name.as_str()));
                }
            }
        }
        debug!("declared {} function(s) in '{}'", declared.len(), self.module_name);

        // Pass 2: top-level statements, then bodies.
        let mut global_statements = Vec::new();
        for unit in units {
            reporter.set_file(&unit.file_name);
            for global in unit.global_statements() {
                global_statements.push(binder.bind_statement(&mut reporter, global.statement));
            }
        }

        for (function, declaration, file) in &declared {
            reporter.set_file(file);
            let outer = reporter.enter_statement();
            let body = binder.bind_function_body(&mut reporter, function, declaration);
            if !bodies.insert(function, body) {
                reporter.report(Diagnostic::at(
                    declaration.identifier.span(),
                    &messages::ALL_PATHS_MUST_RETURN,
                    &[],
                ));
            }
            reporter.exit_statement(outer);
        }

        let mut global_function = None;
        let mut main_function = None;
        if self.is_script {
            let function = Rc::new(FunctionSymbol::new(
                GLOBAL_FUNCTION_NAME,
                Vec::new(),
                TypeSymbol::Object,
                None,
            ));
            bodies.insert(&function, script_body(global_statements));
            global_function = Some(function);
        } else {
            let explicit_main = declared
                .iter()
                .find(|(function, _, _)| function.name == MAIN_FUNCTION_NAME);
            match explicit_main {
                Some((main, declaration, file)) => {
                    reporter.set_file(file);
                    let span = declaration.identifier.span();
                    let outer = reporter.enter_statement();
                    if !main.parameters.is_empty() || !main.return_type.is_void() {
                        reporter.report(Diagnostic::at(span, &messages::MAIN_MUST_HAVE_CORRECT_SIGNATURE, &[]));
                    }
                    reporter.exit_statement(outer);

                    let outer = reporter.enter_statement();
                    if !global_statements.is_empty() {
                        reporter.report(Diagnostic::at(
                            span,
                            &messages::CANNOT_MIX_MAIN_AND_GLOBAL_STATEMENTS,
                            &[],
                        ));
                    }
                    reporter.exit_statement(outer);
                    main_function = Some(main.clone());
                }
                None => {
                    let main = Rc::new(FunctionSymbol::new(MAIN_FUNCTION_NAME, Vec::new(), TypeSymbol::Void, None));
                    bodies.insert(&main, BoundBlockStatement::new(global_statements));
                    main_function = Some(main);
                }
            }
        }

        let (diagnostics, is_valid) = reporter.finish();
        debug!(
            "bound '{}': {} function(s), {} diagnostic(s), valid = {}",
            self.module_name,
            bodies.functions.len(),
            diagnostics.len(),
            is_valid
        );

        let program = BoundProgram {
            previous: self.previous,
            module_name: self.module_name,
            diagnostics,
            globals: binder.globals,
            global_function,
            main_function,
            functions: bodies.functions,
            unlowered_functions: bodies.unlowered,
            references: self.references,
            next_ordinal: binder.next_ordinal,
            is_valid,
        };
        (program, is_valid)
    }
}

/// Lowered bodies, plus the bound ones when requested.
struct Bodies {
    functions: FunctionBodies,
    unlowered: Option<FunctionBodies>,
}

impl Bodies {
    /// Lower and store `body`. Returns whether every path returns.
    fn insert(&mut self, function: &Rc<FunctionSymbol>, body: BoundBlockStatement) -> bool {
        if let Some(unlowered) = &mut self.unlowered {
            unlowered.insert(function.clone(), body.clone());
        }
        let lowered = lower(function, body);
        let returns = all_paths_return(function, &lowered.statements);
        self.functions.insert(function.clone(), lowered);
        returns
    }
}

/// A trailing expression statement with a value becomes the script's result.
fn script_body(mut statements: Vec<BoundStatement>) -> BoundBlockStatement {
    let yields_value = matches!(
        statements.last(),
        Some(BoundStatement::Expression(last))
            if !last.expression.ty().is_void() && !last.expression.is_invalid()
    );
    if yields_value {
        if let Some(BoundStatement::Expression(last)) = statements.pop() {
            let expression = convert(last.expression, &TypeSymbol::Object);
            statements.push(BoundStatement::Return(BoundReturnStatement {
                expression: Some(expression),
            }));
        }
    }
    BoundBlockStatement::new(statements)
}

/// Wrap `expression` in a conversion node, folding constants.
fn convert(expression: BoundExpression, ty: &TypeSymbol) -> BoundExpression {
    if &expression.ty() == ty {
        return expression;
    }
    let constant = fold::fold_conversion(ty, &expression);
    BoundExpression::Conversion(BoundConversionExpression {
        ty: ty.clone(),
        expression: Box::new(expression),
        constant,
    })
}

// ============================================================================
// Binder
// ============================================================================

/// Per-submission binding state. The function context is swapped in and
/// out as each body is bound; the root scope is shared by all of them.
struct Binder {
    scope: Scope,
    is_script: bool,
    /// The function whose body is being bound. `None` for top-level code.
    function: Option<Rc<FunctionSymbol>>,
    /// `(break, continue)` of each enclosing loop.
    loops: Vec<(BoundLabel, BoundLabel)>,
    labels: LabelGenerator,
    globals: Vec<Rc<VariableSymbol>>,
    next_ordinal: u32,
}

impl Binder {
    fn new(is_script: bool, next_ordinal: u32) -> Self {
        Self {
            scope: Scope::new(),
            is_script,
            function: None,
            loops: Vec::new(),
            labels: LabelGenerator::new(),
            globals: Vec::new(),
            next_ordinal,
        }
    }

    fn next_ordinal(&mut self) -> u32 {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal
    }

    // ========================================================================
    // Root scope
    // ========================================================================

    /// One frame per earlier submission, oldest at the bottom.
    fn seed_history(&mut self, previous: Option<&BoundProgram>) {
        let Some(previous) = previous else {
            return;
        };
        let mut chain: Vec<&BoundProgram> = previous.chain().collect();
        chain.reverse();
        for program in chain {
            for function in program.functions.keys() {
                let is_entry = program.global_function.as_ref() == Some(function)
                    || program.main_function.as_ref() == Some(function);
                if !is_entry {
                    self.scope.declare(Symbol::Function(function.clone()));
                }
            }
            for global in &program.globals {
                self.scope.declare(Symbol::Variable(global.clone()));
            }
            self.scope.push_root();
        }
    }

    fn seed_root(&mut self, reporter: &mut BindReporter, references: &[Rc<FunctionSymbol>]) {
        for builtin in builtins::all() {
            self.scope.declare_in_root(Symbol::Function(Rc::new(builtin)));
        }
        for reference in references {
            if !self.scope.declare_in_root(Symbol::Function(reference.clone())) {
                let outer = reporter.enter_statement();
                reporter.report(Diagnostic::new(&messages::FUNCTION_ALREADY_DECLARED, &[reference.name.as_str()]));
                reporter.exit_statement(outer);
            }
        }
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn declare_function(
        &mut self,
        reporter: &mut BindReporter,
        declaration: &FunctionDeclaration<'_>,
    ) -> Option<Rc<FunctionSymbol>> {
        let outer = reporter.enter_statement();
        if !declaration.data.is_valid() {
            reporter.invalidate();
        }

        let mut parameters: Vec<Rc<VariableSymbol>> = Vec::new();
        let mut seen = FxHashSet::default();
        for parameter in declaration.parameters {
            let name = parameter.identifier.text;
            let ty = self.bind_type_clause(reporter, &parameter.type_clause);
            if !seen.insert(name) {
                reporter.report(Diagnostic::at(
                    parameter.identifier.span(),
                    &messages::DUPLICATED_PARAMETERS,
                    &[name],
                ));
                continue;
            }
            let index = parameters.len();
            let ordinal = self.next_ordinal();
            parameters.push(Rc::new(VariableSymbol::new(
                name,
                VariableKind::Parameter { index },
                ty,
                ordinal,
            )));
        }

        let return_type = match &declaration.return_type {
            Some(clause) => self.bind_type_clause(reporter, clause),
            None => TypeSymbol::Void,
        };

        let identifier = &declaration.identifier;
        let function = Rc::new(FunctionSymbol::new(
            identifier.text,
            parameters,
            return_type,
            Some(identifier.span()),
        ));

        let declared = if identifier.is_missing() {
            false
        } else if self.scope.declare_in_root(Symbol::Function(function.clone())) {
            true
        } else {
            reporter.report(Diagnostic::at(
                identifier.span(),
                &messages::FUNCTION_ALREADY_DECLARED,
                &[identifier.text],
            ));
            false
        };
        reporter.exit_statement(outer);
        declared.then_some(function)
    }

    fn bind_function_body(
        &mut self,
        reporter: &mut BindReporter,
        function: &Rc<FunctionSymbol>,
        declaration: &FunctionDeclaration<'_>,
    ) -> BoundBlockStatement {
        self.function = Some(function.clone());
        self.loops.clear();

        self.scope.push();
        for parameter in &function.parameters {
            self.scope.declare(Symbol::Variable(parameter.clone()));
        }
        let body = self.bind_block(reporter, &declaration.body);
        self.scope.pop();

        self.function = None;
        body
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn bind_statement(&mut self, reporter: &mut BindReporter, statement: &Statement<'_>) -> BoundStatement {
        let outer = reporter.enter_statement();
        if !statement.is_valid() {
            reporter.invalidate();
        }
        let bound = match statement {
            Statement::Block(block) => BoundStatement::Block(self.bind_block(reporter, block)),
            Statement::VariableDeclaration(declaration) => self.bind_variable_declaration(reporter, declaration),
            Statement::If(node) => self.bind_if(reporter, node),
            Statement::While(node) => self.bind_while(reporter, node),
            Statement::DoWhile(node) => self.bind_do_while(reporter, node),
            Statement::For(node) => self.bind_for(reporter, node),
            Statement::Break(node) => self.bind_jump(reporter, node, true),
            Statement::Continue(node) => self.bind_jump(reporter, node, false),
            Statement::Return(node) => self.bind_return(reporter, node),
            Statement::Expression(node) => {
                BoundStatement::expression(self.bind_expression(reporter, node.expression, true))
            }
        };
        reporter.exit_statement(outer);
        bound
    }

    fn bind_block(&mut self, reporter: &mut BindReporter, block: &BlockStatement<'_>) -> BoundBlockStatement {
        if !block.data.is_valid() {
            reporter.invalidate();
        }
        self.scope.push();
        let statements = block
            .statements
            .iter()
            .map(|statement| self.bind_statement(reporter, statement))
            .collect();
        self.scope.pop();
        BoundBlockStatement::new(statements)
    }

    fn bind_variable_declaration(
        &mut self,
        reporter: &mut BindReporter,
        declaration: &VariableDeclaration<'_>,
    ) -> BoundStatement {
        let declared_type = declaration
            .type_clause
            .as_ref()
            .map(|clause| self.bind_type_clause(reporter, clause));
        let initializer = self.bind_expression(reporter, declaration.initializer, false);
        let initializer = match &declared_type {
            Some(ty) => self.bind_conversion(reporter, declaration.initializer.span(), initializer, ty, false),
            None => initializer,
        };

        let ty = declared_type.unwrap_or_else(|| initializer.ty());
        let constant = if declaration.is_readonly() {
            initializer.constant().cloned()
        } else {
            None
        };
        let variable = self.declare_variable(
            reporter,
            &declaration.identifier,
            ty,
            declaration.is_readonly(),
            constant,
        );
        BoundStatement::VariableDeclaration(BoundVariableDeclaration { variable, initializer })
    }

    fn declare_variable(
        &mut self,
        reporter: &mut BindReporter,
        identifier: &Identifier<'_>,
        ty: TypeSymbol,
        is_readonly: bool,
        constant: Option<Value>,
    ) -> Rc<VariableSymbol> {
        let kind = if self.function.is_some() {
            VariableKind::Local
        } else {
            VariableKind::Global
        };
        let ordinal = self.next_ordinal();
        let mut symbol = VariableSymbol::new(identifier.text, kind, ty, ordinal);
        if is_readonly {
            symbol = symbol.readonly(constant);
        }
        let variable = Rc::new(symbol);

        if !identifier.is_missing() && !self.scope.declare(Symbol::Variable(variable.clone())) {
            reporter.report(Diagnostic::at(
                identifier.span(),
                &messages::VARIABLE_ALREADY_DECLARED,
                &[identifier.text],
            ));
        }
        if kind == VariableKind::Global {
            self.globals.push(variable.clone());
        }
        variable
    }

    fn bind_if(&mut self, reporter: &mut BindReporter, node: &IfStatement<'_>) -> BoundStatement {
        let condition = self.bind_condition(reporter, node.condition);
        let then_statement = self.bind_statement(reporter, node.then_statement);
        let else_statement = node
            .else_statement
            .map(|statement| Box::new(self.bind_statement(reporter, statement)));
        BoundStatement::If(BoundIfStatement {
            condition,
            then_statement: Box::new(then_statement),
            else_statement,
        })
    }

    fn bind_while(&mut self, reporter: &mut BindReporter, node: &WhileStatement<'_>) -> BoundStatement {
        let condition = self.bind_condition(reporter, node.condition);
        let (body, break_label, continue_label) = self.bind_loop_body(reporter, node.body);
        BoundStatement::While(BoundWhileStatement {
            condition,
            body: Box::new(body),
            break_label,
            continue_label,
        })
    }

    fn bind_do_while(&mut self, reporter: &mut BindReporter, node: &DoWhileStatement<'_>) -> BoundStatement {
        let (body, break_label, continue_label) = self.bind_loop_body(reporter, node.body);
        let condition = self.bind_condition(reporter, node.condition);
        BoundStatement::DoWhile(BoundDoWhileStatement {
            body: Box::new(body),
            condition,
            break_label,
            continue_label,
        })
    }

    fn bind_for(&mut self, reporter: &mut BindReporter, node: &ForStatement<'_>) -> BoundStatement {
        // The header declaration is visible to the condition, increment and
        // body only.
        self.scope.push();
        let declaration = self.bind_statement(reporter, node.initializer);
        let condition = self.bind_condition(reporter, node.condition);
        let increment = self.bind_expression(reporter, node.increment, true);
        let (body, break_label, continue_label) = self.bind_loop_body(reporter, node.body);
        self.scope.pop();

        BoundStatement::For(BoundForStatement {
            declaration: Box::new(declaration),
            condition,
            increment,
            body: Box::new(body),
            break_label,
            continue_label,
        })
    }

    fn bind_loop_body(
        &mut self,
        reporter: &mut BindReporter,
        body: &Statement<'_>,
    ) -> (BoundStatement, BoundLabel, BoundLabel) {
        let (break_label, continue_label) = self.labels.loop_labels();
        self.loops.push((break_label, continue_label));
        let body = self.bind_statement(reporter, body);
        self.loops.pop();
        (body, break_label, continue_label)
    }

    fn bind_jump(&mut self, reporter: &mut BindReporter, node: &JumpStatement, is_break: bool) -> BoundStatement {
        match self.loops.last() {
            Some(&(break_label, continue_label)) => {
                BoundStatement::Goto(if is_break { break_label } else { continue_label })
            }
            None => {
                let keyword = if is_break { "break" } else { "continue" };
                reporter.report(Diagnostic::at(
                    node.keyword.span(),
                    &messages::INVALID_BREAK_OR_CONTINUE,
                    &[keyword],
                ));
                BoundStatement::Goto(self.labels.sentinel())
            }
        }
    }

    fn bind_return(&mut self, reporter: &mut BindReporter, node: &ReturnStatement<'_>) -> BoundStatement {
        let expression = node
            .expression
            .map(|expression| (expression.span(), self.bind_expression(reporter, expression, true)));

        let Some(function) = self.function.clone() else {
            if !self.is_script {
                reporter.report(Diagnostic::at(node.keyword.span(), &messages::RETURN_ONLY_IN_FUNCTION, &[]));
                return BoundStatement::Invalid;
            }
            let expression = expression.map(|(span, bound)| {
                self.bind_conversion(reporter, span, bound, &TypeSymbol::Object, false)
            });
            return BoundStatement::Return(BoundReturnStatement { expression });
        };

        if function.return_type.is_void() {
            if let Some((span, _)) = expression {
                reporter.report(Diagnostic::at(span, &messages::INVALID_RETURN_EXPRESSION, &[function.name.as_str()]));
            }
            return BoundStatement::Return(BoundReturnStatement { expression: None });
        }

        match expression {
            Some((span, bound)) => {
                let expression = self.bind_conversion(reporter, span, bound, &function.return_type, false);
                BoundStatement::Return(BoundReturnStatement {
                    expression: Some(expression),
                })
            }
            None => {
                reporter.report(Diagnostic::at(
                    node.keyword.span(),
                    &messages::MISSING_RETURN_EXPRESSION,
                    &[function.return_type.to_string().as_str()],
                ));
                BoundStatement::Return(BoundReturnStatement { expression: None })
            }
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Bind `expression`. A void result is an error unless `can_be_void`.
    fn bind_expression(
        &mut self,
        reporter: &mut BindReporter,
        expression: &Expression<'_>,
        can_be_void: bool,
    ) -> BoundExpression {
        if !expression.is_valid() {
            reporter.invalidate();
        }
        let bound = match expression {
            Expression::Literal(node) => BoundExpression::literal(match node.value {
                LiteralValue::Int(value) => Value::Int(value),
                LiteralValue::Float(value) => Value::Float(value),
                LiteralValue::Bool(value) => Value::Bool(value),
                LiteralValue::String(value) => Value::Str(value.to_string()),
            }),
            Expression::Name(node) => match self.lookup_variable(reporter, &node.identifier) {
                Some(variable) => BoundExpression::variable(variable),
                None => BoundExpression::Invalid,
            },
            Expression::Parenthesized(node) => self.bind_expression(reporter, node.expression, false),
            Expression::Unary(node) => self.bind_unary(reporter, node),
            Expression::Binary(node) => self.bind_binary(reporter, node),
            Expression::Assignment(node) => self.bind_assignment(reporter, node),
            Expression::Postfix(node) => self.bind_postfix(reporter, node),
            Expression::Call(node) => self.bind_call(reporter, node),
            Expression::Ternary(node) => self.bind_ternary(reporter, node),
            Expression::ArrayCreation(node) => self.bind_array_creation(reporter, node),
        };

        if !can_be_void && bound.ty().is_void() {
            reporter.report(Diagnostic::at(expression.span(), &messages::CANNOT_BE_VOID, &[]));
            return BoundExpression::Invalid;
        }
        bound
    }

    fn bind_condition(&mut self, reporter: &mut BindReporter, expression: &Expression<'_>) -> BoundExpression {
        let bound = self.bind_expression(reporter, expression, false);
        self.bind_conversion(reporter, expression.span(), bound, &TypeSymbol::Bool, false)
    }

    fn lookup_variable(
        &mut self,
        reporter: &mut BindReporter,
        identifier: &Identifier<'_>,
    ) -> Option<Rc<VariableSymbol>> {
        if identifier.is_missing() {
            reporter.invalidate();
            return None;
        }
        match self.scope.lookup(identifier.text) {
            Some(Symbol::Variable(variable)) => Some(variable.clone()),
            Some(Symbol::Function(_)) => {
                reporter.report(Diagnostic::at(identifier.span(), &messages::NOT_A_VARIABLE, &[identifier.text]));
                None
            }
            None => {
                reporter.report(Diagnostic::at(
                    identifier.span(),
                    &messages::UNRESOLVED_IDENTIFIER,
                    &[identifier.text],
                ));
                None
            }
        }
    }

    fn bind_unary(&mut self, reporter: &mut BindReporter, node: &UnaryExpression<'_>) -> BoundExpression {
        let operand = self.bind_expression(reporter, node.operand, false);
        let operand_type = operand.ty();
        if operand_type.is_invalid() {
            return BoundExpression::Invalid;
        }
        let Some(op) = unary_operator(node.operator.kind()) else {
            reporter.invalidate();
            return BoundExpression::Invalid;
        };

        match resolve_unary(op, &operand_type) {
            Some(ty) => {
                let constant = fold::fold_unary(op, &operand);
                BoundExpression::Unary(BoundUnaryExpression {
                    op,
                    operand: Box::new(operand),
                    ty,
                    constant,
                })
            }
            None => {
                reporter.report(Diagnostic::at(
                    node.operator.span(),
                    &messages::UNSUPPORTED_UNARY_OPERATOR,
                    &[op.text(), operand_type.to_string().as_str()],
                ));
                BoundExpression::Invalid
            }
        }
    }

    fn bind_binary(&mut self, reporter: &mut BindReporter, node: &BinaryExpression<'_>) -> BoundExpression {
        let left = self.bind_expression(reporter, node.left, false);
        let right = self.bind_expression(reporter, node.right, false);
        self.bind_binary_operation(
            reporter,
            node.operator.kind(),
            node.operator.span(),
            node.data.span,
            left,
            right,
        )
    }

    /// Shared by binary expressions, compound assignment and `++`/`--`.
    fn bind_binary_operation(
        &mut self,
        reporter: &mut BindReporter,
        operator: SyntaxKind,
        operator_span: TextSpan,
        span: TextSpan,
        left: BoundExpression,
        right: BoundExpression,
    ) -> BoundExpression {
        let (left_type, right_type) = (left.ty(), right.ty());
        if left_type.is_invalid() || right_type.is_invalid() {
            return BoundExpression::Invalid;
        }
        let Some(op) = binary_operator(operator) else {
            reporter.invalidate();
            return BoundExpression::Invalid;
        };

        let Some(ty) = resolve_binary(op, &left_type, &right_type) else {
            reporter.report(Diagnostic::at(
                operator_span,
                &messages::UNSUPPORTED_BINARY_OPERATOR,
                &[op.text(), left_type.to_string().as_str(), right_type.to_string().as_str()],
            ));
            return BoundExpression::Invalid;
        };

        let integral = left_type == TypeSymbol::Int && right_type == TypeSymbol::Int;
        if matches!(op, BinaryOperator::Divide | BinaryOperator::Modulo)
            && integral
            && right.constant() == Some(&Value::Int(0))
        {
            reporter.warn(Diagnostic::at(span, &messages::DIVISION_BY_CONSTANT_ZERO, &[]));
        }

        let constant = fold::fold_binary(op, &left, &right);
        BoundExpression::Binary(BoundBinaryExpression {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
            constant,
        })
    }

    fn bind_assignment(&mut self, reporter: &mut BindReporter, node: &AssignmentExpression<'_>) -> BoundExpression {
        let value = self.bind_expression(reporter, node.value, false);
        let Some(variable) = self.lookup_variable(reporter, &node.identifier) else {
            return BoundExpression::Invalid;
        };

        // `x op= v` binds as `x = x op v`.
        let value = match node.operator.kind().compound_assignment_operator() {
            Some(operator) => self.bind_binary_operation(
                reporter,
                operator,
                node.operator.span(),
                node.data.span,
                BoundExpression::variable(variable.clone()),
                value,
            ),
            None => value,
        };
        self.bind_assignment_to(reporter, variable, &node.identifier, node.value.span(), value)
    }

    /// `x++` binds as `x = x + 1` and yields the new value.
    fn bind_postfix(&mut self, reporter: &mut BindReporter, node: &PostfixExpression<'_>) -> BoundExpression {
        let Some(variable) = self.lookup_variable(reporter, &node.identifier) else {
            return BoundExpression::Invalid;
        };
        let operator = if node.operator.kind() == SyntaxKind::PlusPlusToken {
            SyntaxKind::PlusToken
        } else {
            SyntaxKind::MinusToken
        };
        let value = self.bind_binary_operation(
            reporter,
            operator,
            node.operator.span(),
            node.data.span,
            BoundExpression::variable(variable.clone()),
            BoundExpression::literal(Value::Int(1)),
        );
        self.bind_assignment_to(reporter, variable, &node.identifier, node.data.span, value)
    }

    fn bind_assignment_to(
        &mut self,
        reporter: &mut BindReporter,
        variable: Rc<VariableSymbol>,
        identifier: &Identifier<'_>,
        value_span: TextSpan,
        value: BoundExpression,
    ) -> BoundExpression {
        if variable.is_readonly {
            reporter.report(Diagnostic::at(
                identifier.span(),
                &messages::CANNOT_ASSIGN_TO_READ_ONLY,
                &[variable.name.as_str()],
            ));
            return BoundExpression::Invalid;
        }
        let expression = self.bind_conversion(reporter, value_span, value, &variable.ty, false);
        if expression.is_invalid() {
            return BoundExpression::Invalid;
        }
        BoundExpression::Assignment(BoundAssignmentExpression {
            variable,
            expression: Box::new(expression),
        })
    }

    fn bind_call(&mut self, reporter: &mut BindReporter, node: &CallExpression<'_>) -> BoundExpression {
        let name = node.identifier.text;

        // `type(value)` is an explicit conversion.
        if let ([argument], Some(ty)) = (node.arguments, TypeSymbol::lookup(name)) {
            let bound = self.bind_expression(reporter, argument, false);
            return self.bind_conversion(reporter, argument.span(), bound, &ty, true);
        }

        let mut arguments: Vec<BoundExpression> = node
            .arguments
            .iter()
            .map(|argument| self.bind_expression(reporter, argument, false))
            .collect();

        if node.identifier.is_missing() {
            reporter.invalidate();
            return BoundExpression::Invalid;
        }
        let function = match self.scope.lookup(name) {
            Some(Symbol::Function(function)) => function.clone(),
            Some(Symbol::Variable(_)) => {
                reporter.report(Diagnostic::at(node.identifier.span(), &messages::NOT_A_FUNCTION, &[name]));
                return BoundExpression::Invalid;
            }
            None => {
                reporter.report(Diagnostic::at(node.identifier.span(), &messages::UNRESOLVED_IDENTIFIER, &[name]));
                return BoundExpression::Invalid;
            }
        };

        if arguments.len() != function.parameters.len() {
            reporter.report(Diagnostic::at(
                node.data.span,
                &messages::WRONG_AMOUNT_OF_ARGUMENTS,
                &[
                    name,
                    function.parameters.len().to_string().as_str(),
                    arguments.len().to_string().as_str(),
                ],
            ));
            return BoundExpression::Invalid;
        }

        for (index, (syntax, parameter)) in node.arguments.iter().zip(&function.parameters).enumerate() {
            let bound = std::mem::replace(&mut arguments[index], BoundExpression::Invalid);
            arguments[index] = self.bind_conversion(reporter, syntax.span(), bound, &parameter.ty, false);
        }
        BoundExpression::Call(BoundCallExpression { function, arguments })
    }

    fn bind_ternary(&mut self, reporter: &mut BindReporter, node: &TernaryExpression<'_>) -> BoundExpression {
        let condition = self.bind_condition(reporter, node.condition);
        let when_true = self.bind_expression(reporter, node.when_true, false);
        let when_false = self.bind_expression(reporter, node.when_false, false);

        let (true_type, false_type) = (when_true.ty(), when_false.ty());
        if condition.is_invalid() || true_type.is_invalid() || false_type.is_invalid() {
            return BoundExpression::Invalid;
        }

        // The branches unify on whichever type the other converts to implicitly.
        let (when_true, when_false, ty) = if true_type == false_type {
            (when_true, when_false, true_type)
        } else if classify(&false_type, &true_type) == Conversion::Implicit {
            (when_true, convert(when_false, &true_type), true_type)
        } else if classify(&true_type, &false_type) == Conversion::Implicit {
            (convert(when_true, &false_type), when_false, false_type)
        } else {
            reporter.report(Diagnostic::at(
                node.data.span,
                &messages::INCOMPATIBLE_TYPES,
                &[true_type.to_string().as_str(), false_type.to_string().as_str()],
            ));
            return BoundExpression::Invalid;
        };

        let constant = fold::fold_ternary(&condition, &when_true, &when_false);
        BoundExpression::Ternary(BoundTernaryExpression {
            condition: Box::new(condition),
            when_true: Box::new(when_true),
            when_false: Box::new(when_false),
            ty,
            constant,
        })
    }

    fn bind_array_creation(
        &mut self,
        reporter: &mut BindReporter,
        node: &ArrayCreationExpression<'_>,
    ) -> BoundExpression {
        let element = self.bind_type_clause(reporter, &node.element_type);
        if element.is_void() {
            reporter.report(Diagnostic::at(
                node.element_type.identifier.span(),
                &messages::TYPE_NOT_FOUND,
                &[node.element_type.identifier.text],
            ));
            return BoundExpression::Invalid;
        }

        let Some(size) = node.size else {
            reporter.report(Diagnostic::at(node.data.span, &messages::ARRAY_CREATION_MUST_HAVE_SIZE, &[]));
            return BoundExpression::Invalid;
        };
        let bound = self.bind_expression(reporter, size, false);
        let size_expression = self.bind_conversion(reporter, size.span(), bound, &TypeSymbol::Int, false);
        if element.is_invalid() || size_expression.is_invalid() {
            return BoundExpression::Invalid;
        }

        BoundExpression::ArrayCreation(BoundArrayCreationExpression {
            ty: TypeSymbol::array(element, node.rank),
            size: Box::new(size_expression),
        })
    }

    // ========================================================================
    // Types and conversions
    // ========================================================================

    fn bind_type_clause(&mut self, reporter: &mut BindReporter, clause: &TypeClause<'_>) -> TypeSymbol {
        let identifier = &clause.identifier;
        if identifier.is_missing() {
            reporter.invalidate();
            return TypeSymbol::Invalid;
        }
        let Some(mut ty) = TypeSymbol::lookup(identifier.text) else {
            reporter.report(Diagnostic::at(identifier.span(), &messages::TYPE_NOT_FOUND, &[identifier.text]));
            return TypeSymbol::Invalid;
        };
        // No arrays of void.
        if ty.is_void() && !clause.ranks.is_empty() {
            reporter.report(Diagnostic::at(identifier.span(), &messages::TYPE_NOT_FOUND, &[identifier.text]));
            return TypeSymbol::Invalid;
        }
        for &rank in clause.ranks {
            ty = TypeSymbol::array(ty, rank);
        }
        ty
    }

    /// Convert `expression` to `to`, reporting when the conversion does not
    /// exist or needs a cast that `allow_explicit` does not grant.
    fn bind_conversion(
        &mut self,
        reporter: &mut BindReporter,
        span: TextSpan,
        expression: BoundExpression,
        to: &TypeSymbol,
        allow_explicit: bool,
    ) -> BoundExpression {
        let from = expression.ty();
        match classify(&from, to) {
            Conversion::Identity => expression,
            Conversion::Implicit => convert(expression, to),
            Conversion::Explicit if allow_explicit => convert(expression, to),
            Conversion::Explicit => {
                reporter.report(Diagnostic::at(
                    span,
                    &messages::MISSING_EXPLICIT_CONVERSION,
                    &[from.to_string().as_str(), to.to_string().as_str()],
                ));
                BoundExpression::Invalid
            }
            Conversion::None => {
                let message = if allow_explicit {
                    &messages::CANNOT_CONVERT
                } else {
                    &messages::INCOMPATIBLE_TYPES
                };
                reporter.report(Diagnostic::at(span, message, &[from.to_string().as_str(), to.to_string().as_str()]));
                BoundExpression::Invalid
            }
        }
    }
}
