//! Tree-walking evaluator for bound programs.
//!
//! Runs both structured trees (as the binder builds them) and goto form (as
//! the lowerer leaves them). Every statement reports how control leaves it
//! through [`Flow`]: a jump travels outwards until a statement list holding
//! the target label resumes right after it.

use crate::error::EvalError;
use crate::ops;
use log::debug;
use quill_bound::builtins;
use quill_bound::{
    BinaryOperator, BoundBlockStatement, BoundExpression, BoundLabel, BoundProgram, BoundStatement,
    FunctionSymbol, TypeSymbol, Value, VariableSymbol,
};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::rc::Rc;

/// Global variable storage. Owned by the caller so values survive across
/// REPL submissions.
pub type Globals = FxHashMap<Rc<VariableSymbol>, Value>;

type Frame = FxHashMap<Rc<VariableSymbol>, Value>;

/// Calls nested deeper than this fail with [`EvalError::StackOverflow`].
pub const MAX_CALL_DEPTH: usize = 512;

/// Remaining native stack below which evaluation continues on a new segment.
const STACK_RED_ZONE: usize = 128 * 1024;
const STACK_SEGMENT: usize = 2 * 1024 * 1024;

/// Run `f`, first moving to a fresh heap-allocated stack segment when the
/// current one is nearly used up. Recursion depth then depends only on
/// [`MAX_CALL_DEPTH`] and not on the stack size of the caller's thread.
fn with_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, f)
}

// ============================================================================
// Host
// ============================================================================

/// The outside world as seen by a running program.
pub trait Host {
    fn print(&mut self, text: &str);

    fn input(&mut self) -> Result<String, EvalError>;

    /// Call a function the program was bound against as a reference.
    fn call_external(&mut self, function: &FunctionSymbol, arguments: &[Value]) -> Result<Value, EvalError> {
        let _ = arguments;
        Err(EvalError::UnknownFunction(function.name.clone()))
    }
}

/// Prints to stdout and reads lines from stdin.
#[derive(Debug, Default)]
pub struct StdHost;

impl Host for StdHost {
    fn print(&mut self, text: &str) {
        println!("{}", text);
    }

    fn input(&mut self) -> Result<String, EvalError> {
        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .map_err(|e| EvalError::Input(e.to_string()))?;
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Collects printed lines and answers `input()` from a queue.
#[derive(Debug, Default)]
pub struct BufferedHost {
    pub output: Vec<String>,
    pub input: VecDeque<String>,
}

impl BufferedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            output: Vec::new(),
            input: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl Host for BufferedHost {
    fn print(&mut self, text: &str) {
        self.output.push(text.to_string());
    }

    fn input(&mut self) -> Result<String, EvalError> {
        Ok(self.input.pop_front().unwrap_or_default())
    }
}

// ============================================================================
// Evaluator
// ============================================================================

/// How control left a statement.
#[derive(Debug, Clone, PartialEq)]
enum Flow {
    Normal,
    Jump(BoundLabel),
    Return(Value),
}

pub struct Evaluator<'a> {
    program: &'a BoundProgram,
    globals: &'a mut Globals,
    host: &'a mut dyn Host,
    frames: Vec<Frame>,
    /// Value left by the latest `should_pop == false` expression statement.
    pending: Option<Value>,
    unlowered: bool,
}

impl<'a> Evaluator<'a> {
    pub fn new(program: &'a BoundProgram, globals: &'a mut Globals, host: &'a mut dyn Host) -> Self {
        Self {
            program,
            globals,
            host,
            frames: Vec::new(),
            pending: None,
            unlowered: false,
        }
    }

    /// Run function bodies as bound, before lowering, where the program kept them.
    pub fn unlowered(mut self) -> Self {
        self.unlowered = true;
        self
    }

    /// Run the program's entry point and return its result.
    pub fn run(&mut self) -> Result<Value, EvalError> {
        let program = self.program;
        if !program.is_valid {
            return Err(EvalError::InvalidProgram);
        }
        let entry = program.entry_point().ok_or(EvalError::NoEntryPoint)?;
        debug!("evaluating '{}' from '{}'", program.module_name, entry.name);
        self.call(entry, Vec::new())
    }

    /// Call `function` with already evaluated arguments.
    pub fn call(&mut self, function: &FunctionSymbol, arguments: Vec<Value>) -> Result<Value, EvalError> {
        if let Some(body) = self.body_of(function) {
            if self.frames.len() >= MAX_CALL_DEPTH {
                return Err(EvalError::StackOverflow(MAX_CALL_DEPTH));
            }
            let mut frame = Frame::default();
            for (parameter, argument) in function.parameters.iter().zip(arguments) {
                frame.insert(parameter.clone(), argument);
            }
            self.frames.push(frame);
            let flow = self.execute_list(&body.statements);
            self.frames.pop();

            return match flow? {
                Flow::Normal => Ok(Value::Unit),
                Flow::Return(value) => Ok(value),
                Flow::Jump(label) => Err(EvalError::DanglingJump(label.to_string())),
            };
        }

        if builtins::is_builtin(function) {
            return match function.name.as_str() {
                builtins::PRINT => {
                    let text = arguments.first().map(Value::to_string).unwrap_or_default();
                    self.host.print(&text);
                    Ok(Value::Unit)
                }
                _ => self.host.input().map(Value::Str),
            };
        }

        let is_reference = self
            .program
            .chain()
            .any(|program| program.references.iter().any(|r| **r == *function));
        if is_reference {
            return self.host.call_external(function, &arguments);
        }

        Err(EvalError::MissingBody(function.name.clone()))
    }

    fn body_of(&self, function: &FunctionSymbol) -> Option<&'a BoundBlockStatement> {
        let program = self.program;
        if self.unlowered {
            program
                .unlowered_body(function)
                .or_else(|| program.function_body(function))
        } else {
            program.function_body(function)
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn execute_list(&mut self, statements: &[BoundStatement]) -> Result<Flow, EvalError> {
        let mut labels: Option<FxHashMap<BoundLabel, usize>> = None;
        let mut index = 0;

        while index < statements.len() {
            match self.execute(&statements[index])? {
                Flow::Normal => index += 1,
                Flow::Jump(label) => {
                    let labels = labels.get_or_insert_with(|| label_positions(statements));
                    match labels.get(&label) {
                        Some(&position) => index = position + 1,
                        None => return Ok(Flow::Jump(label)),
                    }
                }
                flow @ Flow::Return(_) => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn execute(&mut self, statement: &BoundStatement) -> Result<Flow, EvalError> {
        with_stack(|| self.execute_node(statement))
    }

    fn execute_node(&mut self, statement: &BoundStatement) -> Result<Flow, EvalError> {
        match statement {
            BoundStatement::Block(n) => self.execute_list(&n.statements),
            BoundStatement::Expression(n) => {
                let value = self.evaluate(&n.expression)?;
                if !n.should_pop {
                    self.pending = Some(value);
                }
                Ok(Flow::Normal)
            }
            BoundStatement::VariableDeclaration(n) => {
                let value = self.evaluate(&n.initializer)?;
                self.assign(&n.variable, value);
                Ok(Flow::Normal)
            }
            BoundStatement::If(n) => {
                if self.evaluate_condition(&n.condition)? {
                    self.execute(&n.then_statement)
                } else if let Some(ref else_statement) = n.else_statement {
                    self.execute(else_statement)
                } else {
                    Ok(Flow::Normal)
                }
            }
            BoundStatement::While(n) => loop {
                if !self.evaluate_condition(&n.condition)? {
                    return Ok(Flow::Normal);
                }
                let flow = self.execute(&n.body)?;
                if let Some(exit) = leave_loop(flow, n.break_label, n.continue_label) {
                    return Ok(exit);
                }
            },
            BoundStatement::DoWhile(n) => loop {
                let flow = self.execute(&n.body)?;
                if let Some(exit) = leave_loop(flow, n.break_label, n.continue_label) {
                    return Ok(exit);
                }
                if !self.evaluate_condition(&n.condition)? {
                    return Ok(Flow::Normal);
                }
            },
            BoundStatement::For(n) => {
                let flow = self.execute(&n.declaration)?;
                if flow != Flow::Normal {
                    return Ok(flow);
                }
                loop {
                    if !self.evaluate_condition(&n.condition)? {
                        return Ok(Flow::Normal);
                    }
                    let flow = self.execute(&n.body)?;
                    if let Some(exit) = leave_loop(flow, n.break_label, n.continue_label) {
                        return Ok(exit);
                    }
                    self.evaluate(&n.increment)?;
                }
            }
            BoundStatement::Goto(label) => Ok(Flow::Jump(*label)),
            BoundStatement::ConditionalGoto(n) => {
                let condition = self.evaluate_condition(&n.condition)?;
                if condition != n.jump_if_false {
                    Ok(Flow::Jump(n.label))
                } else {
                    Ok(Flow::Normal)
                }
            }
            BoundStatement::Label(_) | BoundStatement::Nop => Ok(Flow::Normal),
            BoundStatement::Return(n) => {
                let value = match n.expression {
                    Some(ref expression) => self.evaluate(expression)?,
                    None => Value::Unit,
                };
                Ok(Flow::Return(value))
            }
            BoundStatement::Invalid => Err(EvalError::InvalidProgram),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn evaluate(&mut self, expression: &BoundExpression) -> Result<Value, EvalError> {
        with_stack(|| self.evaluate_node(expression))
    }

    fn evaluate_node(&mut self, expression: &BoundExpression) -> Result<Value, EvalError> {
        match expression {
            BoundExpression::Literal(n) => Ok(n.value.clone()),
            BoundExpression::Variable(n) => self.read(&n.variable),
            BoundExpression::Unary(n) => {
                let operand = self.evaluate(&n.operand)?;
                ops::apply_unary(n.op, &operand)
            }
            BoundExpression::Binary(n) => match n.op {
                BinaryOperator::LogicalAnd => {
                    let result = self.evaluate_condition(&n.left)? && self.evaluate_condition(&n.right)?;
                    Ok(Value::Bool(result))
                }
                BinaryOperator::LogicalOr => {
                    let result = self.evaluate_condition(&n.left)? || self.evaluate_condition(&n.right)?;
                    Ok(Value::Bool(result))
                }
                op => {
                    let left = self.evaluate(&n.left)?;
                    let right = self.evaluate(&n.right)?;
                    ops::apply_binary(op, &left, &right)
                }
            },
            BoundExpression::Call(n) => {
                let arguments = n
                    .arguments
                    .iter()
                    .map(|argument| self.evaluate(argument))
                    .collect::<Result<Vec<_>, _>>()?;
                self.call(&n.function, arguments)
            }
            BoundExpression::Conversion(n) => {
                let value = self.evaluate(&n.expression)?;
                ops::convert(&value, &n.ty)
            }
            BoundExpression::Assignment(n) => {
                let value = self.evaluate(&n.expression)?;
                self.assign(&n.variable, value.clone());
                Ok(value)
            }
            BoundExpression::ArrayCreation(n) => {
                let size = self.evaluate(&n.size)?;
                let size = size.as_int().ok_or_else(|| EvalError::InvalidConversion {
                    value: size.to_string(),
                    ty: TypeSymbol::Int.to_string(),
                })?;
                let element = n.ty.element_type().cloned().unwrap_or(TypeSymbol::Object);
                ops::new_array(&element, size)
            }
            BoundExpression::Ternary(n) => {
                if self.evaluate_condition(&n.condition)? {
                    self.evaluate(&n.when_true)
                } else {
                    self.evaluate(&n.when_false)
                }
            }
            BoundExpression::StatementExpression(n) => {
                let saved = self.pending.take();
                let flow = self.execute_list(&n.statements);
                let value = std::mem::replace(&mut self.pending, saved);
                match flow? {
                    Flow::Normal => Ok(value.unwrap_or(Value::Unit)),
                    Flow::Jump(label) => Err(EvalError::DanglingJump(label.to_string())),
                    Flow::Return(_) => Err(EvalError::InvalidProgram),
                }
            }
            BoundExpression::Invalid => Err(EvalError::InvalidProgram),
        }
    }

    fn evaluate_condition(&mut self, expression: &BoundExpression) -> Result<bool, EvalError> {
        match self.evaluate(expression)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::InvalidConversion {
                value: other.to_string(),
                ty: TypeSymbol::Bool.to_string(),
            }),
        }
    }

    fn read(&self, variable: &Rc<VariableSymbol>) -> Result<Value, EvalError> {
        if let Some(ref constant) = variable.constant {
            return Ok(constant.clone());
        }
        let slot = if variable.is_global() {
            self.globals.get(variable)
        } else {
            self.frames.last().and_then(|frame| frame.get(variable))
        };
        slot.cloned()
            .ok_or_else(|| EvalError::UnassignedVariable(variable.name.clone()))
    }

    fn assign(&mut self, variable: &Rc<VariableSymbol>, value: Value) {
        if variable.is_global() {
            self.globals.insert(variable.clone(), value);
        } else if let Some(frame) = self.frames.last_mut() {
            frame.insert(variable.clone(), value);
        }
    }
}

/// `Some(flow)` when the loop must stop and hand `flow` outwards.
fn leave_loop(flow: Flow, break_label: BoundLabel, continue_label: BoundLabel) -> Option<Flow> {
    match flow {
        Flow::Normal => None,
        Flow::Jump(label) if label == continue_label => None,
        Flow::Jump(label) if label == break_label => Some(Flow::Normal),
        other => Some(other),
    }
}

fn label_positions(statements: &[BoundStatement]) -> FxHashMap<BoundLabel, usize> {
    statements
        .iter()
        .enumerate()
        .filter_map(|(i, statement)| match statement {
            BoundStatement::Label(label) => Some((*label, i)),
            _ => None,
        })
        .collect()
}

/// Run `program` from its entry point.
pub fn evaluate(program: &BoundProgram, globals: &mut Globals, host: &mut dyn Host) -> Result<Value, EvalError> {
    Evaluator::new(program, globals, host).run()
}
