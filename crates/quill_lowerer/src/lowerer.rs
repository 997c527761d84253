//! Lowering of structured bound trees into goto form.
//!
//! After lowering a function body is one flat statement list made of
//! expression statements, declarations, labels, gotos, and returns. Loops
//! and conditionals become conditional jumps, `&&`/`||` and `?:` become
//! statement expressions, and constants are folded into literals.

use crate::flow;
use crate::rewriter::BoundTreeRewriter;
use log::debug;
use quill_bound::label::LabelGenerator;
use quill_bound::*;
use quill_evaluator::fold;

/// Lower `body`, the bound body of `function`.
pub fn lower(function: &FunctionSymbol, body: BoundBlockStatement) -> BoundBlockStatement {
    let mut lowerer = Lowerer::new();
    let rewritten = lowerer.rewrite_block(body);

    let mut statements = flatten(rewritten);
    if function.return_type.is_void() && statements.last().map_or(true, BoundStatement::can_fall_through) {
        statements.push(BoundStatement::Return(BoundReturnStatement { expression: None }));
    }

    let before = statements.len();
    let statements = remove_dead_code(statements);
    debug!(
        "lowered '{}': {} statements, {} unreachable removed",
        function.name,
        statements.len(),
        before - statements.len()
    );
    BoundBlockStatement::new(statements)
}

pub struct Lowerer {
    labels: LabelGenerator,
}

impl Default for Lowerer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lowerer {
    pub fn new() -> Self {
        Self {
            labels: LabelGenerator::new(),
        }
    }

    fn convert(&self, expression: BoundExpression, ty: TypeSymbol) -> BoundExpression {
        if expression.ty() == ty {
            return expression;
        }
        match fold::fold_conversion(&ty, &expression) {
            Some(value) => BoundExpression::Literal(BoundLiteralExpression { value, ty }),
            None => BoundExpression::Conversion(BoundConversionExpression {
                ty,
                expression: Box::new(expression),
                constant: None,
            }),
        }
    }

    /// Insert the conversions that make both operands of `op` the type the
    /// operation actually runs on.
    fn coerce_operands(
        &self,
        op: BinaryOperator,
        left: BoundExpression,
        right: BoundExpression,
    ) -> (BoundExpression, BoundExpression) {
        let (left_type, right_type) = (left.ty(), right.ty());

        if matches!(op, BinaryOperator::Power | BinaryOperator::Root) {
            let left = if left_type == TypeSymbol::Int { self.convert(left, TypeSymbol::Float) } else { left };
            let right = if right_type == TypeSymbol::Int { self.convert(right, TypeSymbol::Float) } else { right };
            return (left, right);
        }

        match (&left_type, &right_type) {
            (TypeSymbol::Int, TypeSymbol::Float) => (self.convert(left, TypeSymbol::Float), right),
            (TypeSymbol::Float, TypeSymbol::Int) => (left, self.convert(right, TypeSymbol::Float)),
            (TypeSymbol::String, other) if op == BinaryOperator::Add && other.is_primitive() => {
                (left, self.convert(right, TypeSymbol::String))
            }
            (other, TypeSymbol::String) if op == BinaryOperator::Add && other.is_primitive() => {
                (self.convert(left, TypeSymbol::String), right)
            }
            _ => (left, right),
        }
    }
}

impl BoundTreeRewriter for Lowerer {
    // ========================================================================
    // Statements
    // ========================================================================

    fn rewrite_if(&mut self, node: BoundIfStatement) -> BoundStatement {
        let result = match node.else_statement {
            // gotoFalse <condition> end
            // <then>
            // end:
            None => {
                let end = self.labels.generated();
                BoundStatement::block(vec![
                    BoundStatement::conditional_goto(end, node.condition, true),
                    *node.then_statement,
                    BoundStatement::Label(end),
                ])
            }
            // gotoFalse <condition> else
            // <then>
            // goto end
            // else:
            // <else>
            // end:
            Some(else_statement) => {
                let else_label = self.labels.generated();
                let end = self.labels.generated();
                BoundStatement::block(vec![
                    BoundStatement::conditional_goto(else_label, node.condition, true),
                    *node.then_statement,
                    BoundStatement::Goto(end),
                    BoundStatement::Label(else_label),
                    *else_statement,
                    BoundStatement::Label(end),
                ])
            }
        };
        self.rewrite_statement(result)
    }

    fn rewrite_while(&mut self, node: BoundWhileStatement) -> BoundStatement {
        // goto continue
        // body:
        // <body>
        // continue:
        // gotoTrue <condition> body
        // break:
        let body = self.labels.generated();
        let result = BoundStatement::block(vec![
            BoundStatement::Goto(node.continue_label),
            BoundStatement::Label(body),
            *node.body,
            BoundStatement::Label(node.continue_label),
            BoundStatement::conditional_goto(body, node.condition, false),
            BoundStatement::Label(node.break_label),
        ]);
        self.rewrite_statement(result)
    }

    fn rewrite_do_while(&mut self, node: BoundDoWhileStatement) -> BoundStatement {
        // body:
        // <body>
        // continue:
        // gotoTrue <condition> body
        // break:
        let body = self.labels.generated();
        let result = BoundStatement::block(vec![
            BoundStatement::Label(body),
            *node.body,
            BoundStatement::Label(node.continue_label),
            BoundStatement::conditional_goto(body, node.condition, false),
            BoundStatement::Label(node.break_label),
        ]);
        self.rewrite_statement(result)
    }

    fn rewrite_for(&mut self, node: BoundForStatement) -> BoundStatement {
        // <declaration>
        // goto check
        // body:
        // <body>
        // continue:
        // <increment>
        // check:
        // gotoTrue <condition> body
        // break:
        let body = self.labels.generated();
        let check = self.labels.generated();
        let result = BoundStatement::block(vec![
            *node.declaration,
            BoundStatement::Goto(check),
            BoundStatement::Label(body),
            *node.body,
            BoundStatement::Label(node.continue_label),
            BoundStatement::expression(node.increment),
            BoundStatement::Label(check),
            BoundStatement::conditional_goto(body, node.condition, false),
            BoundStatement::Label(node.break_label),
        ]);
        self.rewrite_statement(result)
    }

    fn rewrite_conditional_goto(&mut self, node: BoundConditionalGotoStatement) -> BoundStatement {
        let condition = self.rewrite_expression(node.condition);
        match condition.constant() {
            Some(Value::Bool(value)) if *value != node.jump_if_false => BoundStatement::Goto(node.label),
            Some(Value::Bool(_)) => BoundStatement::Nop,
            _ => BoundStatement::ConditionalGoto(BoundConditionalGotoStatement {
                label: node.label,
                condition,
                jump_if_false: node.jump_if_false,
            }),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn rewrite_expression(&mut self, expression: BoundExpression) -> BoundExpression {
        if !matches!(expression, BoundExpression::Literal(_)) {
            if let Some(value) = expression.constant() {
                return BoundExpression::Literal(BoundLiteralExpression {
                    value: value.clone(),
                    ty: expression.ty(),
                });
            }
        }

        match expression {
            BoundExpression::Unary(n) => self.rewrite_unary(n),
            BoundExpression::Binary(n) => self.rewrite_binary(n),
            BoundExpression::Call(n) => self.rewrite_call(n),
            BoundExpression::Conversion(n) => self.rewrite_conversion(n),
            BoundExpression::Assignment(n) => self.rewrite_assignment(n),
            BoundExpression::ArrayCreation(n) => self.rewrite_array_creation(n),
            BoundExpression::Ternary(n) => self.rewrite_ternary(n),
            BoundExpression::StatementExpression(n) => self.rewrite_statement_expression(n),
            BoundExpression::Literal(_) | BoundExpression::Variable(_) | BoundExpression::Invalid => expression,
        }
    }

    fn rewrite_binary(&mut self, node: BoundBinaryExpression) -> BoundExpression {
        let false_literal = || Box::new(BoundExpression::literal(Value::Bool(false)));
        let true_literal = || Box::new(BoundExpression::literal(Value::Bool(true)));

        match node.op {
            // a && b  ==>  a ? b : false
            BinaryOperator::LogicalAnd => {
                return self.rewrite_ternary(BoundTernaryExpression {
                    condition: node.left,
                    when_true: node.right,
                    when_false: false_literal(),
                    ty: node.ty,
                    constant: node.constant,
                })
            }
            // a || b  ==>  a ? true : b
            BinaryOperator::LogicalOr => {
                return self.rewrite_ternary(BoundTernaryExpression {
                    condition: node.left,
                    when_true: true_literal(),
                    when_false: node.right,
                    ty: node.ty,
                    constant: node.constant,
                })
            }
            _ => {}
        }

        let left = self.rewrite_expression(*node.left);
        let right = self.rewrite_expression(*node.right);
        let (left, right) = self.coerce_operands(node.op, left, right);

        // a // b  ==>  a ** (1.0 / b)
        if node.op == BinaryOperator::Root {
            let exponent = BoundExpression::Binary(BoundBinaryExpression {
                op: BinaryOperator::Divide,
                left: Box::new(BoundExpression::literal(Value::Float(1.0))),
                right: Box::new(right),
                ty: TypeSymbol::Float,
                constant: None,
            });
            return BoundExpression::Binary(BoundBinaryExpression {
                op: BinaryOperator::Power,
                left: Box::new(left),
                right: Box::new(exponent),
                ty: node.ty,
                constant: None,
            });
        }

        BoundExpression::Binary(BoundBinaryExpression {
            op: node.op,
            left: Box::new(left),
            right: Box::new(right),
            ty: node.ty,
            constant: node.constant,
        })
    }

    fn rewrite_ternary(&mut self, node: BoundTernaryExpression) -> BoundExpression {
        let condition = self.rewrite_expression(*node.condition);
        match condition.constant() {
            Some(Value::Bool(true)) => return self.rewrite_expression(*node.when_true),
            Some(Value::Bool(false)) => return self.rewrite_expression(*node.when_false),
            _ => {}
        }

        // gotoFalse <condition> else
        // <when_true>
        // goto end
        // else:
        // <when_false>
        // end:
        let else_label = self.labels.generated();
        let end = self.labels.generated();
        let when_true = self.rewrite_expression(*node.when_true);
        let when_false = self.rewrite_expression(*node.when_false);
        let value = |expression| {
            BoundStatement::Expression(BoundExpressionStatement {
                expression,
                should_pop: false,
            })
        };

        BoundExpression::StatementExpression(BoundStatementExpression {
            statements: vec![
                BoundStatement::conditional_goto(else_label, condition, true),
                value(when_true),
                BoundStatement::Goto(end),
                BoundStatement::Label(else_label),
                value(when_false),
                BoundStatement::Label(end),
            ],
            ty: node.ty,
        })
    }
}

/// Flatten nested blocks depth-first into one list, dropping `Nop`s.
pub fn flatten(statement: BoundStatement) -> Vec<BoundStatement> {
    let mut result = Vec::new();
    let mut stack = vec![statement];
    while let Some(statement) = stack.pop() {
        match statement {
            BoundStatement::Block(block) => stack.extend(block.statements.into_iter().rev()),
            BoundStatement::Nop => {}
            other => result.push(other),
        }
    }
    result
}

/// Remove unreachable statements, including inside statement expressions.
pub fn remove_dead_code(statements: Vec<BoundStatement>) -> Vec<BoundStatement> {
    let mut statements = flow::remove_unreachable(statements);
    for statement in &mut statements {
        prune_statement(statement);
    }
    statements
}

fn prune_statement(statement: &mut BoundStatement) {
    match statement {
        BoundStatement::Block(n) => n.statements.iter_mut().for_each(prune_statement),
        BoundStatement::Expression(n) => prune_expression(&mut n.expression),
        BoundStatement::VariableDeclaration(n) => prune_expression(&mut n.initializer),
        BoundStatement::If(n) => {
            prune_expression(&mut n.condition);
            prune_statement(&mut n.then_statement);
            if let Some(ref mut else_statement) = n.else_statement {
                prune_statement(else_statement);
            }
        }
        BoundStatement::While(n) => {
            prune_expression(&mut n.condition);
            prune_statement(&mut n.body);
        }
        BoundStatement::DoWhile(n) => {
            prune_statement(&mut n.body);
            prune_expression(&mut n.condition);
        }
        BoundStatement::For(n) => {
            prune_statement(&mut n.declaration);
            prune_expression(&mut n.condition);
            prune_expression(&mut n.increment);
            prune_statement(&mut n.body);
        }
        BoundStatement::ConditionalGoto(n) => prune_expression(&mut n.condition),
        BoundStatement::Return(n) => {
            if let Some(ref mut expression) = n.expression {
                prune_expression(expression);
            }
        }
        BoundStatement::Goto(_) | BoundStatement::Label(_) | BoundStatement::Nop | BoundStatement::Invalid => {}
    }
}

fn prune_expression(expression: &mut BoundExpression) {
    match expression {
        BoundExpression::StatementExpression(n) => {
            n.statements = remove_dead_code(std::mem::take(&mut n.statements));
        }
        BoundExpression::Unary(n) => prune_expression(&mut n.operand),
        BoundExpression::Binary(n) => {
            prune_expression(&mut n.left);
            prune_expression(&mut n.right);
        }
        BoundExpression::Call(n) => n.arguments.iter_mut().for_each(prune_expression),
        BoundExpression::Conversion(n) => prune_expression(&mut n.expression),
        BoundExpression::Assignment(n) => prune_expression(&mut n.expression),
        BoundExpression::ArrayCreation(n) => prune_expression(&mut n.size),
        BoundExpression::Ternary(n) => {
            prune_expression(&mut n.condition);
            prune_expression(&mut n.when_true);
            prune_expression(&mut n.when_false);
        }
        BoundExpression::Literal(_) | BoundExpression::Variable(_) | BoundExpression::Invalid => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn function(return_type: TypeSymbol) -> FunctionSymbol {
        FunctionSymbol::new("f", Vec::new(), return_type, None)
    }

    fn parameter(name: &str, ty: TypeSymbol, index: usize) -> BoundExpression {
        let symbol = VariableSymbol::new(name, VariableKind::Parameter { index }, ty, index as u32);
        BoundExpression::variable(Rc::new(symbol))
    }

    fn binary(op: BinaryOperator, left: BoundExpression, right: BoundExpression, ty: TypeSymbol) -> BoundExpression {
        BoundExpression::Binary(BoundBinaryExpression {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty,
            constant: None,
        })
    }

    #[test]
    fn test_if_without_else() {
        let body = BoundBlockStatement::new(vec![BoundStatement::If(BoundIfStatement {
            condition: parameter("c", TypeSymbol::Bool, 0),
            then_statement: Box::new(BoundStatement::expression(parameter("x", TypeSymbol::Int, 1))),
            else_statement: None,
        })]);
        let lowered = lower(&function(TypeSymbol::Void), body);
        let text = quill_bound::printer::print_block(&lowered);
        assert_eq!(text, "{\n    goto Label1 unless c\n    x\nLabel1:\n    return\n}\n");
    }

    #[test]
    fn test_constant_condition_becomes_goto_or_nop() {
        let mut lowerer = Lowerer::new();
        let label = LabelGenerator::new().generated();
        let always = lowerer.rewrite_statement(BoundStatement::conditional_goto(
            label,
            BoundExpression::literal(Value::Bool(true)),
            false,
        ));
        assert_eq!(always, BoundStatement::Goto(label));

        let never = lowerer.rewrite_statement(BoundStatement::conditional_goto(
            label,
            BoundExpression::literal(Value::Bool(true)),
            true,
        ));
        assert_eq!(never, BoundStatement::Nop);
    }

    #[test]
    fn test_root_becomes_power_of_reciprocal() {
        let mut lowerer = Lowerer::new();
        let root = binary(
            BinaryOperator::Root,
            parameter("a", TypeSymbol::Int, 0),
            parameter("b", TypeSymbol::Int, 1),
            TypeSymbol::Float,
        );
        let lowered = lowerer.rewrite_expression(root);
        assert_eq!(
            quill_bound::printer::print_expression(&lowered),
            "float(a) ** (1.0 / float(b))"
        );
    }

    #[test]
    fn test_mixed_operands_are_coerced() {
        let mut lowerer = Lowerer::new();
        let sum = binary(
            BinaryOperator::Add,
            parameter("i", TypeSymbol::Int, 0),
            parameter("x", TypeSymbol::Float, 1),
            TypeSymbol::Float,
        );
        assert_eq!(
            quill_bound::printer::print_expression(&lowerer.rewrite_expression(sum)),
            "float(i) + x"
        );

        let concat = binary(
            BinaryOperator::Add,
            parameter("s", TypeSymbol::String, 0),
            parameter("b", TypeSymbol::Bool, 1),
            TypeSymbol::String,
        );
        assert_eq!(
            quill_bound::printer::print_expression(&lowerer.rewrite_expression(concat)),
            "s + string(b)"
        );
    }

    #[test]
    fn test_logical_and_becomes_statement_expression() {
        let mut lowerer = Lowerer::new();
        let and = binary(
            BinaryOperator::LogicalAnd,
            parameter("a", TypeSymbol::Bool, 0),
            parameter("b", TypeSymbol::Bool, 1),
            TypeSymbol::Bool,
        );
        match lowerer.rewrite_expression(and) {
            BoundExpression::StatementExpression(n) => {
                assert_eq!(n.ty, TypeSymbol::Bool);
                assert_eq!(n.statements.len(), 6);
                assert!(matches!(n.statements[0], BoundStatement::ConditionalGoto(_)));
            }
            other => panic!("expected a statement expression, got {:?}", other),
        }
    }

    #[test]
    fn test_code_after_return_is_removed() {
        let body = BoundBlockStatement::new(vec![
            BoundStatement::Return(BoundReturnStatement {
                expression: Some(BoundExpression::literal(Value::Int(1))),
            }),
            BoundStatement::expression(parameter("x", TypeSymbol::Int, 0)),
        ]);
        let lowered = lower(&function(TypeSymbol::Int), body);
        assert_eq!(lowered.statements.len(), 1);
    }
}
