//! Bound tree to text.
//!
//! Renders bound trees as indented, source-like text. Lowered trees print
//! their labels one level out from the statements they mark, so goto form
//! reads like an assembly listing.

use crate::program::BoundProgram;
use crate::symbol::FunctionSymbol;
use crate::tree::*;
use crate::types::TypeSymbol;
use crate::value::Value;

pub struct BoundTreePrinter {
    output: String,
    indent_level: u32,
    indent_str: &'static str,
}

impl Default for BoundTreePrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundTreePrinter {
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(1024),
            indent_level: 0,
            indent_str: "    ",
        }
    }

    pub fn finish(self) -> String {
        self.output
    }

    /// Print every function of `program`, followed by its body.
    pub fn print_program(&mut self, program: &BoundProgram) {
        for (i, (function, body)) in program.functions.iter().enumerate() {
            if i > 0 {
                self.write_newline();
            }
            self.print_function(function, body);
        }
    }

    pub fn print_function(&mut self, function: &FunctionSymbol, body: &BoundBlockStatement) {
        self.write("fn ");
        self.write(&function.signature());
        self.write_newline();
        self.print_block(body);
    }

    pub fn print_block(&mut self, block: &BoundBlockStatement) {
        self.write_indent();
        self.write("{");
        self.write_newline();
        self.increase_indent();
        for statement in &block.statements {
            self.print_statement(statement);
        }
        self.decrease_indent();
        self.write_indent();
        self.write("}");
        self.write_newline();
    }

    // ========================================================================
    // Statement printing
    // ========================================================================

    /// Print one statement on its own line(s), including indentation.
    pub fn print_statement(&mut self, statement: &BoundStatement) {
        match statement {
            BoundStatement::Block(n) => self.print_block(n),
            BoundStatement::Expression(n) => {
                self.write_indent();
                self.print_expression(&n.expression);
                self.write_newline();
            }
            BoundStatement::VariableDeclaration(n) => {
                self.write_indent();
                self.write(if n.variable.is_readonly { "let " } else { "var " });
                self.write(&n.variable.name);
                self.write(" = ");
                self.print_expression(&n.initializer);
                self.write_newline();
            }
            BoundStatement::If(n) => {
                self.write_indent();
                self.write("if ");
                self.print_expression(&n.condition);
                self.write_newline();
                self.print_nested(&n.then_statement);
                if let Some(ref else_statement) = n.else_statement {
                    self.write_indent();
                    self.write("else");
                    self.write_newline();
                    self.print_nested(else_statement);
                }
            }
            BoundStatement::While(n) => {
                self.write_indent();
                self.write("while ");
                self.print_expression(&n.condition);
                self.write_newline();
                self.print_nested(&n.body);
            }
            BoundStatement::DoWhile(n) => {
                self.write_indent();
                self.write("do");
                self.write_newline();
                self.print_nested(&n.body);
                self.write_indent();
                self.write("while ");
                self.print_expression(&n.condition);
                self.write_newline();
            }
            BoundStatement::For(n) => {
                self.write_indent();
                self.write("for");
                self.write_newline();
                self.increase_indent();
                self.print_statement(&n.declaration);
                self.write_indent();
                self.print_expression(&n.condition);
                self.write_newline();
                self.write_indent();
                self.print_expression(&n.increment);
                self.write_newline();
                self.decrease_indent();
                self.print_nested(&n.body);
            }
            BoundStatement::Goto(label) => {
                self.write_indent();
                self.write(&format!("goto {}", label));
                self.write_newline();
            }
            BoundStatement::ConditionalGoto(n) => {
                self.write_indent();
                self.write(&format!("goto {} ", n.label));
                self.write(if n.jump_if_false { "unless " } else { "if " });
                self.print_expression(&n.condition);
                self.write_newline();
            }
            BoundStatement::Label(label) => {
                self.decrease_indent();
                self.write_indent();
                self.write(&format!("{}:", label));
                self.write_newline();
                self.increase_indent();
            }
            BoundStatement::Return(n) => {
                self.write_indent();
                self.write("return");
                if let Some(ref expression) = n.expression {
                    self.write(" ");
                    self.print_expression(expression);
                }
                self.write_newline();
            }
            BoundStatement::Nop => {
                self.write_indent();
                self.write("nop");
                self.write_newline();
            }
            BoundStatement::Invalid => {
                self.write_indent();
                self.write("?");
                self.write_newline();
            }
        }
    }

    fn print_nested(&mut self, statement: &BoundStatement) {
        if matches!(statement, BoundStatement::Block(_)) {
            self.print_statement(statement);
        } else {
            self.increase_indent();
            self.print_statement(statement);
            self.decrease_indent();
        }
    }

    // ========================================================================
    // Expression printing
    // ========================================================================

    pub fn print_expression(&mut self, expression: &BoundExpression) {
        match expression {
            BoundExpression::Literal(n) => self.print_literal(&n.value),
            BoundExpression::Variable(n) => self.write(&n.variable.name),
            BoundExpression::Unary(n) => {
                self.write(n.op.text());
                self.print_operand(&n.operand, u8::MAX);
            }
            BoundExpression::Binary(n) => {
                let precedence = n.op.precedence();
                self.print_operand(&n.left, precedence);
                self.write(&format!(" {} ", n.op));
                self.print_operand(&n.right, precedence + 1);
            }
            BoundExpression::Call(n) => {
                self.write(&n.function.name);
                self.print_arguments(&n.arguments);
            }
            BoundExpression::Conversion(n) => {
                self.write(&n.ty.to_string());
                self.write("(");
                self.print_expression(&n.expression);
                self.write(")");
            }
            BoundExpression::Assignment(n) => {
                self.write(&n.variable.name);
                self.write(" = ");
                self.print_expression(&n.expression);
            }
            BoundExpression::ArrayCreation(n) => {
                self.write("new ");
                match n.ty {
                    TypeSymbol::Array(ref element, rank) => {
                        self.write(&element.to_string());
                        self.write("[");
                        self.print_expression(&n.size);
                        for _ in 1..rank {
                            self.write(",");
                        }
                        self.write("]");
                    }
                    ref other => self.write(&other.to_string()),
                }
            }
            BoundExpression::Ternary(n) => {
                self.print_operand(&n.condition, 1);
                self.write(" ? ");
                self.print_expression(&n.when_true);
                self.write(" : ");
                self.print_expression(&n.when_false);
            }
            BoundExpression::StatementExpression(n) => {
                self.write("{");
                self.write_newline();
                self.increase_indent();
                for statement in &n.statements {
                    self.print_statement(statement);
                }
                self.decrease_indent();
                self.write_indent();
                self.write("}");
            }
            BoundExpression::Invalid => self.write("?"),
        }
    }

    /// Print `operand`, parenthesized when it binds looser than `parent`.
    fn print_operand(&mut self, operand: &BoundExpression, parent: u8) {
        let precedence = match operand {
            BoundExpression::Binary(n) => n.op.precedence(),
            BoundExpression::Ternary(_) | BoundExpression::Assignment(_) => 0,
            _ => u8::MAX,
        };
        if precedence < parent {
            self.write("(");
            self.print_expression(operand);
            self.write(")");
        } else {
            self.print_expression(operand);
        }
    }

    fn print_arguments(&mut self, arguments: &[BoundExpression]) {
        self.write("(");
        for (i, argument) in arguments.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            self.print_expression(argument);
        }
        self.write(")");
    }

    fn print_literal(&mut self, value: &Value) {
        match value {
            Value::Str(s) => self.write(&quote(s)),
            // Debug keeps the fractional part of whole floats.
            Value::Float(x) => self.write(&format!("{:?}", x)),
            other => self.write(&other.to_string()),
        }
    }

    // ========================================================================
    // Output helpers
    // ========================================================================

    fn write(&mut self, s: &str) {
        self.output.push_str(s);
    }

    fn write_newline(&mut self) {
        self.output.push('\n');
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent_level {
            self.output.push_str(self.indent_str);
        }
    }

    fn increase_indent(&mut self) {
        self.indent_level += 1;
    }

    fn decrease_indent(&mut self) {
        if self.indent_level > 0 {
            self.indent_level -= 1;
        }
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

/// Render a single statement list as text.
pub fn print_block(block: &BoundBlockStatement) -> String {
    let mut printer = BoundTreePrinter::new();
    printer.print_block(block);
    printer.finish()
}

pub fn print_expression(expression: &BoundExpression) -> String {
    let mut printer = BoundTreePrinter::new();
    printer.print_expression(expression);
    printer.finish()
}

pub fn print_program(program: &BoundProgram) -> String {
    let mut printer = BoundTreePrinter::new();
    printer.print_program(program);
    printer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::LabelGenerator;
    use crate::operators::BinaryOperator;
    use crate::symbol::{VariableKind, VariableSymbol};
    use std::rc::Rc;

    fn binary(op: BinaryOperator, left: BoundExpression, right: BoundExpression) -> BoundExpression {
        BoundExpression::Binary(BoundBinaryExpression {
            op,
            left: Box::new(left),
            right: Box::new(right),
            ty: TypeSymbol::Int,
            constant: None,
        })
    }

    #[test]
    fn test_parenthesizes_by_precedence() {
        let int = |i| BoundExpression::literal(Value::Int(i));
        let sum = binary(BinaryOperator::Add, int(1), int(2));
        let product = binary(BinaryOperator::Multiply, sum, int(3));
        assert_eq!(print_expression(&product), "(1 + 2) * 3");

        let nested = binary(
            BinaryOperator::Subtract,
            int(1),
            binary(BinaryOperator::Subtract, int(2), int(3)),
        );
        assert_eq!(print_expression(&nested), "1 - (2 - 3)");
    }

    #[test]
    fn test_literals() {
        assert_eq!(print_expression(&BoundExpression::literal(Value::Float(2.0))), "2.0");
        assert_eq!(
            print_expression(&BoundExpression::literal(Value::Str("a\"b".into()))),
            "\"a\\\"b\""
        );
    }

    #[test]
    fn test_goto_form() {
        let mut labels = LabelGenerator::new();
        let end = labels.generated();
        let x = Rc::new(VariableSymbol::new("x", VariableKind::Local, TypeSymbol::Bool, 0));
        let block = BoundBlockStatement::new(vec![
            BoundStatement::conditional_goto(end, BoundExpression::variable(x), true),
            BoundStatement::Label(end),
            BoundStatement::Return(BoundReturnStatement { expression: None }),
        ]);
        assert_eq!(
            print_block(&block),
            "{\n    goto Label1 unless x\nLabel1:\n    return\n}\n"
        );
    }
}
