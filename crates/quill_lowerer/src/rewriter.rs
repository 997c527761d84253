//! Structural rewriting of bound trees.
//!
//! Every method takes ownership of a node and returns its replacement. The
//! defaults rebuild the node around rewritten children, so an implementor
//! only overrides the forms it changes.

use quill_bound::*;

pub trait BoundTreeRewriter {
    // ========================================================================
    // Statements
    // ========================================================================

    fn rewrite_statement(&mut self, statement: BoundStatement) -> BoundStatement {
        match statement {
            BoundStatement::Block(n) => self.rewrite_block(n),
            BoundStatement::Expression(n) => self.rewrite_expression_statement(n),
            BoundStatement::VariableDeclaration(n) => self.rewrite_variable_declaration(n),
            BoundStatement::If(n) => self.rewrite_if(n),
            BoundStatement::While(n) => self.rewrite_while(n),
            BoundStatement::DoWhile(n) => self.rewrite_do_while(n),
            BoundStatement::For(n) => self.rewrite_for(n),
            BoundStatement::ConditionalGoto(n) => self.rewrite_conditional_goto(n),
            BoundStatement::Return(n) => self.rewrite_return(n),
            BoundStatement::Goto(_)
            | BoundStatement::Label(_)
            | BoundStatement::Nop
            | BoundStatement::Invalid => statement,
        }
    }

    fn rewrite_block(&mut self, node: BoundBlockStatement) -> BoundStatement {
        let statements = self.rewrite_statements(node.statements);
        BoundStatement::block(statements)
    }

    fn rewrite_statements(&mut self, statements: Vec<BoundStatement>) -> Vec<BoundStatement> {
        statements
            .into_iter()
            .map(|statement| self.rewrite_statement(statement))
            .collect()
    }

    fn rewrite_expression_statement(&mut self, node: BoundExpressionStatement) -> BoundStatement {
        BoundStatement::Expression(BoundExpressionStatement {
            expression: self.rewrite_expression(node.expression),
            should_pop: node.should_pop,
        })
    }

    fn rewrite_variable_declaration(&mut self, node: BoundVariableDeclaration) -> BoundStatement {
        BoundStatement::VariableDeclaration(BoundVariableDeclaration {
            variable: node.variable,
            initializer: self.rewrite_expression(node.initializer),
        })
    }

    fn rewrite_if(&mut self, node: BoundIfStatement) -> BoundStatement {
        BoundStatement::If(BoundIfStatement {
            condition: self.rewrite_expression(node.condition),
            then_statement: Box::new(self.rewrite_statement(*node.then_statement)),
            else_statement: node
                .else_statement
                .map(|statement| Box::new(self.rewrite_statement(*statement))),
        })
    }

    fn rewrite_while(&mut self, node: BoundWhileStatement) -> BoundStatement {
        BoundStatement::While(BoundWhileStatement {
            condition: self.rewrite_expression(node.condition),
            body: Box::new(self.rewrite_statement(*node.body)),
            ..node
        })
    }

    fn rewrite_do_while(&mut self, node: BoundDoWhileStatement) -> BoundStatement {
        BoundStatement::DoWhile(BoundDoWhileStatement {
            body: Box::new(self.rewrite_statement(*node.body)),
            condition: self.rewrite_expression(node.condition),
            ..node
        })
    }

    fn rewrite_for(&mut self, node: BoundForStatement) -> BoundStatement {
        BoundStatement::For(BoundForStatement {
            declaration: Box::new(self.rewrite_statement(*node.declaration)),
            condition: self.rewrite_expression(node.condition),
            increment: self.rewrite_expression(node.increment),
            body: Box::new(self.rewrite_statement(*node.body)),
            ..node
        })
    }

    fn rewrite_conditional_goto(&mut self, node: BoundConditionalGotoStatement) -> BoundStatement {
        BoundStatement::ConditionalGoto(BoundConditionalGotoStatement {
            condition: self.rewrite_expression(node.condition),
            ..node
        })
    }

    fn rewrite_return(&mut self, node: BoundReturnStatement) -> BoundStatement {
        BoundStatement::Return(BoundReturnStatement {
            expression: node
                .expression
                .map(|expression| self.rewrite_expression(expression)),
        })
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn rewrite_expression(&mut self, expression: BoundExpression) -> BoundExpression {
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

    fn rewrite_unary(&mut self, node: BoundUnaryExpression) -> BoundExpression {
        BoundExpression::Unary(BoundUnaryExpression {
            operand: Box::new(self.rewrite_expression(*node.operand)),
            ..node
        })
    }

    fn rewrite_binary(&mut self, node: BoundBinaryExpression) -> BoundExpression {
        BoundExpression::Binary(BoundBinaryExpression {
            left: Box::new(self.rewrite_expression(*node.left)),
            right: Box::new(self.rewrite_expression(*node.right)),
            ..node
        })
    }

    fn rewrite_call(&mut self, node: BoundCallExpression) -> BoundExpression {
        BoundExpression::Call(BoundCallExpression {
            arguments: node
                .arguments
                .into_iter()
                .map(|argument| self.rewrite_expression(argument))
                .collect(),
            function: node.function,
        })
    }

    fn rewrite_conversion(&mut self, node: BoundConversionExpression) -> BoundExpression {
        BoundExpression::Conversion(BoundConversionExpression {
            expression: Box::new(self.rewrite_expression(*node.expression)),
            ..node
        })
    }

    fn rewrite_assignment(&mut self, node: BoundAssignmentExpression) -> BoundExpression {
        BoundExpression::Assignment(BoundAssignmentExpression {
            expression: Box::new(self.rewrite_expression(*node.expression)),
            variable: node.variable,
        })
    }

    fn rewrite_array_creation(&mut self, node: BoundArrayCreationExpression) -> BoundExpression {
        BoundExpression::ArrayCreation(BoundArrayCreationExpression {
            size: Box::new(self.rewrite_expression(*node.size)),
            ty: node.ty,
        })
    }

    fn rewrite_ternary(&mut self, node: BoundTernaryExpression) -> BoundExpression {
        BoundExpression::Ternary(BoundTernaryExpression {
            condition: Box::new(self.rewrite_expression(*node.condition)),
            when_true: Box::new(self.rewrite_expression(*node.when_true)),
            when_false: Box::new(self.rewrite_expression(*node.when_false)),
            ..node
        })
    }

    fn rewrite_statement_expression(&mut self, node: BoundStatementExpression) -> BoundExpression {
        BoundExpression::StatementExpression(BoundStatementExpression {
            statements: self.rewrite_statements(node.statements),
            ty: node.ty,
        })
    }
}
