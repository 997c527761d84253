//! Accessors shared by every variant of the node enums.

use crate::node::*;
use crate::syntax_kind::SyntaxKind;
use quill_core::text::TextSpan;

impl<'a> Member<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Member::Function(n) => &n.data,
            Member::GlobalStatement(n) => &n.data,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn span(&self) -> TextSpan {
        self.data().span
    }
}

impl<'a> Statement<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Statement::Block(n) => &n.data,
            Statement::VariableDeclaration(n) => &n.data,
            Statement::If(n) => &n.data,
            Statement::While(n) => &n.data,
            Statement::DoWhile(n) => &n.data,
            Statement::For(n) => &n.data,
            Statement::Break(n) => &n.data,
            Statement::Continue(n) => &n.data,
            Statement::Return(n) => &n.data,
            Statement::Expression(n) => &n.data,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn span(&self) -> TextSpan {
        self.data().span
    }

    pub fn is_valid(&self) -> bool {
        self.data().is_valid()
    }
}

impl<'a> Expression<'a> {
    pub fn data(&self) -> &NodeData {
        match self {
            Expression::Literal(n) => &n.data,
            Expression::Name(n) => &n.data,
            Expression::Parenthesized(n) => &n.data,
            Expression::Unary(n) => &n.data,
            Expression::Binary(n) => &n.data,
            Expression::Assignment(n) => &n.data,
            Expression::Postfix(n) => &n.data,
            Expression::Call(n) => &n.data,
            Expression::Ternary(n) => &n.data,
            Expression::ArrayCreation(n) => &n.data,
        }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.data().kind
    }

    pub fn span(&self) -> TextSpan {
        self.data().span
    }

    pub fn is_valid(&self) -> bool {
        self.data().is_valid()
    }

    /// Strip any number of enclosing parentheses.
    pub fn skip_parentheses(&self) -> &Expression<'a> {
        let mut expr = self;
        while let Expression::Parenthesized(inner) = expr {
            expr = inner.expression;
        }
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeFlags;

    #[test]
    fn test_node_validity() {
        let data = NodeData::new(SyntaxKind::NameExpression, 0, 1);
        assert!(data.is_valid());
        assert!(!data.with_flags(NodeFlags::THIS_NODE_HAS_ERROR).is_valid());

        let missing = Identifier::missing(4);
        assert!(missing.is_missing());
        assert!(!missing.data.is_valid());
        assert_eq!(missing.text, "");
    }

    #[test]
    fn test_skip_parentheses() {
        let inner = Expression::Literal(LiteralExpression {
            data: NodeData::new(SyntaxKind::LiteralExpression, 2, 3),
            value: LiteralValue::Int(1),
        });
        let once = Expression::Parenthesized(ParenthesizedExpression {
            data: NodeData::new(SyntaxKind::ParenthesizedExpression, 1, 4),
            expression: &inner,
        });
        let twice = Expression::Parenthesized(ParenthesizedExpression {
            data: NodeData::new(SyntaxKind::ParenthesizedExpression, 0, 5),
            expression: &once,
        });
        assert_eq!(twice.skip_parentheses().kind(), SyntaxKind::LiteralExpression);
        assert_eq!(twice.span(), TextSpan::from_bounds(0, 5));
    }
}
