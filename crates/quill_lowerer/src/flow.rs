//! Control-flow graphs over lowered statement lists.
//!
//! Blocks and branches live in two arenas and refer to each other by index.
//! Block 0 is the synthetic start and block 1 the synthetic end; the body
//! blocks follow in statement order, so a branch to a block with a smaller
//! or equal index is a back edge.

use log::trace;
use quill_bound::printer::BoundTreePrinter;
use quill_bound::{BoundExpression, BoundLabel, BoundStatement, FunctionSymbol};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::fmt::Write;

pub type BlockId = usize;
pub type BranchId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Start,
    End,
    Body,
}

#[derive(Debug)]
pub struct BasicBlock<'s> {
    pub id: BlockId,
    pub kind: BlockKind,
    /// Index of the first statement in the list the graph was built from.
    pub first: usize,
    pub statements: &'s [BoundStatement],
    pub incoming: Vec<BranchId>,
    pub outgoing: Vec<BranchId>,
    pub removed: bool,
}

/// An edge between blocks. A conditional edge is taken when `condition`
/// evaluates to `!negated`.
#[derive(Debug)]
pub struct BasicBlockBranch<'s> {
    pub from: BlockId,
    pub to: BlockId,
    pub condition: Option<&'s BoundExpression>,
    pub negated: bool,
    pub removed: bool,
}

#[derive(Debug)]
pub struct ControlFlowGraph<'s> {
    pub start: BlockId,
    pub end: BlockId,
    pub blocks: Vec<BasicBlock<'s>>,
    pub branches: Vec<BasicBlockBranch<'s>>,
}

impl<'s> ControlFlowGraph<'s> {
    /// Partition `statements` into blocks, connect them, and prune the
    /// blocks nothing can reach.
    pub fn build(statements: &'s [BoundStatement]) -> Self {
        let mut graph = Self::partition(statements);
        graph.connect();
        let removed = graph.prune();
        trace!(
            "control flow graph: {} statements, {} blocks, {} pruned",
            statements.len(),
            graph.blocks.len() - 2,
            removed
        );
        graph
    }

    fn partition(statements: &'s [BoundStatement]) -> Self {
        let mut graph = ControlFlowGraph {
            start: 0,
            end: 1,
            blocks: Vec::new(),
            branches: Vec::new(),
        };
        graph.add_block(BlockKind::Start, 0, &[]);
        graph.add_block(BlockKind::End, statements.len(), &[]);

        let mut first = 0;
        for (i, statement) in statements.iter().enumerate() {
            match statement {
                BoundStatement::Label(_) => {
                    if i > first {
                        graph.add_block(BlockKind::Body, first, &statements[first..i]);
                    }
                    first = i;
                }
                BoundStatement::Goto(_) | BoundStatement::ConditionalGoto(_) | BoundStatement::Return(_) => {
                    graph.add_block(BlockKind::Body, first, &statements[first..=i]);
                    first = i + 1;
                }
                _ => {}
            }
        }
        if first < statements.len() {
            graph.add_block(BlockKind::Body, first, &statements[first..]);
        }
        graph
    }

    fn add_block(&mut self, kind: BlockKind, first: usize, statements: &'s [BoundStatement]) {
        let id = self.blocks.len();
        self.blocks.push(BasicBlock {
            id,
            kind,
            first,
            statements,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            removed: false,
        });
    }

    fn connect(&mut self) {
        // A label always opens its block.
        let mut label_blocks: FxHashMap<BoundLabel, BlockId> = FxHashMap::default();
        for block in &self.blocks[2..] {
            if let Some(BoundStatement::Label(label)) = block.statements.first() {
                label_blocks.insert(*label, block.id);
            }
        }
        let end = self.end;
        let target = |label: &BoundLabel| label_blocks.get(label).copied().unwrap_or(end);

        let count = self.blocks.len();
        if count == 2 {
            self.add_branch(self.start, end, None, false);
            return;
        }
        self.add_branch(self.start, 2, None, false);

        for id in 2..count {
            let next = if id + 1 < count { id + 1 } else { end };
            let statements = self.blocks[id].statements;
            match statements.last() {
                Some(BoundStatement::Goto(label)) => {
                    self.add_branch(id, target(label), None, false);
                }
                Some(BoundStatement::ConditionalGoto(n)) => {
                    self.add_branch(id, target(&n.label), Some(&n.condition), n.jump_if_false);
                    self.add_branch(id, next, Some(&n.condition), !n.jump_if_false);
                }
                Some(BoundStatement::Return(_)) => {
                    self.add_branch(id, end, None, false);
                }
                _ => {
                    self.add_branch(id, next, None, false);
                }
            }
        }
    }

    fn add_branch(&mut self, from: BlockId, to: BlockId, condition: Option<&'s BoundExpression>, negated: bool) {
        let id = self.branches.len();
        self.branches.push(BasicBlockBranch {
            from,
            to,
            condition,
            negated,
            removed: false,
        });
        self.blocks[from].outgoing.push(id);
        self.blocks[to].incoming.push(id);
    }

    fn live_incoming(&self, block: BlockId) -> usize {
        self.blocks[block]
            .incoming
            .iter()
            .filter(|&&branch| !self.branches[branch].removed)
            .count()
    }

    /// Remove body blocks with no live incoming branch, along with their
    /// outgoing branches, until none is left. Returns how many blocks went.
    pub fn prune(&mut self) -> usize {
        let mut worklist: VecDeque<BlockId> = (2..self.blocks.len())
            .filter(|&id| !self.blocks[id].removed && self.live_incoming(id) == 0)
            .collect();

        let mut removed = 0;
        while let Some(id) = worklist.pop_front() {
            if self.blocks[id].removed {
                continue;
            }
            self.blocks[id].removed = true;
            removed += 1;
            trace!("pruned unreachable block {}", id);

            for index in 0..self.blocks[id].outgoing.len() {
                let branch = self.blocks[id].outgoing[index];
                if self.branches[branch].removed {
                    continue;
                }
                self.branches[branch].removed = true;
                let to = self.branches[branch].to;
                if self.blocks[to].kind == BlockKind::Body
                    && !self.blocks[to].removed
                    && self.live_incoming(to) == 0
                {
                    worklist.push_back(to);
                }
            }
        }
        removed
    }

    pub fn live_blocks(&self) -> impl Iterator<Item = &BasicBlock<'s>> {
        self.blocks.iter().filter(|block| !block.removed)
    }

    pub fn live_branches(&self) -> impl Iterator<Item = &BasicBlockBranch<'s>> {
        self.branches.iter().filter(|branch| !branch.removed)
    }

    /// Live branches between body blocks that jump to the same or an
    /// earlier block.
    pub fn back_edges(&self) -> impl Iterator<Item = &BasicBlockBranch<'s>> {
        self.live_branches().filter(move |branch| {
            self.blocks[branch.from].kind == BlockKind::Body
                && self.blocks[branch.to].kind == BlockKind::Body
                && branch.to <= branch.from
        })
    }

    /// For each statement of the original list, whether it survived pruning.
    pub fn reachable_statements(&self, len: usize) -> Vec<bool> {
        let mut keep = vec![false; len];
        for block in self.live_blocks().filter(|block| block.kind == BlockKind::Body) {
            for slot in &mut keep[block.first..block.first + block.statements.len()] {
                *slot = true;
            }
        }
        keep
    }

    /// Whether every live path into the end block leaves through a `return`.
    pub fn all_paths_return(&self) -> bool {
        self.blocks[self.end]
            .incoming
            .iter()
            .map(|&branch| &self.branches[branch])
            .filter(|branch| !branch.removed)
            .all(|branch| {
                matches!(
                    self.blocks[branch.from].statements.last(),
                    Some(BoundStatement::Return(_))
                )
            })
    }

    /// Render as a Graphviz digraph.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph G {\n");
        for block in self.live_blocks() {
            let label = match block.kind {
                BlockKind::Start => "<Start>".to_string(),
                BlockKind::End => "<End>".to_string(),
                BlockKind::Body => {
                    let mut printer = BoundTreePrinter::new();
                    for statement in block.statements {
                        printer.print_statement(statement);
                    }
                    escape(&printer.finish()).replace('\n', "\\l")
                }
            };
            let _ = writeln!(out, "    N{} [label = \"{}\", shape = box]", block.id, label);
        }
        for branch in self.live_branches() {
            let _ = write!(out, "    N{} -> N{}", branch.from, branch.to);
            if let Some(condition) = branch.condition {
                let text = quill_bound::printer::print_expression(condition);
                let text = if branch.negated { format!("!({})", text) } else { text };
                let _ = write!(out, " [label = \"{}\"]", escape(&text));
            }
            out.push('\n');
        }
        out.push_str("}\n");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Whether every path through `body` returns a value. Always true for
/// functions returning `void`.
pub fn all_paths_return(function: &FunctionSymbol, body: &[BoundStatement]) -> bool {
    if function.return_type.is_void() {
        return true;
    }
    ControlFlowGraph::build(body).all_paths_return()
}

/// Drop the statements no path from the start reaches.
pub fn remove_unreachable(statements: Vec<BoundStatement>) -> Vec<BoundStatement> {
    let keep = ControlFlowGraph::build(&statements).reachable_statements(statements.len());
    statements
        .into_iter()
        .zip(keep)
        .filter_map(|(statement, keep)| keep.then_some(statement))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_bound::label::LabelGenerator;
    use quill_bound::{BoundReturnStatement, TypeSymbol, Value, VariableKind, VariableSymbol};
    use std::rc::Rc;

    fn ret(value: i64) -> BoundStatement {
        BoundStatement::Return(BoundReturnStatement {
            expression: Some(BoundExpression::literal(Value::Int(value))),
        })
    }

    fn flag() -> BoundExpression {
        let c = VariableSymbol::new("c", VariableKind::Parameter { index: 0 }, TypeSymbol::Bool, 0);
        BoundExpression::variable(Rc::new(c))
    }

    #[test]
    fn test_empty_body_connects_start_to_end() {
        let graph = ControlFlowGraph::build(&[]);
        assert_eq!(graph.blocks.len(), 2);
        assert_eq!(graph.live_branches().count(), 1);
        assert!(!graph.all_paths_return());
    }

    #[test]
    fn test_partition_and_edges() {
        let mut labels = LabelGenerator::new();
        let end = labels.generated();
        let statements = vec![
            BoundStatement::conditional_goto(end, flag(), true),
            ret(1),
            BoundStatement::Label(end),
        ];
        let graph = ControlFlowGraph::build(&statements);
        // start, end, [goto], [return], [label]
        assert_eq!(graph.blocks.len(), 5);
        assert!(!graph.blocks[3].removed);
        assert!(!graph.all_paths_return());
        assert_eq!(graph.back_edges().count(), 0);
        assert!(graph.to_dot().contains("N2 -> N4 [label = \"!(c)\"]"));
    }

    #[test]
    fn test_code_after_return_is_pruned() {
        let statements = vec![ret(1), ret(2), ret(3)];
        let graph = ControlFlowGraph::build(&statements);
        assert_eq!(graph.reachable_statements(3), vec![true, false, false]);
        assert!(graph.all_paths_return());
    }

    #[test]
    fn test_dangling_goto_edges_to_end() {
        let mut labels = LabelGenerator::new();
        let sentinel = labels.sentinel();
        let statements = vec![BoundStatement::Goto(sentinel)];
        let graph = ControlFlowGraph::build(&statements);
        assert!(graph.live_branches().any(|b| b.from == 2 && b.to == graph.end));
    }

    #[test]
    fn test_pruning_is_idempotent() {
        let mut labels = LabelGenerator::new();
        let skip = labels.generated();
        let statements = vec![
            BoundStatement::Goto(skip),
            ret(1),
            BoundStatement::Label(skip),
            ret(2),
            ret(3),
        ];
        let once = remove_unreachable(statements);
        let twice = remove_unreachable(once.clone());
        assert_eq!(once.len(), 3);
        assert_eq!(once, twice);
    }
}
