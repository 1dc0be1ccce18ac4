//! Structural and type checks over a composition.
//!
//! Validation runs in two passes. The structural pass proves the table
//! below the root is a finite DAG of bounded depth and size; its findings
//! are fatal. The type pass then checks every sequential boundary,
//! visiting each distinct node once. With unique wire names required, a
//! last pass looks for a tag that both branches of a parallel composition
//! carry in the same rank.

use std::collections::BTreeMap;

use indexmap::IndexSet;
use log::{debug, trace};
use petgraph::{
    algo::toposort,
    graph::{DiGraph, NodeIndex},
    visit::EdgeRef,
};
use serde::Serialize;

use weft_core::composition::{
    Composition, Expr, ExprKind, Node, NodeId, NodePath, PostOrder, Step, WireType,
};

use crate::{
    config::GenerateOptions,
    diagnostic::{Diagnostic, DiagnosticKind, Severity, TreeProblem},
    document::{SeverityCounts, SummaryDiagnostic},
    layout::{extent_of, extents},
};

/// Outcome of validating a composition without drawing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    diagnostics: Vec<Diagnostic>,
    bricks: u64,
    connections: u64,
}

impl Check {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// `true` unless a diagnostic is an error or worse.
    pub fn is_valid(&self) -> bool {
        self.diagnostics
            .iter()
            .all(|diagnostic| diagnostic.severity() < Severity::Error)
    }

    /// Brick occurrences, zero when the table could not be walked.
    pub fn bricks(&self) -> u64 {
        self.bricks
    }

    /// Wires joining two bricks, boundary stubs excluded.
    pub fn connections(&self) -> u64 {
        self.connections
    }

    pub fn summary(&self) -> CheckSummary {
        let mut counts = SeverityCounts::default();
        for diagnostic in &self.diagnostics {
            counts.add(diagnostic.severity());
        }
        CheckSummary {
            valid: self.is_valid(),
            bricks: self.bricks,
            connections: self.connections,
            diagnostics: counts,
            messages: self.diagnostics.iter().map(SummaryDiagnostic::from).collect(),
        }
    }
}

/// Machine-readable form of a [`Check`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckSummary {
    pub valid: bool,
    pub bricks: u64,
    pub connections: u64,
    pub diagnostics: SeverityCounts,
    pub messages: Vec<SummaryDiagnostic>,
}

/// Validates `expr` and counts what a diagram of it would hold.
pub fn check(expr: Expr<'_>, options: &GenerateOptions) -> Check {
    let diagnostics = validate(expr, options);
    let (bricks, connections) = if diagnostics.iter().any(Diagnostic::is_fatal) {
        (0, 0)
    } else {
        occurrence_counts(expr.composition(), expr.id())
    };
    Check {
        diagnostics,
        bricks,
        connections,
    }
}

/// Brick occurrences and brick-to-brick wires below `root`.
///
/// Shared nodes count once per occurrence. `root` must head a finite DAG.
fn occurrence_counts(composition: &Composition, root: NodeId) -> (u64, u64) {
    let mut counts: Vec<Option<(u64, u64)>> = vec![None; composition.len()];
    let mut stack = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        if counts.get(id.index()).copied().flatten().is_some() {
            continue;
        }
        let Some(node) = composition.node(id) else {
            continue;
        };
        let Some((left, right)) = node.children() else {
            counts[id.index()] = Some((1, 0));
            continue;
        };
        if !expanded {
            stack.push((id, true));
            stack.push((right, false));
            stack.push((left, false));
            continue;
        }

        let l = counts.get(left.index()).copied().flatten().unwrap_or_default();
        let r = counts.get(right.index()).copied().flatten().unwrap_or_default();
        let joined = match node {
            Node::Seq { .. } => {
                let outputs = composition.expr(left).outputs().len();
                outputs.min(composition.expr(right).inputs().len()) as u64
            }
            _ => 0,
        };
        counts[id.index()] = Some((
            l.0.saturating_add(r.0),
            l.1.saturating_add(r.1).saturating_add(joined),
        ));
    }
    counts.get(root.index()).copied().flatten().unwrap_or_default()
}

/// Checks `expr` and returns every problem found.
///
/// An empty list means the composition is well formed and well typed.
pub fn validate(expr: Expr<'_>, options: &GenerateOptions) -> Vec<Diagnostic> {
    let mut diagnostics = structural_pass(expr.composition(), expr.id(), options);
    if diagnostics.iter().any(Diagnostic::is_fatal) {
        debug!(fatal = diagnostics.len(); "Structural validation failed");
        return diagnostics;
    }

    type_pass(expr, options, &mut diagnostics);
    if options.unique_wire_names() {
        duplicate_wire_pass(expr, &mut diagnostics);
    }
    debug!(diagnostics = diagnostics.len(); "Validation completed");
    diagnostics
}

fn structural_pass(
    composition: &Composition,
    root: NodeId,
    options: &GenerateOptions,
) -> Vec<Diagnostic> {
    if !composition.contains(root) {
        return vec![
            Diagnostic::new(DiagnosticKind::MalformedTree {
                problem: TreeProblem::MissingRoot,
            })
            .with_node(root),
        ];
    }

    let mut diagnostics = Vec::new();
    let mut graph: DiGraph<NodeId, Step> = DiGraph::new();
    let mut indices: Vec<Option<NodeIndex>> = vec![None; composition.len()];

    let root_index = graph.add_node(root);
    indices[root.index()] = Some(root_index);
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        let Some((left, right)) = composition.node(id).and_then(Node::children) else {
            continue;
        };
        let Some(parent) = indices[id.index()] else {
            continue;
        };
        for (child, step) in [(left, Step::Left), (right, Step::Right)] {
            if !composition.contains(child) {
                diagnostics.push(
                    Diagnostic::new(DiagnosticKind::MalformedTree {
                        problem: TreeProblem::DanglingChild(child),
                    })
                    .with_node(id),
                );
                continue;
            }
            let child_index = match indices[child.index()] {
                Some(index) => index,
                None => {
                    let index = graph.add_node(child);
                    indices[child.index()] = Some(index);
                    stack.push(child);
                    index
                }
            };
            graph.add_edge(parent, child_index, step);
        }
    }

    if !diagnostics.is_empty() {
        return diagnostics;
    }

    let order = match toposort(&graph, None) {
        Ok(order) => order,
        Err(cycle) => {
            let node = graph[cycle.node_id()];
            trace!(node:?; "Cycle detected");
            return vec![
                Diagnostic::new(DiagnosticKind::MalformedTree {
                    problem: TreeProblem::Cycle,
                })
                .with_node(node),
            ];
        }
    };

    if let Some(diagnostic) = check_depth(&graph, &order, options.max_depth()) {
        return vec![diagnostic];
    }
    if let Some(diagnostic) =
        check_size(composition, &graph, &order, options.max_occurrences())
    {
        return vec![diagnostic];
    }

    debug!(nodes = graph.node_count(), edges = graph.edge_count(); "Composition is a DAG");
    diagnostics
}

/// Longest path from the root, relaxed in topological order.
fn check_depth(
    graph: &DiGraph<NodeId, Step>,
    order: &[NodeIndex],
    limit: usize,
) -> Option<Diagnostic> {
    let mut depth = vec![0usize; graph.node_count()];
    let mut parent: Vec<Option<(NodeIndex, Step)>> = vec![None; graph.node_count()];

    for &node in order {
        for edge in graph.edges(node) {
            let child = edge.target();
            if depth[node.index()] + 1 > depth[child.index()] {
                depth[child.index()] = depth[node.index()] + 1;
                parent[child.index()] = Some((node, *edge.weight()));
            }
        }
    }

    // Reversed so the first node in discovery order wins ties.
    let (deepest, &max) = depth
        .iter()
        .enumerate()
        .rev()
        .max_by_key(|(_, depth)| **depth)?;
    if max <= limit {
        return None;
    }

    let mut steps = Vec::with_capacity(max);
    let mut cursor = NodeIndex::new(deepest);
    while let Some((up, step)) = parent[cursor.index()] {
        steps.push(step);
        cursor = up;
    }
    let path = steps
        .into_iter()
        .rev()
        .fold(NodePath::root(), |path, step| path.child(step));

    Some(
        Diagnostic::new(DiagnosticKind::DepthExceeded {
            path,
            depth: max,
            limit,
        })
        .with_node(graph[NodeIndex::new(deepest)]),
    )
}

/// Counts brick occurrences after expanding shared nodes, bottom-up.
fn check_size(
    composition: &Composition,
    graph: &DiGraph<NodeId, Step>,
    order: &[NodeIndex],
    limit: usize,
) -> Option<Diagnostic> {
    let mut leaves = vec![0u64; graph.node_count()];
    for &node in order.iter().rev() {
        let count = match composition.node(graph[node]) {
            Some(Node::Leaf(_)) => 1,
            _ => graph
                .edges(node)
                .fold(0u64, |sum, edge| sum.saturating_add(leaves[edge.target().index()])),
        };
        leaves[node.index()] = count;
    }

    let occurrences = order.first().map_or(0, |root| leaves[root.index()]);
    if occurrences <= limit as u64 {
        return None;
    }
    Some(Diagnostic::new(DiagnosticKind::SizeExceeded { occurrences, limit }))
}

fn type_pass(expr: Expr<'_>, options: &GenerateOptions, diagnostics: &mut Vec<Diagnostic>) {
    let walk = PostOrder::unique(expr.composition(), expr.id(), options.max_depth());
    for visit in walk {
        match visit.expr().kind() {
            ExprKind::Seq(left, right) => {
                if left.outputs() != right.inputs() {
                    trace!(node:% = visit.id(), path:% = visit.path(); "Type mismatch");
                    diagnostics.push(
                        Diagnostic::new(DiagnosticKind::TypeMismatch {
                            path: visit.path().clone(),
                            expected: left.outputs().to_vec(),
                            actual: right.inputs().to_vec(),
                        })
                        .with_node(visit.id()),
                    );
                }
            }
            ExprKind::Par(..) | ExprKind::Leaf(_) | ExprKind::Dangling => {}
        }
    }
}

/// Port tags of every brick below a node, keyed by absolute rank.
type RankTags = BTreeMap<usize, IndexSet<WireType>>;

enum Frame {
    Enter { id: NodeId, rank: usize, path: NodePath },
    ExitSeq,
    ExitPar { id: NodeId, path: NodePath },
}

/// Reports a tag carried in the same rank by both branches of a parallel
/// composition, once per distinct node.
///
/// Walks every occurrence, so it relies on the structural pass having
/// bounded the expanded size.
fn duplicate_wire_pass(expr: Expr<'_>, diagnostics: &mut Vec<Diagnostic>) {
    let composition = expr.composition();
    let extents = extents(composition, expr.id());
    let mut reported: IndexSet<NodeId> = IndexSet::new();
    let mut results: Vec<RankTags> = Vec::new();
    let mut stack = vec![Frame::Enter {
        id: expr.id(),
        rank: 0,
        path: NodePath::root(),
    }];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter { id, rank, path } => match composition.node(id) {
                Some(Node::Leaf(brick)) => {
                    let tags = brick.inputs().iter().chain(brick.outputs()).copied().collect();
                    results.push(RankTags::from([(rank, tags)]));
                }
                Some(Node::Seq { left, right }) => {
                    let right_rank = rank + extent_of(&extents, *left).span;
                    stack.push(Frame::ExitSeq);
                    stack.push(Frame::Enter {
                        id: *right,
                        rank: right_rank,
                        path: path.child(Step::Right),
                    });
                    stack.push(Frame::Enter {
                        id: *left,
                        rank,
                        path: path.child(Step::Left),
                    });
                }
                Some(Node::Par { left, right }) => {
                    stack.push(Frame::ExitPar {
                        id,
                        path: path.clone(),
                    });
                    stack.push(Frame::Enter {
                        id: *right,
                        rank,
                        path: path.child(Step::Right),
                    });
                    stack.push(Frame::Enter {
                        id: *left,
                        rank,
                        path: path.child(Step::Left),
                    });
                }
                None => results.push(RankTags::new()),
            },
            Frame::ExitSeq => {
                let right = results.pop().unwrap_or_default();
                let mut left = results.pop().unwrap_or_default();
                left.extend(right);
                results.push(left);
            }
            Frame::ExitPar { id, path } => {
                let right = results.pop().unwrap_or_default();
                let mut left = results.pop().unwrap_or_default();
                if !reported.contains(&id) {
                    let mut tags: Vec<WireType> = Vec::new();
                    for (rank, left_tags) in &left {
                        let Some(right_tags) = right.get(rank) else {
                            continue;
                        };
                        for tag in left_tags.intersection(right_tags) {
                            if tags.contains(tag) {
                                continue;
                            }
                            tags.push(*tag);
                            trace!(node:% = id, rank = *rank, tag:% = tag; "Duplicate wire");
                            diagnostics.push(
                                Diagnostic::new(DiagnosticKind::DuplicateWire {
                                    path: path.clone(),
                                    tag: *tag,
                                })
                                .with_node(id)
                                .with_rank(*rank),
                            );
                        }
                    }
                    if !tags.is_empty() {
                        reported.insert(id);
                    }
                }
                for (rank, tags) in right {
                    left.entry(rank).or_default().extend(tags);
                }
                results.push(left);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::composition::{Brick, Grade, WireType};

    use crate::diagnostic::Severity;

    fn brick(name: &str, inputs: &[&str], outputs: &[&str]) -> Brick {
        Brick::new(name, Grade::Deterministic)
            .with_inputs(inputs)
            .with_outputs(outputs)
    }

    #[test]
    fn test_well_typed_is_clean() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"]));
        let b = c.leaf(brick("B", &["x"], &[]));
        let root = c.seq(a, b);

        assert!(validate(c.expr(root), &GenerateOptions::default()).is_empty());
    }

    #[test]
    fn test_single_type_mismatch() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"]));
        let b = c.leaf(brick("B", &["y"], &[]));
        let root = c.seq(a, b);

        let diagnostics = validate(c.expr(root), &GenerateOptions::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity(), Severity::Error);
        assert_eq!(diagnostics[0].node(), Some(root));
        match diagnostics[0].kind() {
            DiagnosticKind::TypeMismatch {
                path,
                expected,
                actual,
            } => {
                assert_eq!(path.to_string(), "root");
                assert_eq!(expected, &vec![WireType::new("x")]);
                assert_eq!(actual, &vec![WireType::new("y")]);
            }
            other => panic!("unexpected diagnostic {other:?}"),
        }
    }

    #[test]
    fn test_arity_mismatch_path() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x", "x"]));
        let b = c.leaf(brick("B", &["x"], &[]));
        let z = c.leaf(brick("Z", &[], &[]));
        let inner = c.seq(a, b);
        let root = c.par(z, inner);

        let diagnostics = validate(c.expr(root), &GenerateOptions::default());
        assert_eq!(diagnostics.len(), 1);
        let DiagnosticKind::TypeMismatch { path, .. } = diagnostics[0].kind() else {
            panic!("expected a type mismatch");
        };
        assert_eq!(path.to_string(), "root.right");
    }

    #[test]
    fn test_shared_mismatch_reported_once() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"]));
        let b = c.leaf(brick("B", &["y"], &[]));
        let bad = c.seq(a, b);
        let root = c.par(bad, bad);

        assert_eq!(validate(c.expr(root), &GenerateOptions::default()).len(), 1);
    }

    #[test]
    fn test_duplicate_wire_policy() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"]));
        let b = c.leaf(brick("B", &[], &["x"]));
        let root = c.par(a, b);

        assert!(validate(c.expr(root), &GenerateOptions::default()).is_empty());

        let strict = GenerateOptions::default().with_unique_wire_names(true);
        let diagnostics = validate(c.expr(root), &strict);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity(), Severity::Warning);
    }

    fn duplicate_tags(c: &Composition, root: NodeId) -> Vec<(String, Option<usize>)> {
        let strict = GenerateOptions::default().with_unique_wire_names(true);
        validate(c.expr(root), &strict)
            .iter()
            .filter_map(|d| match d.kind() {
                DiagnosticKind::DuplicateWire { tag, .. } => Some((tag.to_string(), d.rank())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_duplicate_wire_in_other_rank_is_allowed() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"]));
        let b = c.leaf(brick("B", &["x"], &["y"]));
        let chain = c.seq(a, b);
        let other = c.leaf(brick("C", &[], &["y"]));
        let root = c.par(chain, other);

        assert!(duplicate_tags(&c, root).is_empty());
    }

    #[test]
    fn test_duplicate_wire_inside_branch_rank() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"]));
        let b = c.leaf(brick("B", &["x"], &["y"]));
        let chain = c.seq(a, b);
        let other = c.leaf(brick("C", &[], &["x"]));
        let root = c.par(chain, other);

        assert_eq!(duplicate_tags(&c, root), vec![("x".to_string(), Some(0))]);
    }

    #[test]
    fn test_duplicate_wire_reported_once_per_node() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &["x"], &["x"]));
        let b = c.leaf(brick("B", &["x"], &["x"]));
        let pair = c.par(a, b);
        let root = c.seq(pair, pair);

        assert_eq!(duplicate_tags(&c, root), vec![("x".to_string(), Some(0))]);
    }

    #[test]
    fn test_missing_root() {
        let c = Composition::new();
        let diagnostics = validate(c.expr(NodeId::from_index(0)), &GenerateOptions::default());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].is_fatal());
    }

    #[test]
    fn test_dangling_child() {
        let c: Composition = toml::from_str::<Table>(
            r#"
            [[nodes]]
            kind = "leaf"
            name = "a"

            [[nodes]]
            kind = "seq"
            left = 0
            right = 7
            "#,
        )
        .unwrap()
        .nodes;

        let diagnostics = validate(c.expr(NodeId::from_index(1)), &GenerateOptions::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind(),
            &DiagnosticKind::MalformedTree {
                problem: TreeProblem::DanglingChild(NodeId::from_index(7))
            }
        );
    }

    #[test]
    fn test_cycle() {
        let c: Composition = toml::from_str::<Table>(
            r#"
            [[nodes]]
            kind = "leaf"
            name = "a"

            [[nodes]]
            kind = "par"
            left = 0
            right = 2

            [[nodes]]
            kind = "seq"
            left = 1
            right = 0
            "#,
        )
        .unwrap()
        .nodes;

        let diagnostics = validate(c.expr(NodeId::from_index(1)), &GenerateOptions::default());
        assert_eq!(diagnostics.len(), 1);
        assert!(matches!(
            diagnostics[0].kind(),
            DiagnosticKind::MalformedTree {
                problem: TreeProblem::Cycle
            }
        ));
    }

    #[test]
    fn test_depth_exceeded() {
        let mut c = Composition::new();
        let mut root = c.leaf(brick("A", &["x"], &["x"]));
        for _ in 0..5 {
            let step = c.leaf(brick("A", &["x"], &["x"]));
            root = c.seq(root, step);
        }

        let options = GenerateOptions::default().with_max_depth(3);
        let diagnostics = validate(c.expr(root), &options);
        assert_eq!(diagnostics.len(), 1);
        let DiagnosticKind::DepthExceeded { path, depth, limit } = diagnostics[0].kind() else {
            panic!("expected depth exceeded");
        };
        assert_eq!(*depth, 5);
        assert_eq!(*limit, 3);
        assert_eq!(path.to_string(), "root.left.left.left.left.left");

        assert!(validate(c.expr(root), &GenerateOptions::default().with_max_depth(5)).is_empty());
    }

    #[test]
    fn test_shared_doubling_exceeds_size() {
        let mut c = Composition::new();
        let mut root = c.leaf(brick("A", &["x"], &["x"]));
        for _ in 0..20 {
            root = c.seq(root, root);
        }

        let diagnostics = validate(c.expr(root), &GenerateOptions::default());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind(),
            &DiagnosticKind::SizeExceeded {
                occurrences: 1 << 20,
                limit: 10_000
            }
        );
    }

    #[test]
    fn test_check_counts_shared_occurrences() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &["x"], &["x"]));
        let pair = c.seq(a, a);
        let root = c.seq(pair, pair);

        let check = check(c.expr(root), &GenerateOptions::default());
        assert!(check.is_valid());
        assert_eq!(check.bricks(), 4);
        assert_eq!(check.connections(), 3);
    }

    #[test]
    fn test_check_reports_mismatch() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x", "y"]));
        let b = c.leaf(brick("B", &["x"], &[]));
        let root = c.seq(a, b);

        let check = check(c.expr(root), &GenerateOptions::default());
        assert!(!check.is_valid());
        assert_eq!(check.bricks(), 2);
        assert_eq!(check.connections(), 1);

        let summary = check.summary();
        assert!(!summary.valid);
        assert_eq!(summary.diagnostics.error, 1);
        assert_eq!(summary.messages[0].kind, "type_mismatch");
    }

    #[test]
    fn test_check_fatal_counts_nothing() {
        let c = Composition::new();
        let check = check(c.expr(NodeId::from_index(3)), &GenerateOptions::default());
        assert!(!check.is_valid());
        assert_eq!((check.bricks(), check.connections()), (0, 0));
    }

    #[test]
    fn test_duplicate_wire_is_still_valid() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"]));
        let b = c.leaf(brick("B", &[], &["x"]));
        let root = c.par(a, b);

        let strict = GenerateOptions::default().with_unique_wire_names(true);
        let check = check(c.expr(root), &strict);
        assert_eq!(check.diagnostics().len(), 1);
        assert!(check.is_valid());
    }

    #[derive(serde::Deserialize)]
    struct Table {
        nodes: Composition,
    }
}
