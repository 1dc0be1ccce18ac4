//! Iterative traversal over a composition tree.
//!
//! Compositions can nest deeply, so every walk uses an explicit stack
//! instead of recursion. [`PostOrder`] visits children before their parent,
//! left before right, and carries the [`NodePath`] of each visit so later
//! stages can report where a problem sits in the tree.

use std::{collections::HashSet, fmt};

use super::{Composition, Expr, Node, NodeId};

/// One step down the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Left,
    Right,
}

/// Position of an occurrence, written `root.left.right`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath {
    steps: Vec<Step>,
}

impl NodePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns the path one step further down.
    pub fn child(&self, step: Step) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(step);
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps from the root.
    pub fn depth(&self) -> usize {
        self.steps.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "root")?;
        for step in &self.steps {
            match step {
                Step::Left => write!(f, ".left")?,
                Step::Right => write!(f, ".right")?,
            }
        }
        Ok(())
    }
}

/// A node reached by a traversal, together with where it was reached.
#[derive(Debug, Clone)]
pub struct Visit<'a> {
    expr: Expr<'a>,
    path: NodePath,
}

impl<'a> Visit<'a> {
    pub fn expr(&self) -> Expr<'a> {
        self.expr
    }

    pub fn id(&self) -> NodeId {
        self.expr.id()
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    pub fn depth(&self) -> usize {
        self.path.depth()
    }

    pub fn into_path(self) -> NodePath {
        self.path
    }
}

struct Frame {
    id: NodeId,
    path: NodePath,
    expanded: bool,
}

/// Post-order iterator over the occurrences below a root.
///
/// A node shared by several parents is visited once per occurrence unless
/// the traversal was created with [`PostOrder::unique`]. Composite nodes
/// deeper than the depth limit are still yielded but their children are not
/// walked; [`PostOrder::truncated`] reports whether that happened. The limit
/// also bounds walks over cyclic tables, which never terminate otherwise.
pub struct PostOrder<'a> {
    composition: &'a Composition,
    stack: Vec<Frame>,
    seen: Option<HashSet<NodeId>>,
    max_depth: usize,
    truncated: bool,
}

impl<'a> PostOrder<'a> {
    /// Visits every occurrence below `root`.
    pub fn new(composition: &'a Composition, root: NodeId, max_depth: usize) -> Self {
        Self {
            composition,
            stack: vec![Frame {
                id: root,
                path: NodePath::root(),
                expanded: false,
            }],
            seen: None,
            max_depth,
            truncated: false,
        }
    }

    /// Visits each distinct node once, at its first occurrence in
    /// left-to-right order.
    pub fn unique(composition: &'a Composition, root: NodeId, max_depth: usize) -> Self {
        let mut walk = Self::new(composition, root, max_depth);
        walk.seen = Some(HashSet::from([root]));
        walk
    }

    /// Returns `true` once a node beyond the depth limit was skipped.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    fn first_visit(&mut self, child: NodeId) -> bool {
        match &mut self.seen {
            Some(seen) => seen.insert(child),
            None => true,
        }
    }
}

impl<'a> Iterator for PostOrder<'a> {
    type Item = Visit<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            let children = match self.composition.node(frame.id) {
                Some(Node::Seq { left, right } | Node::Par { left, right }) if !frame.expanded => {
                    Some((*left, *right))
                }
                _ => None,
            };

            let Some((left, right)) = children else {
                return Some(Visit {
                    expr: self.composition.expr(frame.id),
                    path: frame.path,
                });
            };

            if frame.path.depth() >= self.max_depth {
                self.truncated = true;
                return Some(Visit {
                    expr: self.composition.expr(frame.id),
                    path: frame.path,
                });
            }

            let left_path = frame.path.child(Step::Left);
            let right_path = frame.path.child(Step::Right);
            self.stack.push(Frame {
                expanded: true,
                ..frame
            });
            // Children are pushed right first so the left subtree is walked first.
            let visit_left = self.first_visit(left);
            let visit_right = self.first_visit(right);
            if visit_right {
                self.stack.push(Frame {
                    id: right,
                    path: right_path,
                    expanded: false,
                });
            }
            if visit_left {
                self.stack.push(Frame {
                    id: left,
                    path: left_path,
                    expanded: false,
                });
            }
        }
        None
    }
}
