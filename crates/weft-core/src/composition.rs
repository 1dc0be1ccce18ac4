//! The composition model: bricks joined by sequential and parallel
//! composition.
//!
//! A [`Composition`] is an arena of [`Node`]s addressed by [`NodeId`].
//! Constructors append a node and hand back its id; composites refer to their
//! children by id, so a sub-expression used twice is stored once and shared.
//! Nothing is type-checked on construction. Validation is a separate pass.
//!
//! # Example
//!
//! ```
//! # use weft_core::composition::{Brick, Composition, Grade};
//! let mut composition = Composition::new();
//! let fetch = composition.leaf(Brick::new("fetch", Grade::Deterministic).with_outputs(&["raw"]));
//! let summarize = composition.leaf(
//!     Brick::new("summarize", Grade::Model)
//!         .with_inputs(&["raw"])
//!         .with_outputs(&["summary"]),
//! );
//! let root = composition.seq(fetch, summarize);
//!
//! let expr = composition.expr(root);
//! assert!(expr.inputs().is_empty());
//! assert_eq!(expr.outputs()[0].to_string(), "summary");
//! assert_eq!(expr.grade(), Grade::Model);
//! ```
//!
//! # Loading tables
//!
//! A composition can also be read from a flat node table, for example TOML,
//! through [`CompositionFile`]. Tables may be malformed: a child index can
//! point past the end or a node can contain itself. Signature accessors stay
//! total on such tables and fall back to an empty signature for the affected
//! nodes; the validator is responsible for reporting them.

mod brick;
mod traverse;

use std::{fmt, sync::OnceLock};

use serde::{Deserialize, Serialize};

pub use brick::{Brick, Grade, InvalidGrade, WireType};
pub use traverse::{NodePath, PostOrder, Step, Visit};

/// Index of a node inside its [`Composition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// Names the node at `index` of a table, which may not exist.
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the composition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Leaf(Brick),
    /// `left ∘ right`: the outputs of `left` feed the inputs of `right`.
    Seq { left: NodeId, right: NodeId },
    /// `left ⊗ right`: side by side, ports concatenated.
    Par { left: NodeId, right: NodeId },
}

impl Node {
    /// Child ids of a composite, `None` for leaves.
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self {
            Self::Leaf(_) => None,
            Self::Seq { left, right } | Self::Par { left, right } => Some((*left, *right)),
        }
    }
}

/// Ports and grade of a node, derived from its subtree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    inputs: Vec<WireType>,
    outputs: Vec<WireType>,
    grade: Grade,
}

static EMPTY_SIGNATURE: Signature = Signature {
    inputs: Vec::new(),
    outputs: Vec::new(),
    grade: Grade::Deterministic,
};

impl Signature {
    fn of_brick(brick: &Brick) -> Self {
        Self {
            inputs: brick.inputs().to_vec(),
            outputs: brick.outputs().to_vec(),
            grade: brick.grade(),
        }
    }

    fn sequential(left: &Self, right: &Self) -> Self {
        Self {
            inputs: left.inputs.clone(),
            outputs: right.outputs.clone(),
            grade: left.grade.max(right.grade),
        }
    }

    fn parallel(left: &Self, right: &Self) -> Self {
        Self {
            inputs: [left.inputs.as_slice(), right.inputs.as_slice()].concat(),
            outputs: [left.outputs.as_slice(), right.outputs.as_slice()].concat(),
            grade: left.grade.max(right.grade),
        }
    }

    pub fn inputs(&self) -> &[WireType] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[WireType] {
        &self.outputs
    }

    pub fn grade(&self) -> Grade {
        self.grade
    }
}

/// Arena of composition nodes.
///
/// Signatures are computed on first request and cached per node; the tree is
/// never mutated after a node is added, so cached values stay valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Vec<Node>")]
pub struct Composition {
    nodes: Vec<Node>,
    signatures: Vec<OnceLock<Signature>>,
}

impl Composition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a leaf.
    pub fn leaf(&mut self, brick: Brick) -> NodeId {
        self.push(Node::Leaf(brick))
    }

    /// Appends `left ∘ right`.
    pub fn seq(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.push(Node::Seq { left, right })
    }

    /// Appends `left ⊗ right`.
    pub fn par(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.push(Node::Par { left, right })
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.signatures.push(OnceLock::new());
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Returns a handle for the sub-expression rooted at `id`.
    pub fn expr(&self, id: NodeId) -> Expr<'_> {
        Expr {
            composition: self,
            id,
        }
    }

    fn signature(&self, id: NodeId) -> &Signature {
        let Some(cell) = self.signatures.get(id.0) else {
            return &EMPTY_SIGNATURE;
        };
        if let Some(signature) = cell.get() {
            return signature;
        }
        self.fill_signatures(id);
        cell.get().unwrap_or(&EMPTY_SIGNATURE)
    }

    /// Computes every missing signature below `root`, children first.
    ///
    /// A node met again while its own children are still pending lies on a
    /// cycle and gets the empty signature.
    fn fill_signatures(&self, root: NodeId) {
        let mut pending = vec![false; self.nodes.len()];
        let mut stack = vec![(root, false)];

        while let Some((id, expanded)) = stack.pop() {
            let (Some(node), Some(cell)) = (self.nodes.get(id.0), self.signatures.get(id.0))
            else {
                continue;
            };
            if cell.get().is_some() {
                continue;
            }

            match node {
                Node::Leaf(brick) => {
                    let _ = cell.set(Signature::of_brick(brick));
                }
                Node::Seq { left, right } | Node::Par { left, right } if expanded => {
                    pending[id.0] = false;
                    let left = self.settled(*left);
                    let right = self.settled(*right);
                    let signature = match node {
                        Node::Seq { .. } => Signature::sequential(left, right),
                        _ => Signature::parallel(left, right),
                    };
                    let _ = cell.set(signature);
                }
                Node::Seq { left, right } | Node::Par { left, right } => {
                    if pending[id.0] {
                        let _ = cell.set(Signature::default());
                        continue;
                    }
                    pending[id.0] = true;
                    stack.push((id, true));
                    stack.push((*right, false));
                    stack.push((*left, false));
                }
            }
        }
    }

    fn settled(&self, id: NodeId) -> &Signature {
        self.signatures
            .get(id.0)
            .and_then(OnceLock::get)
            .unwrap_or(&EMPTY_SIGNATURE)
    }
}

impl From<Vec<Node>> for Composition {
    fn from(nodes: Vec<Node>) -> Self {
        let signatures = nodes.iter().map(|_| OnceLock::new()).collect();
        Self { nodes, signatures }
    }
}

/// The shape of a composition table on disk.
///
/// ```toml
/// title = "Fetch and summarize"
/// root = 2
///
/// [[nodes]]
/// kind = "leaf"
/// name = "fetch"
/// outputs = ["raw"]
///
/// [[nodes]]
/// kind = "leaf"
/// name = "summarize"
/// inputs = ["raw"]
/// outputs = ["summary"]
/// grade = 1
///
/// [[nodes]]
/// kind = "seq"
/// left = 0
/// right = 1
/// ```
#[derive(Debug, Deserialize)]
pub struct CompositionFile {
    #[serde(default)]
    pub title: Option<String>,
    pub root: NodeId,
    pub nodes: Composition,
}

/// Shape of an expression as seen through an [`Expr`] handle.
#[derive(Debug, Clone, Copy)]
pub enum ExprKind<'a> {
    Leaf(&'a Brick),
    Seq(Expr<'a>, Expr<'a>),
    Par(Expr<'a>, Expr<'a>),
    /// The id does not name a node of the composition.
    Dangling,
}

/// A borrowed view of one node and the subtree below it.
#[derive(Debug, Clone, Copy)]
pub struct Expr<'a> {
    composition: &'a Composition,
    id: NodeId,
}

impl<'a> Expr<'a> {
    pub fn id(self) -> NodeId {
        self.id
    }

    pub fn composition(self) -> &'a Composition {
        self.composition
    }

    pub fn kind(self) -> ExprKind<'a> {
        match self.composition.node(self.id) {
            Some(Node::Leaf(brick)) => ExprKind::Leaf(brick),
            Some(Node::Seq { left, right }) => {
                ExprKind::Seq(self.composition.expr(*left), self.composition.expr(*right))
            }
            Some(Node::Par { left, right }) => {
                ExprKind::Par(self.composition.expr(*left), self.composition.expr(*right))
            }
            None => ExprKind::Dangling,
        }
    }

    /// The brick if this is a leaf.
    pub fn brick(self) -> Option<&'a Brick> {
        match self.composition.node(self.id) {
            Some(Node::Leaf(brick)) => Some(brick),
            _ => None,
        }
    }

    pub fn inputs(self) -> &'a [WireType] {
        self.composition.signature(self.id).inputs()
    }

    pub fn outputs(self) -> &'a [WireType] {
        self.composition.signature(self.id).outputs()
    }

    pub fn grade(self) -> Grade {
        self.composition.signature(self.id).grade()
    }

    /// Post-order walk over every occurrence below this node.
    pub fn post_order(self, max_depth: usize) -> PostOrder<'a> {
        PostOrder::new(self.composition, self.id, max_depth)
    }
}
