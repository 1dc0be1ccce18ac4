//! Rank/track layout of a composition.
//!
//! Every brick occurrence is placed on a grid: the rank is its sequential
//! stage counted from the left, the track its row counted from the top.
//!
//! ```text
//!            rank 0        rank 1
//!          ┌────────┐    ┌────────┐
//! track 0  │ fetch  ├────┤        │
//!          └────────┘    │ merge  │
//!          ┌────────┐    │        │
//! track 1  │ load   ├────┤        │
//!          └────────┘    └────────┘
//! ```
//!
//! `seq(a, b)` places `b` in the ranks after `a`; `par(a, b)` places `b` in
//! the tracks below `a`. A brick stretches over every track of the slot it
//! was given, so `merge` above covers both tracks. Placement is a single
//! pass: nothing is moved once it has a rank and a track.
//!
//! Shared nodes are laid out once per occurrence. Callers are expected to
//! validate first; the size of the result is the number of occurrences.

use log::{debug, trace};

use weft_core::{
    composition::{Brick, Composition, Expr, Grade, Node, NodeId, WireType},
    draw::TextDefinition,
    geometry::{Bounds, Point, Size},
};

use crate::config::LayoutConfig;

/// Horizontal room left around a label inside its box.
const LABEL_PADDING: f32 = 12.0;

/// A port on the edge of a box.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    tag: WireType,
    position: Point,
}

impl Port {
    pub fn tag(&self) -> WireType {
        self.tag
    }

    pub fn position(&self) -> Point {
        self.position
    }
}

/// Reference to one port of one [`LayoutNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    /// Index into [`Layout::nodes`].
    pub node: usize,
    /// Index into the node's inputs or outputs, depending on context.
    pub index: usize,
}

/// A placed brick occurrence.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    node: NodeId,
    label: String,
    grade: Grade,
    rank: usize,
    track: usize,
    track_span: usize,
    bounds: Bounds,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
}

impl LayoutNode {
    /// The composition node this is an occurrence of.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn grade(&self) -> Grade {
        self.grade
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// The first track the box covers.
    pub fn track(&self) -> usize {
        self.track
    }

    /// Number of tracks the box covers.
    pub fn track_span(&self) -> usize {
        self.track_span
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }
}

/// A sequential boundary: the outputs of the left operand meet the inputs
/// of the right operand at the start of `rank`.
#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    node: NodeId,
    rank: usize,
    outputs: Vec<PortRef>,
    inputs: Vec<PortRef>,
}

impl Junction {
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Rank of the right operand's first column.
    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn outputs(&self) -> &[PortRef] {
        &self.outputs
    }

    pub fn inputs(&self) -> &[PortRef] {
        &self.inputs
    }
}

/// Horizontal extent of one rank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankColumn {
    x: f32,
    width: f32,
}

impl RankColumn {
    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }
}

/// The placed occurrences of a composition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    nodes: Vec<LayoutNode>,
    junctions: Vec<Junction>,
    inputs: Vec<PortRef>,
    outputs: Vec<PortRef>,
    columns: Vec<RankColumn>,
    track_count: usize,
    size: Size,
    padding: f32,
    font_size: u16,
    first_ranks: Vec<Option<usize>>,
}

impl Layout {
    /// Placed occurrences, left subtree before right subtree.
    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn junctions(&self) -> &[Junction] {
        &self.junctions
    }

    /// Open input ports of the whole composition.
    pub fn inputs(&self) -> &[PortRef] {
        &self.inputs
    }

    /// Open output ports of the whole composition.
    pub fn outputs(&self) -> &[PortRef] {
        &self.outputs
    }

    pub fn columns(&self) -> &[RankColumn] {
        &self.columns
    }

    pub fn rank_count(&self) -> usize {
        self.columns.len()
    }

    pub fn track_count(&self) -> usize {
        self.track_count
    }

    /// Canvas size, margins included.
    pub fn size(&self) -> Size {
        self.size
    }

    /// Font size the label widths were estimated with.
    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    /// Rank of the first occurrence of `node`, composites included.
    ///
    /// For a sequential composition this is the rank of its left operand;
    /// see [`Junction::rank`] for the rank its wires enter.
    pub fn first_rank(&self, node: NodeId) -> Option<usize> {
        self.first_ranks.get(node.index()).copied().flatten()
    }

    /// x of the canvas edge where boundary inputs enter.
    pub fn left_edge(&self) -> f32 {
        self.padding
    }

    /// x of the canvas edge where boundary outputs leave.
    pub fn right_edge(&self) -> f32 {
        self.size.width() - self.padding
    }

    /// Horizontal extent of the gap in front of `rank`.
    pub fn gap_before(&self, rank: usize) -> Option<(f32, f32)> {
        let after = self.columns.get(rank)?;
        let before = self.columns.get(rank.checked_sub(1)?)?;
        Some((before.right(), after.x()))
    }

    pub fn output_port(&self, port: PortRef) -> Option<&Port> {
        self.nodes.get(port.node)?.outputs.get(port.index)
    }

    pub fn input_port(&self, port: PortRef) -> Option<&Port> {
        self.nodes.get(port.node)?.inputs.get(port.index)
    }
}

/// Grid extent of a subtree: ranks wide, tracks tall.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Extent {
    pub(crate) span: usize,
    pub(crate) height: usize,
}

/// A brick occurrence before geometry is known.
struct Placement<'a> {
    node: NodeId,
    brick: &'a Brick,
    rank: usize,
    track: usize,
    slot: usize,
}

#[derive(Default)]
struct Boundary {
    inputs: Vec<PortRef>,
    outputs: Vec<PortRef>,
}

enum Frame {
    Enter {
        id: NodeId,
        rank: usize,
        track: usize,
        slot: usize,
        depth: usize,
    },
    ExitSeq {
        id: NodeId,
        rank: usize,
    },
    ExitPar,
}

/// Lays out `expr` on the rank/track grid.
pub fn layout(expr: Expr<'_>, config: &LayoutConfig) -> Layout {
    let composition = expr.composition();
    let extents = extents(composition, expr.id());
    let root = extents.get(expr.id().index()).copied().unwrap_or_default();
    debug!(ranks = root.span, tracks = root.height; "Computed extents");

    let mut placements: Vec<Placement<'_>> = Vec::new();
    let mut junctions = Vec::new();
    let mut boundaries: Vec<Boundary> = Vec::new();
    let mut first_ranks = vec![None; composition.len()];
    let mut stack = vec![Frame::Enter {
        id: expr.id(),
        rank: 0,
        track: 0,
        slot: root.height,
        depth: 0,
    }];

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Enter {
                id,
                rank,
                track,
                slot,
                depth,
            } => {
                // A path longer than the table revisits a node, so the table is cyclic.
                if depth > composition.len() {
                    boundaries.push(Boundary::default());
                    continue;
                }
                if let Some(first) = first_ranks.get_mut(id.index()) {
                    first.get_or_insert(rank);
                }
                match composition.node(id) {
                    Some(Node::Leaf(brick)) => {
                        let index = placements.len();
                        placements.push(Placement {
                            node: id,
                            brick,
                            rank,
                            track,
                            slot,
                        });
                        boundaries.push(Boundary {
                            inputs: port_refs(index, brick.inputs().len()),
                            outputs: port_refs(index, brick.outputs().len()),
                        });
                    }
                    Some(Node::Seq { left, right }) => {
                        let left_span = extent_of(&extents, *left).span;
                        stack.push(Frame::ExitSeq {
                            id,
                            rank: rank + left_span,
                        });
                        stack.push(Frame::Enter {
                            id: *right,
                            rank: rank + left_span,
                            track,
                            slot,
                            depth: depth + 1,
                        });
                        stack.push(Frame::Enter {
                            id: *left,
                            rank,
                            track,
                            slot,
                            depth: depth + 1,
                        });
                    }
                    Some(Node::Par { left, right }) => {
                        let left_height = extent_of(&extents, *left).height;
                        stack.push(Frame::ExitPar);
                        stack.push(Frame::Enter {
                            id: *right,
                            rank,
                            track: track + left_height,
                            slot: slot.saturating_sub(left_height),
                            depth: depth + 1,
                        });
                        stack.push(Frame::Enter {
                            id: *left,
                            rank,
                            track,
                            slot: left_height,
                            depth: depth + 1,
                        });
                    }
                    None => boundaries.push(Boundary::default()),
                }
            }
            Frame::ExitSeq { id, rank } => {
                let right = boundaries.pop().unwrap_or_default();
                let left = boundaries.pop().unwrap_or_default();
                junctions.push(Junction {
                    node: id,
                    rank,
                    outputs: left.outputs,
                    inputs: right.inputs,
                });
                boundaries.push(Boundary {
                    inputs: left.inputs,
                    outputs: right.outputs,
                });
            }
            Frame::ExitPar => {
                let right = boundaries.pop().unwrap_or_default();
                let mut left = boundaries.pop().unwrap_or_default();
                left.inputs.extend(right.inputs);
                left.outputs.extend(right.outputs);
                boundaries.push(left);
            }
        }
    }

    let boundary = boundaries.pop().unwrap_or_default();
    let layout = place(
        placements,
        junctions,
        boundary,
        first_ranks,
        root.span,
        root.height,
        config,
    );

    debug!(
        nodes = layout.nodes.len(),
        junctions = layout.junctions.len(),
        width = layout.size.width(),
        height = layout.size.height();
        "Layout completed"
    );
    layout
}

fn port_refs(node: usize, count: usize) -> Vec<PortRef> {
    (0..count).map(|index| PortRef { node, index }).collect()
}

pub(crate) fn extent_of(extents: &[Extent], id: NodeId) -> Extent {
    extents.get(id.index()).copied().unwrap_or_default()
}

/// Span and height of every node below `root`, children first.
///
/// `span(leaf) = 1`, `span(seq) = a + b`, `span(par) = max(a, b)`;
/// heights swap the two rules. Nodes on a cycle keep a zero extent.
pub(crate) fn extents(composition: &Composition, root: NodeId) -> Vec<Extent> {
    let mut extents = vec![Extent::default(); composition.len()];
    let mut done = vec![false; composition.len()];
    let mut pending = vec![false; composition.len()];
    let mut stack = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        let Some(node) = composition.node(id) else {
            continue;
        };
        if done[id.index()] {
            continue;
        }
        match node {
            Node::Leaf(_) => {
                extents[id.index()] = Extent { span: 1, height: 1 };
                done[id.index()] = true;
            }
            Node::Seq { left, right } | Node::Par { left, right } if expanded => {
                let (l, r) = (extent_of(&extents, *left), extent_of(&extents, *right));
                extents[id.index()] = match node {
                    Node::Seq { .. } => Extent {
                        span: l.span + r.span,
                        height: l.height.max(r.height),
                    },
                    _ => Extent {
                        span: l.span.max(r.span),
                        height: l.height + r.height,
                    },
                };
                done[id.index()] = true;
            }
            Node::Seq { left, right } | Node::Par { left, right } => {
                if pending[id.index()] {
                    done[id.index()] = true;
                    continue;
                }
                pending[id.index()] = true;
                stack.push((id, true));
                stack.push((*right, false));
                stack.push((*left, false));
            }
        }
    }
    extents
}

/// Turns grid positions into coordinates.
fn place(
    placements: Vec<Placement<'_>>,
    junctions: Vec<Junction>,
    boundary: Boundary,
    first_ranks: Vec<Option<usize>>,
    rank_count: usize,
    track_count: usize,
    config: &LayoutConfig,
) -> Layout {
    let mut text = TextDefinition::new();
    text.set_font_size(config.font_size());

    let mut widths = vec![config.min_box_width(); rank_count];
    let mut row_height = config.min_box_height();
    for placement in &placements {
        let label = placement.brick.display_label();
        let wanted = text.estimate_size(&label).width() + 2.0 * LABEL_PADDING;
        if let Some(width) = widths.get_mut(placement.rank) {
            *width = width.max(wanted);
        }
        let ports = placement
            .brick
            .inputs()
            .len()
            .max(placement.brick.outputs().len());
        row_height = row_height.max((ports + 1) as f32 * config.port_spacing());
    }

    let stub = config.rank_gap() / 2.0;
    let mut columns = Vec::with_capacity(rank_count);
    let mut x = config.padding() + stub;
    for width in widths {
        columns.push(RankColumn { x, width });
        x += width + config.rank_gap();
    }
    let content_right = columns.last().map_or(x, RankColumn::right);

    let pitch = row_height + config.track_gap();
    let top = config.padding();
    let content_height = (track_count as f32 * pitch - config.track_gap()).max(0.0);
    let size = Size::new(
        content_right + stub + config.padding(),
        content_height + 2.0 * config.padding(),
    );

    let nodes = placements
        .into_iter()
        .map(|placement| {
            let column = columns
                .get(placement.rank)
                .copied()
                .unwrap_or(RankColumn { x: 0.0, width: 0.0 });
            let slot = placement.slot.max(1);
            let bounds = Bounds::new_from_top_left(
                Point::new(column.x(), top + placement.track as f32 * pitch),
                Size::new(column.width(), slot as f32 * pitch - config.track_gap()),
            );
            trace!(
                brick:% = placement.brick.name(),
                rank = placement.rank,
                track = placement.track,
                span = slot;
                "Placed brick"
            );
            LayoutNode {
                node: placement.node,
                label: placement.brick.display_label(),
                grade: placement.brick.grade(),
                rank: placement.rank,
                track: placement.track,
                track_span: slot,
                inputs: spread_ports(placement.brick.inputs(), bounds, bounds.min_x()),
                outputs: spread_ports(placement.brick.outputs(), bounds, bounds.max_x()),
                bounds,
            }
        })
        .collect();

    Layout {
        nodes,
        junctions,
        inputs: boundary.inputs,
        outputs: boundary.outputs,
        columns,
        track_count,
        size,
        padding: config.padding(),
        font_size: config.font_size(),
        first_ranks,
    }
}

/// Spaces ports evenly along the vertical extent of `bounds`.
fn spread_ports(tags: &[WireType], bounds: Bounds, x: f32) -> Vec<Port> {
    let step = bounds.height() / (tags.len() + 1) as f32;
    tags.iter()
        .enumerate()
        .map(|(i, tag)| Port {
            tag: *tag,
            position: Point::new(x, bounds.min_y() + (i + 1) as f32 * step),
        })
        .collect()
}
