//! Wire routing and crossing detection.
//!
//! Wires connect the outputs of the left operand of every sequential
//! composition to the inputs of its right operand, position by position.
//! A wire whose ends are level is a straight segment. Any other wire runs
//! horizontally to a vertical lane inside the gap in front of its target
//! rank, jogs there, and continues horizontally:
//!
//! ```text
//!   src ────────┐
//!               │ lane
//!               └──────── dst
//! ```
//!
//! Each jogging wire owns its own lane. With [`CrossingPolicy::Minimize`]
//! neighbouring lanes are swapped greedily while a swap strictly reduces the
//! conflicts involving the two wires. A conflict is a crossing or a stretch
//! where two horizontal runs lie on top of each other. This is a local heuristic and finds
//! no global optimum. When a swap does not help, the original order stays;
//! that order is ascending source y, then target y.
//!
//! Conflicts are detected after routing and recorded on both wires: strict
//! segment intersections as [`CrossingKind::Cross`], shared collinear
//! stretches as [`CrossingKind::Overlap`].

use std::{collections::BTreeSet, fmt, str::FromStr};

use indexmap::IndexMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use weft_core::{
    composition::{Grade, WireType},
    geometry::{Point, Segment},
};

use crate::{
    diagnostic::{Diagnostic, DiagnosticKind},
    layout::{Layout, PortRef},
};

/// Ends closer than this are treated as level.
const LEVEL_TOLERANCE: f32 = 0.01;

/// How lanes are assigned inside a rank gap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossingPolicy {
    /// Swap neighbouring lanes while that removes crossings.
    #[default]
    Minimize,
    /// Keep lanes in their original order.
    Ignore,
}

impl fmt::Display for CrossingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minimize => write!(f, "minimize"),
            Self::Ignore => write!(f, "ignore"),
        }
    }
}

impl FromStr for CrossingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimize" => Ok(Self::Minimize),
            "ignore" => Ok(Self::Ignore),
            _ => Err(format!("unknown crossing policy `{s}`")),
        }
    }
}

/// Identifier of a routed wire, unique within one [`Routing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WireId(usize);

impl WireId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// One end of a wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireEnd {
    /// A port of a placed brick.
    Port(PortRef),
    /// The canvas edge, for the composition's own open ports. The value is
    /// the position in the composition's input or output list.
    Boundary(usize),
}

/// A wire with its polyline.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedWire {
    id: WireId,
    from: WireEnd,
    to: WireEnd,
    tag: WireType,
    grade: Grade,
    mismatched: bool,
    path: Vec<Point>,
    crosses: BTreeSet<WireId>,
}

impl RoutedWire {
    pub fn id(&self) -> WireId {
        self.id
    }

    pub fn from_port(&self) -> WireEnd {
        self.from
    }

    pub fn to_port(&self) -> WireEnd {
        self.to
    }

    /// The wire type at the source port.
    pub fn tag(&self) -> WireType {
        self.tag
    }

    /// Grade of the brick driving the wire; boundary inputs are grade 0.
    pub fn grade(&self) -> Grade {
        self.grade
    }

    /// `true` when the two ends carry different wire types.
    pub fn is_mismatched(&self) -> bool {
        self.mismatched
    }

    pub fn path(&self) -> &[Point] {
        &self.path
    }

    /// Other wires this one crosses.
    pub fn crosses(&self) -> &BTreeSet<WireId> {
        &self.crosses
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.path
            .windows(2)
            .map(|pair| Segment::new(pair[0], pair[1]))
    }

    pub fn is_straight(&self) -> bool {
        self.path.len() == 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossingKind {
    /// The wires pass through each other.
    Cross,
    /// The wires share a collinear stretch and draw as one line there.
    Overlap,
}

/// A point where two wires cross or run together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    first: WireId,
    second: WireId,
    at: Point,
    kind: CrossingKind,
}

impl Crossing {
    pub fn wires(&self) -> (WireId, WireId) {
        (self.first, self.second)
    }

    /// The intersection, or the middle of the shared stretch.
    pub fn at(&self) -> Point {
        self.at
    }

    pub fn kind(&self) -> CrossingKind {
        self.kind
    }
}

/// Routed wires plus what was found while routing them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Routing {
    wires: Vec<RoutedWire>,
    crossings: Vec<Crossing>,
    diagnostics: Vec<Diagnostic>,
}

impl Routing {
    pub fn wires(&self) -> &[RoutedWire] {
        &self.wires
    }

    pub fn crossings(&self) -> &[Crossing] {
        &self.crossings
    }

    /// One `CrossingDetected` or `WiresOverlap` per crossing.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (Vec<RoutedWire>, Vec<Crossing>, Vec<Diagnostic>) {
        (self.wires, self.crossings, self.diagnostics)
    }
}

/// A jogging wire waiting for its lane.
struct Jog {
    wire: usize,
    source: Point,
    target: Point,
}

/// Routes every wire of `layout`.
///
/// The junctions recorded by the layout are the sequential compositions of
/// the expression, so the layout is all the router needs.
pub fn route(layout: &Layout, policy: CrossingPolicy) -> Routing {
    let mut wires = Vec::new();
    let mut gaps: IndexMap<usize, Vec<Jog>> = IndexMap::new();

    for (position, port_ref) in layout.inputs().iter().enumerate() {
        let Some(port) = layout.input_port(*port_ref) else {
            continue;
        };
        let target = port.position();
        wires.push(RoutedWire {
            id: WireId(wires.len()),
            from: WireEnd::Boundary(position),
            to: WireEnd::Port(*port_ref),
            tag: port.tag(),
            grade: Grade::Deterministic,
            mismatched: false,
            path: vec![Point::new(layout.left_edge(), target.y()), target],
            crosses: BTreeSet::new(),
        });
    }

    for junction in layout.junctions() {
        for (from, to) in junction.outputs().iter().zip(junction.inputs()) {
            let (Some(source), Some(target)) = (layout.output_port(*from), layout.input_port(*to))
            else {
                continue;
            };
            let grade = source_grade(layout, *from);
            let index = wires.len();
            let (start, end) = (source.position(), target.position());
            let path = if (start.y() - end.y()).abs() < LEVEL_TOLERANCE {
                vec![start, end.with_y(start.y())]
            } else {
                gaps.entry(junction.rank()).or_default().push(Jog {
                    wire: index,
                    source: start,
                    target: end,
                });
                Vec::new()
            };
            wires.push(RoutedWire {
                id: WireId(index),
                from: WireEnd::Port(*from),
                to: WireEnd::Port(*to),
                tag: source.tag(),
                grade,
                mismatched: source.tag() != target.tag(),
                path,
                crosses: BTreeSet::new(),
            });
        }
    }

    for (position, port_ref) in layout.outputs().iter().enumerate() {
        let Some(port) = layout.output_port(*port_ref) else {
            continue;
        };
        let source = port.position();
        wires.push(RoutedWire {
            id: WireId(wires.len()),
            from: WireEnd::Port(*port_ref),
            to: WireEnd::Boundary(position),
            tag: port.tag(),
            grade: source_grade(layout, *port_ref),
            mismatched: false,
            path: vec![source, Point::new(layout.right_edge(), source.y())],
            crosses: BTreeSet::new(),
        });
    }

    for (rank, mut jogs) in gaps {
        let Some((start, end)) = layout.gap_before(rank) else {
            continue;
        };
        jogs.sort_by(|a, b| {
            a.source
                .y()
                .total_cmp(&b.source.y())
                .then(a.target.y().total_cmp(&b.target.y()))
                .then(a.wire.cmp(&b.wire))
        });
        let step = (end - start) / (jogs.len() + 1) as f32;
        let lanes: Vec<f32> = (0..jogs.len())
            .map(|i| start + (i + 1) as f32 * step)
            .collect();
        for (jog, lane) in jogs.iter().zip(&lanes) {
            wires[jog.wire].path = jog_path(jog, *lane);
        }
        if policy == CrossingPolicy::Minimize {
            minimize_gap(&mut wires, &mut jogs, &lanes);
        }
        trace!(rank, lanes = jogs.len(); "Assigned lanes");
    }

    let crossings = detect_crossings(&mut wires);
    let diagnostics = crossings
        .iter()
        .map(|crossing| {
            let (first, second, at) = (crossing.first, crossing.second, crossing.at);
            let kind = match crossing.kind {
                CrossingKind::Cross => DiagnosticKind::CrossingDetected { first, second, at },
                CrossingKind::Overlap => DiagnosticKind::WiresOverlap { first, second, at },
            };
            Diagnostic::new(kind).with_rank(rank_at(layout, at.x()))
        })
        .collect();

    debug!(
        wires = wires.len(),
        crossings = crossings.len(),
        policy:%;
        "Routing completed"
    );
    Routing {
        wires,
        crossings,
        diagnostics,
    }
}

fn source_grade(layout: &Layout, port: PortRef) -> Grade {
    layout
        .nodes()
        .get(port.node)
        .map_or(Grade::Deterministic, |node| node.grade())
}

fn jog_path(jog: &Jog, lane: f32) -> Vec<Point> {
    vec![
        jog.source,
        Point::new(lane, jog.source.y()),
        Point::new(lane, jog.target.y()),
        jog.target,
    ]
}

/// Greedy passes over neighbouring lanes of one gap.
///
/// `jogs` is in lane order and stays in lane order.
fn minimize_gap(wires: &mut [RoutedWire], jogs: &mut [Jog], lanes: &[f32]) {
    if jogs.len() < 2 {
        return;
    }
    for _ in 0..jogs.len() {
        let mut improved = false;
        for i in 0..jogs.len() - 1 {
            let (a, b) = (jogs[i].wire, jogs[i + 1].wire);
            let before = conflicts_involving(wires, a, b);
            wires[a].path = jog_path(&jogs[i], lanes[i + 1]);
            wires[b].path = jog_path(&jogs[i + 1], lanes[i]);
            let after = conflicts_involving(wires, a, b);
            if after < before {
                jogs.swap(i, i + 1);
                improved = true;
            } else {
                wires[a].path = jog_path(&jogs[i], lanes[i]);
                wires[b].path = jog_path(&jogs[i + 1], lanes[i + 1]);
            }
        }
        if !improved {
            break;
        }
    }
}

/// Conflicts of `a` or `b` with any wire, their mutual ones counted once.
fn conflicts_involving(wires: &[RoutedWire], a: usize, b: usize) -> usize {
    let mut count = conflicts(&wires[a], &wires[b]).count();
    for (index, other) in wires.iter().enumerate() {
        if index == a || index == b {
            continue;
        }
        count += conflicts(&wires[a], other).count() + conflicts(&wires[b], other).count();
    }
    count
}

/// Every segment pair of the two wires that crosses or overlaps.
fn conflicts<'a>(
    first: &'a RoutedWire,
    second: &'a RoutedWire,
) -> impl Iterator<Item = (Point, CrossingKind)> + 'a {
    first.segments().flat_map(move |s| {
        second.segments().filter_map(move |t| {
            s.crossing(t)
                .map(|at| (at, CrossingKind::Cross))
                .or_else(|| s.overlap(t).map(|at| (at, CrossingKind::Overlap)))
        })
    })
}

fn detect_crossings(wires: &mut [RoutedWire]) -> Vec<Crossing> {
    let mut crossings = Vec::new();
    for i in 0..wires.len() {
        for j in i + 1..wires.len() {
            crossings.extend(conflicts(&wires[i], &wires[j]).map(|(at, kind)| Crossing {
                first: wires[i].id,
                second: wires[j].id,
                at,
                kind,
            }));
        }
    }
    for crossing in &crossings {
        wires[crossing.first.0].crosses.insert(crossing.second);
        wires[crossing.second.0].crosses.insert(crossing.first);
    }
    crossings
}

/// The rank whose column, or the gap in front of it, contains `x`.
fn rank_at(layout: &Layout, x: f32) -> usize {
    layout
        .columns()
        .iter()
        .position(|column| x <= column.right())
        .unwrap_or_else(|| layout.rank_count().saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use weft_core::composition::{Composition, NodeId};

    use crate::{config::LayoutConfig, layout::layout, testing::arb_composition, testing::brick};

    fn routed(composition: &Composition, root: NodeId, policy: CrossingPolicy) -> Routing {
        let layout = layout(composition.expr(root), &LayoutConfig::default());
        route(&layout, policy)
    }

    /// Two downward wires whose spans overlap; ascending lanes cross twice.
    fn overlapping_descent() -> (Composition, NodeId) {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"], 0));
        let b = c.leaf(brick("B", &[], &["y"], 1));
        let d = c.leaf(brick("D", &[], &[], 0));
        let e = c.leaf(brick("E", &[], &[], 0));
        let f = c.leaf(brick("F", &["x", "y"], &[], 0));
        let bd = c.par(b, d);
        let left = c.par(a, bd);
        let right = c.par(e, f);
        let root = c.seq(left, right);
        (c, root)
    }

    #[test]
    fn test_single_straight_wire() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"], 0));
        let b = c.leaf(brick("B", &["x"], &[], 0));
        let root = c.seq(a, b);

        let routing = routed(&c, root, CrossingPolicy::Minimize);
        assert_eq!(routing.wires().len(), 1);
        let wire = &routing.wires()[0];
        assert!(wire.is_straight());
        assert!(!wire.is_mismatched());
        assert_eq!(wire.from_port(), WireEnd::Port(PortRef { node: 0, index: 0 }));
        assert_eq!(wire.to_port(), WireEnd::Port(PortRef { node: 1, index: 0 }));
        assert!(routing.crossings().is_empty());
    }

    #[test]
    fn test_boundary_stubs() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &["in"], &["out", "log"], 0));

        let routing = routed(&c, a, CrossingPolicy::Minimize);
        assert_eq!(routing.wires().len(), 3);
        assert_eq!(routing.wires()[0].from_port(), WireEnd::Boundary(0));
        assert_eq!(routing.wires()[2].to_port(), WireEnd::Boundary(1));
        assert!(routing.wires().iter().all(RoutedWire::is_straight));
    }

    #[test]
    fn test_mismatched_pairs_are_flagged() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x", "z"], 0));
        let b = c.leaf(brick("B", &["y"], &[], 0));
        let root = c.seq(a, b);

        let routing = routed(&c, root, CrossingPolicy::Minimize);
        let internal: Vec<_> = routing
            .wires()
            .iter()
            .filter(|wire| matches!(wire.to_port(), WireEnd::Port(_)))
            .collect();
        assert_eq!(internal.len(), 1);
        assert!(internal[0].is_mismatched());
    }

    #[test]
    fn test_jogging_wire_has_three_segments() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"], 0));
        let b = c.leaf(brick("B", &[], &["y"], 0));
        let merge = c.leaf(brick("Merge", &["x", "y"], &[], 0));
        let both = c.par(a, b);
        let root = c.seq(both, merge);

        let routing = routed(&c, root, CrossingPolicy::Minimize);
        assert_eq!(routing.wires().len(), 2);
        for wire in routing.wires() {
            assert_eq!(wire.segments().count(), 3);
        }
        let lanes: BTreeSet<u32> = routing
            .wires()
            .iter()
            .map(|wire| wire.path()[1].x().to_bits())
            .collect();
        assert_eq!(lanes.len(), 2);
    }

    #[test]
    fn test_ignore_keeps_original_lanes() {
        let (c, root) = overlapping_descent();
        let routing = routed(&c, root, CrossingPolicy::Ignore);

        assert_eq!(routing.crossings().len(), 2);
        assert_eq!(routing.diagnostics().len(), 2);
        let (first, second) = routing.crossings()[0].wires();
        assert!(routing.wires()[first.index()].crosses().contains(&second));
        assert!(routing.wires()[second.index()].crosses().contains(&first));
    }

    #[test]
    fn test_minimize_swaps_lanes() {
        let (c, root) = overlapping_descent();
        let routing = routed(&c, root, CrossingPolicy::Minimize);

        assert!(routing.crossings().is_empty());
        let a = &routing.wires()[0];
        let b = &routing.wires()[1];
        assert!(b.path()[1].x() < a.path()[1].x());
    }

    /// Two descending wires where one's exit run lies on the other's entry
    /// run when lanes follow source order.
    fn staircase() -> (Composition, NodeId) {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["p"], 0));
        let b = c.leaf(brick("B", &[], &["q"], 0));
        let d = c.leaf(brick("D", &[], &[], 0));
        let e = c.leaf(brick("E", &[], &[], 0));
        let f = c.leaf(brick("F", &["p"], &[], 0));
        let g = c.leaf(brick("G", &["q"], &[], 0));
        let bd = c.par(b, d);
        let left = c.par(a, bd);
        let fg = c.par(f, g);
        let right = c.par(e, fg);
        let root = c.seq(left, right);
        (c, root)
    }

    fn shared_runs(routing: &Routing) -> usize {
        let wires = routing.wires();
        let mut count = 0;
        for (i, wire) in wires.iter().enumerate() {
            for other in &wires[i + 1..] {
                for s in wire.segments() {
                    count += other.segments().filter(|t| s.overlap(*t).is_some()).count();
                }
            }
        }
        count
    }

    #[test]
    fn test_ignore_records_overlapping_runs() {
        let (c, root) = staircase();
        let routing = routed(&c, root, CrossingPolicy::Ignore);

        assert_eq!(routing.wires().len(), 2);
        assert_eq!(shared_runs(&routing), 1);
        let overlaps: Vec<_> = routing
            .crossings()
            .iter()
            .filter(|crossing| crossing.kind() == CrossingKind::Overlap)
            .collect();
        assert_eq!(overlaps.len(), 1);
        let (first, second) = overlaps[0].wires();
        assert!(routing.wires()[first.index()].crosses().contains(&second));
        assert!(routing.wires()[second.index()].crosses().contains(&first));
        assert!(
            routing
                .diagnostics()
                .iter()
                .any(|d| matches!(d.kind(), DiagnosticKind::WiresOverlap { .. }))
        );
    }

    #[test]
    fn test_minimize_separates_overlapping_runs() {
        let (c, root) = staircase();
        let routing = routed(&c, root, CrossingPolicy::Minimize);

        assert_eq!(shared_runs(&routing), 0);
        assert!(routing.crossings().is_empty());
        assert!(routing.diagnostics().is_empty());
    }

    #[test]
    fn test_crossing_policy_from_str() {
        assert_eq!("ignore".parse::<CrossingPolicy>(), Ok(CrossingPolicy::Ignore));
        assert!("random".parse::<CrossingPolicy>().is_err());
        assert_eq!(CrossingPolicy::Minimize.to_string(), "minimize");
    }

    fn check_crossing_symmetry(composition: &Composition, root: NodeId, policy: CrossingPolicy) {
        let routing = routed(composition, root, policy);
        for wire in routing.wires() {
            for other in wire.crosses() {
                assert!(routing.wires()[other.index()].crosses().contains(&wire.id()));
            }
        }
        assert_eq!(routing.diagnostics().len(), routing.crossings().len());
    }

    /// Any stretch two wires share is on record.
    fn check_overlaps_recorded(composition: &Composition, root: NodeId, policy: CrossingPolicy) {
        let routing = routed(composition, root, policy);
        let recorded = routing
            .crossings()
            .iter()
            .filter(|crossing| crossing.kind() == CrossingKind::Overlap)
            .count();
        assert_eq!(recorded, shared_runs(&routing));
    }

    fn check_minimize_never_worse(composition: &Composition, root: NodeId) {
        let ignored = routed(composition, root, CrossingPolicy::Ignore);
        let minimized = routed(composition, root, CrossingPolicy::Minimize);
        assert_eq!(ignored.wires().len(), minimized.wires().len());
        assert!(minimized.crossings().len() <= ignored.crossings().len());
    }

    proptest! {
        #[test]
        fn crossing_symmetry((composition, root) in arb_composition(), minimize in any::<bool>()) {
            let policy = if minimize { CrossingPolicy::Minimize } else { CrossingPolicy::Ignore };
            check_crossing_symmetry(&composition, root, policy);
        }

        #[test]
        fn overlaps_recorded((composition, root) in arb_composition(), minimize in any::<bool>()) {
            let policy = if minimize { CrossingPolicy::Minimize } else { CrossingPolicy::Ignore };
            check_overlaps_recorded(&composition, root, policy);
        }

        #[test]
        fn minimize_never_worse((composition, root) in arb_composition()) {
            check_minimize_never_worse(&composition, root);
        }
    }
}
