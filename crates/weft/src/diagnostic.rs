//! Diagnostics produced by the engine stages.
//!
//! Validation, routing and generation never fail on a bad composition.
//! They collect [`Diagnostic`]s and return them with whatever output they
//! could still produce. Only [`Severity::Fatal`] diagnostics stop the
//! pipeline before layout.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use weft_core::{
    composition::{NodeId, NodePath, WireType},
    geometry::Point,
};

use crate::route::WireId;

/// How serious a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Worth knowing, nothing is wrong.
    Info,
    Warning,
    /// The diagram is drawn but is not a valid composition.
    Error,
    /// Layout and routing were skipped.
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        };
        write!(f, "{name}")
    }
}

/// Why a composition table could not be walked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeProblem {
    /// The root id is not in the table.
    MissingRoot,
    /// A composite refers to an index outside the table.
    DanglingChild(NodeId),
    /// The node lies on a reference cycle.
    Cycle,
}

impl fmt::Display for TreeProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot => write!(f, "the root node does not exist"),
            Self::DanglingChild(child) => write!(f, "child {child} does not exist"),
            Self::Cycle => write!(f, "the node is part of a reference cycle"),
        }
    }
}

/// What went wrong, with the data needed to explain it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagnosticKind {
    #[error(
        "type mismatch at {path}: left outputs ({}) do not match right inputs ({})",
        PortList(.expected),
        PortList(.actual)
    )]
    TypeMismatch {
        path: NodePath,
        expected: Vec<WireType>,
        actual: Vec<WireType>,
    },

    #[error("malformed composition: {problem}")]
    MalformedTree { problem: TreeProblem },

    #[error("composition nests {depth} levels deep at {path}, the limit is {limit}")]
    DepthExceeded {
        path: NodePath,
        depth: usize,
        limit: usize,
    },

    #[error("composition expands to {occurrences} brick occurrences, the limit is {limit}")]
    SizeExceeded { occurrences: u64, limit: usize },

    #[error("wire `{tag}` appears in the same rank on both sides of the parallel composition at {path}")]
    DuplicateWire { path: NodePath, tag: WireType },

    #[error("wires {first} and {second} cross at ({:.1}, {:.1})", .at.x(), .at.y())]
    CrossingDetected {
        first: WireId,
        second: WireId,
        at: Point,
    },

    #[error("wires {first} and {second} run together around ({:.1}, {:.1})", .at.x(), .at.y())]
    WiresOverlap {
        first: WireId,
        second: WireId,
        at: Point,
    },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::MalformedTree { .. } | Self::DepthExceeded { .. } | Self::SizeExceeded { .. } => {
                Severity::Fatal
            }
            Self::TypeMismatch { .. } => Severity::Error,
            Self::DuplicateWire { .. } => Severity::Warning,
            Self::CrossingDetected { .. } | Self::WiresOverlap { .. } => Severity::Info,
        }
    }

    /// Short stable name, used in summaries and SVG class names.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::MalformedTree { .. } => "malformed_tree",
            Self::DepthExceeded { .. } => "depth_exceeded",
            Self::SizeExceeded { .. } => "size_exceeded",
            Self::DuplicateWire { .. } => "duplicate_wire",
            Self::CrossingDetected { .. } => "crossing_detected",
            Self::WiresOverlap { .. } => "wires_overlap",
        }
    }
}

/// A diagnostic attached to a node and, once laid out, to a rank.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{severity}: {kind}", severity = .kind.severity())]
pub struct Diagnostic {
    kind: DiagnosticKind,
    node: Option<NodeId>,
    rank: Option<usize>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind) -> Self {
        Self {
            kind,
            node: None,
            rank: None,
        }
    }

    /// Points the diagnostic at a node of the composition.
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn kind(&self) -> &DiagnosticKind {
        &self.kind
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn rank(&self) -> Option<usize> {
        self.rank
    }

    /// The message without the severity prefix.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Formats wire tags as `a, b, c`.
struct PortList<'a>(&'a [WireType]);

impl fmt::Display for PortList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::composition::Step;

    #[test]
    fn test_type_mismatch_message() {
        let diagnostic = Diagnostic::new(DiagnosticKind::TypeMismatch {
            path: NodePath::root().child(Step::Left),
            expected: vec![WireType::new("x"), WireType::new("y")],
            actual: vec![],
        });

        assert_eq!(diagnostic.severity(), Severity::Error);
        assert_eq!(
            diagnostic.to_string(),
            "error: type mismatch at root.left: left outputs (x, y) do not match right inputs ()"
        );
    }

    #[test]
    fn test_fatal_kinds() {
        let malformed = Diagnostic::new(DiagnosticKind::MalformedTree {
            problem: TreeProblem::Cycle,
        });
        assert!(malformed.is_fatal());

        let depth = Diagnostic::new(DiagnosticKind::DepthExceeded {
            path: NodePath::root(),
            depth: 3,
            limit: 2,
        });
        assert!(depth.is_fatal());
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_node_and_rank() {
        let diagnostic = Diagnostic::new(DiagnosticKind::MalformedTree {
            problem: TreeProblem::MissingRoot,
        })
        .with_rank(2);
        assert_eq!(diagnostic.rank(), Some(2));
        assert_eq!(diagnostic.node(), None);
        assert_eq!(
            diagnostic.message(),
            "malformed composition: the root node does not exist"
        );
    }
}
