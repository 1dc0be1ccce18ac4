//! The result of one generation request.
//!
//! A [`DiagramDocument`] holds everything the renderer needs: the layout,
//! the routed wires, the cost rollup and every diagnostic. When validation
//! found a fatal problem only the diagnostics are present.
//!
//! [`DocumentSummary`] is the machine-readable companion of the SVG,
//! grouped by rank.

use serde::Serialize;

use weft_core::composition::{Grade, NodeId};

use crate::{
    cost::{BrickCost, CostSummary},
    diagnostic::{Diagnostic, Severity},
    layout::Layout,
    route::Routing,
};

/// Counts describing a generated diagram.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Brick occurrences.
    pub bricks: usize,
    pub wires: usize,
    pub crossings: usize,
    /// Number of ranks, the sequential depth of the diagram.
    pub ranks: usize,
    pub tracks: usize,
}

/// A laid-out, routed and costed composition.
#[derive(Debug, Clone, Default)]
pub struct DiagramDocument {
    metadata: DocumentMetadata,
    layout: Option<Layout>,
    routing: Routing,
    cost: Option<CostSummary>,
    diagnostics: Vec<Diagnostic>,
}

impl DiagramDocument {
    /// Assembles a document and ranks every diagnostic that points at a node.
    pub fn new(
        title: Option<String>,
        layout: Layout,
        routing: Routing,
        cost: CostSummary,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        let mut diagnostics: Vec<Diagnostic> = diagnostics
            .into_iter()
            .map(|diagnostic| match diagnostic.node() {
                Some(node) if diagnostic.rank().is_none() => match rank_of(&layout, node) {
                    Some(rank) => diagnostic.with_rank(rank),
                    None => diagnostic,
                },
                _ => diagnostic,
            })
            .collect();
        diagnostics.extend(routing.diagnostics().iter().cloned());

        let metadata = DocumentMetadata {
            title,
            bricks: layout.nodes().len(),
            wires: routing.wires().len(),
            crossings: routing.crossings().len(),
            ranks: layout.rank_count(),
            tracks: layout.track_count(),
        };
        Self {
            metadata,
            layout: Some(layout),
            routing,
            cost: Some(cost),
            diagnostics,
        }
    }

    /// A document for a composition that could not be laid out.
    pub fn fatal(title: Option<String>, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            metadata: DocumentMetadata {
                title,
                ..DocumentMetadata::default()
            },
            diagnostics,
            ..Self::default()
        }
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn title(&self) -> Option<&str> {
        self.metadata.title.as_deref()
    }

    /// `None` when a fatal diagnostic stopped the pipeline.
    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn routing(&self) -> &Routing {
        &self.routing
    }

    pub fn cost(&self) -> Option<&CostSummary> {
        self.cost.as_ref()
    }

    /// Validation diagnostics followed by routing diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_fatal)
    }

    /// `true` when any diagnostic is an error or worse.
    pub fn is_flagged(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| diagnostic.severity() >= Severity::Error)
    }

    /// Groups node counts, tokens and diagnostics by rank.
    pub fn summary(&self) -> DocumentSummary {
        let rank_count = self.metadata.ranks;
        let mut ranks: Vec<RankSummary> = (0..rank_count)
            .map(|rank| RankSummary {
                rank,
                ..RankSummary::default()
            })
            .collect();

        if let Some(layout) = &self.layout {
            for node in layout.nodes() {
                if let Some(entry) = ranks.get_mut(node.rank()) {
                    entry.node_count += 1;
                }
            }
        }
        if let Some(cost) = &self.cost {
            for rank_cost in cost.per_rank_costs() {
                if let Some(entry) = ranks.get_mut(rank_cost.rank) {
                    entry.tokens = rank_cost.tokens;
                }
            }
        }

        let mut unranked = Vec::new();
        let mut counts = SeverityCounts::default();
        for diagnostic in &self.diagnostics {
            counts.add(diagnostic.severity());
            let entry = SummaryDiagnostic::from(diagnostic);
            match diagnostic.rank().and_then(|rank| ranks.get_mut(rank)) {
                Some(rank) => rank.diagnostics.push(entry),
                None => unranked.push(entry),
            }
        }

        let totals = SummaryTotals {
            bricks: self.metadata.bricks,
            wires: self.metadata.wires,
            crossings: self.metadata.crossings,
            ranks: rank_count,
            tokens: self.cost.as_ref().map_or(0, CostSummary::total_tokens),
            display_grade: self
                .cost
                .as_ref()
                .map_or(Grade::Deterministic, CostSummary::display_grade),
            pure_llm_tokens: self.cost.as_ref().map_or(0, CostSummary::pure_llm_tokens),
            savings_pct: self.cost.as_ref().map_or(0.0, CostSummary::savings_pct),
            diagnostics: counts,
        };

        DocumentSummary {
            title: self.metadata.title.clone(),
            totals,
            ranks,
            unranked,
            bricks: self
                .cost
                .as_ref()
                .map_or_else(Vec::new, |cost| cost.breakdown().to_vec()),
        }
    }
}

/// Junction rank for sequential nodes, otherwise the first occurrence.
fn rank_of(layout: &Layout, node: NodeId) -> Option<usize> {
    layout
        .junctions()
        .iter()
        .find(|junction| junction.node() == node)
        .map(|junction| junction.rank())
        .or_else(|| layout.first_rank(node))
}

/// Machine-readable summary of a generated diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub totals: SummaryTotals,
    pub ranks: Vec<RankSummary>,
    /// Diagnostics that do not belong to a rank.
    pub unranked: Vec<SummaryDiagnostic>,
    /// Cost of every brick occurrence.
    pub bricks: Vec<BrickCost>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTotals {
    pub bricks: usize,
    pub wires: usize,
    pub crossings: usize,
    pub ranks: usize,
    pub tokens: u64,
    pub display_grade: Grade,
    pub pure_llm_tokens: u64,
    pub savings_pct: f64,
    pub diagnostics: SeverityCounts,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityCounts {
    pub info: usize,
    pub warning: usize,
    pub error: usize,
    pub fatal: usize,
}

impl SeverityCounts {
    pub(crate) fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Info => self.info += 1,
            Severity::Warning => self.warning += 1,
            Severity::Error => self.error += 1,
            Severity::Fatal => self.fatal += 1,
        }
    }
}

/// Per-rank entry of a [`DocumentSummary`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankSummary {
    pub rank: usize,
    pub node_count: usize,
    pub tokens: u64,
    pub diagnostics: Vec<SummaryDiagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryDiagnostic {
    pub severity: Severity,
    pub kind: &'static str,
    pub message: String,
}

impl From<&Diagnostic> for SummaryDiagnostic {
    fn from(diagnostic: &Diagnostic) -> Self {
        Self {
            severity: diagnostic.severity(),
            kind: diagnostic.kind().name(),
            message: diagnostic.message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weft_core::composition::Composition;

    use crate::{
        config::{CostConfig, GenerateOptions, LayoutConfig},
        cost::aggregate,
        diagnostic::{DiagnosticKind, TreeProblem},
        layout::layout,
        route::{CrossingPolicy, route},
        testing::brick,
        validate::validate,
    };

    fn document(composition: &Composition, root: NodeId) -> DiagramDocument {
        let expr = composition.expr(root);
        let diagnostics = validate(expr, &GenerateOptions::default());
        let layout = layout(expr, &LayoutConfig::default());
        let routing = route(&layout, CrossingPolicy::Minimize);
        let cost = aggregate(expr, &CostConfig::default());
        DiagramDocument::new(Some("Test".to_string()), layout, routing, cost, diagnostics)
    }

    #[test]
    fn test_summary_per_rank() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"], 1));
        let b = c.leaf(brick("B", &["x"], &[], 2));
        let root = c.seq(a, b);

        let doc = document(&c, root);
        let summary = doc.summary();
        assert_eq!(summary.title.as_deref(), Some("Test"));
        assert_eq!(summary.ranks.len(), 2);
        assert_eq!(summary.ranks[0].node_count, 1);
        assert_eq!(summary.ranks[0].tokens, 200);
        assert_eq!(summary.ranks[1].tokens, 500);
        assert_eq!(summary.totals.tokens, 700);
        assert_eq!(summary.totals.wires, 1);
        assert_eq!(summary.totals.display_grade, Grade::Human);
        assert_eq!(summary.bricks.len(), 2);
        assert_eq!(summary.bricks[1].name, "B");
        assert_eq!(summary.bricks[1].rank, 1);
        assert_eq!(summary.bricks[1].tokens, 500);
        assert!(!doc.is_flagged());
    }

    #[test]
    fn test_mismatch_is_ranked_at_junction() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"], 0));
        let b = c.leaf(brick("B", &["y"], &[], 0));
        let root = c.seq(a, b);

        let doc = document(&c, root);
        assert!(doc.is_flagged());
        assert!(!doc.has_fatal());
        let summary = doc.summary();
        assert_eq!(summary.ranks[1].diagnostics.len(), 1);
        assert_eq!(summary.ranks[1].diagnostics[0].kind, "type_mismatch");
        assert_eq!(summary.totals.diagnostics.error, 1);
        assert!(summary.unranked.is_empty());
    }

    #[test]
    fn test_fatal_document_has_no_layout() {
        let diagnostic = Diagnostic::new(DiagnosticKind::MalformedTree {
            problem: TreeProblem::MissingRoot,
        });
        let doc = DiagramDocument::fatal(None, vec![diagnostic]);

        assert!(doc.layout().is_none());
        assert!(doc.has_fatal());
        let summary = doc.summary();
        assert!(summary.ranks.is_empty());
        assert!(summary.bricks.is_empty());
        assert_eq!(summary.unranked.len(), 1);
        assert_eq!(summary.totals.diagnostics.fatal, 1);
    }

    #[test]
    fn test_summary_serializes_to_toml() {
        let mut c = Composition::new();
        let a = c.leaf(brick("A", &[], &["x"], 0));
        let b = c.leaf(brick("B", &["x"], &[], 1));
        let root = c.seq(a, b);

        let text = toml::to_string(&document(&c, root).summary()).unwrap();
        assert!(text.contains("[totals]"));
        assert!(text.contains("[[ranks]]"));
        assert!(text.contains("display_grade = 1"));
        assert!(text.contains("[[bricks]]"));
        assert!(text.contains("name = \"B\""));
    }
}
