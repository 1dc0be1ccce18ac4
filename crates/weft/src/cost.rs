//! Token cost and grade rollup.
//!
//! Both composition operators add token costs and take the maximum grade,
//! so the totals of a composition are the sums over its brick occurrences.
//! A shared node counts once per occurrence.

use log::debug;
use serde::Serialize;

use weft_core::composition::{Brick, Expr, Grade, Node, NodeId};

use crate::{
    config::CostConfig,
    layout::{extent_of, extents},
};

/// Number of brick occurrences per grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeCounts {
    pub deterministic: u64,
    pub model: u64,
    pub human: u64,
}

impl GradeCounts {
    pub fn get(&self, grade: Grade) -> u64 {
        match grade {
            Grade::Deterministic => self.deterministic,
            Grade::Model => self.model,
            Grade::Human => self.human,
        }
    }

    pub fn total(&self) -> u64 {
        self.deterministic + self.model + self.human
    }

    fn add(&mut self, grade: Grade) {
        match grade {
            Grade::Deterministic => self.deterministic += 1,
            Grade::Model => self.model += 1,
            Grade::Human => self.human += 1,
        }
    }
}

/// Cost of the bricks in one rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RankCost {
    pub rank: usize,
    pub bricks: u64,
    pub tokens: u64,
}

/// Cost of one brick occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrickCost {
    pub node: NodeId,
    pub name: String,
    pub rank: usize,
    pub grade: Grade,
    pub tokens: u64,
}

/// Rolled-up cost of a composition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CostSummary {
    total_tokens: u64,
    per_grade_counts: GradeCounts,
    per_rank_costs: Vec<RankCost>,
    breakdown: Vec<BrickCost>,
    display_grade: Grade,
    pure_llm_tokens: u64,
    savings_pct: f64,
}

impl CostSummary {
    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn per_grade_counts(&self) -> GradeCounts {
        self.per_grade_counts
    }

    /// One entry per rank, in rank order.
    pub fn per_rank_costs(&self) -> &[RankCost] {
        &self.per_rank_costs
    }

    /// Every brick occurrence, left to right and depth first.
    pub fn breakdown(&self) -> &[BrickCost] {
        &self.breakdown
    }

    /// Tokens of one occurrence of the leaf `node`, if it occurs.
    pub fn tokens_of(&self, node: NodeId) -> Option<u64> {
        self.breakdown
            .iter()
            .find(|entry| entry.node == node)
            .map(|entry| entry.tokens)
    }

    /// The highest grade of any brick.
    pub fn display_grade(&self) -> Grade {
        self.display_grade
    }

    /// Cost of running every brick as a grade 1 step at the default estimate.
    pub fn pure_llm_tokens(&self) -> u64 {
        self.pure_llm_tokens
    }

    /// Percentage saved against [`Self::pure_llm_tokens`]; negative when
    /// the composition costs more.
    pub fn savings_pct(&self) -> f64 {
        self.savings_pct
    }
}

/// Token cost of one occurrence of `brick`.
pub fn brick_tokens(brick: &Brick, config: &CostConfig) -> u64 {
    match brick.grade() {
        Grade::Deterministic => 0,
        grade => brick
            .tokens()
            .unwrap_or_else(|| config.default_tokens(grade)),
    }
}

/// Sums costs over every brick occurrence of `expr`.
///
/// Cycles are cut at a depth equal to the table size, so a malformed
/// table yields a partial sum instead of looping.
pub fn aggregate(expr: Expr<'_>, config: &CostConfig) -> CostSummary {
    let composition = expr.composition();
    let extents = extents(composition, expr.id());
    let rank_count = extent_of(&extents, expr.id()).span;
    let mut per_rank_costs: Vec<RankCost> = (0..rank_count)
        .map(|rank| RankCost {
            rank,
            ..RankCost::default()
        })
        .collect();

    let mut total_tokens = 0u64;
    let mut counts = GradeCounts::default();
    let mut display_grade = Grade::Deterministic;
    let mut breakdown = Vec::new();

    let mut stack: Vec<(NodeId, usize, usize)> = vec![(expr.id(), 0, 0)];
    while let Some((id, rank, depth)) = stack.pop() {
        if depth > composition.len() {
            continue;
        }
        match composition.node(id) {
            Some(Node::Leaf(brick)) => {
                let tokens = brick_tokens(brick, config);
                total_tokens = total_tokens.saturating_add(tokens);
                counts.add(brick.grade());
                display_grade = display_grade.max(brick.grade());
                if let Some(entry) = per_rank_costs.get_mut(rank) {
                    entry.bricks += 1;
                    entry.tokens = entry.tokens.saturating_add(tokens);
                }
                breakdown.push(BrickCost {
                    node: id,
                    name: brick.name().to_string(),
                    rank,
                    grade: brick.grade(),
                    tokens,
                });
            }
            Some(Node::Seq { left, right }) => {
                let offset = extent_of(&extents, *left).span;
                stack.push((*right, rank + offset, depth + 1));
                stack.push((*left, rank, depth + 1));
            }
            Some(Node::Par { left, right }) => {
                stack.push((*right, rank, depth + 1));
                stack.push((*left, rank, depth + 1));
            }
            None => {}
        }
    }

    let pure_llm_tokens = counts
        .total()
        .saturating_mul(config.default_tokens(Grade::Model));
    let savings_pct = if pure_llm_tokens == 0 {
        0.0
    } else {
        (pure_llm_tokens as f64 - total_tokens as f64) / pure_llm_tokens as f64 * 100.0
    };

    debug!(
        total_tokens,
        bricks = counts.total(),
        display_grade:%;
        "Aggregated cost"
    );
    CostSummary {
        total_tokens,
        per_grade_counts: counts,
        per_rank_costs,
        breakdown,
        display_grade,
        pure_llm_tokens,
        savings_pct,
    }
}
