//! Bricks and the typed wires that connect them.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::identifier::Id;

/// A typed wire endpoint. Two wires are compatible when their tags are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WireType(Id);

impl WireType {
    pub fn new(tag: &str) -> Self {
        Self(Id::new(tag))
    }

    pub fn tag(self) -> Id {
        self.0
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for WireType {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// Returned when a number does not name a grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid grade {0}, expected 0, 1 or 2")]
pub struct InvalidGrade(pub u64);

/// Execution cost class of a brick.
///
/// Grades are totally ordered; a composite takes the maximum grade of its
/// parts.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(into = "u8", try_from = "u64")]
pub enum Grade {
    /// Grade 0: plain deterministic computation, free to run.
    #[default]
    Deterministic,
    /// Grade 1: a model call.
    Model,
    /// Grade 2: human review or another expensive step.
    Human,
}

impl Grade {
    pub const ALL: [Grade; 3] = [Grade::Deterministic, Grade::Model, Grade::Human];

    pub fn level(self) -> u8 {
        match self {
            Self::Deterministic => 0,
            Self::Model => 1,
            Self::Human => 2,
        }
    }

    /// Returns `true` for grades that cost tokens.
    pub fn is_graded(self) -> bool {
        self != Self::Deterministic
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}", self.level())
    }
}

impl From<Grade> for u8 {
    fn from(grade: Grade) -> Self {
        grade.level()
    }
}

impl TryFrom<u64> for Grade {
    type Error = InvalidGrade;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Deterministic),
            1 => Ok(Self::Model),
            2 => Ok(Self::Human),
            other => Err(InvalidGrade(other)),
        }
    }
}

/// A leaf morphism: named, typed on both sides, and graded.
///
/// # Examples
///
/// ```
/// # use weft_core::composition::{Brick, Grade};
/// let brick = Brick::new("summarize", Grade::Model)
///     .with_inputs(&["raw"])
///     .with_outputs(&["summary"])
///     .with_tokens(150);
///
/// assert_eq!(brick.display_label(), "summarize");
/// assert_eq!(brick.tokens(), Some(150));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    name: Id,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    inputs: Vec<WireType>,
    #[serde(default)]
    outputs: Vec<WireType>,
    #[serde(default)]
    grade: Grade,
    #[serde(default)]
    tokens: Option<u64>,
}

impl Brick {
    pub fn new(name: &str, grade: Grade) -> Self {
        Self {
            name: Id::new(name),
            label: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            grade,
            tokens: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_inputs(mut self, tags: &[&str]) -> Self {
        self.inputs = tags.iter().map(|tag| WireType::new(tag)).collect();
        self
    }

    pub fn with_outputs(mut self, tags: &[&str]) -> Self {
        self.outputs = tags.iter().map(|tag| WireType::new(tag)).collect();
        self
    }

    /// Sets an explicit token estimate, overriding the per-grade default.
    pub fn with_tokens(mut self, tokens: u64) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn name(&self) -> Id {
        self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The label if one was given, otherwise the name.
    pub fn display_label(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.name.to_string(),
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

    pub fn tokens(&self) -> Option<u64> {
        self.tokens
    }
}
