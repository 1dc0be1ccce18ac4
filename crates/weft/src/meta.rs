//! The engine drawn as a string diagram of itself.
//!
//! The four stages are plain data. [`composition`] turns them into an
//! ordinary sequential pipeline, which then goes through the same
//! [`Generator::generate`](crate::Generator::generate) call as any user
//! composition.

use weft_core::composition::{Brick, Composition, Grade, NodeId};

/// Title of the meta-diagram.
pub const TITLE: &str = "Weft engine";

struct Stage {
    name: &'static str,
    label: &'static str,
    input: &'static str,
    output: &'static str,
    grade: Grade,
    tokens: Option<u64>,
}

impl Stage {
    fn brick(&self) -> Brick {
        let brick = Brick::new(self.name, self.grade)
            .with_label(self.label)
            .with_inputs(&[self.input])
            .with_outputs(&[self.output]);
        match self.tokens {
            Some(tokens) => brick.with_tokens(tokens),
            None => brick,
        }
    }
}

const STAGES: [Stage; 4] = [
    Stage {
        name: "foundation",
        label: "Foundation: types and rules",
        input: "expr",
        output: "checked",
        grade: Grade::Deterministic,
        tokens: None,
    },
    Stage {
        name: "structure",
        label: "Structure: ranks and tracks",
        input: "checked",
        output: "layout",
        grade: Grade::Deterministic,
        tokens: None,
    },
    Stage {
        name: "relational",
        label: "Relational: wires",
        input: "layout",
        output: "routing",
        grade: Grade::Deterministic,
        tokens: None,
    },
    Stage {
        name: "contextual",
        label: "Contextual: synthesis",
        input: "routing",
        output: "diagram",
        grade: Grade::Model,
        tokens: Some(200),
    },
];

/// Builds the meta-diagram and returns it with its root.
pub fn composition() -> (Composition, NodeId) {
    let mut composition = Composition::new();
    let [first, rest @ ..] = &STAGES;
    let mut root = composition.leaf(first.brick());
    for stage in rest {
        let next = composition.leaf(stage.brick());
        root = composition.seq(root, next);
    }
    (composition, root)
}
