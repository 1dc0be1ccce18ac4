//! Shared fixtures for unit tests.

use proptest::prelude::*;

use weft_core::composition::{Brick, Composition, Grade, NodeId};

/// Builds a brick from its ports and a grade level.
pub(crate) fn brick(name: &str, inputs: &[&str], outputs: &[&str], grade: u64) -> Brick {
    let grade = Grade::try_from(grade).expect("grade level between 0 and 2");
    Brick::new(name, grade)
        .with_inputs(inputs)
        .with_outputs(outputs)
}

/// Shape of a random composition before it is put into a table.
#[derive(Debug, Clone)]
pub(crate) enum Shape {
    Leaf {
        inputs: usize,
        outputs: usize,
        grade: u64,
        tokens: Option<u64>,
    },
    Seq(Box<Shape>, Box<Shape>),
    Par(Box<Shape>, Box<Shape>),
}

pub(crate) fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = (0usize..3, 0usize..3, 0u64..3, proptest::option::of(1u64..1000)).prop_map(
        |(inputs, outputs, grade, tokens)| Shape::Leaf {
            inputs,
            outputs,
            grade,
            tokens,
        },
    );
    leaf.prop_recursive(5, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| Shape::Seq(Box::new(a), Box::new(b))),
            (inner.clone(), inner).prop_map(|(a, b)| Shape::Par(Box::new(a), Box::new(b))),
        ]
    })
}

/// Adds `shape` to `composition`.
///
/// With `well_typed`, every wire is tagged `w` and an adapter brick is put
/// between sequential operands whose port counts differ.
pub(crate) fn build(shape: &Shape, composition: &mut Composition, well_typed: bool) -> NodeId {
    match shape {
        Shape::Leaf {
            inputs,
            outputs,
            grade,
            tokens,
        } => {
            let name = format!("b{}", composition.len());
            let inputs = tags(*inputs, well_typed);
            let outputs = tags(*outputs, well_typed);
            let mut brick = brick(&name, &inputs, &outputs, *grade);
            if let Some(tokens) = tokens {
                brick = brick.with_tokens(*tokens);
            }
            composition.leaf(brick)
        }
        Shape::Seq(a, b) => {
            let left = build(a, composition, well_typed);
            let right = build(b, composition, well_typed);
            let produced = composition.expr(left).outputs().len();
            let consumed = composition.expr(right).inputs().len();
            if well_typed && produced != consumed {
                let adapter = composition.leaf(brick(
                    "adapt",
                    &vec!["w"; produced],
                    &vec!["w"; consumed],
                    0,
                ));
                let left = composition.seq(left, adapter);
                composition.seq(left, right)
            } else {
                composition.seq(left, right)
            }
        }
        Shape::Par(a, b) => {
            let left = build(a, composition, well_typed);
            let right = build(b, composition, well_typed);
            composition.par(left, right)
        }
    }
}

fn tags(count: usize, well_typed: bool) -> Vec<&'static str> {
    const TAGS: [&str; 2] = ["x", "y"];
    (0..count)
        .map(|i| if well_typed { "w" } else { TAGS[i % 2] })
        .collect()
}

/// Random compositions, not necessarily well-typed.
pub(crate) fn arb_composition() -> impl Strategy<Value = (Composition, NodeId)> {
    arb_shape().prop_map(|shape| {
        let mut composition = Composition::new();
        let root = build(&shape, &mut composition, false);
        (composition, root)
    })
}

/// Random well-typed compositions.
pub(crate) fn arb_well_typed() -> impl Strategy<Value = (Composition, NodeId)> {
    arb_shape().prop_map(|shape| {
        let mut composition = Composition::new();
        let root = build(&shape, &mut composition, true);
        (composition, root)
    })
}
