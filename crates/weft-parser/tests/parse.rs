use proptest::prelude::*;

use weft_core::composition::{ExprKind, Grade, Node};
use weft_parser::{
    ParseError, parse,
    error::{ErrorCode, Severity},
};

fn codes(error: &ParseError) -> Vec<Option<ErrorCode>> {
    error
        .diagnostics()
        .iter()
        .filter(|d| d.severity().is_error())
        .map(|d| d.code())
        .collect()
}

#[test]
fn test_sequential_pipeline() {
    let source = r#"
        diagram "Ingest";
        brick fetch "Fetch page": (url) -> (html);
        brick summarize: (html) -> (text) grade 1 tokens 300;
        compose fetch >> summarize;
    "#;

    let diagram = parse(source).expect("Failed to parse");

    assert_eq!(diagram.title(), Some("Ingest"));
    assert!(diagram.warnings().is_empty());

    let root = diagram.composition().expr(diagram.root());
    let ExprKind::Seq(left, right) = root.kind() else {
        panic!("Expected a sequential root, got {:?}", root.kind());
    };
    let fetch = left.brick().expect("left is a brick");
    assert_eq!(fetch.display_label(), "Fetch page");
    assert_eq!(fetch.grade(), Grade::Deterministic);

    let summarize = right.brick().expect("right is a brick");
    assert_eq!(summarize.grade(), Grade::Model);
    assert_eq!(summarize.tokens(), Some(300));

    assert_eq!(root.inputs().len(), 1);
    assert_eq!(root.outputs()[0].to_string(), "text");
}

#[test]
fn test_parallel_binds_tighter() {
    let source = r#"
        brick a: (x) -> (y);
        brick b: (x) -> (y);
        brick c: (y, y) -> (z);
        compose a * b >> c;
    "#;

    let diagram = parse(source).expect("Failed to parse");
    let root = diagram.composition().expr(diagram.root());

    let ExprKind::Seq(left, _) = root.kind() else {
        panic!("Expected a sequential root");
    };
    assert!(matches!(left.kind(), ExprKind::Par(_, _)));
    assert_eq!(left.outputs().len(), 2);
}

#[test]
fn test_unicode_operator_aliases() {
    let source = "brick a: (x) -> (x); brick b: (x) -> (x); compose a ∘ b ⊗ a;";

    let diagram = parse(source).expect("Failed to parse");
    let root = diagram.composition().expr(diagram.root());

    assert!(matches!(root.kind(), ExprKind::Seq(_, _)));
    assert_eq!(root.inputs().len(), 1);
    assert_eq!(root.outputs().len(), 2);
}

#[test]
fn test_bindings_share_nodes() {
    let source = r#"
        brick step: (x) -> (x);
        let twice = step >> step;
        let four = twice >> twice;
        compose four >> four;
    "#;

    let diagram = parse(source).expect("Failed to parse");

    // One leaf plus one node per binding level plus the root.
    assert_eq!(diagram.composition().len(), 4);

    let leaves = diagram
        .composition()
        .nodes()
        .filter(|(_, node)| matches!(node, Node::Leaf(_)))
        .count();
    assert_eq!(leaves, 1);

    let occurrences = diagram.composition().expr(diagram.root()).post_order(64).count();
    assert_eq!(occurrences, 15);
}

#[test]
fn test_bricks_are_visible_before_declaration() {
    let source = r#"
        compose late;
        brick late: () -> (x);
    "#;

    let diagram = parse(source).expect("Failed to parse");
    let root = diagram.composition().expr(diagram.root());
    assert_eq!(root.brick().map(|b| b.name().to_string()), Some("late".to_string()));
}

#[test]
fn test_source_map_points_at_declarations() {
    let source = "brick a: () -> (x);\ncompose a;";

    let diagram = parse(source).expect("Failed to parse");
    let span = diagram
        .source_map()
        .span(diagram.root())
        .expect("root has a span");

    assert_eq!(&source[span.range()], "brick a: () -> (x);");
}

#[test]
fn test_unused_brick_warning() {
    let source = "brick a: () -> (x); brick spare: () -> (x); compose a;";

    let diagram = parse(source).expect("Failed to parse");

    assert_eq!(diagram.warnings().len(), 1);
    let warning = &diagram.warnings()[0];
    assert_eq!(warning.severity(), Severity::Warning);
    assert!(warning.message().contains("spare"));
}

#[test]
fn test_undefined_name() {
    let error = parse("brick a: () -> (x); compose a >> missing;").unwrap_err();

    assert_eq!(codes(&error), vec![Some(ErrorCode::E200)]);
    assert_eq!(
        error.diagnostics()[0].message(),
        "undefined name `missing`"
    );
}

#[test]
fn test_binding_used_before_let() {
    let error = parse("brick a: () -> (x); compose early; let early = a;").unwrap_err();

    let diagnostic = &error.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E200));
    assert!(diagnostic.help().is_some_and(|help| help.contains("bound later")));
}

#[test]
fn test_duplicate_brick() {
    let error = parse("brick a: () -> (x); brick a: () -> (y); compose a;").unwrap_err();

    let diagnostic = &error.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E201));
    assert_eq!(diagnostic.labels().len(), 2);
}

#[test]
fn test_binding_shadowing_brick() {
    let error = parse("brick a: () -> (x); let a = a; compose a;").unwrap_err();
    assert_eq!(codes(&error), vec![Some(ErrorCode::E202)]);
}

#[test]
fn test_invalid_grade() {
    let error = parse("brick a: () -> (x) grade 3; compose a;").unwrap_err();

    let diagnostic = &error.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E203));
    assert_eq!(diagnostic.message(), "invalid grade 3, expected 0, 1 or 2");
}

#[test]
fn test_repeated_attribute() {
    let error = parse("brick a: () -> (x) grade 1 grade 2; compose a;").unwrap_err();
    assert_eq!(codes(&error), vec![Some(ErrorCode::E206)]);
}

#[test]
fn test_missing_compose() {
    let error = parse("brick a: () -> (x);").unwrap_err();
    assert_eq!(codes(&error), vec![Some(ErrorCode::E204)]);
}

#[test]
fn test_repeated_compose() {
    let error = parse("brick a: () -> (x); compose a; compose a;").unwrap_err();
    assert_eq!(codes(&error), vec![Some(ErrorCode::E205)]);
}

#[test]
fn test_errors_from_one_phase_are_collected() {
    let error = parse("brick a: () -> (x); let p = a >> b; let q = c; compose p;").unwrap_err();

    assert_eq!(
        codes(&error),
        vec![Some(ErrorCode::E200), Some(ErrorCode::E200)]
    );
    assert!(error.to_string().ends_with("(+1 more)"));
}

#[test]
fn test_syntax_error_stops_before_elaboration() {
    let error = parse("brick a: () -> (x) compose undefined;").unwrap_err();

    assert!(
        error
            .diagnostics()
            .iter()
            .all(|d| d.code() != Some(ErrorCode::E200))
    );
}

fn check_balanced_chain_parses(width: usize) {
    let mut source = String::from("brick unit: (w) -> (w);\n");
    let operands = vec!["unit"; width];
    source.push_str(&format!("compose {};", operands.join(" * ")));

    let diagram = parse(&source).expect("Failed to parse");
    let root = diagram.composition().expr(diagram.root());

    assert_eq!(root.inputs().len(), width);
    assert_eq!(root.outputs().len(), width);
    assert_eq!(diagram.composition().len(), width);
}

fn check_trivia_is_ignored(spaces: usize, comment: bool) {
    let pad = " ".repeat(spaces);
    let note = if comment { "// note\n" } else { "" };
    let source = format!("{note}brick{pad} a{pad}:(x)->(y){pad};{note}compose{pad} a ;");

    let diagram = parse(&source).expect("Failed to parse");
    assert!(diagram.composition().expr(diagram.root()).brick().is_some());
}

proptest! {
    #[test]
    fn balanced_chain_parses(width in 1usize..40) {
        check_balanced_chain_parses(width);
    }

    #[test]
    fn trivia_is_ignored(spaces in 1usize..6, comment in any::<bool>()) {
        check_trivia_is_ignored(spaces, comment);
    }
}
