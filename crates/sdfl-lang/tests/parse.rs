//! Integration tests for source to AST parsing

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use sdfl_lang::{
    BinaryOperator, CompilationContext, Expression, Parser, Phase, SymbolRole, parse_source,
    tokenize,
};

const GARDEN: &str = r#"
// A torus resting on a rounded box, with a helper function
def pedestal(height) {
    smoothUnion(
        child1: box(position: (0, -0.5, 0), size: (1, 0.5, 1)),
        child2: sphere(position: (0, 0, 0), radius: 0.6),
        smooth_transition: 0.2
    )
}

scene(
    background: (0.1, 0.1, 0.2),
    camera: camera(position: (0, 2, 6)),
    children: [
        plane(height: -1),
        pedestal(height: 1),
        local(children: [
            rotateAround(
                position: (0, 1, 0),
                rotation: (90, 0, 0),
                child: torus(position: (0, 1, 0), radius: 0.8, thickness: (0.5 * 0.4))
            )
        ])
    ]
)
"#;

#[test]
fn full_scene_parses() {
    let mut ctx = CompilationContext::new();
    let program = parse_source(GARDEN, &mut ctx).expect("Scene should parse");

    assert_eq!(program.statements.len(), 1);
    assert!(ctx.diagnostics.is_empty(), "{:?}", ctx.diagnostics);

    let scene = program.root.as_call().expect("Root should be a call");
    assert_eq!(scene.identifier, "scene");
    assert_eq!(
        scene.argument("background").and_then(Expression::as_tuple),
        Some(&["0.1".to_string(), "0.1".to_string(), "0.2".to_string()][..])
    );

    let children = scene
        .argument("children")
        .and_then(Expression::as_array)
        .expect("children should be an array");
    assert_eq!(children.len(), 3);
    assert_eq!(children[1].as_call().unwrap().identifier, "pedestal");
}

#[test]
fn grouped_binary_keeps_its_marker() {
    let mut ctx = CompilationContext::new();
    let program = parse_source(GARDEN, &mut ctx).unwrap();
    let printed = program.to_string();
    assert!(printed.contains("Parenthesized:"));
    assert!(printed.contains("BinaryOperation (Factor): *"));

    let program = parse_source("torus(thickness: (0.5 * 0.4))", &mut ctx).unwrap();
    let thickness = program.root.as_call().unwrap().argument("thickness").unwrap();
    assert!(matches!(thickness, Expression::Grouped(_)));
    assert!(matches!(
        thickness.ungrouped(),
        Expression::Binary(b) if b.operator == BinaryOperator::Multiply
    ));
}

#[test]
fn definitions_are_registered_per_context() {
    let mut first = CompilationContext::new();
    parse_source(GARDEN, &mut first).unwrap();
    assert_eq!(
        first.symbols.lookup("pedestal").map(|s| s.role),
        Some(SymbolRole::UserDefined)
    );

    let mut second = CompilationContext::new();
    parse_source("sphere(radius: 1)", &mut second).unwrap();
    assert!(second.symbols.lookup("pedestal").is_none());
}

#[test]
fn errors_are_collected_not_fatal() {
    let source = "scene(camera: camera(position: (0, 1, 5)), children: [sphere(radius 1), box(size: )])";
    let mut ctx = CompilationContext::new();
    let tokens = tokenize(source, &mut ctx.diagnostics);
    let mut parser = Parser::new(&tokens, &mut ctx);
    let program = parser.parse();
    assert!(parser.has_error());

    // Both broken children were still visited
    assert!(ctx.diagnostics.errors_in(Phase::Syntax).len() >= 2);
    let children = program
        .root
        .as_call()
        .and_then(|c| c.argument("children"))
        .and_then(Expression::as_array)
        .unwrap();
    assert_eq!(children.len(), 2);
}

#[test]
fn lexical_errors_do_not_block_parsing() {
    let mut ctx = CompilationContext::new();
    let program = parse_source("sphere(radius: 1) @", &mut ctx).unwrap();
    assert_eq!(program.root.as_call().unwrap().identifier, "sphere");
    assert!(ctx.diagnostics.has_errors_in(Phase::Lexical));
    assert!(!ctx.diagnostics.has_errors_in(Phase::Syntax));
}

#[test]
fn let_binding_is_rejected() {
    let mut ctx = CompilationContext::new();
    let err = parse_source("let s = sphere(radius: 1)\nscene()", &mut ctx).unwrap_err();
    assert!(err.to_string().contains("variable binding"));
}
