//! Integration tests for source to sequence to AST round trips

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use sdfl_lang::{CompilationContext, Expression, Program, parse_source};
use sdfl_seq::{decode, decode_documents, encode_documents, encode_lines};

const SCENE: &str = r#"
def crown(size) {
    local(children: [
        subtraction(
            child1: sphere(position: (0, 0, 0), radius: 0.5),
            child2: box(position: (0, 0, 0), size: (0.6, 0.6, 0.6))
        )
    ])
}

scene(
    children: [
        torus(thickness: (0.1 + 0.05), radius: 1, position: (0, 0.5, 0)),
        crown(size: 2),
        plane(height: -1 * 2)
    ],
    camera: camera(position: (0, 1, 5))
)
"#;

/// Drop display-only grouping so a parsed tree can be compared with a decoded one
fn strip_groups(expr: &Expression) -> Expression {
    match expr.ungrouped() {
        Expression::Array(items) => Expression::Array(items.iter().map(strip_groups).collect()),
        Expression::Call(call) => {
            let mut call = call.clone();
            for value in call.arguments.values_mut() {
                *value = strip_groups(value);
            }
            Expression::Call(call)
        }
        Expression::Binary(binary) => {
            Expression::binary(binary.operator, strip_groups(&binary.left), strip_groups(&binary.right))
        }
        other => other.clone(),
    }
}

fn parse(source: &str) -> Program {
    let mut ctx = CompilationContext::new();
    parse_source(source, &mut ctx).expect("Source should parse")
}

#[test]
fn parsed_program_survives_round_trip() {
    let program = parse(SCENE);
    let lines = encode_lines(&program).expect("Program should encode");

    let mut ctx = CompilationContext::new();
    let decoded = decode(&lines, &mut ctx).expect("Sequence should decode");

    assert_eq!(decoded.statements.len(), 1);
    assert_eq!(strip_groups(&decoded.root), strip_groups(&program.root));
    assert!(ctx.symbols.lookup("crown").is_some());

    // Re-encoding a decoded program only loses the parenthesis markers
    let again = encode_lines(&decoded).unwrap();
    let without_parens: Vec<&String> = lines
        .iter()
        .filter(|l| !l.starts_with("paren:"))
        .collect();
    assert_eq!(again.iter().collect::<Vec<_>>(), without_parens);
}

#[test]
fn argument_order_is_canonical() {
    let lines = encode_lines(&parse("box(size: (1, 1, 1), position: (0, 0, 0))")).unwrap();
    assert_eq!(lines[1], "arg:position");
    assert_eq!(lines[4], "arg:size");
}

#[test]
fn multi_document_export() {
    let programs = vec![parse("sphere(radius: 1)"), parse(SCENE)];
    let text = encode_documents(&programs).unwrap();
    let decoded = decode_documents(&text).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded[0], programs[0]);
}
