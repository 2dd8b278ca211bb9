use super::*;
use crate::expr::{BinaryOp, MatchCase, Parameter};

fn label(node: InnerNode<'_>) -> String {
    match node {
        InnerNode::Type(ty) => format!("type {ty}"),
        InnerNode::Expr(expr) => format!("expr {expr}"),
        InnerNode::Pattern(pattern) => format!("pattern {pattern}"),
        InnerNode::Statement(statement) => format!("statement {statement}"),
    }
}

#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl InnerVisitor for Recorder {
    fn visit_super(&self) -> bool {
        true
    }

    fn preorder_node(&mut self, node: InnerNode<'_>) -> bool {
        self.events.push(format!("pre {}", label(node)));
        true
    }

    fn postorder_node(&mut self, node: InnerNode<'_>) {
        self.events.push(format!("post {}", label(node)));
    }
}

fn sum() -> Expr {
    Expr::binary(
        BinaryOp::Add,
        Expr::i32_literal(1),
        Expr::var("x", Type::signed32()),
        Type::signed32(),
    )
    .unwrap()
}

#[test]
fn test_traversal_order() {
    let mut recorder = Recorder::default();
    recorder.traverse(InnerNode::Expr(&sum()));
    assert_eq!(
        recorder.events,
        vec![
            "pre expr (1 + x)",
            "pre type i32",
            "post type i32",
            "pre expr 1",
            "pre type i32",
            "post type i32",
            "post expr 1",
            "pre expr x",
            "pre type i32",
            "post type i32",
            "post expr x",
            "post expr (1 + x)",
        ]
    );
}

#[test]
fn test_block_visits_statements_then_last() {
    let block = Expr::block(
        vec![Statement::binding("a", Expr::i32_literal(1), false)],
        Some(Expr::var("a", Type::signed32())),
    );
    let mut recorder = Recorder::default();
    block.accept(&mut recorder);
    let statements = recorder
        .events
        .iter()
        .position(|e| e == "pre statement let a: i32 = 1;")
        .unwrap();
    let last = recorder.events.iter().position(|e| e == "pre expr a").unwrap();
    assert!(statements < last);
    assert_eq!(recorder.events.last().unwrap(), "post expr { let a: i32 = 1; a }");
}

#[derive(Default)]
struct Pruner {
    binary_post: usize,
    literals: usize,
}

impl InnerVisitor for Pruner {
    fn preorder_binary(&mut self, _expr: &Expr) -> bool {
        false
    }

    fn postorder_binary(&mut self, _expr: &Expr) {
        self.binary_post += 1;
    }

    fn preorder_literal(&mut self, _expr: &Expr) -> bool {
        self.literals += 1;
        true
    }
}

#[test]
fn test_preorder_false_prunes_children_and_postorder() {
    let mut pruner = Pruner::default();
    sum().accept(&mut pruner);
    assert_eq!(pruner.literals, 0);
    assert_eq!(pruner.binary_post, 0);

    let tuple = Expr::tuple(vec![Expr::i32_literal(1), sum()]).unwrap();
    tuple.accept(&mut pruner);
    assert_eq!(pruner.literals, 1);
}

struct ExprCounter {
    delegate: bool,
    count: usize,
}

impl InnerVisitor for ExprCounter {
    fn visit_super(&self) -> bool {
        self.delegate
    }

    fn preorder_expr(&mut self, _expr: &Expr) -> bool {
        self.count += 1;
        true
    }
}

#[test]
fn test_visit_super_controls_delegation() {
    let tuple = Expr::raw_tuple(vec![Expr::i32_literal(1), Expr::bool_literal(false)]).unwrap();

    let mut delegating = ExprCounter {
        delegate: true,
        count: 0,
    };
    tuple.accept(&mut delegating);
    assert_eq!(delegating.count, 3);

    let mut direct = ExprCounter {
        delegate: false,
        count: 0,
    };
    tuple.accept(&mut direct);
    assert_eq!(direct.count, 0);
}

#[test]
fn test_free_variables() {
    let row = Type::reference(Type::tuple(vec![Type::signed32()]), false);
    let body = Expr::binary(
        BinaryOp::Add,
        Expr::field(Expr::var("t", row.clone()), 0).unwrap(),
        Expr::var("y", Type::signed32()),
        Type::signed32(),
    )
    .unwrap();
    let closure = Expr::closure(vec![Parameter::named("t", row)], body).unwrap();
    assert_eq!(FreeVariables::of(&closure), vec!["y".to_string()]);

    // an arm's binding is not visible in later arms
    let pair = Type::reference(Type::tuple(vec![Type::signed32(), Type::signed32()]), false);
    let matched = Expr::field(Expr::var("t", pair.clone()), 0).unwrap();
    let cases = vec![
        MatchCase {
            pattern: Pattern::identifier("a"),
            result: Expr::var("a", Type::signed32()),
        },
        MatchCase {
            pattern: Pattern::Wildcard,
            result: Expr::var("a", Type::signed32()),
        },
    ];
    let matching = Expr::match_expr(matched, cases, Type::signed32()).unwrap();
    let closure = Expr::closure(vec![Parameter::named("t", pair)], matching).unwrap();
    assert_eq!(FreeVariables::of(&closure), vec!["a".to_string()]);

    // the iterated expression is outside the loop pattern's scope
    let items = Expr::var("v", Type::vec(Type::signed32()));
    let lp = Expr::for_loop(
        Pattern::identifier("v"),
        items,
        Expr::block(Vec::new(), None),
    )
    .unwrap();
    assert_eq!(FreeVariables::of(&lp), vec!["v".to_string()]);
}

#[test]
fn test_let_binding_scope() {
    let block = Expr::block(
        vec![Statement::binding(
            "a",
            Expr::var("a", Type::signed32()),
            false,
        )],
        Some(Expr::var("a", Type::signed32())),
    );
    // the initializer refers to an outer `a`
    assert_eq!(FreeVariables::of(&block), vec!["a".to_string()]);

    let closed = Expr::block(
        vec![Statement::binding("b", Expr::i32_literal(2), false)],
        Some(Expr::var("b", Type::signed32())),
    );
    assert!(FreeVariables::of(&closed).is_empty());
}

#[test]
fn test_loop_pattern_binds() {
    let items = Expr::var("items", Type::vec(Type::raw_tuple(vec![Type::bool(), Type::bool()])));
    let body = Expr::block(
        vec![Statement::expression(Expr::var("x", Type::bool()))],
        None,
    );
    let pattern = crate::Pattern::tuple(vec![
        crate::Pattern::identifier("x"),
        crate::Pattern::Wildcard,
    ]);
    let lp = Expr::for_loop(pattern, items, body).unwrap();
    assert_eq!(FreeVariables::of(&lp), vec!["items".to_string()]);
}
