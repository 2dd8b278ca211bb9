use zf_ir::{rewrite, BinaryOp, Expr, FreeVariables, Parameter, Simplify, Type, ZSetLiteral};

fn row_type() -> Type {
    Type::tuple(vec![
        Type::signed32(),
        Type::signed64().set_may_be_null(true).unwrap(),
    ])
}

fn row() -> Expr {
    Expr::var("t", Type::reference(row_type(), false))
}

fn above_one() -> Expr {
    let column = Expr::field(row(), 0).unwrap();
    Expr::binary(BinaryOp::Gt, column, Expr::i32_literal(1), Type::bool()).unwrap()
}

fn predicate(body: Expr) -> Expr {
    Expr::closure(
        vec![Parameter::named("t", Type::reference(row_type(), false))],
        body,
    )
    .unwrap()
}

#[test]
fn test_closure_binds_its_parameter() {
    let body = above_one();
    assert_eq!(FreeVariables::of(&body), vec!["t".to_string()]);
    assert!(FreeVariables::of(&predicate(body)).is_empty());
}

#[test]
fn test_simplify_folds_true_conjunct() {
    let closure = predicate(Expr::and(Expr::bool_literal(true), above_one()).unwrap());
    let simplified = rewrite(&mut Simplify, &closure).unwrap();
    assert!(!simplified.same_node(&closure));
    assert_eq!(
        simplified.to_string(),
        "move |t: &Tup2<i32, Option<i64>>| (t.0 > 1)"
    );
}

#[test]
fn test_simplify_keeps_simple_closure() {
    let closure = predicate(above_one());
    let simplified = rewrite(&mut Simplify, &closure).unwrap();
    assert!(simplified.same_node(&closure));
}

#[test]
fn test_zset_literal_of_rows() {
    let missing = Expr::null(&Type::signed64().set_may_be_null(true).unwrap()).unwrap();
    let make = |a: i32| Expr::tuple(vec![Expr::i32_literal(a), missing.clone()]).unwrap();
    let inserted = ZSetLiteral::from_elements(vec![make(1), make(2), make(1)]).unwrap();
    let deleted = ZSetLiteral::from_elements(vec![make(1)]).unwrap();
    let remaining = inserted.minus(&deleted).unwrap();
    assert_eq!(remaining.weight(&make(1)), 1);
    assert_eq!(remaining.weight(&make(2)), 1);
    assert_eq!(
        remaining.zset_type().to_string(),
        "OrdZSet<Tup2<i32, Option<i64>>, i64>"
    );
}
