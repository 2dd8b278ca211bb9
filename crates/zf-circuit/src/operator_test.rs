use super::*;
use zf_ir::Parameter;

fn row_type() -> Type {
    Type::tuple(vec![Type::signed32(), Type::double()])
}

fn projection() -> Expr {
    let row = Expr::var("t", Type::reference(row_type(), false));
    Expr::closure(
        vec![Parameter::named("t", Type::reference(row_type(), false))],
        Expr::field(row, 0).unwrap(),
    )
    .unwrap()
}

fn map_operator(input: usize) -> Operator {
    Operator::new(
        OperatorKind::Map {
            output_element: Type::signed32(),
        },
        vec![OperatorId::new(input)],
        Some(projection()),
        Type::zset(Type::signed32()),
        true,
    )
}

/// One operator of every kind, wired to as many inputs as its arity needs
fn one_of_each_kind() -> Vec<Operator> {
    let indexed = Type::indexed_zset(Type::signed32(), row_type());
    let kinds = vec![
        OperatorKind::Source {
            table: "T".into(),
            element: row_type(),
        },
        OperatorKind::Constant {
            value: ZSetLiteral::empty(row_type()),
        },
        OperatorKind::Map {
            output_element: Type::signed32(),
        },
        OperatorKind::Filter,
        OperatorKind::Index {
            key_type: Type::signed32(),
            value_type: row_type(),
        },
        OperatorKind::Aggregate {
            key_type: Type::signed32(),
            output_element: Type::signed64(),
        },
        OperatorKind::Join {
            key_type: Type::signed32(),
            output_element: Type::signed32(),
        },
        OperatorKind::Sum,
        OperatorKind::Subtract,
        OperatorKind::Negate,
        OperatorKind::Distinct,
        OperatorKind::Integral,
        OperatorKind::Differential,
        OperatorKind::Noop,
        OperatorKind::Sink {
            name: "v".into(),
            query: "SELECT * FROM T".into(),
            comment: Some("view v".into()),
        },
    ];
    kinds
        .into_iter()
        .map(|kind| {
            let inputs = match kind.arity() {
                Arity::Exactly(n) | Arity::AtLeast(n) => (0..n).map(OperatorId::new).collect(),
            };
            let function = kind.requires_function().then(projection);
            let output_type = match &kind {
                OperatorKind::Index { .. } => indexed.clone(),
                _ => Type::zset(row_type()),
            };
            Operator::new(kind, inputs, function, output_type, false)
        })
        .collect()
}

#[test]
fn test_replace_inputs_with_same_inputs_returns_self() {
    for op in one_of_each_kind() {
        let replaced = op.replace_inputs(op.inputs(), false);
        assert!(matches!(replaced, Cow::Borrowed(_)), "{}", op.name());
        assert!(std::ptr::eq(replaced.as_ref(), &op), "{}", op.name());
    }
}

#[test]
fn test_replace_inputs_with_new_inputs_builds_copy() {
    let op = map_operator(0);
    let replaced = op.replace_inputs(&[OperatorId::new(3)], false);
    assert!(matches!(replaced, Cow::Owned(_)));
    assert_eq!(replaced.inputs(), &[OperatorId::new(3)]);
    assert!(replaced.shallow_same_operator(&op));
}

#[test]
fn test_replace_inputs_keeps_kind_fields() {
    for op in one_of_each_kind() {
        let mut cases = vec![(op.inputs().to_vec(), true)];
        if !op.inputs().is_empty() {
            let moved = op
                .inputs()
                .iter()
                .map(|id| OperatorId::new(id.index() + 10))
                .collect();
            cases.push((moved, false));
        }
        for (inputs, force) in cases {
            let replaced = op.replace_inputs(&inputs, force);
            assert!(matches!(replaced, Cow::Owned(_)), "{}", op.name());
            assert_eq!(replaced.inputs(), inputs.as_slice());
            assert_eq!(replaced.kind(), op.kind());
            assert_eq!(replaced.output_type(), op.output_type());
            assert_eq!(replaced.is_multiset(), op.is_multiset());
            assert!(replaced.shallow_same_operator(&op), "{}", op.name());
        }
    }
}

#[test]
fn test_shallow_same_operator_compares_function_identity() {
    let op = map_operator(0);
    let rebuilt = op.with_function(projection());
    // structurally equal, but a different node
    assert_eq!(rebuilt.function(), op.function());
    assert!(!rebuilt.shallow_same_operator(&op));

    let shared = op.with_function(op.function().unwrap().clone());
    assert!(shared.shallow_same_operator(&op));
}

#[test]
fn test_operation_names_and_arity() {
    assert_eq!(OperatorKind::Filter.name(), "filter");
    assert_eq!(OperatorKind::Subtract.name(), "minus");
    assert_eq!(
        OperatorKind::Sink {
            name: "v".into(),
            query: "q".into(),
            comment: None
        }
        .name(),
        "inspect"
    );
    assert_eq!(OperatorKind::Sum.arity(), Arity::AtLeast(1));
    assert!(OperatorKind::Sum.arity().accepts(3));
    assert!(!OperatorKind::Subtract.arity().accepts(1));
    assert!(OperatorKind::Filter.requires_function());
    assert!(!OperatorKind::Distinct.requires_function());
}

#[test]
fn test_operator_id_display() {
    assert_eq!(OperatorId::new(7).to_string(), "stream7");
}
