use super::*;
use crate::error::CircuitError;
use zf_ir::{BinaryOp, ErrorKind, MatchCase, Parameter, Pattern};

fn row_type() -> Type {
    Type::tuple(vec![Type::signed32(), Type::double()])
}

fn row_ref() -> Type {
    Type::reference(row_type(), false)
}

fn row_var() -> Expr {
    Expr::var("t", row_ref())
}

fn first_column() -> Expr {
    Expr::closure(
        vec![Parameter::named("t", row_ref())],
        Expr::field(row_var(), 0).unwrap(),
    )
    .unwrap()
}

fn first_column_below(limit: i32) -> Expr {
    let compare = Expr::binary(
        BinaryOp::Lt,
        Expr::field(row_var(), 0).unwrap(),
        Expr::i32_literal(limit),
        Type::bool(),
    )
    .unwrap();
    Expr::closure(vec![Parameter::named("t", row_ref())], compare).unwrap()
}

fn keyed_by_first() -> Expr {
    let key = Expr::tuple(vec![Expr::field(row_var(), 0).unwrap()]).unwrap();
    let value = Expr::deref(row_var()).unwrap();
    let pair = Expr::raw_tuple(vec![key, value]).unwrap();
    Expr::closure(vec![Parameter::named("t", row_ref())], pair).unwrap()
}

fn key_type() -> Type {
    Type::tuple(vec![Type::signed32()])
}

fn with_source() -> (Circuit, OperatorId) {
    let mut circuit = Circuit::new("circuit");
    let source = circuit.add_source("T", row_type()).unwrap();
    (circuit, source)
}

#[test]
fn test_source_and_map_types() {
    let (mut circuit, source) = with_source();
    let map = circuit
        .map(source, first_column(), Type::signed32())
        .unwrap();
    let op = circuit.operator(map).unwrap();
    assert_eq!(op.name(), "map");
    assert!(op.output_type().same_type(&Type::zset(Type::signed32())));
    assert_eq!(op.inputs(), &[source]);
    assert!(op.is_multiset());
    assert_eq!(circuit.source("T"), Some(source));
}

#[test]
fn test_duplicate_source_is_rejected() {
    let (mut circuit, _) = with_source();
    let err = circuit.add_source("T", row_type()).unwrap_err();
    assert!(matches!(err, CircuitError::DuplicateSource(ref t) if t == "T"));
}

#[test]
fn test_map_result_must_match_declared_element() {
    let (mut circuit, source) = with_source();
    let err = circuit
        .map(source, first_column(), Type::double())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_map_parameter_must_match_input_element() {
    let mut circuit = Circuit::new("circuit");
    let source = circuit
        .add_source("T", Type::tuple(vec![Type::signed32()]))
        .unwrap();
    let err = circuit
        .map(source, first_column(), Type::signed32())
        .unwrap_err();
    assert!(matches!(err, CircuitError::TypeMismatch { .. }));
}

#[test]
fn test_functions_must_be_closed() {
    let (mut circuit, source) = with_source();
    let body = Expr::var("outer", Type::signed32());
    let function = Expr::closure(vec![Parameter::named("t", row_ref())], body).unwrap();
    let err = circuit
        .map(source, function, Type::signed32())
        .unwrap_err();
    assert!(err.to_string().contains("outer"));
}

#[test]
fn test_match_arm_binding_does_not_close_later_arms() {
    let (mut circuit, source) = with_source();
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
    let body =
        Expr::match_expr(Expr::field(row_var(), 0).unwrap(), cases, Type::signed32()).unwrap();
    let function = Expr::closure(vec![Parameter::named("t", row_ref())], body).unwrap();
    let err = circuit
        .map(source, function, Type::signed32())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Malformed);
    assert!(err.to_string().contains("free variables a"));
}

#[test]
fn test_filter_keeps_input_type() {
    let (mut circuit, source) = with_source();
    let filter = circuit.filter(source, first_column_below(5)).unwrap();
    let op = circuit.operator(filter).unwrap();
    assert!(op.output_type().same_type(&Type::zset(row_type())));

    let err = circuit.filter(source, first_column()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_index_and_aggregate_types() {
    let (mut circuit, source) = with_source();
    let index = circuit
        .index(source, keyed_by_first(), key_type(), row_type())
        .unwrap();
    assert!(circuit
        .operator(index)
        .unwrap()
        .output_type()
        .same_type(&Type::indexed_zset(key_type(), row_type())));

    let group_type = Type::vec(Type::raw_tuple(vec![row_type(), Type::weight()]));
    let count = Expr::closure(
        vec![
            Parameter::named("k", Type::reference(key_type(), false)),
            Parameter::named("g", Type::reference(group_type, false)),
        ],
        Expr::tuple(vec![Expr::i64_literal(1)]).unwrap(),
    )
    .unwrap();
    let output = Type::tuple(vec![Type::signed64()]);
    let aggregate = circuit
        .aggregate(index, count, key_type(), output.clone())
        .unwrap();
    let op = circuit.operator(aggregate).unwrap();
    assert_eq!(op.name(), "stream_aggregate");
    assert!(!op.is_multiset());
    assert!(op
        .output_type()
        .same_type(&Type::indexed_zset(key_type(), output)));
}

#[test]
fn test_aggregate_requires_indexed_input() {
    let (mut circuit, source) = with_source();
    let err = circuit
        .aggregate(source, first_column(), key_type(), Type::signed32())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);
}

#[test]
fn test_arity_and_function_presence() {
    let (circuit, source) = with_source();
    let op = Operator::new(
        OperatorKind::Subtract,
        vec![source],
        None,
        Type::zset(row_type()),
        true,
    );
    let mut copy = circuit.clone();
    let err = copy.insert(op).unwrap_err();
    assert!(matches!(err, CircuitError::Arity { actual: 1, .. }));

    let op = Operator::new(
        OperatorKind::Filter,
        vec![source],
        None,
        Type::zset(row_type()),
        true,
    );
    let err = copy.insert(op).unwrap_err();
    assert!(err.to_string().contains("requires a function"));
}

#[test]
fn test_unknown_input_is_rejected() {
    let (mut circuit, _) = with_source();
    let err = circuit.distinct(OperatorId::new(9)).unwrap_err();
    assert!(matches!(err, CircuitError::UnknownInput { input: 9, .. }));
}

#[test]
fn test_insert_checks_declared_output_type() {
    let (mut circuit, source) = with_source();
    let op = Operator::new(
        OperatorKind::Distinct,
        vec![source],
        None,
        Type::zset(Type::signed32()),
        false,
    );
    assert!(matches!(
        circuit.insert(op),
        Err(CircuitError::TypeMismatch { .. })
    ));
}

#[test]
fn test_sum_requires_matching_types() {
    let (mut circuit, source) = with_source();
    let map = circuit
        .map(source, first_column(), Type::signed32())
        .unwrap();
    let err = circuit.sum(vec![source, map]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TypeMismatch);

    let sum = circuit.sum(vec![source, source]).unwrap();
    let distinct = circuit.distinct(sum).unwrap();
    assert!(!circuit.operator(distinct).unwrap().is_multiset());
}

#[test]
fn test_graph_helpers() {
    let (mut circuit, source) = with_source();
    let filter = circuit.filter(source, first_column_below(5)).unwrap();
    let sink = circuit.add_sink(filter, "V", "SELECT * FROM T", None).unwrap();
    let unused = circuit
        .map(source, first_column(), Type::signed32())
        .unwrap();

    let order = circuit.topological_order().unwrap();
    let position = |id| order.iter().position(|x| *x == id).unwrap();
    assert!(position(source) < position(filter));
    assert!(position(filter) < position(sink));

    let live = circuit.ancestors(&circuit.sinks());
    assert!(live.contains(&source));
    assert!(live.contains(&sink));
    assert!(!live.contains(&unused));
    assert_eq!(circuit.consumers(source), vec![filter, unused]);
    assert_eq!(circuit.sink("V"), Some(sink));
}

#[test]
fn test_summary_serializes_operators() {
    let (mut circuit, source) = with_source();
    let filter = circuit.filter(source, first_column_below(5)).unwrap();
    circuit
        .add_sink(filter, "V", "SELECT * FROM T WHERE COL1 < 5", None)
        .unwrap();

    let summary = circuit.summary();
    assert_eq!(summary.operators.len(), 3);
    assert_eq!(summary.operators[0].name.as_deref(), Some("T"));
    assert_eq!(summary.operators[1].operation, "filter");
    assert_eq!(summary.operators[1].inputs, vec![0]);
    assert_eq!(
        summary.operators[1].function.as_deref(),
        Some("move |t: &Tup2<i32, f64>| (t.0 < 5)")
    );
    assert_eq!(summary.operators[2].operation, "inspect");

    let json: serde_json::Value = serde_json::from_str(&circuit.to_json().unwrap()).unwrap();
    assert_eq!(json["name"], "circuit");
    assert_eq!(json["operators"][2]["query"], "SELECT * FROM T WHERE COL1 < 5");
    assert!(json["operators"][0].get("function").is_none());
}

#[test]
fn test_display_lists_operators() {
    let (mut circuit, source) = with_source();
    circuit.distinct(source).unwrap();
    let text = circuit.to_string();
    assert!(text.starts_with("circuit circuit {"));
    assert!(text.contains("let stream1: OrdZSet<Tup2<i32, f64>, i64> = distinct(stream0);"));
}
