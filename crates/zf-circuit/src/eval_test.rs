use super::*;
use zf_ir::{MatchCase, Parameter};

fn row_type() -> Type {
    Type::tuple(vec![Type::signed32(), Type::double()])
}

fn row_ref() -> Type {
    Type::reference(row_type(), false)
}

fn row(a: i64, b: f64) -> Value {
    Value::tuple([Value::int(a), Value::float(b)])
}

fn column(index: usize) -> Expr {
    Expr::field(Expr::var("t", row_ref()), index).unwrap()
}

fn over_row(body: Expr) -> Expr {
    Expr::closure(vec![Parameter::named("t", row_ref())], body).unwrap()
}

#[test]
fn test_three_valued_logic() {
    let null = Expr::null(&Type::bool()).unwrap();
    let and = Expr::and(null.clone(), Expr::bool_literal(false)).unwrap();
    assert_eq!(evaluate(&and).unwrap(), Value::Bool(false));
    let and = Expr::and(null.clone(), Expr::bool_literal(true)).unwrap();
    assert_eq!(evaluate(&and).unwrap(), Value::Null);

    let wrapped = Expr::unary(UnaryOp::WrapBool, and, Type::bool()).unwrap();
    assert_eq!(evaluate(&wrapped).unwrap(), Value::Bool(false));
}

#[test]
fn test_arithmetic_propagates_null() {
    let nullable = Type::signed32().set_may_be_null(true).unwrap();
    let sum = Expr::binary(
        BinaryOp::Add,
        Expr::null(&Type::signed32()).unwrap(),
        Expr::i32_literal(1),
        nullable.clone(),
    )
    .unwrap();
    assert_eq!(evaluate(&sum).unwrap(), Value::Null);

    let agg = Expr::binary(
        BinaryOp::AggPlus,
        Expr::null(&Type::signed32()).unwrap(),
        Expr::i32_literal(4),
        nullable,
    )
    .unwrap();
    assert_eq!(evaluate(&agg).unwrap(), Value::Int(4));
}

#[test]
fn test_block_loop_and_assignment() {
    // { let mut acc = 0; for x in v { acc = acc + x; } acc }
    let acc = Expr::var("acc", Type::signed64());
    let x = Expr::var("x", Type::signed64());
    let add = Expr::binary(BinaryOp::Add, acc.clone(), x, Type::signed64()).unwrap();
    let body = Expr::block(
        vec![Statement::expression(Expr::assign(acc.clone(), add).unwrap())],
        None,
    );
    let items = Expr::var("v", Type::vec(Type::signed64()));
    let closure = Expr::closure(
        vec![Parameter::named("v", Type::vec(Type::signed64()))],
        Expr::block(
            vec![
                Statement::binding("acc", Expr::i64_literal(0), true),
                Statement::expression(
                    Expr::for_loop(Pattern::identifier("x"), items, body).unwrap(),
                ),
            ],
            Some(acc),
        ),
    )
    .unwrap();
    let total = apply(
        &closure,
        &[Value::Vec(vec![Value::int(1), Value::int(2), Value::int(3)])],
    )
    .unwrap();
    assert_eq!(total, Value::int(6));
}

#[test]
fn test_match_binds_tuple_patterns() {
    let pair = Expr::raw_tuple(vec![Expr::i32_literal(3), Expr::i32_literal(4)]).unwrap();
    let case = MatchCase {
        pattern: Pattern::tuple(vec![Pattern::Wildcard, Pattern::identifier("b")]),
        result: Expr::var("b", Type::signed32()),
    };
    let matched = Expr::match_expr(pair, vec![case], Type::signed32()).unwrap();
    assert_eq!(evaluate(&matched).unwrap(), Value::int(4));
}

#[test]
fn test_unbound_variable_fails() {
    let err = evaluate(&Expr::var("nope", Type::signed32())).unwrap_err();
    assert!(matches!(err, CircuitError::Evaluation(_)));
}

#[test]
fn test_filter_and_map_step() {
    let mut circuit = Circuit::new("c");
    let source = circuit.add_source("T", row_type()).unwrap();
    let below = Expr::binary(
        BinaryOp::Lt,
        column(0),
        Expr::i32_literal(5),
        Type::bool(),
    )
    .unwrap();
    let filter = circuit.filter(source, over_row(below)).unwrap();
    let map = circuit
        .map(filter, over_row(column(1)), Type::double())
        .unwrap();
    circuit.add_sink(map, "V", "q", None).unwrap();

    let mut data = ZSetValue::new();
    data.insert(row(1, 2.5), 2);
    data.insert(row(9, 3.0), 1);
    data.insert(row(2, 2.5), -1);
    let inputs = HashMap::from([("T".to_string(), data)]);

    let outputs = CircuitEvaluator::new(&circuit).step(&inputs).unwrap();
    let view = &outputs["V"];
    assert_eq!(view.len(), 1);
    assert_eq!(view.get(&Value::float(2.5)), Some(&1));
}

#[test]
fn test_integral_and_differential_state() {
    let mut circuit = Circuit::new("c");
    let source = circuit.add_source("T", row_type()).unwrap();
    let integral = circuit.integral(source).unwrap();
    let distinct = circuit.distinct(integral).unwrap();
    let differential = circuit.differential(distinct).unwrap();
    circuit.add_sink(differential, "V", "q", None).unwrap();

    let mut evaluator = CircuitEvaluator::new(&circuit);
    let step = |values: Vec<(Value, i64)>| {
        HashMap::from([("T".to_string(), values.into_iter().collect::<ZSetValue>())])
    };

    let first = evaluator.step(&step(vec![(row(1, 1.0), 2)])).unwrap();
    assert_eq!(first["V"].get(&row(1, 1.0)), Some(&1));

    // more copies of a present row do not change the distinct result
    let second = evaluator.step(&step(vec![(row(1, 1.0), 1)])).unwrap();
    assert!(second["V"].is_empty());

    let third = evaluator.step(&step(vec![(row(1, 1.0), -3)])).unwrap();
    assert_eq!(third["V"].get(&row(1, 1.0)), Some(&-1));
}

#[test]
fn test_literal_conversion() {
    let element = Expr::tuple(vec![Expr::i32_literal(10), Expr::f64_literal(1.0)]).unwrap();
    let literal = ZSetLiteral::from_elements(vec![element.clone(), element]).unwrap();
    let values = literal_value(&literal).unwrap();
    assert_eq!(values.get(&row(10, 1.0)), Some(&2));

    let back = to_literal(&values, &row_type()).unwrap();
    assert_eq!(back, literal);
}
