use super::*;
use crate::rel::{AggregateFunction, RelCallOp, RelColumn, SortKey};
use ordered_float::OrderedFloat;
use zf_ir::{ErrorKind, LiteralValue};

fn t_schema() -> RelSchema {
    RelSchema::new(vec![
        RelColumn::new("COL1", Type::signed32()),
        RelColumn::new("COL2", Type::double()),
    ])
}

fn create_t() -> FrontendStatement {
    FrontendStatement::CreateTable {
        name: "T".to_string(),
        schema: t_schema(),
    }
}

fn scan_t() -> RelNode {
    RelNode::Scan {
        table: "T".to_string(),
        schema: t_schema(),
    }
}

fn view(name: &str, plan: RelNode) -> FrontendStatement {
    FrontendStatement::CreateView {
        name: name.to_string(),
        query: format!("CREATE VIEW {name} AS ..."),
        comment: None,
        plan,
    }
}

fn int(value: i128) -> RelExpr {
    RelExpr::literal(LiteralValue::Int(value), Type::signed32())
}

fn compile(statements: &[FrontendStatement]) -> CompileResult<Compilation> {
    CircuitCompiler::compile(CompilerOptions::default(), statements)
}

fn operation_names(circuit: &Circuit) -> Vec<&'static str> {
    circuit.iter().map(|(_, op)| op.name()).collect()
}

#[test]
fn test_duplicate_table() {
    let err = compile(&[create_t(), create_t()]).unwrap_err();
    assert!(matches!(err, CompileError::DuplicateTable { ref name } if name == "T"));
}

#[test]
fn test_duplicate_view() {
    let err = compile(&[create_t(), view("V", scan_t()), view("V", scan_t())]).unwrap_err();
    assert!(matches!(err, CompileError::DuplicateView { ref name } if name == "V"));
}

#[test]
fn test_scan_of_unknown_table() {
    let err = compile(&[view("V", scan_t())]).unwrap_err();
    assert!(matches!(err, CompileError::UnknownTable { .. }));
}

#[test]
fn test_scan_with_wrong_schema() {
    let plan = RelNode::Scan {
        table: "T".to_string(),
        schema: RelSchema::new(vec![RelColumn::new("COL1", Type::signed32())]),
    };
    let err = compile(&[create_t(), view("V", plan)]).unwrap_err();
    assert!(matches!(err, CompileError::Malformed { .. }));
}

#[test]
fn test_view_over_table_is_source_then_sink() {
    let result = compile(&[create_t(), view("V", scan_t())]).unwrap();
    assert_eq!(operation_names(&result.circuit), vec!["source", "inspect"]);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_table_without_view_is_pruned() {
    let result = compile(&[create_t()]).unwrap();
    assert!(result.circuit.is_empty());
}

#[test]
fn test_filter_compiles_predicate() {
    let condition = RelExpr::call(
        RelCallOp::GreaterThan,
        vec![RelExpr::input_ref(0, Type::signed32()), int(1)],
        Type::bool(),
    );
    let plan = RelNode::Filter {
        input: Box::new(scan_t()),
        condition,
        schema: t_schema(),
    };
    let result = compile(&[create_t(), view("V", plan)]).unwrap();
    assert_eq!(
        operation_names(&result.circuit),
        vec!["source", "filter", "inspect"]
    );
    let (_, filter) = result.circuit.iter().nth(1).unwrap();
    assert_eq!(
        filter.function().unwrap().to_string(),
        "move |t: &Tup2<i32, f64>| (t.0 > 1)"
    );
}

#[test]
fn test_insert_and_delete_accumulate_contents() {
    let row = vec![int(10), RelExpr::literal(LiteralValue::Float(OrderedFloat(12.0)), Type::double())];
    let other = vec![int(20), RelExpr::literal(LiteralValue::Float(OrderedFloat(1.0)), Type::double())];
    let result = compile(&[
        create_t(),
        FrontendStatement::Insert {
            table: "T".to_string(),
            rows: vec![row.clone(), other.clone(), row.clone()],
        },
        FrontendStatement::Delete {
            table: "T".to_string(),
            rows: vec![other],
        },
    ])
    .unwrap();
    let contents = &result.contents["T"];
    assert_eq!(contents.size(), 1);
    let element = Expr::tuple(vec![Expr::i32_literal(10), Expr::f64_literal(12.0)]).unwrap();
    assert_eq!(contents.weight(&element), 2);
}

#[test]
fn test_insert_into_unknown_table() {
    let err = compile(&[FrontendStatement::Insert {
        table: "T".to_string(),
        rows: vec![vec![int(1)]],
    }])
    .unwrap_err();
    assert!(matches!(err, CompileError::UnknownTable { .. }));
}

#[test]
fn test_insert_with_wrong_arity() {
    let err = compile(&[
        create_t(),
        FrontendStatement::Insert {
            table: "T".to_string(),
            rows: vec![vec![int(1)]],
        },
    ])
    .unwrap_err();
    assert!(matches!(err, CompileError::Malformed { .. }));
}

#[test]
fn test_insert_rejects_column_references() {
    let err = compile(&[
        create_t(),
        FrontendStatement::Insert {
            table: "T".to_string(),
            rows: vec![vec![
                RelExpr::input_ref(0, Type::signed32()),
                RelExpr::input_ref(1, Type::double()),
            ]],
        },
    ])
    .unwrap_err();
    assert!(matches!(err, CompileError::Malformed { .. }));
}

#[test]
fn test_limit_is_unimplemented() {
    let plan = RelNode::Limit {
        input: Box::new(scan_t()),
        fetch: 10,
        schema: t_schema(),
    };
    let err = compile(&[create_t(), view("V", plan)]).unwrap_err();
    assert!(err.is_unsupported());
    assert!(err.to_string().contains("LIMIT 10"));
}

#[test]
fn test_outer_join_is_unimplemented() {
    let plan = RelNode::Join {
        left: Box::new(scan_t()),
        right: Box::new(scan_t()),
        join_type: JoinType::LeftOuter,
        condition: Some(RelExpr::equals(
            RelExpr::input_ref(0, Type::signed32()),
            RelExpr::input_ref(2, Type::signed32()),
        )),
        schema: RelSchema::merge(&t_schema(), &t_schema()),
    };
    let err = compile(&[create_t(), view("V", plan)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unimplemented);
}

#[test]
fn test_sort_is_dropped_with_diagnostic() {
    let plan = RelNode::Sort {
        input: Box::new(scan_t()),
        keys: vec![SortKey {
            column: 0,
            ascending: true,
        }],
        schema: t_schema(),
    };
    let result = compile(&[create_t(), view("V", plan)]).unwrap();
    assert_eq!(operation_names(&result.circuit), vec!["source", "inspect"]);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].code, ORDER_IGNORED);
    assert_eq!(result.diagnostics[0].severity, Severity::Info);
}

#[test]
fn test_cross_join_reports_diagnostic() {
    let plan = RelNode::Join {
        left: Box::new(scan_t()),
        right: Box::new(scan_t()),
        join_type: JoinType::Cross,
        condition: None,
        schema: RelSchema::merge(&t_schema(), &t_schema()),
    };
    let result = compile(&[create_t(), view("V", plan)]).unwrap();
    assert_eq!(result.diagnostics[0].code, CROSS_JOIN);
    assert_eq!(
        operation_names(&result.circuit),
        vec!["source", "index_with", "index_with", "stream_join", "inspect"]
    );
}

#[test]
fn test_grouped_aggregate_chain() {
    let schema = RelSchema::new(vec![
        RelColumn::new("COL1", Type::signed32()),
        RelColumn::new("EXPR$1", Type::signed64()),
    ]);
    let plan = RelNode::Aggregate {
        input: Box::new(scan_t()),
        group_keys: vec![0],
        aggregates: vec![AggregateCall::new(
            AggregateFunction::Count,
            None,
            Type::signed64(),
        )],
        schema,
    };
    let result = compile(&[create_t(), view("V", plan)]).unwrap();
    assert_eq!(
        operation_names(&result.circuit),
        vec!["source", "index_with", "stream_aggregate", "map", "inspect"]
    );
}

#[test]
fn test_circuit_named_after_option() {
    let options = CompilerOptions {
        function_name: "orders".to_string(),
        ..CompilerOptions::default()
    };
    let result = CircuitCompiler::compile(options, &[create_t(), view("V", scan_t())]).unwrap();
    assert_eq!(result.circuit.name(), "orders");
}
