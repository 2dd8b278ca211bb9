use super::*;
use crate::rel::RelCallOp;
use zf_ir::{ErrorKind, LiteralValue};

fn col(index: usize) -> RelExpr {
    RelExpr::input_ref(index, Type::signed32())
}

fn and(operands: Vec<RelExpr>) -> RelExpr {
    RelExpr::call(RelCallOp::And, operands, Type::bool())
}

fn greater_than_five(column: RelExpr) -> RelExpr {
    RelExpr::call(
        RelCallOp::GreaterThan,
        vec![column, RelExpr::literal(LiteralValue::Int(5), Type::signed32())],
        Type::bool(),
    )
}

// Left input L(a, b), right input R(x, y)
fn analyzer() -> JoinConditionAnalyzer {
    JoinConditionAnalyzer::new(2, 2)
}

#[test]
fn test_equalities_only() {
    let cond = and(vec![
        RelExpr::equals(col(0), col(2)),
        RelExpr::equals(col(1), col(3)),
    ]);
    let result = analyzer().analyze(&cond).unwrap();
    let pairs: Vec<_> = result
        .equalities
        .iter()
        .map(|e| (e.left_column, e.right_column))
        .collect();
    assert_eq!(pairs, vec![(0, 0), (1, 1)]);
    assert!(result.residual.is_none());
}

#[test]
fn test_unsupported_left_branch_short_circuits() {
    let cond = and(vec![
        greater_than_five(col(0)),
        RelExpr::equals(col(1), col(3)),
    ]);
    let result = analyzer().analyze(&cond).unwrap();
    assert!(result.equalities.is_empty());
    assert_eq!(result.residual, Some(cond));
}

#[test]
fn test_residual_on_right_branch_is_kept_alone() {
    let residual = greater_than_five(col(3));
    let cond = and(vec![RelExpr::equals(col(0), col(2)), residual.clone()]);
    let result = analyzer().analyze(&cond).unwrap();
    assert_eq!(result.equalities.len(), 1);
    assert_eq!(result.residual, Some(residual));
}

#[test]
fn test_same_table_equality_is_residual() {
    let cond = RelExpr::equals(col(0), col(1));
    let result = analyzer().analyze(&cond).unwrap();
    assert!(result.equalities.is_empty());
    assert_eq!(result.residual, Some(cond));

    let cond = RelExpr::equals(col(2), col(3));
    let result = analyzer().analyze(&cond).unwrap();
    assert_eq!(result.residual, Some(cond));
}

#[test]
fn test_swapped_equality_and_type_unification() {
    let nullable_long = Type::signed64().set_may_be_null(true).unwrap();
    let cond = RelExpr::equals(
        RelExpr::input_ref(3, nullable_long),
        RelExpr::input_ref(1, Type::signed32()),
    );
    let result = analyzer().analyze(&cond).unwrap();
    let key = &result.equalities[0];
    assert_eq!((key.left_column, key.right_column), (1, 1));
    assert!(key.result_type.same_type(&Type::signed64()));
    assert!(!key.result_type.may_be_null());
}

#[test]
fn test_non_column_equality_is_residual() {
    let cond = RelExpr::equals(
        col(0),
        RelExpr::literal(LiteralValue::Int(1), Type::signed32()),
    );
    let result = analyzer().analyze(&cond).unwrap();
    assert_eq!(result.residual, Some(cond));
}

#[test]
fn test_literal_condition_is_residual() {
    let cond = RelExpr::literal(LiteralValue::Bool(true), Type::bool());
    let result = analyzer().analyze(&cond).unwrap();
    assert_eq!(result.residual, Some(cond));
}

#[test]
fn test_empty_condition_fails() {
    let err = analyzer().analyze(&and(Vec::new())).unwrap_err();
    assert!(matches!(err, CompileError::EmptyJoinCondition));
    assert_eq!(err.kind(), ErrorKind::Malformed);
}

#[test]
fn test_column_out_of_range_is_malformed() {
    let err = analyzer()
        .analyze(&RelExpr::equals(col(0), col(7)))
        .unwrap_err();
    assert!(matches!(err, CompileError::Malformed { .. }));
}
