//! Identity-preserving clone-rewrite of expressions
//!
//! [`rewrite`] walks an expression bottom-up. A node is rebuilt only when one
//! of its children changed; otherwise the original handle is returned, so
//! unchanged subtrees stay shared.

use crate::error::IrResult;
use crate::expr::{BinaryOp, Expr, ExprKind, MatchCase, UnaryOp};
use crate::literal::LiteralValue;
use crate::statement::Statement;

pub trait ExprRewriter {
    /// Replace `expr` wholesale before its children are visited
    fn preorder(&mut self, _expr: &Expr) -> IrResult<Option<Expr>> {
        Ok(None)
    }

    /// Final say on a node after its children were rewritten. `rebuilt` is
    /// the original handle when nothing below it changed.
    fn postorder(&mut self, _original: &Expr, rebuilt: Expr) -> IrResult<Expr> {
        Ok(rebuilt)
    }
}

/// Rewrite `expr` with `rewriter`
pub fn rewrite<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: &Expr) -> IrResult<Expr> {
    if let Some(replacement) = rewriter.preorder(expr)? {
        return Ok(replacement);
    }
    let rebuilt = rebuild(rewriter, expr)?;
    rewriter.postorder(expr, rebuilt)
}

fn rewrite_all<R: ExprRewriter + ?Sized>(
    rewriter: &mut R,
    exprs: &[Expr],
) -> IrResult<(Vec<Expr>, bool)> {
    let mut changed = false;
    let mut result = Vec::with_capacity(exprs.len());
    for expr in exprs {
        let new = rewrite(rewriter, expr)?;
        changed |= !new.same_node(expr);
        result.push(new);
    }
    Ok((result, changed))
}

fn rewrite_optional<R: ExprRewriter + ?Sized>(
    rewriter: &mut R,
    expr: &Option<Expr>,
) -> IrResult<(Option<Expr>, bool)> {
    match expr {
        Some(expr) => {
            let new = rewrite(rewriter, expr)?;
            let changed = !new.same_node(expr);
            Ok((Some(new), changed))
        }
        None => Ok((None, false)),
    }
}

fn rebuild<R: ExprRewriter + ?Sized>(rewriter: &mut R, expr: &Expr) -> IrResult<Expr> {
    let unchanged = || Ok(expr.clone());
    match expr.kind() {
        ExprKind::Literal(_) | ExprKind::Variable(_) | ExprKind::Path(_) | ExprKind::ZSet(_) => {
            unchanged()
        }
        ExprKind::Field { expr: inner, index } => {
            let new = rewrite(rewriter, inner)?;
            if new.same_node(inner) {
                return unchanged();
            }
            Expr::field(new, *index)
        }
        ExprKind::Binary { op, left, right } => {
            let new_left = rewrite(rewriter, left)?;
            let new_right = rewrite(rewriter, right)?;
            if new_left.same_node(left) && new_right.same_node(right) {
                return unchanged();
            }
            Expr::binary(*op, new_left, new_right, expr.get_type()?.clone())
        }
        ExprKind::Unary { op, operand } => {
            let new = rewrite(rewriter, operand)?;
            if new.same_node(operand) {
                return unchanged();
            }
            Expr::unary(*op, new, expr.get_type()?.clone())
        }
        ExprKind::Cast { expr: inner } => {
            let new = rewrite(rewriter, inner)?;
            if new.same_node(inner) {
                return unchanged();
            }
            Expr::cast(new, expr.get_type()?.clone())
        }
        ExprKind::Apply { function, args } => {
            let new_function = rewrite(rewriter, function)?;
            let (new_args, changed) = rewrite_all(rewriter, args)?;
            if !changed && new_function.same_node(function) {
                return unchanged();
            }
            Expr::apply(new_function, new_args, expr.get_type()?.clone())
        }
        ExprKind::Closure { params, body } => {
            let new = rewrite(rewriter, body)?;
            if new.same_node(body) {
                return unchanged();
            }
            Expr::closure(params.clone(), new)
        }
        ExprKind::Block { statements, last } => {
            let mut changed = false;
            let mut new_statements = Vec::with_capacity(statements.len());
            for statement in statements {
                let new = match statement {
                    Statement::Let {
                        name,
                        mutable,
                        ty,
                        init,
                    } => {
                        let (new_init, init_changed) = rewrite_optional(rewriter, init)?;
                        changed |= init_changed;
                        Statement::Let {
                            name: name.clone(),
                            mutable: *mutable,
                            ty: ty.clone(),
                            init: new_init,
                        }
                    }
                    Statement::Expression(inner) => {
                        let new = rewrite(rewriter, inner)?;
                        changed |= !new.same_node(inner);
                        Statement::Expression(new)
                    }
                };
                new_statements.push(new);
            }
            let (new_last, last_changed) = rewrite_optional(rewriter, last)?;
            if !changed && !last_changed {
                return unchanged();
            }
            Ok(Expr::block(new_statements, new_last))
        }
        ExprKind::If {
            condition,
            positive,
            negative,
        } => {
            let new_condition = rewrite(rewriter, condition)?;
            let new_positive = rewrite(rewriter, positive)?;
            let (new_negative, negative_changed) = rewrite_optional(rewriter, negative)?;
            if new_condition.same_node(condition)
                && new_positive.same_node(positive)
                && !negative_changed
            {
                return unchanged();
            }
            Expr::if_else(new_condition, new_positive, new_negative)
        }
        ExprKind::Match { matched, cases } => {
            let new_matched = rewrite(rewriter, matched)?;
            let mut changed = !new_matched.same_node(matched);
            let mut new_cases = Vec::with_capacity(cases.len());
            for case in cases {
                let result = rewrite(rewriter, &case.result)?;
                changed |= !result.same_node(&case.result);
                new_cases.push(MatchCase {
                    pattern: case.pattern.clone(),
                    result,
                });
            }
            if !changed {
                return unchanged();
            }
            Expr::match_expr(new_matched, new_cases, expr.get_type()?.clone())
        }
        ExprKind::For {
            pattern,
            iterated,
            block,
        } => {
            let new_iterated = rewrite(rewriter, iterated)?;
            let new_block = rewrite(rewriter, block)?;
            if new_iterated.same_node(iterated) && new_block.same_node(block) {
                return unchanged();
            }
            Expr::for_loop(pattern.clone(), new_iterated, new_block)
        }
        ExprKind::Assign { target, value } => {
            let new_target = rewrite(rewriter, target)?;
            let new_value = rewrite(rewriter, value)?;
            if new_target.same_node(target) && new_value.same_node(value) {
                return unchanged();
            }
            Expr::assign(new_target, new_value)
        }
        ExprKind::Tuple(fields) => {
            let (new, changed) = rewrite_all(rewriter, fields)?;
            if !changed {
                return unchanged();
            }
            Expr::tuple(new)
        }
        ExprKind::RawTuple(fields) => {
            let (new, changed) = rewrite_all(rewriter, fields)?;
            if !changed {
                return unchanged();
            }
            Expr::raw_tuple(new)
        }
        ExprKind::Struct { fields } => {
            let (new, changed) = rewrite_all(rewriter, fields)?;
            if !changed {
                return unchanged();
            }
            Expr::structure(expr.get_type()?.clone(), new)
        }
        ExprKind::QualifyType { expr: inner, types } => {
            let new = rewrite(rewriter, inner)?;
            if new.same_node(inner) {
                return unchanged();
            }
            Expr::qualify_type(new, types.clone())
        }
        ExprKind::Borrow {
            expr: inner,
            mutable,
        } => {
            let new = rewrite(rewriter, inner)?;
            if new.same_node(inner) {
                return unchanged();
            }
            Expr::borrow(new, *mutable)
        }
        ExprKind::Deref(inner) => {
            let new = rewrite(rewriter, inner)?;
            if new.same_node(inner) {
                return unchanged();
            }
            Expr::deref(new)
        }
    }
}

/// Local algebraic simplifications
///
/// - `Tup2::new(a, b).1` becomes `b`
/// - `!true` becomes `false`
/// - `false && x`, `x || true` and friends fold to the literal
/// - `true && x` becomes `x` when the types agree
/// - `*&x` becomes `x`
/// - casts to the operand's own type are dropped
#[derive(Debug, Default, Clone, Copy)]
pub struct Simplify;

impl Simplify {
    fn simplify(expr: &Expr) -> IrResult<Option<Expr>> {
        let ty = match expr.ty() {
            Some(ty) => ty,
            None => return Ok(None),
        };
        let result = match expr.kind() {
            ExprKind::Field { expr: inner, index } => match inner.kind() {
                ExprKind::Tuple(fields) | ExprKind::RawTuple(fields) => fields
                    .get(*index)
                    .filter(|field| field.ty() == Some(ty))
                    .cloned(),
                _ => None,
            },
            ExprKind::Unary {
                op: UnaryOp::Not,
                operand,
            } => match operand.as_bool_literal() {
                Some(value) => Some(Expr::literal(
                    Some(LiteralValue::Bool(!value)),
                    ty.clone(),
                )?),
                None => None,
            },
            ExprKind::Binary { op, left, right } if op.is_logical() => {
                let absorbing = *op == BinaryOp::Or;
                match (left.as_bool_literal(), right.as_bool_literal()) {
                    (Some(value), _) | (_, Some(value)) if value == absorbing => Some(
                        Expr::literal(Some(LiteralValue::Bool(absorbing)), ty.clone())?,
                    ),
                    (Some(_), _) if right.ty() == Some(ty) => Some(right.clone()),
                    (_, Some(_)) if left.ty() == Some(ty) => Some(left.clone()),
                    _ => None,
                }
            }
            ExprKind::Deref(inner) => match inner.kind() {
                ExprKind::Borrow { expr: target, .. } => Some(target.clone()),
                _ => None,
            },
            ExprKind::Cast { expr: inner } if inner.ty() == Some(ty) => Some(inner.clone()),
            _ => None,
        };
        Ok(result)
    }
}

impl ExprRewriter for Simplify {
    fn postorder(&mut self, _original: &Expr, rebuilt: Expr) -> IrResult<Expr> {
        match Self::simplify(&rebuilt)? {
            Some(simpler) => {
                log::trace!("Simplified {rebuilt} to {simpler}");
                Ok(simpler)
            }
            None => Ok(rebuilt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Parameter;
    use crate::types::Type;

    fn row() -> Expr {
        Expr::var(
            "t",
            Type::reference(Type::tuple(vec![Type::signed32(), Type::bool()]), false),
        )
    }

    #[test]
    fn test_unchanged_tree_is_returned_as_is() {
        let body = Expr::field(row(), 0).unwrap();
        let closure = Expr::closure(
            vec![Parameter::named("t", row().get_type().unwrap().clone())],
            body,
        )
        .unwrap();
        let result = rewrite(&mut Simplify, &closure).unwrap();
        assert!(result.same_node(&closure));
    }

    #[test]
    fn test_field_of_tuple_is_folded() {
        let a = Expr::i32_literal(1);
        let b = Expr::bool_literal(true);
        let tuple = Expr::tuple(vec![a, b.clone()]).unwrap();
        let access = Expr::field(tuple, 1).unwrap();
        let result = rewrite(&mut Simplify, &access).unwrap();
        assert!(result.same_node(&b));
    }

    #[test]
    fn test_and_with_literals() {
        let flag = Expr::field(row(), 1).unwrap();
        let always = Expr::and(Expr::bool_literal(true), flag.clone()).unwrap();
        assert!(rewrite(&mut Simplify, &always).unwrap().same_node(&flag));

        let never = Expr::and(flag, Expr::bool_literal(false)).unwrap();
        let folded = rewrite(&mut Simplify, &never).unwrap();
        assert_eq!(folded.as_bool_literal(), Some(false));
    }

    #[test]
    fn test_not_literal_and_deref_borrow() {
        let not = Expr::not(Expr::bool_literal(false)).unwrap();
        assert_eq!(
            rewrite(&mut Simplify, &not).unwrap().as_bool_literal(),
            Some(true)
        );

        let x = Expr::i32_literal(7);
        let round_trip = Expr::deref(Expr::borrow(x.clone(), false).unwrap()).unwrap();
        assert!(rewrite(&mut Simplify, &round_trip).unwrap().same_node(&x));
    }

    #[test]
    fn test_rebuild_only_changed_spine() {
        let kept = Expr::field(row(), 0).unwrap();
        let folded = Expr::cast(Expr::i32_literal(3), Type::signed32()).unwrap();
        let sum = Expr::binary(BinaryOp::Add, kept.clone(), folded, Type::signed32()).unwrap();
        let result = rewrite(&mut Simplify, &sum).unwrap();
        assert!(!result.same_node(&sum));
        match result.kind() {
            ExprKind::Binary { left, right, .. } => {
                assert!(left.same_node(&kept));
                assert!(right.is_literal());
            }
            other => panic!("expected binary, got {other:?}"),
        }
    }

    struct RenameVariables;

    impl ExprRewriter for RenameVariables {
        fn preorder(&mut self, expr: &Expr) -> IrResult<Option<Expr>> {
            Ok(match expr.kind() {
                ExprKind::Variable(name) if name == "t" => {
                    Some(Expr::var("row", expr.get_type()?.clone()))
                }
                _ => None,
            })
        }
    }

    #[test]
    fn test_preorder_replacement() {
        let access = Expr::field(row(), 0).unwrap();
        let result = rewrite(&mut RenameVariables, &access).unwrap();
        assert_eq!(result.to_string(), "row.0");
    }
}
