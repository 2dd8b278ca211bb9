//! Aggregate functions as group folds
//!
//! A `stream_aggregate` function receives the group key and the group as a
//! vector of `(row, weight)` pairs. Each aggregate keeps one or two mutable
//! accumulators that a single `for` loop over the group updates.

use crate::error::{CompileError, CompileResult};
use crate::rel::{AggregateCall, AggregateFunction};
use zf_ir::{BinaryOp, Expr, ExprKind, Parameter, Pattern, Statement, Type, UnaryOp};

/// Variables bound by the fold loop
struct GroupRow {
    /// `&V`
    row: Expr,
    /// `&Weight`
    weight: Expr,
}

impl GroupRow {
    fn column(&self, index: usize) -> CompileResult<Expr> {
        Ok(Expr::field(self.row.clone(), index)?)
    }

    /// The row weight converted to `ty`
    fn weight_as(&self, ty: &Type) -> CompileResult<Expr> {
        Ok(Expr::cast_if_needed(Expr::deref(self.weight.clone())?, ty)?)
    }

    /// The weight when column `index` is not NULL, else zero
    fn weight_if_present(&self, index: usize, ty: &Type) -> CompileResult<Expr> {
        let weight = self.weight_as(ty)?;
        let column = self.column(index)?;
        if !column.get_type()?.may_be_null() {
            return Ok(weight);
        }
        let is_null = Expr::unary(UnaryOp::IsNull, column, Type::bool())?;
        Ok(Expr::if_else(is_null, ty.zero()?, Some(weight))?)
    }
}

/// Accumulator variable with its initial value and per-row update
struct Accumulator {
    variable: Expr,
    init: Expr,
    update: Expr,
}

impl Accumulator {
    fn new(
        name: String,
        init: Expr,
        update: impl FnOnce(&Expr) -> CompileResult<Expr>,
    ) -> CompileResult<Self> {
        let variable = Expr::var(name, init.get_type()?.clone());
        let update = update(&variable)?;
        Ok(Self {
            variable,
            init,
            update,
        })
    }

    fn declaration(&self) -> CompileResult<Statement> {
        let name = match self.variable.kind() {
            ExprKind::Variable(name) => name.clone(),
            _ => return Err(CompileError::malformed("accumulator", "not a variable")),
        };
        Ok(Statement::binding(name, self.init.clone(), true))
    }

    fn assignment(&self) -> CompileResult<Statement> {
        Ok(Statement::expression(Expr::assign(
            self.variable.clone(),
            self.update.clone(),
        )?))
    }
}

fn argument(call: &AggregateCall) -> CompileResult<usize> {
    call.argument.ok_or_else(|| {
        CompileError::malformed(format!("aggregate {call}"), "missing argument column")
    })
}

fn add(left: &Expr, right: Expr) -> CompileResult<Expr> {
    let ty = left.get_type()?.clone();
    Ok(Expr::binary(BinaryOp::Add, left.clone(), right, ty)?)
}

/// `agg(acc, value)` for a null-skipping combinator
fn combine(op: BinaryOp, acc: &Expr, value: Expr) -> CompileResult<Expr> {
    let ty = acc.get_type()?.clone();
    let value = Expr::cast_if_needed(value, &ty)?;
    Ok(Expr::binary(op, acc.clone(), value, ty)?)
}

/// `column * weight` in type `ty`
fn weighted(group: &GroupRow, index: usize, ty: &Type) -> CompileResult<Expr> {
    let column = Expr::cast_if_needed(group.column(index)?, ty)?;
    Ok(Expr::binary(BinaryOp::Mul, column, group.weight_as(ty)?, ty.clone())?)
}

/// Accumulators for one aggregate and the expression producing its result
fn accumulate(
    position: usize,
    call: &AggregateCall,
    group: &GroupRow,
) -> CompileResult<(Vec<Accumulator>, Expr)> {
    let nullable = call.ty.set_may_be_null(true)?;
    let name = |prefix: &str| format!("{prefix}{position}");
    match call.function {
        AggregateFunction::Count => {
            let acc = Accumulator::new(name("count"), call.ty.zero()?, |acc| {
                let increment = match call.argument {
                    Some(index) => group.weight_if_present(index, &call.ty)?,
                    None => group.weight_as(&call.ty)?,
                };
                add(acc, increment)
            })?;
            let result = acc.variable.clone();
            Ok((vec![acc], result))
        }
        AggregateFunction::Sum => {
            let index = argument(call)?;
            let acc = Accumulator::new(name("sum"), Expr::null(&nullable)?, |acc| {
                combine(BinaryOp::AggPlus, acc, weighted(group, index, &nullable)?)
            })?;
            let result = Expr::cast_if_needed(acc.variable.clone(), &call.ty)?;
            Ok((vec![acc], result))
        }
        AggregateFunction::Min | AggregateFunction::Max => {
            let index = argument(call)?;
            let (op, prefix) = if call.function == AggregateFunction::Min {
                (BinaryOp::AggMin, "min")
            } else {
                (BinaryOp::AggMax, "max")
            };
            let acc = Accumulator::new(name(prefix), Expr::null(&nullable)?, |acc| {
                combine(op, acc, group.column(index)?)
            })?;
            let result = Expr::cast_if_needed(acc.variable.clone(), &call.ty)?;
            Ok((vec![acc], result))
        }
        AggregateFunction::Avg => {
            let index = argument(call)?;
            let sum = Accumulator::new(name("avg_sum"), Expr::null(&nullable)?, |acc| {
                combine(BinaryOp::AggPlus, acc, weighted(group, index, &nullable)?)
            })?;
            let count = Accumulator::new(name("avg_count"), Type::weight().zero()?, |acc| {
                add(acc, group.weight_if_present(index, &Type::weight())?)
            })?;
            let divisor = Expr::cast_if_needed(count.variable.clone(), &nullable)?;
            let average = Expr::binary(
                BinaryOp::Div,
                sum.variable.clone(),
                divisor,
                nullable.clone(),
            )?;
            let result = Expr::cast_if_needed(average, &call.ty)?;
            Ok((vec![sum, count], result))
        }
    }
}

/// Build the fold closure `|key: &K, group: &Vec<(V, Weight)>| -> (A0, A1, ..)`
/// and return it with its result type
pub fn fold_function(
    key_type: &Type,
    value_type: &Type,
    aggregates: &[AggregateCall],
) -> CompileResult<(Expr, Type)> {
    let group_type = Type::vec(Type::raw_tuple(vec![value_type.clone(), Type::weight()]));
    let group = GroupRow {
        row: Expr::var("v", Type::reference(value_type.clone(), false)),
        weight: Expr::var("w", Type::reference(Type::weight(), false)),
    };

    let mut accumulators = Vec::new();
    let mut results = Vec::with_capacity(aggregates.len());
    for (position, call) in aggregates.iter().enumerate() {
        let (accs, result) = accumulate(position, call, &group)?;
        accumulators.extend(accs);
        results.push(result);
    }

    let body = Expr::block(
        accumulators
            .iter()
            .map(Accumulator::assignment)
            .collect::<CompileResult<Vec<_>>>()?,
        None,
    );
    let group_var = Expr::var("g", Type::reference(group_type.clone(), false));
    let fold = Expr::for_loop(
        Pattern::tuple(vec![Pattern::identifier("v"), Pattern::identifier("w")]),
        group_var,
        body,
    )?;

    let mut statements = accumulators
        .iter()
        .map(Accumulator::declaration)
        .collect::<CompileResult<Vec<_>>>()?;
    statements.push(Statement::expression(fold));
    let result = Expr::tuple(results)?;
    let result_type = result.get_type()?.clone();

    let function = Expr::closure(
        vec![
            Parameter::named("k", Type::reference(key_type.clone(), false)),
            Parameter::named("g", Type::reference(group_type, false)),
        ],
        Expr::block(statements, Some(result)),
    )?;
    Ok((function, result_type))
}

/// Result row of aggregates over an empty input: zero for counts and NULL
/// for everything else
pub fn empty_group_row(aggregates: &[AggregateCall]) -> CompileResult<Expr> {
    let fields = aggregates
        .iter()
        .map(|call| match call.function {
            AggregateFunction::Count => Ok(call.ty.zero()?),
            _ if !call.ty.may_be_null() => Err(CompileError::malformed(
                format!("aggregate {call}"),
                "result over an empty input must be nullable",
            )),
            _ => Ok(Expr::null(&call.ty)?),
        })
        .collect::<CompileResult<Vec<_>>>()?;
    Ok(Expr::tuple(fields)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zf_ir::FreeVariables;

    fn row_type() -> Type {
        Type::tuple(vec![
            Type::signed32(),
            Type::double().set_may_be_null(true).unwrap(),
        ])
    }

    fn key_type() -> Type {
        Type::tuple(vec![Type::signed32()])
    }

    #[test]
    fn test_count_star_fold() {
        let calls = [AggregateCall::new(AggregateFunction::Count, None, Type::signed64())];
        let (function, result) = fold_function(&key_type(), &row_type(), &calls).unwrap();
        assert!(result.same_type(&Type::tuple(vec![Type::signed64()])));
        assert_eq!(
            function.to_string(),
            "move |k: &Tup1<i32>, g: &Vec<(Tup2<i32, Option<f64>>, i64)>| \
             { let mut count0: i64 = 0; for (v, w) in g { count0 = (count0 + (*w)); }; Tup1::new(count0) }"
        );
        assert!(FreeVariables::of(&function).is_empty());
    }

    #[test]
    fn test_nullable_aggregates_use_null_skipping_combinators() {
        let nullable = Type::double().set_may_be_null(true).unwrap();
        let calls = [
            AggregateCall::new(AggregateFunction::Sum, Some(1), nullable.clone()),
            AggregateCall::new(AggregateFunction::Max, Some(1), nullable.clone()),
            AggregateCall::new(AggregateFunction::Count, Some(1), Type::signed64()),
        ];
        let (function, _) = fold_function(&key_type(), &row_type(), &calls).unwrap();
        let text = function.to_string();
        assert!(text.contains("sum0 = agg_plus(sum0, (v.1 * ((*w) as Option<f64>)))"), "{text}");
        assert!(text.contains("max1 = agg_max(max1, v.1)"), "{text}");
        assert!(text.contains("if v.1.is_none() { 0 } else { (*w) }"), "{text}");
    }

    #[test]
    fn test_sum_requires_argument() {
        let calls = [AggregateCall::new(AggregateFunction::Sum, None, Type::signed64())];
        let err = fold_function(&key_type(), &row_type(), &calls).unwrap_err();
        assert!(err.to_string().contains("missing argument"));
    }

    #[test]
    fn test_empty_group_row() {
        let nullable = Type::double().set_may_be_null(true).unwrap();
        let calls = [
            AggregateCall::new(AggregateFunction::Count, None, Type::signed64()),
            AggregateCall::new(AggregateFunction::Avg, Some(1), nullable),
        ];
        let row = empty_group_row(&calls).unwrap();
        assert_eq!(row.to_string(), "Tup2::new(0, None::<f64>)");

        let calls = [AggregateCall::new(AggregateFunction::Min, Some(0), Type::signed32())];
        assert!(empty_group_row(&calls).is_err());
    }
}
