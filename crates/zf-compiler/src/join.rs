//! Join condition analysis
//!
//! Splits a join predicate into equi-join keys and a residual predicate. The
//! predicate ranges over the left row followed by the right row, so columns
//! `[0, left_count)` belong to the left input and the rest to the right.

use crate::error::{CompileError, CompileResult};
use crate::rel::{RelCallOp, RelExpr};
use zf_ir::Type;

/// One equi-join key: left column equals right column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityTest {
    /// Column of the left input
    pub left_column: usize,
    /// Column of the right input, relative to the right row
    pub right_column: usize,
    /// Common non-nullable type both columns are compared as
    pub result_type: Type,
}

/// Result of analyzing a join condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionDecomposition {
    /// Equi-join keys in predicate order
    pub equalities: Vec<EqualityTest>,
    /// What remains to be checked after the equi-join, if anything
    pub residual: Option<RelExpr>,
}

/// Decomposes join conditions for a join of `left_count` and `right_count`
/// columns
#[derive(Debug, Clone, Copy)]
pub struct JoinConditionAnalyzer {
    left_count: usize,
    right_count: usize,
}

enum Side {
    Left(usize),
    Right(usize),
}

struct Analysis {
    left_count: usize,
    total: usize,
    equalities: Vec<EqualityTest>,
    residual: Option<RelExpr>,
}

impl Analysis {
    fn side(&self, expr: &RelExpr) -> CompileResult<Option<(Side, Type)>> {
        let RelExpr::InputRef { index, ty } = expr else {
            return Ok(None);
        };
        if *index >= self.total {
            return Err(CompileError::malformed(
                format!("join condition column ${index}"),
                format!("join inputs have only {} columns", self.total),
            ));
        }
        let side = if *index < self.left_count {
            Side::Left(*index)
        } else {
            Side::Right(*index - self.left_count)
        };
        Ok(Some((side, ty.clone())))
    }

    fn complete(&mut self, expr: &RelExpr) {
        log::trace!("Join condition residual: {expr}");
        self.residual = Some(expr.clone());
    }

    fn equality(&mut self, expr: &RelExpr, left: &RelExpr, right: &RelExpr) -> CompileResult<()> {
        let (Some(left), Some(right)) = (self.side(left)?, self.side(right)?) else {
            self.complete(expr);
            return Ok(());
        };
        let ((left_column, left_type), (right_column, right_type)) = match (left, right) {
            ((Side::Left(l), lt), (Side::Right(r), rt)) => ((l, lt), (r, rt)),
            ((Side::Right(r), rt), (Side::Left(l), lt)) => ((l, lt), (r, rt)),
            _ => {
                self.complete(expr);
                return Ok(());
            }
        };
        let result_type = left_type.reduce(&right_type)?.set_may_be_null(false)?;
        log::trace!("Join key: left ${left_column} = right ${right_column} as {result_type}");
        self.equalities.push(EqualityTest {
            left_column,
            right_column,
            result_type,
        });
        Ok(())
    }

    /// Analyze `expr`; returns true once a residual has been produced
    fn visit(&mut self, expr: &RelExpr) -> CompileResult<bool> {
        match expr {
            RelExpr::Call {
                op: RelCallOp::And,
                operands,
                ..
            } => {
                for (i, operand) in operands.iter().enumerate() {
                    if self.visit(operand)? {
                        if i + 1 < operands.len() {
                            // later conjuncts are not inspected
                            self.complete(expr);
                        }
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            RelExpr::Call {
                op: RelCallOp::Equals,
                operands,
                ..
            } if operands.len() == 2 => {
                self.equality(expr, &operands[0], &operands[1])?;
                Ok(self.residual.is_some())
            }
            _ => {
                self.complete(expr);
                Ok(true)
            }
        }
    }
}

impl JoinConditionAnalyzer {
    pub fn new(left_count: usize, right_count: usize) -> Self {
        Self {
            left_count,
            right_count,
        }
    }

    /// Decompose `condition`. Fails when it yields neither a key nor a
    /// residual.
    pub fn analyze(&self, condition: &RelExpr) -> CompileResult<ConditionDecomposition> {
        let mut analysis = Analysis {
            left_count: self.left_count,
            total: self.left_count + self.right_count,
            equalities: Vec::new(),
            residual: None,
        };
        analysis.visit(condition)?;
        if analysis.equalities.is_empty() && analysis.residual.is_none() {
            return Err(CompileError::EmptyJoinCondition);
        }
        Ok(ConditionDecomposition {
            equalities: analysis.equalities,
            residual: analysis.residual,
        })
    }
}

#[cfg(test)]
#[path = "join_test.rs"]
mod tests;
