//! Translation of relational expressions into row functions

use crate::error::{CompileError, CompileResult};
use crate::rel::{RelCallOp, RelExpr};
use zf_ir::{BinaryOp, Expr, Type, UnaryOp};

/// Compiles [`RelExpr`]s that read columns of one row variable
pub struct ExprCompiler {
    row: Option<Expr>,
}

impl ExprCompiler {
    /// Column references resolve to fields of `row`, which is usually a
    /// closure parameter of reference type
    pub fn new(row: Expr) -> Self {
        Self { row: Some(row) }
    }

    /// For constant expressions; column references are rejected
    pub fn constant() -> Self {
        Self { row: None }
    }

    /// Cast `expr` to the kind of `target`, keeping its own nullability
    fn promote(expr: Expr, target: &Type) -> CompileResult<Expr> {
        let nullable = expr.get_type()?.may_be_null();
        let ty = target.set_may_be_null(nullable)?;
        Ok(Expr::cast_if_needed(expr, &ty)?)
    }

    fn binary_op(op: RelCallOp) -> Option<BinaryOp> {
        let op = match op {
            RelCallOp::Equals => BinaryOp::Eq,
            RelCallOp::NotEquals => BinaryOp::Neq,
            RelCallOp::LessThan => BinaryOp::Lt,
            RelCallOp::LessThanOrEqual => BinaryOp::Lte,
            RelCallOp::GreaterThan => BinaryOp::Gt,
            RelCallOp::GreaterThanOrEqual => BinaryOp::Gte,
            RelCallOp::And => BinaryOp::And,
            RelCallOp::Or => BinaryOp::Or,
            RelCallOp::Plus => BinaryOp::Add,
            RelCallOp::Minus => BinaryOp::Sub,
            RelCallOp::Times => BinaryOp::Mul,
            RelCallOp::Divide => BinaryOp::Div,
            RelCallOp::Mod => BinaryOp::Mod,
            RelCallOp::Concat => BinaryOp::Concat,
            RelCallOp::Not | RelCallOp::Negate | RelCallOp::IsNull | RelCallOp::IsNotNull => {
                return None
            }
        };
        Some(op)
    }

    fn unary_op(op: RelCallOp) -> Option<UnaryOp> {
        match op {
            RelCallOp::Not => Some(UnaryOp::Not),
            RelCallOp::Negate => Some(UnaryOp::Neg),
            RelCallOp::IsNull => Some(UnaryOp::IsNull),
            RelCallOp::IsNotNull => Some(UnaryOp::IsNotNull),
            _ => None,
        }
    }

    fn call(&self, op: RelCallOp, operands: &[RelExpr], ty: &Type) -> CompileResult<Expr> {
        let compiled = operands
            .iter()
            .map(|operand| self.compile(operand))
            .collect::<CompileResult<Vec<_>>>()?;
        match (Self::binary_op(op), Self::unary_op(op), compiled.as_slice()) {
            (Some(binary), _, [left, right]) => {
                if binary.is_logical() {
                    return Ok(Expr::binary(binary, left.clone(), right.clone(), ty.clone())?);
                }
                let common = left.get_type()?.deref().reduce(right.get_type()?.deref())?;
                let left = Self::promote(left.clone(), &common)?;
                let right = Self::promote(right.clone(), &common)?;
                if binary.is_comparison() {
                    return Ok(Expr::binary(binary, left, right, ty.clone())?);
                }
                // arithmetic happens in the operand type, then converts
                let result = Expr::binary(binary, left, right, common)?;
                Ok(Expr::cast_if_needed(result, ty)?)
            }
            (_, Some(unary), [operand]) => Ok(Expr::unary(unary, operand.clone(), ty.clone())?),
            _ => Err(CompileError::malformed(
                format!("call {op}"),
                format!("unexpected operand count {}", operands.len()),
            )),
        }
    }

    pub fn compile(&self, expr: &RelExpr) -> CompileResult<Expr> {
        match expr {
            RelExpr::InputRef { index, ty } => {
                let row = self.row.as_ref().ok_or_else(|| {
                    CompileError::malformed(
                        format!("column ${index}"),
                        "column reference in a constant expression",
                    )
                })?;
                let field = Expr::field(row.clone(), *index)?;
                let field_type = field.get_type()?;
                if !field_type.same_type(ty) {
                    return Err(CompileError::malformed(
                        format!("column ${index}"),
                        format!("declared as {ty} but the row holds {field_type}"),
                    ));
                }
                Ok(field)
            }
            RelExpr::Literal { value, ty } => Ok(Expr::literal(value.clone(), ty.clone())?),
            RelExpr::Cast { operand, ty } => {
                Ok(Expr::cast_if_needed(self.compile(operand)?, ty)?)
            }
            RelExpr::Call { op, operands, ty } => self.call(*op, operands, ty),
        }
    }

    /// Compile a predicate so that NULL counts as false
    pub fn compile_predicate(&self, expr: &RelExpr) -> CompileResult<Expr> {
        let compiled = self.compile(expr)?;
        let ty = compiled.get_type()?;
        if !ty.is_bool() {
            return Err(CompileError::Ir(zf_ir::IrError::TypeMismatch {
                context: format!("predicate {expr}"),
                expected: "bool".to_string(),
                found: ty.to_string(),
            }));
        }
        if ty.may_be_null() {
            Ok(Expr::unary(UnaryOp::WrapBool, compiled, Type::bool())?)
        } else {
            Ok(compiled)
        }
    }
}
