//! Typed expression IR for per-row operator functions
//!
//! Expressions are immutable and reference counted. Cloning an [`Expr`] shares
//! the node, and [`Expr::same_node`] tests that sharing. `PartialEq` and `Hash`
//! are structural, so expressions can key a Z-set literal.

use crate::error::{IrError, IrResult};
use crate::literal::LiteralValue;
use crate::pattern::Pattern;
use crate::statement::Statement;
use crate::types::{Type, TypeKind};
use crate::zset::ZSetLiteral;
use ordered_float::OrderedFloat;
use std::sync::Arc;

/// Binary operation tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    And,
    Or,
    /// String concatenation
    Concat,
    /// Addition that treats NULL as the identity
    AggPlus,
    /// Minimum that ignores NULL
    AggMin,
    /// Maximum that ignores NULL
    AggMax,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Neq
                | BinaryOp::Lt
                | BinaryOp::Lte
                | BinaryOp::Gt
                | BinaryOp::Gte
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }

    pub fn is_aggregate(self) -> bool {
        matches!(self, BinaryOp::AggPlus | BinaryOp::AggMin | BinaryOp::AggMax)
    }
}

impl std::fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Lte => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Gte => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Concat => "++",
            BinaryOp::AggPlus => "agg_plus",
            BinaryOp::AggMin => "agg_min",
            BinaryOp::AggMax => "agg_max",
        };
        f.write_str(symbol)
    }
}

/// Unary operation tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    IsNull,
    IsNotNull,
    /// Converts a nullable boolean to a boolean, mapping NULL to false
    WrapBool,
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::IsNull => "is_none",
            UnaryOp::IsNotNull => "is_some",
            UnaryOp::WrapBool => "wrap_bool",
        };
        f.write_str(name)
    }
}

/// Closure parameter with an optional declared type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Parameter {
    pub pattern: Pattern,
    pub ty: Option<Type>,
}

impl Parameter {
    pub fn new(pattern: Pattern, ty: Option<Type>) -> Self {
        Self { pattern, ty }
    }

    /// Parameter binding a single name to a declared type
    pub fn named(name: impl Into<String>, ty: Type) -> Self {
        Self::new(Pattern::identifier(name), Some(ty))
    }
}

/// One arm of a match expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub result: Expr,
}

/// A `::`-separated path naming a runtime item
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    pub fn new(segments: Vec<String>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.segments.join("::"))
    }
}

/// Expression variants
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum ExprKind {
    /// Literal; `None` is NULL
    Literal(Option<LiteralValue>),
    Variable(String),
    /// Tuple field access; looks through references
    Field { expr: Expr, index: usize },
    Binary { op: BinaryOp, left: Expr, right: Expr },
    Unary { op: UnaryOp, operand: Expr },
    /// Conversion to the expression's own type
    Cast { expr: Expr },
    Apply { function: Expr, args: Vec<Expr> },
    Closure { params: Vec<Parameter>, body: Expr },
    Block {
        statements: Vec<Statement>,
        last: Option<Expr>,
    },
    If {
        condition: Expr,
        positive: Expr,
        negative: Option<Expr>,
    },
    Match { matched: Expr, cases: Vec<MatchCase> },
    For {
        pattern: Pattern,
        iterated: Expr,
        block: Expr,
    },
    Assign { target: Expr, value: Expr },
    Tuple(Vec<Expr>),
    RawTuple(Vec<Expr>),
    /// Struct construction; field names come from the struct type
    Struct { fields: Vec<Expr> },
    Path(Path),
    QualifyType { expr: Expr, types: Vec<Type> },
    Borrow { expr: Expr, mutable: bool },
    Deref(Expr),
    ZSet(ZSetLiteral),
}

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ExprNode {
    ty: Option<Type>,
    kind: ExprKind,
}

/// Shared handle to an immutable expression node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Expr(Arc<ExprNode>);

fn expect_bool(context: &str, expr: &Expr) -> IrResult<()> {
    let ty = expr.get_type()?;
    if ty.deref().is_bool() {
        Ok(())
    } else {
        Err(IrError::mismatch(context, "bool", ty))
    }
}

fn expect_non_null_bool(context: &str, ty: &Type) -> IrResult<()> {
    if ty.is_bool() && !ty.may_be_null() {
        Ok(())
    } else {
        Err(IrError::mismatch(context, "bool", ty))
    }
}

fn is_string(ty: &Type) -> bool {
    matches!(ty.kind(), TypeKind::String | TypeKind::Str)
}

fn field_types(context: &str, fields: &[Expr]) -> IrResult<Vec<Type>> {
    fields
        .iter()
        .map(|field| {
            field
                .ty()
                .cloned()
                .ok_or_else(|| IrError::malformed(context, "tuple field has no type"))
        })
        .collect()
}

impl Expr {
    fn new(ty: Option<Type>, kind: ExprKind) -> Self {
        Expr(Arc::new(ExprNode { ty, kind }))
    }

    /// Static type, absent for expressions that produce no value
    pub fn ty(&self) -> Option<&Type> {
        self.0.ty.as_ref()
    }

    /// Static type, failing when the expression has none
    pub fn get_type(&self) -> IrResult<&Type> {
        self.ty()
            .ok_or_else(|| IrError::malformed(format!("expression {self}"), "has no type"))
    }

    pub fn kind(&self) -> &ExprKind {
        &self.0.kind
    }

    /// True when both handles share one node
    pub fn same_node(&self, other: &Expr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // ---- literals ----

    /// Literal of type `ty`; `None` is NULL and needs a nullable type
    pub fn literal(value: Option<LiteralValue>, ty: Type) -> IrResult<Expr> {
        match &value {
            None if !ty.may_be_null() => {
                return Err(IrError::malformed(
                    format!("literal of type {ty}"),
                    "NULL value requires a nullable type",
                ))
            }
            None => {}
            Some(v) => v.check(&ty)?,
        }
        Ok(Expr::new(Some(ty), ExprKind::Literal(value)))
    }

    /// NULL of the nullable version of `ty`
    pub fn null(ty: &Type) -> IrResult<Expr> {
        Expr::literal(None, ty.set_may_be_null(true)?)
    }

    pub fn bool_literal(value: bool) -> Expr {
        Expr::new(
            Some(Type::bool()),
            ExprKind::Literal(Some(LiteralValue::Bool(value))),
        )
    }

    pub fn i32_literal(value: i32) -> Expr {
        Expr::new(
            Some(Type::signed32()),
            ExprKind::Literal(Some(LiteralValue::Int(i128::from(value)))),
        )
    }

    pub fn i64_literal(value: i64) -> Expr {
        Expr::new(
            Some(Type::signed64()),
            ExprKind::Literal(Some(LiteralValue::Int(i128::from(value)))),
        )
    }

    pub fn f64_literal(value: f64) -> Expr {
        Expr::new(
            Some(Type::double()),
            ExprKind::Literal(Some(LiteralValue::Float(OrderedFloat(value)))),
        )
    }

    pub fn string_literal(value: impl Into<String>) -> Expr {
        Expr::new(
            Some(Type::string()),
            ExprKind::Literal(Some(LiteralValue::String(value.into()))),
        )
    }

    /// The unit value `()`
    pub fn unit() -> Expr {
        Expr::new(Some(Type::unit()), ExprKind::RawTuple(Vec::new()))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind(), ExprKind::Literal(_))
    }

    /// Literal boolean value, if this is a non-NULL boolean literal
    pub fn as_bool_literal(&self) -> Option<bool> {
        match self.kind() {
            ExprKind::Literal(Some(LiteralValue::Bool(b))) => Some(*b),
            _ => None,
        }
    }

    // ---- references to values ----

    pub fn var(name: impl Into<String>, ty: Type) -> Expr {
        Expr::new(Some(ty), ExprKind::Variable(name.into()))
    }

    pub fn path(path: Path, ty: Type) -> Expr {
        Expr::new(Some(ty), ExprKind::Path(path))
    }

    /// `expr.index`; the field of a nullable tuple is nullable
    pub fn field(expr: Expr, index: usize) -> IrResult<Expr> {
        let base = expr.get_type()?;
        let tuple = base.deref();
        let fields = tuple
            .tuple_fields()
            .ok_or_else(|| IrError::mismatch("field access", "tuple", base))?;
        let field = fields.get(index).ok_or_else(|| {
            IrError::malformed(
                format!("field access {expr}.{index}"),
                format!("type {tuple} has {} fields", fields.len()),
            )
        })?;
        let ty = if tuple.may_be_null() {
            field.set_may_be_null(true)?
        } else {
            field.clone()
        };
        Ok(Expr::new(Some(ty), ExprKind::Field { expr, index }))
    }

    pub fn borrow(expr: Expr, mutable: bool) -> IrResult<Expr> {
        let ty = Type::reference(expr.get_type()?.clone(), mutable);
        Ok(Expr::new(Some(ty), ExprKind::Borrow { expr, mutable }))
    }

    pub fn deref(expr: Expr) -> IrResult<Expr> {
        let ty = match expr.get_type()?.kind() {
            TypeKind::Reference { inner, .. } => inner.as_ref().clone(),
            _ => {
                return Err(IrError::mismatch(
                    "dereference",
                    "reference",
                    expr.get_type()?,
                ))
            }
        };
        Ok(Expr::new(Some(ty), ExprKind::Deref(expr)))
    }

    // ---- operations ----

    /// Binary operation with a statically resolved result type
    pub fn binary(op: BinaryOp, left: Expr, right: Expr, ty: Type) -> IrResult<Expr> {
        let context = format!("operator {op}");
        let left_type = left.get_type()?;
        let right_type = right.get_type()?;
        if op.is_logical() {
            expect_bool(&context, &left)?;
            expect_bool(&context, &right)?;
            if !ty.is_bool() {
                return Err(IrError::mismatch(context, "bool", &ty));
            }
        } else if op.is_comparison() {
            if left_type.deref().kind() != right_type.deref().kind() {
                return Err(IrError::mismatch(context, left_type, right_type));
            }
            if !ty.is_bool() {
                return Err(IrError::mismatch(context, "bool", &ty));
            }
        } else if op.is_aggregate() {
            if left_type.kind() != right_type.kind() {
                return Err(IrError::mismatch(context, left_type, right_type));
            }
        } else {
            let (left_type, right_type) = (left_type.deref(), right_type.deref());
            let operands_fit = if op == BinaryOp::Concat {
                is_string(left_type) && is_string(right_type)
            } else {
                left_type.is_numeric() && right_type.is_numeric()
            };
            if !operands_fit {
                let expected = if op == BinaryOp::Concat {
                    "string operands"
                } else {
                    "numeric operands"
                };
                return Err(IrError::mismatch(
                    context,
                    expected,
                    format!("{left_type} and {right_type}"),
                ));
            }
            let result = left_type.reduce(right_type)?;
            if !result.same_type(&ty) {
                return Err(IrError::mismatch(context, result, &ty));
            }
        }
        Ok(Expr::new(Some(ty), ExprKind::Binary { op, left, right }))
    }

    pub fn unary(op: UnaryOp, operand: Expr, ty: Type) -> IrResult<Expr> {
        let context = format!("operator {op}");
        match op {
            UnaryOp::Not => {
                expect_bool(&context, &operand)?;
                if !ty.is_bool() {
                    return Err(IrError::mismatch(context, "bool", &ty));
                }
            }
            UnaryOp::WrapBool => {
                expect_bool(&context, &operand)?;
                expect_non_null_bool(&context, &ty)?;
            }
            UnaryOp::IsNull | UnaryOp::IsNotNull => expect_non_null_bool(&context, &ty)?,
            UnaryOp::Neg | UnaryOp::Plus => {
                let operand_type = operand.get_type()?;
                if !operand_type.is_numeric() {
                    return Err(IrError::mismatch(context, "numeric type", operand_type));
                }
            }
        }
        Ok(Expr::new(Some(ty), ExprKind::Unary { op, operand }))
    }

    /// Convenience for `!expr` on a non-nullable boolean
    pub fn not(operand: Expr) -> IrResult<Expr> {
        let ty = operand.get_type()?.clone();
        Expr::unary(UnaryOp::Not, operand, ty)
    }

    /// `left && right` with SQL nullability
    pub fn and(left: Expr, right: Expr) -> IrResult<Expr> {
        let nullable = left.get_type()?.may_be_null() || right.get_type()?.may_be_null();
        Expr::binary(
            BinaryOp::And,
            left,
            right,
            Type::bool().set_may_be_null(nullable)?,
        )
    }

    /// Conversion of `expr` to `ty`. Scalars convert into each other; any
    /// other type only changes its nullability.
    pub fn cast(expr: Expr, ty: Type) -> IrResult<Expr> {
        let source = expr.get_type()?;
        let convertible = source.kind() == ty.kind()
            || (source.is_scalar() && ty.is_scalar())
            || (matches!(source.kind(), TypeKind::Null) && ty.may_be_null());
        if !convertible {
            return Err(IrError::mismatch(
                format!("cast of {expr}"),
                format!("a type convertible from {source}"),
                &ty,
            ));
        }
        Ok(Expr::new(Some(ty), ExprKind::Cast { expr }))
    }

    /// Cast only when the type actually differs
    pub fn cast_if_needed(expr: Expr, ty: &Type) -> IrResult<Expr> {
        if expr.get_type()?.same_type(ty) {
            Ok(expr)
        } else {
            Expr::cast(expr, ty.clone())
        }
    }

    /// Call of a function-typed expression; parameters typed `Any` accept
    /// any argument
    pub fn apply(function: Expr, args: Vec<Expr>, ty: Type) -> IrResult<Expr> {
        let context = format!("call of {function}");
        let function_type = function.get_type()?;
        let TypeKind::Function { result, params } = function_type.kind() else {
            return Err(IrError::mismatch(context, "function", function_type));
        };
        if params.len() != args.len() {
            return Err(IrError::malformed(
                context,
                format!("expected {} arguments, got {}", params.len(), args.len()),
            ));
        }
        for (param, arg) in params.iter().zip(&args) {
            let arg_type = arg.get_type()?;
            if !matches!(param.kind(), TypeKind::Any) && !param.same_type(arg_type) {
                return Err(IrError::mismatch(context, param, arg_type));
            }
        }
        if let Some(result) = result {
            if !result.same_type(&ty) {
                return Err(IrError::mismatch(context, result, &ty));
            }
        }
        Ok(Expr::new(Some(ty), ExprKind::Apply { function, args }))
    }

    // ---- functions and control flow ----

    /// Closure whose type is derived from its parameters and body.
    /// Each declared parameter type must fit its pattern.
    pub fn closure(params: Vec<Parameter>, body: Expr) -> IrResult<Expr> {
        for param in &params {
            if let Some(ty) = &param.ty {
                param.pattern.check_against(ty)?;
            }
        }
        let param_types = params
            .iter()
            .map(|p| p.ty.clone().unwrap_or_else(Type::any))
            .collect();
        let ty = Type::function(body.ty().cloned(), param_types);
        Ok(Expr::new(Some(ty), ExprKind::Closure { params, body }))
    }

    /// Parameters, if this is a closure
    pub fn closure_params(&self) -> Option<&[Parameter]> {
        match self.kind() {
            ExprKind::Closure { params, .. } => Some(params),
            _ => None,
        }
    }

    /// The `Function` type of a closure
    pub fn function_type(&self) -> Option<&Type> {
        match self.kind() {
            ExprKind::Closure { .. } => self.ty(),
            _ => None,
        }
    }

    /// Declared result type of a closure
    pub fn result_type(&self) -> Option<&Type> {
        match self.function_type().map(Type::kind) {
            Some(TypeKind::Function { result, .. }) => result.as_deref(),
            _ => None,
        }
    }

    /// Block; its type is the type of `last`
    pub fn block(statements: Vec<Statement>, last: Option<Expr>) -> Expr {
        let ty = last.as_ref().and_then(|e| e.ty().cloned());
        Expr::new(ty, ExprKind::Block { statements, last })
    }

    pub fn if_else(condition: Expr, positive: Expr, negative: Option<Expr>) -> IrResult<Expr> {
        expect_bool("if condition", &condition)?;
        let ty = match &negative {
            Some(negative) => {
                if positive.ty() != negative.ty() {
                    return Err(IrError::mismatch(
                        "if branches",
                        type_name(positive.ty()),
                        type_name(negative.ty()),
                    ));
                }
                positive.ty().cloned()
            }
            None => None,
        };
        Ok(Expr::new(
            ty,
            ExprKind::If {
                condition,
                positive,
                negative,
            },
        ))
    }

    pub fn match_expr(matched: Expr, cases: Vec<MatchCase>, ty: Type) -> IrResult<Expr> {
        if cases.is_empty() {
            return Err(IrError::malformed(
                format!("match on {matched}"),
                "no cases",
            ));
        }
        let matched_type = matched.get_type()?;
        for case in &cases {
            case.pattern.check_against(matched_type)?;
            let result = case.result.get_type()?;
            if !result.same_type(&ty) {
                return Err(IrError::mismatch("match arm", &ty, result));
            }
        }
        Ok(Expr::new(Some(ty), ExprKind::Match { matched, cases }))
    }

    /// `for pattern in iterated block`; the iterated value must be a
    /// (reference to a) vector and `block` must be a block expression
    pub fn for_loop(pattern: Pattern, iterated: Expr, block: Expr) -> IrResult<Expr> {
        if !matches!(block.kind(), ExprKind::Block { .. }) {
            return Err(IrError::malformed(
                format!("for {pattern} in {iterated}"),
                "loop body is not a block",
            ));
        }
        let iterated_type = iterated.get_type()?;
        match iterated_type.deref().kind() {
            TypeKind::Vec(element) => pattern.check_against(element)?,
            _ => return Err(IrError::mismatch("for loop", "Vec", iterated_type)),
        }
        Ok(Expr::new(
            Some(Type::unit()),
            ExprKind::For {
                pattern,
                iterated,
                block,
            },
        ))
    }

    pub fn assign(target: Expr, value: Expr) -> IrResult<Expr> {
        if !matches!(
            target.kind(),
            ExprKind::Variable(_) | ExprKind::Field { .. }
        ) {
            return Err(IrError::malformed(
                format!("assignment to {target}"),
                "target is not assignable",
            ));
        }
        let target_type = target.get_type()?;
        let value_type = value.get_type()?;
        if !target_type.same_type(value_type) {
            return Err(IrError::mismatch(
                format!("assignment to {target}"),
                target_type,
                value_type,
            ));
        }
        Ok(Expr::new(Some(Type::unit()), ExprKind::Assign { target, value }))
    }

    // ---- constructors ----

    pub fn tuple(fields: Vec<Expr>) -> IrResult<Expr> {
        let ty = Type::tuple(field_types("tuple", &fields)?);
        Ok(Expr::new(Some(ty), ExprKind::Tuple(fields)))
    }

    pub fn raw_tuple(fields: Vec<Expr>) -> IrResult<Expr> {
        let ty = Type::raw_tuple(field_types("raw tuple", &fields)?);
        Ok(Expr::new(Some(ty), ExprKind::RawTuple(fields)))
    }

    pub fn structure(ty: Type, fields: Vec<Expr>) -> IrResult<Expr> {
        let TypeKind::Struct { name, fields: declared } = ty.kind() else {
            return Err(IrError::mismatch("struct expression", "struct type", &ty));
        };
        if declared.len() != fields.len() {
            return Err(IrError::malformed(
                format!("struct {name}"),
                format!("expected {} fields, got {}", declared.len(), fields.len()),
            ));
        }
        for (decl, field) in declared.iter().zip(&fields) {
            let actual = field.get_type()?;
            if !actual.same_type(&decl.ty) {
                return Err(IrError::mismatch(
                    format!("field {name}.{}", decl.name),
                    &decl.ty,
                    actual,
                ));
            }
        }
        Ok(Expr::new(Some(ty), ExprKind::Struct { fields }))
    }

    /// Explicit generic arguments on `expr`
    pub fn qualify_type(expr: Expr, types: Vec<Type>) -> IrResult<Expr> {
        let ty = expr.get_type()?.clone();
        Ok(Expr::new(Some(ty), ExprKind::QualifyType { expr, types }))
    }

    pub fn zset(literal: ZSetLiteral) -> Expr {
        Expr::new(Some(literal.zset_type()), ExprKind::ZSet(literal))
    }

    /// Compare one level of structure. Sub-expressions are compared by node
    /// identity, so separately built equal trees are not shallow-same.
    /// Loops never compare equal.
    pub fn shallow_same_expression(&self, other: &Expr) -> bool {
        if self.same_node(other) {
            return true;
        }
        if self.ty() != other.ty() {
            return false;
        }
        use ExprKind::*;
        match (self.kind(), other.kind()) {
            (Literal(a), Literal(b)) => a == b,
            (Variable(a), Variable(b)) => a == b,
            (Field { expr: a, index: i }, Field { expr: b, index: j }) => {
                i == j && a.same_node(b)
            }
            (
                Binary {
                    op: op_a,
                    left: la,
                    right: ra,
                },
                Binary {
                    op: op_b,
                    left: lb,
                    right: rb,
                },
            ) => op_a == op_b && la.same_node(lb) && ra.same_node(rb),
            (
                Unary {
                    op: op_a,
                    operand: a,
                },
                Unary {
                    op: op_b,
                    operand: b,
                },
            ) => op_a == op_b && a.same_node(b),
            (Cast { expr: a }, Cast { expr: b }) => a.same_node(b),
            (
                Apply {
                    function: fa,
                    args: aa,
                },
                Apply {
                    function: fb,
                    args: ab,
                },
            ) => fa.same_node(fb) && same_nodes(aa, ab),
            (
                Closure {
                    params: pa,
                    body: ba,
                },
                Closure {
                    params: pb,
                    body: bb,
                },
            ) => pa == pb && ba.same_node(bb),
            (
                Block {
                    statements: sa,
                    last: la,
                },
                Block {
                    statements: sb,
                    last: lb,
                },
            ) => {
                sa.len() == sb.len()
                    && sa.iter().zip(sb).all(|(a, b)| same_statement(a, b))
                    && same_optional(la, lb)
            }
            (
                If {
                    condition: ca,
                    positive: pa,
                    negative: na,
                },
                If {
                    condition: cb,
                    positive: pb,
                    negative: nb,
                },
            ) => ca.same_node(cb) && pa.same_node(pb) && same_optional(na, nb),
            (
                Match {
                    matched: ma,
                    cases: ca,
                },
                Match {
                    matched: mb,
                    cases: cb,
                },
            ) => {
                ma.same_node(mb)
                    && ca.len() == cb.len()
                    && ca
                        .iter()
                        .zip(cb)
                        .all(|(a, b)| a.pattern == b.pattern && a.result.same_node(&b.result))
            }
            (For { .. }, For { .. }) => false,
            (
                Assign {
                    target: ta,
                    value: va,
                },
                Assign {
                    target: tb,
                    value: vb,
                },
            ) => ta.same_node(tb) && va.same_node(vb),
            (Tuple(a), Tuple(b)) | (RawTuple(a), RawTuple(b)) => same_nodes(a, b),
            (Struct { fields: a }, Struct { fields: b }) => same_nodes(a, b),
            (ExprKind::Path(a), ExprKind::Path(b)) => a == b,
            (
                QualifyType {
                    expr: ea,
                    types: ta,
                },
                QualifyType {
                    expr: eb,
                    types: tb,
                },
            ) => ea.same_node(eb) && ta == tb,
            (
                Borrow {
                    expr: a,
                    mutable: ma,
                },
                Borrow {
                    expr: b,
                    mutable: mb,
                },
            ) => ma == mb && a.same_node(b),
            (Deref(a), Deref(b)) => a.same_node(b),
            (ZSet(a), ZSet(b)) => a == b,
            _ => false,
        }
    }
}

fn same_nodes(a: &[Expr], b: &[Expr]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_node(y))
}

fn same_optional(a: &Option<Expr>, b: &Option<Expr>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.same_node(b),
        (None, None) => true,
        _ => false,
    }
}

fn same_statement(a: &Statement, b: &Statement) -> bool {
    match (a, b) {
        (
            Statement::Let {
                name: na,
                mutable: ma,
                ty: ta,
                init: ia,
            },
            Statement::Let {
                name: nb,
                mutable: mb,
                ty: tb,
                init: ib,
            },
        ) => na == nb && ma == mb && ta == tb && same_optional(ia, ib),
        (Statement::Expression(a), Statement::Expression(b)) => a.same_node(b),
        _ => false,
    }
}

fn type_name(ty: Option<&Type>) -> String {
    ty.map_or_else(|| "no type".to_string(), Type::to_string)
}

fn write_separated<T: std::fmt::Display>(
    f: &mut std::fmt::Formatter<'_>,
    items: &[T],
) -> std::fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind() {
            ExprKind::Literal(None) => match self.ty() {
                Some(ty) => write!(f, "None::<{}>", ty.set_may_be_null(false).unwrap_or_else(|_| ty.clone())),
                None => write!(f, "None"),
            },
            ExprKind::Literal(Some(value)) => {
                if self.ty().is_some_and(Type::may_be_null) {
                    write!(f, "Some({value})")
                } else {
                    write!(f, "{value}")
                }
            }
            ExprKind::Variable(name) => f.write_str(name),
            ExprKind::Field { expr, index } => write!(f, "{expr}.{index}"),
            ExprKind::Binary { op, left, right } if op.is_aggregate() => {
                write!(f, "{op}({left}, {right})")
            }
            ExprKind::Binary { op, left, right } => write!(f, "({left} {op} {right})"),
            ExprKind::Unary { op, operand } => match op {
                UnaryOp::Not | UnaryOp::Neg | UnaryOp::Plus => write!(f, "({op}{operand})"),
                UnaryOp::IsNull | UnaryOp::IsNotNull => write!(f, "{operand}.{op}()"),
                UnaryOp::WrapBool => write!(f, "{op}({operand})"),
            },
            ExprKind::Cast { expr } => match self.ty() {
                Some(ty) => write!(f, "({expr} as {ty})"),
                None => write!(f, "{expr}"),
            },
            ExprKind::Apply { function, args } => {
                write!(f, "{function}(")?;
                write_separated(f, args)?;
                write!(f, ")")
            }
            ExprKind::Closure { params, body } => {
                write!(f, "move |")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param.pattern)?;
                    if let Some(ty) = &param.ty {
                        write!(f, ": {ty}")?;
                    }
                }
                write!(f, "| {body}")
            }
            ExprKind::Block { statements, last } => {
                write!(f, "{{ ")?;
                for statement in statements {
                    write!(f, "{statement} ")?;
                }
                if let Some(last) = last {
                    write!(f, "{last} ")?;
                }
                write!(f, "}}")
            }
            ExprKind::If {
                condition,
                positive,
                negative,
            } => {
                write!(f, "if {condition} {{ {positive} }}")?;
                if let Some(negative) = negative {
                    write!(f, " else {{ {negative} }}")?;
                }
                Ok(())
            }
            ExprKind::Match { matched, cases } => {
                write!(f, "match {matched} {{ ")?;
                for case in cases {
                    write!(f, "{} => {}, ", case.pattern, case.result)?;
                }
                write!(f, "}}")
            }
            ExprKind::For {
                pattern,
                iterated,
                block,
            } => write!(f, "for {pattern} in {iterated} {block}"),
            ExprKind::Assign { target, value } => write!(f, "{target} = {value}"),
            ExprKind::Tuple(fields) => {
                write!(f, "Tup{}::new(", fields.len())?;
                write_separated(f, fields)?;
                write!(f, ")")
            }
            ExprKind::RawTuple(fields) => {
                write!(f, "(")?;
                write_separated(f, fields)?;
                if fields.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            ExprKind::Struct { fields } => {
                match self.ty().map(Type::kind) {
                    Some(TypeKind::Struct { name, .. }) => write!(f, "{name}::new(")?,
                    _ => write!(f, "new(")?,
                }
                write_separated(f, fields)?;
                write!(f, ")")
            }
            ExprKind::Path(path) => write!(f, "{path}"),
            ExprKind::QualifyType { expr, types } => {
                write!(f, "{expr}::<")?;
                write_separated(f, types)?;
                write!(f, ">")
            }
            ExprKind::Borrow { expr, mutable } => {
                write!(f, "&{}{expr}", if *mutable { "mut " } else { "" })
            }
            ExprKind::Deref(expr) => write!(f, "(*{expr})"),
            ExprKind::ZSet(literal) => write!(f, "{literal}"),
        }
    }
}

#[cfg(test)]
#[path = "expr_test.rs"]
mod tests;
