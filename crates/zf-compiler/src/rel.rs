//! Relational plan consumed by the compiler
//!
//! The SQL frontend resolves names and types before handing over a plan, so
//! every node carries its output schema and every expression its type.
//! Columns are referenced by position in the input row; for a join the input
//! row is the left row followed by the right row.

use serde::{Deserialize, Serialize};
use zf_ir::{LiteralValue, Type};

/// A named, typed output column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelColumn {
    pub name: String,
    pub ty: Type,
}

impl RelColumn {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Schema of a relational node's output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelSchema {
    pub columns: Vec<RelColumn>,
}

impl RelSchema {
    pub fn new(columns: Vec<RelColumn>) -> Self {
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Merge two schemas (e.g. for JOIN output)
    pub fn merge(left: &RelSchema, right: &RelSchema) -> Self {
        let mut columns = left.columns.clone();
        columns.extend(right.columns.iter().cloned());
        Self { columns }
    }

    /// Circuit row type: a tuple of the column types
    pub fn row_type(&self) -> Type {
        Type::tuple(self.columns.iter().map(|c| c.ty.clone()).collect())
    }
}

/// Scalar functions and operators over columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelCallOp {
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    Not,
    Plus,
    Minus,
    Times,
    Divide,
    Mod,
    Negate,
    IsNull,
    IsNotNull,
    Concat,
}

impl std::fmt::Display for RelCallOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RelCallOp::Equals => "=",
            RelCallOp::NotEquals => "<>",
            RelCallOp::LessThan => "<",
            RelCallOp::LessThanOrEqual => "<=",
            RelCallOp::GreaterThan => ">",
            RelCallOp::GreaterThanOrEqual => ">=",
            RelCallOp::And => "AND",
            RelCallOp::Or => "OR",
            RelCallOp::Not => "NOT",
            RelCallOp::Plus => "+",
            RelCallOp::Minus => "-",
            RelCallOp::Times => "*",
            RelCallOp::Divide => "/",
            RelCallOp::Mod => "%",
            RelCallOp::Negate => "NEGATE",
            RelCallOp::IsNull => "IS NULL",
            RelCallOp::IsNotNull => "IS NOT NULL",
            RelCallOp::Concat => "||",
        };
        f.write_str(name)
    }
}

/// Typed scalar expression over the columns of an input row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelExpr {
    /// Column at `index` of the input row
    InputRef { index: usize, ty: Type },
    /// Constant; `None` is NULL
    Literal {
        value: Option<LiteralValue>,
        ty: Type,
    },
    Call {
        op: RelCallOp,
        operands: Vec<RelExpr>,
        ty: Type,
    },
    Cast { operand: Box<RelExpr>, ty: Type },
}

impl RelExpr {
    pub fn input_ref(index: usize, ty: Type) -> Self {
        RelExpr::InputRef { index, ty }
    }

    pub fn literal(value: LiteralValue, ty: Type) -> Self {
        RelExpr::Literal {
            value: Some(value),
            ty,
        }
    }

    pub fn call(op: RelCallOp, operands: Vec<RelExpr>, ty: Type) -> Self {
        RelExpr::Call { op, operands, ty }
    }

    /// `left = right` with SQL nullability
    pub fn equals(left: RelExpr, right: RelExpr) -> Self {
        let nullable = left.ty().may_be_null() || right.ty().may_be_null();
        let ty = if nullable {
            Type::bool().set_may_be_null(true).unwrap_or_else(|_| Type::bool())
        } else {
            Type::bool()
        };
        RelExpr::call(RelCallOp::Equals, vec![left, right], ty)
    }

    pub fn ty(&self) -> &Type {
        match self {
            RelExpr::InputRef { ty, .. }
            | RelExpr::Literal { ty, .. }
            | RelExpr::Call { ty, .. }
            | RelExpr::Cast { ty, .. } => ty,
        }
    }
}

impl std::fmt::Display for RelExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelExpr::InputRef { index, .. } => write!(f, "${index}"),
            RelExpr::Literal { value: None, .. } => write!(f, "NULL"),
            RelExpr::Literal {
                value: Some(value), ..
            } => write!(f, "{value}"),
            RelExpr::Call { op, operands, .. } => match operands.as_slice() {
                [operand] => write!(f, "{op}({operand})"),
                [left, right] => write!(f, "({left} {op} {right})"),
                _ => {
                    write!(f, "{op}(")?;
                    for (i, operand) in operands.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{operand}")?;
                    }
                    write!(f, ")")
                }
            },
            RelExpr::Cast { operand, ty } => write!(f, "CAST({operand} AS {ty})"),
        }
    }
}

/// Aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregateFunction {
    Count,
    Sum,
    Min,
    Max,
    Avg,
}

impl std::fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateFunction::Count => write!(f, "COUNT"),
            AggregateFunction::Sum => write!(f, "SUM"),
            AggregateFunction::Min => write!(f, "MIN"),
            AggregateFunction::Max => write!(f, "MAX"),
            AggregateFunction::Avg => write!(f, "AVG"),
        }
    }
}

/// One aggregate of an Aggregate node, e.g. `COUNT(*)` or `SUM($1)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateCall {
    pub function: AggregateFunction,
    /// Input column; `None` only for `COUNT(*)`
    pub argument: Option<usize>,
    /// Result type
    pub ty: Type,
}

impl AggregateCall {
    pub fn new(function: AggregateFunction, argument: Option<usize>, ty: Type) -> Self {
        Self {
            function,
            argument,
            ty,
        }
    }
}

impl std::fmt::Display for AggregateCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.argument {
            Some(column) => write!(f, "{}(${column})", self.function),
            None => write!(f, "{}(*)", self.function),
        }
    }
}

/// Join type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
    Cross,
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::LeftOuter => write!(f, "LEFT"),
            JoinType::RightOuter => write!(f, "RIGHT"),
            JoinType::FullOuter => write!(f, "FULL OUTER"),
            JoinType::Cross => write!(f, "CROSS"),
        }
    }
}

/// Set operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOpKind {
    /// UNION (deduplicated)
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl std::fmt::Display for SetOpKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SetOpKind::Union => write!(f, "UNION"),
            SetOpKind::UnionAll => write!(f, "UNION ALL"),
            SetOpKind::Intersect => write!(f, "INTERSECT"),
            SetOpKind::Except => write!(f, "EXCEPT"),
        }
    }
}

/// Sort key for ORDER BY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: usize,
    pub ascending: bool,
}

/// Relational operator, a node in the query plan tree.
///
/// Each variant carries a `schema` describing its output columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelNode {
    Scan {
        table: String,
        schema: RelSchema,
    },
    Filter {
        input: Box<RelNode>,
        condition: RelExpr,
        schema: RelSchema,
    },
    Project {
        input: Box<RelNode>,
        exprs: Vec<RelExpr>,
        schema: RelSchema,
    },
    /// `condition` ranges over the left columns followed by the right
    /// columns; `None` for a cross join
    Join {
        left: Box<RelNode>,
        right: Box<RelNode>,
        join_type: JoinType,
        condition: Option<RelExpr>,
        schema: RelSchema,
    },
    /// Output columns are the group keys followed by the aggregates
    Aggregate {
        input: Box<RelNode>,
        group_keys: Vec<usize>,
        aggregates: Vec<AggregateCall>,
        schema: RelSchema,
    },
    Sort {
        input: Box<RelNode>,
        keys: Vec<SortKey>,
        schema: RelSchema,
    },
    Limit {
        input: Box<RelNode>,
        fetch: u64,
        schema: RelSchema,
    },
    SetOp {
        kind: SetOpKind,
        inputs: Vec<RelNode>,
        schema: RelSchema,
    },
}

impl RelNode {
    pub fn schema(&self) -> &RelSchema {
        match self {
            RelNode::Scan { schema, .. }
            | RelNode::Filter { schema, .. }
            | RelNode::Project { schema, .. }
            | RelNode::Join { schema, .. }
            | RelNode::Aggregate { schema, .. }
            | RelNode::Sort { schema, .. }
            | RelNode::Limit { schema, .. }
            | RelNode::SetOp { schema, .. } => schema,
        }
    }

    /// Operator name for diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            RelNode::Scan { .. } => "Scan",
            RelNode::Filter { .. } => "Filter",
            RelNode::Project { .. } => "Project",
            RelNode::Join { .. } => "Join",
            RelNode::Aggregate { .. } => "Aggregate",
            RelNode::Sort { .. } => "Sort",
            RelNode::Limit { .. } => "Limit",
            RelNode::SetOp { .. } => "SetOp",
        }
    }
}

/// A statement of the compiled program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendStatement {
    CreateTable {
        name: String,
        schema: RelSchema,
    },
    CreateView {
        name: String,
        /// Original query text, kept for the generated code
        query: String,
        comment: Option<String>,
        plan: RelNode,
    },
    /// `INSERT INTO table VALUES ...` with constant rows
    Insert { table: String, rows: Vec<Vec<RelExpr>> },
    /// `DELETE FROM table VALUES ...` with constant rows
    Delete { table: String, rows: Vec<Vec<RelExpr>> },
}
