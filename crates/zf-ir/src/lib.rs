//! zf-ir: typed intermediate representation for incremental dataflow circuits
//!
//! This crate provides the type IR, the expression IR used for per-row
//! operator functions, constant Z-set literals, and the visitor and rewrite
//! framework over expressions.

pub(crate) mod error;
pub mod expr;
pub(crate) mod literal;
pub mod pattern;
pub mod rewrite;
pub(crate) mod statement;
pub mod types;
pub mod visitor;
pub(crate) mod zset;

pub use error::{ErrorKind, IrError, IrResult};
pub use expr::{BinaryOp, Expr, ExprKind, MatchCase, Parameter, Path, UnaryOp};
pub use literal::LiteralValue;
pub use pattern::Pattern;
pub use rewrite::{rewrite, ExprRewriter, Simplify};
pub use statement::Statement;
pub use types::{FloatBitWidth, IntBitWidth, IntervalUnit, StructField, Type, TypeKind};
pub use visitor::{FreeVariables, InnerNode, InnerVisitor};
pub use zset::ZSetLiteral;
