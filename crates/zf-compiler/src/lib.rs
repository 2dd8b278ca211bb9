//! zf-compiler: relational plans to incremental circuits
//!
//! Takes the relational algebra produced by a SQL frontend and lowers it
//! into a `zf_circuit::Circuit`, decomposing join conditions and folding
//! aggregates into closures over grouped Z-sets.

pub(crate) mod aggregate;
pub(crate) mod config;
pub(crate) mod context;
pub(crate) mod error;
pub(crate) mod expr_compiler;
pub(crate) mod join;
pub mod rel;
pub(crate) mod translate;

pub use aggregate::{empty_group_row, fold_function};
pub use config::CompilerOptions;
pub use context::{CompilationContext, Diagnostic, Severity};
pub use error::{CompileError, CompileResult};
pub use expr_compiler::ExprCompiler;
pub use join::{ConditionDecomposition, EqualityTest, JoinConditionAnalyzer};
pub use rel::{
    AggregateCall, AggregateFunction, FrontendStatement, JoinType, RelCallOp, RelColumn,
    RelExpr, RelNode, RelSchema, SetOpKind, SortKey,
};
pub use translate::{CircuitCompiler, Compilation, CROSS_JOIN, ORDER_IGNORED};
