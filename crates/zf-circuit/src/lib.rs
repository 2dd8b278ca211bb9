//! zf-circuit: operator graph for incremental dataflow circuits
//!
//! This crate provides the circuit IR (operators over Z-sets wired into an
//! acyclic graph), the outer visitor over operators, clone-and-rewrite
//! support, and the standard circuit passes.

pub(crate) mod circuit;
pub(crate) mod clone;
pub(crate) mod error;
pub(crate) mod operator;
pub mod passes;
pub mod visitor;

#[cfg(any(test, feature = "test-support"))]
pub mod eval;

pub use circuit::{Circuit, CircuitSummary, OperatorSummary};
pub use clone::CircuitCloner;
pub use error::{CircuitError, CircuitResult};
pub use operator::{Arity, Operator, OperatorId, OperatorKind};
pub use passes::dead_code::{DeadCode, RemoveOperators};
pub use passes::incrementalize::Incrementalize;
pub use passes::simplify::SimplifyFunctions;
pub use passes::{CircuitPass, PassManager};
pub use visitor::{traverse, CircuitVisitor, OperatorRef};
