//! Circuit operators
//!
//! An [`Operator`] is immutable once inserted into a circuit. Rewrites produce
//! new operators through [`Operator::replace_inputs`] or
//! [`Operator::with_function`].

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use zf_ir::{Expr, Type, ZSetLiteral};

/// Stable index of an operator inside its circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperatorId(usize);

impl OperatorId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for OperatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stream{}", self.0)
    }
}

/// Number of inputs an operator kind accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Operator kind together with its kind-specific typed fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorKind {
    /// Named input table producing a Z-set of `element`
    Source { table: String, element: Type },
    /// Constant Z-set
    Constant { value: ZSetLiteral },
    /// Row-wise transform to `output_element`
    Map { output_element: Type },
    /// Keeps rows whose predicate is true
    Filter,
    /// Turns a Z-set into an indexed Z-set
    Index { key_type: Type, value_type: Type },
    /// Per-key aggregation of an indexed Z-set
    Aggregate { key_type: Type, output_element: Type },
    /// Equi-join of two indexed Z-sets on the same key
    Join { key_type: Type, output_element: Type },
    /// Sum of any number of inputs of one type
    Sum,
    /// Left input minus right input
    Subtract,
    Negate,
    /// Clamps positive weights to one and drops the rest
    Distinct,
    /// Running sum over time
    Integral,
    /// Difference with the previous step
    Differential,
    /// Pass-through
    Noop,
    /// Named circuit output with the query text it was compiled from
    Sink {
        name: String,
        query: String,
        comment: Option<String>,
    },
}

impl OperatorKind {
    /// Operation name as used by the runtime library
    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::Source { .. } => "source",
            OperatorKind::Constant { .. } => "constant",
            OperatorKind::Map { .. } => "map",
            OperatorKind::Filter => "filter",
            OperatorKind::Index { .. } => "index_with",
            OperatorKind::Aggregate { .. } => "stream_aggregate",
            OperatorKind::Join { .. } => "stream_join",
            OperatorKind::Sum => "sum",
            OperatorKind::Subtract => "minus",
            OperatorKind::Negate => "neg",
            OperatorKind::Distinct => "distinct",
            OperatorKind::Integral => "integrate",
            OperatorKind::Differential => "differentiate",
            OperatorKind::Noop => "noop",
            OperatorKind::Sink { .. } => "inspect",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            OperatorKind::Source { .. } | OperatorKind::Constant { .. } => Arity::Exactly(0),
            OperatorKind::Join { .. } | OperatorKind::Subtract => Arity::Exactly(2),
            OperatorKind::Sum => Arity::AtLeast(1),
            _ => Arity::Exactly(1),
        }
    }

    /// Whether the kind carries a per-row function
    pub fn requires_function(&self) -> bool {
        matches!(
            self,
            OperatorKind::Map { .. }
                | OperatorKind::Filter
                | OperatorKind::Index { .. }
                | OperatorKind::Aggregate { .. }
                | OperatorKind::Join { .. }
        )
    }
}

/// A node of the operator graph
#[derive(Debug, Clone)]
pub struct Operator {
    kind: OperatorKind,
    inputs: Vec<OperatorId>,
    function: Option<Expr>,
    output_type: Type,
    is_multiset: bool,
}

impl Operator {
    pub(crate) fn new(
        kind: OperatorKind,
        inputs: Vec<OperatorId>,
        function: Option<Expr>,
        output_type: Type,
        is_multiset: bool,
    ) -> Self {
        Self {
            kind,
            inputs,
            function,
            output_type,
            is_multiset,
        }
    }

    pub fn kind(&self) -> &OperatorKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn inputs(&self) -> &[OperatorId] {
        &self.inputs
    }

    pub fn function(&self) -> Option<&Expr> {
        self.function.as_ref()
    }

    pub fn output_type(&self) -> &Type {
        &self.output_type
    }

    /// Whether output weights may exceed one
    pub fn is_multiset(&self) -> bool {
        self.is_multiset
    }

    /// This operator wired to `inputs`. Returns `self` unchanged when the
    /// inputs are the same and `force` is false.
    pub fn replace_inputs(&self, inputs: &[OperatorId], force: bool) -> Cow<'_, Operator> {
        if !force && self.inputs == inputs {
            return Cow::Borrowed(self);
        }
        Cow::Owned(Operator {
            inputs: inputs.to_vec(),
            ..self.clone()
        })
    }

    /// This operator with another function attached
    pub fn with_function(&self, function: Expr) -> Operator {
        Operator {
            function: Some(function),
            ..self.clone()
        }
    }

    /// Same kind, kind-specific fields, output type and function node.
    /// Inputs are not compared.
    pub fn shallow_same_operator(&self, other: &Operator) -> bool {
        let same_function = match (&self.function, &other.function) {
            (Some(a), Some(b)) => a.same_node(b),
            (None, None) => true,
            _ => false,
        };
        same_function
            && self.kind == other.kind
            && self.is_multiset == other.is_multiset
            && self.output_type.same_type(&other.output_type)
    }
}

#[cfg(test)]
#[path = "operator_test.rs"]
mod tests;
