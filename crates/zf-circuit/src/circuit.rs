//! The operator graph
//!
//! A [`Circuit`] is an arena of operators addressed by [`OperatorId`]. Inputs
//! always precede their consumers, so arena order is a topological order.
//! Every insertion is validated: arity, input existence, function shape and
//! output type.

use crate::error::{CircuitError, CircuitResult};
use crate::operator::{Operator, OperatorId, OperatorKind};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, Reversed};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use zf_ir::{Expr, FreeVariables, Type, TypeKind, ZSetLiteral};

/// A typed dataflow circuit
#[derive(Debug, Clone)]
pub struct Circuit {
    name: String,
    operators: Vec<Operator>,
}

/// Serializable description of one operator, for code emitters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorSummary {
    pub id: usize,
    pub operation: String,
    pub inputs: Vec<usize>,
    pub output_type: String,
    pub multiset: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    /// Table name of a source, output name of a sink
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Serializable description of a circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSummary {
    pub name: String,
    pub operators: Vec<OperatorSummary>,
}

fn element_of(operator: &str, input: &Operator) -> CircuitResult<Type> {
    input
        .output_type()
        .element_type()
        .ok_or_else(|| CircuitError::mismatch(operator, "Z-set", input.output_type()))
}

fn indexed_parts(operator: &str, input: &Operator) -> CircuitResult<(Type, Type)> {
    match input.output_type().kind() {
        TypeKind::IndexedZSet { key, value, .. } => {
            Ok((key.as_ref().clone(), value.as_ref().clone()))
        }
        _ => Err(CircuitError::mismatch(
            operator,
            "indexed Z-set",
            input.output_type(),
        )),
    }
}

fn by_ref(ty: Type) -> Type {
    Type::reference(ty, false)
}

/// Check that `function` is a closed closure with parameters `params` and
/// result `result`. Undeclared parameter types are accepted.
fn check_closure(
    operator: &str,
    function: &Expr,
    params: &[Type],
    result: &Type,
) -> CircuitResult<()> {
    let declared = function.closure_params().ok_or_else(|| {
        CircuitError::malformed(operator, format!("function {function} is not a closure"))
    })?;
    if declared.len() != params.len() {
        return Err(CircuitError::malformed(
            operator,
            format!(
                "function takes {} parameter(s), expected {}",
                declared.len(),
                params.len()
            ),
        ));
    }
    for (param, expected) in declared.iter().zip(params) {
        if let Some(ty) = &param.ty {
            if !ty.same_type(expected) {
                return Err(CircuitError::mismatch(operator, expected, ty));
            }
        }
    }
    let actual = function
        .result_type()
        .ok_or_else(|| CircuitError::malformed(operator, "function has no result type"))?;
    if !actual.same_type(result) {
        return Err(CircuitError::mismatch(operator, result, actual));
    }
    let free = FreeVariables::of(function);
    if !free.is_empty() {
        return Err(CircuitError::malformed(
            operator,
            format!("function refers to free variables {}", free.join(", ")),
        ));
    }
    Ok(())
}

fn same_input_types(operator: &str, inputs: &[&Operator]) -> CircuitResult<Type> {
    let first = inputs[0].output_type();
    for input in &inputs[1..] {
        if !input.output_type().same_type(first) {
            return Err(CircuitError::mismatch(operator, first, input.output_type()));
        }
    }
    Ok(first.clone())
}

impl Circuit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operators: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    pub fn get(&self, id: OperatorId) -> Option<&Operator> {
        self.operators.get(id.index())
    }

    pub fn operator(&self, id: OperatorId) -> CircuitResult<&Operator> {
        self.get(id)
            .ok_or(CircuitError::NoSuchOperator(id.index()))
    }

    /// Operators in arena order
    pub fn iter(&self) -> impl Iterator<Item = (OperatorId, &Operator)> {
        self.operators
            .iter()
            .enumerate()
            .map(|(i, op)| (OperatorId::new(i), op))
    }

    pub fn sources(&self) -> Vec<OperatorId> {
        self.ids_where(|op| matches!(op.kind(), OperatorKind::Source { .. }))
    }

    pub fn sinks(&self) -> Vec<OperatorId> {
        self.ids_where(|op| matches!(op.kind(), OperatorKind::Sink { .. }))
    }

    fn ids_where(&self, predicate: impl Fn(&Operator) -> bool) -> Vec<OperatorId> {
        self.iter()
            .filter(|(_, op)| predicate(op))
            .map(|(id, _)| id)
            .collect()
    }

    /// The source reading `table`
    pub fn source(&self, table: &str) -> Option<OperatorId> {
        self.iter()
            .find(|(_, op)| {
                matches!(op.kind(), OperatorKind::Source { table: t, .. } if t == table)
            })
            .map(|(id, _)| id)
    }

    /// The sink named `name`
    pub fn sink(&self, name: &str) -> Option<OperatorId> {
        self.iter()
            .find(|(_, op)| matches!(op.kind(), OperatorKind::Sink { name: n, .. } if n == name))
            .map(|(id, _)| id)
    }

    /// Operators reading the output of `id`
    pub fn consumers(&self, id: OperatorId) -> Vec<OperatorId> {
        self.ids_where(|op| op.inputs().contains(&id))
    }

    /// Derive the output type and multiset flag of an operator, validating
    /// its inputs and function on the way
    fn derive(
        &self,
        kind: &OperatorKind,
        inputs: &[OperatorId],
        function: Option<&Expr>,
    ) -> CircuitResult<(Type, bool)> {
        let name = kind.name();
        let arity = kind.arity();
        if !arity.accepts(inputs.len()) {
            return Err(CircuitError::Arity {
                operator: name.to_string(),
                expected: arity.to_string(),
                actual: inputs.len(),
            });
        }
        let input_ops = inputs
            .iter()
            .map(|id| {
                self.get(*id).ok_or(CircuitError::UnknownInput {
                    operator: name.to_string(),
                    input: id.index(),
                })
            })
            .collect::<CircuitResult<Vec<_>>>()?;
        let function = match (kind.requires_function(), function) {
            (true, Some(function)) => Some(function),
            (false, None) => None,
            (true, None) => return Err(CircuitError::malformed(name, "requires a function")),
            (false, Some(_)) => return Err(CircuitError::malformed(name, "takes no function")),
        };
        let function = || function.ok_or_else(|| CircuitError::malformed(name, "requires a function"));

        let derived = match kind {
            OperatorKind::Source { table, element } => {
                if self.source(table).is_some() {
                    return Err(CircuitError::DuplicateSource(table.clone()));
                }
                (Type::zset(element.clone()), true)
            }
            OperatorKind::Constant { value } => (value.zset_type(), true),
            OperatorKind::Map { output_element } => {
                let element = element_of(name, input_ops[0])?;
                check_closure(name, function()?, &[by_ref(element)], output_element)?;
                (Type::zset(output_element.clone()), true)
            }
            OperatorKind::Filter => {
                let element = element_of(name, input_ops[0])?;
                check_closure(name, function()?, &[by_ref(element)], &Type::bool())?;
                (
                    input_ops[0].output_type().clone(),
                    input_ops[0].is_multiset(),
                )
            }
            OperatorKind::Index {
                key_type,
                value_type,
            } => {
                let element = element_of(name, input_ops[0])?;
                let pair = Type::raw_tuple(vec![key_type.clone(), value_type.clone()]);
                check_closure(name, function()?, &[by_ref(element)], &pair)?;
                (
                    Type::indexed_zset(key_type.clone(), value_type.clone()),
                    true,
                )
            }
            OperatorKind::Aggregate {
                key_type,
                output_element,
            } => {
                let (key, value) = indexed_parts(name, input_ops[0])?;
                if !key.same_type(key_type) {
                    return Err(CircuitError::mismatch(name, key_type, &key));
                }
                let group = Type::vec(Type::raw_tuple(vec![value, Type::weight()]));
                check_closure(
                    name,
                    function()?,
                    &[by_ref(key), by_ref(group)],
                    output_element,
                )?;
                (
                    Type::indexed_zset(key_type.clone(), output_element.clone()),
                    false,
                )
            }
            OperatorKind::Join {
                key_type,
                output_element,
            } => {
                let (left_key, left_value) = indexed_parts(name, input_ops[0])?;
                let (right_key, right_value) = indexed_parts(name, input_ops[1])?;
                for key in [&left_key, &right_key] {
                    if !key.same_type(key_type) {
                        return Err(CircuitError::mismatch(name, key_type, key));
                    }
                }
                check_closure(
                    name,
                    function()?,
                    &[by_ref(left_key), by_ref(left_value), by_ref(right_value)],
                    output_element,
                )?;
                (Type::zset(output_element.clone()), true)
            }
            OperatorKind::Sum | OperatorKind::Subtract => {
                (same_input_types(name, &input_ops)?, true)
            }
            OperatorKind::Negate => (input_ops[0].output_type().clone(), true),
            OperatorKind::Distinct => {
                element_of(name, input_ops[0])?;
                (input_ops[0].output_type().clone(), false)
            }
            OperatorKind::Integral
            | OperatorKind::Differential
            | OperatorKind::Noop
            | OperatorKind::Sink { .. } => (
                input_ops[0].output_type().clone(),
                input_ops[0].is_multiset(),
            ),
        };
        Ok(derived)
    }

    /// Validate `operator` against this circuit and append it
    pub fn insert(&mut self, operator: Operator) -> CircuitResult<OperatorId> {
        let (ty, multiset) = self.derive(operator.kind(), operator.inputs(), operator.function())?;
        if !ty.same_type(operator.output_type()) {
            return Err(CircuitError::mismatch(
                operator.name(),
                &ty,
                operator.output_type(),
            ));
        }
        if multiset != operator.is_multiset() {
            return Err(CircuitError::malformed(
                operator.name(),
                "multiset flag disagrees with its inputs",
            ));
        }
        let id = OperatorId::new(self.operators.len());
        self.operators.push(operator);
        Ok(id)
    }

    fn build(
        &mut self,
        kind: OperatorKind,
        inputs: Vec<OperatorId>,
        function: Option<Expr>,
    ) -> CircuitResult<OperatorId> {
        let (ty, multiset) = self.derive(&kind, &inputs, function.as_ref())?;
        self.insert(Operator::new(kind, inputs, function, ty, multiset))
    }

    /// Input table producing rows of `element`
    pub fn add_source(&mut self, table: impl Into<String>, element: Type) -> CircuitResult<OperatorId> {
        self.build(
            OperatorKind::Source {
                table: table.into(),
                element,
            },
            Vec::new(),
            None,
        )
    }

    pub fn constant(&mut self, value: ZSetLiteral) -> CircuitResult<OperatorId> {
        self.build(OperatorKind::Constant { value }, Vec::new(), None)
    }

    /// `function: |row: &In| -> output_element`
    pub fn map(
        &mut self,
        input: OperatorId,
        function: Expr,
        output_element: Type,
    ) -> CircuitResult<OperatorId> {
        self.build(
            OperatorKind::Map { output_element },
            vec![input],
            Some(function),
        )
    }

    /// `predicate: |row: &In| -> bool`
    pub fn filter(&mut self, input: OperatorId, predicate: Expr) -> CircuitResult<OperatorId> {
        self.build(OperatorKind::Filter, vec![input], Some(predicate))
    }

    /// `function: |row: &In| -> (key_type, value_type)`
    pub fn index(
        &mut self,
        input: OperatorId,
        function: Expr,
        key_type: Type,
        value_type: Type,
    ) -> CircuitResult<OperatorId> {
        self.build(
            OperatorKind::Index {
                key_type,
                value_type,
            },
            vec![input],
            Some(function),
        )
    }

    /// `function: |key: &K, group: &Vec<(V, Weight)>| -> output_element`
    pub fn aggregate(
        &mut self,
        input: OperatorId,
        function: Expr,
        key_type: Type,
        output_element: Type,
    ) -> CircuitResult<OperatorId> {
        self.build(
            OperatorKind::Aggregate {
                key_type,
                output_element,
            },
            vec![input],
            Some(function),
        )
    }

    /// `function: |key: &K, left: &L, right: &R| -> output_element`
    pub fn join(
        &mut self,
        left: OperatorId,
        right: OperatorId,
        function: Expr,
        key_type: Type,
        output_element: Type,
    ) -> CircuitResult<OperatorId> {
        self.build(
            OperatorKind::Join {
                key_type,
                output_element,
            },
            vec![left, right],
            Some(function),
        )
    }

    pub fn sum(&mut self, inputs: Vec<OperatorId>) -> CircuitResult<OperatorId> {
        self.build(OperatorKind::Sum, inputs, None)
    }

    pub fn subtract(&mut self, left: OperatorId, right: OperatorId) -> CircuitResult<OperatorId> {
        self.build(OperatorKind::Subtract, vec![left, right], None)
    }

    pub fn negate(&mut self, input: OperatorId) -> CircuitResult<OperatorId> {
        self.build(OperatorKind::Negate, vec![input], None)
    }

    pub fn distinct(&mut self, input: OperatorId) -> CircuitResult<OperatorId> {
        self.build(OperatorKind::Distinct, vec![input], None)
    }

    pub fn integral(&mut self, input: OperatorId) -> CircuitResult<OperatorId> {
        self.build(OperatorKind::Integral, vec![input], None)
    }

    pub fn differential(&mut self, input: OperatorId) -> CircuitResult<OperatorId> {
        self.build(OperatorKind::Differential, vec![input], None)
    }

    pub fn noop(&mut self, input: OperatorId) -> CircuitResult<OperatorId> {
        self.build(OperatorKind::Noop, vec![input], None)
    }

    /// Named output carrying the originating query text
    pub fn add_sink(
        &mut self,
        input: OperatorId,
        name: impl Into<String>,
        query: impl Into<String>,
        comment: Option<String>,
    ) -> CircuitResult<OperatorId> {
        self.build(
            OperatorKind::Sink {
                name: name.into(),
                query: query.into(),
                comment,
            },
            vec![input],
            None,
        )
    }

    /// Dependency graph with an edge from each input to its consumer. Node
    /// indices equal operator indices.
    pub fn to_graph(&self) -> DiGraph<OperatorId, ()> {
        let mut graph = DiGraph::with_capacity(self.operators.len(), self.operators.len());
        for (id, _) in self.iter() {
            graph.add_node(id);
        }
        for (id, op) in self.iter() {
            for input in op.inputs() {
                graph.add_edge(
                    NodeIndex::new(input.index()),
                    NodeIndex::new(id.index()),
                    (),
                );
            }
        }
        graph
    }

    /// Operators ordered so that inputs come first
    pub fn topological_order(&self) -> CircuitResult<Vec<OperatorId>> {
        let graph = self.to_graph();
        match toposort(&graph, None) {
            Ok(indices) => Ok(indices.into_iter().map(|idx| graph[idx]).collect()),
            Err(_) => Err(CircuitError::Cycle(self.name.clone())),
        }
    }

    /// `roots` and every operator they transitively read from
    pub fn ancestors(&self, roots: &[OperatorId]) -> HashSet<OperatorId> {
        let graph = self.to_graph();
        let reversed = Reversed(&graph);
        let mut seen = HashSet::new();
        for root in roots {
            if self.get(*root).is_none() {
                continue;
            }
            let mut dfs = Dfs::new(reversed, NodeIndex::new(root.index()));
            while let Some(idx) = dfs.next(reversed) {
                seen.insert(graph[idx]);
            }
        }
        seen
    }

    pub fn summary(&self) -> CircuitSummary {
        let operators = self
            .iter()
            .map(|(id, op)| {
                let (name, query, comment) = match op.kind() {
                    OperatorKind::Source { table, .. } => (Some(table.clone()), None, None),
                    OperatorKind::Sink {
                        name,
                        query,
                        comment,
                    } => (Some(name.clone()), Some(query.clone()), comment.clone()),
                    _ => (None, None, None),
                };
                OperatorSummary {
                    id: id.index(),
                    operation: op.name().to_string(),
                    inputs: op.inputs().iter().map(|i| i.index()).collect(),
                    output_type: op.output_type().to_string(),
                    multiset: op.is_multiset(),
                    function: op.function().map(Expr::to_string),
                    name,
                    query,
                    comment,
                }
            })
            .collect();
        CircuitSummary {
            name: self.name.clone(),
            operators,
        }
    }

    /// Summary as pretty-printed JSON
    pub fn to_json(&self) -> CircuitResult<String> {
        Ok(serde_json::to_string_pretty(&self.summary())?)
    }
}

impl std::fmt::Display for Circuit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "circuit {} {{", self.name)?;
        for (id, op) in self.iter() {
            write!(f, "    let {id}: {} = {}(", op.output_type(), op.name())?;
            let mut args: Vec<String> = op.inputs().iter().map(|i| i.to_string()).collect();
            match op.kind() {
                OperatorKind::Source { table, .. } => args.push(format!("{table:?}")),
                OperatorKind::Constant { value } => args.push(value.to_string()),
                OperatorKind::Sink { name, .. } => args.push(format!("{name:?}")),
                _ => {}
            }
            if let Some(function) = op.function() {
                args.push(function.to_string());
            }
            writeln!(f, "{});", args.join(", "))?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
#[path = "circuit_test.rs"]
mod tests;
