//! Removal of operators that do not reach a sink

use super::CircuitPass;
use crate::circuit::Circuit;
use crate::clone::CircuitCloner;
use crate::error::{CircuitError, CircuitResult};
use crate::operator::OperatorId;
use crate::visitor::{traverse, CircuitVisitor, OperatorRef};
use std::collections::HashSet;

/// Drops every operator outside `keep` and splices out no-ops
pub struct RemoveOperators {
    cloner: CircuitCloner,
    keep: HashSet<OperatorId>,
    error: Option<CircuitError>,
}

impl RemoveOperators {
    pub fn new(name: &str, keep: HashSet<OperatorId>) -> Self {
        Self {
            cloner: CircuitCloner::new(name, false),
            keep,
            error: None,
        }
    }

    fn record(&mut self, result: CircuitResult<OperatorId>) {
        if let Err(e) = result {
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }

    /// The rewritten circuit, or the first error met while rewriting
    pub fn finish(self, original: &Circuit) -> CircuitResult<Circuit> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.cloner.finish(original)),
        }
    }
}

impl CircuitVisitor for RemoveOperators {
    fn visit_super(&self) -> bool {
        true
    }

    fn preorder_noop(&mut self, node: OperatorRef<'_>) -> bool {
        let input_kept = node
            .op
            .inputs()
            .first()
            .is_some_and(|input| self.cloner.mapped(*input).is_some());
        if input_kept {
            log::debug!("Splicing out {} ({})", node.id, node.op.name());
            let result = self.cloner.splice(node.id, node.op);
            self.record(result);
        } else {
            self.cloner.drop_operator(node.id);
        }
        false
    }

    fn preorder_node(&mut self, node: OperatorRef<'_>) -> bool {
        if self.keep.contains(&node.id) {
            let result = self.cloner.keep(node.id, node.op);
            self.record(result);
        } else {
            log::debug!("Removing unused {} ({})", node.id, node.op.name());
            self.cloner.drop_operator(node.id);
        }
        false
    }
}

/// Removes operators no sink depends on
pub struct DeadCode;

impl CircuitPass for DeadCode {
    fn name(&self) -> &'static str {
        "dead_code"
    }

    fn description(&self) -> &'static str {
        "Removes operators that no sink depends on and splices out no-ops"
    }

    fn run(&self, circuit: &Circuit) -> CircuitResult<Circuit> {
        let keep = circuit.ancestors(&circuit.sinks());
        let mut remover = RemoveOperators::new(circuit.name(), keep);
        traverse(circuit, &mut remover);
        remover.finish(circuit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zf_ir::{Expr, Parameter, Type};

    fn row() -> Type {
        Type::tuple(vec![Type::signed32()])
    }

    fn identity() -> Expr {
        let param = Type::reference(row(), false);
        Expr::closure(
            vec![Parameter::named("t", param.clone())],
            Expr::deref(Expr::var("t", param)).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_unreachable_operators_are_removed() {
        let mut circuit = Circuit::new("c");
        let source = circuit.add_source("T", row()).unwrap();
        circuit.map(source, identity(), row()).unwrap();
        let distinct = circuit.distinct(source).unwrap();
        circuit.add_sink(distinct, "V", "q", None).unwrap();

        let result = DeadCode.run(&circuit).unwrap();
        let names: Vec<_> = result.iter().map(|(_, op)| op.name()).collect();
        assert_eq!(names, vec!["source", "distinct", "inspect"]);
        let sink = result.operator(result.sinks()[0]).unwrap();
        assert_eq!(sink.inputs(), &[OperatorId::new(1)]);
    }

    #[test]
    fn test_noops_are_spliced_out() {
        let mut circuit = Circuit::new("c");
        let source = circuit.add_source("T", row()).unwrap();
        let noop = circuit.noop(source).unwrap();
        let noop = circuit.noop(noop).unwrap();
        circuit.add_sink(noop, "V", "q", None).unwrap();

        let result = DeadCode.run(&circuit).unwrap();
        assert_eq!(result.len(), 2);
        let sink = result.operator(result.sinks()[0]).unwrap();
        assert_eq!(sink.inputs(), &[result.source("T").unwrap()]);
    }

    #[test]
    fn test_live_circuit_is_unchanged() {
        let mut circuit = Circuit::new("c");
        let source = circuit.add_source("T", row()).unwrap();
        circuit.add_sink(source, "V", "q", None).unwrap();
        let result = DeadCode.run(&circuit).unwrap();
        assert_eq!(result.summary(), circuit.summary());
    }

    #[test]
    fn test_circuit_without_sinks_is_emptied() {
        let mut circuit = Circuit::new("c");
        circuit.add_source("T", row()).unwrap();
        assert!(DeadCode.run(&circuit).unwrap().is_empty());
    }
}
