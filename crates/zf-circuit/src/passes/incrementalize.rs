//! Conversion of a batch circuit into an incremental one
//!
//! Sources receive changes, so each one is followed by an integral that
//! rebuilds the full table. Each sink then reports the differential of its
//! input, which turns full results back into changes.

use super::CircuitPass;
use crate::circuit::Circuit;
use crate::clone::CircuitCloner;
use crate::error::{CircuitError, CircuitResult};
use crate::operator::OperatorId;
use crate::visitor::{traverse, CircuitVisitor, OperatorRef};

pub struct Incrementalize;

struct Incrementalizer {
    cloner: CircuitCloner,
    error: Option<CircuitError>,
}

impl Incrementalizer {
    fn record(&mut self, result: CircuitResult<()>) {
        if let Err(e) = result {
            if self.error.is_none() {
                self.error = Some(e);
            }
        }
    }

    fn integrate_source(&mut self, node: OperatorRef<'_>) -> CircuitResult<()> {
        let source = self.cloner.keep(node.id, node.op)?;
        let integral = self.cloner.builder().integral(source)?;
        self.cloner.map_to(node.id, integral);
        Ok(())
    }

    fn differentiate_sink(&mut self, node: OperatorRef<'_>) -> CircuitResult<()> {
        let input: OperatorId = node
            .op
            .inputs()
            .first()
            .and_then(|input| self.cloner.mapped(*input))
            .ok_or_else(|| CircuitError::malformed(node.op.name(), "sink input was removed"))?;
        let differential = self.cloner.builder().differential(input)?;
        let sink = node.op.replace_inputs(&[differential], true).into_owned();
        self.cloner.replace(node.id, sink)?;
        Ok(())
    }
}

impl CircuitVisitor for Incrementalizer {
    fn preorder_source(&mut self, node: OperatorRef<'_>) -> bool {
        let result = self.integrate_source(node);
        self.record(result);
        false
    }

    fn preorder_sink(&mut self, node: OperatorRef<'_>) -> bool {
        let result = self.differentiate_sink(node);
        self.record(result);
        false
    }

    fn preorder_operator(&mut self, node: OperatorRef<'_>) -> bool {
        let result = self.cloner.keep(node.id, node.op).map(|_| ());
        self.record(result);
        false
    }

    fn visit_super(&self) -> bool {
        true
    }
}

impl CircuitPass for Incrementalize {
    fn name(&self) -> &'static str {
        "incrementalize"
    }

    fn description(&self) -> &'static str {
        "Integrates every source and differentiates every sink"
    }

    fn run(&self, circuit: &Circuit) -> CircuitResult<Circuit> {
        let mut incrementalizer = Incrementalizer {
            cloner: CircuitCloner::new(circuit.name(), false),
            error: None,
        };
        traverse(circuit, &mut incrementalizer);
        match incrementalizer.error {
            Some(e) => Err(e),
            None => Ok(incrementalizer.cloner.finish(circuit)),
        }
    }
}
