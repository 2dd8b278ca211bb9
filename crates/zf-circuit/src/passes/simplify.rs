//! Simplification of operator functions

use super::CircuitPass;
use crate::circuit::Circuit;
use crate::clone::CircuitCloner;
use crate::error::{CircuitError, CircuitResult};
use crate::visitor::{traverse, CircuitVisitor, OperatorRef};
use zf_ir::{rewrite, Simplify};

/// Applies [`Simplify`] to every operator function
pub struct SimplifyFunctions;

struct Simplifier {
    cloner: CircuitCloner,
    error: Option<CircuitError>,
}

impl Simplifier {
    fn process(&mut self, node: OperatorRef<'_>) -> CircuitResult<()> {
        let id = node.id;
        let Some(function) = node.op.function() else {
            self.cloner.keep(id, node.op)?;
            return Ok(());
        };
        let simplified = rewrite(&mut Simplify, function)?;
        if simplified.same_node(function) {
            self.cloner.keep(id, node.op)?;
            return Ok(());
        }
        log::debug!("Simplified function of {id}: {simplified}");
        let inputs = node
            .op
            .inputs()
            .iter()
            .map(|input| {
                self.cloner.mapped(*input).ok_or_else(|| {
                    CircuitError::malformed(node.op.name(), format!("input {input} was removed"))
                })
            })
            .collect::<CircuitResult<Vec<_>>>()?;
        let replacement = node
            .op
            .with_function(simplified)
            .replace_inputs(&inputs, true)
            .into_owned();
        self.cloner.replace(id, replacement)?;
        Ok(())
    }
}

impl CircuitVisitor for Simplifier {
    fn visit_super(&self) -> bool {
        true
    }

    fn preorder_node(&mut self, node: OperatorRef<'_>) -> bool {
        if self.error.is_none() {
            if let Err(e) = self.process(node) {
                self.error = Some(e);
            }
        }
        false
    }
}

impl CircuitPass for SimplifyFunctions {
    fn name(&self) -> &'static str {
        "simplify_functions"
    }

    fn description(&self) -> &'static str {
        "Folds constant sub-expressions in operator functions"
    }

    fn run(&self, circuit: &Circuit) -> CircuitResult<Circuit> {
        let mut simplifier = Simplifier {
            cloner: CircuitCloner::new(circuit.name(), false),
            error: None,
        };
        traverse(circuit, &mut simplifier);
        if let Some(e) = simplifier.error {
            return Err(e);
        }
        Ok(simplifier.cloner.finish(circuit))
    }
}
