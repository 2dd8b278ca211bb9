//! Copying a circuit while rewriting it
//!
//! A [`CircuitCloner`] builds a new circuit from an old one operator by
//! operator. Each old operator is kept, replaced, spliced out or dropped, and
//! the cloner remembers which new operator stands for it so that consumers
//! are rewired. When nothing changed, [`CircuitCloner::finish`] hands back
//! the original circuit.

use crate::circuit::Circuit;
use crate::error::{CircuitError, CircuitResult};
use crate::operator::{Operator, OperatorId};
use std::borrow::Cow;
use std::collections::HashMap;

#[derive(Debug)]
pub struct CircuitCloner {
    output: Circuit,
    remap: HashMap<OperatorId, OperatorId>,
    force: bool,
    changed: bool,
}

impl CircuitCloner {
    /// `force` copies every operator even when its inputs are unchanged
    pub fn new(name: impl Into<String>, force: bool) -> Self {
        Self {
            output: Circuit::new(name),
            remap: HashMap::new(),
            force,
            changed: false,
        }
    }

    /// New operator standing for an old one, if any
    pub fn mapped(&self, old: OperatorId) -> Option<OperatorId> {
        self.remap.get(&old).copied()
    }

    pub fn output(&self) -> &Circuit {
        &self.output
    }

    fn map_inputs(&self, op: &Operator) -> CircuitResult<Vec<OperatorId>> {
        op.inputs()
            .iter()
            .map(|input| {
                self.mapped(*input).ok_or_else(|| {
                    CircuitError::malformed(
                        op.name(),
                        format!("input {input} was removed but is still read"),
                    )
                })
            })
            .collect()
    }

    /// Copy `op` with its inputs rewired
    pub fn keep(&mut self, old: OperatorId, op: &Operator) -> CircuitResult<OperatorId> {
        let inputs = self.map_inputs(op)?;
        let rewired = op.replace_inputs(&inputs, self.force);
        if matches!(rewired, Cow::Owned(_)) || old.index() != self.output.len() {
            self.changed = true;
        }
        let new = self.output.insert(rewired.into_owned())?;
        self.remap.insert(old, new);
        Ok(new)
    }

    /// Put `replacement` in place of the old operator. Its inputs must
    /// already refer to the new circuit.
    pub fn replace(&mut self, old: OperatorId, replacement: Operator) -> CircuitResult<OperatorId> {
        let new = self.output.insert(replacement)?;
        self.changed = true;
        self.remap.insert(old, new);
        Ok(new)
    }

    /// Let consumers of a unary operator read its input instead
    pub fn splice(&mut self, old: OperatorId, op: &Operator) -> CircuitResult<OperatorId> {
        let input = op
            .inputs()
            .first()
            .copied()
            .ok_or_else(|| CircuitError::malformed(op.name(), "cannot splice an operator without inputs"))?;
        let new = self.mapped(input).ok_or_else(|| {
            CircuitError::malformed(op.name(), format!("input {input} was removed"))
        })?;
        self.changed = true;
        self.remap.insert(old, new);
        Ok(new)
    }

    /// Leave the old operator out. Consumers that still read it fail.
    pub fn drop_operator(&mut self, old: OperatorId) {
        log::debug!("Dropping operator {old}");
        self.changed = true;
        self.remap.remove(&old);
    }

    /// Stand `new` in for the old operator
    pub fn map_to(&mut self, old: OperatorId, new: OperatorId) {
        if self.remap.insert(old, new) != Some(new) {
            self.changed = true;
        }
    }

    /// Direct access to the circuit under construction, for inserting extra
    /// operators
    pub fn builder(&mut self) -> &mut Circuit {
        self.changed = true;
        &mut self.output
    }

    /// The rewritten circuit, or a copy of `original` when nothing changed
    pub fn finish(self, original: &Circuit) -> Circuit {
        if self.changed || self.output.len() != original.len() {
            self.output
        } else {
            original.clone()
        }
    }
}
