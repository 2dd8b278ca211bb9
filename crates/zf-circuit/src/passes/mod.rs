//! Pass infrastructure: rewrites from one circuit to another

pub mod dead_code;
pub mod incrementalize;
pub mod simplify;

use crate::circuit::Circuit;
use crate::error::CircuitResult;

/// Circuit-to-circuit rewrite
///
/// A pass is a reusable configuration. Each call to [`CircuitPass::run`]
/// uses fresh visitor state, so one pass value may rewrite many circuits.
pub trait CircuitPass: Send + Sync {
    /// Pass name (used for filtering and display)
    fn name(&self) -> &'static str;
    /// Human-readable description
    fn description(&self) -> &'static str;
    /// Rewrite `circuit`. A pass that changes nothing returns a copy of its
    /// input.
    fn run(&self, circuit: &Circuit) -> CircuitResult<Circuit>;
}

/// Runs circuit passes in order
pub struct PassManager {
    passes: Vec<Box<dyn CircuitPass>>,
}

impl PassManager {
    pub fn new(passes: Vec<Box<dyn CircuitPass>>) -> Self {
        Self { passes }
    }

    /// Function simplification followed by dead code removal
    pub fn with_defaults() -> Self {
        Self::new(vec![
            Box::new(simplify::SimplifyFunctions),
            Box::new(dead_code::DeadCode),
        ])
    }

    /// Run every pass whose name is in `pass_filter`, or all of them
    pub fn run(&self, circuit: &Circuit, pass_filter: Option<&[String]>) -> CircuitResult<Circuit> {
        let mut current = circuit.clone();
        for pass in &self.passes {
            if let Some(filter) = pass_filter {
                if !filter.iter().any(|f| f == pass.name()) {
                    continue;
                }
            }
            log::debug!("Running pass {} on {}", pass.name(), current.name());
            current = pass.run(&current)?;
        }
        Ok(current)
    }

    /// List all pass names in run order
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}
