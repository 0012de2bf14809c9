//! ODE right-hand side of a reaction network
//!
//! [`OdeSystem`] binds a [`ReactionNetwork`] to a scratch binding vector and assembles
//! the derivative of the dynamic species:
//!
//! 1. copy the state and time into their slots
//! 2. evaluate the derivative plan (rules, volumes, local rules, fluxes)
//! 3. accumulate `coefficient × flux` over the sparse stoichiometry
//! 4. divide by the compartment size for concentration species
//!
//! Boundary species have no state entry and therefore a zero derivative. Non-finite
//! derivatives are reported as [`SimulationError::NonFiniteDerivative`].

use std::cell::RefCell;

use peroxide::fuga::ODEProblem;

use crate::network::model::{ChangeTarget, ColumnSource, Plan, ReactionNetwork};

use super::error::SimulationError;

/// The ODE system of one simulation run.
#[derive(Debug)]
pub struct OdeSystem<'a> {
    network: &'a ReactionNetwork,
    bindings: RefCell<Vec<f64>>,
    /// Per state entry, the slot of the compartment to divide by.
    volumes: Vec<Option<usize>>,
}

impl<'a> OdeSystem<'a> {
    /// Creates the system with all constants taken from `network`.
    pub fn new(network: &'a ReactionNetwork) -> Self {
        let n = network.dynamic_species().len();
        let mut volumes = vec![None; n];
        for species in network.species_slots().iter().filter(|s| s.dynamic) {
            if !species.amount {
                volumes[species.slot] = Some(species.compartment);
            }
        }

        Self {
            network,
            bindings: RefCell::new(network.initial_bindings(0.0)),
            volumes,
        }
    }

    /// Number of state variables.
    pub fn dim(&self) -> usize {
        self.volumes.len()
    }

    pub fn network(&self) -> &ReactionNetwork {
        self.network
    }

    /// Computes `dy = f(t, y)`.
    pub fn derivative(&self, t: f64, y: &[f64], dy: &mut [f64]) -> Result<(), SimulationError> {
        let n = self.dim();
        let mut bindings = self.bindings.borrow_mut();
        bindings[..n].copy_from_slice(y);
        bindings[self.network.time_slot()] = t;

        self.network.evaluate(Plan::Derivative, &mut bindings);

        dy.fill(0.0);
        let fluxes = self.network.flux_slots();
        for term in self.network.stoichiometric_terms() {
            dy[term.state] += term.coefficient * bindings[fluxes[term.reaction]];
        }

        for (i, volume) in self.volumes.iter().enumerate() {
            if let Some(slot) = volume {
                dy[i] /= bindings[*slot];
            }
            if !dy[i].is_finite() {
                return Err(SimulationError::NonFiniteDerivative {
                    time: t,
                    species: self.network.dynamic_species()[i].clone(),
                });
            }
        }

        Ok(())
    }

    /// Evaluates every node at `(t, y)` and returns the output row.
    pub fn snapshot(&self, t: f64, y: &[f64]) -> Vec<f64> {
        let n = self.dim();
        let mut bindings = self.bindings.borrow_mut();
        bindings[..n].copy_from_slice(y);
        bindings[self.network.time_slot()] = t;

        self.network.evaluate(Plan::Snapshot, &mut bindings);

        self.network
            .columns()
            .iter()
            .map(|(_, source)| match source {
                ColumnSource::Slot(slot) => bindings[*slot],
                ColumnSource::Concentration { slot, compartment } => {
                    bindings[*slot] / bindings[*compartment]
                }
            })
            .collect()
    }

    /// Applies a change. State targets are written into `y`.
    ///
    /// Species values are concentrations; for amount species they are converted with
    /// the current compartment size.
    pub fn apply_change(&self, target: ChangeTarget, value: f64, y: &mut [f64]) {
        let bindings = self.bindings.borrow();
        match target {
            ChangeTarget::State { index, amount_in } => {
                y[index] = amount_in.map_or(value, |c| value * bindings[c]);
            }
            ChangeTarget::Constant { slot, amount_in } => {
                let value = amount_in.map_or(value, |c| value * bindings[c]);
                drop(bindings);
                self.bindings.borrow_mut()[slot] = value;
            }
        }
    }
}

impl ODEProblem for OdeSystem<'_> {
    fn rhs(&self, t: f64, y: &[f64], dy: &mut [f64]) -> anyhow::Result<()> {
        self.derivative(t, y, dy).map_err(anyhow::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::definition::*;
    use approx::assert_relative_eq;

    fn network() -> ReactionNetwork {
        let definition = NetworkDefinitionBuilder::default()
            .id("test")
            .to_compartments(Compartment::new("c", 2.0, 3))
            .to_species(Species::new("A", "c", 1.0))
            .to_species(Species::new("B", "c", 0.0))
            .to_species(Species::new("S", "c", 1.0).boundary())
            .to_parameters(Parameter::new("k1", 3.0))
            .to_reactions(
                ReactionBuilder::default()
                    .id("R1")
                    .equation("S + A => 2 B")
                    .unwrap()
                    .rate_law("k1 * A * S")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        ReactionNetwork::new(definition).unwrap()
    }

    #[test]
    fn test_derivative_uses_stoichiometry_and_volume() {
        let network = network();
        let system = OdeSystem::new(&network);
        let mut dy = vec![0.0; 2];

        system.derivative(0.0, &[1.0, 0.0], &mut dy).unwrap();

        // flux = 3 amount/time, volume 2
        assert_relative_eq!(dy[0], -1.5);
        assert_relative_eq!(dy[1], 3.0);
    }

    #[test]
    fn test_boundary_change_affects_derivative() {
        let network = network();
        let system = OdeSystem::new(&network);
        let target = network.change_target("S").unwrap();
        let mut y = vec![1.0, 0.0];
        let mut dy = vec![0.0; 2];

        system.apply_change(target, 2.0, &mut y);
        system.derivative(0.0, &y, &mut dy).unwrap();

        assert_relative_eq!(dy[0], -3.0);
    }

    #[test]
    fn test_non_finite_derivative() {
        let network = network().set_override("c", 0.0).unwrap();
        let system = OdeSystem::new(&network);
        let mut dy = vec![0.0; 2];

        let err = system.derivative(0.0, &[1.0, 0.0], &mut dy).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::NonFiniteDerivative { ref species, .. } if species == "A"
        ));
    }

    #[test]
    fn test_snapshot_columns() {
        let network = network();
        let system = OdeSystem::new(&network);

        let row = system.snapshot(0.0, &[0.5, 1.0]);
        let names: Vec<&str> = network.columns().iter().map(|(n, _)| n.as_str()).collect();

        assert_eq!(names, vec!["A", "B", "S", "R1"]);
        assert_eq!(row, vec![0.5, 1.0, 1.0, 1.5]);
    }
}
