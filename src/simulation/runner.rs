//! Timecourse simulation of a reaction network.
//!
//! [`simulate`] integrates a [`TimecourseSim`] segment by segment. Changes are applied
//! at the start of their segment, timed changes are applied exactly at their time
//! by splitting the integration there, and the state carries over from one segment
//! to the next. Every requested sample is recorded with all output columns.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};
use ordered_float::OrderedFloat;

use crate::network::model::{ChangeTarget, ReactionNetwork};

use super::error::SimulationError;
use super::result::SimulationResult;
use super::setup::SimulationSetup;
use super::solver::{Integrator, SolverFailure, SolverOptions};
use super::system::OdeSystem;
use super::timecourse::{TimecourseSim, TimedChange};

/// Simulates `network` over all segments of `tcsim`.
///
/// # Arguments
///
/// * `network` - The network, including any overrides
/// * `tcsim` - The segments to integrate
/// * `setup` - Solver configuration
///
/// # Returns
///
/// The sampled timecourse. Reported times are `time_offset` plus the elapsed time of
/// previous segments plus the time within the current segment, so the first sample of
/// a chained segment repeats the last time of the previous one with the segment's
/// changes applied.
///
/// # Errors
///
/// * [`SimulationError::InvalidTimecourse`] / [`SimulationError::InvalidSetup`] for
///   malformed input
/// * [`SimulationError::InvalidChange`] for changes of unknown or computed symbols
/// * [`SimulationError::IntegrationDiverged`] when the solver gives up; it carries
///   the samples recorded so far
pub fn simulate(
    network: &ReactionNetwork,
    tcsim: &TimecourseSim,
    setup: &SimulationSetup,
) -> Result<SimulationResult, SimulationError> {
    setup.validate().map_err(SimulationError::InvalidSetup)?;
    tcsim.validate()?;

    let system = OdeSystem::new(network);
    let mut y = network.initial_state();
    let mut integrator = Integrator::new(setup.method, SolverOptions::from(setup));

    let columns = network.columns().iter().map(|(name, _)| name.clone()).collect();
    let mut result = SimulationResult::new(columns);
    let mut elapsed = tcsim.time_offset;

    for (index, timecourse) in tcsim.timecourses.iter().enumerate() {
        let changes = timecourse
            .changes
            .iter()
            .map(|(name, value)| Ok((resolve(network, name)?, *value)))
            .collect::<Result<Vec<_>, SimulationError>>()?;

        let mut events = timecourse
            .events
            .iter()
            .map(|event| Ok((resolve(network, &event.target)?, event)))
            .collect::<Result<Vec<(ChangeTarget, &TimedChange)>, SimulationError>>()?;
        events.sort_by(|a, b| a.1.time.total_cmp(&b.1.time));

        for (target, value) in changes {
            system.apply_change(target, value, &mut y);
        }
        integrator.reset();

        let samples = timecourse.sample_times();
        let stops: BTreeSet<OrderedFloat<f64>> = samples
            .iter()
            .chain(events.iter().map(|(_, e)| &e.time))
            .map(|t| OrderedFloat(*t))
            .collect();

        let report = |t: f64| elapsed + (t - timecourse.start);
        let mut t = timecourse.start;
        let mut next_event = 0;
        let mut next_sample = 0;

        for OrderedFloat(stop) in stops {
            if let Err(failure) = integrator.advance(&system, &mut t, &mut y, stop) {
                return Err(diverged(network, failure, report(t), &y, result));
            }

            let mut changed = false;
            while next_event < events.len() && events[next_event].1.time <= stop {
                let (target, event) = &events[next_event];
                system.apply_change(*target, event.value, &mut y);
                changed = true;
                next_event += 1;
            }
            if changed {
                integrator.reset();
            }

            while next_sample < samples.len() && samples[next_sample] <= stop {
                result.push(report(samples[next_sample]), &system.snapshot(stop, &y));
                next_sample += 1;
            }
        }

        debug!(
            "Segment {} of '{}' finished at t = {} after {} steps",
            index,
            network.id(),
            report(t),
            integrator.steps()
        );
        elapsed += timecourse.end - timecourse.start;
    }

    result.warnings =
        result.negative_concentrations(network.dynamic_species(), setup.negative_tolerance);
    for warning in &result.warnings {
        warn!("{}", warning);
    }

    Ok(result)
}

fn resolve(network: &ReactionNetwork, name: &str) -> Result<ChangeTarget, SimulationError> {
    network
        .change_target(name)
        .map_err(|reason| SimulationError::InvalidChange {
            target: name.to_string(),
            reason,
        })
}

fn diverged(
    network: &ReactionNetwork,
    failure: SolverFailure,
    time: f64,
    y: &[f64],
    partial: SimulationResult,
) -> SimulationError {
    let state: BTreeMap<String, f64> = network
        .dynamic_species()
        .iter()
        .cloned()
        .zip(y.iter().copied())
        .collect();

    warn!("Simulation of '{}' diverged at t = {}: {}", network.id(), time, failure);

    SimulationError::IntegrationDiverged {
        time,
        state,
        reason: failure.to_string(),
        partial: Box::new(partial),
    }
}
