//! Simulation Error Module
//!
//! This module provides the error type for ODE assembly and integration.
//!
//! # Key Error Types
//!
//! The [`SimulationError`] enum covers the failure points of a simulation run:
//! - Invalid timecourse specifications and change targets
//! - Non-finite derivatives produced by rate laws
//! - Integrator divergence (step size collapse or exhausted step budget)
//!
//! A diverged integration carries the last reached time, the last valid state and
//! the timecourse sampled up to that point, so callers can inspect how far the run
//! got before it failed.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::network::error::NetworkError;

use super::result::SimulationResult;

#[derive(Error, Debug)]
pub enum SimulationError {
    #[error("No reactions to derive a stoichiometry matrix from")]
    NoReactions,

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Non-finite derivative for '{species}' at t = {time}")]
    NonFiniteDerivative { time: f64, species: String },

    #[error("Integration diverged at t = {time}: {reason}")]
    IntegrationDiverged {
        time: f64,
        state: BTreeMap<String, f64>,
        reason: String,
        partial: Box<SimulationResult>,
    },

    #[error("Invalid change of '{target}': {reason}")]
    InvalidChange { target: String, reason: String },

    #[error("Invalid timecourse: {0}")]
    InvalidTimecourse(String),

    #[error("Invalid simulation setup: {0}")]
    InvalidSetup(String),
}

impl SimulationError {
    /// Short machine readable name of the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            SimulationError::NoReactions => "no_reactions",
            SimulationError::Network(_) => "network",
            SimulationError::NonFiniteDerivative { .. } => "non_finite_derivative",
            SimulationError::IntegrationDiverged { .. } => "integration_diverged",
            SimulationError::InvalidChange { .. } => "invalid_change",
            SimulationError::InvalidTimecourse(_) => "invalid_timecourse",
            SimulationError::InvalidSetup(_) => "invalid_setup",
        }
    }

    /// Time at which the run failed, if it got that far.
    pub fn last_time(&self) -> Option<f64> {
        match self {
            SimulationError::NonFiniteDerivative { time, .. }
            | SimulationError::IntegrationDiverged { time, .. } => Some(*time),
            _ => None,
        }
    }
}
