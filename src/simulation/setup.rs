//! Setup module for configuring ODE simulations.
//!
//! This module provides the [`SimulationSetup`] struct and its builder for configuring
//! the numerical integration of a reaction network. It handles:
//!
//! - Integration method selection
//! - Error tolerance settings (relative and absolute)
//! - Step size bounds and the per-run step budget
//!
//! Time ranges are not part of the setup; they belong to the
//! [`Timecourse`](crate::simulation::timecourse::Timecourse) being simulated.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Integration method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    /// Adaptive L-stable SDIRK for stiff systems.
    #[default]
    Sdirk,
    /// Adaptive explicit Dormand–Prince 5(4).
    DormandPrince,
    /// Fixed-step classical Runge–Kutta with step `dt`.
    Rk4,
}

/// Configuration for numerical integration of a reaction network
///
/// # Fields
///
/// * `method` - Integration method (default: [`SolverMethod::Sdirk`])
/// * `rtol` - Relative tolerance for error control (default: 1e-6)
/// * `atol` - Absolute tolerance for error control (default: 1e-9)
/// * `max_steps` - Step budget of a whole run (default: 100 000)
/// * `h0` - Initial step size, 0 for automatic (default: 0.0)
/// * `h_min` - Minimum step size (default: 1e-12)
/// * `h_max` - Maximum step size (default: unbounded)
/// * `dt` - Step size of the fixed-step method (default: 0.01)
/// * `negative_tolerance` - Values below `-negative_tolerance` are reported as
///   negative concentrations (default: 1e-9)
///
/// # Examples
///
/// ```
/// use exsimo::prelude::SimulationSetupBuilder;
///
/// let setup = SimulationSetupBuilder::default()
///     .rtol(1e-8)
///     .atol(1e-10)
///     .max_steps(500_000_usize)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct SimulationSetup {
    #[serde(default)]
    #[builder(default)]
    pub method: SolverMethod,
    #[serde(default = "default_rtol")]
    #[builder(default = "1e-6")]
    pub rtol: f64,
    #[serde(default = "default_atol")]
    #[builder(default = "1e-9")]
    pub atol: f64,
    #[serde(default = "default_max_steps")]
    #[builder(default = "100_000")]
    pub max_steps: usize,
    #[serde(default)]
    #[builder(default = "0.0")]
    pub h0: f64,
    #[serde(default = "default_h_min")]
    #[builder(default = "1e-12")]
    pub h_min: f64,
    /// JSON has no infinity; an unbounded maximum is omitted on output.
    #[serde(default = "default_h_max", skip_serializing_if = "is_unbounded")]
    #[builder(default = "f64::INFINITY")]
    pub h_max: f64,
    #[serde(default = "default_dt")]
    #[builder(default = "0.01")]
    pub dt: f64,
    #[serde(default = "default_negative_tolerance")]
    #[builder(default = "1e-9")]
    pub negative_tolerance: f64,
}

fn default_rtol() -> f64 {
    1e-6
}

fn default_atol() -> f64 {
    1e-9
}

fn default_max_steps() -> usize {
    100_000
}

fn default_h_min() -> f64 {
    1e-12
}

fn default_h_max() -> f64 {
    f64::INFINITY
}

fn is_unbounded(value: &f64) -> bool {
    value.is_infinite()
}

fn default_dt() -> f64 {
    0.01
}

fn default_negative_tolerance() -> f64 {
    1e-9
}

impl Default for SimulationSetup {
    fn default() -> Self {
        Self {
            method: SolverMethod::default(),
            rtol: default_rtol(),
            atol: default_atol(),
            max_steps: default_max_steps(),
            h0: 0.0,
            h_min: default_h_min(),
            h_max: default_h_max(),
            dt: default_dt(),
            negative_tolerance: default_negative_tolerance(),
        }
    }
}

impl SimulationSetup {
    /// Merges solver settings from another setup into this one
    ///
    /// Copies method, tolerances and the fixed step size; step bounds and the step
    /// budget are kept.
    ///
    /// # Arguments
    /// * `other` - The SimulationSetup to merge settings from
    pub fn merge(&mut self, other: &SimulationSetup) {
        self.method = other.method;
        self.dt = other.dt;
        self.rtol = other.rtol;
        self.atol = other.atol;
    }

    /// Checks that tolerances and step bounds are usable.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.rtol.is_finite() && self.rtol > 0.0) {
            return Err("rtol must be finite and > 0".to_string());
        }
        if !(self.atol.is_finite() && self.atol > 0.0) {
            return Err("atol must be finite and > 0".to_string());
        }
        if self.max_steps == 0 {
            return Err("max_steps must be > 0".to_string());
        }
        if !(self.h_min > 0.0) || self.h_max < self.h_min {
            return Err("step bounds must satisfy 0 < h_min <= h_max".to_string());
        }
        if self.method == SolverMethod::Rk4 && !(self.dt.is_finite() && self.dt > 0.0) {
            return Err("dt must be finite and > 0".to_string());
        }
        Ok(())
    }
}
