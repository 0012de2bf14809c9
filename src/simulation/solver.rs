//! Step-wise ODE integrators.
//!
//! All integrators advance a state in place from the current time to a target time
//! and can be called repeatedly; step size and cached data carry over between calls
//! until [`Integrator::reset`] marks a discontinuity (an event changed the state or
//! a constant).
//!
//! - [`SolverMethod::Sdirk`]: two-stage L-stable SDIRK of order 2 (γ = 1 − 1/√2) with
//!   an embedded first-order estimate. Stage equations are solved with a simplified
//!   Newton iteration on `I − hγJ`, where `J` is a finite difference Jacobian that is
//!   only refreshed when Newton fails to converge. Suited for stiff networks.
//! - [`SolverMethod::DormandPrince`]: explicit 5(4) pair with FSAL.
//! - [`SolverMethod::Rk4`]: peroxide's classical RK4 with fixed step `dt`.

use nalgebra::{DMatrix, DVector, Dyn, LU};
use peroxide::fuga::{BasicODESolver, ODEProblem, ODESolver, RK4};
use thiserror::Error;

use super::setup::{SimulationSetup, SolverMethod};

const GAMMA: f64 = 1.0 - std::f64::consts::FRAC_1_SQRT_2;
const MAX_NEWTON: usize = 10;
const NEWTON_TOL: f64 = 0.01;
const SAFETY: f64 = 0.9;
const FAC_MIN: f64 = 0.2;
const FAC_MAX: f64 = 5.0;

/// Reasons an integration cannot continue.
#[derive(Error, Debug)]
pub enum SolverFailure {
    #[error("{0}")]
    Rhs(anyhow::Error),

    #[error("step size {step:e} fell below the minimum at t = {time}: {cause}")]
    StepSizeUnderflow {
        time: f64,
        step: f64,
        cause: String,
    },

    #[error("step budget of {max_steps} steps exhausted at t = {time}")]
    StepBudgetExhausted { time: f64, max_steps: usize },
}

/// Tolerances and step bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverOptions {
    pub rtol: f64,
    pub atol: f64,
    pub h0: f64,
    pub h_min: f64,
    pub h_max: f64,
    pub max_steps: usize,
    pub dt: f64,
}

impl From<&SimulationSetup> for SolverOptions {
    fn from(setup: &SimulationSetup) -> Self {
        Self {
            rtol: setup.rtol,
            atol: setup.atol,
            h0: setup.h0,
            h_min: setup.h_min,
            h_max: setup.h_max,
            max_steps: setup.max_steps,
            dt: setup.dt,
        }
    }
}

impl SolverOptions {
    fn scale(&self, a: f64, b: f64) -> f64 {
        self.atol + self.rtol * a.abs().max(b.abs())
    }

    /// Weighted RMS norm of `v`.
    fn norm(&self, v: &[f64], y0: &[f64], y1: &[f64]) -> f64 {
        if v.is_empty() {
            return 0.0;
        }
        let sum: f64 = v
            .iter()
            .zip(y0.iter().zip(y1))
            .map(|(e, (a, b))| (e / self.scale(*a, *b)).powi(2))
            .sum();
        (sum / v.len() as f64).sqrt()
    }

    /// Initial step guess from the size of the state and its derivative.
    fn initial_step(&self, y: &[f64], f: &[f64], span: f64) -> f64 {
        if self.h0 > 0.0 {
            return self.h0.min(span).min(self.h_max);
        }
        let d0 = self.norm(y, y, y);
        let d1 = self.norm(f, y, y);
        let h = if d0 < 1e-5 || d1 < 1e-5 {
            1e-6
        } else {
            0.01 * d0 / d1
        };
        h.min(span * 1e-3).max(self.h_min).min(self.h_max)
    }

    fn factor(&self, err: f64, exponent: f64) -> f64 {
        if err == 0.0 {
            FAC_MAX
        } else {
            (SAFETY * err.powf(-exponent)).clamp(FAC_MIN, FAC_MAX)
        }
    }
}

/// Stateful integrator for one simulation run.
#[derive(Debug)]
pub struct Integrator {
    options: SolverOptions,
    method: Method,
    h: f64,
    steps: usize,
}

#[derive(Debug)]
enum Method {
    Sdirk(SdirkCache),
    DormandPrince { k1: Option<Vec<f64>> },
    Rk4,
}

#[derive(Debug, Default)]
struct SdirkCache {
    jacobian: Option<DMatrix<f64>>,
    fresh: bool,
    lu: Option<(f64, LU<f64, Dyn, Dyn>)>,
}

/// Outcome of one attempted step.
enum Attempt {
    Accepted { y: Vec<f64>, err: f64 },
    Rejected { err: f64 },
    /// A stage could not be computed (Newton failure or non-finite stage derivative).
    StageFailure(String),
}

impl Integrator {
    pub fn new(method: SolverMethod, options: SolverOptions) -> Self {
        let method = match method {
            SolverMethod::Sdirk => Method::Sdirk(SdirkCache::default()),
            SolverMethod::DormandPrince => Method::DormandPrince { k1: None },
            SolverMethod::Rk4 => Method::Rk4,
        };
        Self {
            options,
            method,
            h: 0.0,
            steps: 0,
        }
    }

    /// Number of steps attempted so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Drops data that is invalid after a discontinuity.
    pub fn reset(&mut self) {
        match &mut self.method {
            Method::Sdirk(cache) => *cache = SdirkCache::default(),
            Method::DormandPrince { k1 } => *k1 = None,
            Method::Rk4 => {}
        }
    }

    /// Advances `(t, y)` to `t_end`.
    ///
    /// On success `t == t_end` exactly. On failure `t` and `y` hold the last
    /// accepted point.
    pub fn advance<P: ODEProblem>(
        &mut self,
        problem: &P,
        t: &mut f64,
        y: &mut [f64],
        t_end: f64,
    ) -> Result<(), SolverFailure> {
        if t_end <= *t {
            return Ok(());
        }
        if y.is_empty() {
            *t = t_end;
            return Ok(());
        }

        if matches!(self.method, Method::Rk4) {
            return self.advance_rk4(problem, t, y, t_end);
        }

        let opts = self.options;
        let n = y.len();
        let mut f0 = vec![0.0; n];
        problem.rhs(*t, y, &mut f0).map_err(SolverFailure::Rhs)?;

        if self.h <= 0.0 {
            self.h = opts.initial_step(y, &f0, t_end - *t);
        }

        let mut last_cause: Option<String> = None;

        while *t < t_end {
            if self.steps >= opts.max_steps {
                return Err(SolverFailure::StepBudgetExhausted {
                    time: *t,
                    max_steps: opts.max_steps,
                });
            }
            self.steps += 1;

            let remaining = t_end - *t;
            let truncated = self.h * 1.01 >= remaining;
            let h = if truncated { remaining } else { self.h };

            let attempt = match &mut self.method {
                Method::Sdirk(cache) => sdirk_step(problem, &opts, cache, *t, y, &f0, h),
                Method::DormandPrince { k1 } => {
                    dopri_step(problem, &opts, k1.get_or_insert_with(|| f0.clone()), *t, y, h)
                }
                Method::Rk4 => Attempt::StageFailure("fixed-step method in adaptive loop".to_string()),
            };

            match attempt {
                Attempt::Accepted { y: y_new, err } => {
                    *t = if truncated { t_end } else { *t + h };
                    y.copy_from_slice(&y_new);
                    problem.rhs(*t, y, &mut f0).map_err(SolverFailure::Rhs)?;

                    match &mut self.method {
                        Method::Sdirk(cache) => cache.fresh = false,
                        Method::DormandPrince { k1 } => *k1 = Some(f0.clone()),
                        Method::Rk4 => {}
                    }

                    let proposal = h * opts.factor(err, self.exponent());
                    self.h = if truncated { self.h.max(proposal) } else { proposal };
                    last_cause = None;
                }
                Attempt::Rejected { err } => {
                    self.h = h * opts.factor(err, self.exponent()).min(1.0);
                }
                Attempt::StageFailure(cause) => {
                    let retry_with_new_jacobian = match &mut self.method {
                        Method::Sdirk(cache) if !cache.fresh => {
                            cache.jacobian = None;
                            cache.lu = None;
                            true
                        }
                        _ => false,
                    };
                    if !retry_with_new_jacobian {
                        self.h = h * 0.25;
                    }
                    last_cause = Some(cause);
                }
            }

            self.h = self.h.min(opts.h_max);
            if self.h < opts.h_min {
                return Err(SolverFailure::StepSizeUnderflow {
                    time: *t,
                    step: self.h,
                    cause: last_cause.unwrap_or_else(|| "error test failures".to_string()),
                });
            }
        }

        Ok(())
    }

    fn exponent(&self) -> f64 {
        match self.method {
            Method::Sdirk(_) => 0.5,
            _ => 0.2,
        }
    }

    fn advance_rk4<P: ODEProblem>(
        &mut self,
        problem: &P,
        t: &mut f64,
        y: &mut [f64],
        t_end: f64,
    ) -> Result<(), SolverFailure> {
        let span = t_end - *t;
        let n_steps = (span / self.options.dt).ceil().max(1.0) as usize;
        if self.steps + n_steps > self.options.max_steps {
            return Err(SolverFailure::StepBudgetExhausted {
                time: *t,
                max_steps: self.options.max_steps,
            });
        }
        let dt = span / n_steps as f64;

        // The end point is pulled back by half a step so that floating point drift in
        // the accumulated time never adds an extra step.
        let solver = BasicODESolver::new(RK4);
        let (_, y_out) = solver
            .solve(problem, (*t, t_end - 0.5 * dt), dt, y)
            .map_err(SolverFailure::Rhs)?;

        let last = y_out.last().ok_or_else(|| {
            SolverFailure::Rhs(anyhow::anyhow!("RK4 returned no states"))
        })?;
        if last.iter().any(|v| !v.is_finite()) {
            return Err(SolverFailure::StepSizeUnderflow {
                time: *t,
                step: dt,
                cause: "non-finite state".to_string(),
            });
        }

        y.copy_from_slice(last);
        self.steps += n_steps;
        *t = t_end;
        Ok(())
    }
}

/// Finite difference Jacobian `∂f/∂y` with forward differences.
fn jacobian<P: ODEProblem>(
    problem: &P,
    t: f64,
    y: &[f64],
    f0: &[f64],
) -> Result<DMatrix<f64>, String> {
    let n = y.len();
    let mut jac = DMatrix::zeros(n, n);
    let mut yp = y.to_vec();
    let mut fp = vec![0.0; n];
    let eps = f64::EPSILON.sqrt();

    for j in 0..n {
        let original = yp[j];
        let delta = eps * original.abs().max(1e-6);
        yp[j] = original + delta;
        problem.rhs(t, &yp, &mut fp).map_err(|e| e.to_string())?;
        yp[j] = original;
        for i in 0..n {
            jac[(i, j)] = (fp[i] - f0[i]) / delta;
        }
    }

    Ok(jac)
}

/// Solves `Y = base + hγ f(t, Y)` with simplified Newton iterations.
fn newton<P: ODEProblem>(
    problem: &P,
    opts: &SolverOptions,
    lu: &LU<f64, Dyn, Dyn>,
    t: f64,
    base: &[f64],
    guess: Vec<f64>,
    hg: f64,
) -> Result<Vec<f64>, String> {
    let n = base.len();
    let mut stage = guess;
    let mut f = vec![0.0; n];
    let mut previous = f64::INFINITY;

    for iteration in 0..MAX_NEWTON {
        problem.rhs(t, &stage, &mut f).map_err(|e| e.to_string())?;

        let residual = DVector::from_iterator(
            n,
            (0..n).map(|i| base[i] + hg * f[i] - stage[i]),
        );
        let delta = lu
            .solve(&residual)
            .ok_or_else(|| "singular iteration matrix".to_string())?;

        for i in 0..n {
            stage[i] += delta[i];
        }

        let norm = opts.norm(delta.as_slice(), base, &stage);
        if !norm.is_finite() {
            return Err("non-finite Newton update".to_string());
        }
        if norm <= NEWTON_TOL {
            return Ok(stage);
        }
        if iteration > 0 && norm > 2.0 * previous {
            return Err("Newton iteration diverged".to_string());
        }
        previous = norm;
    }

    Err(format!("Newton iteration did not converge in {MAX_NEWTON} iterations"))
}

fn sdirk_step<P: ODEProblem>(
    problem: &P,
    opts: &SolverOptions,
    cache: &mut SdirkCache,
    t: f64,
    y: &[f64],
    f0: &[f64],
    h: f64,
) -> Attempt {
    let n = y.len();
    let hg = h * GAMMA;

    if cache.jacobian.is_none() {
        match jacobian(problem, t, y, f0) {
            Ok(jac) => {
                cache.jacobian = Some(jac);
                cache.fresh = true;
                cache.lu = None;
            }
            Err(cause) => return Attempt::StageFailure(cause),
        }
    }

    let needs_factorization = match &cache.lu {
        Some((factored, _)) => *factored != hg,
        None => true,
    };
    if needs_factorization {
        if let Some(jac) = &cache.jacobian {
            let matrix = DMatrix::<f64>::identity(n, n) - jac * hg;
            cache.lu = Some((hg, matrix.lu()));
        }
    }
    let Some((_, lu)) = &cache.lu else {
        return Attempt::StageFailure("missing iteration matrix".to_string());
    };

    // Stage 1 at t + γh
    let guess: Vec<f64> = (0..n).map(|i| y[i] + hg * f0[i]).collect();
    let stage1 = match newton(problem, opts, lu, t + GAMMA * h, y, guess, hg) {
        Ok(s) => s,
        Err(cause) => return Attempt::StageFailure(cause),
    };
    let k1: Vec<f64> = (0..n).map(|i| (stage1[i] - y[i]) / hg).collect();

    // Stage 2 at t + h; stiffly accurate, so the stage is the new state
    let base: Vec<f64> = (0..n).map(|i| y[i] + h * (1.0 - GAMMA) * k1[i]).collect();
    let guess: Vec<f64> = (0..n).map(|i| base[i] + hg * k1[i]).collect();
    let y_new = match newton(problem, opts, lu, t + h, &base, guess, hg) {
        Ok(s) => s,
        Err(cause) => return Attempt::StageFailure(cause),
    };

    // Embedded first-order estimate y + h k1, filtered through the iteration matrix
    let raw = DVector::from_iterator(
        n,
        (0..n).map(|i| (y_new[i] - base[i]) - hg * k1[i]),
    );
    let filtered = lu.solve(&raw).unwrap_or(raw);
    let err = opts.norm(filtered.as_slice(), y, &y_new);

    if !err.is_finite() {
        return Attempt::StageFailure("non-finite error estimate".to_string());
    }
    if err <= 1.0 {
        Attempt::Accepted { y: y_new, err }
    } else {
        Attempt::Rejected { err }
    }
}

// Dormand–Prince coefficients
const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

fn dopri_step<P: ODEProblem>(
    problem: &P,
    opts: &SolverOptions,
    k1: &mut Vec<f64>,
    t: f64,
    y: &[f64],
    h: f64,
) -> Attempt {
    let n = y.len();
    let mut k = vec![vec![0.0; n]; 5];
    let mut tmp = vec![0.0; n];

    let stages: [(f64, &[f64]); 5] = [
        (1.0 / 5.0, &[A21]),
        (3.0 / 10.0, &[A31, A32]),
        (4.0 / 5.0, &[A41, A42, A43]),
        (8.0 / 9.0, &[A51, A52, A53, A54]),
        (1.0, &[A61, A62, A63, A64, A65]),
    ];

    for (s, (c, a)) in stages.iter().enumerate() {
        for i in 0..n {
            let mut acc = a[0] * k1[i];
            for (j, aj) in a.iter().enumerate().skip(1) {
                acc += aj * k[j - 1][i];
            }
            tmp[i] = y[i] + h * acc;
        }
        if let Err(e) = problem.rhs(t + c * h, &tmp, &mut k[s]) {
            return Attempt::StageFailure(e.to_string());
        }
    }
    let (k3, k4, k5, k6) = (&k[1], &k[2], &k[3], &k[4]);

    let y_new: Vec<f64> = (0..n)
        .map(|i| y[i] + h * (B1 * k1[i] + B3 * k3[i] + B4 * k4[i] + B5 * k5[i] + B6 * k6[i]))
        .collect();

    let mut k7 = vec![0.0; n];
    if let Err(e) = problem.rhs(t + h, &y_new, &mut k7) {
        return Attempt::StageFailure(e.to_string());
    }

    let error: Vec<f64> = (0..n)
        .map(|i| {
            h * (E1 * k1[i] + E3 * k3[i] + E4 * k4[i] + E5 * k5[i] + E6 * k6[i] + E7 * k7[i])
        })
        .collect();
    let err = opts.norm(&error, y, &y_new);

    if !err.is_finite() {
        return Attempt::StageFailure("non-finite error estimate".to_string());
    }
    if err <= 1.0 {
        Attempt::Accepted { y: y_new, err }
    } else {
        Attempt::Rejected { err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// y' = -k y
    struct Decay {
        k: f64,
    }

    impl ODEProblem for Decay {
        fn rhs(&self, _t: f64, y: &[f64], dy: &mut [f64]) -> anyhow::Result<()> {
            dy[0] = -self.k * y[0];
            Ok(())
        }
    }

    /// Robertson's stiff chemical kinetics problem.
    struct Robertson;

    impl ODEProblem for Robertson {
        fn rhs(&self, _t: f64, y: &[f64], dy: &mut [f64]) -> anyhow::Result<()> {
            dy[0] = -0.04 * y[0] + 1e4 * y[1] * y[2];
            dy[2] = 3e7 * y[1] * y[1];
            dy[1] = -dy[0] - dy[2];
            Ok(())
        }
    }

    fn options() -> SolverOptions {
        SolverOptions::from(&SimulationSetup::default())
    }

    #[test]
    fn test_methods_on_decay() {
        for method in [SolverMethod::Sdirk, SolverMethod::DormandPrince, SolverMethod::Rk4] {
            let mut integrator = Integrator::new(method, options());
            let mut t = 0.0;
            let mut y = vec![1.0];

            // Two consecutive intervals with carried step size
            integrator.advance(&Decay { k: 0.5 }, &mut t, &mut y, 1.0).unwrap();
            integrator.advance(&Decay { k: 0.5 }, &mut t, &mut y, 2.0).unwrap();

            assert_eq!(t, 2.0);
            assert_relative_eq!(y[0], (-1.0f64).exp(), max_relative = 1e-4);
        }
    }

    #[test]
    fn test_sdirk_stiff_robertson_conserves_mass() {
        let mut integrator = Integrator::new(SolverMethod::Sdirk, options());
        let mut t = 0.0;
        let mut y = vec![1.0, 0.0, 0.0];

        integrator.advance(&Robertson, &mut t, &mut y, 40.0).unwrap();

        assert_relative_eq!(y.iter().sum::<f64>(), 1.0, epsilon = 1e-10);
        // Reference value y1(40) = 0.7158
        assert_relative_eq!(y[0], 0.7158, max_relative = 1e-2);
    }

    #[test]
    fn test_step_budget() {
        let mut opts = options();
        opts.max_steps = 3;
        let mut integrator = Integrator::new(SolverMethod::DormandPrince, opts);
        let mut t = 0.0;
        let mut y = vec![1.0];

        let result = integrator.advance(&Decay { k: 50.0 }, &mut t, &mut y, 100.0);

        assert!(matches!(
            result,
            Err(SolverFailure::StepBudgetExhausted { max_steps: 3, .. })
        ));
        assert!(t < 100.0);
    }

    #[test]
    fn test_rhs_error_is_reported() {
        struct Failing;
        impl ODEProblem for Failing {
            fn rhs(&self, _t: f64, _y: &[f64], _dy: &mut [f64]) -> anyhow::Result<()> {
                Err(anyhow::anyhow!("boom"))
            }
        }

        let mut integrator = Integrator::new(SolverMethod::Sdirk, options());
        let mut t = 0.0;
        let mut y = vec![1.0];
        let err = integrator.advance(&Failing, &mut t, &mut y, 1.0).unwrap_err();

        assert!(matches!(err, SolverFailure::Rhs(_)));
        assert_eq!(err.to_string(), "boom");
    }
}
