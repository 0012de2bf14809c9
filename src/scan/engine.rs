use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::network::model::ReactionNetwork;
use crate::simulation::error::SimulationError;
use crate::simulation::result::SimulationResult;
use crate::simulation::runner::simulate;
use crate::simulation::setup::SimulationSetup;
use crate::simulation::timecourse::TimecourseSim;

use super::grid::ScanGrid;
use super::results::ResultCollection;

/// Shared flag to stop a running scan.
///
/// The flag is checked before each grid point; points that have not started when it
/// is raised are recorded as [`PointOutcome::Skipped`].
#[derive(Debug, Clone, Default)]
pub struct ScanCancellation(Arc<AtomicBool>);

impl ScanCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PointOutcome {
    Completed(SimulationResult),
    Failed(PointFailure),
    Skipped,
}

impl PointOutcome {
    pub fn result(&self) -> Option<&SimulationResult> {
        match self {
            PointOutcome::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&PointFailure> {
        match self {
            PointOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Why a grid point has no timecourse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFailure {
    /// Machine readable error kind, e.g. `integration_diverged`.
    pub kind: String,
    pub message: String,
    /// Last time reached before the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_time: Option<f64>,
    /// Samples recorded before the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partial: Option<SimulationResult>,
}

impl From<SimulationError> for PointFailure {
    fn from(error: SimulationError) -> Self {
        let kind = error.kind().to_string();
        let message = error.to_string();
        let last_time = error.last_time();
        let partial = match error {
            SimulationError::IntegrationDiverged { partial, .. } => Some(*partial),
            _ => None,
        };

        Self {
            kind,
            message,
            last_time,
            partial,
        }
    }
}

/// Runs one simulation per grid point.
///
/// Each point clones the network with its overrides applied; runs share nothing but
/// the read-only network template, so they are distributed over the rayon thread
/// pool when `parallel` is set. A failing point is recorded as
/// [`PointOutcome::Failed`] and does not affect the others.
///
/// # Examples
///
/// ```no_run
/// use exsimo::prelude::*;
///
/// let network = exsimo::models::liver_glucose::network().unwrap();
/// let grid = ScanGrid::new(vec!["glc_ext=2:20:100".parse().unwrap()]).unwrap();
/// let tcsim = TimecourseSim::from(Timecourse::new(0.0, 10.0, 10));
///
/// let engine = ScanEngine::builder().progress(true).build();
/// let results = engine.run(&network, &tcsim, &SimulationSetup::default(), &grid);
/// let glu = results.last_values("glu").unwrap();
/// ```
#[derive(Debug, Clone, bon::Builder)]
pub struct ScanEngine {
    /// Distribute grid points over threads
    #[builder(default = true)]
    parallel: bool,

    /// Show a progress bar on stderr
    #[builder(default = false)]
    progress: bool,

    /// Stop flag shared with the caller
    cancellation: Option<ScanCancellation>,
}

impl Default for ScanEngine {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ScanEngine {
    /// Runs the scan.
    ///
    /// # Arguments
    ///
    /// * `network` - The base network
    /// * `tcsim` - Timecourse simulated at every grid point
    /// * `setup` - Solver configuration
    /// * `grid` - Overrides per grid point
    ///
    /// # Returns
    ///
    /// A [`ResultCollection`] with one outcome per grid point.
    pub fn run(
        &self,
        network: &ReactionNetwork,
        tcsim: &TimecourseSim,
        setup: &SimulationSetup,
        grid: &ScanGrid,
    ) -> ResultCollection {
        let n = grid.len();
        let progress_bar = self.progress.then(|| create_progress_bar(n));

        let evaluate = |flat: usize| -> PointOutcome {
            if self.is_cancelled() {
                return PointOutcome::Skipped;
            }
            let outcome = run_point(network, tcsim, setup, grid, flat);
            if let Some(pb) = &progress_bar {
                pb.inc(1);
            }
            outcome
        };

        let outcomes: Vec<PointOutcome> = if self.parallel {
            (0..n).into_par_iter().map(evaluate).collect()
        } else {
            (0..n).map(evaluate).collect()
        };

        if let Some(pb) = progress_bar {
            pb.finish_with_message("done");
        }

        let collection = ResultCollection::new(grid.clone(), outcomes);
        info!(
            "Scan of '{}' over {:?}: {} completed, {} failed, {} skipped",
            network.id(),
            grid.shape(),
            collection.n_completed(),
            collection.failures().len(),
            collection.n_skipped()
        );
        collection
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(ScanCancellation::is_cancelled)
    }
}

fn run_point(
    network: &ReactionNetwork,
    tcsim: &TimecourseSim,
    setup: &SimulationSetup,
    grid: &ScanGrid,
    flat: usize,
) -> PointOutcome {
    let overrides = grid.point(flat).unwrap_or_default();

    let outcome = match network.set_overrides(overrides.iter().copied()) {
        Ok(point_network) => match simulate(&point_network, tcsim, setup) {
            Ok(result) => PointOutcome::Completed(result),
            Err(error) => PointOutcome::Failed(PointFailure::from(error)),
        },
        Err(error) => PointOutcome::Failed(PointFailure {
            kind: "invalid_override".to_string(),
            message: error.to_string(),
            last_time: None,
            partial: None,
        }),
    };

    if let PointOutcome::Failed(failure) = &outcome {
        warn!("Scan point {:?} failed: {}", overrides, failure.message);
    }
    outcome
}

fn create_progress_bar(n: usize) -> ProgressBar {
    let pb = ProgressBar::new(n as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} | {elapsed}/{eta} | {msg}")
    {
        pb.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
    }
    pb.set_message("Scanning...");
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::definition::*;
    use crate::scan::grid::ScanAxis;
    use crate::simulation::timecourse::Timecourse;
    use approx::assert_relative_eq;

    fn decay() -> ReactionNetwork {
        let definition = NetworkDefinitionBuilder::default()
            .id("decay")
            .to_compartments(Compartment::new("c", 1.0, 3))
            .to_species(Species::new("A", "c", 1.0))
            .to_parameters(Parameter::new("k", 1.0))
            .to_reactions(
                ReactionBuilder::default()
                    .id("R")
                    .equation("A =>")
                    .unwrap()
                    .rate_law("k * A / (1 - k / 4)")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        ReactionNetwork::new(definition).unwrap()
    }

    fn grid() -> ScanGrid {
        ScanGrid::new(vec![
            ScanAxis::new("k", vec![0.5, 1.0, 4.0]),
            ScanAxis::new("A", vec![1.0, 2.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let network = decay();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 1.0, 4));
        let setup = SimulationSetup::default();

        let sequential = ScanEngine::builder()
            .parallel(false)
            .build()
            .run(&network, &tcsim, &setup, &grid());
        let parallel = ScanEngine::default().run(&network, &tcsim, &setup, &grid());

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_failed_point_is_localized() {
        let network = decay();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 1.0, 4));

        let results = ScanEngine::default().run(&network, &tcsim, &SimulationSetup::default(), &grid());

        // k = 4 divides by zero
        assert_eq!(results.n_completed(), 4);
        let failures = results.failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].0, vec![2, 0]);
        assert_eq!(failures[0].1.kind, "integration_diverged");
        assert_relative_eq!(failures[0].1.last_time.unwrap(), 0.0);

        let a = results.timecourse(&[1, 1]).unwrap().get("A").unwrap();
        assert_relative_eq!(a[0], 2.0);
    }

    #[test]
    fn test_cancelled_scan_skips_points() {
        let network = decay();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 1.0, 4));
        let cancellation = ScanCancellation::new();
        cancellation.cancel();

        let results = ScanEngine::builder()
            .cancellation(cancellation)
            .build()
            .run(&network, &tcsim, &SimulationSetup::default(), &grid());

        assert_eq!(results.n_skipped(), 6);
        assert!(!results.is_complete());
    }

    #[test]
    fn test_invalid_override_fails_every_point() {
        let network = decay();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 1.0, 4));
        let grid = ScanGrid::new(vec![ScanAxis::new("R", vec![1.0])]).unwrap();

        let results = ScanEngine::default().run(&network, &tcsim, &SimulationSetup::default(), &grid);

        assert_eq!(results.failures()[0].1.kind, "invalid_override");
    }
}
