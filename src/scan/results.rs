//! Results of a scan.
//!
//! A [`ResultCollection`] holds one [`PointOutcome`] per grid point in flat row-major
//! order together with the grid that produced it. Reductions such as
//! [`ResultCollection::last_values`] reshape the flat outcomes into an N-dimensional
//! array shaped like the scan; cells without a timecourse hold NaN.

use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::simulation::result::SimulationResult;

use super::engine::{PointFailure, PointOutcome};
use super::error::ScanError;
use super::grid::{ScanAxis, ScanGrid};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCollection")]
pub struct ResultCollection {
    grid: ScanGrid,
    outcomes: Vec<PointOutcome>,
}

#[derive(Deserialize)]
struct RawCollection {
    grid: ScanGrid,
    outcomes: Vec<PointOutcome>,
}

impl TryFrom<RawCollection> for ResultCollection {
    type Error = ScanError;

    fn try_from(raw: RawCollection) -> Result<Self, Self::Error> {
        if raw.outcomes.len() != raw.grid.len() {
            return Err(ScanError::OutcomeCount {
                expected: raw.grid.len(),
                found: raw.outcomes.len(),
            });
        }
        Ok(Self::new(raw.grid, raw.outcomes))
    }
}

impl ResultCollection {
    pub(crate) fn new(grid: ScanGrid, outcomes: Vec<PointOutcome>) -> Self {
        Self { grid, outcomes }
    }

    pub fn grid(&self) -> &ScanGrid {
        &self.grid
    }

    /// The scanned axes in declaration order.
    pub fn axes(&self) -> &[ScanAxis] {
        self.grid.axes()
    }

    pub fn shape(&self) -> Vec<usize> {
        self.grid.shape()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Outcome at an N-dimensional coordinate.
    pub fn get(&self, coordinate: &[usize]) -> Option<&PointOutcome> {
        self.grid
            .flat_index(coordinate)
            .and_then(|flat| self.outcomes.get(flat))
    }

    /// Timecourse at an N-dimensional coordinate, if that run completed.
    pub fn timecourse(&self, coordinate: &[usize]) -> Option<&SimulationResult> {
        self.get(coordinate).and_then(PointOutcome::result)
    }

    /// Outcome at a flat index.
    pub fn outcome(&self, flat: usize) -> Option<&PointOutcome> {
        self.outcomes.get(flat)
    }

    /// All outcomes with their coordinates, in flat order.
    pub fn iter(&self) -> impl Iterator<Item = (Vec<usize>, &PointOutcome)> {
        self.outcomes
            .iter()
            .enumerate()
            .map(|(flat, outcome)| (self.grid.coordinate(flat).unwrap_or_default(), outcome))
    }

    pub fn failures(&self) -> Vec<(Vec<usize>, &PointFailure)> {
        self.iter()
            .filter_map(|(coordinate, outcome)| outcome.failure().map(|f| (coordinate, f)))
            .collect()
    }

    pub fn n_completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PointOutcome::Completed(_)))
            .count()
    }

    pub fn n_skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, PointOutcome::Skipped))
            .count()
    }

    /// True when every grid point completed.
    pub fn is_complete(&self) -> bool {
        self.n_completed() == self.grid.len()
    }

    /// Last sampled value of `variable` at every grid point.
    ///
    /// # Errors
    ///
    /// [`ScanError::UnknownVariable`] when no completed run has the variable.
    pub fn last_values(&self, variable: &str) -> Result<ArrayD<f64>, ScanError> {
        self.reduce(variable, |series| series.last().copied().unwrap_or(f64::NAN))
    }

    /// Applies `f` to the time series of `variable` of every completed run.
    ///
    /// The returned array has the shape of the scan; failed and skipped points hold
    /// NaN.
    pub fn reduce<F>(&self, variable: &str, f: F) -> Result<ArrayD<f64>, ScanError>
    where
        F: Fn(&[f64]) -> f64,
    {
        let mut found = false;
        let values: Vec<f64> = self
            .outcomes
            .iter()
            .map(|outcome| match outcome.result().and_then(|r| r.get(variable)) {
                Some(series) => {
                    found = true;
                    f(series)
                }
                None => f64::NAN,
            })
            .collect();

        if !found {
            return Err(ScanError::UnknownVariable(variable.to_string()));
        }

        ArrayD::from_shape_vec(IxDyn(&self.shape()), values).map_err(|_| ScanError::OutcomeCount {
            expected: self.grid.len(),
            found: self.outcomes.len(),
        })
    }
}
