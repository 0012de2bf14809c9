//! Timecourse specifications
//!
//! A [`Timecourse`] is one integration segment: an interval sampled at `steps + 1`
//! equidistant points, a set of changes applied at the start of the segment and
//! timed changes (events) applied exactly at their time. A [`TimecourseSim`] chains
//! segments; the state at the end of one segment is the initial state of the next.

use std::collections::BTreeMap;

use derive_builder::Builder;
use peroxide::{linspace, seq};
use serde::{Deserialize, Serialize};

use super::error::SimulationError;

/// A value change applied at a given time within a segment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimedChange {
    /// Segment-local time.
    pub time: f64,
    pub target: String,
    pub value: f64,
}

impl TimedChange {
    pub fn new(time: f64, target: impl Into<String>, value: f64) -> Self {
        Self {
            time,
            target: target.into(),
            value,
        }
    }
}

/// One integration segment.
///
/// # Examples
///
/// ```
/// use exsimo::prelude::TimecourseBuilder;
///
/// let tc = TimecourseBuilder::default()
///     .start(0.0)
///     .end(100.0)
///     .steps(1000_usize)
///     .changes([("glyglc".to_string(), 350.0)])
///     .build()
///     .unwrap();
///
/// assert_eq!(tc.sample_times().len(), 1001);
/// ```
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct Timecourse {
    #[builder(default = "0.0")]
    pub start: f64,
    pub end: f64,
    /// Number of output intervals; `steps + 1` samples are recorded.
    pub steps: usize,
    /// Changes applied at the start of the segment.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    #[builder(default, setter(into))]
    pub changes: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_events")))]
    pub events: Vec<TimedChange>,
}

impl Timecourse {
    pub fn new(start: f64, end: f64, steps: usize) -> Self {
        Self {
            start,
            end,
            steps,
            changes: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    /// Adds a change applied at the start of the segment.
    pub fn with_change(mut self, target: impl Into<String>, value: f64) -> Self {
        self.changes.insert(target.into(), value);
        self
    }

    /// Adds a timed change.
    pub fn with_event(mut self, time: f64, target: impl Into<String>, value: f64) -> Self {
        self.events.push(TimedChange::new(time, target, value));
        self
    }

    /// The requested output times, `start` and `end` included.
    pub fn sample_times(&self) -> Vec<f64> {
        if self.steps == 0 {
            return vec![self.start];
        }
        let mut times = linspace!(self.start, self.end, self.steps + 1);
        if let Some(last) = times.last_mut() {
            *last = self.end;
        }
        times
    }

    /// Checks bounds, step count and event times.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(SimulationError::InvalidTimecourse(
                "start and end must be finite".to_string(),
            ));
        }
        if self.end < self.start {
            return Err(SimulationError::InvalidTimecourse(format!(
                "end ({}) lies before start ({})",
                self.end, self.start
            )));
        }
        if self.steps == 0 && self.end > self.start {
            return Err(SimulationError::InvalidTimecourse(
                "at least one step is required".to_string(),
            ));
        }
        if let Some(event) = self
            .events
            .iter()
            .find(|e| !(e.time >= self.start && e.time <= self.end))
        {
            return Err(SimulationError::InvalidTimecourse(format!(
                "event on '{}' at t = {} lies outside [{}, {}]",
                event.target, event.time, self.start, self.end
            )));
        }
        Ok(())
    }
}

/// A chain of timecourse segments.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, PartialEq)]
pub struct TimecourseSim {
    #[builder(setter(into, each(name = "to_timecourses")))]
    pub timecourses: Vec<Timecourse>,
    /// Added to all reported times.
    #[serde(default)]
    #[builder(default = "0.0")]
    pub time_offset: f64,
}

impl TimecourseSim {
    pub fn new(timecourses: Vec<Timecourse>) -> Self {
        Self {
            timecourses,
            time_offset: 0.0,
        }
    }

    pub fn with_time_offset(mut self, time_offset: f64) -> Self {
        self.time_offset = time_offset;
        self
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.timecourses.is_empty() {
            return Err(SimulationError::InvalidTimecourse(
                "no timecourse segments".to_string(),
            ));
        }
        self.timecourses.iter().try_for_each(Timecourse::validate)
    }

    /// Number of samples a complete run produces.
    pub fn n_samples(&self) -> usize {
        self.timecourses.iter().map(|tc| tc.steps + 1).sum()
    }
}

impl From<Timecourse> for TimecourseSim {
    fn from(timecourse: Timecourse) -> Self {
        TimecourseSim::new(vec![timecourse])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_times() {
        let tc = Timecourse::new(0.0, 10.0, 4);
        assert_eq!(tc.sample_times(), vec![0.0, 2.5, 5.0, 7.5, 10.0]);
    }

    #[test]
    fn test_validate() {
        assert!(Timecourse::new(0.0, 10.0, 100).validate().is_ok());
        assert!(Timecourse::new(10.0, 0.0, 100).validate().is_err());
        assert!(Timecourse::new(0.0, 10.0, 0).validate().is_err());
        assert!(Timecourse::new(0.0, 10.0, 10)
            .with_event(11.0, "A", 1.0)
            .validate()
            .is_err());
        assert!(TimecourseSim::new(vec![]).validate().is_err());
    }

    #[test]
    fn test_json_round_trip_of_chained_segments() {
        let sim = TimecourseSim::new(vec![
            Timecourse::new(0.0, 100.0, 100).with_change("glyglc", 350.0),
            Timecourse::new(0.0, 50.0, 50).with_event(10.0, "glc_ext", 8.0),
        ])
        .with_time_offset(600.0);

        let json = serde_json::to_string(&sim).unwrap();
        let parsed: TimecourseSim = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, sim);
        assert_eq!(parsed.n_samples(), 152);
    }
}
