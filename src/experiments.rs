//! Simulation experiments on the hepatic glucose network
//!
//! An [`Experiment`] bundles a network variant, the timecourse simulated at every
//! grid point, the scan grid and the variables reported from it. The packaged
//! battery reproduces the standard analyses of the liver model:
//!
//! | name | network | scan | timecourse |
//! |------|---------|------|------------|
//! | `dose_response` | dynamic | `glc_ext` 2–20 mM (100) | hormone rules only |
//! | `hgp_gng` | dynamic | `glc_ext` 3.6–4.6 mM (6) | `glyglc` = 350 mM, 0–4200 min |
//! | `glycogenolysis` | dynamic | `glc_ext` 3.6–5.0 mM (8) | `glyglc` = 500 mM, 0–3900 min |
//! | `glycogen_synthesis` | dynamic | `glc_ext` 5.5–8.0 mM (6) | `glyglc` = 200 mM, 0–300 min |
//! | `hgp_gng_ss` | constant glycogen | `glc_ext` 2–14 mM (40) × `glyglc` 0–500 mM (40) | 0–1000 min |

use std::collections::BTreeMap;

use log::info;
use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::models::liver_glucose;
use crate::network::error::NetworkError;
use crate::network::model::ReactionNetwork;
use crate::scan::engine::ScanEngine;
use crate::scan::error::ScanError;
use crate::scan::grid::{ScanAxis, ScanGrid};
use crate::scan::results::ResultCollection;
use crate::simulation::setup::SimulationSetup;
use crate::simulation::timecourse::{Timecourse, TimecourseSim};

/// Which variant of the liver network an experiment runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkVariant {
    /// Glycogen is a dynamic species.
    #[default]
    Dynamic,
    /// Glycogen is held constant.
    ConstGlycogen,
}

impl NetworkVariant {
    pub fn network(&self) -> Result<ReactionNetwork, NetworkError> {
        match self {
            NetworkVariant::Dynamic => liver_glucose::network(),
            NetworkVariant::ConstGlycogen => liver_glucose::const_glycogen_network(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, bon::Builder, Serialize, Deserialize)]
#[builder(on(String, into))]
pub struct Experiment {
    /// Name of the experiment
    pub name: String,

    /// Network the experiment runs on
    #[builder(default)]
    #[serde(default)]
    pub variant: NetworkVariant,

    /// Timecourse simulated at every grid point
    pub tcsim: TimecourseSim,

    /// Overrides per grid point
    #[builder(default)]
    #[serde(default)]
    pub grid: ScanGrid,

    /// Variables whose last values are reported
    #[builder(default)]
    #[serde(default)]
    pub outputs: Vec<String>,
}

/// Results of an experiment.
#[derive(Debug, Clone, Serialize)]
pub struct ExperimentResult {
    pub name: String,
    pub collection: ResultCollection,
    /// Last value of every output at every grid point, shaped like the grid.
    pub last_values: BTreeMap<String, ArrayD<f64>>,
}

impl Experiment {
    /// Hormone dose response to blood glucose.
    pub fn dose_response() -> Self {
        Experiment::builder()
            .name("dose_response")
            .tcsim(Timecourse::new(0.0, 1.0, 1).into())
            .grid(single_axis(ScanAxis::linspace("glc_ext", 2.0, 20.0, 100)))
            .outputs(strings(&["ins", "glu", "epi", "gamma"]))
            .build()
    }

    /// Glucose production and gluconeogenesis after an overnight fast.
    pub fn hgp_gng() -> Self {
        let tcsim = TimecourseSim::from(
            Timecourse::new(0.0, 70.0 * 60.0, 2000).with_change("glyglc", 350.0),
        )
        .with_time_offset(600.0);

        Experiment::builder()
            .name("hgp_gng")
            .tcsim(tcsim)
            .grid(single_axis(ScanAxis::linspace("glc_ext", 3.6, 4.6, 6)))
            .outputs(strings(&["HGP", "GNG", "GLY", "glyglc"]))
            .build()
    }

    /// Glycogen depletion during fasting.
    pub fn glycogenolysis() -> Self {
        Experiment::builder()
            .name("glycogenolysis")
            .tcsim(Timecourse::new(0.0, 65.0 * 60.0, 600).with_change("glyglc", 500.0).into())
            .grid(single_axis(ScanAxis::linspace("glc_ext", 3.6, 5.0, 8)))
            .outputs(strings(&["glyglc", "GLY"]))
            .build()
    }

    /// Glycogen build up under hyperglycemia.
    pub fn glycogen_synthesis() -> Self {
        Experiment::builder()
            .name("glycogen_synthesis")
            .tcsim(Timecourse::new(0.0, 300.0, 600).with_change("glyglc", 200.0).into())
            .grid(single_axis(ScanAxis::linspace("glc_ext", 5.5, 8.0, 6)))
            .outputs(strings(&["glyglc", "GLY"]))
            .build()
    }

    /// Steady state fluxes over blood glucose and constant glycogen content.
    pub fn hgp_gng_ss() -> Self {
        let grid = ScanGrid::default()
            .with_axis(ScanAxis::linspace("glc_ext", 2.0, 14.0, 40))
            .and_then(|grid| grid.with_axis(ScanAxis::linspace("glyglc", 0.0, 500.0, 40)))
            .unwrap_or_default();

        Experiment::builder()
            .name("hgp_gng_ss")
            .variant(NetworkVariant::ConstGlycogen)
            .tcsim(Timecourse::new(0.0, 1000.0, 10).into())
            .grid(grid)
            .outputs(strings(&["HGP", "GNG", "GLY"]))
            .build()
    }

    /// The packaged experiments.
    pub fn all() -> Vec<Experiment> {
        vec![
            Self::dose_response(),
            Self::hgp_gng(),
            Self::glycogenolysis(),
            Self::glycogen_synthesis(),
            Self::hgp_gng_ss(),
        ]
    }

    pub fn by_name(name: &str) -> Option<Experiment> {
        Self::all().into_iter().find(|e| e.name == name)
    }

    /// Runs the experiment.
    ///
    /// Grid points that fail are kept in the collection and reported as NaN in
    /// `last_values`.
    ///
    /// # Errors
    ///
    /// Fails before any simulation when the network cannot be built, a scanned
    /// variable cannot be overridden or an output is not a symbol of the network.
    pub fn run(
        &self,
        engine: &ScanEngine,
        setup: &SimulationSetup,
    ) -> Result<ExperimentResult, ScanError> {
        let network = self.variant.network()?;
        self.grid.check(&network)?;
        if let Some(output) = self
            .outputs
            .iter()
            .find(|o| network.symbol_kind(o).is_none())
        {
            return Err(ScanError::UnknownVariable(output.clone()));
        }

        info!(
            "Running experiment '{}' with {} grid points",
            self.name,
            self.grid.len()
        );
        let collection = engine.run(&network, &self.tcsim, setup, &self.grid);

        let last_values = self
            .outputs
            .iter()
            .map(|output| {
                let values = collection.last_values(output).unwrap_or_else(|_| {
                    ArrayD::from_elem(IxDyn(&collection.shape()), f64::NAN)
                });
                (output.clone(), values)
            })
            .collect();

        Ok(ExperimentResult {
            name: self.name.clone(),
            collection,
            last_values,
        })
    }
}

fn single_axis(axis: ScanAxis) -> ScanGrid {
    ScanGrid::new(vec![axis]).unwrap_or_default()
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_shapes() {
        let shapes: Vec<(String, Vec<usize>)> = Experiment::all()
            .into_iter()
            .map(|e| (e.name.clone(), e.grid.shape()))
            .collect();

        assert_eq!(
            shapes,
            vec![
                ("dose_response".to_string(), vec![100]),
                ("hgp_gng".to_string(), vec![6]),
                ("glycogenolysis".to_string(), vec![8]),
                ("glycogen_synthesis".to_string(), vec![6]),
                ("hgp_gng_ss".to_string(), vec![40, 40]),
            ]
        );
    }

    #[test]
    fn test_by_name() {
        let experiment = Experiment::by_name("hgp_gng").unwrap();
        assert_eq!(experiment.tcsim.time_offset, 600.0);
        assert!(Experiment::by_name("unknown").is_none());
    }

    #[test]
    fn test_dose_response_run() {
        let engine = ScanEngine::builder().parallel(false).build();
        let result = Experiment::dose_response()
            .run(&engine, &SimulationSetup::default())
            .unwrap();

        assert!(result.collection.is_complete());
        let glu = &result.last_values["glu"];
        assert_eq!(glu.shape(), &[100]);
        assert!(glu.iter().zip(glu.iter().skip(1)).all(|(a, b)| b < a));
    }

    #[test]
    fn test_unknown_output_is_rejected() {
        let mut experiment = Experiment::dose_response();
        experiment.outputs.push("insulin".to_string());

        let err = experiment
            .run(&ScanEngine::default(), &SimulationSetup::default())
            .unwrap_err();
        assert_eq!(err, ScanError::UnknownVariable("insulin".to_string()));
    }
}
