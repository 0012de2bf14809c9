use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::experiments::{Experiment, ExperimentResult};
use crate::network::definition::NetworkDefinition;
use crate::scan::grid::ScanGrid;
use crate::scan::results::ResultCollection;
use crate::simulation::result::SimulationResult;
use crate::simulation::setup::SimulationSetup;
use crate::simulation::timecourse::TimecourseSim;

/// Loads and parses a network definition from a JSON file.
///
/// # Arguments
///
/// * `path` - Path to the JSON file containing the definition
///
/// # Errors
///
/// This function will return an error if:
/// * The file cannot be found or opened (`IOError::FileNotFound`)
/// * The file contents cannot be parsed as valid JSON (`IOError::JsonParseError`)
/// * The JSON structure does not match the definition format
pub fn load_definition(path: impl Into<PathBuf>) -> Result<NetworkDefinition, IOError> {
    load_json(path)
}

/// Saves a network definition to a pretty-printed JSON file.
pub fn save_definition(
    path: impl Into<PathBuf>,
    definition: &NetworkDefinition,
) -> Result<(), IOError> {
    save_json(path, definition)
}

/// Loads a solver configuration. Missing fields take their defaults.
pub fn load_setup(path: impl Into<PathBuf>) -> Result<SimulationSetup, IOError> {
    load_json(path)
}

pub fn save_setup(path: impl Into<PathBuf>, setup: &SimulationSetup) -> Result<(), IOError> {
    save_json(path, setup)
}

/// Loads a chain of timecourse segments.
pub fn load_tcsim(path: impl Into<PathBuf>) -> Result<TimecourseSim, IOError> {
    load_json(path)
}

pub fn save_tcsim(path: impl Into<PathBuf>, tcsim: &TimecourseSim) -> Result<(), IOError> {
    save_json(path, tcsim)
}

/// Loads scan axes; duplicated or empty axes are rejected while parsing.
pub fn load_grid(path: impl Into<PathBuf>) -> Result<ScanGrid, IOError> {
    load_json(path)
}

pub fn load_experiment(path: impl Into<PathBuf>) -> Result<Experiment, IOError> {
    load_json(path)
}

pub fn save_experiment(path: impl Into<PathBuf>, experiment: &Experiment) -> Result<(), IOError> {
    save_json(path, experiment)
}

pub fn load_result(path: impl Into<PathBuf>) -> Result<SimulationResult, IOError> {
    load_json(path)
}

pub fn save_result(path: impl Into<PathBuf>, result: &SimulationResult) -> Result<(), IOError> {
    save_json(path, result)
}

pub fn load_collection(path: impl Into<PathBuf>) -> Result<ResultCollection, IOError> {
    load_json(path)
}

pub fn save_collection(
    path: impl Into<PathBuf>,
    collection: &ResultCollection,
) -> Result<(), IOError> {
    save_json(path, collection)
}

/// Saves an experiment result. NaN cells are written as `null`.
pub fn save_experiment_result(
    path: impl Into<PathBuf>,
    result: &ExperimentResult,
) -> Result<(), IOError> {
    save_json(path, result)
}

fn load_json<T: DeserializeOwned>(path: impl Into<PathBuf>) -> Result<T, IOError> {
    let path = path.into();
    let file = std::fs::File::open(path).map_err(IOError::FileNotFound)?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(IOError::JsonParseError)
}

fn save_json<T: Serialize>(path: impl Into<PathBuf>, value: &T) -> Result<(), IOError> {
    let path = path.into();
    let file = std::fs::File::create(path).map_err(IOError::FileNotFound)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value)
        .map_err(IOError::JsonParseError)
}

/// Represents errors that can occur while reading or writing JSON files.
#[derive(Error, Debug)]
pub enum IOError {
    /// The file could not be found, opened or created.
    #[error("File not found: {0}")]
    FileNotFound(#[from] std::io::Error),

    /// The file contents could not be parsed or serialized.
    #[error("Failed to parse JSON: {0}")]
    JsonParseError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::liver_glucose;
    use crate::simulation::timecourse::Timecourse;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_definition_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("liver.json");
        let definition = liver_glucose::definition().unwrap();

        save_definition(&path, &definition).unwrap();
        let loaded = load_definition(&path).unwrap();

        assert_eq!(loaded, definition);
    }

    #[test]
    fn test_tcsim_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tcsim.json");
        let tcsim = TimecourseSim::new(vec![
            Timecourse::new(0.0, 10.0, 10).with_change("glyglc", 350.0),
            Timecourse::new(0.0, 5.0, 5).with_event(2.5, "glc_ext", 8.0),
        ]);

        save_tcsim(&path, &tcsim).unwrap();

        assert_eq!(load_tcsim(&path).unwrap(), tcsim);
    }

    #[test]
    fn test_missing_file() {
        let result = load_setup("/definitely/not/here.json");
        assert!(matches!(result, Err(IOError::FileNotFound(_))));
    }

    #[test]
    fn test_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_setup(&path), Err(IOError::JsonParseError(_))));
    }
}
