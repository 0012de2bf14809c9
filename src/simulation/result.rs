//! Simulation Result Module
//!
//! This module provides the data structure for the output of a simulation run.
//!
//! # Key Components
//!
//! - [`SimulationResult`]: Sampled time series of all tracked variables
//! - [`NegativeConcentrationWarning`]: Non-fatal diagnostic for species that dropped below zero
//!
//! Columns are stored column-major, one vector per variable, in the order: dynamic
//! species, boundary species, `[S]` concentrations of amount species, expression-sized
//! compartments, global rules, local rules, reaction fluxes.

use std::fmt;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Represents the result of a simulation.
///
/// # Fields
///
/// * `time` - Reported time of each sample
/// * `columns` - Variable names
/// * `values` - One vector per column, aligned with `time`. Non-finite values are
///   written to JSON as the strings `"NaN"`, `"inf"` and `"-inf"`
/// * `warnings` - Negative concentrations found after the run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SimulationResult {
    pub time: Vec<f64>,
    pub columns: Vec<String>,
    #[serde(with = "float_columns")]
    pub values: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<NegativeConcentrationWarning>,
}

impl SimulationResult {
    /// Creates an empty result with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        let values = vec![Vec::new(); columns.len()];
        Self {
            time: Vec::new(),
            columns,
            values,
            warnings: Vec::new(),
        }
    }

    /// Appends one sample. `row` is aligned with the columns.
    pub fn push(&mut self, time: f64, row: &[f64]) {
        self.time.push(time);
        for (column, value) in self.values.iter_mut().zip(row) {
            column.push(*value);
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// The time series of a variable.
    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i].as_slice())
    }

    /// The last sampled value of a variable.
    pub fn last(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(|v| v.last().copied())
    }

    /// Samples as a matrix, one row per time point and one column per variable.
    pub fn to_matrix(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.len(), self.columns.len()), |(i, j)| self.values[j][i])
    }

    /// Values of all columns at sample `index`.
    pub fn row(&self, index: usize) -> Option<Vec<f64>> {
        (index < self.len()).then(|| self.values.iter().map(|c| c[index]).collect())
    }

    /// Finds samples where one of `species` is below `-tolerance`.
    ///
    /// Only the first negative sample per species is reported.
    pub fn negative_concentrations(
        &self,
        species: &[String],
        tolerance: f64,
    ) -> Vec<NegativeConcentrationWarning> {
        species
            .iter()
            .filter_map(|s| {
                let series = self.get(s)?;
                let index = series.iter().position(|v| *v < -tolerance)?;
                Some(NegativeConcentrationWarning {
                    species: s.clone(),
                    time: self.time[index],
                    value: series[index],
                })
            })
            .collect()
    }
}

/// A dynamic species became negative during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NegativeConcentrationWarning {
    pub species: String,
    pub time: f64,
    pub value: f64,
}

impl fmt::Display for NegativeConcentrationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Negative concentration of '{}' at t = {}: {:e}",
            self.species, self.time, self.value
        )
    }
}

/// JSON numbers cannot hold NaN or infinities, and serde_json writes them as `null`.
/// Columns keep them as strings instead; `null` reads back as NaN.
mod float_columns {
    use std::fmt;

    use serde::de::{self, Deserializer, Visitor};
    use serde::ser::Serializer;
    use serde::{Deserialize, Serialize};

    struct Float(f64);

    impl Serialize for Float {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            match self.0 {
                v if v.is_finite() => serializer.serialize_f64(v),
                v if v.is_nan() => serializer.serialize_str("NaN"),
                v if v > 0.0 => serializer.serialize_str("inf"),
                _ => serializer.serialize_str("-inf"),
            }
        }
    }

    impl<'de> Deserialize<'de> for Float {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_any(FloatVisitor)
        }
    }

    struct FloatVisitor;

    impl Visitor<'_> for FloatVisitor {
        type Value = Float;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number, null, or one of \"NaN\", \"inf\", \"-inf\"")
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Float(value))
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Float(value as f64))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Float(value as f64))
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Float(f64::NAN))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(Float(f64::NAN))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            match value {
                "NaN" | "nan" => Ok(Float(f64::NAN)),
                "inf" | "+inf" | "Infinity" => Ok(Float(f64::INFINITY)),
                "-inf" | "-Infinity" => Ok(Float(f64::NEG_INFINITY)),
                _ => Err(E::custom(format!("Invalid number: {value}"))),
            }
        }
    }

    pub fn serialize<S: Serializer>(columns: &[Vec<f64>], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(
            columns
                .iter()
                .map(|column| column.iter().map(|v| Float(*v)).collect::<Vec<_>>()),
        )
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Vec<f64>>, D::Error> {
        let columns = Vec::<Vec<Float>>::deserialize(deserializer)?;
        Ok(columns
            .into_iter()
            .map(|column| column.into_iter().map(|Float(v)| v).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn result() -> SimulationResult {
        let mut result = SimulationResult::new(vec!["A".to_string(), "B".to_string()]);
        result.push(0.0, &[1.0, 0.0]);
        result.push(1.0, &[0.5, -1e-3]);
        result.push(2.0, &[0.25, -2e-3]);
        result
    }

    #[test]
    fn test_accessors() {
        let result = result();

        assert_eq!(result.len(), 3);
        assert_eq!(result.get("A"), Some(&[1.0, 0.5, 0.25][..]));
        assert_eq!(result.last("B"), Some(-2e-3));
        assert_eq!(result.get("C"), None);
        assert_eq!(result.row(1), Some(vec![0.5, -1e-3]));
    }

    #[test]
    fn test_to_matrix() {
        let matrix = result().to_matrix();
        assert_eq!(matrix, arr2(&[[1.0, 0.0], [0.5, -1e-3], [0.25, -2e-3]]));
    }

    #[test]
    fn test_negative_concentrations() {
        let result = result();
        let species = vec!["A".to_string(), "B".to_string()];

        let warnings = result.negative_concentrations(&species, 1e-9);
        assert_eq!(
            warnings,
            vec![NegativeConcentrationWarning {
                species: "B".to_string(),
                time: 1.0,
                value: -1e-3
            }]
        );

        assert!(result.negative_concentrations(&species, 1e-2).is_empty());
    }

    #[test]
    fn test_json_keeps_non_finite_values() {
        let mut result = SimulationResult::new(vec!["A".to_string(), "R".to_string()]);
        result.push(0.0, &[1.0, f64::INFINITY]);
        result.push(0.5, &[f64::NAN, f64::NEG_INFINITY]);

        let json = serde_json::to_string(&result).unwrap();
        let parsed: SimulationResult = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.get("A").unwrap()[0], 1.0);
        assert!(parsed.get("A").unwrap()[1].is_nan());
        assert_eq!(parsed.get("R"), Some(&[f64::INFINITY, f64::NEG_INFINITY][..]));
        assert_eq!(parsed.time, vec![0.0, 0.5]);
    }

    #[test]
    fn test_json_null_reads_as_nan() {
        let json = r#"{"time": [0.0], "columns": ["A"], "values": [[null]]}"#;

        let parsed: SimulationResult = serde_json::from_str(json).unwrap();

        assert!(parsed.last("A").unwrap().is_nan());
    }
}
