use std::collections::HashSet;
use std::str::FromStr;

use lazy_static::lazy_static;
use peroxide::{linspace, seq};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::network::model::ReactionNetwork;

use super::error::ScanError;

lazy_static! {
    static ref AXIS_PATTERN: Regex =
        Regex::new(r"^\s*(\w+)\s*=\s*(.+?)\s*$").expect("valid axis regex");
    static ref RANGE_PATTERN: Regex =
        Regex::new(r"^([^:,]+):([^:,]+):(\d+)$").expect("valid range regex");
}

/// A scanned variable and the ordered values it takes.
///
/// The name must be an overridable identifier of the network (species, parameter,
/// local parameter or constant compartment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanAxis {
    pub name: String,
    pub values: Vec<f64>,
}

impl ScanAxis {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// `n` equidistant values from `from` to `to`, both included.
    pub fn linspace(name: impl Into<String>, from: f64, to: f64, n: usize) -> Self {
        let values = match n {
            0 => Vec::new(),
            1 => vec![from],
            _ => {
                let mut values = linspace!(from, to, n);
                if let Some(last) = values.last_mut() {
                    *last = to;
                }
                values
            }
        };
        Self::new(name, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromStr for ScanAxis {
    type Err = ScanError;

    /// Parses `name=from:to:n` (equidistant) or `name=v1,v2,...` (explicit values).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Example: "glc_ext=2:20:100"
        let invalid = || ScanError::InvalidAxis(s.to_string());
        let caps = AXIS_PATTERN.captures(s).ok_or_else(invalid)?;
        let name = &caps[1];
        let body = caps[2].replace(char::is_whitespace, "");

        let axis = if let Some(range) = RANGE_PATTERN.captures(&body) {
            let from = range[1].parse::<f64>().map_err(|_| invalid())?;
            let to = range[2].parse::<f64>().map_err(|_| invalid())?;
            let n = range[3].parse::<usize>().map_err(|_| invalid())?;
            ScanAxis::linspace(name, from, to, n)
        } else {
            let values = body
                .split(',')
                .map(|v| v.parse::<f64>().map_err(|_| invalid()))
                .collect::<Result<Vec<_>, _>>()?;
            ScanAxis::new(name, values)
        };

        if axis.is_empty() {
            return Err(ScanError::EmptyAxis { name: axis.name });
        }
        Ok(axis)
    }
}

/// Cartesian product of scan axes.
///
/// Grid points are enumerated in row-major order: the first axis varies slowest and
/// the last axis fastest. A grid without axes has exactly one point without
/// overrides.
///
/// # Examples
///
/// ```
/// use exsimo::prelude::{ScanAxis, ScanGrid};
///
/// let grid = ScanGrid::new(vec![
///     ScanAxis::new("glc_ext", vec![4.0, 6.0]),
///     ScanAxis::new("glyglc", vec![100.0, 200.0, 300.0]),
/// ])
/// .unwrap();
///
/// assert_eq!(grid.shape(), vec![2, 3]);
/// assert_eq!(grid.coordinate(4), Some(vec![1, 1]));
/// assert_eq!(grid.point(4), Some(vec![("glc_ext", 6.0), ("glyglc", 200.0)]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ScanAxis>", into = "Vec<ScanAxis>")]
pub struct ScanGrid {
    axes: Vec<ScanAxis>,
}

impl ScanGrid {
    /// Creates a grid, rejecting empty and duplicated axes.
    pub fn new(axes: Vec<ScanAxis>) -> Result<Self, ScanError> {
        let mut seen = HashSet::new();
        for axis in &axes {
            if axis.is_empty() {
                return Err(ScanError::EmptyAxis {
                    name: axis.name.clone(),
                });
            }
            if !seen.insert(axis.name.as_str()) {
                return Err(ScanError::DuplicateAxis(axis.name.clone()));
            }
        }
        Ok(Self { axes })
    }

    /// Appends an axis; it varies faster than all existing ones.
    pub fn with_axis(self, axis: ScanAxis) -> Result<Self, ScanError> {
        let mut axes = self.axes;
        axes.push(axis);
        Self::new(axes)
    }

    pub fn axes(&self) -> &[ScanAxis] {
        &self.axes
    }

    pub fn shape(&self) -> Vec<usize> {
        self.axes.iter().map(ScanAxis::len).collect()
    }

    /// Number of grid points.
    pub fn len(&self) -> usize {
        self.axes.iter().map(ScanAxis::len).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The N-dimensional coordinate of flat index `flat`.
    pub fn coordinate(&self, flat: usize) -> Option<Vec<usize>> {
        if flat >= self.len() {
            return None;
        }
        let mut rest = flat;
        let mut coordinate = vec![0; self.axes.len()];
        for (i, axis) in self.axes.iter().enumerate().rev() {
            coordinate[i] = rest % axis.len();
            rest /= axis.len();
        }
        Some(coordinate)
    }

    /// The flat index of `coordinate`.
    pub fn flat_index(&self, coordinate: &[usize]) -> Option<usize> {
        if coordinate.len() != self.axes.len() {
            return None;
        }
        coordinate
            .iter()
            .zip(&self.axes)
            .try_fold(0, |flat, (&c, axis)| (c < axis.len()).then(|| flat * axis.len() + c))
    }

    /// The overrides of the grid point with flat index `flat`.
    pub fn point(&self, flat: usize) -> Option<Vec<(&str, f64)>> {
        let coordinate = self.coordinate(flat)?;
        Some(
            self.axes
                .iter()
                .zip(coordinate)
                .map(|(axis, c)| (axis.name.as_str(), axis.values[c]))
                .collect(),
        )
    }

    /// Checks that every axis names an overridable identifier of `network`.
    pub fn check(&self, network: &ReactionNetwork) -> Result<(), ScanError> {
        for axis in &self.axes {
            network
                .set_override(&axis.name, axis.values[0])
                .map_err(|source| ScanError::Override {
                    name: axis.name.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

impl TryFrom<Vec<ScanAxis>> for ScanGrid {
    type Error = ScanError;

    fn try_from(axes: Vec<ScanAxis>) -> Result<Self, Self::Error> {
        Self::new(axes)
    }
}

impl From<ScanGrid> for Vec<ScanAxis> {
    fn from(grid: ScanGrid) -> Self {
        grid.axes
    }
}
