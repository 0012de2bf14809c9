//! Information display for network definitions and results
//!
//! This module implements `Display` for [`NetworkDefinition`] and
//! [`ResultCollection`], rendering their components as tables.

use std::fmt::{self, Display};

use itertools::Itertools;
use tabled::{builder::Builder, settings::Style};

use crate::network::definition::{
    AssignmentRule, Compartment, NetworkDefinition, Parameter, Reaction, Size, Species,
};
use crate::scan::engine::PointOutcome;
use crate::scan::results::ResultCollection;
use crate::simulation::result::SimulationResult;

/// Trait for converting model components to table records
///
/// Implementors provide column headers and the string values of one row.
trait TableRecord {
    fn columns() -> Vec<String>;

    fn to_record(&self) -> Vec<String>;
}

impl Display for NetworkDefinition {
    /// Formats a definition as nested tables, one per non-empty component list.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(vec![format!(
            "Network '{}'",
            self.name.as_deref().unwrap_or(&self.id)
        )]);

        if !self.compartments.is_empty() {
            builder.push_record(vec!["Compartments"]);
            builder.push_record(vec![to_table(&self.compartments)]);
        }

        if !self.species.is_empty() {
            builder.push_record(vec!["Species"]);
            builder.push_record(vec![to_table(&self.species)]);
        }

        if !self.parameters.is_empty() {
            builder.push_record(vec!["Parameters"]);
            builder.push_record(vec![to_table(&self.parameters)]);
        }

        if !self.rules.is_empty() {
            builder.push_record(vec!["Assignment Rules"]);
            builder.push_record(vec![to_table(&self.rules)]);
        }

        if !self.reactions.is_empty() {
            builder.push_record(vec!["Reactions"]);
            builder.push_record(vec![to_table(&self.reactions)]);
        }

        let mut table = builder.build();
        table.with(Style::sharp());
        write!(f, "{table}")
    }
}

impl Display for ResultCollection {
    /// Formats one row per grid point with its overrides and status.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builder = Builder::default();
        let mut header = vec!["#".to_string()];
        header.extend(self.axes().iter().map(|a| a.name.clone()));
        header.extend(["Status".to_string(), "Samples".to_string(), "Detail".to_string()]);
        builder.push_record(header);

        for (flat, (coordinate, outcome)) in self.iter().enumerate() {
            let mut record = vec![flat.to_string()];
            record.extend(
                self.axes()
                    .iter()
                    .zip(&coordinate)
                    .map(|(axis, c)| format!("{}", axis.values[*c])),
            );
            match outcome {
                PointOutcome::Completed(result) => {
                    record.push("completed".to_string());
                    record.push(result.len().to_string());
                    record.push(format!("{} warnings", result.warnings.len()));
                }
                PointOutcome::Failed(failure) => {
                    record.push(failure.kind.clone());
                    record.push(
                        failure
                            .partial
                            .as_ref()
                            .map_or(0, SimulationResult::len)
                            .to_string(),
                    );
                    record.push(failure.message.clone());
                }
                PointOutcome::Skipped => {
                    record.push("skipped".to_string());
                    record.push("0".to_string());
                    record.push(String::new());
                }
            }
            builder.push_record(record);
        }

        let mut table = builder.build();
        table.with(Style::rounded());
        write!(f, "{table}")
    }
}

/// Formats the last sampled values of `variables` as a two column table.
pub fn last_values_table(result: &SimulationResult, variables: &[String]) -> String {
    let mut builder = Builder::default();
    builder.push_record(vec!["Variable", "Value"]);
    for variable in variables {
        let value = result
            .last(variable)
            .map_or_else(|| "-".to_string(), |v| format!("{v:.6e}"));
        builder.push_record(vec![variable.clone(), value]);
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn to_table<T: TableRecord>(records: &[T]) -> String {
    let mut builder = Builder::default();
    builder.push_record(T::columns());

    for record in records {
        builder.push_record(record.to_record());
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

fn optional(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl TableRecord for Compartment {
    fn columns() -> Vec<String> {
        vec!["ID".into(), "Name".into(), "Size".into(), "Dimensions".into()]
    }

    fn to_record(&self) -> Vec<String> {
        let size = match &self.size {
            Size::Value(value) => value.to_string(),
            Size::Expression(expression) => expression.clone(),
        };
        vec![
            self.id.clone(),
            optional(&self.name),
            size,
            self.spatial_dimensions.to_string(),
        ]
    }
}

impl TableRecord for Species {
    fn columns() -> Vec<String> {
        vec![
            "ID".into(),
            "Name".into(),
            "Compartment".into(),
            "Initial".into(),
            "Boundary".into(),
        ]
    }

    fn to_record(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            optional(&self.name),
            self.compartment.clone(),
            self.initial_concentration.to_string(),
            if self.boundary_condition { "yes" } else { "" }.to_string(),
        ]
    }
}

impl TableRecord for Parameter {
    fn columns() -> Vec<String> {
        vec!["ID".into(), "Name".into(), "Value".into()]
    }

    fn to_record(&self) -> Vec<String> {
        vec![self.id.clone(), optional(&self.name), self.value.to_string()]
    }
}

impl TableRecord for AssignmentRule {
    fn columns() -> Vec<String> {
        vec!["Variable".into(), "Expression".into()]
    }

    fn to_record(&self) -> Vec<String> {
        vec![self.variable.clone(), self.expression.clone()]
    }
}

impl TableRecord for Reaction {
    fn columns() -> Vec<String> {
        vec![
            "ID".into(),
            "Name".into(),
            "Equation".into(),
            "Parameters".into(),
            "Rules".into(),
        ]
    }

    fn to_record(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            optional(&self.name),
            equation(self),
            self.parameters.len().to_string(),
            self.rules.len().to_string(),
        ]
    }
}

fn equation(reaction: &Reaction) -> String {
    let side = |sign: f64| {
        reaction
            .stoichiometry
            .iter()
            .filter(|e| e.coefficient * sign > 0.0)
            .map(|e| match e.coefficient.abs() {
                c if c == 1.0 => e.species.clone(),
                c => format!("{c} {}", e.species),
            })
            .join(" + ")
    };
    let arrow = if reaction.reversible { "<=>" } else { "=>" };
    let mut equation = format!("{} {arrow} {}", side(-1.0), side(1.0));
    if !reaction.modifiers.is_empty() {
        equation.push_str(&format!(" [{}]", reaction.modifiers.join(", ")));
    }
    equation.trim().to_string()
}
