//! Declarative network definition
//!
//! These types describe a reaction network as data: compartments, species,
//! parameters, assignment rules and reactions with their rate laws. They are
//! serde-serializable so that networks can be stored as JSON, and each has a
//! builder for programmatic construction. A definition is not validated on its
//! own; see [`crate::network::consistency`] and [`crate::network::model::ReactionNetwork`].

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::equation::ReactionEquation;
use super::error::NetworkError;

/// Root object of a reaction network definition.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
#[builder(build_fn(error = "NetworkError"))]
pub struct NetworkDefinition {
    /// Identifier of the network.
    #[builder(setter(into))]
    pub id: String,

    /// Human readable name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_compartments")))]
    pub compartments: Vec<Compartment>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_species")))]
    pub species: Vec<Species>,

    /// Global constant parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_parameters")))]
    pub parameters: Vec<Parameter>,

    /// Global assignment rules, recomputed at every evaluation.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_rules")))]
    pub rules: Vec<AssignmentRule>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_reactions")))]
    pub reactions: Vec<Reaction>,
}

impl NetworkDefinition {
    /// Returns a copy of the definition in which `species` has the given
    /// boundary condition flag.
    ///
    /// Changing a boundary condition changes the state layout, so the result has
    /// to be built into a new [`crate::network::model::ReactionNetwork`].
    pub fn with_boundary_condition(
        &self,
        species: &str,
        boundary_condition: bool,
    ) -> Result<NetworkDefinition, NetworkError> {
        let mut definition = self.clone();
        let target = definition
            .species
            .iter_mut()
            .find(|s| s.id == species)
            .ok_or_else(|| NetworkError::InvalidOverride {
                name: species.to_string(),
                reason: "not a species".to_string(),
            })?;
        target.boundary_condition = boundary_condition;
        Ok(definition)
    }

    pub fn get_species(&self, id: &str) -> Option<&Species> {
        self.species.iter().find(|s| s.id == id)
    }

    pub fn get_reaction(&self, id: &str) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.id == id)
    }

    pub fn get_compartment(&self, id: &str) -> Option<&Compartment> {
        self.compartments.iter().find(|c| c.id == id)
    }
}

/// Size of a compartment: either a number or an expression over other identifiers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Size {
    Value(f64),
    Expression(String),
}

impl Default for Size {
    fn default() -> Self {
        Size::Value(1.0)
    }
}

impl From<f64> for Size {
    fn from(value: f64) -> Self {
        Size::Value(value)
    }
}

impl From<&str> for Size {
    fn from(expression: &str) -> Self {
        Size::Expression(expression.to_string())
    }
}

impl From<String> for Size {
    fn from(expression: String) -> Self {
        Size::Expression(expression)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
#[builder(build_fn(error = "NetworkError"))]
pub struct Compartment {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    /// Volume (3D), area (2D) or length (1D).
    #[serde(default)]
    #[builder(default, setter(into))]
    pub size: Size,

    /// Only relevant for unit consistency; integration treats all sizes alike.
    #[serde(default = "default_dimensions")]
    #[builder(default = "3")]
    pub spatial_dimensions: u8,
}

fn default_dimensions() -> u8 {
    3
}

impl Compartment {
    pub fn new(id: impl Into<String>, size: impl Into<Size>, spatial_dimensions: u8) -> Self {
        Self {
            id: id.into(),
            name: None,
            size: size.into(),
            spatial_dimensions,
        }
    }
}

/// A chemical species located in one compartment.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
#[builder(build_fn(error = "NetworkError"))]
pub struct Species {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    #[builder(setter(into))]
    pub compartment: String,

    /// Initial concentration (amount / compartment size).
    #[serde(default)]
    #[builder(default)]
    pub initial_concentration: f64,

    /// Boundary species are held constant and excluded from the state vector.
    #[serde(default)]
    #[builder(default)]
    pub boundary_condition: bool,

    /// If set, the species' amount is integrated instead of its concentration.
    #[serde(default)]
    #[builder(default)]
    pub has_only_substance_units: bool,
}

impl Species {
    pub fn new(
        id: impl Into<String>,
        compartment: impl Into<String>,
        initial_concentration: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            compartment: compartment.into(),
            initial_concentration,
            boundary_condition: false,
            has_only_substance_units: false,
        }
    }

    /// Marks the species as boundary species.
    pub fn boundary(mut self) -> Self {
        self.boundary_condition = true;
        self
    }
}

/// A named constant.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
#[builder(build_fn(error = "NetworkError"))]
pub struct Parameter {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    pub value: f64,
}

impl Parameter {
    pub fn new(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            name: None,
            value,
        }
    }
}

/// `variable = expression`, recomputed whenever it is needed.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
#[builder(build_fn(error = "NetworkError"))]
pub struct AssignmentRule {
    #[builder(setter(into))]
    pub variable: String,

    #[builder(setter(into))]
    pub expression: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,
}

impl AssignmentRule {
    pub fn new(variable: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
            expression: expression.into(),
            name: None,
        }
    }
}

/// Signed stoichiometric coefficient of one species in a reaction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoichiometryEntry {
    pub species: String,
    pub coefficient: f64,
}

impl StoichiometryEntry {
    pub fn new(species: impl Into<String>, coefficient: f64) -> Self {
        Self {
            species: species.into(),
            coefficient,
        }
    }
}

/// A reaction with its stoichiometry and rate law.
///
/// Local parameters and local rules are part of the global namespace; their
/// identifiers must be unique across the whole network. Local rules are evaluated
/// in declaration order before the rate law.
#[derive(Debug, Clone, Serialize, Deserialize, Builder, Default, PartialEq)]
#[builder(build_fn(error = "NetworkError"))]
pub struct Reaction {
    #[builder(setter(into))]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[builder(default, setter(into, strip_option))]
    pub compartment: Option<String>,

    #[serde(default)]
    #[builder(default)]
    pub reversible: bool,

    /// Reactants negative, products positive.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_stoichiometry")))]
    pub stoichiometry: Vec<StoichiometryEntry>,

    /// Species that appear in the rate law without being converted.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_modifiers", into)))]
    pub modifiers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_parameters")))]
    pub parameters: Vec<Parameter>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    #[builder(default, setter(into, each(name = "to_rules")))]
    pub rules: Vec<AssignmentRule>,

    /// Flux expression in amount per time.
    #[builder(setter(into))]
    pub rate_law: String,
}

impl ReactionBuilder {
    /// Sets stoichiometry, modifiers and reversibility from an equation string.
    ///
    /// # Examples
    ///
    /// ```
    /// use exsimo::network::definition::ReactionBuilder;
    ///
    /// let reaction = ReactionBuilder::default()
    ///     .id("PPASE")
    ///     .equation("pp + h2o => h + 2 phos")
    ///     .unwrap()
    ///     .rate_law("PPASE_Vmax * pp/(pp + PPASE_k_pp)")
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(reaction.stoichiometry.len(), 4);
    /// ```
    pub fn equation(&mut self, equation: &str) -> Result<&mut Self, NetworkError> {
        let parsed = ReactionEquation::parse(equation)?;
        self.stoichiometry = Some(parsed.stoichiometry());
        self.modifiers = Some(parsed.modifiers.clone());
        self.reversible = Some(parsed.reversible);
        Ok(self)
    }
}

impl Reaction {
    /// Coefficient of `species` in this reaction, zero if it does not take part.
    pub fn coefficient(&self, species: &str) -> f64 {
        self.stoichiometry
            .iter()
            .filter(|e| e.species == species)
            .map(|e| e.coefficient)
            .sum()
    }
}
