//! Compiled reaction network
//!
//! [`ReactionNetwork`] is the validated, compiled form of a [`NetworkDefinition`].
//! Every identifier is assigned a slot in a flat binding vector:
//!
//! ```text
//! | dynamic species | boundary species | compartments | parameters | local parameters |
//! | rules | local rules | fluxes | time |
//! ```
//!
//! Dynamic species come first so that the state vector maps onto the leading slots.
//! Rules, expression-sized compartments, local rules and fluxes are compiled once and
//! ordered topologically into two evaluation plans: the derivative plan holds only the
//! nodes that fluxes and dynamic-species volumes depend on, the snapshot plan holds all.
//!
//! The compiled template is shared through an [`Arc`]. A network value owns only its
//! vector of constant values, so cloning is cheap and overrides never touch the template.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use log::debug;
use ndarray::Array2;

use crate::expression::{CompiledExpression, Expression};
use crate::simulation::stoich::{derive_stoichiometry_matrix, sparse_stoichiometry, StoichiometricTerm};

use super::consistency::{check_consistency, Severity, SymbolKind, TIME_SYMBOLS};
use super::definition::{NetworkDefinition, Size};
use super::error::NetworkError;

/// Selects which nodes are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// Nodes required to compute the derivative.
    Derivative,
    /// All nodes, for full output snapshots.
    Snapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Rule,
    Compartment,
    LocalRule,
    Flux,
}

#[derive(Debug, Clone)]
pub(crate) struct PlanNode {
    pub(crate) target: usize,
    pub(crate) kind: NodeKind,
    pub(crate) program: CompiledExpression,
}

/// Placement of a species in the binding vector.
#[derive(Debug, Clone)]
pub(crate) struct SpeciesSlot {
    pub(crate) id: String,
    pub(crate) slot: usize,
    pub(crate) compartment: usize,
    pub(crate) dynamic: bool,
    /// The slot holds an amount instead of a concentration.
    pub(crate) amount: bool,
}

/// Where a change (event or segment change) writes its value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ChangeTarget {
    /// A dynamic species; index into the state vector.
    State { index: usize, amount_in: Option<usize> },
    /// A boundary species, parameter or numeric compartment.
    Constant { slot: usize, amount_in: Option<usize> },
}

/// Source of an output column.
#[derive(Debug, Clone)]
pub(crate) enum ColumnSource {
    Slot(usize),
    /// Concentration of an amount species: `slot / compartment`.
    Concentration { slot: usize, compartment: usize },
}

#[derive(Debug)]
struct Template {
    definition: NetworkDefinition,
    slot_names: Vec<String>,
    slot_kinds: Vec<SymbolKind>,
    slots: HashMap<String, usize>,
    dynamic_species: Vec<String>,
    boundary_species: Vec<String>,
    species: Vec<SpeciesSlot>,
    reaction_ids: Vec<String>,
    flux_slots: Vec<usize>,
    nodes: Vec<PlanNode>,
    derivative_plan: Vec<usize>,
    snapshot_plan: Vec<usize>,
    stoichiometry: Vec<StoichiometricTerm>,
    columns: Vec<(String, ColumnSource)>,
    time_slot: usize,
}

/// A validated, compiled reaction network.
#[derive(Debug, Clone)]
pub struct ReactionNetwork {
    template: Arc<Template>,
    values: Vec<f64>,
}

impl TryFrom<NetworkDefinition> for ReactionNetwork {
    type Error = NetworkError;

    fn try_from(definition: NetworkDefinition) -> Result<Self, Self::Error> {
        ReactionNetwork::new(definition)
    }
}

impl ReactionNetwork {
    /// Validates and compiles a network definition.
    ///
    /// # Arguments
    ///
    /// * `definition` - Declarative network definition
    ///
    /// # Returns
    ///
    /// The compiled network, or the first construction error:
    /// [`NetworkError::InvalidExpression`], [`NetworkError::UnresolvedReference`],
    /// [`NetworkError::DuplicateIdentifier`] or [`NetworkError::CyclicDependency`].
    pub fn new(definition: NetworkDefinition) -> Result<Self, NetworkError> {
        let parsed = parse_expressions(&definition)?;

        let report = check_consistency(&definition);
        for issue in report.with_severity(Severity::Warning) {
            debug!("{}: {}", issue.location(), issue.message());
        }
        if let Some(error) = report.first_error() {
            return Err(error);
        }

        // Slot layout
        let mut slot_names: Vec<String> = Vec::new();
        let mut slot_kinds: Vec<SymbolKind> = Vec::new();
        let mut push = |name: &str, kind: SymbolKind| {
            slot_names.push(name.to_string());
            slot_kinds.push(kind);
        };

        let dynamic_species: Vec<String> = definition
            .species
            .iter()
            .filter(|s| !s.boundary_condition)
            .map(|s| s.id.clone())
            .collect();
        let boundary_species: Vec<String> = definition
            .species
            .iter()
            .filter(|s| s.boundary_condition)
            .map(|s| s.id.clone())
            .collect();

        dynamic_species.iter().for_each(|s| push(s, SymbolKind::Species));
        boundary_species.iter().for_each(|s| push(s, SymbolKind::Species));
        definition.compartments.iter().for_each(|c| push(&c.id, SymbolKind::Compartment));
        definition.parameters.iter().for_each(|p| push(&p.id, SymbolKind::Parameter));
        for reaction in &definition.reactions {
            reaction.parameters.iter().for_each(|p| push(&p.id, SymbolKind::LocalParameter));
        }
        definition.rules.iter().for_each(|r| push(&r.variable, SymbolKind::Rule));
        for reaction in &definition.reactions {
            reaction.rules.iter().for_each(|r| push(&r.variable, SymbolKind::LocalRule));
        }
        definition.reactions.iter().for_each(|r| push(&r.id, SymbolKind::Reaction));
        push(TIME_SYMBOLS[0], SymbolKind::Time);

        let time_slot = slot_names.len() - 1;
        let mut slots: HashMap<String, usize> = slot_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        for alias in TIME_SYMBOLS {
            slots.insert(alias.to_string(), time_slot);
        }

        // Constant values
        let mut values = vec![0.0; slot_names.len()];
        for species in &definition.species {
            values[slots[&species.id]] = species.initial_concentration;
        }
        for compartment in &definition.compartments {
            values[slots[&compartment.id]] = match compartment.size {
                Size::Value(v) => v,
                Size::Expression(_) => f64::NAN,
            };
        }
        for parameter in definition
            .parameters
            .iter()
            .chain(definition.reactions.iter().flat_map(|r| r.parameters.iter()))
        {
            values[slots[&parameter.id]] = parameter.value;
        }

        // Compile nodes in declaration order
        let resolve = |name: &str| slots.get(name).copied();
        let mut nodes: Vec<PlanNode> = Vec::new();
        let mut chained: Vec<Option<usize>> = Vec::new();

        for ((location, target, kind, chain_previous), expression) in parsed {
            let program = expression
                .compile(resolve)
                .map_err(|source| NetworkError::InvalidExpression {
                    location: location.clone(),
                    source,
                })?;
            let target = slots[&target];
            chained.push(if chain_previous { Some(nodes.len() - 1) } else { None });
            nodes.push(PlanNode {
                target,
                kind,
                program,
            });
        }

        let order = topological_order(&nodes, &chained, &slot_names)?;

        let species: Vec<SpeciesSlot> = definition
            .species
            .iter()
            .map(|s| SpeciesSlot {
                id: s.id.clone(),
                slot: slots[&s.id],
                compartment: slots[&s.compartment],
                dynamic: !s.boundary_condition,
                amount: s.has_only_substance_units,
            })
            .collect();

        // Nodes needed for the derivative: fluxes and the volumes of concentration
        // species, plus everything they depend on.
        let mut needed: HashSet<usize> = HashSet::new();
        let volume_slots: HashSet<usize> = species
            .iter()
            .filter(|s| s.dynamic && !s.amount)
            .map(|s| s.compartment)
            .collect();
        let producers: HashMap<usize, usize> =
            nodes.iter().enumerate().map(|(i, n)| (n.target, i)).collect();
        let mut stack: Vec<usize> = nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == NodeKind::Flux || volume_slots.contains(&n.target))
            .map(|(i, _)| i)
            .collect();
        while let Some(i) = stack.pop() {
            if !needed.insert(i) {
                continue;
            }
            stack.extend(node_dependencies(i, &nodes, &chained, &producers));
        }

        let derivative_plan: Vec<usize> = order.iter().copied().filter(|i| needed.contains(i)).collect();
        let snapshot_plan = order;

        let state_index: HashMap<String, usize> = dynamic_species
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i))
            .collect();
        let stoichiometry = sparse_stoichiometry(&definition.reactions, &state_index);
        let reaction_ids: Vec<String> = definition.reactions.iter().map(|r| r.id.clone()).collect();
        let flux_slots: Vec<usize> = reaction_ids.iter().map(|r| slots[r]).collect();

        let columns = output_columns(&definition, &slots, &species);

        debug!(
            "Compiled network '{}': {} dynamic species, {} boundary species, {} reactions, {}/{} nodes in derivative plan",
            definition.id,
            dynamic_species.len(),
            boundary_species.len(),
            reaction_ids.len(),
            derivative_plan.len(),
            snapshot_plan.len()
        );

        Ok(Self {
            template: Arc::new(Template {
                definition,
                slot_names,
                slot_kinds,
                slots,
                dynamic_species,
                boundary_species,
                species,
                reaction_ids,
                flux_slots,
                nodes,
                derivative_plan,
                snapshot_plan,
                stoichiometry,
                columns,
                time_slot,
            }),
            values,
        })
    }

    pub fn id(&self) -> &str {
        &self.template.definition.id
    }

    /// The definition this network was compiled from.
    pub fn definition(&self) -> &NetworkDefinition {
        &self.template.definition
    }

    /// Dynamic species in state vector order.
    pub fn dynamic_species(&self) -> &[String] {
        &self.template.dynamic_species
    }

    pub fn boundary_species(&self) -> &[String] {
        &self.template.boundary_species
    }

    pub fn reaction_ids(&self) -> &[String] {
        &self.template.reaction_ids
    }

    /// All identifiers with a slot, in slot order.
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.template.slot_names.iter().map(String::as_str)
    }

    pub fn symbol_kind(&self, name: &str) -> Option<SymbolKind> {
        self.template
            .slots
            .get(name)
            .map(|&slot| self.template.slot_kinds[slot])
    }

    /// Current constant value of a species (initial concentration), parameter or
    /// numeric compartment.
    pub fn value(&self, name: &str) -> Option<f64> {
        let slot = *self.template.slots.get(name)?;
        match self.template.slot_kinds[slot] {
            SymbolKind::Species | SymbolKind::Parameter | SymbolKind::LocalParameter => {
                Some(self.values[slot])
            }
            SymbolKind::Compartment if !self.values[slot].is_nan() => Some(self.values[slot]),
            _ => None,
        }
    }

    /// Returns a clone with `name` set to `value`.
    ///
    /// Species overrides set the initial concentration, parameter and compartment
    /// overrides set the constant value. Rules, reactions and expression-sized
    /// compartments cannot be overridden.
    ///
    /// # Arguments
    ///
    /// * `name` - Identifier to override
    /// * `value` - New value
    ///
    /// # Returns
    ///
    /// The modified clone, or [`NetworkError::InvalidOverride`].
    pub fn set_override(&self, name: &str, value: f64) -> Result<ReactionNetwork, NetworkError> {
        let slot = self.overridable_slot(name).map_err(|reason| NetworkError::InvalidOverride {
            name: name.to_string(),
            reason,
        })?;

        let mut network = self.clone();
        network.values[slot] = value;
        Ok(network)
    }

    /// Applies several overrides in order.
    pub fn set_overrides<'a, I>(&self, overrides: I) -> Result<ReactionNetwork, NetworkError>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        overrides
            .into_iter()
            .try_fold(self.clone(), |network, (name, value)| network.set_override(name, value))
    }

    fn overridable_slot(&self, name: &str) -> Result<usize, String> {
        let slot = *self
            .template
            .slots
            .get(name)
            .ok_or_else(|| "unknown identifier".to_string())?;

        match self.template.slot_kinds[slot] {
            SymbolKind::Species | SymbolKind::Parameter | SymbolKind::LocalParameter => Ok(slot),
            SymbolKind::Compartment if self.values[slot].is_nan() => {
                Err("compartment size is an expression".to_string())
            }
            SymbolKind::Compartment => Ok(slot),
            kind => Err(format!("{kind} values are computed")),
        }
    }

    /// The initial state vector (concentrations, or amounts for amount species).
    pub fn initial_state(&self) -> Vec<f64> {
        let n = self.template.dynamic_species.len();
        self.initial_bindings(0.0)[..n].to_vec()
    }

    /// Stoichiometry matrix with species rows and reaction columns.
    pub fn stoichiometry_matrix(&self) -> (Array2<f64>, Vec<String>) {
        derive_stoichiometry_matrix(&self.template.definition.reactions)
            .unwrap_or_else(|_| (Array2::zeros((0, 0)), Vec::new()))
    }

    /// Full binding vector at `time` with every node evaluated.
    pub(crate) fn initial_bindings(&self, time: f64) -> Vec<f64> {
        let mut bindings = self.values.clone();
        bindings[self.template.time_slot] = time;
        self.evaluate(Plan::Snapshot, &mut bindings);

        let amount_species: Vec<&SpeciesSlot> =
            self.template.species.iter().filter(|s| s.amount).collect();
        if !amount_species.is_empty() {
            for s in amount_species {
                bindings[s.slot] *= bindings[s.compartment];
            }
            self.evaluate(Plan::Snapshot, &mut bindings);
        }

        bindings
    }

    /// Evaluates a plan in place.
    pub(crate) fn evaluate(&self, plan: Plan, bindings: &mut [f64]) {
        let order = match plan {
            Plan::Derivative => &self.template.derivative_plan,
            Plan::Snapshot => &self.template.snapshot_plan,
        };
        for &i in order {
            let node = &self.template.nodes[i];
            bindings[node.target] = node.program.eval(bindings);
        }
    }

    pub(crate) fn slot(&self, name: &str) -> Option<usize> {
        self.template.slots.get(name).copied()
    }

    pub(crate) fn time_slot(&self) -> usize {
        self.template.time_slot
    }

    pub(crate) fn species_slots(&self) -> &[SpeciesSlot] {
        &self.template.species
    }

    pub(crate) fn stoichiometric_terms(&self) -> &[StoichiometricTerm] {
        &self.template.stoichiometry
    }

    pub(crate) fn flux_slots(&self) -> &[usize] {
        &self.template.flux_slots
    }

    pub(crate) fn columns(&self) -> &[(String, ColumnSource)] {
        &self.template.columns
    }

    /// Resolves the target of a runtime change.
    pub(crate) fn change_target(&self, name: &str) -> Result<ChangeTarget, String> {
        let slot = self.overridable_slot(name)?;

        match self.template.species.iter().find(|s| s.slot == slot) {
            Some(s) => {
                let amount_in = s.amount.then_some(s.compartment);
                if s.dynamic {
                    Ok(ChangeTarget::State {
                        index: slot,
                        amount_in,
                    })
                } else {
                    Ok(ChangeTarget::Constant { slot, amount_in })
                }
            }
            None => Ok(ChangeTarget::Constant {
                slot,
                amount_in: None,
            }),
        }
    }
}

type NodeSpec = (String, String, NodeKind, bool);

/// Parses every expression of the definition in node declaration order: global
/// rules, expression compartments, then per reaction its local rules and flux.
fn parse_expressions(
    definition: &NetworkDefinition,
) -> Result<Vec<(NodeSpec, Expression)>, NetworkError> {
    let mut specs: Vec<(NodeSpec, &str)> = Vec::new();

    for rule in &definition.rules {
        specs.push((
            (format!("/rules/{}/expression", rule.variable), rule.variable.clone(), NodeKind::Rule, false),
            &rule.expression,
        ));
    }
    for compartment in &definition.compartments {
        if let Size::Expression(expression) = &compartment.size {
            specs.push((
                (format!("/compartments/{}/size", compartment.id), compartment.id.clone(), NodeKind::Compartment, false),
                expression,
            ));
        }
    }
    for reaction in &definition.reactions {
        for (k, rule) in reaction.rules.iter().enumerate() {
            specs.push((
                (
                    format!("/reactions/{}/rules/{}", reaction.id, rule.variable),
                    rule.variable.clone(),
                    NodeKind::LocalRule,
                    k > 0,
                ),
                &rule.expression,
            ));
        }
        specs.push((
            (
                format!("/reactions/{}/rate_law", reaction.id),
                reaction.id.clone(),
                NodeKind::Flux,
                !reaction.rules.is_empty(),
            ),
            &reaction.rate_law,
        ));
    }

    specs
        .into_iter()
        .map(|(spec, source)| {
            Expression::parse(source)
                .map(|expression| (spec.clone(), expression))
                .map_err(|source| NetworkError::InvalidExpression {
                    location: spec.0,
                    source,
                })
        })
        .collect()
}

fn node_dependencies(
    i: usize,
    nodes: &[PlanNode],
    chained: &[Option<usize>],
    producers: &HashMap<usize, usize>,
) -> Vec<usize> {
    let mut deps: Vec<usize> = nodes[i]
        .program
        .slots()
        .into_iter()
        .filter_map(|slot| producers.get(&slot).copied())
        .collect();
    if let Some(previous) = chained[i] {
        deps.push(previous);
    }
    deps
}

/// Kahn's algorithm with declaration order as tie-break.
fn topological_order(
    nodes: &[PlanNode],
    chained: &[Option<usize>],
    slot_names: &[String],
) -> Result<Vec<usize>, NetworkError> {
    let producers: HashMap<usize, usize> =
        nodes.iter().enumerate().map(|(i, n)| (n.target, i)).collect();

    let mut indegree = vec![0usize; nodes.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for i in 0..nodes.len() {
        let mut deps = node_dependencies(i, nodes, chained, &producers);
        deps.sort_unstable();
        deps.dedup();
        indegree[i] = deps.len();
        for d in deps {
            dependents[d].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(nodes.len());

    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &d in &dependents[i] {
            indegree[d] -= 1;
            if indegree[d] == 0 {
                ready.insert(d);
            }
        }
    }

    if order.len() < nodes.len() {
        let cycle: Vec<&str> = (0..nodes.len())
            .filter(|&i| indegree[i] > 0)
            .map(|i| slot_names[nodes[i].target].as_str())
            .collect();
        return Err(NetworkError::CyclicDependency(cycle.join(", ")));
    }

    Ok(order)
}

fn output_columns(
    definition: &NetworkDefinition,
    slots: &HashMap<String, usize>,
    species: &[SpeciesSlot],
) -> Vec<(String, ColumnSource)> {
    let mut columns: Vec<(String, ColumnSource)> = Vec::new();

    for s in species.iter().filter(|s| s.dynamic) {
        columns.push((s.id.clone(), ColumnSource::Slot(s.slot)));
    }
    for s in species.iter().filter(|s| !s.dynamic) {
        columns.push((s.id.clone(), ColumnSource::Slot(s.slot)));
    }
    for s in species.iter().filter(|s| s.amount) {
        columns.push((
            format!("[{}]", s.id),
            ColumnSource::Concentration {
                slot: s.slot,
                compartment: s.compartment,
            },
        ));
    }
    for c in &definition.compartments {
        if matches!(c.size, Size::Expression(_)) {
            columns.push((c.id.clone(), ColumnSource::Slot(slots[&c.id])));
        }
    }
    for r in &definition.rules {
        columns.push((r.variable.clone(), ColumnSource::Slot(slots[&r.variable])));
    }
    for reaction in &definition.reactions {
        for r in &reaction.rules {
            columns.push((r.variable.clone(), ColumnSource::Slot(slots[&r.variable])));
        }
    }
    for reaction in &definition.reactions {
        columns.push((reaction.id.clone(), ColumnSource::Slot(slots[&reaction.id])));
    }

    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::definition::*;
    use approx::assert_relative_eq;

    fn reversible_definition() -> NetworkDefinition {
        NetworkDefinitionBuilder::default()
            .id("ab")
            .to_compartments(Compartment::new("c", 2.0, 3))
            .to_compartments(Compartment::new("m", "f * c", 3))
            .to_species(Species::new("A", "c", 1.0))
            .to_species(Species::new("B", "c", 0.0))
            .to_species(Species::new("X", "m", 3.0).boundary())
            .to_parameters(Parameter::new("k1", 1.0))
            .to_parameters(Parameter::new("f", 0.25))
            .to_rules(AssignmentRule::new("total", "A + B"))
            .to_rules(AssignmentRule::new("out", "2 * R1"))
            .to_reactions(
                ReactionBuilder::default()
                    .id("R1")
                    .equation("A <=> B")
                    .unwrap()
                    .to_parameters(Parameter::new("k2", 1.0))
                    .to_rules(AssignmentRule::new("R1_f", "k1 * A"))
                    .to_rules(AssignmentRule::new("R1_b", "k2 * B"))
                    .rate_law("c * (R1_f - R1_b)")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_state_layout() {
        let network = ReactionNetwork::new(reversible_definition()).unwrap();

        assert_eq!(network.dynamic_species(), &["A", "B"]);
        assert_eq!(network.boundary_species(), &["X"]);
        assert_eq!(network.initial_state(), vec![1.0, 0.0]);
        assert_eq!(network.symbol_kind("k2"), Some(SymbolKind::LocalParameter));
        assert_eq!(network.symbol_kind("t"), Some(SymbolKind::Time));
    }

    #[test]
    fn test_snapshot_evaluates_rules_in_dependency_order() {
        let network = ReactionNetwork::new(reversible_definition()).unwrap();
        let bindings = network.initial_bindings(0.0);

        // "out" is declared before the flux it depends on
        let flux = bindings[network.slot("R1").unwrap()];
        assert_relative_eq!(flux, 2.0);
        assert_relative_eq!(bindings[network.slot("out").unwrap()], 4.0);
        assert_relative_eq!(bindings[network.slot("m").unwrap()], 0.5);
        assert_relative_eq!(bindings[network.slot("total").unwrap()], 1.0);
    }

    #[test]
    fn test_derivative_plan_skips_output_rules() {
        let network = ReactionNetwork::new(reversible_definition()).unwrap();
        let mut bindings = network.values.clone();
        network.evaluate(Plan::Derivative, &mut bindings);

        assert_relative_eq!(bindings[network.slot("R1").unwrap()], 2.0);
        assert_eq!(bindings[network.slot("out").unwrap()], 0.0);
        // "m" holds no dynamic species
        assert!(bindings[network.slot("m").unwrap()].is_nan());
    }

    #[test]
    fn test_set_override() {
        let network = ReactionNetwork::new(reversible_definition()).unwrap();

        let modified = network.set_override("A", 5.0).unwrap();
        let modified = modified.set_override("k2", 3.0).unwrap();

        assert_eq!(modified.initial_state(), vec![5.0, 0.0]);
        assert_eq!(modified.value("k2"), Some(3.0));
        assert_eq!(network.value("A"), Some(1.0));
        assert_eq!(network.value("k2"), Some(1.0));
    }

    #[test]
    fn test_invalid_overrides() {
        let network = ReactionNetwork::new(reversible_definition()).unwrap();

        for name in ["total", "R1", "R1_f", "m", "missing", "time"] {
            assert!(
                matches!(
                    network.set_override(name, 1.0),
                    Err(NetworkError::InvalidOverride { .. })
                ),
                "{name} should not be overridable"
            );
        }
        assert!(network.set_override("c", 3.0).is_ok());
    }

    #[test]
    fn test_unresolved_reference() {
        let mut definition = reversible_definition();
        definition.reactions[0].rate_law = "k1 * A - kx * B".to_string();

        let err = ReactionNetwork::new(definition).unwrap_err();
        assert_eq!(
            err,
            NetworkError::UnresolvedReference {
                identifier: "kx".to_string(),
                location: "/reactions/R1/rate_law".to_string(),
            }
        );
    }

    #[test]
    fn test_invalid_expression() {
        let mut definition = reversible_definition();
        definition.rules[0].expression = "A + * B".to_string();

        assert!(matches!(
            ReactionNetwork::new(definition),
            Err(NetworkError::InvalidExpression { .. })
        ));
    }

    #[test]
    fn test_cyclic_rules() {
        let mut definition = reversible_definition();
        definition.rules.push(AssignmentRule::new("u", "v + 1"));
        definition.rules.push(AssignmentRule::new("v", "u * 2"));

        let err = ReactionNetwork::new(definition).unwrap_err();
        assert_eq!(err, NetworkError::CyclicDependency("u, v".to_string()));
    }

    #[test]
    fn test_amount_species_state() {
        let mut definition = reversible_definition();
        definition.species[0].has_only_substance_units = true;

        let network = ReactionNetwork::new(definition).unwrap();
        // amount = concentration * volume of "c"
        assert_eq!(network.initial_state(), vec![2.0, 0.0]);
        assert!(network.columns().iter().any(|(name, _)| name == "[A]"));
    }

    #[test]
    fn test_stoichiometry_matrix() {
        let network = ReactionNetwork::new(reversible_definition()).unwrap();
        let (matrix, species) = network.stoichiometry_matrix();

        assert_eq!(species, vec!["A", "B"]);
        assert_eq!(matrix.shape(), &[2, 1]);
        assert_eq!(matrix[(0, 0)], -1.0);
    }
}
