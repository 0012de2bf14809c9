//! Consistency checks for network definitions.
//!
//! This module validates a [`NetworkDefinition`] before it is compiled:
//! - every identifier used in an expression, stoichiometry entry or modifier list resolves
//! - identifiers are declared only once across the global namespace
//! - rules only assign identifiers that are not otherwise declared
//! - local rules only reference sibling rules declared before them
//! - all expressions parse and only call known functions
//!
//! The main entry point is [`check_consistency`], which runs all checks and returns a
//! [`Report`] with the results.

use std::collections::HashMap;
use std::fmt;

use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::expression::{builtin_constant, Expression, Function};

use super::definition::{NetworkDefinition, Size};
use super::error::NetworkError;

/// Identifiers that resolve to the current simulation time.
pub const TIME_SYMBOLS: [&str; 2] = ["time", "t"];

/// What a declared identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolKind {
    Compartment,
    Species,
    Parameter,
    Rule,
    Reaction,
    LocalParameter,
    LocalRule,
    Time,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolKind::Compartment => "compartment",
            SymbolKind::Species => "species",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Rule => "assignment rule",
            SymbolKind::Reaction => "reaction",
            SymbolKind::LocalParameter => "local parameter",
            SymbolKind::LocalRule => "local rule",
            SymbolKind::Time => "time",
        };
        write!(f, "{name}")
    }
}

/// Runs all checks against a network definition.
///
/// # Arguments
///
/// * `definition` - The network definition to check
///
/// # Returns
///
/// A [`Report`]; the definition can be compiled if `report.is_valid`.
pub fn check_consistency(definition: &NetworkDefinition) -> Report {
    let mut report = Report::new();
    let (symbols, declarations) = collect_declarations(definition);

    check_duplicates(&declarations, &mut report);
    check_species(definition, &symbols, &mut report);
    check_compartments(definition, &symbols, &mut report);
    check_rules(definition, &symbols, &mut report);
    check_reactions(definition, &symbols, &mut report);

    report
}

/// Maps every declared identifier to its kind. On duplicates the first
/// declaration wins.
pub fn declared_symbols(definition: &NetworkDefinition) -> HashMap<String, SymbolKind> {
    collect_declarations(definition).0
}

fn collect_declarations(
    definition: &NetworkDefinition,
) -> (HashMap<String, SymbolKind>, Vec<(String, SymbolKind, String)>) {
    let mut declarations: Vec<(String, SymbolKind, String)> = Vec::new();

    for c in &definition.compartments {
        declarations.push((c.id.clone(), SymbolKind::Compartment, format!("/compartments/{}", c.id)));
    }
    for s in &definition.species {
        declarations.push((s.id.clone(), SymbolKind::Species, format!("/species/{}", s.id)));
    }
    for p in &definition.parameters {
        declarations.push((p.id.clone(), SymbolKind::Parameter, format!("/parameters/{}", p.id)));
    }
    for r in &definition.rules {
        declarations.push((r.variable.clone(), SymbolKind::Rule, format!("/rules/{}", r.variable)));
    }
    for reaction in &definition.reactions {
        let base = format!("/reactions/{}", reaction.id);
        declarations.push((reaction.id.clone(), SymbolKind::Reaction, base.clone()));
        for p in &reaction.parameters {
            declarations.push((p.id.clone(), SymbolKind::LocalParameter, format!("{base}/parameters/{}", p.id)));
        }
        for r in &reaction.rules {
            declarations.push((r.variable.clone(), SymbolKind::LocalRule, format!("{base}/rules/{}", r.variable)));
        }
    }

    let mut symbols: HashMap<String, SymbolKind> = TIME_SYMBOLS
        .iter()
        .map(|t| (t.to_string(), SymbolKind::Time))
        .collect();

    for (id, kind, _) in &declarations {
        symbols.entry(id.clone()).or_insert(*kind);
    }

    (symbols, declarations)
}

fn check_duplicates(declarations: &[(String, SymbolKind, String)], report: &mut Report) {
    let mut first: HashMap<&str, (SymbolKind, &str)> = HashMap::new();

    for (id, kind, location) in declarations {
        if TIME_SYMBOLS.contains(&id.as_str()) {
            report.add_result(ValidationResult::new(
                location.clone(),
                format!("'{id}' is reserved for the simulation time"),
                Severity::Error,
                Some(id.clone()),
                IssueKind::Duplicate,
            ));
            continue;
        }

        match first.get(id.as_str()) {
            None => {
                first.insert(id.as_str(), (*kind, location.as_str()));
            }
            Some((previous, previous_location)) => {
                let is_rule = matches!(kind, SymbolKind::Rule | SymbolKind::LocalRule);
                let (issue, message) = if is_rule
                    && !matches!(previous, SymbolKind::Rule | SymbolKind::LocalRule)
                {
                    (
                        IssueKind::RuleTarget,
                        format!("Rule assigns '{id}', which is already declared as {previous}"),
                    )
                } else {
                    (
                        IssueKind::Duplicate,
                        format!("'{id}' is already declared at {previous_location}"),
                    )
                };
                report.add_result(ValidationResult::new(
                    location.clone(),
                    message,
                    Severity::Error,
                    Some(id.clone()),
                    issue,
                ));
            }
        }
    }
}

fn check_species(
    definition: &NetworkDefinition,
    symbols: &HashMap<String, SymbolKind>,
    report: &mut Report,
) {
    for species in &definition.species {
        let location = format!("/species/{}/compartment", species.id);
        if symbols.get(&species.compartment) != Some(&SymbolKind::Compartment) {
            report.add_result(ValidationResult::new(
                location,
                format!("Compartment '{}' is not declared", species.compartment),
                Severity::Error,
                Some(species.compartment.clone()),
                IssueKind::Unresolved,
            ));
        }

        let participates = definition
            .reactions
            .iter()
            .any(|r| r.stoichiometry.iter().any(|e| e.species == species.id));

        if !species.boundary_condition && !participates {
            report.add_result(ValidationResult::new(
                format!("/species/{}", species.id),
                format!("Species '{}' is not converted by any reaction and stays constant", species.id),
                Severity::Warning,
                Some(species.id.clone()),
                IssueKind::Unused,
            ));
        }
    }
}

fn check_compartments(
    definition: &NetworkDefinition,
    symbols: &HashMap<String, SymbolKind>,
    report: &mut Report,
) {
    for compartment in &definition.compartments {
        if let Size::Expression(expression) = &compartment.size {
            check_expression(
                expression,
                &format!("/compartments/{}/size", compartment.id),
                symbols,
                report,
            );
        }
    }
}

fn check_rules(
    definition: &NetworkDefinition,
    symbols: &HashMap<String, SymbolKind>,
    report: &mut Report,
) {
    for rule in &definition.rules {
        check_expression(
            &rule.expression,
            &format!("/rules/{}/expression", rule.variable),
            symbols,
            report,
        );
    }
}

fn check_reactions(
    definition: &NetworkDefinition,
    symbols: &HashMap<String, SymbolKind>,
    report: &mut Report,
) {
    for reaction in &definition.reactions {
        let base = format!("/reactions/{}", reaction.id);

        if let Some(compartment) = &reaction.compartment {
            if symbols.get(compartment) != Some(&SymbolKind::Compartment) {
                report.add_result(ValidationResult::new(
                    format!("{base}/compartment"),
                    format!("Compartment '{compartment}' is not declared"),
                    Severity::Error,
                    Some(compartment.clone()),
                    IssueKind::Unresolved,
                ));
            }
        }

        if reaction.stoichiometry.is_empty() {
            report.add_result(ValidationResult::new(
                base.clone(),
                format!("Reaction '{}' has no stoichiometry", reaction.id),
                Severity::Warning,
                Some(reaction.id.clone()),
                IssueKind::EmptyStoichiometry,
            ));
        }

        for entry in &reaction.stoichiometry {
            let location = format!("{base}/stoichiometry/{}", entry.species);
            match definition.get_species(&entry.species) {
                None => report.add_result(ValidationResult::new(
                    location,
                    format!("Species '{}' is not declared", entry.species),
                    Severity::Error,
                    Some(entry.species.clone()),
                    IssueKind::Unresolved,
                )),
                Some(species) if species.boundary_condition => {
                    report.add_result(ValidationResult::new(
                        location,
                        format!(
                            "Boundary species '{}' has stoichiometry {}; its derivative is zero",
                            entry.species, entry.coefficient
                        ),
                        Severity::Info,
                        Some(entry.species.clone()),
                        IssueKind::BoundaryStoichiometry,
                    ))
                }
                Some(_) => {}
            }
        }

        for modifier in &reaction.modifiers {
            if symbols.get(modifier) != Some(&SymbolKind::Species) {
                report.add_result(ValidationResult::new(
                    format!("{base}/modifiers/{modifier}"),
                    format!("Modifier '{modifier}' is not a declared species"),
                    Severity::Error,
                    Some(modifier.clone()),
                    IssueKind::Unresolved,
                ));
            }
        }

        for (position, rule) in reaction.rules.iter().enumerate() {
            let location = format!("{base}/rules/{}", rule.variable);
            let Some(expression) = check_expression(&rule.expression, &location, symbols, report)
            else {
                continue;
            };

            let later: Vec<&str> = reaction.rules[position..]
                .iter()
                .map(|r| r.variable.as_str())
                .collect();

            for symbol in expression.symbols() {
                if later.contains(&symbol.as_str()) {
                    report.add_result(ValidationResult::new(
                        location.clone(),
                        format!(
                            "Local rule '{}' references '{symbol}', which is declared at or after it",
                            rule.variable
                        ),
                        Severity::Error,
                        Some(symbol.clone()),
                        IssueKind::DeclarationOrder,
                    ));
                }
            }
        }

        check_expression(&reaction.rate_law, &format!("{base}/rate_law"), symbols, report);
    }
}

/// Parses an expression and checks its symbols and functions. Returns the parsed
/// expression if it could be parsed.
fn check_expression(
    source: &str,
    location: &str,
    symbols: &HashMap<String, SymbolKind>,
    report: &mut Report,
) -> Option<Expression> {
    let expression = match Expression::parse(source) {
        Ok(expression) => expression,
        Err(e) => {
            report.add_result(ValidationResult::new(
                location.to_string(),
                e.to_string(),
                Severity::Error,
                None,
                IssueKind::InvalidExpression,
            ));
            return None;
        }
    };

    for symbol in expression.symbols() {
        if !symbols.contains_key(&symbol) && builtin_constant(&symbol).is_none() {
            report.add_result(ValidationResult::new(
                location.to_string(),
                format!("'{symbol}' is not declared"),
                Severity::Error,
                Some(symbol),
                IssueKind::Unresolved,
            ));
        }
    }

    for function in expression.functions() {
        if Function::from_name(&function).is_none() {
            report.add_result(ValidationResult::new(
                location.to_string(),
                format!("Unknown function '{function}'"),
                Severity::Error,
                Some(function),
                IssueKind::InvalidExpression,
            ));
        }
    }

    Some(expression)
}

/// The `Report` struct stores the results of the consistency checks.
///
/// The definition is considered invalid if any result has Error severity.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Report {
    /// False if any errors were found.
    pub is_valid: bool,
    /// All issues found, in the order the checks ran.
    pub errors: Vec<ValidationResult>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    /// Adds a validation result, marking the report invalid on errors.
    pub fn add_result(&mut self, result: ValidationResult) {
        if result.severity == Severity::Error {
            self.is_valid = false;
        }
        self.errors.push(result);
    }

    /// Results attached to the given identifier.
    pub fn filter_results(&self, identifier: &str) -> Vec<ValidationResult> {
        self.errors
            .iter()
            .filter(|result| result.identifier.as_deref() == Some(identifier))
            .cloned()
            .collect()
    }

    /// Results of the given severity.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &ValidationResult> {
        self.errors.iter().filter(move |r| r.severity == severity)
    }

    /// Converts the first error of the report into a [`NetworkError`].
    pub fn first_error(&self) -> Option<NetworkError> {
        self.with_severity(Severity::Error).next().map(|result| {
            let identifier = result.identifier.clone().unwrap_or_default();
            match result.kind {
                IssueKind::Unresolved => NetworkError::UnresolvedReference {
                    identifier,
                    location: result.location.clone(),
                },
                IssueKind::Duplicate | IssueKind::RuleTarget => {
                    NetworkError::DuplicateIdentifier {
                        identifier,
                        location: result.location.clone(),
                    }
                }
                _ => NetworkError::InvalidDefinition(format!(
                    "{}: {}",
                    result.location, result.message
                )),
            }
        })
    }
}

/// Category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    Unresolved,
    Duplicate,
    RuleTarget,
    DeclarationOrder,
    InvalidExpression,
    Unused,
    EmptyStoichiometry,
    BoundaryStoichiometry,
}

/// A single issue found during checking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Path of the offending element, e.g. `/reactions/GK/rate_law`
    location: String,
    message: String,
    severity: Severity,
    identifier: Option<String>,
    kind: IssueKind,
}

impl ValidationResult {
    pub fn new(
        location: String,
        message: String,
        severity: Severity,
        identifier: Option<String>,
        kind: IssueKind,
    ) -> Self {
        Self {
            location,
            message,
            severity,
            identifier,
            kind,
        }
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn severity(&self) -> &Severity {
        &self.severity
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn kind(&self) -> IssueKind {
        self.kind
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self.severity {
            Severity::Error => self.message.bold().red(),
            Severity::Warning => self.message.bold().yellow(),
            Severity::Info => self.message.bold().green(),
        };

        write!(
            f,
            "[{}] {}:\n\t└── {}",
            self.location.bold(),
            self.severity.colored(),
            message
        )
    }
}

/// Severity levels for validation issues.
///
/// - Error: the definition cannot be compiled
/// - Warning: the definition compiles but likely contains a modeling mistake
/// - Info: noteworthy but harmless
#[derive(Debug, Clone, PartialEq, Eq, Copy, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl Severity {
    fn colored(&self) -> colored::ColoredString {
        match self {
            Severity::Error => "Error".bold().red(),
            Severity::Warning => "Warning".bold().yellow(),
            Severity::Info => "Info".bold().green(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "Error"),
            Severity::Warning => write!(f, "Warning"),
            Severity::Info => write!(f, "Info"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::definition::*;

    fn base_builder() -> NetworkDefinitionBuilder {
        let mut builder = NetworkDefinitionBuilder::default();
        builder
            .id("test")
            .to_compartments(Compartment::new("c", 1.0, 3))
            .to_species(Species::new("A", "c", 1.0))
            .to_species(Species::new("B", "c", 0.0))
            .to_parameters(Parameter::new("k1", 1.0));
        builder
    }

    fn reaction(rate_law: &str) -> Reaction {
        ReactionBuilder::default()
            .id("R1")
            .equation("A => B")
            .unwrap()
            .rate_law(rate_law)
            .build()
            .unwrap()
    }

    #[test]
    fn test_valid_definition() {
        let definition = base_builder().to_reactions(reaction("k1 * A")).build().unwrap();
        let report = check_consistency(&definition);
        assert!(report.is_valid, "{:?}", report.errors);
    }

    #[test]
    fn test_unresolved_reference() {
        let definition = base_builder()
            .to_reactions(reaction("k1 * A * missing"))
            .build()
            .unwrap();
        let report = check_consistency(&definition);

        assert!(!report.is_valid);
        assert_eq!(
            report.first_error(),
            Some(NetworkError::UnresolvedReference {
                identifier: "missing".to_string(),
                location: "/reactions/R1/rate_law".to_string(),
            })
        );
    }

    #[test]
    fn test_unresolved_stoichiometry_species() {
        let r = ReactionBuilder::default()
            .id("R1")
            .equation("A => C")
            .unwrap()
            .rate_law("k1 * A")
            .build()
            .unwrap();
        let definition = base_builder().to_reactions(r).build().unwrap();
        let report = check_consistency(&definition);

        assert_eq!(report.filter_results("C").len(), 1);
        assert!(!report.is_valid);
    }

    #[test]
    fn test_duplicate_identifier() {
        let definition = base_builder()
            .to_parameters(Parameter::new("A", 2.0))
            .to_reactions(reaction("k1 * A"))
            .build()
            .unwrap();
        let report = check_consistency(&definition);

        assert!(matches!(
            report.first_error(),
            Some(NetworkError::DuplicateIdentifier { .. })
        ));
    }

    #[test]
    fn test_rule_assigning_parameter() {
        let definition = base_builder()
            .to_rules(AssignmentRule::new("k1", "2 * A"))
            .build()
            .unwrap();
        let report = check_consistency(&definition);

        let issues = report.filter_results("k1");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind(), IssueKind::RuleTarget);
    }

    #[test]
    fn test_local_rule_declaration_order() {
        let r = ReactionBuilder::default()
            .id("R1")
            .equation("A => B")
            .unwrap()
            .to_rules(AssignmentRule::new("R1_a", "R1_b * 2"))
            .to_rules(AssignmentRule::new("R1_b", "k1"))
            .rate_law("R1_a * A")
            .build()
            .unwrap();
        let definition = base_builder().to_reactions(r).build().unwrap();
        let report = check_consistency(&definition);

        assert!(!report.is_valid);
        assert_eq!(
            report.errors.iter().filter(|e| e.kind() == IssueKind::DeclarationOrder).count(),
            1
        );
    }

    #[test]
    fn test_unknown_function_and_parse_error() {
        let definition = base_builder()
            .to_reactions(reaction("foo(A)"))
            .to_rules(AssignmentRule::new("x", "k1 * (A"))
            .build()
            .unwrap();
        let report = check_consistency(&definition);

        let invalid = report
            .errors
            .iter()
            .filter(|e| e.kind() == IssueKind::InvalidExpression)
            .count();
        assert_eq!(invalid, 2);
    }

    #[test]
    fn test_warnings_do_not_invalidate() {
        let definition = base_builder()
            .to_species(Species::new("lonely", "c", 1.0))
            .to_reactions(reaction("k1 * A * time"))
            .build()
            .unwrap();
        let report = check_consistency(&definition);

        assert!(report.is_valid);
        assert_eq!(report.with_severity(Severity::Warning).count(), 1);
    }

    #[test]
    fn test_reserved_time_symbol() {
        let definition = base_builder()
            .to_parameters(Parameter::new("time", 1.0))
            .build()
            .unwrap();
        assert!(!check_consistency(&definition).is_valid);
    }
}
