//! Reaction equation notation
//!
//! Reactions can be declared with a compact equation string instead of an explicit
//! stoichiometry list:
//!
//! ```text
//! glc + atp => glc6p + adp + h [glc1p, fru6p]
//! pp + h2o => h + 2 phos
//! => oaa_mito
//! glc6p <-> fru6p
//! ```
//!
//! Reactants are left of the arrow, products right of it, optional modifiers are
//! listed in trailing brackets. `=>` and `->` mark irreversible reactions, `<=>` and
//! `<->` reversible ones. Either side may be empty.

use std::collections::BTreeMap;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use super::definition::StoichiometryEntry;
use super::error::NetworkError;

lazy_static! {
    static ref EQUATION_PATTERN: Regex =
        Regex::new(r"^(?P<lhs>[^<=\-\[]*)(?P<arrow><=>|<->|=>|->)(?P<rhs>[^\[]*)(?:\[(?P<mods>[^\]]*)\])?\s*$")
            .expect("valid equation regex");
    static ref TERM_PATTERN: Regex =
        Regex::new(r"^(?:(?P<coef>\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)\s+)?(?P<id>[A-Za-z_][A-Za-z0-9_]*)$")
            .expect("valid term regex");
}

/// A parsed reaction equation.
#[derive(Debug, Clone, PartialEq)]
pub struct ReactionEquation {
    pub reactants: Vec<(String, f64)>,
    pub products: Vec<(String, f64)>,
    pub modifiers: Vec<String>,
    pub reversible: bool,
}

impl ReactionEquation {
    /// Parses an equation string.
    ///
    /// # Arguments
    ///
    /// * `equation` - Equation in `reactants => products [modifiers]` notation
    ///
    /// # Returns
    ///
    /// The parsed equation, or [`NetworkError::InvalidEquation`] if the string is
    /// malformed.
    pub fn parse(equation: &str) -> Result<Self, NetworkError> {
        let invalid = |message: &str| NetworkError::InvalidEquation {
            equation: equation.to_string(),
            message: message.to_string(),
        };

        let captures = EQUATION_PATTERN
            .captures(equation.trim())
            .ok_or_else(|| invalid("expected '<reactants> => <products> [modifiers]'"))?;

        let reversible = matches!(&captures["arrow"], "<=>" | "<->");
        let reactants = parse_side(&captures["lhs"]).map_err(|m| invalid(&m))?;
        let products = parse_side(&captures["rhs"]).map_err(|m| invalid(&m))?;

        let modifiers = match captures.name("mods") {
            Some(mods) => mods
                .as_str()
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(|m| {
                    if TERM_PATTERN.is_match(m) && !m.contains(char::is_whitespace) {
                        Ok(m.to_string())
                    } else {
                        Err(invalid(&format!("invalid modifier '{m}'")))
                    }
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };

        if reactants.is_empty() && products.is_empty() {
            return Err(invalid("equation has neither reactants nor products"));
        }

        Ok(Self {
            reactants,
            products,
            modifiers,
            reversible,
        })
    }

    /// Net signed stoichiometry: reactants negative, products positive.
    ///
    /// Species appearing on both sides are merged; entries with zero net
    /// coefficient are dropped. Order follows first appearance.
    pub fn stoichiometry(&self) -> Vec<StoichiometryEntry> {
        let mut order: Vec<String> = Vec::new();
        let mut net: BTreeMap<String, f64> = BTreeMap::new();

        let signed = self
            .reactants
            .iter()
            .map(|(s, c)| (s, -c))
            .chain(self.products.iter().map(|(s, c)| (s, *c)));

        for (species, coefficient) in signed {
            if !net.contains_key(species) {
                order.push(species.clone());
            }
            *net.entry(species.clone()).or_insert(0.0) += coefficient;
        }

        order
            .into_iter()
            .filter_map(|species| {
                let coefficient = net.get(&species).copied().unwrap_or(0.0);
                (coefficient != 0.0).then(|| StoichiometryEntry::new(species, coefficient))
            })
            .collect()
    }
}

impl FromStr for ReactionEquation {
    type Err = NetworkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_side(side: &str) -> Result<Vec<(String, f64)>, String> {
    let side = side.trim();
    if side.is_empty() {
        return Ok(Vec::new());
    }

    side.split('+')
        .map(str::trim)
        .map(|term| {
            let captures = TERM_PATTERN
                .captures(term)
                .ok_or_else(|| format!("invalid term '{term}'"))?;
            let coefficient = match captures.name("coef") {
                Some(c) => c
                    .as_str()
                    .parse::<f64>()
                    .map_err(|e| format!("invalid coefficient in '{term}': {e}"))?,
                None => 1.0,
            };
            if coefficient <= 0.0 {
                return Err(format!("coefficient must be positive in '{term}'"));
            }
            Ok((captures["id"].to_string(), coefficient))
        })
        .collect()
}
