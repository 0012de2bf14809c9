use ndarray::Array2;
use std::collections::{HashMap, HashSet};

use crate::network::definition::Reaction;

use super::error::SimulationError;

/// One nonzero entry of the stoichiometry matrix restricted to dynamic species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoichiometricTerm {
    /// Index into the state vector.
    pub state: usize,
    /// Index of the reaction.
    pub reaction: usize,
    pub coefficient: f64,
}

/// Derives the stoichiometry matrix from a list of reactions.
///
/// The stoichiometry matrix represents the relationship between reactions and species,
/// where each row corresponds to a species and each column corresponds to a reaction.
/// Negative values represent reactants (consumed in the reaction) and positive values
/// represent products (produced by the reaction). The absolute values represent the
/// stoichiometric coefficients. A species listed more than once in the same reaction
/// has its coefficients summed.
///
/// # Arguments
///
/// * `reactions` - The reactions to derive the stoichiometry matrix from
///
/// # Returns
///
/// * `Result<(Array2<f64>, Vec<String>), SimulationError>` - The stoichiometry matrix and
///   the sorted species ids labelling its rows
pub fn derive_stoichiometry_matrix(
    reactions: &[Reaction],
) -> Result<(Array2<f64>, Vec<String>), SimulationError> {
    let n_reactions = reactions.len();

    if n_reactions == 0 {
        return Err(SimulationError::NoReactions);
    }

    let mut species_set = HashSet::with_capacity(n_reactions * 4);
    for reaction in reactions {
        species_set.extend(reaction.stoichiometry.iter().map(|e| e.species.clone()));
    }

    // Sorted for consistent indexing
    let mut reaction_species: Vec<String> = species_set.into_iter().collect();
    reaction_species.sort_unstable();

    let species_indices: HashMap<&String, usize> = reaction_species
        .iter()
        .enumerate()
        .map(|(i, s)| (s, i))
        .collect();

    let mut stoichiometry_matrix = Array2::zeros((reaction_species.len(), n_reactions));

    for (j, reaction) in reactions.iter().enumerate() {
        for entry in &reaction.stoichiometry {
            if let Some(&i) = species_indices.get(&entry.species) {
                stoichiometry_matrix[(i, j)] += entry.coefficient;
            }
        }
    }

    Ok((stoichiometry_matrix, reaction_species))
}

/// Collects the nonzero coefficients acting on dynamic species.
///
/// Species missing from `state_index` (boundary species) are skipped: their
/// derivative is zero regardless of stoichiometry.
pub fn sparse_stoichiometry(
    reactions: &[Reaction],
    state_index: &HashMap<String, usize>,
) -> Vec<StoichiometricTerm> {
    let mut terms: Vec<StoichiometricTerm> = Vec::new();

    for (j, reaction) in reactions.iter().enumerate() {
        for entry in &reaction.stoichiometry {
            let Some(&state) = state_index.get(&entry.species) else {
                continue;
            };

            match terms
                .iter_mut()
                .find(|t| t.state == state && t.reaction == j)
            {
                Some(term) => term.coefficient += entry.coefficient,
                None => terms.push(StoichiometricTerm {
                    state,
                    reaction: j,
                    coefficient: entry.coefficient,
                }),
            }
        }
    }

    terms.retain(|t| t.coefficient != 0.0);
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::definition::{ReactionBuilder, StoichiometryEntry};
    use ndarray::arr2;

    fn reaction(id: &str, equation: &str) -> Reaction {
        ReactionBuilder::default()
            .id(id)
            .equation(equation)
            .unwrap()
            .rate_law("1.0")
            .build()
            .unwrap()
    }

    /// A + B -> C
    /// C -> D + E
    fn create_test_reactions() -> Vec<Reaction> {
        vec![reaction("R1", "A + B => C"), reaction("R2", "C => D + E")]
    }

    #[test]
    fn test_derive_stoichiometry_matrix() {
        let reactions = create_test_reactions();
        let (matrix, species) = derive_stoichiometry_matrix(&reactions).unwrap();

        assert_eq!(species, vec!["A", "B", "C", "D", "E"]);
        let expected = arr2(&[
            [-1.0, 0.0],
            [-1.0, 0.0],
            [1.0, -1.0],
            [0.0, 1.0],
            [0.0, 1.0],
        ]);
        assert_eq!(matrix, expected);
    }

    #[test]
    fn test_with_non_unity_stoichiometry() {
        let reactions = vec![reaction("PPASE", "pp + h2o => h + 2 phos")];
        let (matrix, species) = derive_stoichiometry_matrix(&reactions).unwrap();

        assert_eq!(species, vec!["h", "h2o", "phos", "pp"]);
        assert_eq!(matrix, arr2(&[[1.0], [-1.0], [2.0], [-1.0]]));
    }

    #[test]
    fn test_empty_reactions() {
        let result = derive_stoichiometry_matrix(&[]);
        assert!(matches!(result, Err(SimulationError::NoReactions)));
    }

    #[test]
    fn test_repeated_entries_are_summed() {
        let mut r = reaction("R1", "A => B");
        r.stoichiometry.push(StoichiometryEntry::new("B", 1.0));
        let (matrix, _) = derive_stoichiometry_matrix(&[r]).unwrap();

        assert_eq!(matrix, arr2(&[[-1.0], [2.0]]));
    }

    #[test]
    fn test_sparse_stoichiometry_skips_boundary_species() {
        let reactions = create_test_reactions();
        // D and E are boundary species
        let state_index: HashMap<String, usize> = [("A", 0), ("B", 1), ("C", 2)]
            .into_iter()
            .map(|(s, i)| (s.to_string(), i))
            .collect();

        let terms = sparse_stoichiometry(&reactions, &state_index);

        assert_eq!(terms.len(), 4);
        assert!(terms.iter().all(|t| t.state <= 2));
        let c_terms: Vec<f64> = terms
            .iter()
            .filter(|t| t.state == 2)
            .map(|t| t.coefficient)
            .collect();
        assert_eq!(c_terms, vec![1.0, -1.0]);
    }
}
