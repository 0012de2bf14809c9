#[cfg(test)]
mod test_scan {
    use approx::assert_relative_eq;
    use exsimo::io::{load_collection, save_collection};
    use exsimo::models::liver_glucose;
    use exsimo::prelude::{
        Compartment, NetworkDefinitionBuilder, Parameter, PointOutcome, ReactionBuilder,
        ReactionNetwork, ScanAxis, ScanEngine, ScanError, ScanGrid, SimulationSetup, Species,
        Timecourse, TimecourseSim,
    };
    use pretty_assertions::assert_eq;

    /// `A => B` with rate `k * A / (kcrit - k)`, singular for `k == kcrit`.
    fn decay() -> ReactionNetwork {
        let definition = NetworkDefinitionBuilder::default()
            .id("decay")
            .to_compartments(Compartment::new("c", 1.0, 3))
            .to_species(Species::new("A", "c", 1.0))
            .to_species(Species::new("B", "c", 0.0))
            .to_parameters(Parameter::new("k", 1.0))
            .to_parameters(Parameter::new("kcrit", 3.0))
            .to_reactions(
                ReactionBuilder::default()
                    .id("R1")
                    .equation("A => B")
                    .unwrap()
                    .rate_law("k * A / (kcrit - k)")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        ReactionNetwork::new(definition).unwrap()
    }

    /// Every grid point runs with its own overrides and lands at its own coordinate.
    #[test]
    fn test_scan_shape_and_coordinates() {
        // ARRANGE
        let network = decay();
        let grid = ScanGrid::new(vec![
            ScanAxis::new("k", vec![0.5, 1.0, 2.0]),
            "A=1:4:4".parse().unwrap(),
        ])
        .unwrap();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 1.0, 4));

        // ACT
        let collection = ScanEngine::default().run(&network, &tcsim, &SimulationSetup::default(), &grid);

        // ASSERT
        assert_eq!(collection.shape(), vec![3, 4]);
        assert_eq!(collection.len(), 12);
        assert!(collection.is_complete());

        let a_end = collection.last_values("A").unwrap();
        assert_eq!(a_end.shape(), &[3, 4]);
        for (i, k) in [0.5, 1.0, 2.0].iter().enumerate() {
            for (j, a0) in [1.0, 2.0, 3.0, 4.0].iter().enumerate() {
                let rate = k / (3.0 - k);
                let expected = a0 * f64::exp(-rate);
                assert_relative_eq!(a_end[[i, j]], expected, max_relative = 1e-4);
                assert_eq!(grid.flat_index(&[i, j]), Some(i * 4 + j));
            }
        }
    }

    /// Flat indices and coordinates map onto each other for every cell.
    #[test]
    fn test_coordinate_bijection() {
        // ARRANGE
        let grid = ScanGrid::new(vec![
            ScanAxis::linspace("a", 0.0, 1.0, 2),
            ScanAxis::linspace("b", 0.0, 1.0, 3),
            ScanAxis::linspace("c", 0.0, 1.0, 5),
        ])
        .unwrap();

        // ACT
        let coordinates: Vec<Vec<usize>> =
            (0..grid.len()).map(|flat| grid.coordinate(flat).unwrap()).collect();

        // ASSERT
        assert_eq!(grid.len(), 30);
        assert_eq!(coordinates[0], vec![0, 0, 0]);
        assert_eq!(coordinates[29], vec![1, 2, 4]);
        for (flat, coordinate) in coordinates.iter().enumerate() {
            assert_eq!(grid.flat_index(coordinate), Some(flat));
        }
        assert_eq!(grid.coordinate(30), None);
    }

    /// A failing grid point is recorded and the remaining points still run.
    #[test]
    fn test_partial_failure() {
        // ARRANGE
        let network = decay();
        let grid = ScanGrid::new(vec![ScanAxis::new("k", vec![1.0, 3.0, 2.0])]).unwrap();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 1.0, 2));

        // ACT
        let collection = ScanEngine::builder()
            .parallel(false)
            .build()
            .run(&network, &tcsim, &SimulationSetup::default(), &grid);

        // ASSERT
        assert_eq!(collection.n_completed(), 2);
        let failures = collection.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, vec![1]);
        assert_eq!(failures[0].1.kind, "integration_diverged");

        let b_end = collection.last_values("B").unwrap();
        assert!(b_end[[0]] > 0.0);
        assert!(b_end[[1]].is_nan());
        assert!(b_end[[2]] > b_end[[0]]);
    }

    /// Overriding a computed quantity is rejected before any simulation runs.
    #[test]
    fn test_grid_check_rejects_computed_values() {
        // ARRANGE
        let network = decay();
        let grid = ScanGrid::new(vec![ScanAxis::new("R1", vec![1.0])]).unwrap();

        // ACT
        let err = grid.check(&network).unwrap_err();

        // ASSERT
        assert!(matches!(err, ScanError::Override { ref name, .. } if name == "R1"));
    }

    /// Glucagon falls monotonically with blood glucose.
    #[test]
    fn test_glucagon_dose_response() {
        // ARRANGE
        let network = liver_glucose::network().unwrap();
        let grid = ScanGrid::new(vec![ScanAxis::linspace("glc_ext", 2.0, 20.0, 100)]).unwrap();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 1.0, 1));

        // ACT
        let collection = ScanEngine::default().run(&network, &tcsim, &SimulationSetup::default(), &grid);

        // ASSERT
        let glu = collection.last_values("glu").unwrap();
        let ins = collection.last_values("ins").unwrap();
        assert_eq!(glu.shape(), &[100]);
        for i in 1..100 {
            assert!(glu[[i]] < glu[[i - 1]], "glu rises at index {i}");
            assert!(ins[[i]] > ins[[i - 1]], "ins falls at index {i}");
        }
    }

    /// Collections survive a JSON round trip, including failed points whose partial
    /// timecourse holds non-finite fluxes.
    #[test]
    fn test_collection_json_round_trip() {
        // ARRANGE
        let network = decay();
        let grid = ScanGrid::new(vec![ScanAxis::new("k", vec![0.5, 1.0, 3.0])]).unwrap();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 1.0, 2));
        let collection = ScanEngine::default().run(&network, &tcsim, &SimulationSetup::default(), &grid);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");

        // ACT
        save_collection(&path, &collection).unwrap();
        let loaded = load_collection(&path).unwrap();

        // ASSERT
        assert!(matches!(loaded.get(&[1]), Some(PointOutcome::Completed(_))));
        assert_eq!(loaded.grid(), collection.grid());
        let expected = collection.last_values("A").unwrap();
        let actual = loaded.last_values("A").unwrap();
        for (e, a) in expected.iter().take(2).zip(actual.iter()) {
            assert_relative_eq!(*e, *a, max_relative = 1e-12);
        }
        assert!(actual[[2]].is_nan());

        let failures = loaded.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, vec![2]);
        assert_eq!(failures[0].1.kind, "integration_diverged");
        let partial = failures[0].1.partial.as_ref().unwrap();
        assert_eq!(partial.get("A"), Some(&[1.0][..]));
        assert_eq!(partial.get("R1"), Some(&[f64::INFINITY][..]));
    }
}
