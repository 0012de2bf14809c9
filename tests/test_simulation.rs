#[cfg(test)]
mod test_simulation {
    use approx::assert_relative_eq;
    use exsimo::models::liver_glucose;
    use exsimo::prelude::{
        simulate, Compartment, NetworkDefinitionBuilder, Parameter, ReactionBuilder,
        ReactionNetwork, SimulationError, SimulationSetup, SimulationSetupBuilder, SolverMethod,
        Species, Timecourse, TimecourseSim,
    };

    /// Builds `A <=> B` with mass action rate `k1*A - k2*B` in a unit compartment.
    fn reversible(k1: f64, k2: f64, a0: f64, b0: f64) -> ReactionNetwork {
        let definition = NetworkDefinitionBuilder::default()
            .id("reversible")
            .to_compartments(Compartment::new("c", 1.0, 3))
            .to_species(Species::new("A", "c", a0))
            .to_species(Species::new("B", "c", b0))
            .to_parameters(Parameter::new("k1", k1))
            .to_parameters(Parameter::new("k2", k2))
            .to_reactions(
                ReactionBuilder::default()
                    .id("R1")
                    .compartment("c")
                    .equation("A <-> B")
                    .unwrap()
                    .rate_law("k1 * A - k2 * B")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();

        ReactionNetwork::new(definition).unwrap()
    }

    /// Tests the two species reversible reaction against its equilibrium.
    ///
    /// The test:
    /// 1. Starts with A = 1, B = 0 and k1 = k2 = 1
    /// 2. Integrates over [0, 10] with 100 output intervals
    /// 3. Checks that A + B = 1 at every sample and that both approach 0.5
    #[test]
    fn test_reversible_reaction_reaches_equilibrium() {
        // ARRANGE
        let network = reversible(1.0, 1.0, 1.0, 0.0);
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 10.0, 100));

        // ACT
        let result = simulate(&network, &tcsim, &SimulationSetup::default()).unwrap();

        // ASSERT
        assert_eq!(result.len(), 101);
        assert_relative_eq!(result.time[100], 10.0);

        let a = result.get("A").unwrap();
        let b = result.get("B").unwrap();
        for (a, b) in a.iter().zip(b) {
            assert_relative_eq!(a + b, 1.0, epsilon = 1e-9);
        }

        assert_relative_eq!(result.last("A").unwrap(), 0.5, max_relative = 0.01);
        assert_relative_eq!(result.last("B").unwrap(), 0.5, max_relative = 0.01);
        assert!(result.warnings.is_empty());
    }

    /// All three integrators agree on the same trajectory.
    #[test]
    fn test_solver_methods_agree() {
        // ARRANGE
        let network = reversible(1.0, 0.5, 1.0, 0.0);
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 5.0, 10));
        let run = |method: SolverMethod| {
            let setup = SimulationSetupBuilder::default()
                .method(method)
                .rtol(1e-8)
                .atol(1e-10)
                .dt(1e-3)
                .build()
                .unwrap();
            simulate(&network, &tcsim, &setup).unwrap()
        };

        // ACT
        let sdirk = run(SolverMethod::Sdirk);
        let dopri = run(SolverMethod::DormandPrince);
        let rk4 = run(SolverMethod::Rk4);

        // ASSERT
        let reference = sdirk.get("A").unwrap();
        for other in [&dopri, &rk4] {
            for (expected, actual) in reference.iter().zip(other.get("A").unwrap()) {
                assert_relative_eq!(*expected, *actual, epsilon = 1e-5);
            }
        }
    }

    /// An event in the middle of a sampling interval takes effect exactly at its time.
    #[test]
    fn test_event_between_samples() {
        // ARRANGE
        let network = reversible(1.0, 1.0, 1.0, 0.0);
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 2.0, 2).with_event(0.25, "A", 1.0));

        // ACT
        let result = simulate(&network, &tcsim, &SimulationSetup::default()).unwrap();

        // ASSERT
        // before the event A + B = 1, afterwards the total is 1 + B(0.25)
        let b_at_event = 0.5 * (1.0 - (-2.0 * 0.25f64).exp());
        let a = result.get("A").unwrap();
        let b = result.get("B").unwrap();
        assert_relative_eq!(a[0] + b[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(a[1] + b[1], 1.0 + b_at_event, epsilon = 1e-6);
        assert_relative_eq!(a[2] + b[2], 1.0 + b_at_event, epsilon = 1e-6);
    }

    /// A network at its fixed point stays there.
    #[test]
    fn test_fixed_point_is_reproduced() {
        // ARRANGE
        let network = reversible(2.0, 1.0, 1.0 / 3.0, 2.0 / 3.0);
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 1000.0, 10));

        // ACT
        let result = simulate(&network, &tcsim, &SimulationSetup::default()).unwrap();

        // ASSERT
        assert_relative_eq!(result.last("A").unwrap(), 1.0 / 3.0, max_relative = 1e-8);
        assert_relative_eq!(result.last("B").unwrap(), 2.0 / 3.0, max_relative = 1e-8);
    }

    /// A rate law dividing by zero ends the run with the samples taken so far.
    #[test]
    fn test_non_finite_rate_diverges() {
        // ARRANGE
        let definition = NetworkDefinitionBuilder::default()
            .id("singular")
            .to_compartments(Compartment::new("c", 1.0, 3))
            .to_species(Species::new("A", "c", 1.0))
            .to_parameters(Parameter::new("k", 1.0))
            .to_reactions(
                ReactionBuilder::default()
                    .id("R1")
                    .equation("A =>")
                    .unwrap()
                    .rate_law("k / (A - 1)")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let network = ReactionNetwork::new(definition).unwrap();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 1.0, 10));

        // ACT
        let err = simulate(&network, &tcsim, &SimulationSetup::default()).unwrap_err();

        // ASSERT
        assert_eq!(err.kind(), "integration_diverged");
        assert_eq!(err.last_time(), Some(0.0));
        match err {
            SimulationError::IntegrationDiverged {
                state,
                reason,
                partial,
                ..
            } => {
                assert_eq!(state["A"], 1.0);
                assert!(reason.contains("Non-finite"), "{reason}");
                assert_eq!(partial.time, vec![0.0]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    /// An amount species integrates `dA/dt = -v` while the concentration species it feeds
    /// integrates `dB/dt = v / V`; a timed change on the amount species is a concentration.
    ///
    /// The test:
    /// 1. Holds A as an amount (1 mM in V = 2, so 2 units) decaying with `v = k * A`
    /// 2. Resets A to 1 mM at t = 1
    /// 3. Checks the amount, the `[A]` column and the balance `A + B * V`
    #[test]
    fn test_amount_species() {
        // ARRANGE
        let definition = NetworkDefinitionBuilder::default()
            .id("amount")
            .to_compartments(Compartment::new("c", 2.0, 3))
            .to_species(Species {
                has_only_substance_units: true,
                ..Species::new("A", "c", 1.0)
            })
            .to_species(Species::new("B", "c", 0.0))
            .to_parameters(Parameter::new("k", 1.0))
            .to_reactions(
                ReactionBuilder::default()
                    .id("R1")
                    .equation("A => B")
                    .unwrap()
                    .rate_law("k * A")
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let network = ReactionNetwork::new(definition).unwrap();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 2.0, 2).with_event(1.0, "A", 1.0));

        // ACT
        let result = simulate(&network, &tcsim, &SimulationSetup::default()).unwrap();

        // ASSERT
        let decayed = 2.0 * (-1.0f64).exp();
        let a = result.get("A").unwrap();
        let a_conc = result.get("[A]").unwrap();
        let b = result.get("B").unwrap();

        assert_relative_eq!(a[0], 2.0);
        assert_relative_eq!(a[1], 2.0, epsilon = 1e-12);
        assert_relative_eq!(a[2], decayed, max_relative = 1e-4);
        for (amount, concentration) in a.iter().zip(a_conc) {
            assert_relative_eq!(*concentration, amount / 2.0, epsilon = 1e-12);
        }

        let produced = (2.0 - decayed) / 2.0;
        assert_relative_eq!(b[1], produced, max_relative = 1e-4);
        assert_relative_eq!(b[2], 2.0 * produced, max_relative = 1e-4);
        assert_relative_eq!(a[2] + 2.0 * b[2], 2.0 + 2.0 * b[1], max_relative = 1e-6);
    }

    /// Nucleotide pools without boundary fluxes are conserved in the liver network.
    #[test]
    fn test_liver_conserved_pools() {
        // ARRANGE
        let network = liver_glucose::network().unwrap();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 120.0, 120).with_change("glyglc", 350.0));

        // ACT
        let result = simulate(&network, &tcsim, &SimulationSetup::default()).unwrap();

        // ASSERT
        for (pool, members) in liver_glucose::CONSERVED_POOLS {
            let totals: Vec<f64> = (0..result.len())
                .map(|i| members.iter().map(|m| result.get(m).unwrap()[i]).sum())
                .collect();
            let first = totals[0];
            for total in &totals {
                assert!(
                    ((total - first) / first).abs() < 1e-6,
                    "{pool} drifted from {first} to {total}"
                );
            }
            assert_relative_eq!(result.last(pool).unwrap(), first, max_relative = 1e-6);
        }
    }

    /// Dynamic species of the liver network stay non-negative.
    #[test]
    fn test_liver_non_negative() {
        // ARRANGE
        let network = liver_glucose::network().unwrap();
        let tcsim = TimecourseSim::from(Timecourse::new(0.0, 120.0, 120));

        // ACT
        let result = simulate(&network, &tcsim, &SimulationSetup::default()).unwrap();

        // ASSERT
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
        for species in network.dynamic_species() {
            let min = result
                .get(species)
                .unwrap()
                .iter()
                .cloned()
                .fold(f64::INFINITY, f64::min);
            assert!(min >= -1e-9, "{species} reached {min}");
        }
    }

    /// Restarting from the end of a long run leaves the state unchanged.
    #[test]
    fn test_liver_steady_state_restart() {
        // ARRANGE
        let network = liver_glucose::const_glycogen_network().unwrap();
        let relaxed = simulate(
            &network,
            &TimecourseSim::from(Timecourse::new(0.0, 2000.0, 10)),
            &SimulationSetup::default(),
        )
        .unwrap();
        let restart = network
            .dynamic_species()
            .iter()
            .fold(Timecourse::new(0.0, 100.0, 10), |tc, species| {
                tc.with_change(species.as_str(), relaxed.last(species).unwrap())
            });

        // ACT
        let result = simulate(&network, &restart.into(), &SimulationSetup::default()).unwrap();

        // ASSERT
        for species in network.dynamic_species() {
            assert_relative_eq!(
                result.last(species).unwrap(),
                relaxed.last(species).unwrap(),
                epsilon = 1e-6,
                max_relative = 1e-2
            );
        }
    }
}
