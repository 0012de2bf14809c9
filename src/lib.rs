//! Exsimo Rust Library
//!
//! Reaction-network simulation and scan engine for the hepatic glucose model.
//! The library provides functionality for:
//! - Declaring reaction networks with compartments, species, parameters and rules
//! - Checking networks for unresolved references and cyclic rules
//! - Simulating chained timecourses with parameter changes and timed events
//! - Scanning simulations over N-dimensional parameter grids
//! - Running the packaged liver glucose experiments
//! - Reading and writing definitions and results as JSON

#![warn(unused_imports)]

/// Commonly used types and functionality re-exported for convenience
pub mod prelude {
    pub use crate::io::*;
    pub use crate::network::definition::*;
    pub use crate::network::error::NetworkError;
    pub use crate::network::model::ReactionNetwork;

    pub use crate::simulation::error::SimulationError;
    pub use crate::simulation::result::*;
    pub use crate::simulation::runner::simulate;
    pub use crate::simulation::setup::*;
    pub use crate::simulation::timecourse::*;

    pub use crate::scan::engine::*;
    pub use crate::scan::error::ScanError;
    pub use crate::scan::grid::*;
    pub use crate::scan::results::*;

    pub use crate::experiments::*;
}

/// Compiled math expressions
pub mod expression;

/// Reaction network declaration and compilation
pub mod network {
    /// Consistency checks over a network definition
    pub mod consistency;
    /// Serializable network definition
    pub mod definition;
    /// Reaction equation parsing
    pub mod equation;
    /// Error types for network construction
    pub mod error;
    /// Compiled, immutable network with overridable values
    pub mod model;
}

/// Deterministic timecourse simulation
pub mod simulation {
    /// Error types for simulation failures
    pub mod error;
    /// Simulation result data structures
    pub mod result;
    /// Timecourse execution
    pub mod runner;
    /// Simulation setup and configuration
    pub mod setup;
    /// ODE integrators
    pub mod solver;
    /// Stoichiometry derivation
    pub mod stoich;
    /// Right-hand side of the ODE system
    pub mod system;
    /// Timecourse segments, changes and events
    pub mod timecourse;
}

/// Parameter scans over N-dimensional grids
pub mod scan {
    pub mod engine;
    pub mod error;
    pub mod grid;
    pub mod results;
}

/// Packaged reaction networks
pub mod models {
    pub mod liver_glucose;
}

/// Packaged simulation experiments
pub mod experiments;

/// Table display of definitions and results
pub mod info;

/// IO functionality
pub mod io;
