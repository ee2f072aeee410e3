//! Identifiers for the tuned algorithms and benchmark objective functions.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::TuneError;

/// A black-box optimization algorithm implemented by the external worker.
///
/// The worker identifier (`id`) is the positional command-line token the
/// worker's own parser understands; the short label (`label`) is the display
/// name the worker writes into the `Name` column of its trajectory logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    MonteCarlo,
    GridSearch,
    HillClimbing,
    HillClimbingAdSs,
    BitSwitchHillClimbing,
    SimulatedAnnealing,
    BitSwitchHillClimbingVns,
    EvolutionStrategy,
    BiologicalEvolution,
    ParticleSwarmOptimization,
    DifferenceEvolution,
}

impl Algorithm {
    pub const ALL: [Algorithm; 11] = [
        Algorithm::MonteCarlo,
        Algorithm::GridSearch,
        Algorithm::HillClimbing,
        Algorithm::HillClimbingAdSs,
        Algorithm::BitSwitchHillClimbing,
        Algorithm::SimulatedAnnealing,
        Algorithm::BitSwitchHillClimbingVns,
        Algorithm::EvolutionStrategy,
        Algorithm::BiologicalEvolution,
        Algorithm::ParticleSwarmOptimization,
        Algorithm::DifferenceEvolution,
    ];

    /// Worker command-line identifier (first positional argument).
    pub fn id(&self) -> &'static str {
        match self {
            Algorithm::MonteCarlo => "MONTE_CARLO",
            Algorithm::GridSearch => "GRID_SEARCH",
            Algorithm::HillClimbing => "HILL_CLIMBING",
            Algorithm::HillClimbingAdSs => "HILL_CLIMBING_AD_SS",
            Algorithm::BitSwitchHillClimbing => "BIT_SWITCH_HILL_CLIMBING",
            Algorithm::SimulatedAnnealing => "SIMULATED_ANNEALING",
            Algorithm::BitSwitchHillClimbingVns => "BIT_SWITCH_HILL_CLIMBING_VNS",
            Algorithm::EvolutionStrategy => "EVOLUTION_STRATEGY",
            Algorithm::BiologicalEvolution => "BIOLOGICAL_EVOLUTION",
            Algorithm::ParticleSwarmOptimization => "PARTICLE_SWARM_OPTIMIZATION",
            Algorithm::DifferenceEvolution => "DIFFERENCE_EVOLUTION",
        }
    }

    /// Short display label, matching the `Name` column of trajectory logs.
    pub fn label(&self) -> &'static str {
        match self {
            Algorithm::MonteCarlo => "MC",
            Algorithm::GridSearch => "GS",
            Algorithm::HillClimbing => "HC",
            Algorithm::HillClimbingAdSs => "HC + AdSS",
            Algorithm::BitSwitchHillClimbing => "BSHC",
            Algorithm::SimulatedAnnealing => "SA",
            Algorithm::BitSwitchHillClimbingVns => "BSHC + VNS",
            Algorithm::EvolutionStrategy => "ES",
            Algorithm::BiologicalEvolution => "BE",
            Algorithm::ParticleSwarmOptimization => "PSO",
            Algorithm::DifferenceEvolution => "DE",
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = TuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Algorithm::ALL
            .iter()
            .find(|a| a.id() == upper)
            .copied()
            .ok_or_else(|| TuneError::UnknownAlgorithm(s.to_string()))
    }
}

/// A benchmark objective function the worker optimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    Rastrigin,
    Rosenbrock,
}

impl Function {
    pub const ALL: [Function; 2] = [Function::Rastrigin, Function::Rosenbrock];

    /// Worker command-line identifier (second positional argument).
    pub fn id(&self) -> &'static str {
        match self {
            Function::Rastrigin => "RASTRIGIN",
            Function::Rosenbrock => "ROSENBROCK",
        }
    }

    /// Number of optimization steps the worker runs per iteration; also the
    /// truncation bound when summarizing trajectory logs.
    pub fn step_budget(&self) -> u32 {
        match self {
            Function::Rastrigin => 1000,
            Function::Rosenbrock => 600,
        }
    }

    /// Characteristic radius of the function's search domain. Step-size
    /// search bounds scale with this (one third of the radius).
    pub fn domain_radius(&self) -> f64 {
        match self {
            Function::Rastrigin => 5.12,
            Function::Rosenbrock => 2.048,
        }
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Function {
    type Err = TuneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        Function::ALL
            .iter()
            .find(|f| f.id() == upper)
            .copied()
            .ok_or_else(|| TuneError::UnknownFunction(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn algorithm_round_trips_through_id() {
        for algorithm in Algorithm::ALL {
            let parsed: Algorithm = algorithm.id().parse().unwrap();
            assert_eq!(parsed, algorithm);
        }
    }

    #[test]
    fn algorithm_parse_is_case_insensitive() {
        let parsed: Algorithm = "hill_climbing".parse().unwrap();
        assert_eq!(parsed, Algorithm::HillClimbing);
    }

    #[test]
    fn unknown_algorithm_is_an_error() {
        let err = "GRADIENT_DESCENT".parse::<Algorithm>().unwrap_err();
        assert!(err.to_string().contains("GRADIENT_DESCENT"));
    }

    #[test]
    fn function_budgets_and_radii() {
        assert_eq!(Function::Rastrigin.step_budget(), 1000);
        assert_eq!(Function::Rosenbrock.step_budget(), 600);
        assert_eq!(Function::Rastrigin.domain_radius(), 5.12);
        assert_eq!(Function::Rosenbrock.domain_radius(), 2.048);
    }

    #[test]
    fn function_parse() {
        assert_eq!("rastrigin".parse::<Function>().unwrap(), Function::Rastrigin);
        assert!("SPHERE".parse::<Function>().is_err());
    }
}
