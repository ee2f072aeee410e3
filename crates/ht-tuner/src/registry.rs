//! Static registry mapping each algorithm to its hyperparameter space.
//!
//! Bounds that depend on the objective function (step sizes scaled to a
//! third of the domain radius, look-ahead counts capped by the step budget)
//! are derived here per function, not hard-coded per entry.

use ht_types::{Algorithm, Function};

use crate::space::HyperparameterSpace;

/// A search space plus an optional evaluation-budget override for
/// algorithms whose space is small enough that fewer trials suffice.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceSpec {
    pub space: HyperparameterSpace,
    pub max_evaluations: Option<usize>,
}

impl SpaceSpec {
    fn plain(space: HyperparameterSpace) -> Self {
        Self {
            space,
            max_evaluations: None,
        }
    }
}

/// Look up the search space for `algorithm` on `function`.
///
/// Returns `None` for algorithms with no tunable hyperparameters; the
/// caller treats that as a configuration error before any trial runs.
pub fn search_space(algorithm: Algorithm, function: Function) -> Option<SpaceSpec> {
    let builder: fn(Function) -> SpaceSpec = match algorithm {
        Algorithm::HillClimbing => hill_climbing,
        Algorithm::HillClimbingAdSs => hill_climbing_adss,
        Algorithm::BitSwitchHillClimbing => bit_switch_hill_climbing,
        Algorithm::BitSwitchHillClimbingVns => bit_switch_hill_climbing_vns,
        Algorithm::EvolutionStrategy => evolution_strategy,
        Algorithm::BiologicalEvolution => biological_evolution,
        Algorithm::ParticleSwarmOptimization => particle_swarm_optimization,
        Algorithm::DifferenceEvolution => difference_evolution,
        Algorithm::MonteCarlo | Algorithm::GridSearch | Algorithm::SimulatedAnnealing => {
            return None
        }
    };
    Some(builder(function))
}

/// Upper bound for continuous step-size flags: one third of the function's
/// domain radius.
fn step_bound(function: Function) -> f64 {
    function.domain_radius() / 3.0
}

fn hill_climbing(function: Function) -> SpaceSpec {
    SpaceSpec::plain(
        HyperparameterSpace::new()
            .add_uniform_int("--failures-to-reset", 1, 50)
            .add_uniform("--step", 0.0, step_bound(function))
            .add_switch("--reset-resets-failures-counter"),
    )
}

fn hill_climbing_adss(_function: Function) -> SpaceSpec {
    // Single small integer dimension; 50 evaluations cover it well.
    SpaceSpec {
        space: HyperparameterSpace::new().add_uniform_int("--number-of-particles", 5, 40),
        max_evaluations: Some(50),
    }
}

fn bit_switch_hill_climbing(_function: Function) -> SpaceSpec {
    SpaceSpec::plain(
        HyperparameterSpace::new()
            .add_uniform_int("--failures-to-reset", 1, 50)
            .add_uniform_int("--step", 1, 8)
            .add_switch("--reset-resets-failures-counter")
            .add_uniform_int("--no-of-bits-for-grid-mapping-per-dim", 1, 32),
    )
}

fn bit_switch_hill_climbing_vns(function: Function) -> SpaceSpec {
    SpaceSpec::plain(
        HyperparameterSpace::new()
            .add_uniform_int("--no-of-bits-for-grid-mapping-per-dim", 1, 32)
            .add_quantized("--neighbour-looks", 50.0, function.step_budget() as f64, 50.0),
    )
}

fn evolution_strategy(function: Function) -> SpaceSpec {
    SpaceSpec::plain(
        HyperparameterSpace::new()
            .add_quantized(
                "--improvements-loop-iteration",
                50.0,
                function.step_budget() as f64,
                50.0,
            )
            .add_uniform("--step", 0.0, step_bound(function))
            .add_uniform("--step-mutation-coefficient", 0.85, 0.99),
    )
}

fn biological_evolution(function: Function) -> SpaceSpec {
    SpaceSpec::plain(
        HyperparameterSpace::new()
            .add_uniform("--step", 0.0, step_bound(function))
            .add_uniform_int("--population", 5, 40)
            .add_uniform_int("--crossover-population", 5, 20)
            .add_quantized("--mutation-probability", 0.0, 1.0, 0.1),
    )
}

fn particle_swarm_optimization(_function: Function) -> SpaceSpec {
    SpaceSpec::plain(
        HyperparameterSpace::new()
            .add_uniform_int("--number-of-particles", 5, 40)
            .add_uniform("--omega", -0.1, 0.837)
            .add_uniform("--c-1", 0.875, 2.0412)
            .add_uniform("--c-2", 0.9477, 2.85),
    )
}

fn difference_evolution(_function: Function) -> SpaceSpec {
    SpaceSpec::plain(
        HyperparameterSpace::new()
            .add_uniform_int("--population", 5, 40)
            .add_uniform("--f", 0.0, 1.0),
    )
}
