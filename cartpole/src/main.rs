use oxignp::genomics::GeneticConfig;
use oxignp::populations::{EvolutionLogger, ReportingLevel, Stats};
use oxignp::{Population, PopulationConfig};

use std::num::NonZeroUsize;

use rayon::prelude::*;

// Observation ranges of the CartPole task, per feature.
const MIN_F: [f64; 4] = [-4.8, -5.0, -0.418, -10.0];
const MAX_F: [f64; 4] = [4.8, 5.0, 0.418, 10.0];

const D_MAX: usize = 10;
const PENALTY: f64 = 2.0;
const MAX_STEPS: usize = 500;
const MAX_CONSECUTIVE_P: usize = 5;

fn genetic_config() -> GeneticConfig {
    GeneticConfig {
        judgment_nodes: 1,
        judgment_functions: NonZeroUsize::new(4).unwrap(),
        processing_nodes: 2,
        processing_functions: NonZeroUsize::new(2).unwrap(),
        fractal_judgment: false,
    }
}

fn main() {
    single_run();
    stress_test();
    serde_test();
}

/// Runs one generation: evaluation, selection, and the variation
/// operators, in the order the used-flags require.
fn advance(population: &mut Population) {
    population.evaluate_cartpole(D_MAX, PENALTY, MAX_STEPS, MAX_CONSECUTIVE_P);
    population
        .tournament_selection(2, 1)
        .expect("tournament fits the population");
    population.crossover(0.05);
    population
        .add_or_delete_nodes(&MIN_F, &MAX_F)
        .expect("feature ranges cover all judgment functions");
    population.mutate_edges(0.03, 0.03);
    population.mutate_boundaries_uniform(0.05);
}

fn single_run() {
    let mut population = Population::new(
        PopulationConfig {
            size: NonZeroUsize::new(200).unwrap(),
            seed: 42,
        },
        genetic_config(),
    );
    population
        .initialize_boundaries(&MIN_F, &MAX_F)
        .expect("feature ranges cover all judgment functions");

    let mut logger = EvolutionLogger::new(ReportingLevel::Champion);
    for generation in 0..50 {
        advance(&mut population);
        logger.log(&population);
        println!(
            "generation {:>3}: best {:>5.1}, mean {:>7.2}",
            generation,
            population.best_fit(),
            population.mean_fitness()
        );
        if population.best_fit() >= MAX_STEPS as f64 {
            println!("full episode survived in generation {}", generation);
            break;
        }
    }
    if let Some(log) = logger.iter().last() {
        println!("{}", log);
    }
    println!("{}", population.champion());
}

/// Repeats independent evolution runs in parallel and reports how many
/// generations each needed to survive a full episode.
fn stress_test() {
    const ITERATIONS: u64 = 10;
    const GENERATIONS: usize = 40;

    let generations: Vec<Option<usize>> = (0..ITERATIONS)
        .into_par_iter()
        .map(|seed| {
            let mut population = Population::new(
                PopulationConfig {
                    size: NonZeroUsize::new(100).unwrap(),
                    seed,
                },
                genetic_config(),
            );
            population
                .initialize_boundaries(&MIN_F, &MAX_F)
                .expect("feature ranges cover all judgment functions");
            for generation in 0..GENERATIONS {
                advance(&mut population);
                if population.best_fit() >= MAX_STEPS as f64 {
                    return Some(generation);
                }
            }
            None
        })
        .collect();

    println!(
        "Successful run generation count {:?}, {}% failure rate over {} iterations",
        Stats::from(generations.iter().filter_map(|g| g.map(|g| g as f64))),
        generations.iter().filter(|g| g.is_none()).count() as f64 * 100.0 / ITERATIONS as f64,
        ITERATIONS
    );
}

fn serde_test() {
    let mut population = Population::new(
        PopulationConfig {
            size: NonZeroUsize::new(100).unwrap(),
            seed: 7,
        },
        genetic_config(),
    );
    population
        .initialize_boundaries(&MIN_F, &MAX_F)
        .expect("feature ranges cover all judgment functions");
    for _ in 0..10 {
        advance(&mut population);
    }

    println!("{}", ron::to_string(&population.champion()).unwrap());
    let stored = ron::to_string(&population).unwrap();

    // The revived population gets a fresh generator; structure and
    // fitness survive the round-trip, reproducibility does not.
    let mut population: Population = ron::from_str(&stored).unwrap();
    for _ in 0..10 {
        advance(&mut population);
    }
    println!("best after revival: {}", population.best_fit());
}
