use super::Population;
use crate::genomics::Network;

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllNetworks,
    /// Clones only the population champion.
    Champion,
    /// Clones no networks.
    NoNetworks,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord,
    pub fitness: Stats,
    pub node_count: Stats,
    pub best_fit: f64,
    pub mean_fitness: f64,
    pub min_fitness: f64,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tfitness: {:?}\n\
            \tnode_count: {:?}\n\
            \tbest_fit: {:?}\n\
            \tmean_fitness: {:?}\n\
            \tmin_fitness: {:?}\n\
            }}",
            &self.generation_number,
            &self.fitness,
            &self.node_count,
            &self.best_fit,
            &self.mean_fitness,
            &self.min_fitness,
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    ///
    /// # Examples
    /// ```
    /// use oxignp::populations::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        let mid = data.len() / 2;
        let (mut max, mut min, mut sum) = (f64::MIN, f64::MAX, 0.0);
        for d in &data {
            max = d.max(max);
            min = d.min(min);
            sum += d;
        }
        let mean = sum / data.len() as f64;
        let mut median = *data.select_nth_unstable_by(mid, f64::total_cmp).1;
        if data.len() % 2 == 0 {
            median = (median + *data.select_nth_unstable_by(mid - 1, f64::total_cmp).1) / 2.0;
        }
        Stats {
            maximum: max,
            minimum: min,
            mean,
            median,
        }
    }
}

/// A reporting-level dependant store
/// of networks from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord {
    /// Every network of the generation.
    All(Vec<Network>),
    /// Only the population champion.
    Champion(Network),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    ///
    /// # Examples
    /// ```
    /// use oxignp::populations::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::NoNetworks);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: Vec::new(),
        }
    }

    /// Store a snapshot of a population.
    pub fn log(&mut self, population: &Population) {
        let fitnesses: Vec<f64> = population.individuals().map(|n| n.fitness()).collect();
        self.logs.push(Log {
            generation_number: self.logs.len(),
            generation_sample: match self.reporting_level {
                ReportingLevel::AllNetworks => {
                    GenerationMemberRecord::All(population.individuals().cloned().collect())
                }
                ReportingLevel::Champion => {
                    GenerationMemberRecord::Champion(population.champion().clone())
                }
                ReportingLevel::NoNetworks => GenerationMemberRecord::None,
            },
            fitness: Stats::from(fitnesses.iter().copied()),
            node_count: Stats::from(
                population
                    .individuals()
                    .map(|n| n.inner_nodes().len() as f64),
            ),
            best_fit: population.best_fit(),
            mean_fitness: population.mean_fitness(),
            min_fitness: population.min_fitness(),
        })
    }

    /// Iterate over all logged snapshots.
    ///
    /// # Examples
    /// ```
    /// use oxignp::populations::{EvolutionLogger, ReportingLevel};
    ///
    /// let logger = EvolutionLogger::new(ReportingLevel::AllNetworks);
    /// // Log some stuff... then
    /// for log in logger.iter() {
    ///     println!("{}", log);
    /// }
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }
}
