use std::error::Error;
use std::fmt;

/// An error type indicating an unsatisfiable selection request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionError {
    /// The tournament size is zero or exceeds the population size.
    TournamentSize { requested: usize, population: usize },
    /// More elites were requested than the population holds.
    EliteSize { requested: usize, population: usize },
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TournamentSize {
                requested,
                population,
            } => write!(
                f,
                "cannot draw a tournament of {} from a population of {}",
                requested, population
            ),
            Self::EliteSize {
                requested,
                population,
            } => write!(
                f,
                "cannot keep {} elites in a population of {}",
                requested, population
            ),
        }
    }
}

impl Error for SelectionError {}
