use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for network generation.
///
/// # Note
/// Networks must carry at least 3 inner nodes for edge randomization to
/// terminate, so `judgment_nodes + processing_nodes >= 3` is required
/// by [`Network::new`].
///
/// [`Network::new`]: crate::genomics::Network::new
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of judgment nodes in a new network.
    pub judgment_nodes: usize,
    /// Number of judgment-node functions, i.e. input features a judgment
    /// node can test.
    pub judgment_functions: NonZeroUsize,
    /// Number of processing nodes in a new network.
    pub processing_nodes: usize,
    /// Number of processing-node functions, i.e. distinct actions or
    /// labels a processing node can emit.
    pub processing_functions: NonZeroUsize,
    /// Whether judgment nodes partition their feature range fractally,
    /// with evolvable production rules, instead of uniformly.
    pub fractal_judgment: bool,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, false, or in the case of `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use oxignp::genomics::GeneticConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     judgment_nodes: 2,
    ///     processing_nodes: 3,
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            judgment_nodes: 0,
            // SAFETY: 1 is a valid NonZeroUsize. Replace this with
            // NonZeroUsize::new(1).unwrap() once const Option::unwrap
            // becomes stable.
            judgment_functions: unsafe { NonZeroUsize::new_unchecked(1) },
            processing_nodes: 0,
            // SAFETY: as above.
            processing_functions: unsafe { NonZeroUsize::new_unchecked(1) },
            fractal_judgment: false,
        }
    }
}
