//! Pure helpers for fractal partitioning of judgment-node feature ranges.
//!
//! A fractal judgment node splits its feature range into `k^d` self-similar
//! intervals: a production rule of `k` relative lengths is applied `d` times
//! to its own output, the way an L-system rewrites its axiom. The helpers
//! here generate and expand such rules; mapping the resulting lengths onto
//! an actual feature range is done by [`Node::set_boundaries`].
//!
//! [`Node::set_boundaries`]: crate::genomics::Node::set_boundaries

use rand::prelude::{Rng, SliceRandom};

/// Uniformly selects a `(k, d)` combination with `k ≥ 2` and `k^d ≤ n`.
///
/// For `n > 3` only combinations with `d ≥ 2` are eligible, so the
/// resulting split is hierarchical rather than a flat `k`-way cut;
/// for `n ≤ 3` a depth of 1 is the only option.
///
/// # Panics
/// Panics if `n < 2`, as no valid combination exists.
///
/// # Examples
/// ```
/// use oxignp::genomics::random_k_d_combination;
/// use rand::{rngs::StdRng, SeedableRng};
///
/// let mut rng = StdRng::seed_from_u64(42);
///
/// // With room for 8 successors, only 2^2 and 2^3 are hierarchical fits.
/// let (k, d) = random_k_d_combination(8, &mut rng);
/// assert!((k, d) == (2, 2) || (k, d) == (2, 3));
///
/// // A binary decision permits no recursion at all.
/// assert_eq!(random_k_d_combination(2, &mut rng), (2, 1));
/// ```
pub fn random_k_d_combination(n: usize, rng: &mut impl Rng) -> (usize, usize) {
    let min_depth = if n <= 3 { 1 } else { 2 };
    let mut combinations = Vec::new();
    let mut k = 2;
    while k <= n {
        let mut d = min_depth;
        while k.pow(d as u32) <= n {
            combinations.push((k, d));
            d += 1;
        }
        k += 1;
    }
    *combinations
        .choose(rng)
        .expect("no (k, d) combination with k^d <= n")
}

/// Returns `[0, u_1, …, u_n, 1]` with each `u_i` drawn uniformly from `(0, 1)`.
///
/// The interior cut points are unsorted; [`sort_and_distance`] turns them
/// into the relative interval lengths of a production rule.
pub fn random_parameter_cuts(n: usize, rng: &mut impl Rng) -> Vec<f64> {
    let mut cuts = Vec::with_capacity(n + 2);
    cuts.push(0.0);
    for _ in 0..n {
        cuts.push(rng.gen_range(f64::MIN_POSITIVE..1.0));
    }
    cuts.push(1.0);
    cuts
}

/// Sorts the cut points and returns the distances between consecutive ones.
///
/// When the input starts at 0 and ends at 1 the output sums to 1, making it
/// a valid production rule.
///
/// # Examples
/// ```
/// use oxignp::genomics::sort_and_distance;
///
/// let lengths = sort_and_distance(vec![0.0, 0.4, 0.1, 0.5, 1.0]);
/// for (got, want) in lengths.iter().zip([0.1, 0.3, 0.1, 0.5]) {
///     assert!((got - want).abs() < 1e-12);
/// }
/// ```
pub fn sort_and_distance(mut cuts: Vec<f64>) -> Vec<f64> {
    cuts.sort_by(f64::total_cmp);
    for i in 0..cuts.len() - 1 {
        cuts[i] = cuts[i + 1] - cuts[i];
    }
    cuts.pop();
    cuts
}

/// Expands a production rule into `rule.len()^depth` self-similar lengths.
///
/// Starting from the unit interval, every interval is replaced by one
/// sub-interval per rule entry, scaled by that entry, `depth` times over.
/// If the rule sums to 1 the result sums to 1.
///
/// # Examples
/// ```
/// use oxignp::genomics::fractal_lengths;
///
/// let lengths = fractal_lengths(2, &[0.3, 0.7]);
/// assert_eq!(lengths.len(), 4);
/// for (got, want) in lengths.iter().zip([0.09, 0.21, 0.21, 0.49]) {
///     assert!((got - want).abs() < 1e-12);
/// }
/// ```
pub fn fractal_lengths(depth: usize, rule: &[f64]) -> Vec<f64> {
    let mut lengths = vec![1.0];
    for _ in 0..depth {
        let mut expanded = Vec::with_capacity(lengths.len() * rule.len());
        for length in &lengths {
            for ratio in rule {
                expanded.push(length * ratio);
            }
        }
        lengths = expanded;
    }
    lengths
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn k_d_combinations_respect_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 2..=64 {
            for _ in 0..20 {
                let (k, d) = random_k_d_combination(n, &mut rng);
                assert!(k >= 2);
                assert!(k.pow(d as u32) <= n, "{}^{} > {}", k, d, n);
                if n > 3 {
                    assert!(d >= 2);
                }
            }
        }
    }

    #[test]
    fn k_d_combinations_small_n() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20 {
            assert_eq!(random_k_d_combination(2, &mut rng), (2, 1));
            let (k, d) = random_k_d_combination(3, &mut rng);
            assert!(matches!((k, d), (2, 1) | (3, 1)));
        }
    }

    #[test]
    fn parameter_cuts_are_bracketed() {
        let mut rng = StdRng::seed_from_u64(13);
        let cuts = random_parameter_cuts(5, &mut rng);
        assert_eq!(cuts.len(), 7);
        assert_eq!(cuts[0], 0.0);
        assert_eq!(*cuts.last().unwrap(), 1.0);
        assert!(cuts[1..6].iter().all(|u| 0.0 < *u && *u < 1.0));
    }

    #[test]
    fn sort_and_distance_unsorted_input() {
        let lengths = sort_and_distance(vec![0.0, 0.4, 0.1, 0.5, 1.0]);
        assert_eq!(lengths.len(), 4);
        for (got, want) in lengths.iter().zip([0.1, 0.3, 0.1, 0.5]) {
            assert!((got - want).abs() < 1e-12, "{} vs {}", got, want);
        }
        assert!((lengths.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fractal_lengths_expand_depth_three() {
        let lengths = fractal_lengths(3, &[0.3, 0.7]);
        let expected = [0.027, 0.063, 0.063, 0.147, 0.063, 0.147, 0.147, 0.343];
        assert_eq!(lengths.len(), expected.len());
        for (got, want) in lengths.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
        assert!((lengths.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn random_rules_stay_normalized() {
        let mut rng = StdRng::seed_from_u64(17);
        for m in 1..=6 {
            for depth in 1..=3 {
                let rule = sort_and_distance(random_parameter_cuts(m, &mut rng));
                let lengths = fractal_lengths(depth, &rule);
                assert_eq!(lengths.len(), (m + 1).pow(depth as u32));
                let sum: f64 = lengths.iter().sum();
                assert!((sum - 1.0).abs() < m as f64 * 1e-7, "sum {}", sum);
            }
        }
    }
}
