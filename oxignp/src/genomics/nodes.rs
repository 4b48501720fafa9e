use crate::genomics::fractal;

use std::fmt;

use rand::prelude::{Rng, SliceRandom};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

/// A NodeType indicates the role a node plays during traversal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// The traversal entry point; exactly one per network.
    Start,
    /// Routes execution along one of several edges by testing a feature.
    Judgment,
    /// Emits an action and forwards to its single successor.
    Processing,
}

/// Nodes are the vertices of a network's decision graph.
///
/// A node's `id` always equals its position in the owning network's
/// inner-node array, and edges are ids into that same array. Judgment
/// nodes additionally carry one interval boundary per edge transition,
/// and fractal judgment nodes the production rule those boundaries are
/// derived from.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Node {
    pub(crate) id: usize,
    pub(crate) node_type: NodeType,
    pub(crate) function: usize,
    pub(crate) edges: Vec<usize>,
    pub(crate) boundaries: Vec<f64>,
    pub(crate) production_rule: Vec<f64>,
    pub(crate) k_d: Option<(usize, usize)>,
    pub(crate) used: bool,
}

impl Node {
    /// Generates a new node with empty edges and boundaries.
    ///
    /// For judgment nodes `function` selects the feature to test; for
    /// processing nodes it is the action emitted. The start node ignores it.
    ///
    /// # Examples
    /// ```
    /// use oxignp::genomics::{Node, NodeType};
    ///
    /// let node = Node::new(5, NodeType::Processing, 1);
    /// assert_eq!(node.id(), 5);
    /// assert_eq!(node.node_type(), NodeType::Processing);
    /// assert_eq!(node.function(), 1);
    /// ```
    pub fn new(id: usize, node_type: NodeType, function: usize) -> Node {
        Node {
            id,
            node_type,
            function,
            edges: Vec::new(),
            boundaries: Vec::new(),
            production_rule: Vec::new(),
            k_d: None,
            used: false,
        }
    }

    /// Replaces the node's edges with random successors drawn from a
    /// network of `node_count` nodes.
    ///
    /// Judgment nodes receive `edge_count` edges when given, otherwise a
    /// random number in `[2, node_count - 1]`; start and processing nodes
    /// always receive exactly one. Self-loops are never produced.
    ///
    /// Judgment nodes require `node_count >= 3`.
    ///
    /// # Examples
    /// ```
    /// use oxignp::genomics::{Node, NodeType};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let mut node = Node::new(0, NodeType::Judgment, 2);
    /// node.randomize_edges(6, Some(4), &mut rng);
    ///
    /// assert_eq!(node.edges().len(), 4);
    /// assert!(node.edges().iter().all(|&e| e < 6 && e != node.id()));
    /// ```
    pub fn randomize_edges(
        &mut self,
        node_count: usize,
        edge_count: Option<usize>,
        rng: &mut impl Rng,
    ) {
        match self.node_type {
            NodeType::Judgment => {
                let count = edge_count.unwrap_or_else(|| rng.gen_range(2..node_count));
                let mut candidates: Vec<usize> =
                    (0..node_count).filter(|&i| i != self.id).collect();
                candidates.shuffle(rng);
                candidates.truncate(count);
                self.edges = candidates;
            }
            NodeType::Start | NodeType::Processing => loop {
                let successor = rng.gen_range(0..node_count);
                if successor != self.id {
                    self.edges = vec![successor];
                    break;
                }
            },
        }
    }

    /// Redraws the edge at `slot`, rejecting the node's own id and the
    /// edge's previous value.
    ///
    /// Termination relies on `node_count >= 3`.
    pub(crate) fn redraw_edge(&mut self, slot: usize, node_count: usize, rng: &mut impl Rng) {
        let old = self.edges[slot];
        loop {
            let successor = rng.gen_range(0..node_count);
            if successor != self.id && successor != old {
                self.edges[slot] = successor;
                break;
            }
        }
    }

    /// Returns the index of the edge whose interval contains `v`.
    ///
    /// Values at or below the lowest boundary select edge 0, values at or
    /// above the highest select the last edge, and everything in between is
    /// located by binary search. The result is always a valid edge index.
    ///
    /// # Examples
    /// ```
    /// use oxignp::genomics::{Node, NodeType};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let mut node = Node::new(0, NodeType::Judgment, 0);
    /// node.randomize_edges(5, Some(4), &mut rng);
    /// node.set_boundaries(0.0, 1.0, None);
    ///
    /// // Boundaries are now [0.0, 0.25, 0.5, 0.75, 1.0].
    /// assert_eq!(node.judge(-1.0), 0);
    /// assert_eq!(node.judge(0.1), 0);
    /// assert_eq!(node.judge(0.25), 1);
    /// assert_eq!(node.judge(0.6), 2);
    /// assert_eq!(node.judge(0.9), 3);
    /// assert_eq!(node.judge(2.0), 3);
    /// ```
    pub fn judge(&self, v: f64) -> usize {
        let last = self.boundaries.len() - 1;
        if v <= self.boundaries[0] {
            return 0;
        }
        if v >= self.boundaries[last] {
            return self.edges.len() - 1;
        }
        let mut lo = 0;
        let mut hi = self.edges.len() - 1;
        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            if self.boundaries[mid] <= v && v < self.boundaries[mid + 1] {
                return mid;
            } else if v < self.boundaries[mid] {
                hi = mid - 1;
            } else {
                lo = mid + 1;
            }
        }
        unreachable!("boundaries are ordered and bracket v")
    }

    /// Sets the interval boundaries covering `[min_f, max_f]`.
    ///
    /// Without `lengths`, the range is split into as many equal intervals
    /// as the node has edges. With `lengths` (relative interval sizes
    /// summing to 1, one per edge), boundaries are placed at the cumulative
    /// sums, which is how fractal partitions are mapped onto the range.
    ///
    /// # Examples
    /// ```
    /// use oxignp::genomics::{Node, NodeType};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let mut node = Node::new(0, NodeType::Judgment, 0);
    /// node.randomize_edges(5, Some(4), &mut rng);
    ///
    /// node.set_boundaries(-2.0, 2.0, Some(&[0.5, 0.25, 0.125, 0.125]));
    /// assert_eq!(node.boundaries(), &[-2.0, 0.0, 1.0, 1.5, 2.0]);
    /// ```
    pub fn set_boundaries(&mut self, min_f: f64, max_f: f64, lengths: Option<&[f64]>) {
        self.boundaries.clear();
        match lengths {
            None => {
                let span = (max_f - min_f) / self.edges.len() as f64;
                let mut sum = min_f;
                for _ in 0..=self.edges.len() {
                    self.boundaries.push(sum);
                    sum += span;
                }
            }
            Some(lengths) => {
                debug_assert!((lengths.iter().sum::<f64>() - 1.0).abs() < 1e-6);
                let range = max_f - min_f;
                let mut prefix = 0.0;
                self.boundaries.push(min_f);
                for length in lengths {
                    prefix += length;
                    self.boundaries.push(min_f + range * prefix);
                }
            }
        }
    }

    /// Independently replaces each edge with probability `p` by a fresh
    /// successor, rejecting the node's id and the edge's old value.
    ///
    /// Termination relies on `node_count >= 3`.
    ///
    /// # Examples
    /// ```
    /// use oxignp::genomics::{Node, NodeType};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let mut node = Node::new(0, NodeType::Judgment, 0);
    /// node.randomize_edges(8, Some(5), &mut rng);
    /// let before = node.edges().to_vec();
    ///
    /// node.mutate_edges(1.0, 8, &mut rng);
    ///
    /// // With p = 1 every edge was redrawn, and redraws reject old values.
    /// assert!(node.edges().iter().zip(&before).all(|(new, old)| new != old));
    /// assert!(node.edges().iter().all(|&e| e < 8 && e != node.id()));
    /// ```
    pub fn mutate_edges(&mut self, p: f64, node_count: usize, rng: &mut impl Rng) {
        for slot in 0..self.edges.len() {
            if rng.gen::<f64>() < p {
                self.redraw_edge(slot, node_count, rng);
            }
        }
    }

    /// Mutates each inner boundary with probability `p` by redrawing it
    /// uniformly between its neighbors. The outermost boundaries stay
    /// pinned to the feature range.
    pub fn mutate_boundaries_uniform(&mut self, p: f64, rng: &mut impl Rng) {
        for i in 1..self.boundaries.len().saturating_sub(1) {
            if rng.gen::<f64>() < p {
                let lo = self.boundaries[i - 1];
                let hi = self.boundaries[i + 1];
                if lo < hi {
                    self.boundaries[i] = rng.gen_range(lo..hi);
                }
            }
        }
    }

    /// Mutates each inner boundary with probability `p` by sampling from
    /// `Normal(b_i, sigma * |b_i|)`; a sample falling outside the open
    /// interval between the neighboring boundaries is discarded, so the
    /// boundary ordering is preserved.
    pub fn mutate_boundaries_normal(&mut self, p: f64, sigma: f64, rng: &mut impl Rng) {
        for i in 1..self.boundaries.len().saturating_sub(1) {
            if rng.gen::<f64>() < p {
                let mu = self.boundaries[i];
                let normal = Normal::new(mu, sigma * mu.abs()).expect("valid normal distribution");
                let x = normal.sample(rng);
                if self.boundaries[i - 1] < x && x < self.boundaries[i + 1] {
                    self.boundaries[i] = x;
                }
            }
        }
    }

    /// Mutates the inner production-rule parameters of a fractal judgment
    /// node with probability `p` each, redrawing them uniformly between
    /// their neighbors, and rederives the boundaries from the updated rule
    /// after every successful mutation.
    pub fn mutate_boundaries_fractal(
        &mut self,
        p: f64,
        min_f: f64,
        max_f: f64,
        rng: &mut impl Rng,
    ) {
        let (_, d) = match self.k_d {
            Some(k_d) => k_d,
            None => return,
        };
        for i in 1..self.production_rule.len().saturating_sub(1) {
            if rng.gen::<f64>() < p {
                let lo = self.production_rule[i - 1];
                let hi = self.production_rule[i + 1];
                if lo < hi {
                    self.production_rule[i] = rng.gen_range(lo..hi);
                }
                let rule = fractal::sort_and_distance(self.production_rule.clone());
                let lengths = fractal::fractal_lengths(d, &rule);
                self.set_boundaries(min_f, max_f, Some(&lengths));
            }
        }
    }

    /// Returns the node's id, which equals its position in the owning
    /// network's inner-node array.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the node's type.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Returns the node's function: the tested feature index for judgment
    /// nodes, the emitted action for processing nodes.
    pub fn function(&self) -> usize {
        self.function
    }

    /// Returns the node's successor ids, ordered by edge position.
    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    /// Returns the node's interval boundaries. Empty for non-judgment nodes.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    /// Returns the sorted production-rule parameters of a fractal judgment
    /// node, bracketed by 0 and 1. Empty otherwise.
    pub fn production_rule(&self) -> &[f64] {
        &self.production_rule
    }

    /// Returns the `(k, d)` pair of a fractal judgment node, with
    /// `k^d` equal to its edge count.
    pub fn k_d(&self) -> Option<(usize, usize)> {
        self.k_d
    }

    /// Returns whether the most recent traversal visited this node.
    pub fn used(&self) -> bool {
        self.used
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}[{:?}, f: {}, E: {:?}, B: {:?}]",
            self.id, self.node_type, self.function, self.edges, self.boundaries,
        )
    }
}
