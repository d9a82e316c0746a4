use crate::parse::ParseErr;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Left side of a two-sided vertex, considered from its canonical form.
#[inline]
pub fn left_node(v: usize) -> usize {
    2 * v
}

/// Right side of a two-sided vertex; always `left_node(v) + 1`.
#[inline]
pub fn right_node(v: usize) -> usize {
    2 * v + 1
}

/// Right side of `v`, or `None` if the two-sided index does not fit in `usize`.
#[inline]
pub fn checked_right_node(v: usize) -> Option<usize> {
    v.checked_mul(2).and_then(|left| left.checked_add(1))
}

/// Map a compacted de Bruijn graph link onto two-sided indices.
/// An `F*` link leaves `v` from its right side, a `*R` link enters `w` on its right side.
#[inline]
pub fn link_sides(v: usize, w: usize, from_forward: bool, to_reverse: bool) -> (usize, usize) {
    (
        left_node(v) + from_forward as usize,
        left_node(w) + to_reverse as usize,
    )
}

#[derive(Debug)]
pub enum GraphError {
    EmptyGraph,
    VertexOutOfRange { vertex: usize, size: usize },
    InvalidWeight(f64),
    EmptySampleGraph { sample: usize },
    NoSampleGraphs,
    NoQueries,
    InvalidConfig(String),
    ThreadPool(rayon::ThreadPoolBuildError),
    Parse(ParseErr),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::EmptyGraph => write!(f, "Graph has no vertices"),
            GraphError::VertexOutOfRange { vertex, size } => {
                write!(f, "Vertex index {} out of range for graph of size {}", vertex, size)
            }
            GraphError::InvalidWeight(w) => write!(f, "Invalid edge weight: {}", w),
            GraphError::EmptySampleGraph { sample } => {
                write!(f, "Single genome graph {} has no vertices", sample)
            }
            GraphError::NoSampleGraphs => write!(f, "No single genome graphs to process"),
            GraphError::NoQueries => write!(f, "No distance queries to process"),
            GraphError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            GraphError::ThreadPool(e) => write!(f, "Failed to build thread pool: {}", e),
            GraphError::Parse(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for GraphError {}

impl From<ParseErr> for GraphError {
    fn from(e: ParseErr) -> Self {
        GraphError::Parse(e)
    }
}

/// Summary numbers used for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphDetails {
    pub n_nodes: usize,
    pub n_edges: usize,
    pub max_degree: usize,
}

impl GraphDetails {
    pub fn avg_degree(&self) -> f64 {
        if self.n_nodes == 0 {
            0.0
        } else {
            2.0 * self.n_edges as f64 / self.n_nodes as f64
        }
    }
}

// Frontier entry. Ordered so that BinaryHeap pops the smallest (distance, node) first.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    distance: f64,
    node: usize,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// Weighted undirected adjacency-list graph over dense indices.
///
/// In two-sided mode every domain vertex `v` occupies `left_node(v)` and
/// `right_node(v)`, joined by a self-edge that carries the vertex's own
/// traversal length.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    adj: Vec<Vec<(usize, f64)>>,
    two_sided: bool,
}

impl Graph {
    pub fn new(two_sided: bool) -> Self {
        Self {
            adj: Vec::new(),
            two_sided,
        }
    }

    pub fn with_size(size: usize, two_sided: bool) -> Self {
        Self {
            adj: vec![Vec::new(); size],
            two_sided,
        }
    }

    /// Build an ordinary graph from `(v, w, weight)` edges.
    pub fn from_edges(edges: &[(usize, usize, f64)]) -> Result<Self, GraphError> {
        let max_v = edges
            .iter()
            .map(|&(v, w, _)| v.max(w))
            .max()
            .ok_or(GraphError::EmptyGraph)?;
        let mut graph = Graph::with_size(max_v + 1, false);
        for &(v, w, weight) in edges {
            check_weight(weight)?;
            graph.add_edge(v, w, weight);
        }
        Ok(graph)
    }

    /// Build a two-sided compacted de Bruijn graph.
    ///
    /// Each unitig contributes a left/right pair joined by a self-edge of weight
    /// `length - k` (never negative). `links` are already expressed in two-sided
    /// indices (see [`link_sides`]) and get weight 1.
    pub fn from_unitigs(
        unitig_lengths: &[usize],
        kmer_length: usize,
        links: &[(usize, usize)],
    ) -> Result<Self, GraphError> {
        if unitig_lengths.is_empty() {
            return Err(GraphError::EmptyGraph);
        }
        let mut graph = Graph::new(true);
        for &len in unitig_lengths {
            let self_edge_weight = len.saturating_sub(kmer_length) as f64;
            graph.add_node();
            graph.add_node();
            let right = graph.size() - 1;
            graph.add_edge(right - 1, right, self_edge_weight);
        }
        for &(v, w) in links {
            graph.check_index(v)?;
            graph.check_index(w)?;
            graph.add_edge(v, w, 1.0);
        }
        Ok(graph)
    }

    /// Edge-induced subgraph over `links` (two-sided indices).
    ///
    /// The first time an index is touched its self-edge is inherited from this
    /// graph, using the heaviest edge at that index, so that crossing a unitig
    /// keeps its cost.
    pub fn edge_induced_subgraph(&self, links: &[(usize, usize)]) -> Result<Graph, GraphError> {
        let max_v = links
            .iter()
            .map(|&(v, w)| v.max(w))
            .max()
            .ok_or(GraphError::EmptyGraph)?;
        self.check_index(max_v)?;

        let size = if self.two_sided {
            (max_v | 1) + 1
        } else {
            max_v + 1
        };
        let mut subgraph = Graph::with_size(size, self.two_sided);
        for &(v, w) in links {
            if self.two_sided {
                if subgraph.degree(v) == 0 {
                    subgraph.add_edge(v, v ^ 1, self.max_edge_weight(v));
                }
                if subgraph.degree(w) == 0 {
                    subgraph.add_edge(w, w ^ 1, self.max_edge_weight(w));
                }
            }
            subgraph.add_edge(v, w, 1.0);
        }
        Ok(subgraph)
    }

    pub fn add_node(&mut self) -> usize {
        self.adj.push(Vec::new());
        self.adj.len() - 1
    }

    /// Insert `(v, w)`; a repeated edge only ever gets lighter. Self-loops are ignored.
    pub fn add_edge(&mut self, v: usize, w: usize, weight: f64) {
        if v == w {
            return;
        }
        match self.adj[v].iter().position(|&(x, _)| x == w) {
            None => {
                self.adj[v].push((w, weight));
                self.adj[w].push((v, weight));
            }
            Some(pos) => {
                if self.adj[v][pos].1 <= weight {
                    return;
                }
                self.adj[v][pos].1 = weight;
                if let Some(back) = self.adj[w].iter_mut().find(|(x, _)| *x == v) {
                    back.1 = weight;
                }
            }
        }
    }

    pub fn has_edge(&self, v: usize, w: usize) -> bool {
        self.edge_weight(v, w).is_some()
    }

    pub fn edge_weight(&self, v: usize, w: usize) -> Option<f64> {
        self.adj
            .get(v)?
            .iter()
            .find(|&&(x, _)| x == w)
            .map(|&(_, weight)| weight)
    }

    /// Remove `(v, w)`. The self-edge between the two sides of a two-sided
    /// vertex is never removed.
    pub fn remove_edge(&mut self, v: usize, w: usize) {
        if self.is_self_edge(v, w) {
            return;
        }
        self.adj[v].retain(|&(x, _)| x != w);
        self.adj[w].retain(|&(x, _)| x != v);
    }

    /// Remove every edge at `v` except its self-edge.
    pub fn disconnect_node(&mut self, v: usize) {
        let neighbors: Vec<usize> = self.adj[v].iter().map(|&(w, _)| w).collect();
        for w in neighbors {
            self.remove_edge(v, w);
        }
    }

    fn is_self_edge(&self, v: usize, w: usize) -> bool {
        self.two_sided && v ^ 1 == w
    }

    pub fn max_edge_weight(&self, v: usize) -> f64 {
        self.adj[v]
            .iter()
            .map(|&(_, weight)| weight)
            .fold(0.0, f64::max)
    }

    pub fn neighbors(&self, v: usize) -> &[(usize, f64)] {
        &self.adj[v]
    }

    pub fn degree(&self, v: usize) -> usize {
        self.adj[v].len()
    }

    pub fn size(&self) -> usize {
        self.adj.len()
    }

    pub fn two_sided(&self) -> bool {
        self.two_sided
    }

    pub fn contains(&self, idx: usize) -> bool {
        idx < self.size()
    }

    /// Whether domain vertex `v` has indices in this graph.
    pub fn contains_vertex(&self, v: usize) -> bool {
        if self.two_sided {
            checked_right_node(v).is_some_and(|right| self.contains(right))
        } else {
            self.contains(v)
        }
    }

    fn check_index(&self, idx: usize) -> Result<(), GraphError> {
        if self.contains(idx) {
            Ok(())
        } else {
            Err(GraphError::VertexOutOfRange {
                vertex: idx,
                size: self.size(),
            })
        }
    }

    pub fn details(&self) -> GraphDetails {
        let mut n_nodes = 0;
        let mut n_edges = 0;
        let mut max_degree = 0;
        let step = if self.two_sided { 2 } else { 1 };
        for i in (0..self.size()).step_by(step) {
            let mut degree = self.degree(i);
            if self.two_sided {
                degree += self.adj.get(i + 1).map_or(0, Vec::len);
                // Self-edge is counted from both sides
                degree = degree.saturating_sub(2);
            }
            if degree > 0 {
                n_nodes += 1;
            }
            n_edges += degree;
            max_degree = max_degree.max(degree);
        }
        GraphDetails {
            n_nodes,
            n_edges: n_edges / 2,
            max_degree,
        }
    }

    /// Shortest distance between two indices, or `max_distance` if it is further.
    pub fn distance_between(&self, source: usize, target: usize, max_distance: f64) -> f64 {
        self.distance(&[(source, 0.0)], &[target], max_distance)[0]
    }

    /// Bounded multi-source Dijkstra.
    ///
    /// Every source starts at its own initial distance. The search stops as soon
    /// as all targets are settled; targets that cannot be reached below
    /// `max_distance` get exactly `max_distance`. One result per target, in order.
    pub fn distance(&self, sources: &[(usize, f64)], targets: &[usize], max_distance: f64) -> Vec<f64> {
        if targets.is_empty() {
            return Vec::new();
        }
        let mut dist = vec![max_distance; self.size()];
        let mut settled = vec![false; self.size()];
        let mut is_target = vec![false; self.size()];
        let mut targets_left = 0;
        for &t in targets {
            if !is_target[t] {
                is_target[t] = true;
                targets_left += 1;
            }
        }

        let mut queue = BinaryHeap::new();
        for &(v, initial_distance) in sources {
            if initial_distance < dist[v] {
                dist[v] = initial_distance;
                queue.push(QueueEntry {
                    distance: initial_distance,
                    node: v,
                });
            }
        }

        while let Some(QueueEntry { distance, node: v }) = queue.pop() {
            // Stale entry left behind by a decrease-key
            if settled[v] || distance > dist[v] {
                continue;
            }
            settled[v] = true;
            if is_target[v] {
                targets_left -= 1;
                if targets_left == 0 {
                    break;
                }
            }
            for &(w, weight) in &self.adj[v] {
                let candidate = distance + weight;
                if candidate < dist[w] {
                    dist[w] = candidate;
                    queue.push(QueueEntry {
                        distance: candidate,
                        node: w,
                    });
                }
            }
        }

        targets.iter().map(|&t| dist[t]).collect()
    }
}

fn check_weight(weight: f64) -> Result<(), GraphError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(GraphError::InvalidWeight(weight))
    }
}
