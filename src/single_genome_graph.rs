//! Compressed single genome graphs.
//!
//! A single genome graph is the edge-induced subgraph of the compacted de Bruijn
//! graph restricted to the links seen in one genome. Maximal chains of degree-2
//! vertices are collapsed into [`Path`] records so the graph that is actually
//! searched only keeps branch vertices and chain endpoints.

use crate::graph::{checked_right_node, left_node, right_node, Graph, GraphError};

/// Where an original index ended up in the compressed graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeMapping {
    /// A vertex of the compressed graph.
    Direct(usize),
    /// Interior vertex of a compressed chain, at position `pos` of `path`.
    OnPath { path: usize, pos: usize },
}

/// A compressed chain between two compressed-graph vertices.
///
/// `prefix[i]` is the distance from the start vertex to the chain's `i`-th
/// interior vertex; the last entry is the full length up to the end vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    start_node: usize,
    end_node: usize,
    prefix: Vec<f64>,
}

impl Path {
    pub fn start_node(&self) -> usize {
        self.start_node
    }

    pub fn end_node(&self) -> usize {
        self.end_node
    }

    pub fn prefix(&self) -> &[f64] {
        &self.prefix
    }

    pub fn length(&self) -> f64 {
        self.prefix.last().copied().unwrap_or(0.0)
    }

    pub fn distance_to_start(&self, pos: usize) -> f64 {
        self.prefix[pos]
    }

    pub fn distance_to_end(&self, pos: usize) -> f64 {
        self.length() - self.prefix[pos]
    }

    pub fn distance_in_path(&self, pos_1: usize, pos_2: usize) -> f64 {
        (self.prefix[pos_1] - self.prefix[pos_2]).abs()
    }
}

#[derive(Debug, Clone)]
pub struct SingleGenomeGraph {
    graph: Graph,
    paths: Vec<Path>,
    node_map: Vec<Option<NodeMapping>>,
    two_sided: bool,
}

impl SingleGenomeGraph {
    /// Build from the compacted de Bruijn graph and one genome's links
    /// (two-sided indices).
    pub fn new(cdbg: &Graph, links: &[(usize, usize)]) -> Result<Self, GraphError> {
        let subgraph = cdbg.edge_induced_subgraph(links)?;
        Self::compress(&subgraph)
    }

    /// Collapse every maximal degree-2 chain of `subgraph` into a path record.
    ///
    /// The traversal is an iterative DFS over `(parent, candidate, weight)`
    /// frames; chains can be arbitrarily long.
    pub fn compress(subgraph: &Graph) -> Result<Self, GraphError> {
        let n = subgraph.size();
        if n == 0 {
            return Err(GraphError::EmptyGraph);
        }

        let mut sgg = Self {
            graph: Graph::new(false),
            paths: Vec::new(),
            node_map: vec![None; n],
            two_sided: subgraph.two_sided(),
        };
        let mut visited = vec![false; n];
        let mut stack: Vec<(usize, usize, f64)> = Vec::new();

        for v in 0..n {
            if visited[v] || subgraph.degree(v) == 0 {
                continue;
            }
            sgg.add_and_map_node(v);
            visited[v] = true;
            push_neighbors(subgraph, &mut stack, v);

            while let Some((parent, w, weight)) = stack.pop() {
                let Some(NodeMapping::Direct(parent_idx)) = sgg.node_map[parent] else {
                    continue;
                };
                if visited[w] {
                    // Chain interiors are served by their path record
                    if let Some(NodeMapping::Direct(w_idx)) = sgg.node_map[w] {
                        sgg.graph.add_edge(parent_idx, w_idx, weight);
                    }
                    continue;
                }

                let (end, weight) = if subgraph.degree(w) == 2 {
                    sgg.compress_path(subgraph, &mut visited, parent_idx, parent, w, weight)
                } else {
                    (w, weight)
                };
                if end == parent {
                    // Chain looped back to where it started
                    continue;
                }

                let end_idx = match sgg.node_map[end] {
                    Some(NodeMapping::Direct(idx)) => idx,
                    _ => sgg.add_and_map_node(end),
                };
                sgg.graph.add_edge(parent_idx, end_idx, weight);
                if !visited[end] {
                    push_neighbors(subgraph, &mut stack, end);
                    visited[end] = true;
                }
            }
        }

        Ok(sgg)
    }

    fn add_and_map_node(&mut self, original_idx: usize) -> usize {
        let idx = self.graph.add_node();
        self.node_map[original_idx] = Some(NodeMapping::Direct(idx));
        idx
    }

    /// Walk the chain starting at `w` until a vertex of degree other than 2 or
    /// an already mapped vertex. Returns that terminal vertex and the chain length.
    fn compress_path(
        &mut self,
        subgraph: &Graph,
        visited: &mut [bool],
        start_idx: usize,
        parent: usize,
        mut w: usize,
        weight: f64,
    ) -> (usize, f64) {
        let mut nodes_in_path = vec![w];
        let mut prefix = vec![weight];
        let mut prev = parent;

        while subgraph.degree(w) == 2 {
            let neighbors = subgraph.neighbors(w);
            let (next, step) = if neighbors[0].0 == prev {
                neighbors[1]
            } else {
                neighbors[0]
            };
            prev = w;
            w = next;
            nodes_in_path.push(w);
            prefix.push(prefix[prefix.len() - 1] + step);
            if self.node_map[w].is_some() {
                break;
            }
        }

        let path = self.paths.len();
        for (pos, &node) in nodes_in_path[..nodes_in_path.len() - 1].iter().enumerate() {
            visited[node] = true;
            self.node_map[node] = Some(NodeMapping::OnPath { path, pos });
        }

        // An unmapped terminal becomes the next compressed vertex
        let end_idx = match self.node_map[w] {
            Some(NodeMapping::Direct(idx)) => idx,
            _ => self.graph.size(),
        };
        let length = prefix[prefix.len() - 1];
        self.paths.push(Path {
            start_node: start_idx,
            end_node: end_idx,
            prefix,
        });
        (w, length)
    }

    /// The compressed graph that gets searched.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    pub fn path(&self, path: usize) -> &Path {
        &self.paths[path]
    }

    pub fn n_paths(&self) -> usize {
        self.paths.len()
    }

    /// Number of compressed-graph vertices.
    pub fn size(&self) -> usize {
        self.graph.size()
    }

    pub fn mapping(&self, original_idx: usize) -> Option<NodeMapping> {
        self.node_map.get(original_idx).copied().flatten()
    }

    pub fn contains(&self, original_idx: usize) -> bool {
        self.mapping(original_idx).is_some()
    }

    pub fn is_on_path(&self, original_idx: usize) -> bool {
        matches!(self.mapping(original_idx), Some(NodeMapping::OnPath { .. }))
    }

    /// Whether domain vertex `v` appears in this genome.
    pub fn contains_vertex(&self, v: usize) -> bool {
        if self.two_sided {
            checked_right_node(v).is_some() && self.contains(left_node(v))
        } else {
            self.contains(v)
        }
    }

    /// Original indices of the sides of domain vertex `v`.
    pub fn sides(&self, v: usize) -> Vec<usize> {
        if self.two_sided {
            vec![left_node(v), right_node(v)]
        } else {
            vec![v]
        }
    }
}

fn push_neighbors(subgraph: &Graph, stack: &mut Vec<(usize, usize, f64)>, v: usize) {
    for &(w, weight) in subgraph.neighbors(v) {
        stack.push((v, w, weight));
    }
}
