//! Distances in compressed single genome graphs.
//!
//! A query endpoint inside a compressed chain is never a vertex of the searched
//! graph. It is replaced by virtual sources/targets at the chain's two ends,
//! offset by its distance to each end, and the final distance is stitched
//! together from the search result and the chain's prefix distances.

use crate::config::DistanceConfig;
use crate::distance::{Distance, DistanceVector};
use crate::graph::{Graph, GraphError};
use crate::graph_distances::{build_thread_pool, solve_in_blocks};
use crate::search_jobs::{SearchJob, SearchJobs};
use crate::single_genome_graph::{NodeMapping, SingleGenomeGraph};
use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPool;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

/// Supplies the links (two-sided indices) observed in each genome.
pub trait SampleEdgeSource: Sync {
    fn n_samples(&self) -> usize;

    fn load(&self, sample: usize) -> Result<Vec<(usize, usize)>, GraphError>;
}

impl SampleEdgeSource for [Vec<(usize, usize)>] {
    fn n_samples(&self) -> usize {
        self.len()
    }

    fn load(&self, sample: usize) -> Result<Vec<(usize, usize)>, GraphError> {
        Ok(self[sample].clone())
    }
}

pub struct SingleGenomeGraphDistances<'a> {
    graph: &'a SingleGenomeGraph,
    config: &'a DistanceConfig,
}

impl<'a> SingleGenomeGraphDistances<'a> {
    pub fn new(graph: &'a SingleGenomeGraph, config: &'a DistanceConfig) -> Self {
        Self { graph, config }
    }

    /// Per-thread buffers of `(original index, distance)` for every query that
    /// is connected in this genome within `max_distance`.
    pub fn solve(&self, search_jobs: &SearchJobs, pool: &ThreadPool) -> Vec<Vec<(usize, Distance)>> {
        let mut all_results = Vec::new();
        solve_in_blocks(
            pool,
            search_jobs,
            self.config,
            |job, results| {
                let job_dist = self.job_distances(job);
                for (w_idx, &distance) in job_dist.iter().enumerate() {
                    if distance < self.config.max_distance {
                        results.push((job.original_index(w_idx), Distance::observed(distance)));
                    }
                }
            },
            |thread_results| all_results.extend(thread_results),
        );
        all_results
    }

    /// Distance between domain vertices `v` and `w` in this genome.
    pub fn distance(&self, v: usize, w: usize) -> f64 {
        let mut job = SearchJob::new(v);
        job.add(w, 0);
        self.job_distances(&job)[0]
    }

    /// One distance per target of `job`, `max_distance` when unconnected.
    pub fn job_distances(&self, job: &SearchJob) -> Vec<f64> {
        let max_distance = self.config.max_distance;
        let mut job_dist = vec![max_distance; job.len()];
        let graph = self.graph;
        let v = job.v();
        if !graph.contains_vertex(v) {
            return job_dist;
        }

        let mut sources: Vec<(usize, f64)> = Vec::new();
        for side in graph.sides(v) {
            if let Some(mapping) = graph.mapping(side) {
                self.add_source(&mut sources, mapping);
            }
        }

        let mut target_set = BTreeSet::new();
        for &w in job.ws() {
            if !graph.contains_vertex(w) {
                continue;
            }
            for side in graph.sides(w) {
                match graph.mapping(side) {
                    Some(NodeMapping::Direct(idx)) => {
                        target_set.insert(idx);
                    }
                    Some(NodeMapping::OnPath { path, .. }) => {
                        let path = graph.path(path);
                        target_set.insert(path.start_node());
                        target_set.insert(path.end_node());
                    }
                    None => {}
                }
            }
        }
        let targets: Vec<usize> = target_set.into_iter().collect();
        let target_dist = graph.graph().distance(&sources, &targets, max_distance);
        let dist: FxHashMap<usize, f64> = targets.into_iter().zip(target_dist).collect();

        for v_side in graph.sides(v) {
            let Some(v_mapping) = graph.mapping(v_side) else {
                continue;
            };
            for (w_idx, &w) in job.ws().iter().enumerate() {
                if !graph.contains_vertex(w) {
                    continue;
                }
                for w_side in graph.sides(w) {
                    if let Some(w_mapping) = graph.mapping(w_side) {
                        let distance = self.side_distance(v_mapping, w_mapping, &dist);
                        job_dist[w_idx] = job_dist[w_idx].min(distance);
                    }
                }
            }
        }

        for distance in job_dist.iter_mut() {
            *distance = distance.min(max_distance);
        }
        job_dist
    }

    fn add_source(&self, sources: &mut Vec<(usize, f64)>, mapping: NodeMapping) {
        match mapping {
            NodeMapping::Direct(idx) => update_source(sources, idx, 0.0),
            NodeMapping::OnPath { path, pos } => {
                let path = self.graph.path(path);
                update_source(sources, path.start_node(), path.distance_to_start(pos));
                update_source(sources, path.end_node(), path.distance_to_end(pos));
            }
        }
    }

    fn side_distance(&self, v_mapping: NodeMapping, w_mapping: NodeMapping, dist: &FxHashMap<usize, f64>) -> f64 {
        let max_distance = self.config.max_distance;
        let lookup = |idx: usize| dist.get(&idx).copied().unwrap_or(max_distance);
        match w_mapping {
            NodeMapping::Direct(idx) => lookup(idx),
            NodeMapping::OnPath { path: w_path, pos: w_pos } => {
                let path = self.graph.path(w_path);
                let via_ends = (lookup(path.start_node()) + path.distance_to_start(w_pos))
                    .min(lookup(path.end_node()) + path.distance_to_end(w_pos));
                match v_mapping {
                    NodeMapping::OnPath { path: v_path, pos: v_pos } if v_path == w_path => {
                        via_ends.min(path.distance_in_path(v_pos, w_pos))
                    }
                    _ => via_ends,
                }
            }
        }
    }
}

/// Add a virtual source, keeping the smaller offset if the vertex is already a source.
fn update_source(sources: &mut Vec<(usize, f64)>, idx: usize, distance: f64) {
    match sources.iter_mut().find(|(s, _)| *s == idx) {
        Some(source) => source.1 = source.1.min(distance),
        None => sources.push((idx, distance)),
    }
}

/// Mean distance and connected-genome count per query over all single genome graphs.
///
/// Genomes are processed in batches of `n_sggs_in_memory`: the graphs of a batch
/// are built in parallel, searched one after another, and dropped before the
/// next batch. Queries never connected in any genome end up as
/// [`Distance::unreachable`].
pub fn single_genome_graph_distances<S>(
    cdbg: &Graph,
    samples: &S,
    search_jobs: &SearchJobs,
    config: &DistanceConfig,
) -> Result<DistanceVector, GraphError>
where
    S: SampleEdgeSource + ?Sized,
{
    config.validate()?;
    if cdbg.size() == 0 {
        return Err(GraphError::EmptyGraph);
    }
    if search_jobs.is_empty() {
        return Err(GraphError::NoQueries);
    }
    let n_sggs = samples.n_samples();
    if n_sggs == 0 {
        return Err(GraphError::NoSampleGraphs);
    }

    let batch_size = config.n_sggs_in_memory.min(n_sggs);
    let build_pool = build_thread_pool(batch_size)?;
    let search_pool = build_thread_pool(config.n_threads)?;

    let mut sgg_distances = DistanceVector::new(search_jobs.n_queries());
    let mut n_nodes = 0;
    let mut n_edges = 0;

    for batch_start in (0..n_sggs).step_by(batch_size) {
        let batch_end = (batch_start + batch_size).min(n_sggs);

        let sg_graphs: Vec<SingleGenomeGraph> = build_pool.install(|| {
            (batch_start..batch_end)
                .into_par_iter()
                .map(|sample| build_sgg(cdbg, samples, sample))
                .collect::<Result<Vec<_>, _>>()
        })?;
        debug!(
            "Constructed single genome graphs {}-{}/{}",
            batch_start + 1,
            batch_end,
            n_sggs
        );

        for sg_graph in &sg_graphs {
            let details = sg_graph.graph().details();
            n_nodes += sg_graph.size();
            n_edges += details.n_edges;

            let sggd = SingleGenomeGraphDistances::new(sg_graph, config);
            for thread_results in sggd.solve(search_jobs, &search_pool) {
                for (original_idx, distance) in thread_results {
                    sgg_distances.add(original_idx, distance);
                }
            }
        }
        info!(
            "Calculated distances in single genome graphs {}-{}/{}",
            batch_start + 1,
            batch_end,
            n_sggs
        );
    }

    sgg_distances.finalize();
    info!(
        "The compressed single genome graphs have on average {} nodes and {} edges",
        n_nodes / n_sggs,
        n_edges / n_sggs
    );
    Ok(sgg_distances)
}

fn build_sgg<S>(cdbg: &Graph, samples: &S, sample: usize) -> Result<SingleGenomeGraph, GraphError>
where
    S: SampleEdgeSource + ?Sized,
{
    let links = samples.load(sample)?;
    SingleGenomeGraph::new(cdbg, &links).map_err(|e| match e {
        GraphError::EmptyGraph => GraphError::EmptySampleGraph { sample },
        e => e,
    })
}
