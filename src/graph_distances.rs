use crate::config::DistanceConfig;
use crate::graph::{left_node, right_node, Graph, GraphError};
use crate::search_jobs::{SearchJob, SearchJobs};
use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub(crate) fn build_thread_pool(num_threads: usize) -> Result<ThreadPool, GraphError> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build()
        .map_err(GraphError::ThreadPool)
}

/// Run `job_fn` over all search jobs in sequential blocks of `block_size`.
///
/// Inside a block, thread `t` owns jobs `t, t + n_threads, ...` and collects its
/// results into its own buffer. The buffers of a block are handed to `merge` on
/// the calling thread after every worker of the block has finished.
pub(crate) fn solve_in_blocks<T, F, M>(
    pool: &ThreadPool,
    search_jobs: &SearchJobs,
    config: &DistanceConfig,
    job_fn: F,
    mut merge: M,
) where
    T: Send,
    F: Fn(&SearchJob, &mut Vec<T>) + Sync,
    M: FnMut(Vec<Vec<T>>),
{
    let n_threads = config.n_threads;
    let n_jobs = search_jobs.len();
    for block_start in (0..n_jobs).step_by(config.block_size) {
        let block_end = (block_start + config.block_size).min(n_jobs);
        let thread_results: Vec<Vec<T>> = pool.install(|| {
            (0..n_threads)
                .into_par_iter()
                .map(|thr| {
                    let mut results = Vec::new();
                    for i in (block_start + thr..block_end).step_by(n_threads) {
                        job_fn(search_jobs.get(i), &mut results);
                    }
                    results
                })
                .collect()
        });
        merge(thread_results);
        debug!(
            "Calculated distances for block {}-{}/{}",
            block_start + 1,
            block_end,
            n_jobs
        );
    }
}

/// Distances in the full graph (ordinary or compacted de Bruijn graph).
pub struct GraphDistances<'a> {
    graph: &'a Graph,
    config: &'a DistanceConfig,
}

impl<'a> GraphDistances<'a> {
    pub fn new(graph: &'a Graph, config: &'a DistanceConfig) -> Self {
        Self { graph, config }
    }

    /// One distance per query slot. Unreachable queries, and queries naming
    /// vertices the graph does not have, get `max_distance`.
    pub fn solve(&self, search_jobs: &SearchJobs) -> Result<Vec<f64>, GraphError> {
        self.config.validate()?;
        if self.graph.size() == 0 {
            return Err(GraphError::EmptyGraph);
        }
        if search_jobs.is_empty() {
            return Err(GraphError::NoQueries);
        }

        let pool = build_thread_pool(self.config.n_threads)?;
        let mut res = vec![self.config.max_distance; search_jobs.n_queries()];
        solve_in_blocks(
            &pool,
            search_jobs,
            self.config,
            |job, results| self.job_distances(job, results),
            |thread_results| {
                for (original_idx, distance) in thread_results.into_iter().flatten() {
                    res[original_idx] = distance;
                }
            },
        );
        Ok(res)
    }

    fn job_distances(&self, job: &SearchJob, results: &mut Vec<(usize, f64)>) {
        let graph = self.graph;
        let v = job.v();
        if !graph.contains_vertex(v) {
            return;
        }

        let sources = if graph.two_sided() {
            vec![(left_node(v), 0.0), (right_node(v), 0.0)]
        } else {
            vec![(v, 0.0)]
        };

        // (position in job, first target slot)
        let mut slots = Vec::with_capacity(job.len());
        let mut targets = Vec::new();
        for (w_idx, &w) in job.ws().iter().enumerate() {
            if !graph.contains_vertex(w) {
                continue;
            }
            slots.push((w_idx, targets.len()));
            if graph.two_sided() {
                targets.push(left_node(w));
                targets.push(right_node(w));
            } else {
                targets.push(w);
            }
        }

        let target_dist = graph.distance(&sources, &targets, self.config.max_distance);
        for (w_idx, t) in slots {
            let distance = if graph.two_sided() {
                target_dist[t].min(target_dist[t + 1])
            } else {
                target_dist[t]
            };
            results.push((job.original_index(w_idx), distance));
        }
    }
}
