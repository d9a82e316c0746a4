use rustc_hash::FxHashMap;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

/// Distance queries answered by one search from `v`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchJob {
    v: usize,
    ws: Vec<usize>,
    original_indices: Vec<usize>,
}

impl SearchJob {
    pub fn new(v: usize) -> Self {
        Self {
            v,
            ws: Vec::new(),
            original_indices: Vec::new(),
        }
    }

    pub fn v(&self) -> usize {
        self.v
    }

    pub fn ws(&self) -> &[usize] {
        &self.ws
    }

    pub fn original_index(&self, idx: usize) -> usize {
        self.original_indices[idx]
    }

    pub fn original_indices(&self) -> &[usize] {
        &self.original_indices
    }

    pub fn add(&mut self, w: usize, original_index: usize) {
        self.ws.push(w);
        self.original_indices.push(original_index);
    }

    pub fn len(&self) -> usize {
        self.ws.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ws.is_empty()
    }
}

/// Deduplicated single-source search jobs covering a batch of pairwise queries.
///
/// Jobs are formed greedily: the vertex with the most unanswered queries (ties
/// go to the smallest vertex) becomes a source for all of its remaining
/// queries, which are then struck from the other endpoints. Each query's
/// original index ends up in exactly one job.
#[derive(Debug, Clone, Default)]
pub struct SearchJobs {
    jobs: Vec<SearchJob>,
    n_queries: usize,
}

impl SearchJobs {
    /// Queries indexed by their position.
    pub fn from_queries(queries: &[(usize, usize)]) -> Self {
        let indexed: Vec<(usize, usize, usize)> = queries
            .iter()
            .enumerate()
            .map(|(idx, &(v, w))| (v, w, idx))
            .collect();
        Self::from_indexed(&indexed)
    }

    /// Queries given as `(v, w, original_index)`.
    pub fn from_indexed(queries: &[(usize, usize, usize)]) -> Self {
        // v -> (w -> original indices), both directions of every query
        let mut queries_map: FxHashMap<usize, BTreeMap<usize, Vec<usize>>> = FxHashMap::default();
        for &(v, w, idx) in queries {
            queries_map.entry(v).or_default().entry(w).or_default().push(idx);
            if v != w {
                queries_map.entry(w).or_default().entry(v).or_default().push(idx);
            }
        }

        let mut n_queries: FxHashMap<usize, usize> = FxHashMap::default();
        let mut by_count: BTreeSet<(usize, Reverse<usize>)> = BTreeSet::new();
        for (&v, ws) in &queries_map {
            let count = ws.values().map(Vec::len).sum();
            n_queries.insert(v, count);
            by_count.insert((count, Reverse(v)));
        }

        let mut jobs = Vec::new();
        while let Some((_, Reverse(v))) = by_count.pop_last() {
            n_queries.remove(&v);
            let remaining = queries_map.remove(&v).unwrap_or_default();
            let mut job = SearchJob::new(v);
            for (w, indices) in remaining {
                for &idx in &indices {
                    job.add(w, idx);
                }
                if w == v {
                    continue;
                }
                // (w, v) is answered by this job
                if let Some(w_queries) = queries_map.get_mut(&w) {
                    w_queries.remove(&v);
                }
                if let Some(count) = n_queries.get_mut(&w) {
                    by_count.remove(&(*count, Reverse(w)));
                    *count -= indices.len();
                    if *count > 0 {
                        by_count.insert((*count, Reverse(w)));
                    }
                }
            }
            jobs.push(job);
        }

        Self {
            jobs,
            n_queries: queries.iter().map(|&(_, _, idx)| idx + 1).max().unwrap_or(0),
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Number of result slots, one past the largest original index.
    pub fn n_queries(&self) -> usize {
        self.n_queries
    }

    pub fn get(&self, idx: usize) -> &SearchJob {
        &self.jobs[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SearchJob> {
        self.jobs.iter()
    }
}
