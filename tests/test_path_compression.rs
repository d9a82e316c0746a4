//! Distances stitched together in compressed single genome graphs must match
//! plain searches in the uncompressed edge-induced subgraphs.

use unitig_distance::config::DistanceConfig;
use unitig_distance::graph::{left_node, link_sides, right_node, Graph};
use unitig_distance::search_jobs::SearchJobs;
use unitig_distance::sgg_distances::{single_genome_graph_distances, SingleGenomeGraphDistances};
use unitig_distance::single_genome_graph::SingleGenomeGraph;

struct Lcg(u64);

impl Lcg {
    fn next(&mut self, n: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) % n as u64) as usize
    }

    fn coin(&mut self) -> bool {
        self.next(2) == 1
    }
}

fn random_cdbg(rng: &mut Lcg, n_unitigs: usize, n_links: usize) -> (Graph, Vec<(usize, usize)>) {
    let lengths: Vec<usize> = (0..n_unitigs).map(|_| 3 + rng.next(18)).collect();
    let mut links = Vec::new();
    while links.len() < n_links {
        let v = rng.next(n_unitigs);
        let w = rng.next(n_unitigs);
        if v != w {
            links.push(link_sides(v, w, rng.coin(), rng.coin()));
        }
    }
    let graph = Graph::from_unitigs(&lengths, 3, &links).unwrap();
    (graph, links)
}

fn two_sided_distance(graph: &Graph, v: usize, w: usize) -> f64 {
    let sources = [(left_node(v), 0.0), (right_node(v), 0.0)];
    let targets = [left_node(w), right_node(w)];
    let res = graph.distance(&sources, &targets, f64::MAX);
    res[0].min(res[1])
}

#[test]
fn test_random_cdbg_samples_match_subgraph() {
    let mut rng = Lcg(0x9e37_79b9_7f4a_7c15);
    let config = DistanceConfig::default();

    for _ in 0..40 {
        let n_unitigs = 4 + rng.next(10);
        let n_links = n_unitigs + rng.next(2 * n_unitigs);
        let (cdbg, links) = random_cdbg(&mut rng, n_unitigs, n_links);

        let mut sample: Vec<(usize, usize)> = links.iter().copied().filter(|_| rng.next(3) > 0).collect();
        if sample.is_empty() {
            sample.push(links[0]);
        }

        let subgraph = cdbg.edge_induced_subgraph(&sample).unwrap();
        let sgg = SingleGenomeGraph::new(&cdbg, &sample).unwrap();
        assert!(sgg.size() <= subgraph.size());
        let sggd = SingleGenomeGraphDistances::new(&sgg, &config);

        for v in 0..n_unitigs {
            for w in 0..n_unitigs {
                if !sgg.contains_vertex(v) || !sgg.contains_vertex(w) {
                    assert_eq!(sggd.distance(v, w), f64::MAX);
                    continue;
                }
                let expected = two_sided_distance(&subgraph, v, w);
                assert_eq!(sggd.distance(v, w), expected, "unitigs {} and {}", v, w);
            }
        }
    }
}

#[test]
fn test_random_plain_graphs_match() {
    let mut rng = Lcg(42);
    let config = DistanceConfig::default();

    for _ in 0..40 {
        let n = 5 + rng.next(20);
        // Long chains with a few shortcuts, so most vertices end up inside paths
        let mut edges: Vec<(usize, usize, f64)> =
            (0..n - 1).map(|v| (v, v + 1, (1 + rng.next(5)) as f64)).collect();
        for _ in 0..rng.next(4) {
            let v = rng.next(n);
            let w = rng.next(n);
            edges.push((v, w, (1 + rng.next(9)) as f64));
        }
        let graph = Graph::from_edges(&edges).unwrap();
        let sgg = SingleGenomeGraph::compress(&graph).unwrap();
        let sggd = SingleGenomeGraphDistances::new(&sgg, &config);

        for v in 0..n {
            for w in 0..n {
                assert_eq!(
                    sggd.distance(v, w),
                    graph.distance_between(v, w, f64::MAX),
                    "vertices {} and {}",
                    v,
                    w
                );
            }
        }
    }
}

#[test]
fn test_cycles_and_lollipops() {
    let config = DistanceConfig::default();
    let graphs = [
        // Pure cycle
        vec![(0, 1, 1.0), (1, 2, 2.0), (2, 3, 3.0), (3, 4, 4.0), (4, 0, 5.0)],
        // Loop hanging off a tail
        vec![(0, 1, 2.0), (1, 2, 1.0), (2, 3, 1.0), (3, 4, 1.0), (4, 1, 6.0)],
        // Two loops sharing a vertex
        vec![(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0), (0, 3, 3.0), (3, 4, 1.0), (4, 0, 2.0)],
    ];
    for edges in graphs.iter() {
        let graph = Graph::from_edges(edges).unwrap();
        let sgg = SingleGenomeGraph::compress(&graph).unwrap();
        let sggd = SingleGenomeGraphDistances::new(&sgg, &config);
        for v in 0..graph.size() {
            for w in 0..graph.size() {
                assert_eq!(sggd.distance(v, w), graph.distance_between(v, w, f64::MAX));
                assert_eq!(sggd.distance(v, w), sggd.distance(w, v));
            }
        }
    }
}

#[test]
fn test_accumulated_results_independent_of_batching() {
    let mut rng = Lcg(7);
    let n_unitigs = 12;
    let (cdbg, links) = random_cdbg(&mut rng, n_unitigs, 20);
    let samples: Vec<Vec<(usize, usize)>> = (0..7)
        .map(|i| links.iter().copied().skip(i % 3).filter(|_| rng.next(4) > 0).collect())
        .filter(|sample: &Vec<(usize, usize)>| !sample.is_empty())
        .collect();
    let queries: Vec<(usize, usize)> = (0..40).map(|_| (rng.next(n_unitigs), rng.next(n_unitigs))).collect();
    let jobs = SearchJobs::from_queries(&queries);

    let run = |n_threads, block_size, n_sggs_in_memory| {
        let config = DistanceConfig {
            n_threads,
            block_size,
            max_distance: f64::MAX,
            n_sggs_in_memory,
        };
        single_genome_graph_distances(&cdbg, samples.as_slice(), &jobs, &config).unwrap()
    };

    let baseline = run(1, 50000, 1);
    for (n_threads, block_size, n_sggs_in_memory) in [(2, 1, 2), (4, 3, 3), (3, 100, 7)] {
        let res = run(n_threads, block_size, n_sggs_in_memory);
        assert_eq!(res.counts(), baseline.counts());
        for (a, b) in res.distances().iter().zip(baseline.distances()) {
            assert!((a - b).abs() <= 1e-9 * b.abs().max(1.0), "{} != {}", a, b);
        }
    }

    // Count never exceeds the number of genomes
    assert!(baseline.counts().iter().all(|&c| c <= samples.len()));
}
