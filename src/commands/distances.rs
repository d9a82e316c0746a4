use crate::config::DistanceConfig;
use crate::graph::{Graph, GraphError};
use crate::graph_distances::GraphDistances;
use crate::parse::{open_reader, parse_edges, parse_links, parse_unitigs, ParseErr, SampleEdgeFiles};
use crate::queries::{output_distances, output_sgg_distances, parse_queries, Queries};
use crate::search_jobs::SearchJobs;
use crate::sgg_distances::{single_genome_graph_distances, SampleEdgeSource};
use log::{info, warn};
use std::io;
use std::time::Instant;

/// Where the searched graph comes from.
#[derive(Debug, Clone)]
pub enum GraphInput {
    /// Ordinary graph from a `v w [weight]` edge list.
    Plain { edges_file: String, one_based: bool },
    /// Compacted de Bruijn graph, optionally with per-genome edge files.
    Cdbg {
        unitigs_file: String,
        edges_file: String,
        kmer_length: usize,
        sgg_paths_file: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct DistancesOptions {
    pub queries_file: String,
    pub n_queries: Option<usize>,
    pub queries_one_based: bool,
    pub output_stem: String,
    pub output_one_based: bool,
    pub run_sggs_only: bool,
    pub config: DistanceConfig,
}

/// Files written by [`run_distances`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistancesOutput {
    pub distances: Option<String>,
    pub sgg_means: Option<String>,
    pub sgg_counts: Option<String>,
}

fn graph_error(e: GraphError) -> io::Error {
    let kind = match e {
        GraphError::InvalidConfig(_) => io::ErrorKind::InvalidInput,
        _ => io::ErrorKind::InvalidData,
    };
    io::Error::new(kind, e.to_string())
}

fn parse_error(path: &str, e: ParseErr) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("Failed to parse '{}': {}", path, e),
    )
}

/// Load the graph. For a compacted de Bruijn graph the unitigs file decides
/// whether the edge files are one-based, which is also returned.
pub fn load_graph(input: &GraphInput) -> io::Result<(Graph, bool)> {
    let start = Instant::now();
    let (graph, one_based) = match input {
        GraphInput::Plain { edges_file, one_based } => {
            let edges = parse_edges(open_reader(edges_file)?, *one_based)
                .map_err(|e| parse_error(edges_file, e))?;
            (Graph::from_edges(&edges).map_err(graph_error)?, *one_based)
        }
        GraphInput::Cdbg {
            unitigs_file,
            edges_file,
            kmer_length,
            ..
        } => {
            let unitigs =
                parse_unitigs(open_reader(unitigs_file)?).map_err(|e| parse_error(unitigs_file, e))?;
            info!(
                "Read {} unitigs ({}-based) from {}",
                unitigs.lengths.len(),
                unitigs.one_based as usize,
                unitigs_file
            );
            let links = parse_links(open_reader(edges_file)?, unitigs.one_based)
                .map_err(|e| parse_error(edges_file, e))?;
            let graph = Graph::from_unitigs(&unitigs.lengths, *kmer_length, &links).map_err(graph_error)?;
            (graph, unitigs.one_based)
        }
    };

    let details = graph.details();
    info!(
        "Constructed graph in {:.2?}: {} connected nodes, {} edges, average degree {:.2}, max degree {}",
        start.elapsed(),
        details.n_nodes,
        details.n_edges,
        details.avg_degree(),
        details.max_degree
    );
    Ok((graph, one_based))
}

pub fn load_queries(opts: &DistancesOptions) -> io::Result<Queries> {
    let queries = parse_queries(
        open_reader(&opts.queries_file)?,
        opts.queries_one_based,
        opts.n_queries,
    )
    .map_err(|e| parse_error(&opts.queries_file, e))?;
    if queries.is_empty() {
        return Err(graph_error(GraphError::NoQueries));
    }
    info!("Read {} queries from {}", queries.len(), opts.queries_file);
    Ok(queries)
}

/// Load the graph and queries, run the requested searches and write the results.
pub fn run_distances(input: &GraphInput, opts: &DistancesOptions) -> io::Result<DistancesOutput> {
    let config = &opts.config;
    config.validate().map_err(graph_error)?;

    let sgg_paths_file = match input {
        GraphInput::Cdbg { sgg_paths_file, .. } => sgg_paths_file.as_deref(),
        GraphInput::Plain { .. } => None,
    };
    if opts.run_sggs_only && sgg_paths_file.is_none() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "Running only single genome graphs requires a single genome graph paths file",
        ));
    }

    let (graph, graphs_one_based) = load_graph(input)?;
    let queries = load_queries(opts)?;

    let search_jobs = SearchJobs::from_queries(queries.pairs());
    info!(
        "Aggregated {} queries into {} search jobs",
        queries.len(),
        search_jobs.len()
    );

    let mut output = DistancesOutput::default();

    if !opts.run_sggs_only {
        let start = Instant::now();
        let distances = GraphDistances::new(&graph, config)
            .solve(&search_jobs)
            .map_err(graph_error)?;
        info!("Calculated distances in the graph in {:.2?}", start.elapsed());
        output.distances = Some(output_distances(
            &opts.output_stem,
            &queries,
            &distances,
            config.max_distance,
            opts.output_one_based,
        )?);
    }

    if let Some(sgg_paths_file) = sgg_paths_file {
        let samples = SampleEdgeFiles::from_manifest(sgg_paths_file, graphs_one_based)?;
        if samples.n_samples() == 0 {
            warn!("No single genome graph paths in {}", sgg_paths_file);
        }
        info!(
            "Calculating distances in {} single genome graphs, {} at a time",
            samples.n_samples(),
            config.n_sggs_in_memory
        );

        let start = Instant::now();
        let sgg_distances =
            single_genome_graph_distances(&graph, &samples, &search_jobs, config).map_err(graph_error)?;
        info!(
            "Calculated distances in single genome graphs in {:.2?}",
            start.elapsed()
        );

        let (means, counts) = output_sgg_distances(
            &opts.output_stem,
            &queries,
            &sgg_distances.distances(),
            &sgg_distances.counts(),
            config.max_distance,
            opts.output_one_based,
        )?;
        output.sgg_means = Some(means);
        output.sgg_counts = Some(counts);
    }

    Ok(output)
}
