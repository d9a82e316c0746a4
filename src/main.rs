use clap::Parser;
use log::{info, warn};
use std::io;
use std::num::NonZeroUsize;
use unitig_distance::commands::distances::{run_distances, DistancesOptions, GraphInput};
use unitig_distance::config::DistanceConfig;

/// Common options shared between all commands
#[derive(Parser, Debug)]
struct CommonOpts {
    /// Path to the queries file (`v w [extra columns...]`, one query per line).
    #[clap(short = 'Q', long, value_parser)]
    queries_file: String,

    /// Read at most this many queries.
    #[clap(short = 'n', long, value_parser)]
    n_queries: Option<usize>,

    /// Vertex indices in the queries file start from 1.
    #[clap(long, action)]
    queries_one_based: bool,

    /// Stem of the output files.
    #[clap(short = 'o', long, value_parser, default_value = "out")]
    output_stem: String,

    /// Write vertex indices starting from 1.
    #[clap(long, action)]
    output_one_based: bool,

    /// Number of search jobs per block; threads are joined between blocks.
    #[clap(short = 'b', long, value_parser, default_value_t = NonZeroUsize::new(50000).unwrap())]
    block_size: NonZeroUsize,

    /// Maximum distance searched; longer distances are written as -1.
    #[clap(short = 'd', long, value_parser)]
    max_distance: Option<f64>,

    /// Number of threads for parallel processing.
    #[clap(short = 't', long, value_parser, default_value_t = NonZeroUsize::new(1).unwrap())]
    threads: NonZeroUsize,

    /// Verbosity level (0 = error, 1 = info, 2 = debug)
    #[clap(short, long, default_value = "0")]
    verbose: u8,
}

/// Shortest-path distances between vertex pairs in (compacted de Bruijn) graphs.
#[derive(Parser, Debug)]
#[command(author, version, about, disable_help_subcommand = true)]
enum Args {
    /// Distances in an ordinary weighted graph
    Graph {
        #[clap(flatten)]
        common: CommonOpts,

        /// Path to the edges file (`v w [weight]`).
        #[clap(short = 'E', long, value_parser)]
        edges_file: String,

        /// Vertex indices in the edges file start from 1.
        #[clap(long, action)]
        graphs_one_based: bool,
    },
    /// Distances in a compacted de Bruijn graph and, optionally, its single genome graphs
    Cdbg {
        #[clap(flatten)]
        common: CommonOpts,

        /// Path to the unitigs file (`id sequence`).
        #[clap(short = 'U', long, value_parser)]
        unitigs_file: String,

        /// Path to the edges file (`id1 id2 XY [overlap]`).
        #[clap(short = 'E', long, value_parser)]
        edges_file: String,

        /// k-mer length of the graph.
        #[clap(short = 'k', long, value_parser)]
        k_mer_length: usize,

        /// Path to a file listing one single genome graph edges file per line.
        #[clap(short = 'S', long, value_parser)]
        sgg_paths_file: Option<String>,

        /// Only calculate distances in the single genome graphs.
        #[clap(short = 'r', long, action)]
        run_sggs_only: bool,

        /// Number of single genome graphs constructed and kept in memory at once.
        #[clap(short = 'm', long, value_parser, default_value_t = NonZeroUsize::new(1).unwrap())]
        sggs_in_memory: NonZeroUsize,
    },
}

fn main() -> io::Result<()> {
    let args = Args::parse();

    match args {
        Args::Graph {
            common,
            edges_file,
            graphs_one_based,
        } => {
            let opts = initialize(&common, false, 1);
            let input = GraphInput::Plain {
                edges_file,
                one_based: graphs_one_based,
            };
            run_distances(&input, &opts)?;
        }
        Args::Cdbg {
            common,
            unitigs_file,
            edges_file,
            k_mer_length,
            sgg_paths_file,
            run_sggs_only,
            sggs_in_memory,
        } => {
            let opts = initialize(&common, run_sggs_only, sggs_in_memory.get());
            let input = GraphInput::Cdbg {
                unitigs_file,
                edges_file,
                kmer_length: k_mer_length,
                sgg_paths_file,
            };
            run_distances(&input, &opts)?;
        }
    }

    Ok(())
}

fn initialize(common: &CommonOpts, run_sggs_only: bool, n_sggs_in_memory: usize) -> DistancesOptions {
    // Initialize logger based on verbosity
    env_logger::Builder::new()
        .filter_level(match common.verbose {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let n_threads = common.threads.get();
    let n_cpus = num_cpus::get();
    if n_threads > n_cpus {
        warn!(
            "Using {} threads on a machine with {} logical CPUs",
            n_threads, n_cpus
        );
    }
    info!("Using {} threads", n_threads);

    DistancesOptions {
        queries_file: common.queries_file.clone(),
        n_queries: common.n_queries,
        queries_one_based: common.queries_one_based,
        output_stem: common.output_stem.clone(),
        output_one_based: common.output_one_based,
        run_sggs_only,
        config: DistanceConfig {
            n_threads,
            block_size: common.block_size.get(),
            max_distance: common.max_distance.unwrap_or(f64::MAX),
            n_sggs_in_memory,
        },
    }
}
