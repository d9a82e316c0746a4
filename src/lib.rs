pub mod commands;
pub mod config;
pub mod distance;
pub mod graph;
pub mod graph_distances;
pub mod parse;
pub mod queries;
pub mod search_jobs;
pub mod sgg_distances;
pub mod single_genome_graph;
