//! End-to-end runs of the distances command on small files.

use noodles::bgzf;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::TempDir;
use unitig_distance::commands::distances::{run_distances, DistancesOptions, GraphInput};
use unitig_distance::config::DistanceConfig;

fn write_file(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

fn write_bgzf(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    let mut writer = bgzf::io::Writer::new(fs::File::create(&path).unwrap());
    writer.write_all(contents.as_bytes()).unwrap();
    drop(writer);
    path.to_str().unwrap().to_string()
}

fn options(dir: &Path, queries_file: String, output_one_based: bool) -> DistancesOptions {
    DistancesOptions {
        queries_file,
        n_queries: None,
        queries_one_based: true,
        output_stem: dir.join("out").to_str().unwrap().to_string(),
        output_one_based,
        run_sggs_only: false,
        config: DistanceConfig {
            n_threads: 2,
            block_size: 1,
            ..Default::default()
        },
    }
}

/// Unitigs 1 -> 2 -> 3 of lengths 10, 7 and 5 with k = 3.
fn cdbg_input(dir: &Path, sgg_paths_file: Option<String>) -> GraphInput {
    let unitigs_file = write_file(dir, "unitigs.txt", "1 ACGTACGTAC\n2 ACGTACG\n3 ACGTA\n");
    let edges_file = write_file(dir, "edges.txt", "1 2 FF\n2 3 FF\n");
    GraphInput::Cdbg {
        unitigs_file,
        edges_file,
        kmer_length: 3,
        sgg_paths_file,
    }
}

fn sgg_manifest(dir: &Path) -> String {
    let sample_a = write_file(dir, "sample_a.edges", "1 2 FF\n2 3 FF\n");
    let sample_b = write_bgzf(dir, "sample_b.edges.gz", "1 2 FF\n");
    write_file(dir, "sggs.txt", &format!("{}\n{}\n", sample_a, sample_b))
}

#[test]
fn test_plain_graph() -> io::Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path();

    let edges_file = write_file(dir, "graph.txt", "1 2 2\n2 3 3\n1 3 10\n");
    let queries_file = write_file(dir, "queries.txt", "1 3 0.5 x\n3 1\n1 2\n5 1\n");
    let input = GraphInput::Plain {
        edges_file,
        one_based: true,
    };
    let opts = options(dir, queries_file, false);

    let output = run_distances(&input, &opts)?;
    let path = output.distances.expect("distances written");
    assert!(path.ends_with("out.ud_0_based"));
    assert_eq!(
        fs::read_to_string(&path)?,
        "0 2 5 x\n2 0 5\n0 1 2\n4 0 -1\n"
    );
    assert_eq!(output.sgg_means, None);
    Ok(())
}

#[test]
fn test_plain_graph_cutoff_and_limit() -> io::Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path();

    let edges_file = write_file(dir, "graph.txt", "1 2 2\n2 3 3\n1 3 10\n");
    let queries_file = write_file(dir, "queries.txt", "1 3\n1 2\n2 3\n");
    let input = GraphInput::Plain {
        edges_file,
        one_based: true,
    };
    let mut opts = options(dir, queries_file, true);
    opts.n_queries = Some(2);
    opts.config.max_distance = 4.0;

    let output = run_distances(&input, &opts)?;
    let contents = fs::read_to_string(output.distances.expect("distances written"))?;
    assert_eq!(contents, "1 3 -1\n1 2 2\n");
    Ok(())
}

#[test]
fn test_cdbg_with_single_genome_graphs() -> io::Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path();

    let input = cdbg_input(dir, Some(sgg_manifest(dir)));
    let queries_file = write_file(dir, "queries.txt", "1 2\n1 3\n");
    let opts = options(dir, queries_file, true);

    let output = run_distances(&input, &opts)?;
    // right(1) - left(2) is one link; crossing unitig 2 costs 7 - 3
    assert_eq!(
        fs::read_to_string(output.distances.expect("distances written"))?,
        "1 2 1\n1 3 6\n"
    );
    // Unitig 3 only appears in the first genome
    assert_eq!(
        fs::read_to_string(output.sgg_means.expect("means written"))?,
        "1 2 1\n1 3 6\n"
    );
    assert_eq!(
        fs::read_to_string(output.sgg_counts.expect("counts written"))?,
        "1 2 2\n1 3 1\n"
    );
    Ok(())
}

#[test]
fn test_cdbg_huge_query_ids_get_cutoff() -> io::Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path();

    let input = cdbg_input(dir, Some(sgg_manifest(dir)));
    // One-based 2^63 + 1 is unitig 2^63, whose sides do not fit in usize
    let queries_file = write_file(dir, "queries.txt", "9223372036854775809 2\n1 2\n");
    let opts = options(dir, queries_file, true);

    let output = run_distances(&input, &opts)?;
    assert_eq!(
        fs::read_to_string(output.distances.expect("distances written"))?,
        "9223372036854775809 2 -1\n1 2 1\n"
    );
    assert_eq!(
        fs::read_to_string(output.sgg_counts.expect("counts written"))?,
        "9223372036854775809 2 0\n1 2 2\n"
    );
    Ok(())
}

#[test]
fn test_run_sggs_only() -> io::Result<()> {
    let temp_dir = TempDir::new()?;
    let dir = temp_dir.path();

    let input = cdbg_input(dir, Some(sgg_manifest(dir)));
    let queries_file = write_file(dir, "queries.txt", "2 3\n3 3\n");
    let mut opts = options(dir, queries_file, false);
    opts.run_sggs_only = true;

    let output = run_distances(&input, &opts)?;
    assert_eq!(output.distances, None);
    assert!(!dir.join("out.ud_0_based").exists());
    assert_eq!(
        fs::read_to_string(output.sgg_means.expect("means written"))?,
        "1 2 1\n2 2 0\n"
    );
    assert_eq!(
        fs::read_to_string(output.sgg_counts.expect("counts written"))?,
        "1 2 1\n2 2 1\n"
    );
    Ok(())
}

#[test]
fn test_run_sggs_only_needs_manifest() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();

    let input = cdbg_input(dir, None);
    let queries_file = write_file(dir, "queries.txt", "1 2\n");
    let mut opts = options(dir, queries_file, false);
    opts.run_sggs_only = true;

    let err = run_distances(&input, &opts).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[test]
fn test_invalid_inputs_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    let queries_file = write_file(dir, "queries.txt", "1 2\n");

    // Edge to a unitig that does not exist
    let unitigs_file = write_file(dir, "unitigs.txt", "1 ACGTACGTAC\n2 ACGTACG\n");
    let edges_file = write_file(dir, "edges.txt", "1 4 FF\n");
    let input = GraphInput::Cdbg {
        unitigs_file,
        edges_file,
        kmer_length: 3,
        sgg_paths_file: None,
    };
    let err = run_distances(&input, &options(dir, queries_file.clone(), false)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);

    // Malformed orientation
    let edges_file = write_file(dir, "bad_edges.txt", "1 2 XF\n");
    let input = GraphInput::Cdbg {
        unitigs_file: write_file(dir, "unitigs.txt", "1 ACGTACGTAC\n2 ACGTACG\n"),
        edges_file,
        kmer_length: 3,
        sgg_paths_file: None,
    };
    assert!(run_distances(&input, &options(dir, queries_file.clone(), false)).is_err());

    // No queries
    let input = GraphInput::Plain {
        edges_file: write_file(dir, "graph.txt", "1 2\n"),
        one_based: true,
    };
    let empty_queries = write_file(dir, "empty.txt", "\n");
    let err = run_distances(&input, &options(dir, empty_queries, false)).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);

    // Zero threads
    let mut opts = options(dir, queries_file, false);
    opts.config.n_threads = 0;
    let err = run_distances(&input, &opts).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}
