//! Query lists and result writers.

use crate::parse::{for_each_record, parse_index, ParseErr};
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};

/// Vertex pairs in input order. Columns after `v w value` are kept verbatim and
/// echoed after the result, which takes the place of `value`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Queries {
    pairs: Vec<(usize, usize)>,
    extra: Vec<String>,
}

impl Queries {
    pub fn from_pairs(pairs: Vec<(usize, usize)>) -> Self {
        let extra = vec![String::new(); pairs.len()];
        Self { pairs, extra }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn extra(&self, idx: usize) -> &str {
        &self.extra[idx]
    }

    /// Write `v w distance [extra]`, one line per query. Distances at or above
    /// `max_distance` are written as `-1`.
    pub fn write_distances<W: Write>(
        &self,
        writer: &mut W,
        distances: &[f64],
        max_distance: f64,
        one_based: bool,
    ) -> io::Result<()> {
        self.write_results(writer, distances.len(), one_based, |w, idx| {
            let distance = distances[idx];
            if distance >= max_distance {
                write!(w, "-1")
            } else {
                write!(w, "{}", distance)
            }
        })
    }

    /// Write `v w count [extra]`, one line per query.
    pub fn write_counts<W: Write>(&self, writer: &mut W, counts: &[usize], one_based: bool) -> io::Result<()> {
        self.write_results(writer, counts.len(), one_based, |w, idx| write!(w, "{}", counts[idx]))
    }

    fn write_results<W, F>(&self, writer: &mut W, n_results: usize, one_based: bool, mut value: F) -> io::Result<()>
    where
        W: Write,
        F: FnMut(&mut W, usize) -> io::Result<()>,
    {
        if n_results < self.len() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} results for {} queries", n_results, self.len()),
            ));
        }
        // Widened so that the largest parseable ids still print one-based
        let offset = one_based as u128;
        for (idx, &(v, w)) in self.pairs.iter().enumerate() {
            write!(writer, "{} {} ", v as u128 + offset, w as u128 + offset)?;
            value(writer, idx)?;
            let extra = &self.extra[idx];
            if !extra.is_empty() {
                write!(writer, " {}", extra)?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

/// Queries `v w [value extra...]`. At most `n_queries` lines are read when given.
pub fn parse_queries<R: BufRead>(reader: R, one_based: bool, n_queries: Option<usize>) -> Result<Queries, ParseErr> {
    let mut queries = Queries::default();
    let limit = n_queries.unwrap_or(usize::MAX);
    if limit == 0 {
        return Ok(queries);
    }
    for_each_record(reader, |line, fields| {
        if fields.len() < 2 {
            return Err(ParseErr::NotEnoughFields { line, expected: 2 });
        }
        let v = parse_index(fields[0], line, one_based)?;
        let w = parse_index(fields[1], line, one_based)?;
        queries.pairs.push((v, w));
        queries.extra.push(fields.get(3..).unwrap_or_default().join(" "));
        Ok(queries.len() < limit)
    })?;
    debug!("Parsed {} queries", queries.len());
    Ok(queries)
}

fn create_output(path: &str) -> io::Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to create output file '{}': {}", path, e))
    })?;
    Ok(BufWriter::new(file))
}

fn based_suffix(one_based: bool) -> &'static str {
    if one_based {
        "1_based"
    } else {
        "0_based"
    }
}

/// Distances in the full graph go to `<stem>.ud_{0|1}_based`.
pub fn output_distances(
    stem: &str,
    queries: &Queries,
    distances: &[f64],
    max_distance: f64,
    one_based: bool,
) -> io::Result<String> {
    let path = format!("{}.ud_{}", stem, based_suffix(one_based));
    let mut writer = create_output(&path)?;
    queries.write_distances(&mut writer, distances, max_distance, one_based)?;
    writer.flush()?;
    info!("Wrote distances to {}", path);
    Ok(path)
}

/// Single genome graph means and counts go to `<stem>.ud_sgg_mean_{0|1}_based`
/// and `<stem>.ud_sgg_counts_{0|1}_based`.
pub fn output_sgg_distances(
    stem: &str,
    queries: &Queries,
    means: &[f64],
    counts: &[usize],
    max_distance: f64,
    one_based: bool,
) -> io::Result<(String, String)> {
    let mean_path = format!("{}.ud_sgg_mean_{}", stem, based_suffix(one_based));
    let mut writer = create_output(&mean_path)?;
    queries.write_distances(&mut writer, means, max_distance, one_based)?;
    writer.flush()?;

    let counts_path = format!("{}.ud_sgg_counts_{}", stem, based_suffix(one_based));
    let mut writer = create_output(&counts_path)?;
    queries.write_counts(&mut writer, counts, one_based)?;
    writer.flush()?;

    info!("Wrote single genome graph distances to {} and {}", mean_path, counts_path);
    Ok((mean_path, counts_path))
}
