//! Text loaders for graph, unitig, query and manifest files.
//!
//! Every file may be plain text or BGZF-compressed (`.gz`/`.bgz`). Fields are
//! whitespace-separated; blank lines are skipped.

use crate::graph::{link_sides, GraphError};
use crate::sgg_distances::SampleEdgeSource;
use log::debug;
use noodles::bgzf;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Error as IoError};

#[derive(Debug)]
pub enum ParseErr {
    NotEnoughFields { line: usize, expected: usize },
    IoError(IoError),
    InvalidField { line: usize, field: String },
    InvalidOrientation { line: usize, orientation: String },
    InvalidFormat(String),
}

impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErr::NotEnoughFields { line, expected } => {
                write!(f, "Not enough fields on line {} (expected at least {})", line, expected)
            }
            ParseErr::IoError(e) => write!(f, "IO error: {}", e),
            ParseErr::InvalidField { line, field } => {
                write!(f, "Invalid field '{}' on line {}", field, line)
            }
            ParseErr::InvalidOrientation { line, orientation } => write!(
                f,
                "Invalid edge orientation '{}' on line {} (expected FF, FR, RF or RR)",
                orientation, line
            ),
            ParseErr::InvalidFormat(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ParseErr {}

impl From<IoError> for ParseErr {
    fn from(e: IoError) -> Self {
        ParseErr::IoError(e)
    }
}

/// Open a file for line reading, going through a BGZF reader for `.gz`/`.bgz`.
pub fn open_reader(path: &str) -> io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to open file '{}': {}", path, e))
    })?;
    if [".gz", ".bgz"].iter().any(|e| path.ends_with(e)) {
        Ok(Box::new(bgzf::io::Reader::new(file)))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Iterate over non-blank lines as `(line_number, fields)`, line numbers 1-based.
pub(crate) fn for_each_record<R, F>(reader: R, mut f: F) -> Result<(), ParseErr>
where
    R: BufRead,
    F: FnMut(usize, &[&str]) -> Result<bool, ParseErr>,
{
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if !f(i + 1, &fields)? {
            break;
        }
    }
    Ok(())
}

pub(crate) fn parse_index(field: &str, line: usize, one_based: bool) -> Result<usize, ParseErr> {
    let value = field.parse::<usize>().map_err(|_| ParseErr::InvalidField {
        line,
        field: field.to_string(),
    })?;
    if one_based {
        value.checked_sub(1).ok_or_else(|| ParseErr::InvalidField {
            line,
            field: field.to_string(),
        })
    } else {
        Ok(value)
    }
}

/// A unitig id whose two-sided indices fit in `usize`.
fn parse_unitig_index(field: &str, line: usize, one_based: bool) -> Result<usize, ParseErr> {
    let id = parse_index(field, line, one_based)?;
    if id > usize::MAX / 2 {
        return Err(ParseErr::InvalidField {
            line,
            field: field.to_string(),
        });
    }
    Ok(id)
}

/// Plain graph edges: `v w [weight]`. A missing or non-numeric weight means 1.0.
pub fn parse_edges<R: BufRead>(reader: R, one_based: bool) -> Result<Vec<(usize, usize, f64)>, ParseErr> {
    let mut edges = Vec::new();
    for_each_record(reader, |line, fields| {
        if fields.len() < 2 {
            return Err(ParseErr::NotEnoughFields { line, expected: 2 });
        }
        let v = parse_index(fields[0], line, one_based)?;
        let w = parse_index(fields[1], line, one_based)?;
        let weight = fields
            .get(2)
            .and_then(|s| s.parse::<f64>().ok())
            .unwrap_or(1.0);
        edges.push((v, w, weight));
        Ok(true)
    })?;
    debug!("Parsed {} edges", edges.len());
    Ok(edges)
}

/// Unitigs as read from an `id sequence` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unitigs {
    pub lengths: Vec<usize>,
    /// Decided by the first line: id `1` means one-based numbering.
    pub one_based: bool,
}

pub fn parse_unitigs<R: BufRead>(reader: R) -> Result<Unitigs, ParseErr> {
    let mut lengths = Vec::new();
    let mut one_based = false;
    for_each_record(reader, |line, fields| {
        if fields.len() < 2 {
            return Err(ParseErr::NotEnoughFields { line, expected: 2 });
        }
        if lengths.is_empty() {
            one_based = fields[0] == "1";
        }
        lengths.push(fields[1].len());
        Ok(true)
    })?;
    Ok(Unitigs { lengths, one_based })
}

fn parse_orientation(field: &str, line: usize) -> Result<(bool, bool), ParseErr> {
    let bytes = field.as_bytes();
    let side = |c: u8| match c {
        b'F' => Some(true),
        b'R' => Some(false),
        _ => None,
    };
    match bytes {
        [a, b] => match (side(*a), side(*b)) {
            (Some(from_forward), Some(to_forward)) => Ok((from_forward, !to_forward)),
            _ => Err(ParseErr::InvalidOrientation {
                line,
                orientation: field.to_string(),
            }),
        },
        _ => Err(ParseErr::InvalidOrientation {
            line,
            orientation: field.to_string(),
        }),
    }
}

/// Compacted de Bruijn graph links: `id1 id2 XY [overlap]`, returned as two-sided
/// index pairs. Links whose overlap flag is `0` are skipped.
pub fn parse_links<R: BufRead>(reader: R, one_based: bool) -> Result<Vec<(usize, usize)>, ParseErr> {
    let mut links = Vec::new();
    for_each_record(reader, |line, fields| {
        if fields.len() < 3 {
            return Err(ParseErr::NotEnoughFields { line, expected: 3 });
        }
        if let Some(overlap) = fields.get(3) {
            let overlap = overlap.parse::<i64>().map_err(|_| ParseErr::InvalidField {
                line,
                field: overlap.to_string(),
            })?;
            if overlap == 0 {
                return Ok(true);
            }
        }
        let v = parse_unitig_index(fields[0], line, one_based)?;
        let w = parse_unitig_index(fields[1], line, one_based)?;
        let (from_forward, to_reverse) = parse_orientation(fields[2], line)?;
        links.push(link_sides(v, w, from_forward, to_reverse));
        Ok(true)
    })?;
    Ok(links)
}

/// One path per line.
pub fn parse_path_list<R: BufRead>(reader: R) -> Result<Vec<String>, ParseErr> {
    let mut paths = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let path = line.trim();
        if !path.is_empty() {
            paths.push(path.to_string());
        }
    }
    Ok(paths)
}

/// Per-genome cdBG edge files listed in a manifest, loaded lazily one genome at a time.
#[derive(Debug, Clone)]
pub struct SampleEdgeFiles {
    paths: Vec<String>,
    one_based: bool,
}

impl SampleEdgeFiles {
    pub fn new(paths: Vec<String>, one_based: bool) -> Self {
        Self { paths, one_based }
    }

    pub fn from_manifest(manifest: &str, one_based: bool) -> io::Result<Self> {
        let paths = parse_path_list(open_reader(manifest)?).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Failed to read '{}': {}", manifest, e),
            )
        })?;
        debug!("Read {} single genome graph paths from {}", paths.len(), manifest);
        Ok(Self::new(paths, one_based))
    }
}

impl SampleEdgeSource for SampleEdgeFiles {
    fn n_samples(&self) -> usize {
        self.paths.len()
    }

    fn load(&self, sample: usize) -> Result<Vec<(usize, usize)>, GraphError> {
        let path = &self.paths[sample];
        let reader = open_reader(path).map_err(ParseErr::IoError)?;
        let links = parse_links(reader, self.one_based).map_err(|e| {
            ParseErr::InvalidFormat(format!("Failed to parse '{}': {}", path, e))
        })?;
        Ok(links)
    }
}
