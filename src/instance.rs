//! DIMACS graph and CNF instances
use crate::error::InstanceError;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::trace;

/// Which pipeline an instance belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InstanceKind {
    /// Maximum clique search on a DIMACS graph
    Graph,
    /// Satisfiability of a DIMACS CNF formula
    Cnf,
}

const GRAPH_CATEGORIES: [&str; 9] = [
    "BROCK", "KELLER", "MANN", "P_HAT", "SAN", "SANR", "C-FAT", "HAMMING", "JOHNSON",
];
const CNF_CATEGORIES: [&str; 6] = ["AIM", "DUBOIS", "PHOLE", "GCP", "PARITY", "JNH"];

impl InstanceKind {
    /// File extensions of instance files, without the dot.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            InstanceKind::Graph => &["clq", "txt"],
            InstanceKind::Cnf => &["cnf"],
        }
    }
    /// Benchmark families recognized in instance paths.
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            InstanceKind::Graph => &GRAPH_CATEGORIES,
            InstanceKind::Cnf => &CNF_CATEGORIES,
        }
    }
    /// Names of the two size metrics reported per instance.
    pub fn size_labels(self) -> [&'static str; 2] {
        match self {
            InstanceKind::Graph => ["Vertices", "Edges"],
            InstanceKind::Cnf => ["Variables", "Clauses"],
        }
    }
    fn is_comment(self, line: &str) -> bool {
        match self {
            InstanceKind::Graph => line.starts_with('c'),
            InstanceKind::Cnf => line.starts_with('c') || line.starts_with('%'),
        }
    }
    fn accepts_format(self, format: &str) -> bool {
        match self {
            InstanceKind::Graph => format == "edge" || format == "col",
            InstanceKind::Cnf => format == "cnf",
        }
    }
}

/// An undirected graph. Edges are unordered pairs of 1-based vertices,
/// kept in the order of their first occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Graph {
    pub vertex_count: usize,
    /// edge count as declared by the header
    pub edge_count: usize,
    pub edges: Vec<(usize, usize)>,
}

/// A formula in conjunctive normal form with 1-based signed literals.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cnf {
    pub variable_count: usize,
    /// clause count as declared by the header
    pub clause_count: usize,
    pub clauses: Vec<Vec<i64>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instance {
    Graph(Graph),
    Cnf(Cnf),
}

impl Instance {
    pub fn kind(&self) -> InstanceKind {
        match self {
            Instance::Graph(_) => InstanceKind::Graph,
            Instance::Cnf(_) => InstanceKind::Cnf,
        }
    }

    /// The declared size metrics: (vertices, edges) or (variables, clauses).
    pub fn size(&self) -> (usize, usize) {
        match self {
            Instance::Graph(g) => (g.vertex_count, g.edge_count),
            Instance::Cnf(f) => (f.variable_count, f.clause_count),
        }
    }

    pub fn load(kind: InstanceKind, path: &Path) -> Result<Instance, InstanceError> {
        let text = fs::read_to_string(path).map_err(|source| InstanceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Instance::parse(kind, &text)
    }

    /// Parse DIMACS text. Declared counts are kept as they are even when
    /// they disagree with the number of parsed edges or clauses.
    pub fn parse(kind: InstanceKind, text: &str) -> Result<Instance, InstanceError> {
        let mut header: Option<(usize, usize)> = None;
        let mut edges: Vec<(usize, u64, u64)> = Vec::new();
        let mut clauses: Vec<(usize, Vec<i64>)> = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw.trim();
            if line.is_empty() || kind.is_comment(line) {
                continue;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens[0] == "p" {
                if header.is_some() {
                    return Err(InstanceError::DuplicateHeader { line: line_no });
                }
                match tokens.get(1) {
                    Some(format) if kind.accepts_format(format) => (),
                    _ => {
                        return Err(InstanceError::UnsupportedFormat {
                            line: line_no,
                            header: line.to_string(),
                        });
                    }
                }
                header = Some((
                    integer(tokens.get(2), line_no)?,
                    integer(tokens.get(3), line_no)?,
                ));
                continue;
            }
            match kind {
                InstanceKind::Graph if tokens[0] == "e" => {
                    if tokens.len() < 3 {
                        return Err(InstanceError::IncompleteEdge { line: line_no });
                    }
                    edges.push((
                        line_no,
                        integer(tokens.get(1), line_no)?,
                        integer(tokens.get(2), line_no)?,
                    ));
                }
                InstanceKind::Graph => trace!("line {}: ignored", line_no),
                InstanceKind::Cnf => {
                    let mut literals = Vec::with_capacity(tokens.len());
                    for token in tokens {
                        let lit: i64 = token.parse().map_err(|_| InstanceError::BadInteger {
                            line: line_no,
                            token: token.to_string(),
                        })?;
                        if lit != 0 {
                            literals.push(lit);
                        }
                    }
                    if !literals.is_empty() {
                        clauses.push((line_no, literals));
                    }
                }
            }
        }
        let (n, m) = header.ok_or(InstanceError::MissingHeader)?;
        match kind {
            InstanceKind::Graph => {
                let mut seen: HashSet<(usize, usize)> = HashSet::new();
                let mut pairs = Vec::with_capacity(edges.len());
                for (line, u, v) in edges {
                    let u = in_range(u, n, line)?;
                    let v = in_range(v, n, line)?;
                    if seen.insert((u.min(v), u.max(v))) {
                        pairs.push((u, v));
                    }
                }
                Ok(Instance::Graph(Graph {
                    vertex_count: n,
                    edge_count: m,
                    edges: pairs,
                }))
            }
            InstanceKind::Cnf => {
                let mut body = Vec::with_capacity(clauses.len());
                for (line, clause) in clauses {
                    for lit in &clause {
                        in_range(lit.unsigned_abs(), n, line)?;
                    }
                    body.push(clause);
                }
                Ok(Instance::Cnf(Cnf {
                    variable_count: n,
                    clause_count: m,
                    clauses: body,
                }))
            }
        }
    }
}

fn integer<T: std::str::FromStr>(token: Option<&&str>, line: usize) -> Result<T, InstanceError> {
    match token {
        Some(t) => t.parse().map_err(|_| InstanceError::BadInteger {
            line,
            token: t.to_string(),
        }),
        None => Err(InstanceError::BadInteger {
            line,
            token: String::new(),
        }),
    }
}

fn in_range(index: u64, limit: usize, line: usize) -> Result<usize, InstanceError> {
    if 1 <= index && index <= limit as u64 {
        Ok(index as usize)
    } else {
        Err(InstanceError::IndexOutOfRange { line, index, limit })
    }
}

/// The benchmark family of an instance: the first path component naming
/// a known family, or `UNKNOWN`.
pub fn category(kind: InstanceKind, path: &Path) -> String {
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .map(|part| part.to_uppercase())
        .find(|part| kind.categories().contains(&part.as_str()))
        .unwrap_or_else(|| "UNKNOWN".to_string())
}
