//! Translation of instances into URSA initialization code
//!
//! The generated text is fully determined by the instance, the template
//! and the [`InitStyle`]: matrix cells are initialized in row-major order,
//! then one assignment is emitted per edge direction or literal occurrence
//! in input order, then the template follows after a blank line.
use crate::PROGRAM_EXTENSION;
use crate::instance::{Cnf, Graph, Instance};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// How the "all false" preamble of a matrix is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InitStyle {
    /// one assignment per cell
    #[default]
    Unrolled,
    /// a nested `for` loop over the matrix
    Loop,
}

/// A complete URSA program: initialization code followed by a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedProgram(String);

impl GeneratedProgram {
    pub fn as_str(&self) -> &str {
        &self.0
    }
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
    pub fn into_string(self) -> String {
        self.0
    }
}

pub fn generate(instance: &Instance, template: &str, style: InitStyle) -> GeneratedProgram {
    let mut code = match instance {
        Instance::Graph(g) => graph_code(g, style),
        Instance::Cnf(f) => cnf_code(f, style),
    };
    code.push('\n');
    code.push_str(template);
    code.push('\n');
    GeneratedProgram(code)
}

/// Upper bound of the up-front reservation for a program.
const MAX_RESERVE: usize = 1 << 26;

/// Bytes to reserve: `per_line` for every preamble cell (unrolled only) and
/// every assignment that follows, capped at [`MAX_RESERVE`].
fn reserve(style: InitStyle, cells: usize, assignments: usize, per_line: usize) -> usize {
    let cells = match style {
        InitStyle::Unrolled => cells,
        InitStyle::Loop => 0,
    };
    per_line
        .saturating_mul(cells.saturating_add(assignments))
        .min(MAX_RESERVE)
        + 256
}

// writing into a String cannot fail
fn graph_code(g: &Graph, style: InitStyle) -> String {
    let n = g.vertex_count;
    let mut code = String::with_capacity(reserve(
        style,
        n.saturating_mul(n),
        g.edges.len().saturating_mul(2),
        32,
    ));
    let _ = writeln!(code, "nN = {};", n);
    code.push_str("\n// Initialize adjacency matrix\n");
    match style {
        InitStyle::Unrolled => {
            for i in 0..n {
                for j in 0..n {
                    let _ = writeln!(code, "bEdge[{}][{}] = false;", i, j);
                }
            }
        }
        InitStyle::Loop => code.push_str(
            "for(i=0; i<nN; i++) {\n    for(j=0; j<nN; j++) {\n        bEdge[i][j] = false;\n    }\n}\n",
        ),
    }
    code.push_str("\n// Add edges (convert from 1-indexed to 0-indexed)\n");
    for &(u, v) in &g.edges {
        let _ = writeln!(code, "bEdge[{}][{}] = true;", u - 1, v - 1);
        let _ = writeln!(code, "bEdge[{}][{}] = true;", v - 1, u - 1);
    }
    code
}

fn cnf_code(f: &Cnf, style: InitStyle) -> String {
    let width = f.variable_count.saturating_mul(2);
    let rows = f.clause_count.max(f.clauses.len());
    let occurrences: usize = f.clauses.iter().map(Vec::len).sum();
    let mut code = String::with_capacity(reserve(
        style,
        rows.saturating_mul(width),
        occurrences,
        24,
    ));
    let _ = writeln!(code, "nN = {};", f.variable_count);
    let _ = writeln!(code, "nClauses = {};", f.clause_count);
    code.push('\n');
    match style {
        InitStyle::Unrolled => {
            for i in 0..rows {
                for j in 0..width {
                    let _ = writeln!(code, "bC[{}][{}] = false;", i, j);
                }
            }
        }
        // rows may exceed the declared nClauses
        InitStyle::Loop => {
            let _ = write!(
                code,
                "for(ni=0; ni<{}; ni++) {{\n    for(nj=0; nj<2*nN; nj++) {{\n        bC[ni][nj] = false;\n    }}\n}}\n",
                rows
            );
        }
    }
    code.push('\n');
    for (i, clause) in f.clauses.iter().enumerate() {
        for &lit in clause {
            // variable k (0-based) owns slots 2k (positive) and 2k+1 (negative)
            let var = lit.unsigned_abs() - 1;
            let slot = 2 * var + u64::from(lit < 0);
            let _ = writeln!(code, "bC[{}][{}] = true;", i, slot);
        }
    }
    code
}

/// File name of a saved program: `<stem><suffix>.urs`.
pub fn program_file_name(instance_path: &Path, suffix: &str) -> String {
    let stem = instance_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    format!("{}{}.{}", stem, suffix, PROGRAM_EXTENSION)
}

/// Write a program next to its siblings in `dir`, returning the new path.
pub fn save(
    program: &GeneratedProgram,
    instance_path: &Path,
    dir: &Path,
    suffix: &str,
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(program_file_name(instance_path, suffix));
    fs::write(&path, program.as_bytes())?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::InstanceKind;

    fn graph(text: &str) -> Instance {
        Instance::parse(InstanceKind::Graph, text).unwrap()
    }

    fn count(code: &str, suffix: &str) -> usize {
        code.lines().filter(|l| l.ends_with(suffix)).count()
    }

    #[test]
    fn small_graph_program() {
        let p = generate(&graph("p edge 3 2\ne 1 2\ne 2 3"), "solve();", InitStyle::Unrolled);
        let code = p.as_str();
        assert!(code.starts_with("nN = 3;\n"));
        assert_eq!(count(code, "= false;"), 9);
        let trues: Vec<&str> = code.lines().filter(|l| l.ends_with("= true;")).collect();
        assert_eq!(
            trues,
            vec![
                "bEdge[0][1] = true;",
                "bEdge[1][0] = true;",
                "bEdge[1][2] = true;",
                "bEdge[2][1] = true;",
            ]
        );
        assert!(code.ends_with("bEdge[2][1] = true;\n\nsolve();\n"));
    }

    #[test]
    fn edges_are_symmetric() {
        let g = graph("p edge 5 4\ne 1 5\ne 2 3\ne 4 1\ne 3 3\n");
        let code = generate(&g, "", InitStyle::Unrolled).into_string();
        let Instance::Graph(g) = g else { unreachable!() };
        for (u, v) in g.edges {
            assert!(code.contains(&format!("bEdge[{}][{}] = true;", u - 1, v - 1)));
            assert!(code.contains(&format!("bEdge[{}][{}] = true;", v - 1, u - 1)));
        }
        assert!(!code.contains("bEdge[0][1] = true;"));
        // initialization precedes every edge and runs row-major
        let first_true = code.find("= true;").unwrap();
        let last_false = code.rfind("= false;").unwrap();
        assert!(last_false < first_true);
        assert!(code.find("bEdge[0][4] = false;") < code.find("bEdge[1][0] = false;"));
    }

    #[test]
    fn generation_is_deterministic() {
        let g = graph("p edge 6 5\ne 6 1\ne 2 5\ne 3 4\ne 1 2\ne 5 6\n");
        let a = generate(&g, "tmpl", InitStyle::Unrolled);
        let b = generate(&g, "tmpl", InitStyle::Unrolled);
        assert_eq!(a.as_bytes(), b.as_bytes());
        let f = Instance::parse(InstanceKind::Cnf, "p cnf 3 2\n1 -2 0\n-3 2 1 0\n").unwrap();
        assert_eq!(
            generate(&f, "tmpl", InitStyle::Loop),
            generate(&f, "tmpl", InitStyle::Loop)
        );
    }

    #[test]
    fn small_cnf_program() {
        let f = Instance::parse(InstanceKind::Cnf, "p cnf 2 1\n1 -2 0").unwrap();
        let code = generate(&f, "solve();", InitStyle::Unrolled).into_string();
        assert!(code.starts_with("nN = 2;\nnClauses = 1;\n"));
        for j in 0..4 {
            assert!(code.contains(&format!("bC[0][{}] = false;", j)));
        }
        assert_eq!(count(&code, "= false;"), 4);
        let trues: Vec<&str> = code.lines().filter(|l| l.ends_with("= true;")).collect();
        assert_eq!(trues, vec!["bC[0][0] = true;", "bC[0][3] = true;"]);
        assert!(code.ends_with("\n\nsolve();\n"));
    }

    #[test]
    fn cnf_rows_cover_declared_clauses() {
        let f = Instance::parse(InstanceKind::Cnf, "p cnf 1 3\n1 0\n").unwrap();
        let code = generate(&f, "", InitStyle::Unrolled).into_string();
        assert_eq!(count(&code, "= false;"), 6);
        assert!(code.contains("bC[2][1] = false;"));
    }

    #[test]
    fn loop_preamble() {
        let code = generate(&graph("p edge 3 1\ne 1 3\n"), "T", InitStyle::Loop).into_string();
        assert!(code.contains("for(i=0; i<nN; i++) {"));
        assert_eq!(count(&code, "= false;"), 1);
        assert_eq!(count(&code, "= true;"), 2);
    }

    #[test]
    fn loop_preamble_covers_undeclared_clauses() {
        let f = Instance::parse(InstanceKind::Cnf, "p cnf 1 1\n1 0\n-1 0\n").unwrap();
        let code = generate(&f, "", InitStyle::Loop).into_string();
        assert!(code.starts_with("nN = 1;\nnClauses = 1;\n"));
        assert!(code.contains("for(ni=0; ni<2; ni++) {"));
        assert!(code.contains("bC[1][1] = true;"));
    }

    #[test]
    fn loop_preamble_for_huge_declared_sizes() {
        let g = graph("p edge 4294967296 0\n");
        let code = generate(&g, "T", InitStyle::Loop).into_string();
        assert!(code.starts_with("nN = 4294967296;\n"));
        assert!(code.len() < 1024);
        let g = graph("p edge 200000 1\ne 1 200000\n");
        let code = generate(&g, "T", InitStyle::Loop).into_string();
        assert!(code.contains("bEdge[199999][0] = true;"));
        let f = Instance::parse(InstanceKind::Cnf, "p cnf 4294967296 4294967296\n1 0\n").unwrap();
        let code = generate(&f, "T", InitStyle::Loop).into_string();
        assert!(code.contains("ni<4294967296;"));
        assert!(code.len() < 1024);
    }

    #[test]
    fn reservation_is_bounded() {
        assert_eq!(reserve(InitStyle::Loop, usize::MAX, 3, 32), 32 * 3 + 256);
        assert_eq!(reserve(InitStyle::Unrolled, usize::MAX, 0, 32), MAX_RESERVE + 256);
        assert_eq!(reserve(InitStyle::Unrolled, 9, 4, 32), 32 * 13 + 256);
    }

    #[test]
    fn saved_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let p = generate(&graph("p edge 2 1\ne 1 2\n"), "T", InitStyle::Unrolled);
        let path = save(&p, Path::new("in/brock200_1.clq"), dir.path(), "_reduction").unwrap();
        assert_eq!(path.file_name().unwrap(), "brock200_1_reduction.urs");
        assert_eq!(fs::read_to_string(path).unwrap(), p.as_str());
    }
}
