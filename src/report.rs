//! Report layout
//!
//! A report is a header block, one fixed-width row per instance with fields
//! joined by ` | `, and a `FINAL STATISTICS` block. The second field of a
//! row is the instance file name; [`crate::ledger`] relies on that when a
//! run is resumed.
use crate::FINAL_STATISTICS;
use crate::instance::InstanceKind;
use crate::ledger::Stats;
use crate::solver::{RunResult, SolverRole};
use std::path::Path;

const SEPARATOR: &str = " | ";
const STAT_LABEL_WIDTH: usize = 19;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
    Category,
    File,
    Size(usize),
    Status(SolverRole),
    Time(SolverRole),
    Solution(SolverRole),
    Program(SolverRole),
}

#[derive(Clone, Debug)]
struct Column {
    field: Field,
    title: &'static str,
    width: usize,
}

/// The columns of a report, fixed for the whole file.
#[derive(Clone, Debug)]
pub struct ReportLayout {
    kind: InstanceKind,
    reduction: bool,
    programs: bool,
    columns: Vec<Column>,
}

impl ReportLayout {
    /// `reduction`: a reduction template is benchmarked;
    /// `programs`: generated programs are saved and named in each row.
    pub fn new(kind: InstanceKind, reduction: bool, programs: bool) -> Self {
        let mut layout = ReportLayout {
            kind,
            reduction,
            programs,
            columns: Vec::new(),
        };
        layout.columns = layout.build_columns();
        layout
    }

    fn roles(&self) -> Vec<SolverRole> {
        SolverRole::ALL
            .into_iter()
            .filter(|r| *r != SolverRole::Reduction || self.reduction)
            .collect()
    }

    fn build_columns(&self) -> Vec<Column> {
        let col = |field, title, width| Column {
            field,
            title,
            width,
        };
        let [size0, size1] = self.kind.size_labels();
        let mut columns = vec![
            col(Field::Category, "Category", 12),
            col(Field::File, "File", 35),
            col(Field::Size(0), size0, 9),
            col(Field::Size(1), size1, 8),
        ];
        let roles = self.roles();
        for &role in &roles {
            let width = match (self.kind, role) {
                (InstanceKind::Graph, _) => 12,
                (InstanceKind::Cnf, SolverRole::Reduction) => 10,
                (InstanceKind::Cnf, _) => 8,
            };
            columns.push(col(Field::Status(role), role.name(self.kind), width));
        }
        for &role in &roles {
            let (title, width) = match (self.kind, role) {
                (_, SolverRole::Primary) => ("URSA Time", 10),
                (InstanceKind::Graph, SolverRole::Reference) => ("Cliquer Time", 12),
                (InstanceKind::Cnf, SolverRole::Reference) => ("MiniSat Time", 12),
                (InstanceKind::Graph, SolverRole::Reduction) => ("Red. Time", 10),
                (InstanceKind::Cnf, SolverRole::Reduction) => ("Reduction Time", 14),
            };
            columns.push(col(Field::Time(role), title, width));
        }
        if self.kind == InstanceKind::Graph {
            for &role in &roles {
                let title = match role {
                    SolverRole::Primary => "URSA Clique",
                    SolverRole::Reference => "Cliq. Clique",
                    SolverRole::Reduction => "Red. Clique",
                };
                columns.push(col(Field::Solution(role), title, 12));
            }
        }
        if self.programs {
            columns.push(col(Field::Program(SolverRole::Primary), "URS File", 25));
            if self.reduction {
                columns.push(col(Field::Program(SolverRole::Reduction), "Reduction File", 25));
            }
        }
        columns
    }

    /// Report title naming the templates in use.
    pub fn title(&self, solver_template: &str, reduction_template: Option<&str>) -> String {
        match self.kind {
            InstanceKind::Graph => {
                let mut t = format!("URSA ({}) vs Cliquer Max Clique Benchmark Results", solver_template);
                if let Some(r) = reduction_template {
                    t.push_str(&format!(" with Reduction ({})", r));
                }
                t
            }
            InstanceKind::Cnf => {
                let mut t = format!("URSA Benchmark ({}) vs MiniSat", solver_template);
                if let Some(r) = reduction_template {
                    t.push_str(&format!(" vs URSA Reduction ({})", r));
                }
                t
            }
        }
    }

    /// The block written at the top of a new report.
    pub fn header(
        &self,
        title: &str,
        started: &str,
        save_dirs: Option<(&Path, Option<&Path>)>,
    ) -> String {
        let mut h = format!("{}\n{}\nStarted: {}\n", title, "=".repeat(title.len()), started);
        if let Some((programs, reductions)) = save_dirs {
            h.push_str(&format!("URS files saved to: {}\n", programs.display()));
            if let Some(dir) = reductions {
                h.push_str(&format!("Reduction files saved to: {}\n", dir.display()));
            }
        }
        let columns = self.column_header();
        h.push('\n');
        h.push_str(&columns);
        h.push('\n');
        h.push_str(&"-".repeat(columns.len()));
        h.push('\n');
        h
    }

    pub fn column_header(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{:<w$}", c.title, w = c.width))
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    /// One result row, without the line terminator.
    pub fn row(&self, r: &RunResult) -> String {
        self.columns
            .iter()
            .map(|c| {
                let w = c.width;
                match c.field {
                    Field::Category => format!("{:<w$}", r.category),
                    Field::File => format!("{:<w$}", r.instance_id),
                    Field::Size(0) => format!("{:<w$}", r.size.0),
                    Field::Size(_) => format!("{:<w$}", r.size.1),
                    Field::Status(role) => {
                        let status = r.run(role).map_or("", |run| run.outcome.label(self.kind));
                        format!("{:<w$}", status)
                    }
                    Field::Time(role) => {
                        let t = r.run(role).map_or(0.0, |run| run.elapsed);
                        format!("{:<w$.6}", t)
                    }
                    Field::Solution(role) => {
                        let n = r.run(role).and_then(|run| run.solution_size).unwrap_or(0);
                        format!("{:<w$}", n)
                    }
                    Field::Program(role) => {
                        let name = match role {
                            SolverRole::Reduction => r.reduction_file.as_deref(),
                            _ => r.primary_file.as_deref(),
                        };
                        format!("{:<w$}", name.unwrap_or(""))
                    }
                }
            })
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }

    /// The closing statistics block.
    pub fn final_statistics(&self, stats: &Stats, completed: &str) -> String {
        let line = |label: &str, n: usize| {
            format!("{:<w$}{}\n", format!("{}:", label), n, w = STAT_LABEL_WIDTH)
        };
        let mut s = format!("\n{}\n{}\n\n", FINAL_STATISTICS, "=".repeat(FINAL_STATISTICS.len()));
        for role in self.roles() {
            s.push_str(&format!("{} Results:\n", role.name(self.kind)));
            for &outcome in role.outcomes() {
                s.push_str(&line(outcome.stat_label(self.kind), stats.count(role, outcome)));
            }
            s.push('\n');
        }
        s.push_str(&line("Total instances", stats.total));
        s.push_str(&format!("Completed: {}\n", completed));
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Outcome;
    use crate::ledger::{Ledger, parse_statistics, row_id};
    use crate::solver::SolverRun;

    fn graph_result() -> RunResult {
        RunResult {
            instance_id: "brock200_1.clq".to_string(),
            category: "BROCK".to_string(),
            size: (200, 14834),
            primary: SolverRun {
                outcome: Outcome::Positive,
                elapsed: 1.25,
                solution_size: Some(21),
            },
            reference: SolverRun {
                outcome: Outcome::Timeout,
                elapsed: 120.0,
                solution_size: Some(0),
            },
            reduction: Some(SolverRun {
                outcome: Outcome::Unknown,
                elapsed: 0.5,
                solution_size: Some(0),
            }),
            primary_file: Some("brock200_1.urs".to_string()),
            reduction_file: Some("brock200_1_reduction.urs".to_string()),
        }
    }

    #[test]
    fn cnf_columns() {
        let layout = ReportLayout::new(InstanceKind::Cnf, false, false);
        let columns = layout.column_header();
        assert!(columns.starts_with("Category     | File "));
        assert!(columns.ends_with(" | URSA Time  | MiniSat Time"));
        let titles: Vec<&str> = columns.split('|').map(str::trim).collect();
        assert_eq!(
            titles,
            vec![
                "Category",
                "File",
                "Variables",
                "Clauses",
                "URSA",
                "MiniSat",
                "URSA Time",
                "MiniSat Time",
            ]
        );
        let header = layout.header("T", "2024-01-01 00:00:00", None);
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines[0], "T");
        assert_eq!(lines[1], "=");
        assert_eq!(lines[2], "Started: 2024-01-01 00:00:00");
        assert_eq!(lines[5].len(), lines[4].len());
        assert!(lines[5].chars().all(|c| c == '-'));
    }

    #[test]
    fn graph_row_fields() {
        let layout = ReportLayout::new(InstanceKind::Graph, true, true);
        let row = layout.row(&graph_result());
        let fields: Vec<&str> = row.split('|').map(str::trim).collect();
        assert_eq!(
            fields,
            vec![
                "BROCK",
                "brock200_1.clq",
                "200",
                "14834",
                "FOUND",
                "TIMEOUT",
                "UNKNOWN",
                "1.250000",
                "120.000000",
                "0.500000",
                "21",
                "0",
                "0",
                "brock200_1.urs",
                "brock200_1_reduction.urs",
            ]
        );
        assert_eq!(row_id(InstanceKind::Graph, &row), Some("brock200_1.clq"));
        assert_eq!(
            layout.column_header().split('|').count(),
            row.split('|').count()
        );
    }

    #[test]
    fn statistics_block_reads_back() {
        let layout = ReportLayout::new(InstanceKind::Graph, true, false);
        let mut ledger = Ledger::new(InstanceKind::Graph);
        ledger.begin().unwrap();
        ledger.record(&graph_result()).unwrap();
        let stats = ledger.finalize().unwrap();
        let block = layout.final_statistics(&stats, "2024-01-01 00:00:00");
        assert!(block.starts_with("\nFINAL STATISTICS:\n=================\n\nURSA Results:\n"));
        assert!(block.contains("Cliques found:     1\n"));
        assert!(block.contains("Total instances:   1\n"));
        assert!(block.ends_with("Completed: 2024-01-01 00:00:00\n"));
        assert_eq!(parse_statistics(InstanceKind::Graph, &block), stats);
    }

    #[test]
    fn reference_section_lists_only_its_outcomes() {
        let layout = ReportLayout::new(InstanceKind::Cnf, false, false);
        let block = layout.final_statistics(&Stats::default(), "now");
        let minisat = block.split("MiniSat Results:\n").nth(1).unwrap();
        let section: Vec<&str> = minisat.split("\n\n").next().unwrap().lines().collect();
        assert_eq!(
            section,
            vec![
                "SAT instances:     0",
                "UNSAT instances:   0",
                "TIMEOUT instances: 0",
                "ERROR instances:   0",
            ]
        );
        assert!(!block.contains("Reduction Results:"));
    }
}
