//! Solver outcome classification
//!
//! URSA reports its result only as free text, so its runs are classified
//! by an ordered list of heuristics; the first one that matches decides.
//! The rules overlap on purpose: an output with a solution marker and a
//! zero-solution phrase counts as positive because the positive rules come
//! first. Reference solvers are classified by exit code instead.
use crate::instance::InstanceKind;
use crate::regex;
use crate::runner::Exit;

/// The conclusion of one solver run on one instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// a clique was found / the formula is satisfiable
    Positive,
    /// no clique / unsatisfiable
    Negative,
    Unknown,
    Timeout,
    Error,
}

impl Outcome {
    pub const ALL: [Outcome; 5] = [
        Outcome::Positive,
        Outcome::Negative,
        Outcome::Unknown,
        Outcome::Timeout,
        Outcome::Error,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Status word used in report rows.
    pub fn label(self, kind: InstanceKind) -> &'static str {
        match (self, kind) {
            (Outcome::Positive, InstanceKind::Graph) => "FOUND",
            (Outcome::Negative, InstanceKind::Graph) => "NOT_FOUND",
            (Outcome::Positive, InstanceKind::Cnf) => "SAT",
            (Outcome::Negative, InstanceKind::Cnf) => "UNSAT",
            (Outcome::Unknown, _) => "UNKNOWN",
            (Outcome::Timeout, _) => "TIMEOUT",
            (Outcome::Error, _) => "ERROR",
        }
    }

    /// Label of the counter line in the `FINAL STATISTICS` block.
    pub fn stat_label(self, kind: InstanceKind) -> &'static str {
        match kind {
            InstanceKind::Graph => match self {
                Outcome::Positive => "Cliques found",
                Outcome::Negative => "Not found",
                Outcome::Unknown => "Unknown",
                Outcome::Timeout => "Timeout",
                Outcome::Error => "Error",
            },
            InstanceKind::Cnf => match self {
                Outcome::Positive => "SAT instances",
                Outcome::Negative => "UNSAT instances",
                Outcome::Unknown => "UNKNOWN instances",
                Outcome::Timeout => "TIMEOUT instances",
                Outcome::Error => "ERROR instances",
            },
        }
    }
}

type Heuristic = fn(InstanceKind, &str) -> bool;

/// URSA output heuristics in precedence order.
const HEURISTICS: [(&str, Heuristic, Outcome); 4] = [
    ("solution marker", solution_marker, Outcome::Positive),
    ("solver summary", solver_summary, Outcome::Positive),
    ("clique size", positive_clique_size, Outcome::Positive),
    ("zero solutions", zero_solutions, Outcome::Negative),
];

fn solution_marker(_: InstanceKind, out: &str) -> bool {
    out.contains("--> Solution")
}

/// Timing and size summaries without any "no solution" phrase.
fn solver_summary(_: InstanceKind, out: &str) -> bool {
    out.contains("[Solving time:")
        && out.contains("[Formula size:")
        && !out.contains("0 solutions")
        && !out.contains("No solutions")
}

fn positive_clique_size(kind: InstanceKind, out: &str) -> bool {
    kind == InstanceKind::Graph && clique_size(out).is_some_and(|n| 0 < n)
}

fn zero_solutions(_: InstanceKind, out: &str) -> bool {
    out.contains("No solutions found")
        || regex!(r"\b0 solutions\b").is_match(out)
        || regex!(r"\[Number of solutions:\s*0\]").is_match(out)
}

/// Classify a primary or reduction run of URSA.
pub fn classify(kind: InstanceKind, stdout: &str, exit: &Exit) -> Outcome {
    match exit {
        Exit::TimedOut => return Outcome::Timeout,
        Exit::Exited(Some(0)) => (),
        _ => return Outcome::Error,
    }
    HEURISTICS
        .iter()
        .find(|(_, test, _)| test(kind, stdout))
        .map_or(Outcome::Unknown, |(_, _, outcome)| *outcome)
}

/// The clique size printed by a URSA template, if any.
pub fn clique_size(stdout: &str) -> Option<usize> {
    [
        regex!(r"Clique size:\s*(\d+)"),
        regex!(r"Maximum clique:\s*(\d+)"),
        regex!(r"Solution.*?(\d+)"),
    ]
    .iter()
    .find_map(|re| re.captures(stdout))
    .and_then(|c| c[1].parse().ok())
}

/// MiniSat encodes its answer in the exit code: 10 is SAT, 20 is UNSAT.
pub fn classify_exit_code(exit: &Exit) -> Outcome {
    match exit {
        Exit::TimedOut => Outcome::Timeout,
        Exit::Exited(Some(10)) => Outcome::Positive,
        Exit::Exited(Some(20)) => Outcome::Negative,
        _ => Outcome::Error,
    }
}

/// Cliquer exits with 0 and prints the clique as `size=N`.
pub fn classify_cliquer(stdout: &str, exit: &Exit) -> (Outcome, Option<usize>) {
    match exit {
        Exit::TimedOut => (Outcome::Timeout, None),
        Exit::Exited(Some(0)) => {
            let size = regex!(r"size=(\d+)")
                .captures(stdout)
                .and_then(|c| c[1].parse::<usize>().ok())
                .unwrap_or(0);
            if 0 < size {
                (Outcome::Positive, Some(size))
            } else {
                (Outcome::Negative, Some(0))
            }
        }
        _ => (Outcome::Error, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OK: Exit = Exit::Exited(Some(0));

    #[test]
    fn zero_solutions_marker() {
        let out = "[Formula size: 12]\n[Number of solutions: 0]\n";
        assert_eq!(classify(InstanceKind::Cnf, out, &OK), Outcome::Negative);
        assert_eq!(classify(InstanceKind::Graph, out, &OK), Outcome::Negative);
        assert_eq!(Outcome::Negative.label(InstanceKind::Graph), "NOT_FOUND");
        assert_eq!(Outcome::Negative.label(InstanceKind::Cnf), "UNSAT");
    }

    #[test]
    fn positive_marker_wins_over_zero_solutions() {
        let out = "--> Solution 1\n0 solutions\n";
        assert_eq!(classify(InstanceKind::Cnf, out, &OK), Outcome::Positive);
        let out = "[Number of solutions: 0]\n--> Solution\n";
        assert_eq!(classify(InstanceKind::Cnf, out, &OK), Outcome::Positive);
    }

    #[test]
    fn summary_rule() {
        let out = "[Solving time: 0.1s]\n[Formula size: 42]\n";
        assert_eq!(classify(InstanceKind::Cnf, out, &OK), Outcome::Positive);
        let out = "[Solving time: 0.1s]\n[Formula size: 42]\nNo solutions found\n";
        assert_eq!(classify(InstanceKind::Cnf, out, &OK), Outcome::Negative);
        // only one of the two markers
        assert_eq!(
            classify(InstanceKind::Cnf, "[Solving time: 1s]\n", &OK),
            Outcome::Unknown
        );
    }

    #[test]
    fn standalone_zero_token() {
        assert_eq!(classify(InstanceKind::Cnf, "found 0 solutions", &OK), Outcome::Negative);
        assert_eq!(classify(InstanceKind::Cnf, "found 10 solutions", &OK), Outcome::Unknown);
    }

    #[test]
    fn clique_size_counts_as_positive_for_graphs_only() {
        let out = "Clique size: 7\n";
        assert_eq!(clique_size(out), Some(7));
        assert_eq!(classify(InstanceKind::Graph, out, &OK), Outcome::Positive);
        assert_eq!(classify(InstanceKind::Cnf, out, &OK), Outcome::Unknown);
        assert_eq!(clique_size("Maximum clique: 12"), Some(12));
        assert_eq!(clique_size("nothing"), None);
    }

    #[test]
    fn exit_status_precedes_output() {
        let out = "--> Solution";
        assert_eq!(classify(InstanceKind::Graph, out, &Exit::TimedOut), Outcome::Timeout);
        assert_eq!(
            classify(InstanceKind::Graph, out, &Exit::Exited(Some(1))),
            Outcome::Error
        );
        assert_eq!(classify(InstanceKind::Graph, out, &Exit::Exited(None)), Outcome::Error);
        assert_eq!(
            classify(InstanceKind::Cnf, out, &Exit::LaunchFailed("gone".into())),
            Outcome::Error
        );
    }

    #[test]
    fn minisat_exit_codes() {
        assert_eq!(classify_exit_code(&Exit::Exited(Some(10))), Outcome::Positive);
        assert_eq!(classify_exit_code(&Exit::Exited(Some(20))), Outcome::Negative);
        assert_eq!(classify_exit_code(&OK), Outcome::Error);
        assert_eq!(classify_exit_code(&Exit::TimedOut), Outcome::Timeout);
    }

    #[test]
    fn cliquer_size_token() {
        let out = "size=4, weight=4:   1 5 9 13\n";
        assert_eq!(classify_cliquer(out, &OK), (Outcome::Positive, Some(4)));
        assert_eq!(classify_cliquer("", &OK), (Outcome::Negative, Some(0)));
        assert_eq!(
            classify_cliquer(out, &Exit::Exited(Some(1))),
            (Outcome::Error, None)
        );
    }
}
