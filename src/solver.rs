//! The three solver slots of a benchmark and how each one is invoked
use crate::classify::{self, Outcome};
use crate::codegen::GeneratedProgram;
use crate::instance::InstanceKind;
use crate::runner::{self, ProcessOutput};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SolverRole {
    /// URSA with the solver template
    Primary,
    /// Cliquer or MiniSat on the raw instance file
    Reference,
    /// URSA with the reduction template
    Reduction,
}

const PRIMARY_OUTCOMES: [Outcome; 5] = Outcome::ALL;
const REFERENCE_OUTCOMES: [Outcome; 4] = [
    Outcome::Positive,
    Outcome::Negative,
    Outcome::Timeout,
    Outcome::Error,
];

impl SolverRole {
    pub const ALL: [SolverRole; 3] = [
        SolverRole::Primary,
        SolverRole::Reference,
        SolverRole::Reduction,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Name used in report columns and statistics headers.
    pub fn name(self, kind: InstanceKind) -> &'static str {
        match (self, kind) {
            (SolverRole::Primary, _) => "URSA",
            (SolverRole::Reference, InstanceKind::Graph) => "Cliquer",
            (SolverRole::Reference, InstanceKind::Cnf) => "MiniSat",
            (SolverRole::Reduction, _) => "Reduction",
        }
    }

    /// Outcomes this solver can produce; only these get a statistics line.
    pub fn outcomes(self) -> &'static [Outcome] {
        match self {
            SolverRole::Reference => &REFERENCE_OUTCOMES,
            _ => &PRIMARY_OUTCOMES,
        }
    }
}

/// An executable and the options placed before any per-instance argument.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SolverCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl SolverCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        SolverCommand {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append whitespace separated options; a leading backslash protects
    /// an option that starts with a dash from the command line parser.
    pub fn with_options(mut self, options: &str) -> Self {
        for opt in options.split_whitespace() {
            self.args.push(opt[opt.starts_with('\\') as usize..].to_string());
        }
        self
    }
}

/// One solver's result on one instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverRun {
    pub outcome: Outcome,
    /// seconds
    pub elapsed: f64,
    /// clique size, graphs only
    pub solution_size: Option<usize>,
}

/// Everything measured on one instance. Written to the report as one row
/// as soon as it is complete and never changed afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    /// the instance file name
    pub instance_id: String,
    pub category: String,
    /// declared (vertices, edges) or (variables, clauses)
    pub size: (usize, usize),
    pub primary: SolverRun,
    pub reference: SolverRun,
    pub reduction: Option<SolverRun>,
    /// names of the saved primary and reduction programs
    pub primary_file: Option<String>,
    pub reduction_file: Option<String>,
}

impl RunResult {
    pub fn run(&self, role: SolverRole) -> Option<&SolverRun> {
        match role {
            SolverRole::Primary => Some(&self.primary),
            SolverRole::Reference => Some(&self.reference),
            SolverRole::Reduction => self.reduction.as_ref(),
        }
    }
}

/// Run URSA on a generated program.
pub async fn run_ursa(
    kind: InstanceKind,
    command: &SolverCommand,
    program: &GeneratedProgram,
    timeout: Duration,
) -> SolverRun {
    let out = runner::run(
        &command.program,
        &command.args,
        Some(program.as_bytes()),
        timeout,
    )
    .await;
    trace_output(&command.program, &out);
    let outcome = classify::classify(kind, &out.stdout, &out.exit);
    let solution_size = match kind {
        InstanceKind::Graph if outcome == Outcome::Positive => {
            Some(classify::clique_size(&out.stdout).unwrap_or(0))
        }
        InstanceKind::Graph => Some(0),
        InstanceKind::Cnf => None,
    };
    SolverRun {
        outcome,
        elapsed: out.elapsed,
        solution_size,
    }
}

/// Run the reference solver of `kind` on the instance file itself.
pub async fn run_reference(
    kind: InstanceKind,
    command: &SolverCommand,
    instance: &Path,
    timeout: Duration,
) -> SolverRun {
    let mut args = command.args.clone();
    args.push(instance.to_string_lossy().to_string());
    if kind == InstanceKind::Cnf {
        // MiniSat writes its model to the second argument
        args.push("/dev/null".to_string());
    }
    let out = runner::run(&command.program, &args, None, timeout).await;
    trace_output(&command.program, &out);
    let (outcome, solution_size) = match kind {
        InstanceKind::Graph => classify::classify_cliquer(&out.stdout, &out.exit),
        InstanceKind::Cnf => (classify::classify_exit_code(&out.exit), None),
    };
    SolverRun {
        outcome,
        elapsed: out.elapsed,
        solution_size: match kind {
            InstanceKind::Graph => Some(solution_size.unwrap_or(0)),
            InstanceKind::Cnf => None,
        },
    }
}

fn trace_output(program: &Path, out: &ProcessOutput) {
    debug!(
        "{} ended with {:?} after {:.3}s",
        program.display(),
        out.exit,
        out.elapsed
    );
    if !out.stderr.is_empty() {
        debug!("{} stderr: {}", program.display(), out.stderr.trim_end());
    }
}
