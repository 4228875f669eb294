//! The benchmark driver
//!
//! Instances are processed one at a time. Every row is flushed to the
//! report as soon as it is complete, so an interrupted run leaves a report
//! that `--continue` can pick up.
use crate::codegen::{self, GeneratedProgram};
use crate::config::{Input, Settings, Template};
use crate::error::{BenchResult, InstanceError};
use crate::instance::{Instance, category};
use crate::ledger::{Ledger, Stats, split_report};
use crate::report::ReportLayout;
use crate::solver::{self, RunResult, SolverRole, SolverRun};
use crate::utils::{find_instance_files, timestamp};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write, stdout};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

const REDUCTION_SUFFIX: &str = "_reduction";

/// What a directory run did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    /// rows appended to the report
    pub added: usize,
    /// instances already in the report
    pub skipped: usize,
    /// instances that could not be parsed
    pub failed: usize,
    /// stopped by Ctrl-C
    pub interrupted: bool,
    /// the statistics written at the end of the report
    pub stats: Stats,
}

pub struct Benchmark {
    settings: Settings,
    solver: Template,
    reduction: Option<Template>,
    layout: ReportLayout,
}

impl Benchmark {
    /// Load the templates; a missing one stops everything.
    pub fn new(settings: Settings) -> BenchResult<Benchmark> {
        let solver = Template::load(&settings.solver_template)?;
        info!("loaded solver template from {}", settings.solver_template.display());
        let reduction = match &settings.reduction_template {
            Some(path) => {
                let t = Template::load(path)?;
                info!("loaded reduction template from {}", path.display());
                Some(t)
            }
            None => None,
        };
        let layout = ReportLayout::new(
            settings.kind,
            reduction.is_some(),
            settings.save_dirs.is_some(),
        );
        Ok(Benchmark {
            settings,
            solver,
            reduction,
            layout,
        })
    }

    /// Run on the configured input.
    pub async fn run(&self) -> BenchResult<()> {
        match &self.settings.input {
            Input::Directory(dir) => {
                let summary = self.run_directory(dir).await?;
                if self.settings.resume {
                    println!("Benchmark completed. Added {} new results.", summary.added);
                    println!(
                        "Total instances in {}: {}",
                        self.settings.output.display(),
                        summary.stats.total
                    );
                } else {
                    println!(
                        "Benchmark completed. Results saved to {}",
                        self.settings.output.display()
                    );
                }
            }
            Input::SingleFile(file) => {
                self.run_single(file).await?;
            }
        }
        Ok(())
    }

    /// Benchmark every instance under `dir` that is not in the report yet.
    pub async fn run_directory(&self, dir: &Path) -> BenchResult<Summary> {
        let kind = self.settings.kind;
        let mut ledger = Ledger::new(kind);
        let existing = if self.settings.resume {
            read_report(&self.settings.output)?
        } else {
            None
        };
        match &existing {
            Some(text) => {
                ledger.load(text)?;
                println!(
                    "Found {} already processed files in {}",
                    ledger.processed().len(),
                    self.settings.output.display()
                );
                if 0 < ledger.prior().total {
                    println!("Existing statistics: {} total instances", ledger.prior().total);
                }
                let columns = self.layout.column_header();
                if let Some(found) = ledger.column_header() {
                    if found != columns.trim_end() {
                        warn!("the report was written with other columns; rows may not line up");
                    }
                }
            }
            None => ledger.begin()?,
        }
        let mut pending = Vec::new();
        for path in find_instance_files(dir, kind)? {
            if !ledger.should_skip(&file_name(&path)) {
                pending.push(path);
            }
        }
        println!("Found {} instance files in {}", pending.len() + ledger.skipped(), dir.display());
        if 0 < ledger.skipped() {
            println!("Skipping {} already processed files", ledger.skipped());
        }
        if let Some(limit) = self.settings.limit {
            pending.truncate(limit);
        }
        println!("Processing {} files", pending.len());

        let mut report = self.open_report(existing.as_deref())?;
        let mut summary = Summary {
            skipped: ledger.skipped(),
            ..Summary::default()
        };
        let mut interrupt = std::pin::pin!(tokio::signal::ctrl_c());
        let total = pending.len();
        for (i, path) in pending.iter().enumerate() {
            if ledger.is_processed(&file_name(path)) {
                warn!("{}: an instance of the same name is already reported", path.display());
                summary.skipped += 1;
                continue;
            }
            print!("Testing: {}, {}/{} ...", file_name(path), i + 1, total);
            stdout().flush()?;
            let start = Instant::now();
            let result = tokio::select! {
                r = self.benchmark_file(path) => r,
                _ = &mut interrupt => {
                    println!(" (INTERRUPTED)");
                    warn!("interrupted; {} is not recorded", path.display());
                    summary.interrupted = true;
                    break;
                }
            };
            match result {
                Ok(result) => {
                    println!(" ({:.6}s)", start.elapsed().as_secs_f64());
                    writeln!(report, "{}", self.layout.row(&result))?;
                    report.flush()?;
                    if ledger.record(&result)? {
                        summary.added += 1;
                    }
                }
                Err(e) => {
                    println!(" (SKIPPED or FAILED)");
                    warn!("{}: {}", path.display(), e);
                    summary.failed += 1;
                }
            }
        }
        summary.stats = ledger.finalize()?;
        report.write_all(self.layout.final_statistics(&summary.stats, &timestamp()).as_bytes())?;
        report.flush()?;
        debug!("{:?}", summary);
        Ok(summary)
    }

    /// Benchmark one file and print its results. With `--continue`, a file
    /// already in the report is skipped. Nothing is written to the report.
    pub async fn run_single(&self, path: &Path) -> BenchResult<Option<RunResult>> {
        let id = file_name(path);
        if self.settings.resume {
            if let Some(text) = read_report(&self.settings.output)? {
                let mut ledger = Ledger::new(self.settings.kind);
                ledger.load(&text)?;
                if ledger.is_processed(&id) {
                    println!("Skipping already processed: {}", id);
                    return Ok(None);
                }
            }
        }
        println!("Testing: {}", id);
        match self.benchmark_file(path).await {
            Ok(result) => {
                self.print_result(&result);
                Ok(Some(result))
            }
            Err(e) => {
                println!("Error parsing {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    fn print_result(&self, r: &RunResult) {
        let kind = self.settings.kind;
        let [size0, size1] = kind.size_labels();
        println!("\nResults:");
        println!("  {}: {}, {}: {}", size0, r.size.0, size1, r.size.1);
        for role in SolverRole::ALL {
            let Some(run) = r.run(role) else {
                continue;
            };
            match run.solution_size {
                Some(n) => println!(
                    "  {}: {}, Clique size: {}, Time: {:.6}s",
                    role.name(kind),
                    run.outcome.label(kind),
                    n,
                    run.elapsed
                ),
                None => println!(
                    "  {}: {}, Time: {:.6}s",
                    role.name(kind),
                    run.outcome.label(kind),
                    run.elapsed
                ),
            }
        }
    }

    /// Parse, generate, and run every configured solver on one instance.
    pub async fn benchmark_file(&self, path: &Path) -> Result<RunResult, InstanceError> {
        let kind = self.settings.kind;
        let timeout = self.settings.timeout;
        let instance = Instance::load(kind, path)?;
        debug!("{}: size {:?}", path.display(), instance.size());
        let program = codegen::generate(&instance, &self.solver.text, self.settings.init_style);
        let primary_file = self.save(&program, path, SolverRole::Primary);
        let primary = solver::run_ursa(kind, &self.settings.ursa, &program, timeout).await;
        let reference =
            solver::run_reference(kind, &self.settings.reference, path, timeout).await;
        let mut reduction: Option<SolverRun> = None;
        let mut reduction_file: Option<String> = None;
        if let Some(template) = &self.reduction {
            let program = codegen::generate(&instance, &template.text, self.settings.init_style);
            reduction_file = self.save(&program, path, SolverRole::Reduction);
            reduction = Some(solver::run_ursa(kind, &self.settings.ursa, &program, timeout).await);
        }
        Ok(RunResult {
            instance_id: file_name(path),
            category: category(kind, path),
            size: instance.size(),
            primary,
            reference,
            reduction,
            primary_file,
            reduction_file,
        })
    }

    /// Save a generated program when saving is on. A failure costs only
    /// the file name in the report.
    fn save(&self, program: &GeneratedProgram, path: &Path, role: SolverRole) -> Option<String> {
        let dirs = self.settings.save_dirs.as_ref()?;
        let (dir, suffix) = match role {
            SolverRole::Reduction => (&dirs.reductions, REDUCTION_SUFFIX),
            _ => (&dirs.programs, ""),
        };
        match codegen::save(program, path, dir, suffix) {
            Ok(saved) => {
                debug!("saved {}", saved.display());
                Some(file_name(&saved))
            }
            Err(e) => {
                warn!("cannot save a program for {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Open the report for appending rows. A resumed report loses its old
    /// statistics block and trailing blank lines; any other report is
    /// started over with a header.
    fn open_report(&self, existing: Option<&str>) -> io::Result<BufWriter<File>> {
        let output = &self.settings.output;
        if let Some(text) = existing {
            let (data, _) = split_report(text);
            let data = data.trim_end();
            if !data.is_empty() {
                fs::write(output, format!("{}\n", data))?;
                let file = OpenOptions::new().append(true).open(output)?;
                return Ok(BufWriter::new(file));
            }
        }
        let mut report = BufWriter::new(File::create(output)?);
        let title = self.layout.title(
            &self.solver.name,
            self.reduction.as_ref().map(|t| t.name.as_str()),
        );
        let save_dirs = self.settings.save_dirs.as_ref().map(|d| {
            (
                d.programs.as_path(),
                self.reduction.as_ref().map(|_| d.reductions.as_path()),
            )
        });
        report.write_all(self.layout.header(&title, &timestamp(), save_dirs).as_bytes())?;
        report.flush()?;
        Ok(report)
    }
}

/// The report text, or `None` when there is no report yet.
fn read_report(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            info!("{} does not exist; starting a new report", path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string())
}
