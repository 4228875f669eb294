//! Command line options shared by both benchmark binaries
use crate::codegen::InitStyle;
use crate::error::ConfigError;
use crate::instance::InstanceKind;
use crate::solver::SolverCommand;
use clap::{CommandFactory, FromArgMatches, Parser};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

#[derive(Clone, Debug, Parser)]
#[command(version, about = "Benchmark URSA against a reference solver")]
pub struct Config {
    /// directory searched recursively for instance files
    pub instance_dir: Option<PathBuf>,
    /// time limit per solver run in seconds
    #[arg(long, default_value_t = 120)]
    pub timeout: u64,
    /// report file [default: cliqueK_results.txt or SAT_results.txt]
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// benchmark one instance file and print the results
    #[arg(long)]
    pub single_file: Option<PathBuf>,
    /// URSA template appended to every generated program
    #[arg(long)]
    pub solver_template: PathBuf,
    /// optional second template benchmarked as the reduction variant
    #[arg(long)]
    pub reduction_template: Option<PathBuf>,
    /// save generated programs
    #[arg(long)]
    pub save_urs: bool,
    /// skip instances already in the report and append to it
    #[arg(long = "continue")]
    pub resume: bool,
    /// URSA executable
    #[arg(long, default_value = "./ursa")]
    pub ursa: PathBuf,
    /// reference solver executable [default: cliquer or minisat]
    #[arg(long)]
    pub reference: Option<PathBuf>,
    /// options passed to URSA; use '\-' to start one with a dash [default: -q, or -q -l32]
    #[arg(long, allow_hyphen_values = true)]
    pub ursa_options: Option<String>,
    /// options placed before the instance file of the reference solver
    #[arg(long, allow_hyphen_values = true, default_value = "")]
    pub reference_options: String,
    /// directory of saved solver programs
    #[arg(long)]
    pub save_dir: Option<PathBuf>,
    /// directory of saved reduction programs
    #[arg(long)]
    pub reduction_save_dir: Option<PathBuf>,
    /// stop after this many new instances
    #[arg(long)]
    pub limit: Option<usize>,
    /// initialize matrices with a loop instead of one assignment per cell
    #[arg(long)]
    pub loop_init: bool,
    /// more log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,
    /// only errors in the log
    #[arg(short, long)]
    pub quiet: bool,
}

impl Config {
    /// Parse the command line under the binary name of `kind`.
    pub fn parse_for(kind: InstanceKind) -> Config {
        let command = Config::command().name(binary_name(kind));
        match Config::from_arg_matches(&command.get_matches()) {
            Ok(config) => config,
            Err(e) => e.exit(),
        }
    }

    pub fn log_level(&self) -> Level {
        match (self.quiet, self.verbose) {
            (true, _) => Level::ERROR,
            (false, 0) => Level::WARN,
            (false, 1) => Level::INFO,
            (false, 2) => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn binary_name(kind: InstanceKind) -> &'static str {
    match kind {
        InstanceKind::Graph => "clique-bench",
        InstanceKind::Cnf => "sat-bench",
    }
}

/// What a run works on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Directory(PathBuf),
    SingleFile(PathBuf),
}

/// Where generated programs are saved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveDirs {
    pub programs: PathBuf,
    pub reductions: PathBuf,
}

/// A fully resolved run configuration.
#[derive(Clone, Debug)]
pub struct Settings {
    pub kind: InstanceKind,
    pub input: Input,
    pub timeout: Duration,
    pub output: PathBuf,
    pub resume: bool,
    pub solver_template: PathBuf,
    pub reduction_template: Option<PathBuf>,
    pub save_dirs: Option<SaveDirs>,
    pub ursa: SolverCommand,
    pub reference: SolverCommand,
    pub limit: Option<usize>,
    pub init_style: InitStyle,
}

impl Settings {
    /// Fill in the defaults of `kind`. A single file takes precedence over
    /// an instance directory.
    pub fn new(kind: InstanceKind, config: Config) -> Result<Settings, ConfigError> {
        let input = match (config.single_file, config.instance_dir) {
            (Some(file), _) => Input::SingleFile(file),
            (None, Some(dir)) if dir.is_dir() => Input::Directory(dir),
            (None, Some(dir)) => return Err(ConfigError::NotADirectory(dir)),
            (None, None) => return Err(ConfigError::NoInput),
        };
        let (output, programs, reductions, ursa_options, reference) = match kind {
            InstanceKind::Graph => (
                "cliqueK_results.txt",
                "cliqueK_saved_files",
                "cliqueK_reduction_saved_files",
                "-q",
                "cliquer",
            ),
            InstanceKind::Cnf => (
                "SAT_results.txt",
                "SAT_saved_files",
                "SAT_reduction_saved_files",
                "-q -l32",
                "minisat",
            ),
        };
        let save_dirs = config.save_urs.then(|| SaveDirs {
            programs: config.save_dir.unwrap_or_else(|| PathBuf::from(programs)),
            reductions: config
                .reduction_save_dir
                .unwrap_or_else(|| PathBuf::from(reductions)),
        });
        Ok(Settings {
            kind,
            input,
            timeout: Duration::from_secs(config.timeout),
            output: config.output.unwrap_or_else(|| PathBuf::from(output)),
            resume: config.resume,
            solver_template: config.solver_template,
            reduction_template: config.reduction_template,
            save_dirs,
            ursa: SolverCommand::new(config.ursa)
                .with_options(config.ursa_options.as_deref().unwrap_or(ursa_options)),
            reference: SolverCommand::new(config.reference.unwrap_or_else(|| reference.into()))
                .with_options(&config.reference_options),
            limit: config.limit,
            init_style: if config.loop_init {
                InitStyle::Loop
            } else {
                InitStyle::Unrolled
            },
        })
    }
}

/// A template file and the name it is reported under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub text: String,
}

impl Template {
    pub fn load(path: &Path) -> Result<Template, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Template {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string());
        Ok(Template { name, text })
    }
}
