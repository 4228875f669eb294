pub mod bench;
pub mod classify;
pub mod codegen;
pub mod config;
pub mod error;
pub mod instance;
pub mod ledger;
pub mod report;
pub mod runner;
pub mod solver;
pub mod utils;

pub use instance::InstanceKind;

/// Marker line opening the aggregate section of a report.
pub const FINAL_STATISTICS: &str = "FINAL STATISTICS:";
/// Extension of generated program files.
pub const PROGRAM_EXTENSION: &str = "urs";

#[macro_export]
macro_rules! regex {
    ($re:literal $(,)?) => {{
        static RE: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
        RE.get_or_init(|| regex::Regex::new($re).unwrap())
    }};
}
