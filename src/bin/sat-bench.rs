//! SAT satisfiability benchmark: URSA vs MiniSat
use std::process::ExitCode;
use tracing_subscriber::FmtSubscriber;
use ursa_bench::{
    InstanceKind,
    bench::Benchmark,
    config::{Config, Settings},
    error::BenchResult,
};

const KIND: InstanceKind = InstanceKind::Cnf;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = Config::parse_for(KIND);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ExitCode::FAILURE;
    }
    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> BenchResult<()> {
    let settings = Settings::new(KIND, config)?;
    Benchmark::new(settings)?.run().await
}
