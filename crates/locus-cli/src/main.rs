//! Locus CLI: inspect and resolve element locators
//!
//! ## Usage
//!
//! ```bash
//! locus key --code shop --page SearchPage -t button --name PROCEED
//! locus resolve --config locators.yaml --page SearchPage -t button --name PROCEED
//! locus resolve --config locators.yaml --page Signup -t radio --name Gender --value Male --cache cache.json
//! locus validate --config locators.yaml --strict
//! ```

use clap::Parser;
use locus_cli::{
    handlers::{execute_key, execute_resolve, execute_validate},
    Cli, CliConfig, CliResult, ColorChoice, Commands, Reporter, Verbosity,
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_tracing(config.verbosity);

    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    match cli.command {
        Commands::Key(args) => execute_key(&reporter, &args),
        Commands::Resolve(args) => execute_resolve(&reporter, &args),
        Commands::Validate(args) => execute_validate(&reporter, &args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let color: ColorChoice = cli.color.clone().into();
    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
