//! Mapper generator binary.
//!
//! Usage:
//!   procwire-gen [--config <path>] [--check]
//!
//! The config path may also come from `PROCWIRE_GEN_CONFIG`. With `--check`
//! nothing is written and the exit code is non-zero when the output
//! directory differs from what would be generated.

use procwire_codegen::{GenerateError, Generator, GeneratorConfig};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("procwire_codegen=info,procwire_gen=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let check = std::env::args().skip(1).any(|arg| arg == "--check");
    match run(check) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!(error = %e, "Mapper generation failed");
            ExitCode::FAILURE
        }
    }
}

/// Returns `Ok(false)` when `--check` found drift.
fn run(check: bool) -> Result<bool, GenerateError> {
    let config = GeneratorConfig::load()?;
    tracing::info!(
        source_root = %config.source_root.display(),
        output_dir = %config.output_dir.display(),
        "Loaded generator config"
    );

    let generator = Generator::new(config);
    let output = generator.generate()?;
    let output_dir = &generator.config().output_dir;

    if check {
        let drift = output.check_against(output_dir)?;
        for entry in &drift {
            tracing::error!("{}", entry);
        }
        if drift.is_empty() {
            tracing::info!("Generated mappers are up to date");
        }
        return Ok(drift.is_empty());
    }

    let summary = output.write_to(output_dir)?;
    tracing::info!(
        written = summary.written.len(),
        unchanged = summary.unchanged,
        removed = summary.removed.len(),
        "Wrote mappers"
    );
    Ok(true)
}
