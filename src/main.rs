use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use mrpack_realizer::core::modpack::{InstallReport, Side};
use mrpack_realizer::core::settings::{InstallSettings, MismatchPolicy};
use mrpack_realizer::{RealizeRequest, RealizerResult};

/// Materialize a Modrinth modpack into a runnable installation.
#[derive(Debug, Parser)]
#[command(name = "mrpack-realizer", version)]
struct Args {
    /// Path to the `.mrpack` (or a `.zip` wrapping one).
    #[arg(short, long, default_value = "./modpack.mrpack")]
    modpack: PathBuf,

    /// Base directory; the pack is installed into `<output>/<pack name>`.
    #[arg(short, long, default_value = "./")]
    output: PathBuf,

    /// Verbose logging, including every extracted path.
    #[arg(long)]
    debug: bool,

    /// JSON settings file; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of files processed at once.
    #[arg(short = 'j', long)]
    concurrency: Option<usize>,

    /// Seconds allowed for a single download attempt.
    #[arg(long, value_name = "SECS")]
    fetch_timeout: Option<u64>,

    /// Keep files that failed verification instead of deleting them.
    #[arg(long)]
    keep_invalid: bool,

    /// Install files for this side (client or server).
    #[arg(long)]
    side: Option<Side>,

    /// Write the per-file outcome report as JSON.
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,

    /// Exit with a failure code if any file could not be acquired.
    #[arg(long)]
    strict: bool,
}

impl Args {
    fn settings(&self) -> RealizerResult<InstallSettings> {
        let mut settings = match &self.config {
            Some(path) => InstallSettings::load(path)?,
            None => InstallSettings::default(),
        };

        if let Some(n) = self.concurrency {
            settings.concurrency = n;
        }
        if let Some(secs) = self.fetch_timeout {
            settings.fetch_timeout_secs = secs;
        }
        if self.keep_invalid {
            settings.mismatch_policy = MismatchPolicy::Preserve;
        }
        if let Some(side) = self.side {
            settings.side = side;
        }

        settings.validate()?;
        Ok(settings)
    }
}

async fn run(args: Args) -> RealizerResult<bool> {
    let request = RealizeRequest {
        modpack: args.modpack.clone(),
        output: args.output.clone(),
        settings: args.settings()?,
        list_extracted: args.debug,
    };

    let report = mrpack_realizer::realize(&request).await?;
    report.log_summary();

    if let Some(path) = &args.report {
        report.write_json(path).await?;
        info!("Wrote report to {:?}", path);
    }

    Ok(exit_ok(&report, args.strict))
}

/// Partial failure only fails the process under `--strict`.
fn exit_ok(report: &InstallReport, strict: bool) -> bool {
    report.is_complete() || !strict
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    mrpack_realizer::init_tracing(args.debug);

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("Some files could not be acquired");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
