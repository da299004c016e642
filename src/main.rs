use anyhow::Result;
use clap::{Parser, Subcommand};
use realign::telemetry::{self, LogFormat};

mod align_cmd;
mod format;
mod rest_cmd;
mod version_cmd;

/// Build-time version alignment for multi-module projects
///
/// realign rewrites a reactor (a JSON snapshot of every module taking part
/// in one build) so that module versions carry a rebuild suffix and
/// dependency versions follow the supplied overrides.
///
/// QUICK START:
///
///   # Compute one rebuilt version
///   realign version 1.2.GA --incremental redhat --candidate 1.2.0.GA-redhat-3
///
///   # Align a reactor against a BOM, writing the result
///   realign align --reactor reactor.json --bom bom.json --output aligned.json
///
///   # Request body for the alignment service
///   realign rest-request --reactor reactor.json
///
/// CONFIGURATION:
///
///   Policy lives in realign.toml (see `realign align --help`). A missing
///   file means defaults. Logging is controlled by REALIGN_LOG or RUST_LOG.
#[derive(Parser)]
#[command(name = "realign")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'realign <command> --help' for more information on a specific command.")]
struct Cli {
    /// Log output format on stderr: human or json
    #[arg(long, global = true, default_value_t = LogFormat::Human)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an alignment pass over a reactor snapshot
    ///
    /// Reads the reactor and override sources, runs the configured stages,
    /// prints the report and optionally writes the aligned reactor. On any
    /// fatal error nothing is written.
    Align(align_cmd::AlignArgs),

    /// Compute the rebuilt form of one version
    Version(version_cmd::VersionArgs),

    /// Print the alignment-service request body for a reactor
    #[command(name = "rest-request")]
    RestRequest(rest_cmd::RestRequestArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init(cli.log_format);

    match cli.command {
        Commands::Align(ref args) => align_cmd::run(args),
        Commands::Version(ref args) => version_cmd::run(args),
        Commands::RestRequest(ref args) => rest_cmd::run(args),
    }
}
