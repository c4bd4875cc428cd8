//! netsim - synthetic network telemetry generator
//!
//! Usage:
//!   netsim generate --count 100000 --environment datacenter --fault-ratio 0.01
//!   netsim generate --start-date 2025-03-01 --end-date 2025-04-01 --seed 42
//!   netsim profiles

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use netsim::config::{DateRange, EnvironmentProfile, GenerationRequest, TableNames};
use netsim::run::{RunSummary, SinkSet, run};
use netsim::sink::JsonlSink;
use netsim::tables::TableKind;

#[derive(Parser)]
#[command(name = "netsim")]
#[command(about = "Synthetic network telemetry datasets with controlled fault injection")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate all five telemetry tables
    Generate {
        /// Start date (YYYY-MM-DD)
        #[arg(long, default_value = "2025-03-01")]
        start_date: String,

        /// End date (YYYY-MM-DD), exclusive
        #[arg(long, default_value = "2025-04-01")]
        end_date: String,

        /// Rows to generate per table
        #[arg(short, long, default_value_t = 10_000)]
        count: u64,

        /// Network environment profile
        #[arg(short, long, default_value = "datacenter")]
        environment: EnvironmentProfile,

        /// Device count (defaults to the profile's cardinality)
        #[arg(short, long)]
        devices: Option<usize>,

        /// Fraction of records marked anomalous, in [0, 1]
        #[arg(short, long, default_value_t = 0.01)]
        fault_ratio: f64,

        /// Seed for reproducible output (drawn and reported if omitted)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Directory for the output files
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// Output name for the gRPC/gNMI table
        #[arg(long, default_value = "grpc_data")]
        grpc_output: String,

        /// Output name for the SNMP table
        #[arg(long, default_value = "snmp_data")]
        snmp_output: String,

        /// Output name for the syslog table
        #[arg(long, default_value = "syslog_data")]
        syslog_output: String,

        /// Output name for the DDM table
        #[arg(long, default_value = "ddm_data")]
        ddm_output: String,

        /// Output name for the lifecycle prediction table
        #[arg(long, default_value = "predict_data")]
        predict_output: String,
    },

    /// List environment profiles
    Profiles,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            start_date,
            end_date,
            count,
            environment,
            devices,
            fault_ratio,
            seed,
            out_dir,
            grpc_output,
            snmp_output,
            syslog_output,
            ddm_output,
            predict_output,
        } => {
            let outputs = TableNames {
                grpc: grpc_output,
                snmp: snmp_output,
                syslog: syslog_output,
                ddm: ddm_output,
                lifecycle: predict_output,
            };
            run_generate(
                start_date,
                end_date,
                count,
                environment,
                devices,
                fault_ratio,
                seed,
                out_dir,
                outputs,
            )
        }
        Commands::Profiles => {
            run_profiles();
            ExitCode::SUCCESS
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_generate(
    start_date: String,
    end_date: String,
    count: u64,
    environment: EnvironmentProfile,
    devices: Option<usize>,
    fault_ratio: f64,
    seed: Option<u64>,
    out_dir: PathBuf,
    outputs: TableNames,
) -> ExitCode {
    let start = match chrono::NaiveDate::parse_from_str(&start_date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(e) => {
            eprintln!("invalid --start-date '{}': {}", start_date, e);
            return ExitCode::FAILURE;
        }
    };
    let end = match chrono::NaiveDate::parse_from_str(&end_date, "%Y-%m-%d") {
        Ok(d) => d,
        Err(e) => {
            eprintln!("invalid --end-date '{}': {}", end_date, e);
            return ExitCode::FAILURE;
        }
    };

    let request = GenerationRequest {
        range: DateRange::days(start, end),
        rows_per_table: count,
        environment,
        device_count: devices,
        fault_ratio,
        seed,
        outputs,
    };

    let sinks = match open_sinks(&request, &out_dir) {
        Ok(sinks) => sinks,
        Err(e) => {
            eprintln!("cannot open output files: {}", e);
            return ExitCode::FAILURE;
        }
    };

    eprintln!("╔══════════════════════════════════════════════════════════╗");
    eprintln!("║              netsim telemetry generation                 ║");
    eprintln!("╠══════════════════════════════════════════════════════════╣");
    eprintln!("║ Range:       {:44} ║", format!("{} .. {}", start_date, end_date));
    eprintln!("║ Rows/table:  {:44} ║", count);
    eprintln!("║ Environment: {:44} ║", environment.name());
    eprintln!("║ Fault ratio: {:44} ║", fault_ratio);
    eprintln!("╚══════════════════════════════════════════════════════════╝");

    match run(&request, sinks) {
        Ok(summary) => {
            print_summary(&summary);
            if summary.reports.iter().any(|r| r.error.is_some()) {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("generation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_sinks(
    request: &GenerationRequest,
    out_dir: &std::path::Path,
) -> Result<SinkSet, netsim::SinkWriteError> {
    let open = |table: TableKind| -> Result<JsonlSink, netsim::SinkWriteError> {
        let name = request.outputs.get(table);
        JsonlSink::create(out_dir.join(format!("{}.jsonl", name)))
    };
    Ok(SinkSet {
        grpc: Box::new(open(TableKind::Grpc)?),
        snmp: Box::new(open(TableKind::Snmp)?),
        syslog: Box::new(open(TableKind::Syslog)?),
        ddm: Box::new(open(TableKind::Ddm)?),
        lifecycle: Box::new(open(TableKind::Lifecycle)?),
    })
}

fn print_summary(summary: &RunSummary) {
    eprintln!("╔══════════════════════════════════════════════════════════╗");
    eprintln!("║                  Generation Complete                     ║");
    eprintln!("╠══════════════════════════════════════════════════════════╣");
    eprintln!("║ Seed: {:51} ║", summary.seed);
    for report in &summary.reports {
        let status = match &report.error {
            None => format!("{} rows, {} flagged", report.rows, report.flagged),
            Some(e) => format!("ABORTED: {}", e),
        };
        let mut line = format!("{:10} {}", report.table.name(), status);
        line.truncate(56);
        eprintln!("║ {:56} ║", line);
    }
    eprintln!("╚══════════════════════════════════════════════════════════╝");
    eprintln!("Re-run with --seed {} to reproduce this dataset.", summary.seed);
}

fn run_profiles() {
    println!("Available environment profiles:\n");
    for profile in EnvironmentProfile::all() {
        println!(
            "  {:12} {} devices by default",
            profile.name(),
            profile.default_devices()
        );
    }
    println!("\nUsage: netsim generate --environment <PROFILE> [--devices N]");
}
