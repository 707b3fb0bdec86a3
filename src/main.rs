//! Interrupt timing simulator CLI
//!
//! Runs a trace file through the simulator and writes the execution log.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use irqsim::err::{Error as _, ParseErr, SimErr, TableErr};
use irqsim::parse::parse_trace;
use irqsim::sim::log::write_log;
use irqsim::sim::recipe::DispatchPolicy;
use irqsim::sim::timing::TimingStrategy;
use irqsim::sim::vector::VectorTable;
use irqsim::sim::{SimFlags, Simulator};

/// Simulate interrupt-handling timing for a trace of activities
#[derive(Parser, Debug)]
#[command(name = "irqsim")]
#[command(about = "Simulate interrupt-handling timing for a trace of activities", long_about = None)]
struct Args {
    /// Trace file to simulate
    trace: PathBuf,

    /// Where to write the execution log
    #[arg(short, long, default_value = "execution.txt")]
    output: PathBuf,

    /// Seed for variable step durations (random if not given)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Micro-step policy (flat, split)
    #[arg(long, default_value = "flat")]
    policy: DispatchPolicy,

    /// JSON file holding the vector table (built-in table if not given)
    #[arg(long)]
    vector_table: Option<PathBuf>,

    /// Print a summary of CPU, I/O, and overhead time
    #[arg(long)]
    summary: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, thiserror::Error)]
enum CliErr {
    #[error("could not access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error
    },
    #[error(transparent)]
    Parse(#[from] ParseErr),
    #[error(transparent)]
    Table(#[from] TableErr),
    #[error(transparent)]
    Sim(#[from] SimErr),
}
impl CliErr {
    fn help(&self) -> Option<String> {
        match self {
            CliErr::Io { .. } => None,
            CliErr::Parse(e) => e.help().map(Into::into),
            CliErr::Table(e) => e.help().map(Into::into),
            CliErr::Sim(e)   => e.help().map(Into::into),
        }
    }
}

fn io_err(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> CliErr + '_ {
    move |source| CliErr::Io { path: path.to_path_buf(), source }
}

fn simulate(args: &Args) -> Result<(), CliErr> {
    let src = std::fs::read_to_string(&args.trace).map_err(io_err(&args.trace))?;
    let activities = parse_trace(&src)?;
    info!("Loaded {} activities from {}", activities.len(), args.trace.display());

    let vector_table = match &args.vector_table {
        Some(path) => {
            let json = std::fs::read_to_string(path).map_err(io_err(path))?;
            VectorTable::from_json(&json)?
        },
        None => VectorTable::default(),
    };

    let timing = match args.seed {
        Some(seed) => TimingStrategy::Seeded { seed },
        None => TimingStrategy::Unseeded,
    };
    let mut sim = Simulator::with_vector_table(SimFlags { timing, policy: args.policy }, vector_table);
    let log = sim.run(&activities)?;
    let count = log.len();

    let file = File::create(&args.output).map_err(io_err(&args.output))?;
    write_log(log, BufWriter::new(file)).map_err(io_err(&args.output))?;
    info!("Wrote {count} records ({} ms) to {}", sim.now(), args.output.display());

    if args.json {
        println!("{:#}", sim.usage().to_json());
    } else if args.summary {
        println!("{}", sim.usage());
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let level = match args.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: could not set tracing subscriber");
    }

    match simulate(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            if let Some(help) = e.help() {
                error!("help: {help}");
            }
            ExitCode::FAILURE
        }
    }
}
