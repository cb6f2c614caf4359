//! Gravity-dam section stability runner

mod case;
mod error;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use dam_core::{BatchSummary, CancellationToken};
use dam_section::{SnapshotKernel, TracingSink, extract_section};

use case::AnalysisCase;
use error::CliResult;
use output::{BatchOutput, OutputFormat, SummaryTable};

#[derive(Parser, Debug)]
#[command(name = "dam", version, about = "Section stability checks for gravity dam monoliths")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cut every section of a case and check its stability
    Analyze(AnalyzeArgs),
    /// Only cut the sections and report the extracted profiles
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Case file (RON)
    case: PathBuf,

    /// Write the full results here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Results file format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Worker threads for the section batch
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Case file (RON)
    case: PathBuf,

    /// Write the extracted profiles here as JSON
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dam_cli=info,dam_core=info,dam_section=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting dam section analysis");

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Analyze(args) => run_analyze(args),
        Command::Extract(args) => run_extract(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_analyze(args: AnalyzeArgs) -> CliResult<ExitCode> {
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()?;
    }

    let case = AnalysisCase::load(&args.case)?;
    let requests = case.requests()?;
    let kernel = SnapshotKernel::new();
    let snapshot = case.load_into(&kernel)?;
    tracing::info!(
        "Loaded case '{}' with {} section(s) on {} face(s)",
        case.name,
        requests.len(),
        snapshot.faces.len()
    );

    let token = CancellationToken::new();
    let outcomes = case
        .analyzer()
        .analyze_batch(&snapshot, &requests, &token, &TracingSink);
    let summary = BatchSummary::from_outcomes(&outcomes);

    print!(
        "{}",
        SummaryTable {
            case: &case.name,
            outcomes: &outcomes,
            summary: &summary,
        }
    );

    if let Some(path) = &args.output {
        let batch = BatchOutput {
            case: &case.name,
            summary: &summary,
            sections: &outcomes,
        };
        output::write_file(path, &batch, args.format)?;
    }

    Ok(if summary.all_stable() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn run_extract(args: ExtractArgs) -> CliResult<ExitCode> {
    let case = AnalysisCase::load(&args.case)?;
    let requests = case.requests()?;
    let kernel = SnapshotKernel::new();
    let snapshot = case.load_into(&kernel)?;

    let profiles: Vec<_> = requests
        .iter()
        .map(|request| {
            let profile = extract_section(&snapshot, &request.plane, &case.extraction, &TracingSink);
            println!("{}", output::profile_line(&request.name, &profile));
            (request.name.clone(), profile)
        })
        .collect();

    if let Some(path) = &args.output {
        output::write_file(path, &profiles, OutputFormat::Json)?;
    }

    let failed = profiles.iter().filter(|(_, p)| p.is_failed()).count();
    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}
