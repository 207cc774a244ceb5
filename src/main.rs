use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;

use memo_gpa::extract::{self, CreditPolicy, Extractor, MemoLineParser};
use memo_gpa::models::GradeRecord;
use memo_gpa::{gpa, ingest, report};

#[derive(Parser)]
#[command(name = "memo-gpa")]
#[command(about = "Grade memo extractor and SGPA/CGPA calculator", long_about = None)]
struct Cli {
    #[command(flatten)]
    policy: PolicyArgs,
    #[command(subcommand)]
    command: Commands,
}

/// Credit corrections applied to rows read from memo text.
#[derive(Args)]
struct PolicyArgs {
    /// Credit value treated as a dropped decimal point
    #[arg(long, global = true, default_value_t = extract::DECIMAL_ARTIFACT_CREDITS)]
    decimal_artifact: f64,
    /// Replacement for the dropped-decimal credit value
    #[arg(long, global = true, default_value_t = extract::DECIMAL_ARTIFACT_FIX)]
    decimal_artifact_fix: f64,
    /// Credits assumed for an F row without a credit column
    #[arg(long, global = true, default_value_t = extract::FAILED_DEFAULT_CREDITS)]
    failed_default_credits: f64,
}

impl From<&PolicyArgs> for CreditPolicy {
    fn from(args: &PolicyArgs) -> Self {
        CreditPolicy {
            decimal_artifact: args.decimal_artifact,
            decimal_artifact_fix: args.decimal_artifact_fix,
            failed_default_credits: args.failed_default_credits,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract grade rows from memo text dumps or CSV files
    Parse {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print backlogs and GPA per group plus the overall CGPA
    Summarize {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, value_enum, default_value_t = GroupBy::Term)]
        by: GroupBy,
    },
    /// Generate a markdown report
    Report {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Write the demo transcript as CSV
    Demo {
        #[arg(long, default_value = "demo.csv")]
        out: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum GroupBy {
    Term,
    Student,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let extractor = Extractor::new(MemoLineParser, CreditPolicy::from(&cli.policy));

    match cli.command {
        Commands::Parse { files, format, out } => {
            let records = ingest::load_documents(&files, &extractor)?;
            if records.is_empty() {
                println!("No grade rows found.");
                return Ok(());
            }

            match out {
                Some(path) => {
                    let file = std::fs::File::create(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    write_records(&records, format, file)?;
                    info!(records = records.len(), path = %path.display(), "records written");
                }
                None => write_records(&records, format, std::io::stdout().lock())?,
            }
        }
        Commands::Summarize { files, by } => {
            let records = ingest::load_documents(&files, &extractor)?;
            if records.is_empty() {
                println!("No grade rows found.");
                return Ok(());
            }

            let groups = match by {
                GroupBy::Term => {
                    gpa::summarize_by(&gpa::merge_history(&records), |r| r.term.clone())
                }
                GroupBy::Student => gpa::summarize_students(&records),
            };

            for (key, summary) in &groups {
                println!(
                    "- {}: GPA {:.2}, {} backlogs{}",
                    key,
                    summary.gpa,
                    summary.backlog_count,
                    if summary.failed_subjects.is_empty() {
                        String::new()
                    } else {
                        format!(" ({})", summary.failed_subjects_display())
                    }
                );
            }

            let transcript = gpa::transcript(&records);
            println!(
                "Total credits {} across {} semesters, CGPA {:.2}",
                transcript.total_credits, transcript.term_count, transcript.overall.gpa
            );
        }
        Commands::Report { files, out } => {
            let records = ingest::load_documents(&files, &extractor)?;
            if records.is_empty() {
                println!("No grade rows found.");
                return Ok(());
            }

            let report = report::build_report(&records, chrono::Local::now().date_naive());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Demo { out } => {
            let file = std::fs::File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            ingest::write_csv(&ingest::demo_records(), file)?;
            println!("Demo transcript written to {}.", out.display());
        }
    }

    Ok(())
}

fn write_records<W: Write>(
    records: &[GradeRecord],
    format: OutputFormat,
    writer: W,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Csv => ingest::write_csv(records, writer),
        OutputFormat::Json => ingest::write_json(records, writer),
    }
}
