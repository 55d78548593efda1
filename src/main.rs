use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use pulseview::config::{AppConfig, StorageArgs, StorageBackend};
use pulseview::models::Metadata;
use pulseview::report::{self, ReportInput};
use pulseview::sentiment::RandomClassifier;
use pulseview::store::{BlobStorage, FeedbackStore, FileStorage};
use pulseview::submission::SubmissionFlow;
use pulseview::{aggregate, catalog, csv_export, db, pdf_export};

#[derive(Parser)]
#[command(name = "pulseview")]
#[command(
    about = "Collect opinions on civic issues and report on their sentiment",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    storage: StorageArgs,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the issues open for feedback
    Issues,
    /// Submit an opinion on an issue
    Submit {
        #[arg(long)]
        issue: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        age_range: Option<String>,
        #[arg(long)]
        role: Option<String>,
        /// Seed for the sentiment draw, for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print aggregate sentiment for all issues or one issue
    Dashboard {
        #[arg(long)]
        issue: Option<String>,
    },
    /// Export a report as CSV or PDF
    Export {
        #[arg(value_enum)]
        format: ExportFormat,
        #[arg(long)]
        issue: Option<String>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Seed the store with example feedback if it is empty
    Seed,
    /// Create or upgrade the Postgres schema
    InitDb,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Pdf,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("pulseview={default_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_store(config: &AppConfig) -> anyhow::Result<FeedbackStore<Box<dyn BlobStorage>>> {
    let storage: Box<dyn BlobStorage> = match &config.backend {
        StorageBackend::File { dir } => {
            debug!(dir = %dir.display(), "using file storage");
            Box::new(FileStorage::new(dir.clone()))
        }
        StorageBackend::Postgres { url } => {
            let pool = db::connect(url)
                .await
                .context("failed to connect to Postgres")?;
            Box::new(db::PgStorage::new(pool))
        }
    };

    Ok(FeedbackStore::with_key(storage, config.storage_key.clone()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = AppConfig::from_args(&cli.storage);

    match cli.command {
        Commands::Issues => {
            let store = open_store(&config).await?;
            let records = store.load().await.context("failed to load feedback")?;
            let breakdown = aggregate::breakdown_by_issue(&records);

            for issue in catalog::all() {
                let stored = breakdown
                    .get(issue.id)
                    .map(|entry| entry.counts.total())
                    .unwrap_or(0);
                println!(
                    "[{}] {}{}\n    {} | {} urgency | {} responses ({} stored here)\n    {}",
                    issue.id,
                    issue.title,
                    if issue.trending { " (trending)" } else { "" },
                    issue.category,
                    issue.urgency,
                    issue.response_count,
                    stored,
                    issue.description
                );
            }
        }
        Commands::Submit {
            issue,
            text,
            name,
            age_range,
            role,
            seed,
        } => {
            let store = open_store(&config).await?;
            let classifier = match seed {
                Some(seed) => RandomClassifier::with_seed(seed),
                None => RandomClassifier::new(),
            };
            let metadata = Metadata {
                name,
                age_range,
                role,
            };

            let record = SubmissionFlow::new(&store, &classifier)
                .submit(&issue, &text, metadata)
                .await?;
            println!(
                "Thank you for your feedback! Recorded {} as {}.",
                record.id, record.sentiment
            );
        }
        Commands::Dashboard { issue } => {
            let store = open_store(&config).await?;
            let records = store.load().await.context("failed to load feedback")?;
            let view = aggregate::aggregate(&records, issue.as_deref());
            let input = ReportInput::new(&records, &view, Utc::now());
            print!("{}", report::build_dashboard(&input));
        }
        Commands::Export { format, issue, out } => {
            let store = open_store(&config).await?;
            let records = store.load().await.context("failed to load feedback")?;
            let view = aggregate::aggregate(&records, issue.as_deref());
            let input = ReportInput::new(&records, &view, Utc::now());

            let bytes = match format {
                ExportFormat::Csv => {
                    csv_export::render_csv(&input).context("failed to render CSV")?
                }
                ExportFormat::Pdf => pdf_export::render_pdf(&input),
            };
            report::write_report(&out, &bytes)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), records = input.records.len(), "report exported");
            println!("Report written to {}.", out.display());
        }
        Commands::Seed => {
            let store = open_store(&config).await?;
            let records = store.load().await.context("failed to load feedback")?;
            println!("Store holds {} feedback records.", records.len());
        }
        Commands::InitDb => {
            let StorageBackend::Postgres { url } = &config.backend else {
                anyhow::bail!("init-db needs DATABASE_URL or --database-url");
            };
            let pool = db::connect(url)
                .await
                .context("failed to connect to Postgres")?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
    }

    Ok(())
}
