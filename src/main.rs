//! CLI entry point for the ranking statistics tool.
//!
//! Provides subcommands for browsing the index, inspecting a single ranking,
//! exporting tables and building min-score time series.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use ranking_stats::{
    cache::{IndexCache, RankingCache},
    config::Config,
    fetch::BasicClient,
    index::Index,
    model::RankingDocument,
    ordered::OrderedMap,
    output::{export_file_name, print_json, rows_to_text, table_rows, write_json, write_table},
    sources::{FileSource, HttpSource, IndexSource, RankingSource},
    stats::{EnrollStats, compute_stats, score_distribution},
    store::{RankingTables, build},
    timeseries::{FailedSlot, MinScoreTimeSeries, TimeSeriesOptions, build_time_series},
};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ranking_stats")]
#[command(about = "Admission statistics from published university rankings", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base URL or local directory holding the published data
    #[arg(short, long, global = true, env = "RANKINGS_SOURCE")]
    source: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the years and phases published for a school
    Years {
        #[arg(long)]
        school: String,
    },
    /// List the courses of one ranking
    Courses {
        #[command(flatten)]
        ranking: RankingArgs,
    },
    /// Admission statistics for one course or every course of a ranking
    Stats {
        #[command(flatten)]
        ranking: RankingArgs,

        #[arg(long)]
        course: Option<String>,
    },
    /// Export a course table (or the all-courses table) as `;`-separated text
    Export {
        #[command(flatten)]
        ranking: RankingArgs,

        #[arg(long)]
        course: Option<String>,

        /// Header columns, comma-separated
        #[arg(long, value_delimiter = ',')]
        header: Vec<String>,

        /// Output file; use `-` for stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Score histogram for one course or the whole ranking
    Distribution {
        #[command(flatten)]
        ranking: RankingArgs,

        #[arg(long)]
        course: Option<String>,

        /// Bucket width in score points
        #[arg(short, long, default_value_t = 1.0)]
        bucket: f64,
    },
    /// Minimum passing score of a course across every year and phase
    MinScores {
        #[arg(long)]
        school: String,

        #[arg(long)]
        course: String,

        /// Maximum number of concurrent ranking loads
        #[arg(short = 'j', long)]
        concurrency: Option<usize>,

        /// Write the report to this JSON file instead of logging it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct RankingArgs {
    #[arg(long)]
    school: String,

    #[arg(long)]
    year: u16,

    /// Phase name or link as listed in the index
    #[arg(long)]
    phase: String,
}

#[derive(Serialize)]
struct TimeSeriesReport<'a> {
    school: &'a str,
    course: &'a str,
    generated_at: DateTime<Utc>,
    series: &'a MinScoreTimeSeries,
    failures: &'a [FailedSlot],
    cancelled: bool,
}

struct Session {
    rankings: Arc<RankingCache<Arc<dyn RankingSource>>>,
    index: IndexCache<Arc<dyn IndexSource>>,
    config: Config,
}

impl Session {
    fn open(config: Config) -> Result<Self> {
        let (rankings, index): (Arc<dyn RankingSource>, Arc<dyn IndexSource>) =
            if config.is_remote() {
                let client = BasicClient::new(Duration::from_secs(config.request_timeout_secs))?;
                let source = Arc::new(HttpSource::new(client, &config.source, &config.index_path));
                (source.clone() as Arc<dyn RankingSource>, source as Arc<dyn IndexSource>)
            } else {
                let source = Arc::new(FileSource::new(&config.source, &config.index_path));
                (source.clone() as Arc<dyn RankingSource>, source as Arc<dyn IndexSource>)
            };

        info!(source = %config.source, remote = config.is_remote(), "Session opened");
        Ok(Self {
            rankings: Arc::new(RankingCache::new(rankings)),
            index: IndexCache::new(index),
            config,
        })
    }

    async fn index(&self) -> Result<&Index> {
        self.index.get().await.context("Failed to load index")
    }

    /// Resolves a phase given by name or link to its link.
    async fn phase_link(&self, args: &RankingArgs) -> Result<String> {
        let index = self.index().await?;
        let link = index
            .phases(&args.school, args.year)
            .and_then(|phases| {
                phases
                    .iter()
                    .find(|p| p.name == args.phase || p.link == args.phase)
            })
            .map(|p| p.link.clone());

        Ok(link.unwrap_or_else(|| {
            warn!(phase = %args.phase, "Phase not in index, using it as a link");
            args.phase.clone()
        }))
    }

    async fn ranking(&self, args: &RankingArgs) -> Result<Arc<RankingDocument>> {
        let link = self.phase_link(args).await?;
        let doc = self
            .rankings
            .load_ranking(&args.school, args.year, &link)
            .await
            .with_context(|| {
                format!("Failed to load {} {} {}", args.school, args.year, args.phase)
            })?;
        Ok(doc)
    }

    async fn tables(&self, args: &RankingArgs) -> Result<RankingTables> {
        Ok(build(&*self.ranking(args).await?))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ranking_stats.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"))
        .to_path_buf();
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ranking_stats.log"))
        .to_os_string();

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    }
    .apply_env()?;
    if let Some(source) = cli.source {
        config.source = source;
    }

    let session = Session::open(config)?;

    match cli.command {
        Commands::Years { school } => {
            let index = session.index().await?;
            let Some(years) = index.years(&school) else {
                bail!(
                    "Unknown school '{}'; known schools: {}",
                    school,
                    index.school_names().join(", ")
                );
            };
            for year in years {
                let phases: Vec<&str> = index
                    .phases(&school, year)
                    .unwrap_or_default()
                    .iter()
                    .map(|p| p.name.as_str())
                    .collect();
                info!(year, phases = ?phases, "Year");
            }
        }
        Commands::Courses { ranking } => {
            let tables = session.tables(&ranking).await?;
            for name in tables.selectable_names() {
                info!(course = name, "Course");
            }
        }
        Commands::Stats { ranking, course } => {
            let tables = session.tables(&ranking).await?;
            let mut report: OrderedMap<String, Option<EnrollStats>> = OrderedMap::new();
            match course {
                Some(course) => {
                    let table = tables
                        .select(&course)
                        .with_context(|| format!("Course '{course}' not in this ranking"))?;
                    report.set(table.kind.name().to_string(), compute_stats(table));
                }
                None => {
                    for table in &tables.course_tables {
                        report.set(table.kind.name().to_string(), compute_stats(table));
                    }
                }
            }
            print_json(&report)?;
        }
        Commands::Export {
            ranking,
            course,
            header,
            output,
        } => {
            let tables = session.tables(&ranking).await?;
            let table = match &course {
                Some(course) => tables
                    .select(course)
                    .with_context(|| format!("Course '{course}' not in this ranking"))?,
                None => &tables.merit_table,
            };
            let header: Vec<&str> = header.iter().map(String::as_str).collect();
            let header = (!header.is_empty()).then_some(header.as_slice());

            match output {
                Some(path) if path.as_os_str() == "-" => {
                    print!("{}", rows_to_text(&table_rows(table), header)?);
                }
                Some(path) => write_table(&path, table, header)?,
                None => {
                    let path = PathBuf::from(export_file_name(course.as_deref()));
                    write_table(&path, table, header)?;
                }
            }
        }
        Commands::Distribution {
            ranking,
            course,
            bucket,
        } => {
            let tables = session.tables(&ranking).await?;
            let table = match &course {
                Some(course) => tables
                    .select(course)
                    .with_context(|| format!("Course '{course}' not in this ranking"))?,
                None => &tables.merit_table,
            };
            print_json(&score_distribution(table, bucket))?;
        }
        Commands::MinScores {
            school,
            course,
            concurrency,
            output,
        } => {
            let index = session.index().await?;
            let options = TimeSeriesOptions {
                concurrency: concurrency.unwrap_or(session.config.concurrency),
            };

            let cancel = CancellationToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, finishing loads in flight");
                    trigger.cancel();
                }
            });

            let outcome = build_time_series(
                session.rankings.clone(),
                index,
                &school,
                &course,
                &options,
                &cancel,
            )
            .await?;

            if outcome.series.values().all(|phases| phases.is_empty()) {
                warn!(%course, %school, "No statistics found for this course");
            }

            let report = TimeSeriesReport {
                school: &school,
                course: &course,
                generated_at: Utc::now(),
                series: &outcome.series,
                failures: &outcome.failures,
                cancelled: outcome.cancelled,
            };

            match output {
                Some(path) => {
                    write_json(&path, &report)?;
                    info!(path = %path.display(), "Report written");
                }
                None => print_json(&report)?,
            }
        }
    }

    Ok(())
}
