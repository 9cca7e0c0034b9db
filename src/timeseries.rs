//! Min-score-over-time aggregation for one course across every published
//! year and phase of a school.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

use crate::error::{RankingError, Result};
use crate::index::Index;
use crate::ordered::OrderedMap;
use crate::sources::RankingSource;
use crate::stats::{EnrollStats, check_merit_order, compute_stats};
use crate::store::build;

/// `year → phase name → stats`, years ascending, phases in index order.
pub type MinScoreTimeSeries = OrderedMap<u16, OrderedMap<String, EnrollStats>>;

#[derive(Debug, Clone)]
pub struct TimeSeriesOptions {
    /// Maximum number of rankings loaded at once.
    pub concurrency: usize,
}

impl Default for TimeSeriesOptions {
    fn default() -> Self {
        Self { concurrency: 5 }
    }
}

/// A (year, phase) whose ranking could not be retrieved.
#[derive(Debug, Clone, Serialize)]
pub struct FailedSlot {
    pub year: u16,
    pub phase: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct TimeSeriesOutcome {
    pub series: MinScoreTimeSeries,
    pub failures: Vec<FailedSlot>,
    /// Set when the cancellation token fired before every load was issued.
    pub cancelled: bool,
}

enum SlotResult {
    Stats(EnrollStats),
    Absent,
    Failed(String),
    Skipped,
}

/// Collects [`EnrollStats`] for `course` over every (year, phase) of `school`.
///
/// Loads run concurrently, bounded by `options.concurrency`; the result is
/// ordered by the index regardless of completion order. Phases where the
/// course is missing, has no statistics, or is not published are left out.
/// Other load failures are reported in [`TimeSeriesOutcome::failures`].
///
/// Once `cancel` fires no further loads start. Loads already in flight finish
/// and their results are kept; years with no issued load are dropped.
///
/// # Errors
///
/// [`RankingError::NotFound`] if `school` is not in the index.
#[tracing::instrument(skip(source, index, options, cancel), fields(concurrency = options.concurrency))]
pub async fn build_time_series<S>(
    source: Arc<S>,
    index: &Index,
    school: &str,
    course: &str,
    options: &TimeSeriesOptions,
    cancel: &CancellationToken,
) -> Result<TimeSeriesOutcome>
where
    S: RankingSource + ?Sized + 'static,
{
    let years = index
        .years(school)
        .ok_or_else(|| RankingError::NotFound(format!("school '{school}'")))?;

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut layout: Vec<(u16, Vec<String>)> = Vec::new();

    for year in years {
        let Some(phases) = index.phases(school, year) else {
            continue;
        };
        let slot = layout.len();
        layout.push((year, phases.iter().map(|p| p.name.clone()).collect()));

        for (pos, phase) in phases.iter().enumerate() {
            let source = Arc::clone(&source);
            let sem = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let school = school.to_string();
            let course = course.to_string();
            let link = phase.link.clone();

            let span = tracing::info_span!("load_phase", year, phase = %phase.name);

            tasks.spawn(
                async move {
                    let result = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => SlotResult::Skipped,
                        permit = sem.acquire_owned() => match permit {
                            Ok(_permit) if !cancel.is_cancelled() => {
                                load_slot(&*source, &school, year, &link, &course).await
                            }
                            _ => SlotResult::Skipped,
                        },
                    };
                    (slot, pos, result)
                }
                .instrument(span),
            );
        }
    }

    let mut results: Vec<Vec<Option<SlotResult>>> = layout
        .iter()
        .map(|(_, phases)| phases.iter().map(|_| None).collect())
        .collect();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, pos, result)) => results[slot][pos] = Some(result),
            Err(e) => error!(error = %e, "Phase task failed"),
        }
    }

    let mut series = MinScoreTimeSeries::new();
    let mut failures = Vec::new();

    for ((year, names), slots) in layout.into_iter().zip(results) {
        let mut phases = OrderedMap::new();
        let mut issued = false;

        for (name, slot) in names.into_iter().zip(slots) {
            match slot {
                Some(SlotResult::Stats(stats)) => {
                    issued = true;
                    phases.set(name, stats);
                }
                Some(SlotResult::Absent) => issued = true,
                Some(SlotResult::Failed(error)) => {
                    issued = true;
                    failures.push(FailedSlot {
                        year,
                        phase: name,
                        error,
                    });
                }
                Some(SlotResult::Skipped) | None => {}
            }
        }

        if issued || !cancel.is_cancelled() {
            series.set(year, phases);
        }
    }

    let cancelled = cancel.is_cancelled();
    info!(
        years = series.len(),
        failures = failures.len(),
        cancelled,
        "Time series built"
    );

    Ok(TimeSeriesOutcome {
        series,
        failures,
        cancelled,
    })
}

async fn load_slot<S: RankingSource + ?Sized>(
    source: &S,
    school: &str,
    year: u16,
    link: &str,
    course: &str,
) -> SlotResult {
    match source.load_ranking(school, year, link).await {
        Ok(doc) => {
            let tables = build(&doc);
            let Some(table) = tables.course(course) else {
                debug!("Course not present in this phase");
                return SlotResult::Absent;
            };
            check_merit_order(table);
            match compute_stats(table) {
                Some(stats) => SlotResult::Stats(stats),
                None => SlotResult::Absent,
            }
        }
        Err(e) if e.is_not_found() => {
            debug!(error = %e, "Ranking not published");
            SlotResult::Absent
        }
        Err(e) => {
            warn!(error = %e, "Ranking load failed");
            SlotResult::Failed(e.to_string())
        }
    }
}
