use ranking_stats::cache::RankingCache;
use ranking_stats::output::table_to_text;
use ranking_stats::sources::{FileSource, IndexSource, RankingSource};
use ranking_stats::stats::compute_stats;
use ranking_stats::store::build;
use ranking_stats::timeseries::{TimeSeriesOptions, build_time_series};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn fixtures() -> FileSource {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data");
    FileSource::new(root, "index.json")
}

#[tokio::test]
async fn test_full_pipeline() {
    let source = fixtures();
    let doc = source
        .load_ranking("Design", 2022, "prima.json")
        .await
        .expect("Failed to load fixture");
    let tables = build(&doc);

    assert_eq!(
        tables.course_names(),
        vec!["Design Della Moda", "Design Degli Interni"]
    );

    let moda = compute_stats(tables.course("design della moda").unwrap()).unwrap();
    assert_eq!(moda.candidates, 3);
    assert_eq!(moda.allowed, 2);
    assert_eq!(moda.allowed_pct, "66.7%");
    assert_eq!(moda.min_score_to_pass, 81.75);

    assert!(compute_stats(&tables.merit_table).is_none());
}

#[tokio::test]
async fn test_export_of_fixture_course() {
    let doc = fixtures().load_ranking("Design", 2022, "prima").await.unwrap();
    let tables = build(&doc);
    let text = table_to_text(tables.course("Design Degli Interni").unwrap(), None).unwrap();
    assert_eq!(text, "2;c3d4;Sì;86.10;-;-\n5;i9j0;No - OFA;72.30;OFA;-\n");
}

#[tokio::test]
async fn test_score_ordered_merit_table() {
    let doc = fixtures().load_ranking("Design", 2023, "prima").await.unwrap();
    let tables = build(&doc);
    let labels: Vec<_> = tables
        .merit_table
        .rows
        .iter()
        .map(|r| r.fields()[1].clone())
        .collect();
    assert_eq!(labels, vec!["q7r8", "k1l2", "m3n4", "o5p6", "s9t0"]);
}

#[tokio::test]
async fn test_min_scores_over_time() {
    let source = fixtures();
    let index = source.load_index().await.unwrap();
    let cache = Arc::new(RankingCache::new(source));

    let outcome = build_time_series(
        cache.clone(),
        &index,
        "Design",
        "DESIGN DEL PRODOTTO INDUSTRIALE",
        &TimeSeriesOptions { concurrency: 2 },
        &CancellationToken::new(),
    )
    .await
    .unwrap();

    let years: Vec<_> = outcome.series.keys().copied().collect();
    assert_eq!(years, vec![2022, 2023]);
    // Course missing in 2022; year kept, no phases.
    assert!(outcome.series.get(&2022).unwrap().is_empty());

    let y2023 = outcome.series.get(&2023).unwrap();
    let phases: Vec<_> = y2023.keys().cloned().collect();
    assert_eq!(phases, vec!["Prima graduatoria", "Seconda graduatoria"]);
    assert_eq!(
        y2023.get(&"Prima graduatoria".to_string()).unwrap().min_score_to_pass,
        91.0
    );
    assert_eq!(
        y2023.get(&"Seconda graduatoria".to_string()).unwrap().min_score_to_pass,
        80.0
    );

    // The unpublished phase is omitted, not a failure.
    assert!(outcome.failures.is_empty());
    // Three published documents were loaded and kept.
    assert_eq!(cache.len(), 3);
}

#[tokio::test]
async fn test_unknown_school_in_index() {
    let index = fixtures().load_index().await.unwrap();
    assert_eq!(index.years("Medicina"), None);
    assert_eq!(index.years("Urbanistica"), Some(vec![]));
}
