//! Integration tests for the full ingestion workflow
//!
//! These tests ingest fixture files through the public engine API and verify
//! the summary, KPI and chart views end to end.

#![expect(clippy::unwrap_used, clippy::indexing_slicing)]

use hr_insights::analyser::lifecycle::{InsightsEngine, StoreState};
use hr_insights::analyser::logic::{
    ChartPoint, ChartSet, ColumnKind, ColumnRole, IngestWarning, RawTable,
};
use hr_insights::config::EngineConfig;
use hr_insights::error::{InsightsError, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(name)
}

fn engine() -> InsightsEngine {
    InsightsEngine::new(EngineConfig::default()).unwrap()
}

#[test]
fn test_hr_sample_end_to_end() -> Result<()> {
    let engine = engine();
    let summary = engine.ingest_file(&fixture("hr_sample.csv"))?;

    assert_eq!(summary.row_count, 10, "Should have 10 rows");
    assert_eq!(summary.col_count, 6, "Should have 6 columns");
    assert_eq!(
        summary.numeric_columns,
        vec!["EmployeeID", "Age", "MonthlyIncome"]
    );
    assert_eq!(
        summary.categorical_columns,
        vec!["Name", "Department", "Attrition"]
    );

    let income = summary.numeric_stats["MonthlyIncome"].as_ref().unwrap();
    assert_eq!(income.count, 9);
    assert_eq!(income.missing_count, 1);
    assert!((income.min - 3900.0).abs() < f64::EPSILON);
    assert!((income.max - 9100.0).abs() < f64::EPSILON);
    assert!((income.mean - 54300.0 / 9.0).abs() < 1e-9);

    let age = summary.numeric_stats["Age"].as_ref().unwrap();
    assert_eq!(age.missing_count, 1, "N/A counts as missing");
    assert!((age.mean - 37.0).abs() < 1e-9);

    let kpis = engine.get_kpis()?;
    assert_eq!(kpis.total_rows, 10);
    assert_eq!(kpis.unique_employees, 10);
    assert_eq!(kpis.attrition_count, 3);
    assert!((kpis.attrition_rate - 0.3).abs() < 1e-12);
    assert_eq!(kpis.numeric_mean.get("Age"), Some(&Some(37.0)));
    assert_eq!(
        kpis.department_distribution,
        Some(vec![
            ChartPoint::new("Research & Development", 4),
            ChartPoint::new("Sales", 4),
            ChartPoint::new("Human Resources", 2),
        ])
    );

    let charts = engine.get_charts()?;
    let buckets = charts.get(ChartSet::SALARY_BUCKETS).unwrap();
    let counts: Vec<usize> = buckets.iter().map(|p| p.value).collect();
    assert_eq!(counts, vec![2, 1, 2, 1, 0, 1, 1, 1]);
    assert_eq!(buckets[0].label, "[3900, 4550)");
    assert_eq!(buckets[7].label, "[8450, 9100]");
    assert_eq!(charts.get("cat_Attrition").unwrap().len(), 2);
    assert!(!charts.contains("cat_Age"));

    let snapshot = engine.snapshot()?;
    assert_eq!(snapshot.source.as_deref(), Some("hr_sample.csv"));
    assert_eq!(snapshot.schema.kind_of("MonthlyIncome"), Some(ColumnKind::Numeric));
    assert!(snapshot.warnings.is_empty(), "{:?}", snapshot.warnings);
    Ok(())
}

#[test]
fn test_queries_before_ingest_report_no_dataset() {
    let engine = engine();
    assert_eq!(engine.state(), StoreState::Empty);
    assert!(matches!(engine.get_kpis(), Err(InsightsError::NoDataset)));
    assert!(matches!(engine.get_charts(), Err(InsightsError::NoDataset)));
    assert!(engine.get_summary().unwrap_err().is_no_dataset());
}

#[test]
fn test_ragged_file_leaves_store_unchanged() -> Result<()> {
    let engine = engine();

    let err = engine.ingest_file(&fixture("ragged.csv")).unwrap_err();
    assert!(matches!(err, InsightsError::InvalidTable(_)), "{err}");
    assert_eq!(engine.state(), StoreState::Empty);

    engine.ingest_file(&fixture("no_salary.csv"))?;
    let before = engine.get_kpis()?;

    let err = engine.ingest_file(&fixture("ragged.csv")).unwrap_err();
    assert!(err.is_ingestion_failure());
    assert!(err.to_string().contains("row 2 has 2 cells"), "{err}");
    assert_eq!(engine.get_kpis()?, before);
    Ok(())
}

#[test]
fn test_missing_salary_column_is_not_an_error() -> Result<()> {
    let engine = engine();
    engine.ingest_file(&fixture("no_salary.csv"))?;

    let charts = engine.get_charts()?;
    assert!(!charts.contains(ChartSet::SALARY_BUCKETS));
    assert_eq!(
        charts.get("cat_Department"),
        Some(&[ChartPoint::new("Eng", 2), ChartPoint::new("Sales", 1)][..])
    );

    let warnings = engine.warnings()?;
    assert!(warnings.iter().any(|w| matches!(
        w,
        IngestWarning::MissingColumn {
            role: ColumnRole::Salary,
            ..
        }
    )));
    Ok(())
}

#[test]
fn test_repeated_queries_are_identical() -> Result<()> {
    let engine = engine();
    engine.ingest_file(&fixture("hr_sample.csv"))?;

    let kpis = engine.get_kpis()?;
    let charts = engine.get_charts()?;
    for _ in 0..3 {
        assert_eq!(engine.get_kpis()?, kpis);
        assert_eq!(engine.get_charts()?, charts);
    }
    assert_eq!(
        serde_json::to_string(&engine.get_charts()?).unwrap(),
        serde_json::to_string(&charts).unwrap()
    );
    Ok(())
}

#[test]
fn test_new_upload_replaces_previous() -> Result<()> {
    let engine = engine();
    engine.ingest_file(&fixture("hr_sample.csv"))?;
    let first = engine.snapshot()?;

    engine.ingest_file(&fixture("no_salary.csv"))?;
    assert_eq!(engine.get_kpis()?.total_rows, 3);
    // A reader holding the old snapshot still sees it whole
    assert_eq!(first.kpis.total_rows, 10);
    Ok(())
}

#[test]
fn test_concurrent_ingest_is_rejected() -> Result<()> {
    let engine = engine();
    engine.ingest_file(&fixture("no_salary.csv"))?;
    let permit = engine.store().begin_ingest()?;

    std::thread::scope(|scope| {
        let rejected = scope.spawn(|| engine.ingest_file(&fixture("hr_sample.csv")));
        let reader = scope.spawn(|| engine.get_kpis().map(|k| k.total_rows));

        assert!(matches!(rejected.join().unwrap(), Err(InsightsError::Busy)));
        assert_eq!(reader.join().unwrap().unwrap(), 3);
    });

    drop(permit);
    engine.ingest_file(&fixture("hr_sample.csv"))?;
    assert_eq!(engine.get_kpis()?.total_rows, 10);
    Ok(())
}

#[test]
fn test_readers_during_ingestion_see_whole_snapshots() -> Result<()> {
    let engine = engine();
    engine.ingest_file(&fixture("no_salary.csv"))?;
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        let reader = scope.spawn(|| {
            let mut seen = Vec::new();
            while !done.load(Ordering::Acquire) {
                let kpis = engine.get_kpis().unwrap();
                seen.push((kpis.total_rows, kpis.attrition_count));
            }
            seen
        });

        for _ in 0..5 {
            engine.ingest_file(&fixture("hr_sample.csv")).unwrap();
            engine.ingest_file(&fixture("no_salary.csv")).unwrap();
        }
        done.store(true, Ordering::Release);

        for (rows, attrition) in reader.join().unwrap() {
            assert!(
                matches!((rows, attrition), (3, 1) | (10, 3)),
                "reader saw a mixed snapshot: rows={rows} attrition={attrition}"
            );
        }
    });
    Ok(())
}

#[test]
fn test_cancel_keeps_previous_dataset() -> Result<()> {
    let engine = engine();
    engine.ingest_file(&fixture("no_salary.csv"))?;

    let raw = RawTable::new(vec!["Name".to_owned()], vec![vec!["Z".into()]]);
    let err = engine
        .ingest_cancellable(raw, &AtomicBool::new(true))
        .unwrap_err();
    assert!(matches!(err, InsightsError::Aborted));
    assert_eq!(engine.get_kpis()?.total_rows, 3);
    Ok(())
}

#[test]
fn test_config_file_changes_buckets() -> Result<()> {
    let temp = tempfile::TempDir::new()?;
    let path = temp.path().join("engine.json");
    std::fs::write(
        &path,
        r#"{ "charts": { "bucket_count": 4 }, "kpi": { "identifier": { "column": "Name" } } }"#,
    )?;

    let engine = InsightsEngine::new(EngineConfig::load(&path)?)?;
    engine.ingest_file(&fixture("hr_sample.csv"))?;

    let charts = engine.get_charts()?;
    assert_eq!(charts.get(ChartSet::SALARY_BUCKETS).unwrap().len(), 4);
    assert_eq!(engine.get_kpis()?.unique_employees, 10);
    Ok(())
}

#[test]
fn test_workbook_end_to_end() -> Result<()> {
    let engine = engine();
    let summary = engine.ingest_file(&fixture("staff.xlsx"))?;

    assert_eq!(summary.row_count, 4);
    assert_eq!(summary.numeric_columns, vec!["EmployeeID", "MonthlyIncome"]);
    let income = summary.numeric_stats["MonthlyIncome"].as_ref().unwrap();
    assert_eq!(income.count, 3);
    assert_eq!(income.missing_count, 1);
    assert!((income.max - 6100.5).abs() < f64::EPSILON);

    let kpis = engine.get_kpis()?;
    assert_eq!(kpis.unique_employees, 4);
    assert_eq!(kpis.attrition_count, 2);
    assert!((kpis.attrition_rate - 0.5).abs() < 1e-12);
    assert_eq!(
        kpis.department_distribution,
        Some(vec![
            ChartPoint::new("Sales", 2),
            ChartPoint::new("Research & Development", 1),
            ChartPoint::new("Human Resources", 1),
        ])
    );
    assert_eq!(engine.snapshot()?.source.as_deref(), Some("staff.xlsx"));
    Ok(())
}

#[test]
fn test_missing_file_is_ingestion_failure() -> Result<()> {
    let engine = engine();
    engine.ingest_file(&fixture("no_salary.csv"))?;

    let err = engine.ingest_file(&fixture("absent.csv")).unwrap_err();
    assert!(matches!(err, InsightsError::Parse(_)), "{err}");
    assert!(err.is_ingestion_failure());
    assert_eq!(engine.get_kpis()?.total_rows, 3);
    Ok(())
}

#[test]
fn test_cancelled_file_ingest_keeps_previous_dataset() -> Result<()> {
    let engine = engine();
    engine.ingest_file(&fixture("no_salary.csv"))?;

    let err = engine
        .ingest_file_cancellable(&fixture("hr_sample.csv"), &AtomicBool::new(true))
        .unwrap_err();
    assert!(matches!(err, InsightsError::Aborted));
    assert_eq!(engine.get_kpis()?.total_rows, 3);

    engine.ingest_file_cancellable(&fixture("staff.xlsx"), &AtomicBool::new(false))?;
    assert_eq!(engine.get_kpis()?.total_rows, 4);
    Ok(())
}
