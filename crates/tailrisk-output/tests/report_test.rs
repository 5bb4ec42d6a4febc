//! Integration tests for report assembly from a computed sweep.

use tailrisk_output::{ReportBuilder, VarReport};
use tailrisk_risk::{SimulationMethod, SweepConfig, parametric_sweep};

fn returns() -> Vec<f64> {
    vec![
        0.004, -0.011, 0.007, 0.013, -0.006, -0.002, 0.009, -0.014, 0.001, 0.006, -0.003, 0.010,
    ]
}

#[test]
fn test_parametric_sweep_report_round_trip() {
    let config = SweepConfig {
        window: 10,
        methods: vec![SimulationMethod::Normal],
        ..SweepConfig::default()
    };
    let cells = parametric_sweep(&returns(), &config);

    let report = ReportBuilder::new()
        .subject("TEST")
        .window(config.window)
        .observations(returns().len())
        .cells(&cells)
        .build()
        .unwrap();

    assert_eq!(report.rows.len(), 6);
    assert!(report.rows.iter().all(|r| r.method == "parametric"));
    assert_eq!(report.failures().count(), 0);

    let path = std::env::temp_dir().join(format!("tailrisk-report-{}.json", std::process::id()));
    report.write_json(&path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    let restored: VarReport = serde_json::from_str(&written).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(restored.subject, "TEST");
    assert_eq!(restored.rows.len(), report.rows.len());
    for (a, b) in restored.rows.iter().zip(&report.rows) {
        assert_eq!((a.confidence, a.horizon), (b.confidence, b.horizon));
        assert!((a.var.unwrap() - b.var.unwrap()).abs() < 1e-12);
    }
}

#[test]
fn test_failed_rows_render_in_table() {
    let config = SweepConfig {
        window: 10,
        ..SweepConfig::default()
    };
    let cells = parametric_sweep(&[0.01], &config);

    let report = ReportBuilder::new()
        .subject("SHORT")
        .window(config.window)
        .observations(1)
        .cells(&cells)
        .build()
        .unwrap();

    assert_eq!(report.failures().count(), 6);
    let table = report.to_text_table();
    assert!(table.contains("n/a"));
    assert!(table.contains("Insufficient data"));
}
