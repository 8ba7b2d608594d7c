use std::fs;
use std::path::Path;

use tempfile::tempdir;
use tt1_analysis::discharge::loader::HEADER_LINES;
use tt1_analysis::discharge::plot::prepare_panels;
use tt1_analysis::{
    render_summary, unit_for, Calculator, DischargeError, PhysicsConstants, PlotConfig,
    ShotRecord, SummaryField, SummaryFormat,
};

/// Writes a channel export: 8 header lines then `time value` rows at 1 ms.
fn export(root: &Path, shot: u32, channel: &str, values: &[f64]) {
    let dir = root.join(shot.to_string());
    fs::create_dir_all(&dir).unwrap();
    let mut text = String::from("TT-1 export\n");
    text.push_str(&format!("Shot = {shot}\n"));
    text.push_str("Create = 2024/06/12 09:41:07\n");
    text.push_str(&"#\n".repeat(HEADER_LINES - 3));
    for (i, v) in values.iter().enumerate() {
        text.push_str(&format!("{}.0\t{v:e}\n", i));
    }
    fs::write(dir.join(format!("{channel}.txt")), text).unwrap();
}

fn pulse(height: f64, rise: usize, fall: usize, len: usize) -> Vec<f64> {
    (0..len)
        .map(|i| if (rise..fall).contains(&i) { height } else { 0.0 })
        .collect()
}

#[test]
fn two_shots_load_summarise_and_plot() {
    let root = tempdir().unwrap();
    for (shot, fall) in [(1201, 30), (1202, 40)] {
        export(root.path(), shot, "IP1", &pulse(20e3, 10, fall, 60));
        export(root.path(), shot, "HCN1", &pulse(2.5, 10, fall, 60));
        export(root.path(), shot, "IT1", &pulse(-6500.0, 0, 60, 60));
    }

    let shots: Vec<ShotRecord> = [1201, 1202]
        .into_iter()
        .map(|n| {
            let mut shot = ShotRecord::new(n, root.path());
            shot.load_channels(["IP1", "HCN1", "IT1"]).unwrap();
            shot
        })
        .collect();

    let first = shots[0].summary();
    assert_eq!(first.require(SummaryField::DischargeStart).unwrap(), 10.0);
    assert_eq!(first.require(SummaryField::DischargeEnd).unwrap(), 29.0);
    assert_eq!(shots[1].summary().discharge_duration(), Some(29.0));
    let ne = first.average_density.unwrap();
    assert!((ne - 2.5 * 1.7e19 / 5.0).abs() / ne < 1e-9);
    assert!((first.peak_field.unwrap() - 1.2820298031567656).abs() < 1e-9);
    assert_eq!(shots[0].acquired(), Some("2024/06/12 09:41:07"));

    let csv = render_summary(&shots[0], SummaryFormat::Csv).unwrap();
    assert!(csv.contains("Discharge duration [ms], 19"));

    let panels = prepare_panels(&shots, &["IP1", "NE1", "BT0"], &PlotConfig::default()).unwrap();
    assert_eq!(panels.len(), 3);
    assert_eq!(panels[1].label, format!("NE1 [{}]", unit_for("NE1")));
    assert!(panels.iter().all(|p| p.traces.len() == 2));
}

#[test]
fn custom_threshold_changes_the_window() {
    let root = tempdir().unwrap();
    let mut current = pulse(10.0, 5, 15, 20);
    current[3] = 2.0;
    export(root.path(), 77, "IP2", &current);

    let mut default = ShotRecord::new(77, root.path());
    default.load_channel("IP2").unwrap();
    assert_eq!(default.summary().discharge.unwrap().start, 3.0);

    let strict = Calculator::new(PhysicsConstants {
        current_threshold_fraction: 0.5,
        ..PhysicsConstants::default()
    });
    let mut shot = ShotRecord::with_calculator(77, root.path(), strict);
    shot.load_channel("IP2").unwrap();
    assert_eq!(shot.summary().discharge.unwrap().start, 5.0);
}

#[test]
fn broken_file_keeps_earlier_channels() {
    let root = tempdir().unwrap();
    export(root.path(), 5, "IP1", &pulse(1.0, 2, 4, 8));
    let dir = root.path().join("5");
    let mut text = "header\n".repeat(HEADER_LINES);
    text.push_str("0.0 1.0\n1.0 oops\n");
    fs::write(dir.join("HCN1.txt"), text).unwrap();

    let mut shot = ShotRecord::new(5, root.path());
    let err = shot.load_channels(["IP1", "HCN1"]).unwrap_err();
    assert!(matches!(err, DischargeError::MalformedData { line: 10, .. }));
    assert!(shot.channel("IP1").is_some());
    assert!(shot.channel("NE1").is_none());
}
