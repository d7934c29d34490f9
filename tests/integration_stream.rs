//! End-to-end tests for magnaprobe logger correction
//!
//! Writes a receiver solution log and a logger file to a temporary
//! directory and runs the full load, match and write pipeline.

use gnss_matcher::cli::{CommonArgs, StreamArgs, run_stream};
use gnss_matcher::{
    CorrectionConfig, CorrectionError, CorrectionMode, ReferenceTrackLoader, StreamCorrector,
    Table, TimeNormalizer,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const POS_LOG: &str = "% program   : Emlid Studio v1.7
% inp file  : rover.24O
% inp file  : base.24O
% obs start : 2023/12/15 17:11:00.0 GPST
% obs end   : 2023/12/15 17:12:00.0 GPST
% pos mode  : Kinematic
% elev mask : 15.0 deg
% ionos opt : Broadcast
% ref pos   :  45.000000000  -75.000000000    10.0000
%  GPST   latitude(deg) longitude(deg)  height(m)   Q  ns
2023/12/15 17:11:30.000   45.100000000  -75.100000000    98.1234   1  12
2023/12/15 17:11:35.000   45.100100000  -75.100100000    98.1200   1  12
2023/12/15 17:11:40.000   45.100200000  -75.100200000    98.1100   1  12
2023/12/15 17:11:45.000   45.100300000  -75.100300000    98.1000   1  12
";

const LOGGER: &str = r#""TOA5","magnaprobe","CR800","1234","CR800.Std.32","CPU:magna.CR8","5678","Table1"
"TIMESTAMP","RECORD","Counter","DepthCm","BattVolts","ThisUTCtime","latitude_a","latitude_b","Longitude_a","Longitude_b","fix_quality","nmbr_satellites","HDOP"
"2023-12-15 17:11:10",1,1,61.2,12.7,"171110",45,6.0,-75,-6.0,1,9,0.9
"2023-12-15 17:11:15",2,2,58.0,12.7,"171115",45,6.1,-75,-6.1,1,9,0.9
"2023-12-15 17:11:19",3,3,,12.7,"171119",45,6.2,-75,-6.2,1,9,0.9
"2023-12-15 17:11:21",4,4,57.4,12.7,"171121",45,6.3,-75,-6.3,1,9,0.9
"2023-12-15 17:11:30",5,5,55.0,12.7,"171130",45,6.4,-75,-6.4,1,9,0.9
"#;

fn write_fixtures(temp_dir: &TempDir) -> (PathBuf, PathBuf) {
    let reference = temp_dir.path().join("rover.pos");
    let logger = temp_dir.path().join("magna.dat");
    fs::write(&reference, POS_LOG).unwrap();
    fs::write(&logger, LOGGER).unwrap();
    (reference, logger)
}

fn common() -> CommonArgs {
    CommonArgs {
        leap_seconds: None,
        reference_skip_lines: None,
        verbose: 0,
        quiet: true,
    }
}

#[test]
fn test_full_stream_correction_writes_output() {
    let temp_dir = TempDir::new().unwrap();
    let (reference, logger) = write_fixtures(&temp_dir);
    let output = temp_dir.path().join("magna_corrected.csv");

    let stats = run_stream(&StreamArgs {
        stream_path: logger,
        reference_path: reference,
        output_path: output.clone(),
        correction: "PPK_correction".to_string(),
        common: common(),
    })
    .unwrap();

    // 17:11:10 + 18s = 17:11:28 is before the track; the 17:11:19 row is
    // incomplete; 17:11:30 + 18s = 17:11:48 is after it
    assert_eq!(stats.rows_read, 4);
    assert_eq!(stats.rows_retained, 2);
    assert_eq!(stats.rows_outside_track, 2);

    let written = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "TIMESTAMP,Counter,DepthCm,ThisUTCtime,lat_emlid,lon_emlid");
    // 17:11:15 + 18s = 17:11:33 takes the 17:11:35 fix
    assert_eq!(lines[1], "2023-12-15 17:11:15,2,58.0,171115,45.1001,-75.1001");
    // 17:11:21 + 18s = 17:11:39 takes the 17:11:40 fix
    assert_eq!(lines[2], "2023-12-15 17:11:21,4,57.4,171121,45.1002,-75.1002");
    assert_eq!(lines.len(), 3);
}

#[test]
fn test_no_overlap_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let (reference, logger) = write_fixtures(&temp_dir);
    let output = temp_dir.path().join("magna_corrected.csv");

    let result = run_stream(&StreamArgs {
        stream_path: logger,
        reference_path: reference,
        output_path: output.clone(),
        correction: "PPK_correction".to_string(),
        common: CommonArgs {
            leap_seconds: Some(-60),
            ..common()
        },
    });

    let error = result.unwrap_err();
    assert!(matches!(
        error.downcast_ref::<CorrectionError>(),
        Some(CorrectionError::NoOverlap { records: 4, .. })
    ));
    assert!(!output.exists());
}

#[test]
fn test_unknown_mode_fails_before_reading() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("out.csv");

    let error = run_stream(&StreamArgs {
        stream_path: temp_dir.path().join("missing.dat"),
        reference_path: temp_dir.path().join("missing.pos"),
        output_path: output.clone(),
        correction: "RTK_correction".to_string(),
        common: common(),
    })
    .unwrap_err();

    assert!(matches!(
        error.downcast_ref::<CorrectionError>(),
        Some(CorrectionError::Configuration { .. })
    ));
    assert!(!output.exists());
}

#[test]
fn test_library_pipeline_matches_cli() {
    let temp_dir = TempDir::new().unwrap();
    let (reference, logger) = write_fixtures(&temp_dir);
    let config = CorrectionConfig::default();

    let track = ReferenceTrackLoader::new(&config)
        .load(&reference, CorrectionMode::FixedColumn)
        .unwrap();
    let table: Table = StreamCorrector::read_stream(&logger, &config.stream).unwrap();
    let outcome = StreamCorrector::new(&track, &config.stream, TimeNormalizer::default())
        .correct(&table)
        .unwrap();

    let latitudes: Vec<f64> = outcome
        .records
        .iter()
        .map(|record| record.corrected.latitude)
        .collect();
    assert_eq!(latitudes, vec![45.1001, 45.1002]);
}

#[test]
fn test_logger_rows_without_fix_are_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let (reference, logger) = write_fixtures(&temp_dir);
    let without_fix = LOGGER.replace(
        "\"171121\",45,6.3,-75,-6.3",
        "\"171121\",NAN,NAN,NAN,NAN",
    );
    fs::write(&logger, without_fix).unwrap();
    let output = temp_dir.path().join("magna_corrected.csv");

    let stats = run_stream(&StreamArgs {
        stream_path: logger,
        reference_path: reference,
        output_path: output.clone(),
        correction: "PPK_correction".to_string(),
        common: common(),
    })
    .unwrap();

    assert_eq!(stats.rows_read, 3);
    assert_eq!(stats.rows_retained, 1);
    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written.lines().count(), 2);
    assert!(written.contains("2023-12-15 17:11:15,2,58.0,171115,45.1001,-75.1001"));
}
