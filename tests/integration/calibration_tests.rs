//! Integration tests for clean-air calibration and its persistence.

use crate::mock_hw::{MockEeprom, MockHardware, RecordingSink};

use gasmon::app::commands::AppCommand;
use gasmon::app::events::AppEvent;
use gasmon::app::service::GasMonitor;
use gasmon::calibration::{CALIBRATION_MAGIC, CalibrationStore, PersistedRecord};
use gasmon::config::SensorConfig;
use gasmon::error::{CalibrationError, StoreError};
use gasmon::fsm::StateId;

/// Samples per pass in the default config.
const PASS: usize = 20;

fn exact_config() -> SensorConfig {
    SensorConfig {
        adc_max: 4000,
        ..Default::default()
    }
}

fn start(
    config: SensorConfig,
    hw: &mut MockHardware,
    store: &mut CalibrationStore<MockEeprom>,
) -> (GasMonitor, RecordingSink) {
    let mut mon = GasMonitor::new(config);
    let mut sink = RecordingSink::new();
    mon.start(hw, store, &mut sink);
    (mon, sink)
}

// ── Success ───────────────────────────────────────────────────

#[test]
fn clean_air_calibration_derives_and_persists_r0() {
    // 2.5 V on a 10 kΩ load: Rs = 10 kΩ, R0 = 10 / 3.6.
    let mut hw = MockHardware::constant(2000);
    let mut store = CalibrationStore::new(MockEeprom::new());
    let (mut mon, mut sink) = start(exact_config(), &mut hw, &mut store);

    mon.handle_command(AppCommand::Calibrate, &mut hw, &mut store, &mut sink);

    let expected = 10.0 / 3.6;
    let r0 = mon.r0_kohm().expect("calibrated");
    assert!((r0 - expected).abs() < 1e-4, "R0 = {r0}");
    assert!(matches!(
        sink.last(),
        Some(AppEvent::Calibrated { accepted: 100, .. })
    ));

    // Sentinel and R0 in the committed image.
    let committed = &store.eeprom().committed;
    let magic = f32::from_le_bytes(committed[0..4].try_into().unwrap());
    let stored = f32::from_le_bytes(committed[4..8].try_into().unwrap());
    assert_eq!(magic, CALIBRATION_MAGIC);
    assert_eq!(stored, r0);

    // A cold boot over the same bytes recovers the value.
    let mut rebooted = CalibrationStore::new(MockEeprom::with_contents(committed));
    assert_eq!(rebooted.load(), Some(r0));
}

#[test]
fn calibration_run_timing_and_progress() {
    let mut hw = MockHardware::constant(2000);
    let mut store = CalibrationStore::new(MockEeprom::new());
    let (mut mon, mut sink) = start(exact_config(), &mut hw, &mut store);

    mon.calibrate(&mut hw, &mut store, &mut sink).unwrap();

    assert_eq!(hw.reads, 100 * PASS);
    // 99 inter-attempt waits plus 19 inter-sample waits per pass.
    assert_eq!(hw.delayed_ms, 99 * 200 + 100 * 19);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CalibrationStarted { attempts: 100 })),
        1
    );
    let progress: Vec<(u16, u16)> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::CalibrationProgress { attempt, accepted } => Some((*attempt, *accepted)),
            _ => None,
        })
        .collect();
    assert_eq!(progress.len(), 10);
    assert_eq!(progress[0], (10, 10));
    assert_eq!(progress[9], (100, 100));
}

#[test]
fn exactly_ten_accepted_is_enough() {
    let mut hw = MockHardware::scripted(|i| if i / PASS < 10 { 2000 } else { -1 });
    let mut store = CalibrationStore::new(MockEeprom::new());
    let (mut mon, mut sink) = start(exact_config(), &mut hw, &mut store);

    let r0 = mon.calibrate(&mut hw, &mut store, &mut sink).unwrap();
    assert!((r0 - 10.0 / 3.6).abs() < 1e-4);
    assert!(matches!(
        sink.last(),
        Some(AppEvent::Calibrated { accepted: 10, .. })
    ));
}

#[test]
fn outliers_within_passes_do_not_skew_r0() {
    // One spike per pass; the spike is beyond 1.5 sigma and dropped.
    let mut hw = MockHardware::scripted(|i| if i % PASS == 7 { 3900 } else { 2000 });
    let mut store = CalibrationStore::new(MockEeprom::new());
    let (mut mon, mut sink) = start(exact_config(), &mut hw, &mut store);

    let r0 = mon.calibrate(&mut hw, &mut store, &mut sink).unwrap();
    assert!((r0 - 10.0 / 3.6).abs() < 1e-3, "R0 = {r0}");
}

#[test]
fn calibration_before_preheat_is_allowed() {
    let mut hw = MockHardware::constant(2000);
    let mut store = CalibrationStore::new(MockEeprom::new());
    let (mut mon, mut sink) = start(exact_config(), &mut hw, &mut store);

    assert_eq!(mon.state(), StateId::Preheating);
    mon.handle_line("Calibrate", &mut hw, &mut store, &mut sink);
    assert!(mon.is_calibrated());
    assert_eq!(mon.state(), StateId::Preheating);
}

#[test]
fn recalibration_overwrites_previous_r0() {
    let mut hw = MockHardware::constant(2000);
    let mut store = CalibrationStore::new(MockEeprom::with_contents(
        &PersistedRecord::new(42.0).to_bytes(),
    ));
    let (mut mon, mut sink) = start(exact_config(), &mut hw, &mut store);
    assert_eq!(mon.r0_kohm(), Some(42.0));

    let r0 = mon.calibrate(&mut hw, &mut store, &mut sink).unwrap();
    assert_eq!(mon.r0_kohm(), Some(r0));
    assert_eq!(store.load(), Some(r0));
}

#[test]
fn calibrate_on_boot_runs_when_uncalibrated() {
    let mut hw = MockHardware::constant(2000);
    let mut store = CalibrationStore::new(MockEeprom::new());
    let config = SensorConfig {
        calibrate_on_boot: true,
        ..exact_config()
    };
    let (mon, sink) = start(config, &mut hw, &mut store);

    assert!(mon.is_calibrated());
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Calibrated { .. })), 1);
}

#[test]
fn calibrate_on_boot_skipped_when_stored() {
    let mut hw = MockHardware::constant(2000);
    let mut store = CalibrationStore::new(MockEeprom::with_contents(
        &PersistedRecord::new(10.0).to_bytes(),
    ));
    let config = SensorConfig {
        calibrate_on_boot: true,
        ..exact_config()
    };
    let (mon, _sink) = start(config, &mut hw, &mut store);

    assert_eq!(mon.r0_kohm(), Some(10.0));
    assert_eq!(hw.reads, 0);
}

// ── Failure ───────────────────────────────────────────────────

#[test]
fn eight_of_hundred_valid_fails_and_keeps_prior_calibration() {
    let mut hw = MockHardware::scripted(|i| if i / PASS < 8 { 2000 } else { -1 });
    let prior = PersistedRecord::new(10.0).to_bytes();
    let mut store = CalibrationStore::new(MockEeprom::with_contents(&prior));
    let (mut mon, mut sink) = start(exact_config(), &mut hw, &mut store);
    let commits_before = store.eeprom().commits;

    let err = mon.calibrate(&mut hw, &mut store, &mut sink).unwrap_err();
    assert_eq!(
        err,
        CalibrationError::InsufficientSamples {
            accepted: 8,
            required: 10
        }
    );
    assert!(matches!(
        sink.last(),
        Some(AppEvent::CalibrationFailed(CalibrationError::InsufficientSamples { .. }))
    ));
    assert!(mon.is_calibrated());
    assert_eq!(mon.r0_kohm(), Some(10.0));
    assert_eq!(store.eeprom().commits, commits_before);
    assert_eq!(&store.eeprom().committed[..8], &prior);
}

#[test]
fn eight_of_hundred_valid_leaves_fresh_engine_uncalibrated() {
    let mut hw = MockHardware::scripted(|i| if i / PASS < 8 { 2000 } else { -1 });
    let mut store = CalibrationStore::new(MockEeprom::new());
    let (mut mon, mut sink) = start(exact_config(), &mut hw, &mut store);

    mon.handle_command(AppCommand::Calibrate, &mut hw, &mut store, &mut sink);
    assert!(!mon.is_calibrated());
    assert_eq!(mon.r0_kohm(), None);
    assert_eq!(store.load(), None);
}

#[test]
fn storage_failure_rejects_the_run() {
    let mut hw = MockHardware::constant(2000);
    let mut eeprom = MockEeprom::new();
    eeprom.fail_writes = true;
    let mut store = CalibrationStore::new(eeprom);
    let (mut mon, mut sink) = start(exact_config(), &mut hw, &mut store);

    let err = mon.calibrate(&mut hw, &mut store, &mut sink).unwrap_err();
    assert_eq!(err, CalibrationError::Store(StoreError::Io));
    assert!(!mon.is_calibrated());
}

#[test]
fn implausible_r0_is_not_adopted() {
    // 0.06 V: Rs ≈ 823 kΩ, R0 ≈ 229 kΩ, above the plausible range.
    let mut hw = MockHardware::constant(48);
    let mut store = CalibrationStore::new(MockEeprom::new());
    let (mut mon, mut sink) = start(exact_config(), &mut hw, &mut store);

    let err = mon.calibrate(&mut hw, &mut store, &mut sink).unwrap_err();
    assert_eq!(err, CalibrationError::Store(StoreError::Range));
    assert!(!mon.is_calibrated());
    assert_eq!(store.eeprom().commits, 0);
}

// ── Storage ───────────────────────────────────────────────────

#[test]
fn fresh_zeroed_storage_has_no_calibration() {
    let mut store = CalibrationStore::new(MockEeprom::with_contents(&[0u8; 512]));
    assert_eq!(store.load(), None);
}

#[test]
fn corrupted_sentinel_is_not_loaded() {
    let mut bytes = PersistedRecord::new(10.0).to_bytes();
    bytes[1] ^= 0x40;
    let mut store = CalibrationStore::new(MockEeprom::with_contents(&bytes));
    assert_eq!(store.load(), None);
}
