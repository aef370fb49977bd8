//! Integration tests for the boot → preheat → ready lifecycle, read gating,
//! and console commands.

use crate::mock_hw::{MockEeprom, MockHardware, RecordingSink};

use gasmon::app::events::{AppEvent, DeferReason};
use gasmon::app::service::GasMonitor;
use gasmon::calibration::{CalibrationStore, PersistedRecord};
use gasmon::config::SensorConfig;
use gasmon::error::SampleError;
use gasmon::fsm::StateId;
use gasmon::sensors::gas::{GasId, Level};

/// adc_max chosen so raw 2000 is exactly 2.5 V, i.e. Rs == RL == 10 kΩ.
fn exact_config() -> SensorConfig {
    SensorConfig {
        adc_max: 4000,
        ..Default::default()
    }
}

fn calibrated_store(r0: f32) -> CalibrationStore<MockEeprom> {
    CalibrationStore::new(MockEeprom::with_contents(
        &PersistedRecord::new(r0).to_bytes(),
    ))
}

fn boot(
    config: SensorConfig,
    hw: &mut MockHardware,
    store: &mut CalibrationStore<MockEeprom>,
) -> (GasMonitor, RecordingSink) {
    let mut mon = GasMonitor::new(config);
    let mut sink = RecordingSink::new();
    mon.start(hw, store, &mut sink);
    (mon, sink)
}

// ── Boot ──────────────────────────────────────────────────────

#[test]
fn boot_with_stored_calibration_enters_preheating_calibrated() {
    let mut hw = MockHardware::constant(2000);
    let mut store = calibrated_store(10.0);
    let (mon, sink) = boot(exact_config(), &mut hw, &mut store);

    assert_eq!(mon.state(), StateId::Preheating);
    assert!(mon.is_calibrated());
    assert!(!mon.is_preheated());
    assert_eq!(mon.r0_kohm(), Some(10.0));
    assert!(matches!(
        sink.events[0],
        AppEvent::CalibrationLoaded { r0_kohm } if r0_kohm == 10.0
    ));
    assert!(matches!(
        sink.last(),
        Some(AppEvent::Started {
            state: StateId::Preheating,
            calibrated: true
        })
    ));
}

#[test]
fn boot_with_blank_storage_is_uncalibrated() {
    let mut hw = MockHardware::constant(2000);
    let mut store = CalibrationStore::new(MockEeprom::new());
    let (mon, sink) = boot(exact_config(), &mut hw, &mut store);

    assert!(!mon.is_calibrated());
    assert_eq!(mon.r0_kohm(), None);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::CalibrationMissing)),
        1
    );
    // Booting never samples unless calibrate_on_boot is set.
    assert_eq!(hw.reads, 0);
}

// ── Preheat gating ────────────────────────────────────────────

#[test]
fn reads_are_deferred_until_preheat_completes() {
    let mut hw = MockHardware::constant(2000);
    let mut store = calibrated_store(10.0);
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    for t in (2_000..20_000).step_by(2_000) {
        hw.set_now(t);
        mon.step(&mut hw, &mut sink);
    }
    assert_eq!(mon.state(), StateId::Preheating);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::ReadDeferred(DeferReason::NotPreheated))),
        9
    );
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Reading(_))), 0);
    assert_eq!(hw.reads, 0);
}

#[test]
fn ready_is_reached_at_preheat_boundary_and_never_left() {
    let mut hw = MockHardware::constant(2000);
    let mut store = calibrated_store(10.0);
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    hw.set_now(19_999);
    mon.step(&mut hw, &mut sink);
    assert_eq!(mon.state(), StateId::Preheating);

    hw.set_now(20_000);
    mon.step(&mut hw, &mut sink);
    assert_eq!(mon.state(), StateId::Ready);
    assert!(mon.is_preheated());

    for _ in 0..50 {
        hw.advance(1_000);
        mon.step(&mut hw, &mut sink);
    }
    assert_eq!(mon.state(), StateId::Ready);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::StateChanged {
                from: StateId::Preheating,
                to: StateId::Ready
            }
        )),
        1
    );
}

// ── Reads ─────────────────────────────────────────────────────

#[test]
fn clean_air_read_after_preheat_reports_all_gases() {
    let mut hw = MockHardware::constant(2000);
    let mut store = calibrated_store(10.0);
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    hw.set_now(20_000);
    mon.step(&mut hw, &mut sink);

    let reading = match sink.last() {
        Some(AppEvent::Reading(r)) => *r,
        other => panic!("expected a reading, got {other:?}"),
    };
    assert_eq!(reading.timestamp_ms, 20_000);
    assert!((reading.voltage - 2.5).abs() < 1e-4);
    assert!((reading.rs_kohm - 10.0).abs() < 1e-3);
    assert!((reading.concentrations.ratio - 1.0).abs() < 1e-4);

    // (1 / 102.2)^(1 / -2.473)
    let nh3 = reading.concentrations.get(GasId::Nh3);
    assert!((nh3.ppm - 6.49).abs() < 0.05, "NH3 = {}", nh3.ppm);
    assert_eq!(nh3.level, Level::Ok);

    let co2 = reading.concentrations.get(GasId::Co2);
    let pct = co2.percent.expect("CO2 carries a percentage");
    assert!((pct - co2.ppm / 100.0).abs() < 1e-4);
    for g in GasId::ALL {
        if g != GasId::Co2 {
            assert_eq!(reading.concentrations.get(g).percent, None);
        }
    }
}

#[test]
fn reads_follow_the_two_second_interval() {
    let mut hw = MockHardware::constant(2000);
    let mut store = calibrated_store(10.0);
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    hw.set_now(20_000);
    mon.step(&mut hw, &mut sink);
    sink.clear();

    // Sampling advanced the clock by its inter-sample delays only.
    hw.set_now(21_000);
    mon.step(&mut hw, &mut sink);
    hw.set_now(21_999);
    mon.step(&mut hw, &mut sink);
    assert!(sink.events.is_empty());

    hw.set_now(22_000);
    mon.step(&mut hw, &mut sink);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::Reading(_))), 1);
}

#[test]
fn uncalibrated_ready_engine_defers_reads() {
    let mut hw = MockHardware::constant(2000);
    let mut store = CalibrationStore::new(MockEeprom::new());
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    hw.set_now(20_000);
    mon.step(&mut hw, &mut sink);
    assert_eq!(mon.state(), StateId::Ready);
    assert!(matches!(
        sink.last(),
        Some(AppEvent::ReadDeferred(DeferReason::NotCalibrated))
    ));
    assert_eq!(hw.reads, 0);
}

#[test]
fn failed_sampling_pass_skips_the_cycle() {
    let mut hw = MockHardware::constant(-1);
    let mut store = calibrated_store(10.0);
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    hw.set_now(20_000);
    mon.step(&mut hw, &mut sink);
    assert!(matches!(
        sink.last(),
        Some(AppEvent::SampleFailed(SampleError::TooFewValid { valid: 0 }))
    ));
    // State untouched by a failed cycle.
    assert!(mon.is_calibrated());
    assert_eq!(mon.r0_kohm(), Some(10.0));

    hw.set_source(|_| 2000);
    hw.set_now(22_000);
    mon.step(&mut hw, &mut sink);
    assert!(matches!(sink.last(), Some(AppEvent::Reading(_))));

    let status = mon.status();
    assert_eq!(status.reads_ok, 1);
    assert_eq!(status.reads_failed, 1);
}

#[test]
fn saturated_output_is_reported_as_out_of_range() {
    // Full-scale reads average to the supply voltage: no valid Rs.
    let mut hw = MockHardware::constant(4000);
    let mut store = calibrated_store(10.0);
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    hw.set_now(20_000);
    mon.step(&mut hw, &mut sink);
    assert!(matches!(
        sink.last(),
        Some(AppEvent::SampleFailed(SampleError::VoltageOutOfRange { .. }))
    ));
}

#[test]
fn polluted_air_raises_levels() {
    let mut hw = MockHardware::constant(2000);
    let mut store = calibrated_store(10.0);
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    // 4.94 V: Rs falls to ~0.13 kΩ, ratio ~0.013.
    hw.set_source(|_| 3950);
    hw.set_now(20_000);
    mon.step(&mut hw, &mut sink);
    let reading = match sink.last() {
        Some(AppEvent::Reading(r)) => *r,
        other => panic!("expected a reading, got {other:?}"),
    };
    assert!(reading.concentrations.ratio < 0.015);
    assert_eq!(reading.concentrations.get(GasId::Benzene).level, Level::Danger);
    assert_eq!(reading.concentrations.worst_level(), Level::Danger);
}

// ── Commands ──────────────────────────────────────────────────

#[test]
fn info_command_reports_status() {
    let mut hw = MockHardware::constant(2000);
    let mut store = calibrated_store(10.0);
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    hw.set_now(12_500);
    mon.handle_line("  INFO\r\n", &mut hw, &mut store, &mut sink);
    match sink.last() {
        Some(AppEvent::Status(s)) => {
            assert_eq!(s.state, StateId::Preheating);
            assert!(s.calibrated);
            assert_eq!(s.r0_kohm, Some(10.0));
            assert_eq!(s.uptime_ms, 12_500);
            assert_eq!(s.preheat_remaining_ms, 7_500);
            assert_eq!(s.next_read_in_ms, 0);
        }
        other => panic!("expected status, got {other:?}"),
    }
}

#[test]
fn unknown_and_blank_lines() {
    let mut hw = MockHardware::constant(2000);
    let mut store = calibrated_store(10.0);
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);
    sink.clear();

    mon.handle_line("   ", &mut hw, &mut store, &mut sink);
    assert!(sink.events.is_empty());

    mon.handle_line("status", &mut hw, &mut store, &mut sink);
    match sink.last() {
        Some(AppEvent::UnknownCommand(c)) => assert_eq!(c.0.as_str(), "status"),
        other => panic!("expected unknown command, got {other:?}"),
    }
    assert!(mon.is_calibrated());
}

#[test]
fn reset_command_clears_storage_and_gates_reads() {
    let mut hw = MockHardware::constant(2000);
    let mut store = calibrated_store(10.0);
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    hw.set_now(20_000);
    mon.step(&mut hw, &mut sink);
    assert!(matches!(sink.last(), Some(AppEvent::Reading(_))));

    mon.handle_line("reset", &mut hw, &mut store, &mut sink);
    assert!(matches!(sink.last(), Some(AppEvent::CalibrationCleared)));
    assert!(!mon.is_calibrated());
    assert_eq!(mon.r0_kohm(), None);
    assert_eq!(&store.eeprom().committed[..8], &[0u8; 8]);
    assert_eq!(store.load(), None);

    hw.set_now(22_000);
    mon.step(&mut hw, &mut sink);
    assert!(matches!(
        sink.last(),
        Some(AppEvent::ReadDeferred(DeferReason::NotCalibrated))
    ));
    // Preheat is not repeated.
    assert_eq!(mon.state(), StateId::Ready);
}

#[test]
fn reset_is_idempotent() {
    let mut hw = MockHardware::constant(2000);
    let mut store = CalibrationStore::new(MockEeprom::new());
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    mon.reset(&mut store, &mut sink).unwrap();
    mon.reset(&mut store, &mut sink).unwrap();
    assert!(!mon.is_calibrated());
    assert_eq!(store.load(), None);
}

#[test]
fn failed_reset_still_drops_calibration() {
    let mut hw = MockHardware::constant(2000);
    let mut store = calibrated_store(10.0);
    let (mut mon, mut sink) = boot(exact_config(), &mut hw, &mut store);

    store.eeprom_mut().fail_writes = true;
    assert!(mon.reset(&mut store, &mut sink).is_err());
    assert!(matches!(sink.last(), Some(AppEvent::ResetFailed(_))));
    assert!(!mon.is_calibrated());
}
