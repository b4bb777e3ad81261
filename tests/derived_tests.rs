// Derived metrics: averages, drain rate, screen time, battery life, frame rate

mod common;

use common::{battery_reading, cpu_reading};
use devhealth::derived::*;
use devhealth::models::*;

fn resources(ts: u64, mem_pct: f64, temp: f64) -> ResourceReading {
    ResourceReading {
        timestamp: ts,
        memory: MemoryStats {
            total_bytes: 100,
            used_percent: mem_pct,
            ..MemoryStats::default()
        },
        storage: StorageStats::default(),
        device_temperature_c: temp,
        uptime_secs: 0,
    }
}

#[test]
fn empty_windows_return_zero() {
    assert_eq!(average_cpu(&[]), 0.0);
    assert_eq!(average_memory_percent(&[]), 0.0);
    assert_eq!(battery_drain_rate(&[]), 0.0);
    assert_eq!(min_max_avg_temperature(&[]), TemperatureRange::default());
    assert_eq!(frame_rate_stats(&[]), FrameRateStats::default());
    assert_eq!(anr_event_count(&[]), 0);
    assert_eq!(derive_stats(&StatsInputs::default()), DerivedStats::default());
}

#[test]
fn averages_over_window() {
    let cpu = [cpu_reading(1, 10.0), cpu_reading(2, 30.0), cpu_reading(3, 50.0)];
    assert_eq!(average_cpu(&cpu), 30.0);

    let res = [resources(1, 40.0, 30.0), resources(2, 60.0, 50.0)];
    assert_eq!(average_memory_percent(&res), 50.0);
    let t = min_max_avg_temperature(&res);
    assert_eq!((t.min, t.max, t.avg), (30.0, 50.0, 40.0));
}

#[test]
fn drain_rate_is_percent_per_hour() {
    // 80% -> 70% over 30 minutes
    let window = [
        battery_reading(0, 80.0, true),
        battery_reading(900_000, 76.0, true),
        battery_reading(1_800_000, 70.0, true),
    ];
    assert!((battery_drain_rate(&window) - 20.0).abs() < 1e-9);
}

#[test]
fn drain_rate_uses_time_order_not_insertion_order() {
    let window = [battery_reading(3_600_000, 50.0, false), battery_reading(0, 60.0, false)];
    assert!((battery_drain_rate(&window) - 10.0).abs() < 1e-9);
}

#[test]
fn drain_rate_is_negative_while_charging() {
    let window = [battery_reading(0, 50.0, false), battery_reading(3_600_000, 70.0, false)];
    assert!((battery_drain_rate(&window) + 20.0).abs() < 1e-9);
}

#[test]
fn drain_rate_zero_when_no_time_elapsed() {
    let window = [battery_reading(5, 80.0, false), battery_reading(5, 10.0, false)];
    assert_eq!(battery_drain_rate(&window), 0.0);
}

#[test]
fn zero_fallbacks_are_left_out_of_battery_and_resource_stats() {
    // first battery read failed: zero value (no battery, level 0), then 80% 100 ms later
    let window = [
        BatteryReading::zero(0),
        battery_reading(100, 80.0, true),
        battery_reading(3_600_100, 70.0, true),
    ];
    assert!((battery_drain_rate(&window) - 10.0).abs() < 1e-9);
    assert_eq!(battery_readings_present(&window), 2);
    assert_eq!(battery_drain_rate(&window[..2]), 0.0);
    assert_eq!(battery_readings_present(&window[..2]), 1);

    let res = [ResourceReading::zero(0), resources(1, 60.0, 40.0), resources(2, 40.0, 30.0)];
    assert_eq!(average_memory_percent(&res), 50.0);
    let t = min_max_avg_temperature(&res);
    assert_eq!((t.min, t.max, t.avg), (30.0, 40.0, 35.0));
    assert_eq!(min_max_avg_temperature(&res[..1]), TemperatureRange::default());
}

#[test]
fn screen_ratio() {
    assert_eq!(screen_on_ratio(0, 0), 0.0);
    assert_eq!(screen_on_ratio(3, 1), 75.0);
    assert_eq!(screen_on_ratio(5, 0), 100.0);
}

#[test]
fn screen_time_accumulates_per_tick() {
    let mut st = ScreenTime::default();
    st.record(1_000, true);
    assert_eq!((st.on_ms, st.off_ms), (0, 0));
    st.record(2_000, true);
    st.record(5_000, false);
    assert_eq!((st.on_ms, st.off_ms), (1_000, 3_000));
    assert_eq!(st.ratio_percent(), 25.0);
    // clock step backwards adds nothing
    st.record(4_000, true);
    assert_eq!((st.on_ms, st.off_ms), (1_000, 3_000));
}

#[test]
fn battery_life_tiers() {
    let status = |level, rate| estimate_battery_life(level, rate, 10).status;
    assert_eq!(status(90.0, 10.0), BatteryLifeStatus::Plenty);
    assert_eq!(status(50.0, 10.0), BatteryLifeStatus::Good);
    assert_eq!(status(30.0, 10.0), BatteryLifeStatus::Fair);
    assert_eq!(status(15.0, 10.0), BatteryLifeStatus::Low);
    assert_eq!(status(5.0, 10.0), BatteryLifeStatus::Critical);

    let est = estimate_battery_life(50.0, 20.0, 10);
    assert_eq!(est.remaining_hours, 2.5);
    assert_eq!(est.remaining_minutes, 150);
}

#[test]
fn battery_life_while_charging() {
    let est = estimate_battery_life(60.0, -15.0, 10);
    assert_eq!(est.status, BatteryLifeStatus::Charging);
    assert_eq!(est.remaining_hours, 0.0);
}

#[test]
fn battery_life_needs_two_readings() {
    let est = estimate_battery_life(50.0, 20.0, 1);
    assert_eq!(est.status, BatteryLifeStatus::InsufficientData);
    assert_eq!(est.remaining_minutes, 0);
}

#[test]
fn frame_rate_and_anr_counts() {
    let frames = [
        FrameReading { timestamp: 1, fps: 60.0 },
        FrameReading { timestamp: 2, fps: 30.0 },
        FrameReading { timestamp: 3, fps: 45.0 },
    ];
    let stats = frame_rate_stats(&frames);
    assert_eq!(stats.avg_fps, 45.0);
    assert_eq!(stats.min_fps, 30.0);
    assert_eq!(stats.max_fps, 60.0);
    assert_eq!(stats.samples, 3);

    let anr = [
        AnrReading { timestamp: 1, block_ms: 3, blocked: false },
        AnrReading { timestamp: 2, block_ms: 5_000, blocked: true },
    ];
    assert_eq!(anr_event_count(&anr), 1);
}

#[test]
fn derive_stats_combines_all_streams() {
    let cpu = [cpu_reading(1, 20.0), cpu_reading(2, 40.0)];
    let res = [resources(1, 70.0, 45.0)];
    let battery = [battery_reading(0, 90.0, true), battery_reading(3_600_000, 85.0, true)];
    let stats = derive_stats(&StatsInputs {
        cpu: &cpu,
        resources: &res,
        battery: &battery,
        screen_on_ms: 1,
        screen_off_ms: 3,
        ..StatsInputs::default()
    });
    assert_eq!(stats.avg_cpu, 30.0);
    assert_eq!(stats.avg_memory_percent, 70.0);
    assert_eq!(stats.max_temp, 45.0);
    assert!((stats.drain_rate_percent_per_hour - 5.0).abs() < 1e-9);
    assert_eq!(stats.screen_on_ratio_percent, 25.0);
}
