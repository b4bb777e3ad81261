// Linux-specific readers: /proc/stat, power_supply, thermal zones, backlight.

use super::CpuTicks;
use crate::error::SampleError;
use crate::models::{BatteryHealth, BatteryStats};

#[cfg(target_os = "linux")]
const THERMAL_PATHS: [&str; 4] = [
    "/sys/class/thermal/thermal_zone0/temp",
    "/sys/devices/virtual/thermal/thermal_zone0/temp",
    "/sys/devices/platform/omap/omap_temp_sensor.0/temperature",
    "/sys/kernel/debug/tegra_thermal/temp_tj",
];

/// Parse the aggregate `cpu` line of /proc/stat.
pub(super) fn parse_proc_stat(content: &str) -> Option<CpuTicks> {
    let line = content.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(7)
        .map(|f| f.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if fields.len() < 7 {
        return None;
    }
    Some(CpuTicks {
        user: fields[0],
        nice: fields[1],
        system: fields[2],
        idle: fields[3],
        iowait: fields[4],
        irq: fields[5],
        softirq: fields[6],
    })
}

pub(super) fn read_proc_stat() -> Result<CpuTicks, SampleError> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/stat")
            .map_err(|e| SampleError::unavailable("read_cpu_ticks", e))?;
        parse_proc_stat(&content)
            .ok_or_else(|| SampleError::invalid("read_cpu_ticks", "no aggregate cpu line"))
    }
    #[cfg(not(target_os = "linux"))]
    Err(SampleError::Unsupported("read_cpu_ticks"))
}

/// Thermal sensor value in °C. Some kernels report millidegrees.
pub(super) fn parse_thermal_value(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    Some(if v > 1000.0 { v / 1000.0 } else { v })
}

/// First readable thermal sensor, in °C.
pub(super) fn read_thermal_zone() -> Option<f64> {
    #[cfg(target_os = "linux")]
    {
        for path in THERMAL_PATHS {
            if let Ok(content) = std::fs::read_to_string(path)
                && let Some(t) = parse_thermal_value(&content)
            {
                return Some(t);
            }
        }
    }
    None
}

/// Raw power_supply attributes of one battery, as strings.
#[derive(Debug, Default)]
pub(super) struct BatteryFields<'a> {
    pub capacity: Option<&'a str>,
    pub status: Option<&'a str>,
    /// Tenths of a degree Celsius.
    pub temp: Option<&'a str>,
    /// Microvolts.
    pub voltage_now: Option<&'a str>,
    pub health: Option<&'a str>,
    pub plugged: bool,
}

pub(super) fn battery_from_fields(fields: &BatteryFields<'_>) -> Result<BatteryStats, SampleError> {
    let level = fields
        .capacity
        .and_then(|c| c.trim().parse::<f64>().ok())
        .filter(|c| (0.0..=100.0).contains(c))
        .ok_or_else(|| SampleError::invalid("read_battery_status", "missing or bad capacity"))?;
    let status = fields.status.map(str::trim).unwrap_or_default();
    let is_charging = status.eq_ignore_ascii_case("charging") || status.eq_ignore_ascii_case("full");
    let temperature_c = fields
        .temp
        .and_then(|t| t.trim().parse::<f64>().ok())
        .map(|t| t / 10.0)
        .unwrap_or(0.0);
    let voltage_v = fields
        .voltage_now
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|v| v / 1_000_000.0)
        .unwrap_or(0.0);
    Ok(BatteryStats {
        present: true,
        level_percent: level,
        temperature_c,
        voltage_v,
        is_charging,
        is_plugged: fields.plugged || is_charging,
        health: fields
            .health
            .map(BatteryHealth::from_power_supply)
            .unwrap_or_default(),
    })
}

/// Reads the first `Battery` under /sys/class/power_supply. No battery is not an error:
/// the reading reports `present = false`.
pub(super) fn read_power_supply() -> Result<BatteryStats, SampleError> {
    #[cfg(target_os = "linux")]
    {
        let root = std::path::Path::new("/sys/class/power_supply");
        let entries = match std::fs::read_dir(root) {
            Ok(e) => e,
            Err(_) => return Ok(BatteryStats::default()),
        };
        let read = |dir: &std::path::Path, name: &str| -> Option<String> {
            std::fs::read_to_string(dir.join(name)).ok()
        };
        let mut battery_dir = None;
        let mut plugged = false;
        for entry in entries.flatten() {
            let dir = entry.path();
            let kind = read(&dir, "type").unwrap_or_default();
            match kind.trim() {
                "Battery" if battery_dir.is_none() => battery_dir = Some(dir),
                "Mains" | "USB" | "Wireless" => {
                    plugged |= read(&dir, "online").is_some_and(|v| v.trim() == "1");
                }
                _ => {}
            }
        }
        let Some(dir) = battery_dir else {
            return Ok(BatteryStats::default());
        };
        let capacity = read(&dir, "capacity");
        let status = read(&dir, "status");
        let temp = read(&dir, "temp");
        let voltage_now = read(&dir, "voltage_now");
        let health = read(&dir, "health");
        battery_from_fields(&BatteryFields {
            capacity: capacity.as_deref(),
            status: status.as_deref(),
            temp: temp.as_deref(),
            voltage_now: voltage_now.as_deref(),
            health: health.as_deref(),
            plugged,
        })
    }
    #[cfg(not(target_os = "linux"))]
    Err(SampleError::Unsupported("read_battery_status"))
}

/// Screen state from the first backlight (`bl_power` 0 = on).
pub(super) fn read_backlight_on() -> Result<bool, SampleError> {
    #[cfg(target_os = "linux")]
    {
        let entries = std::fs::read_dir("/sys/class/backlight")
            .map_err(|_| SampleError::Unsupported("read_screen_on"))?;
        for entry in entries.flatten() {
            let dir = entry.path();
            if let Ok(power) = std::fs::read_to_string(dir.join("bl_power")) {
                let brightness = std::fs::read_to_string(dir.join("brightness"))
                    .ok()
                    .and_then(|b| b.trim().parse::<u64>().ok())
                    .unwrap_or(1);
                return Ok(power.trim() == "0" && brightness > 0);
            }
        }
        Err(SampleError::Unsupported("read_screen_on"))
    }
    #[cfg(not(target_os = "linux"))]
    Err(SampleError::Unsupported("read_screen_on"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT: &str = "cpu  4705 356 584 3699176 23060 0 277 0 0 0\n\
                             cpu0 1393 122 234 925170 5894 0 41 0 0 0\n\
                             intr 114930548 113199788 3 0 5 263 0 4 [... lots more numbers ...]\n";

    #[test]
    fn parses_aggregate_cpu_line() {
        let ticks = parse_proc_stat(PROC_STAT).unwrap();
        assert_eq!(ticks.user, 4705);
        assert_eq!(ticks.idle, 3699176);
        assert_eq!(ticks.softirq, 277);
        assert_eq!(ticks.total(), 4705 + 356 + 584 + 3699176 + 23060 + 277);
    }

    #[test]
    fn rejects_truncated_cpu_line() {
        assert!(parse_proc_stat("cpu  1 2 3\n").is_none());
        assert!(parse_proc_stat("intr 1 2 3\n").is_none());
    }

    #[test]
    fn thermal_value_handles_millidegrees() {
        assert_eq!(parse_thermal_value("45000\n"), Some(45.0));
        assert_eq!(parse_thermal_value("38.5"), Some(38.5));
        assert_eq!(parse_thermal_value("n/a"), None);
    }

    #[test]
    fn battery_fields_convert_units() {
        let stats = battery_from_fields(&BatteryFields {
            capacity: Some("87\n"),
            status: Some("Discharging\n"),
            temp: Some("312"),
            voltage_now: Some("4123000"),
            health: Some("Good"),
            plugged: false,
        })
        .unwrap();
        assert!(stats.present);
        assert_eq!(stats.level_percent, 87.0);
        assert!((stats.temperature_c - 31.2).abs() < 1e-9);
        assert!((stats.voltage_v - 4.123).abs() < 1e-9);
        assert!(!stats.is_charging);
        assert_eq!(stats.health, BatteryHealth::Good);
    }

    #[test]
    fn battery_without_capacity_is_invalid() {
        let err = battery_from_fields(&BatteryFields::default()).unwrap_err();
        assert!(matches!(err, SampleError::Invalid { .. }));
    }
}
