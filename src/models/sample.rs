// Raw counter models and the composed per-moment Sample

use serde::{Deserialize, Serialize};
use wincode::{SchemaRead, SchemaWrite};

use super::percent_of;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub used_percent: f64,
}

impl MemoryStats {
    pub fn from_totals(total_bytes: u64, available_bytes: u64) -> Self {
        let available_bytes = available_bytes.min(total_bytes);
        let used_bytes = total_bytes - available_bytes;
        Self {
            total_bytes,
            used_bytes,
            available_bytes,
            used_percent: percent_of(used_bytes, total_bytes),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub used_percent: f64,
}

impl StorageStats {
    pub fn from_totals(total_bytes: u64, free_bytes: u64) -> Self {
        let used_bytes = total_bytes.saturating_sub(free_bytes);
        Self {
            total_bytes,
            used_bytes,
            used_percent: percent_of(used_bytes, total_bytes),
        }
    }

    pub fn free_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.used_bytes)
    }
}

/// Battery health as reported by the power supply; serializes lowercase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, SchemaRead, SchemaWrite,
)]
#[serde(rename_all = "lowercase")]
pub enum BatteryHealth {
    Good,
    Overheat,
    Dead,
    OverVoltage,
    Failure,
    Cold,
    #[default]
    #[serde(other)]
    Unknown,
}

impl BatteryHealth {
    /// Parse a power-supply health string (e.g. "Good", "Overheat", "Over voltage").
    pub fn from_power_supply(s: &str) -> Self {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "good" => BatteryHealth::Good,
            "overheat" | "hot" => BatteryHealth::Overheat,
            "dead" => BatteryHealth::Dead,
            "over voltage" | "overvoltage" => BatteryHealth::OverVoltage,
            "unspecified failure" | "failure" => BatteryHealth::Failure,
            "cold" => BatteryHealth::Cold,
            _ => BatteryHealth::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BatteryHealth::Good => "good",
            BatteryHealth::Overheat => "overheating",
            BatteryHealth::Dead => "dead",
            BatteryHealth::OverVoltage => "over voltage",
            BatteryHealth::Failure => "unspecified failure",
            BatteryHealth::Cold => "too cold",
            BatteryHealth::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, SchemaRead, SchemaWrite)]
#[serde(rename_all = "camelCase")]
pub struct BatteryStats {
    /// False when the device has no battery or the source could not find one.
    pub present: bool,
    pub level_percent: f64,
    pub temperature_c: f64,
    pub voltage_v: f64,
    pub is_charging: bool,
    pub is_plugged: bool,
    pub health: BatteryHealth,
}

/// One timestamped reading across all metric families, composed from the latest
/// reading of each sampler. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub timestamp: u64,
    pub cpu_percent: f64,
    pub memory: MemoryStats,
    pub battery: BatteryStats,
    pub storage: StorageStats,
    pub device_temperature_c: f64,
    pub screen_on: bool,
    /// 0 when the source cannot report uptime.
    pub uptime_secs: u64,
}

/// Installed application counts, when the platform exposes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInventory {
    pub installed: u32,
    /// Non-system apps built in debuggable mode.
    pub debuggable: u32,
}
