use crate::source::CpuTicks;

/// CPU usage from successive tick counters.
///
/// The first update only stores a baseline and reports 0. Every later update reports
/// `(totalDelta - idleDelta) / totalDelta * 100`, clamped to 0..=100, and then replaces the
/// baseline. A total that did not advance (or went backwards after a counter reset) reports 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuUsageTracker {
    last_total: u128,
    last_idle: u64,
}

impl CpuUsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, ticks: &CpuTicks) -> f64 {
        let total = ticks.total();
        let idle = ticks.idle();

        let usage = if self.last_total == 0 {
            0.0
        } else {
            // u128 totals never exceed 7 * u64::MAX, well inside i128
            let total_delta = total as i128 - self.last_total as i128;
            let idle_delta = idle as i128 - self.last_idle as i128;
            if total_delta <= 0 {
                0.0
            } else {
                ((total_delta - idle_delta) as f64 / total_delta as f64 * 100.0).clamp(0.0, 100.0)
            }
        };

        self.last_total = total;
        self.last_idle = idle;
        usage
    }
}
