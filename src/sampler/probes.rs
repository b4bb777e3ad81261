// One probe per metric family. Source reads run on the blocking pool, bounded by the
// configured sample timeout.

use super::{CpuUsageTracker, Probe};
use crate::error::SampleError;
use crate::models::{
    AnrReading, BatteryReading, CpuReading, FrameReading, MemoryStats, ResourceReading,
    StorageStats, now_ms,
};
use crate::source::{MetricSource, read_bounded};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

pub struct CpuProbe {
    source: Arc<dyn MetricSource>,
    timeout: Duration,
    tracker: CpuUsageTracker,
}

impl CpuProbe {
    pub fn new(source: Arc<dyn MetricSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            tracker: CpuUsageTracker::new(),
        }
    }
}

impl Probe for CpuProbe {
    type Output = CpuReading;

    async fn sample(&mut self) -> Result<CpuReading, SampleError> {
        let ticks =
            read_bounded(&self.source, self.timeout, "read_cpu_ticks", |s| s.read_cpu_ticks())
                .await?;
        Ok(CpuReading {
            timestamp: now_ms(),
            cpu_percent: self.tracker.update(&ticks),
        })
    }
}

/// Memory, storage, device temperature and uptime.
///
/// Memory and storage failures fail the tick. A failed temperature read falls back to the
/// last temperature read here, then to the battery temperature, then to 0. Uptime falls back
/// to 0.
pub struct ResourceProbe {
    source: Arc<dyn MetricSource>,
    timeout: Duration,
    last_temperature: Option<f64>,
}

impl ResourceProbe {
    pub fn new(source: Arc<dyn MetricSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            last_temperature: None,
        }
    }

    async fn temperature(&mut self) -> f64 {
        match read_bounded(&self.source, self.timeout, "read_device_temperature", |s| {
            s.read_device_temperature()
        })
        .await
        {
            Ok(t) => {
                self.last_temperature = Some(t);
                t
            }
            Err(e) => {
                tracing::debug!(error = %e, "device temperature unavailable, using fallback");
                if let Some(t) = self.last_temperature {
                    return t;
                }
                match read_bounded(&self.source, self.timeout, "read_battery_status", |s| {
                    s.read_battery_status()
                })
                .await
                {
                    Ok(b) if b.present && b.temperature_c > 0.0 => b.temperature_c,
                    _ => 0.0,
                }
            }
        }
    }
}

impl Probe for ResourceProbe {
    type Output = ResourceReading;

    async fn sample(&mut self) -> Result<ResourceReading, SampleError> {
        let memory = read_bounded(&self.source, self.timeout, "read_memory_totals", |s| {
            s.read_memory_totals()
        })
        .await?;
        let storage = read_bounded(&self.source, self.timeout, "read_storage_totals", |s| {
            s.read_storage_totals()
        })
        .await?;
        let device_temperature_c = self.temperature().await;
        let uptime_secs =
            read_bounded(&self.source, self.timeout, "read_uptime_secs", |s| s.read_uptime_secs())
                .await
                .unwrap_or(0);

        Ok(ResourceReading {
            timestamp: now_ms(),
            memory: MemoryStats::from_totals(memory.total_bytes, memory.available_bytes),
            storage: StorageStats::from_totals(storage.total_bytes, storage.free_bytes),
            device_temperature_c,
            uptime_secs,
        })
    }
}

/// Battery status plus screen state. An unreadable screen state keeps its previous value.
pub struct BatteryProbe {
    source: Arc<dyn MetricSource>,
    timeout: Duration,
    screen_on: bool,
}

impl BatteryProbe {
    pub fn new(source: Arc<dyn MetricSource>, timeout: Duration) -> Self {
        Self {
            source,
            timeout,
            screen_on: false,
        }
    }
}

impl Probe for BatteryProbe {
    type Output = BatteryReading;

    async fn sample(&mut self) -> Result<BatteryReading, SampleError> {
        let battery = read_bounded(&self.source, self.timeout, "read_battery_status", |s| {
            s.read_battery_status()
        })
        .await?;
        if let Ok(on) =
            read_bounded(&self.source, self.timeout, "read_screen_on", |s| s.read_screen_on()).await
        {
            self.screen_on = on;
        }
        Ok(BatteryReading {
            timestamp: now_ms(),
            battery,
            screen_on: self.screen_on,
        })
    }
}

pub struct FrameRateProbe {
    source: Arc<dyn MetricSource>,
    timeout: Duration,
}

impl FrameRateProbe {
    pub fn new(source: Arc<dyn MetricSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }
}

impl Probe for FrameRateProbe {
    type Output = FrameReading;

    async fn sample(&mut self) -> Result<FrameReading, SampleError> {
        let fps =
            read_bounded(&self.source, self.timeout, "read_frame_rate", |s| s.read_frame_rate())
                .await?;
        if !fps.is_finite() || fps < 0.0 {
            return Err(SampleError::invalid("read_frame_rate", format!("fps {fps}")));
        }
        Ok(FrameReading {
            timestamp: now_ms(),
            fps,
        })
    }
}

/// Something that answers a ping when the monitored loop is responsive.
pub trait ResponsivenessProbe: Send + Sync + 'static {
    fn ping(&self) -> impl Future<Output = Result<(), SampleError>> + Send;
}

/// Pings a tokio runtime by spawning an empty task on it and awaiting its completion.
#[derive(Debug, Clone)]
pub struct RuntimeProbe {
    handle: tokio::runtime::Handle,
}

impl RuntimeProbe {
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Probe for the runtime the caller is running on. On a multi-thread runtime a ping lands
    /// on any free worker, so only a stall of every worker is seen; prefer a [`MonitoredLoop`].
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

/// A single-threaded event loop on its own OS thread, watched by the ANR watchdog.
///
/// Work spawned on [`MonitoredLoop::handle`] shares one thread, so any task that blocks it
/// delays the watchdog's ping. The watchdog's own timer runs on the caller's runtime and keeps
/// ticking while this loop is stuck. The loop stops when the value is dropped.
#[derive(Debug)]
pub struct MonitoredLoop {
    handle: tokio::runtime::Handle,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MonitoredLoop {
    pub fn start(name: &str) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();
        let (shutdown, stopped) = oneshot::channel::<()>();
        std::thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || {
                runtime.block_on(async {
                    let _ = stopped.await;
                });
            })?;
        tracing::debug!(thread = name, "monitored loop started");
        Ok(Self {
            handle,
            shutdown: Some(shutdown),
        })
    }

    pub fn handle(&self) -> &tokio::runtime::Handle {
        &self.handle
    }

    pub fn responsiveness(&self) -> RuntimeProbe {
        RuntimeProbe::new(self.handle.clone())
    }
}

impl Drop for MonitoredLoop {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

impl ResponsivenessProbe for RuntimeProbe {
    async fn ping(&self) -> Result<(), SampleError> {
        self.handle
            .spawn(async {})
            .await
            .map_err(|e| SampleError::unavailable("ping_runtime", e))
    }
}

/// Watchdog: a ping not answered within `threshold` is an ANR event. A ping that does come
/// back but took at least `threshold` (the timer itself was held up) counts as well.
pub struct AnrProbe<R: ResponsivenessProbe> {
    target: R,
    threshold: Duration,
}

impl<R: ResponsivenessProbe> AnrProbe<R> {
    pub fn new(target: R, threshold: Duration) -> Self {
        Self { target, threshold }
    }
}

impl<R: ResponsivenessProbe> Probe for AnrProbe<R> {
    type Output = AnrReading;

    async fn sample(&mut self) -> Result<AnrReading, SampleError> {
        let started = Instant::now();
        match tokio::time::timeout(self.threshold, self.target.ping()).await {
            Ok(Ok(())) => {
                let elapsed = started.elapsed();
                let blocked = elapsed >= self.threshold;
                if blocked {
                    tracing::warn!(block_ms = elapsed.as_millis() as u64, "monitored loop answered late, ANR detected");
                }
                Ok(AnrReading {
                    timestamp: now_ms(),
                    block_ms: elapsed.as_millis() as u64,
                    blocked,
                })
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                let threshold_ms = self.threshold.as_millis() as u64;
                tracing::warn!(threshold_ms, "monitored runtime did not respond, ANR detected");
                Ok(AnrReading {
                    timestamp: now_ms(),
                    block_ms: threshold_ms,
                    blocked: true,
                })
            }
        }
    }
}
