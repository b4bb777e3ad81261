// Monitor supervisor: owns the samplers, their histories and the per-family MonitorState.
//
// Tasks started by `start_all`:
//   - one sampler per metric family (independent intervals, independent stop)
//   - a status task, the only writer of MonitorState and screen time, fed by sampler tick reports
//   - the record writer (batches into the persistence sink)
//   - maintenance (retention prune + compaction)
//   - the report loop, when at least one dispatcher is attached
// `stop_all` stops the samplers first, then lets the writer and status task drain and exit.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::alerts::{self, AlertContext};
use crate::config::AppConfig;
use crate::derived::{self, ScreenTime, StatsInputs};
use crate::dispatch::AlertDispatcher;
use crate::error::{ConfigError, PersistenceError};
use crate::health;
use crate::history::{DEFAULT_HISTORY_CAPACITY, RollingHistory};
use crate::maintenance;
use crate::models::{
    AnrReading, BatteryReading, CpuReading, DerivedStats, FrameReading, HealthReport,
    MetricFamily, MonitorState, Record, ResourceReading, Sample, Snapshot, now_ms,
};
use crate::sampler::{
    AnrProbe, BatteryProbe, CpuProbe, FrameRateProbe, MonitoredLoop, ResourceProbe, RuntimeProbe,
    Sampler, SamplerHandle, TickEvent, TickReport,
};
use crate::sink::{PersistenceSink, WriterConfig, WriterStats, spawn_writer, writer_channel_capacity};
use crate::source::{MetricSource, read_bounded};

/// One rolling history per metric family. Clones share the underlying buffers.
#[derive(Debug, Clone)]
pub struct Histories {
    pub cpu: RollingHistory<CpuReading>,
    pub resources: RollingHistory<ResourceReading>,
    pub battery: RollingHistory<BatteryReading>,
    pub frames: RollingHistory<FrameReading>,
    pub anr: RollingHistory<AnrReading>,
}

impl Histories {
    pub fn new(capacity: usize) -> Self {
        Self {
            cpu: RollingHistory::new(capacity),
            resources: RollingHistory::new(capacity),
            battery: RollingHistory::new(capacity),
            frames: RollingHistory::new(capacity),
            anr: RollingHistory::new(capacity),
        }
    }

    fn capacity(&self) -> usize {
        self.cpu.capacity()
    }
}

/// Everything the status task maintains, published through a watch channel.
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisorStatus {
    pub states: BTreeMap<MetricFamily, MonitorState>,
    pub screen: ScreenTime,
}

impl Default for SupervisorStatus {
    fn default() -> Self {
        Self {
            states: MetricFamily::ALL
                .into_iter()
                .map(|f| (f, MonitorState::default()))
                .collect(),
            screen: ScreenTime::default(),
        }
    }
}

impl SupervisorStatus {
    pub fn apply(&mut self, report: &TickReport) {
        let state = self.states.entry(report.family).or_default();
        match &report.event {
            TickEvent::Started => state.is_running = true,
            TickEvent::Stopped => state.is_running = false,
            TickEvent::Sampled => {
                state.last_sample_time = Some(report.timestamp);
                state.consecutive_failures = 0;
                state.samples_total += 1;
            }
            TickEvent::Failed(error) => {
                state.last_error = Some(error.clone());
                state.consecutive_failures += 1;
                state.failures_total += 1;
            }
        }
        if let Some(on) = report.screen_on {
            self.screen.record(report.timestamp, on);
        }
    }
}

/// Read-only view used to build samples and reports, shared with the report loop.
#[derive(Clone)]
struct HealthView {
    histories: Histories,
    status: watch::Receiver<SupervisorStatus>,
    source: Arc<dyn MetricSource>,
    drain_window_ms: u64,
    sample_timeout: Duration,
    unavailable_after: u32,
}

impl HealthView {
    fn latest_sample(&self, now: u64) -> Sample {
        let cpu = self.histories.cpu.latest();
        let resources = self.histories.resources.latest();
        let battery = self.histories.battery.latest();
        let timestamp = [
            cpu.as_ref().map(|r| r.timestamp),
            resources.as_ref().map(|r| r.timestamp),
            battery.as_ref().map(|r| r.timestamp),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(now);

        Sample {
            timestamp,
            cpu_percent: cpu.map_or(0.0, |r| r.cpu_percent),
            memory: resources.as_ref().map(|r| r.memory).unwrap_or_default(),
            storage: resources.as_ref().map(|r| r.storage).unwrap_or_default(),
            device_temperature_c: resources.as_ref().map_or(0.0, |r| r.device_temperature_c),
            uptime_secs: resources.as_ref().map_or(0, |r| r.uptime_secs),
            screen_on: battery.as_ref().is_some_and(|r| r.screen_on),
            battery: battery.map(|r| r.battery).unwrap_or_default(),
        }
    }

    /// Snapshot as of `now` plus the number of present-battery readings in the drain window.
    fn snapshot(&self, now: u64) -> (Snapshot, usize) {
        let w = self.drain_window_ms;
        let cpu = self.histories.cpu.window_ending_at(w, now);
        let resources = self.histories.resources.window_ending_at(w, now);
        let battery = self.histories.battery.window_ending_at(w, now);
        let frames = self.histories.frames.window_ending_at(w, now);
        let anr = self.histories.anr.window_ending_at(w, now);
        let screen = self.status.borrow().screen;

        let stats = derived::derive_stats(&StatsInputs {
            cpu: &cpu,
            resources: &resources,
            battery: &battery,
            frames: &frames,
            anr: &anr,
            screen_on_ms: screen.on_ms,
            screen_off_ms: screen.off_ms,
        });
        let snapshot = Snapshot {
            sample: self.latest_sample(now),
            stats,
        };
        (snapshot, derived::battery_readings_present(&battery))
    }

    fn unavailable(&self) -> Vec<MetricFamily> {
        self.status
            .borrow()
            .states
            .iter()
            .filter(|(_, s)| s.is_unavailable(self.unavailable_after))
            .map(|(f, _)| *f)
            .collect()
    }

    async fn report(&self, ctx: &AlertContext) -> HealthReport {
        let now = now_ms();
        let (snapshot, battery_readings) = self.snapshot(now);

        let mut ctx = ctx.clone();
        if ctx.apps.is_none() {
            ctx.apps = read_bounded(&self.source, self.sample_timeout, "read_app_inventory", |s| {
                s.read_app_inventory()
            })
            .await
            .ok();
        }

        let issues = alerts::evaluate(&snapshot, &ctx);
        let tips = alerts::battery_tips(&snapshot);
        let recommendations = alerts::recommendations(&issues);
        let battery = &snapshot.sample.battery;
        let battery_life = derived::estimate_battery_life(
            battery.level_percent,
            snapshot.stats.drain_rate_percent_per_hour,
            if battery.present { battery_readings } else { 0 },
        );

        HealthReport {
            timestamp: now,
            score: health::score(&snapshot),
            issues,
            tips,
            recommendations,
            stats: snapshot.stats,
            battery_life,
            unavailable: self.unavailable(),
        }
    }
}

struct Running {
    samplers: BTreeMap<MetricFamily, SamplerHandle>,
    records_tx: mpsc::Sender<Record>,
    reports_tx: mpsc::UnboundedSender<TickReport>,
    status_task: JoinHandle<()>,
    writer: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
    background: Vec<JoinHandle<()>>,
    anr_target: RuntimeProbe,
}

pub struct MonitorSupervisor<K: PersistenceSink> {
    source: Arc<dyn MetricSource>,
    sink: Arc<K>,
    dispatchers: Vec<Arc<dyn AlertDispatcher>>,
    watchdog: Option<RuntimeProbe>,
    main_loop: Option<MonitoredLoop>,
    histories: Histories,
    status: Arc<watch::Sender<SupervisorStatus>>,
    writer_stats: Arc<WriterStats>,
    config: AppConfig,
    running: Option<Running>,
}

impl<K: PersistenceSink> MonitorSupervisor<K> {
    pub fn new(source: Arc<dyn MetricSource>, sink: Arc<K>) -> Self {
        let (status, _) = watch::channel(SupervisorStatus::default());
        Self {
            source,
            sink,
            dispatchers: Vec::new(),
            watchdog: None,
            main_loop: None,
            histories: Histories::new(DEFAULT_HISTORY_CAPACITY),
            status: Arc::new(status),
            writer_stats: Arc::new(WriterStats::default()),
            config: AppConfig::default(),
            running: None,
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: Arc<dyn AlertDispatcher>) -> Self {
        self.dispatchers.push(dispatcher);
        self
    }

    /// Runtime pinged by the ANR watchdog. Without one, `start_all` starts a dedicated
    /// [`MonitoredLoop`]; run latency-sensitive work on [`Self::main_loop`] to have it watched.
    pub fn with_watchdog(mut self, probe: RuntimeProbe) -> Self {
        self.watchdog = Some(probe);
        self
    }

    /// Handle of the loop the watchdog pings by default. `None` before `start_all` or when an
    /// explicit watchdog target was given.
    pub fn main_loop(&self) -> Option<&tokio::runtime::Handle> {
        self.main_loop.as_ref().map(MonitoredLoop::handle)
    }

    fn watchdog_target(&mut self) -> RuntimeProbe {
        if let Some(target) = &self.watchdog {
            return target.clone();
        }
        if self.main_loop.is_none() {
            match MonitoredLoop::start("devhealth-main") {
                Ok(main_loop) => self.main_loop = Some(main_loop),
                Err(e) => {
                    tracing::warn!(error = %e, "could not start monitored loop, watching the current runtime");
                    return RuntimeProbe::current();
                }
            }
        }
        self.main_loop
            .as_ref()
            .map_or_else(RuntimeProbe::current, MonitoredLoop::responsiveness)
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    fn view(&self) -> HealthView {
        HealthView {
            histories: self.histories.clone(),
            status: self.status.subscribe(),
            source: Arc::clone(&self.source),
            drain_window_ms: self.config.monitoring.drain_window_ms,
            sample_timeout: self.config.monitoring.sample_timeout(),
            unavailable_after: self.config.alerts.unavailable_after,
        }
    }

    /// Validates `config` and starts every sampler plus the background tasks.
    /// Refuses to start on invalid config or when already running.
    pub fn start_all(&mut self, config: &AppConfig) -> Result<(), ConfigError> {
        if self.running.is_some() {
            return Err(ConfigError::AlreadyRunning);
        }
        config.validate()?;
        self.config = config.clone();
        if self.histories.capacity() != config.monitoring.history_capacity {
            self.histories = Histories::new(config.monitoring.history_capacity);
        }

        let (records_tx, records_rx) =
            mpsc::channel(writer_channel_capacity(config.database.flush_rate));
        let (reports_tx, mut reports_rx) = mpsc::unbounded_channel::<TickReport>();

        let status = Arc::clone(&self.status);
        let status_task = tokio::spawn(async move {
            while let Some(report) = reports_rx.recv().await {
                status.send_modify(|s| s.apply(&report));
            }
        });

        let writer = spawn_writer(
            records_rx,
            Arc::clone(&self.sink),
            WriterConfig {
                flush_rate: config.database.flush_rate,
                flush_interval_secs: config.database.flush_interval_secs,
            },
            Arc::clone(&self.writer_stats),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut background = vec![maintenance::spawn(
            Arc::clone(&self.sink),
            (&config.database).into(),
            shutdown_rx.clone(),
        )];
        if !self.dispatchers.is_empty() {
            background.push(tokio::spawn(report_loop(
                self.view(),
                self.dispatchers.clone(),
                Duration::from_secs(config.alerts.report_interval_secs),
                shutdown_rx,
            )));
        }

        let anr_target = self.watchdog_target();
        let mut running = Running {
            samplers: BTreeMap::new(),
            records_tx,
            reports_tx,
            status_task,
            writer,
            shutdown_tx,
            background,
            anr_target,
        };
        for family in MetricFamily::ALL {
            let handle = self.spawn_family(family, &running);
            running.samplers.insert(family, handle);
        }
        self.running = Some(running);

        tracing::info!(
            families = MetricFamily::ALL.len(),
            history_capacity = config.monitoring.history_capacity,
            "monitoring started"
        );
        Ok(())
    }

    fn spawn_family(&self, family: MetricFamily, running: &Running) -> SamplerHandle {
        let m = &self.config.monitoring;
        let source = Arc::clone(&self.source);
        let timeout = m.sample_timeout();
        let records = running.records_tx.clone();
        let reports = running.reports_tx.clone();
        let ms = Duration::from_millis;
        match family {
            MetricFamily::Cpu => Sampler::new(CpuProbe::new(source, timeout), self.histories.cpu.clone())
                .with_records(records)
                .with_reports(reports)
                .start(ms(m.cpu_interval_ms)),
            MetricFamily::Resources => Sampler::new(
                ResourceProbe::new(source, timeout),
                self.histories.resources.clone(),
            )
            .with_records(records)
            .with_reports(reports)
            .start(ms(m.memory_interval_ms)),
            MetricFamily::Battery => Sampler::new(
                BatteryProbe::new(source, timeout),
                self.histories.battery.clone(),
            )
            .with_records(records)
            .with_reports(reports)
            .start(ms(m.battery_interval_ms)),
            MetricFamily::FrameRate => Sampler::new(
                FrameRateProbe::new(source, timeout),
                self.histories.frames.clone(),
            )
            .with_records(records)
            .with_reports(reports)
            .start(ms(m.frame_interval_ms)),
            MetricFamily::Anr => {
                Sampler::new(
                    AnrProbe::new(running.anr_target.clone(), ms(m.anr_threshold_ms)),
                    self.histories.anr.clone(),
                )
                .with_records(records)
                .with_reports(reports)
                .start(ms(m.anr_check_interval_ms))
            }
        }
    }

    /// Restarts a single family previously stopped with [`Self::stop_family`].
    pub fn start_family(&mut self, family: MetricFamily) -> Result<(), ConfigError> {
        let Some(running) = self.running.as_ref() else {
            return Err(ConfigError::NotRunning);
        };
        if running.samplers.contains_key(&family) {
            return Err(ConfigError::AlreadyRunning);
        }
        let handle = self.spawn_family(family, running);
        if let Some(running) = self.running.as_mut() {
            running.samplers.insert(family, handle);
        }
        Ok(())
    }

    /// Stops one family and waits for its in-flight tick. Returns false if it was not running.
    pub async fn stop_family(&mut self, family: MetricFamily) -> bool {
        let Some(handle) = self
            .running
            .as_mut()
            .and_then(|r| r.samplers.remove(&family))
        else {
            return false;
        };
        handle.shutdown().await;
        tracing::info!(%family, "sampler stopped");
        true
    }

    /// Stops every sampler, then drains the writer and status task. Idempotent.
    pub async fn stop_all(&mut self) {
        let Some(running) = self.running.take() else {
            return;
        };
        let Running {
            samplers,
            records_tx,
            reports_tx,
            status_task,
            writer,
            shutdown_tx,
            background,
            anr_target: _,
        } = running;

        for handle in samplers.values() {
            handle.stop();
        }
        for (_, handle) in samplers {
            handle.shutdown().await;
        }

        shutdown_tx.send_replace(true);
        for task in background {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }

        drop(records_tx);
        if let Err(e) = writer.await {
            tracing::warn!(error = %e, "record writer ended abnormally");
        }
        drop(reports_tx);
        if let Err(e) = status_task.await {
            tracing::warn!(error = %e, "status task ended abnormally");
        }
        tracing::info!(
            records_saved = self.writer_stats.saved(),
            records_dropped = self.writer_stats.dropped(),
            "monitoring stopped"
        );
    }

    pub fn histories(&self) -> &Histories {
        &self.histories
    }

    pub fn status(&self) -> BTreeMap<MetricFamily, MonitorState> {
        self.status.borrow().states.clone()
    }

    pub fn state(&self, family: MetricFamily) -> MonitorState {
        self.status
            .borrow()
            .states
            .get(&family)
            .cloned()
            .unwrap_or_default()
    }

    pub fn screen_time(&self) -> ScreenTime {
        self.status.borrow().screen
    }

    pub fn writer_stats(&self) -> &WriterStats {
        &self.writer_stats
    }

    /// Latest reading of each family composed into one sample.
    pub fn latest_sample(&self) -> Sample {
        self.view().latest_sample(now_ms())
    }

    pub fn snapshot(&self) -> Snapshot {
        self.view().snapshot(now_ms()).0
    }

    pub async fn health_snapshot(&self, ctx: &AlertContext) -> HealthReport {
        self.view().report(ctx).await
    }

    /// Derived stats over persisted records in `[start_ms, end_ms)`.
    pub async fn stats_over_range(
        &self,
        start_ms: u64,
        end_ms: u64,
    ) -> Result<DerivedStats, PersistenceError> {
        let mut sets = RecordSets::default();
        for family in MetricFamily::ALL {
            for record in self.sink.query_range(family, start_ms, end_ms).await? {
                sets.push(record);
            }
        }
        let mut screen = ScreenTime::default();
        for r in &sets.battery {
            screen.record(r.timestamp, r.screen_on);
        }
        Ok(derived::derive_stats(&StatsInputs {
            cpu: &sets.cpu,
            resources: &sets.resources,
            battery: &sets.battery,
            frames: &sets.frames,
            anr: &sets.anr,
            screen_on_ms: screen.on_ms,
            screen_off_ms: screen.off_ms,
        }))
    }
}

impl<K: PersistenceSink> Drop for MonitorSupervisor<K> {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            for handle in running.samplers.values() {
                handle.stop();
            }
            running.shutdown_tx.send_replace(true);
        }
    }
}

#[derive(Default)]
struct RecordSets {
    cpu: Vec<CpuReading>,
    resources: Vec<ResourceReading>,
    battery: Vec<BatteryReading>,
    frames: Vec<FrameReading>,
    anr: Vec<AnrReading>,
}

impl RecordSets {
    fn push(&mut self, record: Record) {
        match record {
            Record::Cpu(r) => self.cpu.push(r),
            Record::Resources(r) => self.resources.push(r),
            Record::Battery(r) => self.battery.push(r),
            Record::FrameRate(r) => self.frames.push(r),
            Record::Anr(r) => self.anr.push(r),
        }
    }
}

async fn report_loop(
    view: HealthView,
    dispatchers: Vec<Arc<dyn AlertDispatcher>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
        let report = view.report(&AlertContext::default()).await;
        for dispatcher in &dispatchers {
            dispatcher.dispatch(&report);
        }
    }
    tracing::debug!("report loop shutting down");
}
