// Per-family sampling loop.
// Each tick: sample_once -> fall back on failure -> push to history -> report to the
// supervisor -> hand the record to the persistence writer without waiting on it.
// Iterations are spaced by `interval` measured from the end of the previous tick, so a slow
// source delays the next tick instead of overlapping it.

mod cpu;
mod probes;

pub use cpu::CpuUsageTracker;
pub use probes::{
    AnrProbe, BatteryProbe, CpuProbe, FrameRateProbe, MonitoredLoop, ResourceProbe,
    ResponsivenessProbe, RuntimeProbe,
};

use crate::error::SampleError;
use crate::history::RollingHistory;
use crate::models::{MetricFamily, Reading, Record, now_ms};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

/// Produces one reading per call. Implementations own any state that spans ticks.
pub trait Probe: Send + 'static {
    type Output: Reading;

    fn sample(&mut self) -> impl Future<Output = Result<Self::Output, SampleError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickEvent {
    Started,
    Sampled,
    /// The tick used a fallback value; carries the error text.
    Failed(String),
    Stopped,
}

/// Sent from a sampler to the supervisor after every lifecycle event and tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub family: MetricFamily,
    pub timestamp: u64,
    pub event: TickEvent,
    /// Screen state carried by battery ticks.
    pub screen_on: Option<bool>,
}

pub struct Sampler<P: Probe> {
    probe: P,
    history: RollingHistory<P::Output>,
    last_good: Option<P::Output>,
    failure_streak: u32,
    records: Option<mpsc::Sender<Record>>,
    reports: Option<mpsc::UnboundedSender<TickReport>>,
}

impl<P: Probe> Sampler<P> {
    pub fn new(probe: P, history: RollingHistory<P::Output>) -> Self {
        Self {
            probe,
            history,
            last_good: None,
            failure_streak: 0,
            records: None,
            reports: None,
        }
    }

    /// Successful readings are offered to this channel with `try_send`.
    pub fn with_records(mut self, records: mpsc::Sender<Record>) -> Self {
        self.records = Some(records);
        self
    }

    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<TickReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    pub fn family(&self) -> MetricFamily {
        P::Output::FAMILY
    }

    pub fn history(&self) -> RollingHistory<P::Output> {
        self.history.clone()
    }

    pub async fn sample_once(&mut self) -> Result<P::Output, SampleError> {
        self.probe.sample().await
    }

    /// Runs one iteration and returns the value pushed to history: the fresh reading, the
    /// last good one re-stamped to now, or the family's zero value if nothing succeeded yet.
    pub async fn tick(&mut self) -> P::Output {
        let family = self.family();
        let (reading, event) = match self.sample_once().await {
            Ok(reading) => {
                if self.failure_streak > 0 {
                    tracing::info!(%family, failed_ticks = self.failure_streak, "sampling recovered");
                }
                self.failure_streak = 0;
                self.last_good = Some(reading.clone());
                (reading, TickEvent::Sampled)
            }
            Err(e) => {
                self.failure_streak += 1;
                // Unsupported counters and repeat failures would otherwise log every tick.
                if self.failure_streak == 1 && !matches!(e, SampleError::Unsupported(_)) {
                    tracing::warn!(%family, error = %e, operation = "sample_once", "sample failed, using fallback");
                } else {
                    tracing::debug!(%family, error = %e, operation = "sample_once", "sample failed, using fallback");
                }
                let now = now_ms();
                let fallback = match &self.last_good {
                    Some(good) => good.restamp(now),
                    None => P::Output::zero(now),
                };
                (fallback, TickEvent::Failed(e.to_string()))
            }
        };

        self.history.push(reading.clone());

        if let Some(reports) = &self.reports {
            let _ = reports.send(TickReport {
                family,
                timestamp: reading.timestamp(),
                screen_on: reading_screen_state(&reading),
                event: event.clone(),
            });
        }

        if event == TickEvent::Sampled
            && let Some(records) = &self.records
        {
            match records.try_send(reading.clone().into_record()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    tracing::debug!(%family, operation = "hand_off", "writer channel full, record dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(%family, operation = "hand_off", "writer channel closed");
                }
            }
        }

        reading
    }

    fn report(&self, event: TickEvent) {
        if let Some(reports) = &self.reports {
            let _ = reports.send(TickReport {
                family: self.family(),
                timestamp: now_ms(),
                event,
                screen_on: None,
            });
        }
    }

    /// Spawns the loop. Stop is cooperative: the flag is checked at the top of each
    /// iteration and again after the sample completes; a read in progress is never cut off.
    pub fn start(self, interval: Duration) -> SamplerHandle {
        let family = self.family();
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let span = tracing::debug_span!("sampler", %family, interval_ms = interval.as_millis() as u64);
        let join = tokio::spawn(
            async move {
                let mut sampler = self;
                sampler.report(TickEvent::Started);
                loop {
                    if *stop_rx.borrow() {
                        break;
                    }
                    sampler.tick().await;
                    if *stop_rx.borrow() {
                        break;
                    }
                    tokio::select! {
                        _ = tokio::time::sleep(interval) => {}
                        changed = stop_rx.changed() => {
                            if changed.is_err() {
                                break;
                            }
                        }
                    }
                }
                sampler.report(TickEvent::Stopped);
                tracing::debug!("sampler stopped");
            }
            .instrument(span),
        );
        SamplerHandle {
            family,
            stop_tx,
            join,
        }
    }
}

fn reading_screen_state<R: Reading>(reading: &R) -> Option<bool> {
    match R::FAMILY {
        MetricFamily::Battery => reading.clone().into_record().screen_on(),
        _ => None,
    }
}

/// Control handle for a running sampler.
pub struct SamplerHandle {
    family: MetricFamily,
    stop_tx: watch::Sender<bool>,
    join: tokio::task::JoinHandle<()>,
}

impl SamplerHandle {
    pub fn family(&self) -> MetricFamily {
        self.family
    }

    /// Requests a stop; returns immediately.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Requests a stop and waits for the in-flight iteration to finish.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.join.await {
            tracing::warn!(family = %self.family, error = %e, "sampler task ended abnormally");
        }
    }
}
