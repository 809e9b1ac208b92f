use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard,
};

use anyhow::{Context, Result};
use log::{debug, error, info};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    config::CaptureConfig,
    recognition::{CardRecognizer, ErrorKind, RecognitionError},
    store::CollectionStore,
};

use super::{
    frame::FrameSource,
    loop_worker::{auto_scan_loop, perform_capture, CaptureResult},
    state::{
        CaptureStatus, ScanEvent, ScanOutcome, ScanState, ScanStatusView, SkipReason,
        TriggerMode,
    },
};

const EVENT_CAPACITY: usize = 64;

/// Drives capture cycles, manual or on a timer, against one collection.
///
/// At most one cycle is in flight at any time. Stopping continuous mode never
/// cancels a cycle that already started; its result still lands in the store.
pub struct ScanController<F, R> {
    inner: Arc<ControllerInner<F, R>>,
}

impl<F, R> Clone for ScanController<F, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<F, R> {
    store: CollectionStore,
    frames: F,
    recognizer: R,
    capture: CaptureConfig,
    state: Mutex<ScanState>,
    in_flight: AtomicBool,
    completions: watch::Sender<u64>,
    events: broadcast::Sender<ScanEvent>,
    auto: tokio::sync::Mutex<Option<AutoScan>>,
}

struct AutoScan {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
    period: Duration,
}

/// Holds the in-flight flag for one cycle; releasing it wakes the auto loop.
struct InFlightGuard<F, R> {
    inner: Arc<ControllerInner<F, R>>,
}

impl<F, R> Drop for InFlightGuard<F, R> {
    fn drop(&mut self) {
        self.inner.in_flight.store(false, Ordering::SeqCst);
        self.inner
            .completions
            .send_modify(|count| *count = count.wrapping_add(1));
    }
}

impl<F, R> ScanController<F, R>
where
    F: FrameSource,
    R: CardRecognizer,
{
    pub fn new(store: CollectionStore, frames: F, recognizer: R, capture: CaptureConfig) -> Self {
        let (completions, _) = watch::channel(0);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            inner: Arc::new(ControllerInner {
                store,
                frames,
                recognizer,
                capture,
                state: Mutex::new(ScanState::new()),
                in_flight: AtomicBool::new(false),
                completions,
                events,
                auto: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub fn store(&self) -> &CollectionStore {
        &self.inner.store
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.inner.events.subscribe()
    }

    pub fn status(&self) -> CaptureStatus {
        if self.inner.in_flight.load(Ordering::SeqCst) {
            CaptureStatus::Capturing
        } else {
            CaptureStatus::Idle
        }
    }

    pub async fn is_auto_running(&self) -> bool {
        self.inner.auto.lock().await.is_some()
    }

    pub async fn status_view(&self) -> ScanStatusView {
        let auto_running = self.is_auto_running().await;
        let status = self.status();
        let view = self.lock_state().view(status, auto_running, Instant::now());
        view
    }

    /// Runs one cycle now, unless one is already in flight or no credential is set.
    pub async fn scan_now(&self) -> ScanOutcome {
        match self.try_begin().await {
            Ok((guard, credential)) => self.run_cycle(guard, credential, TriggerMode::Manual).await,
            Err(reason) => {
                debug!("manual scan skipped: {reason:?}");
                ScanOutcome::Skipped(reason)
            }
        }
    }

    /// Starts continuous mode at the stored interval. Returns false if already running.
    pub async fn start_auto(&self) -> Result<bool> {
        let mut auto = self.inner.auto.lock().await;
        if auto.is_some() {
            return Ok(false);
        }

        let settings = self.inner.store.settings().await;
        // A zero period would panic inside tokio's interval.
        let period = Duration::from_millis(settings.scan_interval.max(1));
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(auto_scan_loop(self.clone(), period, cancel_token.clone()));

        *auto = Some(AutoScan {
            handle,
            cancel_token,
            period,
        });
        Ok(true)
    }

    /// Stops scheduling new cycles. A cycle already in flight runs to completion.
    pub async fn stop_auto(&self) -> Result<bool> {
        let running = self.inner.auto.lock().await.take();
        let Some(auto) = running else {
            return Ok(false);
        };

        auto.cancel_token.cancel();
        auto.handle
            .await
            .context("auto-scan loop task failed to join")?;
        info!("auto-scan stopped");
        Ok(true)
    }

    /// Brings the running loop in line with the stored settings.
    pub async fn sync_with_settings(&self) -> Result<()> {
        let settings = self.inner.store.settings().await;
        let wanted = Duration::from_millis(settings.scan_interval.max(1));
        let running = self.inner.auto.lock().await.as_ref().map(|auto| auto.period);

        match (settings.auto_scan, running) {
            (true, None) => {
                self.start_auto().await?;
            }
            (true, Some(period)) if period != wanted => {
                self.stop_auto().await?;
                self.start_auto().await?;
            }
            (false, Some(_)) => {
                self.stop_auto().await?;
            }
            _ => {}
        }
        Ok(())
    }

    pub async fn toggle_auto_scan(&self) -> Result<bool> {
        let enabled = self.inner.store.toggle_auto_scan().await?;
        self.sync_with_settings().await?;
        Ok(enabled)
    }

    pub async fn set_scan_interval(&self, ms: u64) -> Result<()> {
        self.inner.store.set_scan_interval(ms).await?;
        self.sync_with_settings().await
    }

    /// Resolves once no cycle is in flight.
    pub async fn wait_idle(&self) {
        let mut completions = self.inner.completions.subscribe();
        while self.inner.in_flight.load(Ordering::SeqCst) {
            if completions.changed().await.is_err() {
                break;
            }
        }
    }

    pub(super) fn completions(&self) -> watch::Receiver<u64> {
        self.inner.completions.subscribe()
    }

    /// Called by the auto loop on every tick.
    pub(super) async fn on_tick(&self) {
        match self.try_begin().await {
            Ok((guard, credential)) => {
                let controller = self.clone();
                tokio::spawn(async move {
                    controller
                        .run_cycle(guard, credential, TriggerMode::Auto)
                        .await;
                });
            }
            Err(SkipReason::Busy) => {
                debug!("tick dropped, previous cycle still in flight");
                self.emit(ScanEvent::TickDropped);
            }
            Err(reason) => debug!("tick skipped: {reason:?}"),
        }
    }

    async fn try_begin(&self) -> Result<(InFlightGuard<F, R>, String), SkipReason> {
        let credential = self.inner.store.api_key().await;
        if credential.trim().is_empty() {
            return Err(SkipReason::MissingCredential);
        }

        self.inner
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| SkipReason::Busy)?;

        Ok((
            InFlightGuard {
                inner: Arc::clone(&self.inner),
            },
            credential,
        ))
    }

    async fn run_cycle(
        &self,
        guard: InFlightGuard<F, R>,
        credential: String,
        mode: TriggerMode,
    ) -> ScanOutcome {
        self.lock_state().begin_cycle();
        self.emit(ScanEvent::CaptureStarted { mode });

        let result = perform_capture(
            &self.inner.store,
            &self.inner.frames,
            &self.inner.recognizer,
            &credential,
            self.inner.capture,
        )
        .await;

        let outcome = match result {
            Ok(CaptureResult::NoFrame) => ScanOutcome::NoFrame,
            Ok(CaptureResult::NoCard) => {
                self.emit(ScanEvent::NoCard);
                ScanOutcome::NoCard
            }
            Ok(CaptureResult::Added(card)) => {
                self.lock_state().record_card(&card.name, Instant::now());
                self.emit(ScanEvent::CardAdded {
                    card_id: card.id.clone(),
                    name: card.name.clone(),
                });
                ScanOutcome::Added(card)
            }
            Err(err) => {
                let (kind, message) = describe_failure(&err);
                error!("scan cycle failed: {err:#}");
                let display = self.lock_state().record_error(mode, &message);
                self.emit(ScanEvent::Failed {
                    mode,
                    message: display,
                });
                ScanOutcome::Failed { kind, message }
            }
        };

        drop(guard);
        outcome
    }

    fn emit(&self, event: ScanEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    fn lock_state(&self) -> MutexGuard<'_, ScanState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn describe_failure(err: &anyhow::Error) -> (ErrorKind, String) {
    match err.downcast_ref::<RecognitionError>() {
        Some(recognition) => (recognition.kind(), recognition.to_string()),
        None => (ErrorKind::Unknown, format!("{err:#}")),
    }
}
