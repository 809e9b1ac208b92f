use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    config::CaptureConfig,
    models::Card,
    recognition::CardRecognizer,
    store::CollectionStore,
};

use super::{
    controller::ScanController,
    frame::{FrameFate, FrameSource},
    frame_codec::{ensure_jpeg, is_jpeg, thumbnail_data_url},
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

pub(super) enum CaptureResult {
    NoFrame,
    NoCard,
    Added(Card),
}

/// Fires a cycle every `period`; ticks that land on an in-flight cycle are
/// dropped, and each completion restarts the countdown.
pub(super) async fn auto_scan_loop<F, R>(
    controller: ScanController<F, R>,
    period: Duration,
    cancel_token: CancellationToken,
) where
    F: FrameSource,
    R: CardRecognizer,
{
    let mut completions = controller.completions();
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!("auto-scan started, every {}ms", period.as_millis());

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("auto-scan loop shutting down");
                break;
            }
            changed = completions.changed() => {
                if changed.is_err() {
                    break;
                }
                ticker.reset();
            }
            _ = ticker.tick() => controller.on_tick().await,
        }
    }
}

/// One grab, recognize, persist pass. The caller owns the in-flight flag.
///
/// The frame source hears how the cycle ended once the card is stored or dropped.
pub(super) async fn perform_capture<F, R>(
    store: &CollectionStore,
    frames: &F,
    recognizer: &R,
    credential: &str,
    capture: CaptureConfig,
) -> Result<CaptureResult>
where
    F: FrameSource,
    R: CardRecognizer,
{
    let capture_start = Instant::now();

    let Some(frame) = frames.grab().await.context("frame grab failed")? else {
        log_debug!("no frame available, skipping cycle");
        return Ok(CaptureResult::NoFrame);
    };

    let result = recognize_frame(store, recognizer, credential, capture, frame).await;

    let fate = match &result {
        Ok(CaptureResult::Added(_)) => FrameFate::Recognized,
        _ => FrameFate::Rejected,
    };
    if let Err(err) = frames.settle(fate).await {
        log_warn!("failed to settle frame as {fate:?}: {err:#}");
    }

    if let Ok(CaptureResult::Added(card)) = &result {
        log_info!(
            "scanned {} in {}ms",
            card.name,
            capture_start.elapsed().as_millis()
        );
    }
    result
}

async fn recognize_frame<R>(
    store: &CollectionStore,
    recognizer: &R,
    credential: &str,
    capture: CaptureConfig,
    frame: Vec<u8>,
) -> Result<CaptureResult>
where
    R: CardRecognizer,
{
    // Most camera tools already hand over JPEG; only re-encode when they don't.
    let jpeg = if is_jpeg(&frame) {
        frame
    } else {
        tokio::task::spawn_blocking(move || ensure_jpeg(frame))
            .await
            .context("jpeg encoder join failed")??
    };

    let recognize_start = Instant::now();
    let recognized = recognizer.recognize(credential, &jpeg).await?;
    let recognize_ms = recognize_start.elapsed().as_millis();

    let Some(recognized) = recognized else {
        log_info!("no card recognized (recognition: {recognize_ms}ms)");
        return Ok(CaptureResult::NoCard);
    };

    let image_url = if capture.attach_thumbnail {
        let max_edge = capture.thumbnail_max_edge_px;
        match tokio::task::spawn_blocking(move || thumbnail_data_url(&jpeg, max_edge)).await {
            Ok(Ok(url)) => Some(url),
            Ok(Err(err)) => {
                log_warn!("thumbnail skipped: {err:#}");
                None
            }
            Err(err) => {
                log_warn!("thumbnail worker join failed: {err}");
                None
            }
        }
    } else {
        None
    };

    let card = recognized.into_card(Uuid::new_v4().to_string(), Utc::now(), image_url);
    if !store.add_card(card.clone()).await? {
        bail!("card id {} already in collection", card.id);
    }

    log_debug!("stored {} (recognition: {recognize_ms}ms)", card.id);
    Ok(CaptureResult::Added(card))
}
