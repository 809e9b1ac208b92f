use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

use crate::{models::Card, recognition::ErrorKind};

/// How long the "Scanned: <name>" notice stays visible.
pub const NOTICE_DURATION: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum CaptureStatus {
    #[default]
    Idle,
    Capturing,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TriggerMode {
    Manual,
    Auto,
}

impl TriggerMode {
    fn error_prefix(self) -> &'static str {
        match self {
            TriggerMode::Manual => "Error: ",
            TriggerMode::Auto => "Auto-scan Error: ",
        }
    }
}

/// Why a trigger did not start a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Busy,
    MissingCredential,
}

/// Result of one manual trigger.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    Skipped(SkipReason),
    NoFrame,
    NoCard,
    Added(Card),
    Failed { kind: ErrorKind, message: String },
}

/// Broadcast to front ends as cycles progress.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    CaptureStarted { mode: TriggerMode },
    CardAdded { card_id: String, name: String },
    NoCard,
    Failed { mode: TriggerMode, message: String },
    TickDropped,
}

/// What a status display shows.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatusView {
    pub status: CaptureStatus,
    pub auto_scan: bool,
    pub last_scanned: Option<String>,
    pub error: Option<String>,
    pub cards_added: u64,
}

/// Transient, display-only state of the capture loop.
#[derive(Debug, Default)]
pub struct ScanState {
    notice: Option<(String, Instant)>,
    last_error: Option<String>,
    cards_added: u64,
}

impl ScanState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_cycle(&mut self) {
        self.last_error = None;
    }

    pub fn record_card(&mut self, name: &str, now: Instant) {
        self.notice = Some((name.to_string(), now));
        self.cards_added += 1;
    }

    /// Stores the display message and returns it.
    pub fn record_error(&mut self, mode: TriggerMode, message: &str) -> String {
        let display = format!("{}{message}", mode.error_prefix());
        self.last_error = Some(display.clone());
        display
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// The notice, until it expires.
    pub fn notice(&self, now: Instant) -> Option<&str> {
        self.notice
            .as_ref()
            .filter(|(_, shown_at)| now.saturating_duration_since(*shown_at) < NOTICE_DURATION)
            .map(|(name, _)| name.as_str())
    }

    /// Errors stay hidden while continuous mode runs so a scanning session is
    /// not interrupted; they show up once it stops.
    pub fn view(&self, status: CaptureStatus, auto_scan: bool, now: Instant) -> ScanStatusView {
        ScanStatusView {
            status,
            auto_scan,
            last_scanned: self.notice(now).map(str::to_string),
            error: if auto_scan {
                None
            } else {
                self.last_error.clone()
            },
            cards_added: self.cards_added,
        }
    }
}
