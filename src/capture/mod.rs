mod controller;
mod frame;
mod frame_codec;
mod loop_worker;
mod state;

pub use controller::ScanController;
pub use frame::{FrameFate, FrameSource, InboxDirectory, SnapshotFile};
pub use frame_codec::{ensure_jpeg, is_jpeg, thumbnail_data_url};
pub use state::{
    CaptureStatus, ScanEvent, ScanOutcome, ScanState, ScanStatusView, SkipReason, TriggerMode,
    NOTICE_DURATION,
};
