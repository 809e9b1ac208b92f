use serde::{Deserialize, Serialize};

pub const DEFAULT_SCAN_INTERVAL_MS: u64 = 3000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ScanSettings {
    pub auto_scan: bool,
    pub scan_interval: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            auto_scan: false,
            scan_interval: DEFAULT_SCAN_INTERVAL_MS,
        }
    }
}
