//! Engine configuration
//!
//! The main startup knob is the scan limit: the maximum
//! number of rows a single filter pass may examine before the query is aborted.
//! The limit is injected into every query executor at construction time, so
//! embedders and tests can run engines with any value they like.

use crate::error::{Result, TableError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Default maximum number of rows examined by one filter pass
pub const DEFAULT_MAX_ROWS_SCAN: usize = 100_000;

/// Smallest scan limit accepted from startup arguments
pub const MIN_MAX_ROWS_SCAN: usize = 1_000;

/// Largest scan limit accepted from startup arguments
pub const MAX_MAX_ROWS_SCAN: usize = 10_000_000;

/// Keys visited per store scan call (the store's COUNT hint)
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 10;

/// Startup argument naming the scan limit
pub const MAX_SCAN_LIMIT_ARG: &str = "max_scan_limit";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum rows examined by one filter pass before `ScanLimitExceeded`
    pub max_rows_scan: usize,

    /// Page size hint for cursor-based key scans
    pub scan_page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_rows_scan: DEFAULT_MAX_ROWS_SCAN,
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }
}

impl EngineConfig {
    /// Small scan pages so tests walk the cursor loop several times
    pub fn for_testing() -> Self {
        Self {
            scan_page_size: 2,
            ..Default::default()
        }
    }

    /// Set the scan limit without range checking.
    pub fn with_max_rows_scan(mut self, limit: usize) -> Self {
        self.max_rows_scan = limit;
        self
    }

    pub fn with_scan_page_size(mut self, page_size: usize) -> Self {
        self.scan_page_size = page_size.max(1);
        self
    }

    /// Apply a scan limit coming from the outside world.
    ///
    /// Values outside `[MIN_MAX_ROWS_SCAN, MAX_MAX_ROWS_SCAN]` are rejected with a
    /// warning and the current limit is kept. Returns whether the value was applied.
    pub fn apply_max_scan_limit(&mut self, value: i64) -> bool {
        let in_range = usize::try_from(value)
            .map(|v| (MIN_MAX_ROWS_SCAN..=MAX_MAX_ROWS_SCAN).contains(&v))
            .unwrap_or(false);

        if in_range {
            self.max_rows_scan = value as usize;
            info!(max_scan_limit = value, "scan limit configured");
        } else {
            warn!(
                value,
                min = MIN_MAX_ROWS_SCAN,
                max = MAX_MAX_ROWS_SCAN,
                current = self.max_rows_scan,
                "invalid max_scan_limit, keeping current limit"
            );
        }
        in_range
    }

    /// Build a configuration from load-time arguments (`max_scan_limit <n>` pairs).
    pub fn from_module_args<S: AsRef<str>>(args: &[S]) -> Self {
        let mut config = Self::default();

        for pair in args.chunks(2) {
            let key = pair[0].as_ref();
            let Some(value) = pair.get(1).map(AsRef::as_ref) else {
                warn!(argument = key, "startup argument without a value ignored");
                continue;
            };

            if key.eq_ignore_ascii_case(MAX_SCAN_LIMIT_ARG) {
                match value.parse::<i64>() {
                    Ok(limit) => {
                        config.apply_max_scan_limit(limit);
                    }
                    Err(_) => warn!(value, "max_scan_limit is not an integer, using default"),
                }
            } else {
                warn!(argument = key, "unknown startup argument ignored");
            }
        }

        config
    }

    /// Load a JSON configuration file. The scan limit is range checked.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;

        if !(MIN_MAX_ROWS_SCAN..=MAX_MAX_ROWS_SCAN).contains(&config.max_rows_scan) {
            return Err(TableError::Config(format!(
                "max_rows_scan must be between {} and {}, got {}",
                MIN_MAX_ROWS_SCAN, MAX_MAX_ROWS_SCAN, config.max_rows_scan
            )));
        }
        if config.scan_page_size == 0 {
            return Err(TableError::Config("scan_page_size must be positive".into()));
        }

        Ok(config)
    }
}
