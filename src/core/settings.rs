use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::{RealizerError, RealizerResult};
use crate::core::modpack::Side;

/// What to do with a downloaded file that never matched its digests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Remove it so nothing later mistakes it for a finished download.
    #[default]
    Delete,
    /// Leave it on disk for inspection.
    Preserve,
}

/// Tunables for a realize run. Every field has a default so a partial
/// JSON file is enough.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallSettings {
    /// Maximum number of entries processed at once.
    pub concurrency: usize,
    /// Deadline for one URL attempt, connect through last byte.
    pub fetch_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub mismatch_policy: MismatchPolicy,
    pub side: Side,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            concurrency: 8,
            fetch_timeout_secs: 600,
            connect_timeout_secs: 30,
            mismatch_policy: MismatchPolicy::Delete,
            side: Side::Client,
        }
    }
}

impl InstallSettings {
    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> RealizerResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| RealizerError::io(path, e))?;
        let settings: InstallSettings = serde_json::from_str(&raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> RealizerResult<()> {
        if self.concurrency == 0 {
            return Err(RealizerError::InvalidSettings(
                "concurrency must be at least 1".into(),
            ));
        }
        if self.fetch_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(RealizerError::InvalidSettings(
                "timeouts must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
