use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::core::error::{RealizerError, RealizerResult};
use crate::core::modpack::Side;

/// Why one URL attempt did not produce the entry.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttemptFailureKind {
    /// Transport error, HTTP status or local write failure.
    Fetch,
    /// The deadline expired before the body finished.
    Timeout,
    /// Bytes arrived but did not match the digests.
    Mismatch,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FailedAttempt {
    pub url: String,
    pub kind: AttemptFailureKind,
    pub reason: String,
}

/// Terminal state of one manifest entry.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EntryOutcome {
    /// Already on disk and valid; no network access happened.
    CachedValid,
    /// Downloaded from `url` and verified.
    Fetched { url: String },
    /// Every candidate URL was tried and none produced a valid file.
    Failed { attempts: Vec<FailedAttempt> },
    /// Not wanted on the configured side.
    Skipped { side: Side },
}

impl EntryOutcome {
    pub fn is_satisfied(&self) -> bool {
        matches!(self, EntryOutcome::CachedValid | EntryOutcome::Fetched { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, EntryOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EntryReport {
    /// Manifest path of the entry, relative to the install root.
    pub path: String,
    pub outcome: EntryOutcome,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ReportCounts {
    pub cached: usize,
    pub fetched: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Everything an install run produced, one record per manifest entry.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub root: PathBuf,
    pub entries: Vec<EntryReport>,
}

impl InstallReport {
    pub fn new(root: PathBuf, entries: Vec<EntryReport>) -> Self {
        Self { root, entries }
    }

    pub fn counts(&self) -> ReportCounts {
        let mut counts = ReportCounts::default();
        for entry in &self.entries {
            match entry.outcome {
                EntryOutcome::CachedValid => counts.cached += 1,
                EntryOutcome::Fetched { .. } => counts.fetched += 1,
                EntryOutcome::Failed { .. } => counts.failed += 1,
                EntryOutcome::Skipped { .. } => counts.skipped += 1,
            }
        }
        counts
    }

    pub fn failures(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries.iter().filter(|e| e.outcome.is_failed())
    }

    /// True when no entry ended in `Failed`.
    pub fn is_complete(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn outcome_of(&self, path: &str) -> Option<&EntryOutcome> {
        self.entries
            .iter()
            .find(|e| e.path == path)
            .map(|e| &e.outcome)
    }

    /// Emit the human-readable projection of this report.
    pub fn log_summary(&self) {
        let counts = self.counts();
        info!(
            "Installed into {:?}: {} fetched, {} already valid, {} skipped, {} failed",
            self.root, counts.fetched, counts.cached, counts.skipped, counts.failed
        );

        for entry in self.failures() {
            if let EntryOutcome::Failed { attempts } = &entry.outcome {
                warn!(
                    "Could not acquire {} after {} attempt(s)",
                    entry.path,
                    attempts.len()
                );
                for attempt in attempts {
                    warn!("  {} ({:?}): {}", attempt.url, attempt.kind, attempt.reason);
                }
            }
        }
    }

    /// Persist the report as pretty JSON.
    pub async fn write_json(&self, path: &Path) -> RealizerResult<()> {
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RealizerError::io(parent, e))?;
        }

        tokio::fs::write(path, json)
            .await
            .map_err(|e| RealizerError::io(path, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InstallReport {
        InstallReport::new(
            PathBuf::from("/out/pack1"),
            vec![
                EntryReport {
                    path: "mods/a.jar".into(),
                    outcome: EntryOutcome::CachedValid,
                },
                EntryReport {
                    path: "mods/b.jar".into(),
                    outcome: EntryOutcome::Fetched {
                        url: "https://cdn.example/b.jar".into(),
                    },
                },
                EntryReport {
                    path: "mods/c.jar".into(),
                    outcome: EntryOutcome::Failed {
                        attempts: vec![FailedAttempt {
                            url: "https://cdn.example/c.jar".into(),
                            kind: AttemptFailureKind::Fetch,
                            reason: "HTTP 404".into(),
                        }],
                    },
                },
            ],
        )
    }

    #[test]
    fn counts_each_outcome() {
        let report = sample();
        assert_eq!(
            report.counts(),
            ReportCounts {
                cached: 1,
                fetched: 1,
                failed: 1,
                skipped: 0,
            }
        );
        assert!(!report.is_complete());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(
            report.outcome_of("mods/a.jar"),
            Some(&EntryOutcome::CachedValid)
        );
    }

    #[test]
    fn outcomes_serialize_with_status_tag() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["entries"][0]["outcome"]["status"], "cached_valid");
        assert_eq!(value["entries"][1]["outcome"]["status"], "fetched");
        assert_eq!(
            value["entries"][2]["outcome"]["attempts"][0]["kind"],
            "fetch"
        );
    }

    #[tokio::test]
    async fn write_json_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("run.json");

        sample().write_json(&path).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["root"], "/out/pack1");
    }
}
