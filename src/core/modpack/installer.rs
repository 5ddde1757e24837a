use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures_util::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::manifest::{FileEntry, ModManifest};
use super::report::{
    AttemptFailureKind, EntryOutcome, EntryReport, FailedAttempt, InstallReport,
};
use crate::core::downloader::{fetch_with_deadline, Fetcher};
use crate::core::error::{RealizerError, RealizerResult};
use crate::core::integrity;
use crate::core::modpack::Side;
use crate::core::settings::{InstallSettings, MismatchPolicy};

/// Turns a manifest into files on disk, fetching what is missing or invalid.
pub struct Installer {
    fetcher: Arc<dyn Fetcher>,
    /// Maximum number of entries in flight.
    concurrency: usize,
    fetch_timeout: Duration,
    mismatch_policy: MismatchPolicy,
    side: Side,
}

impl Installer {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self::from_settings(fetcher, &InstallSettings::default())
    }

    pub fn from_settings(fetcher: Arc<dyn Fetcher>, settings: &InstallSettings) -> Self {
        Self {
            fetcher,
            concurrency: settings.concurrency.max(1),
            fetch_timeout: settings.fetch_timeout(),
            mismatch_policy: settings.mismatch_policy,
            side: settings.side,
        }
    }

    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    /// Load the manifest at `manifest_path` and install it under `output_base`.
    ///
    /// Only manifest problems and failure to create the install root are
    /// errors; per-entry failures are recorded in the returned report.
    pub async fn install(
        &self,
        manifest_path: &Path,
        output_base: &Path,
    ) -> RealizerResult<InstallReport> {
        let manifest = ModManifest::load(manifest_path).await?;
        info!(
            "Loaded manifest '{}' ({} files, version {})",
            manifest.name,
            manifest.files.len(),
            manifest.version_id.as_deref().unwrap_or("unknown")
        );
        for (component, version) in &manifest.dependencies {
            debug!("Pack depends on {} {}", component, version);
        }
        self.install_manifest(&manifest, output_base).await
    }

    /// Install an already loaded manifest.
    pub async fn install_manifest(
        &self,
        manifest: &ModManifest,
        output_base: &Path,
    ) -> RealizerResult<InstallReport> {
        manifest.validate()?;

        let root = manifest.install_root(output_base);
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| RealizerError::io(&root, e))?;

        let mut skipped = Vec::new();
        let mut queue = Vec::new();
        for (index, entry) in manifest.files.iter().enumerate() {
            if entry.wanted_on(self.side) {
                queue.push((index, entry));
            } else {
                debug!("Skipping {} (unsupported on {})", entry.path, self.side);
                skipped.push((
                    index,
                    EntryReport {
                        path: entry.path.clone(),
                        outcome: EntryOutcome::Skipped { side: self.side },
                    },
                ));
            }
        }

        info!(
            "Installing {} files into {:?}, concurrency={}",
            queue.len(),
            root,
            self.concurrency
        );

        let root_ref = root.as_path();
        let mut results: Vec<(usize, EntryReport)> = stream::iter(queue)
            .map(|(index, entry)| async move {
                let outcome = self.acquire(entry, root_ref).await;
                (
                    index,
                    EntryReport {
                        path: entry.path.clone(),
                        outcome,
                    },
                )
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        results.extend(skipped);
        results.sort_by_key(|(index, _)| *index);

        Ok(InstallReport::new(
            root,
            results.into_iter().map(|(_, report)| report).collect(),
        ))
    }

    // ── Per-entry acquisition ───────────────────────────

    async fn acquire(&self, entry: &FileEntry, root: &Path) -> EntryOutcome {
        let dest = entry.destination(root);

        if is_regular_file(&dest).await {
            match integrity::check(&dest, &entry.hashes, entry.file_size).await {
                Ok(()) => {
                    debug!("Already valid: {:?}", dest);
                    return EntryOutcome::CachedValid;
                }
                Err(e) => debug!("Existing file is stale, refetching: {}", e),
            }
        }

        let before = file_stamp(&dest).await;
        let mut wrote = false;
        let mut attempts = Vec::new();
        for url in &entry.downloads {
            debug!("Trying {} for {}", url, entry.path);

            let fetched =
                fetch_with_deadline(self.fetcher.as_ref(), url, &dest, self.fetch_timeout).await;
            if let Err(e) = fetched {
                warn!("Download of {} failed: {}", url, e);
                // Failures past `File::create` leave a partial body behind.
                wrote = wrote || file_stamp(&dest).await != before;
                let kind = match &e {
                    RealizerError::FetchTimeout { .. } => AttemptFailureKind::Timeout,
                    _ => AttemptFailureKind::Fetch,
                };
                attempts.push(FailedAttempt {
                    url: url.clone(),
                    kind,
                    reason: e.to_string(),
                });
                continue;
            }
            wrote = true;

            match integrity::check(&dest, &entry.hashes, entry.file_size).await {
                Ok(()) => {
                    debug!("Verified {} from {}", entry.path, url);
                    return EntryOutcome::Fetched { url: url.clone() };
                }
                Err(e) => {
                    warn!("Verification failed for {} from {}: {}", entry.path, url, e);
                    attempts.push(FailedAttempt {
                        url: url.clone(),
                        kind: AttemptFailureKind::Mismatch,
                        reason: e.to_string(),
                    });
                }
            }
        }

        warn!("Exhausted all URLs for {}", entry.path);
        // A pre-existing file nothing overwrote is left for the next run to re-check.
        if wrote && self.mismatch_policy == MismatchPolicy::Delete {
            discard(&dest).await;
        }
        EntryOutcome::Failed { attempts }
    }
}

async fn is_regular_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Length and mtime of `path`, or `None` when absent.
async fn file_stamp(path: &Path) -> Option<(u64, Option<SystemTime>)> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    Some((metadata.len(), metadata.modified().ok()))
}

/// Remove a leftover file that never verified.
async fn discard(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed invalid file {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Could not remove invalid file {:?}: {}", path, e),
    }
}
