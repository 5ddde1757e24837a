use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::core::archive::{extract_archive, find_modpack};
use crate::core::downloader::{Fetcher, HttpFetcher};
use crate::core::error::{RealizerError, RealizerResult};
use crate::core::modpack::{InstallReport, Installer, MANIFEST_FILE_NAME};
use crate::core::overrides::{copy_overrides, OVERRIDES_DIR};
use crate::core::settings::InstallSettings;

/// One realize run: which pack, where to put it, and how.
#[derive(Debug, Clone)]
pub struct RealizeRequest {
    /// A `.mrpack`, or a `.zip` that contains one.
    pub modpack: PathBuf,
    /// Base directory; the pack lands in `<output>/<pack name>`.
    pub output: PathBuf,
    pub settings: InstallSettings,
    /// Log every extracted path at debug level.
    pub list_extracted: bool,
}

/// Realize a pack over HTTP.
pub async fn realize(request: &RealizeRequest) -> RealizerResult<InstallReport> {
    request.settings.validate()?;
    let fetcher = HttpFetcher::with_connect_timeout(request.settings.connect_timeout())?;
    realize_with(request, Arc::new(fetcher)).await
}

/// Extract, install and overlay overrides using the given fetcher.
///
/// The scratch directory is removed when this returns, whatever the outcome.
pub async fn realize_with(
    request: &RealizeRequest,
    fetcher: Arc<dyn Fetcher>,
) -> RealizerResult<InstallReport> {
    let work_dir = tempfile::Builder::new()
        .prefix(".unzipped_data")
        .tempdir()
        .map_err(|e| RealizerError::io(std::env::temp_dir(), e))?;
    debug!("Working in {:?}", work_dir.path());

    let pack = resolve_pack(&request.modpack, work_dir.path(), request.list_extracted).await?;

    let unpack_dir = work_dir.path().join("unpack");
    let extracted = extract_blocking(&pack, &unpack_dir).await?;
    info!("Unpacked {:?} ({} entries)", pack, extracted.len());
    if request.list_extracted {
        for path in &extracted {
            debug!("  {:?}", path);
        }
    }

    let installer = Installer::from_settings(fetcher, &request.settings);
    let report = installer
        .install(&unpack_dir.join(MANIFEST_FILE_NAME), &request.output)
        .await?;

    let overrides = unpack_dir.join(OVERRIDES_DIR);
    let root = report.root.clone();
    tokio::task::spawn_blocking(move || copy_overrides(&overrides, &root)).await??;

    if let Err(e) = work_dir.close() {
        warn!("Could not remove temporary files, please delete them manually: {}", e);
    }

    Ok(report)
}

/// A `.zip` input is unwrapped first; the `.mrpack` inside becomes the pack.
async fn resolve_pack(input: &Path, work_dir: &Path, list: bool) -> RealizerResult<PathBuf> {
    let is_zip = input
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false);
    if !is_zip {
        return Ok(input.to_path_buf());
    }

    let outer = extract_blocking(input, &work_dir.join("outer")).await?;
    info!("Unzipped {:?} into {:?}", input, work_dir.join("outer"));
    if list {
        for path in &outer {
            debug!("  {:?}", path);
        }
    }

    match find_modpack(&outer) {
        Some(inner) => {
            info!("Redirecting {:?} to {:?}", input, inner);
            Ok(inner.clone())
        }
        None => {
            debug!("No .mrpack inside {:?}, treating it as the pack", input);
            Ok(input.to_path_buf())
        }
    }
}

async fn extract_blocking(archive: &Path, dest: &Path) -> RealizerResult<Vec<PathBuf>> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || extract_archive(&archive, &dest)).await?
}
