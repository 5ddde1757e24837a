use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{RealizerError, RealizerResult};

/// Unpack the zip at `archive_path` into `dest`.
///
/// Every entry must resolve inside `dest`; the first one that would not
/// aborts extraction with `UnsafeArchivePath`. Returns the paths written,
/// directories included, in archive order.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> RealizerResult<Vec<PathBuf>> {
    let zip_file = File::open(archive_path).map_err(|e| RealizerError::io(archive_path, e))?;
    let mut archive = zip::ZipArchive::new(zip_file)?;

    std::fs::create_dir_all(dest).map_err(|e| RealizerError::io(dest, e))?;

    let mut extracted = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;

        let rel_path = zipped
            .enclosed_name()
            .ok_or_else(|| RealizerError::UnsafeArchivePath(zipped.name().to_string()))?;
        if rel_path.as_os_str().is_empty() {
            continue;
        }

        let out_path = dest.join(rel_path);
        if zipped.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| RealizerError::io(&out_path, e))?;
            extracted.push(out_path);
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RealizerError::io(parent, e))?;
        }

        {
            let mut out = File::create(&out_path).map_err(|e| RealizerError::io(&out_path, e))?;
            std::io::copy(&mut zipped, &mut out).map_err(|e| RealizerError::io(&out_path, e))?;
        }

        if let Some(mode) = zipped.unix_mode() {
            apply_mode(&out_path, mode)?;
        }

        debug!("Extracted {:?}", out_path);
        extracted.push(out_path);
    }

    Ok(extracted)
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> RealizerResult<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o777))
        .map_err(|e| RealizerError::io(path, e))
}

#[cfg(not(unix))]
fn apply_mode(_path: &Path, _mode: u32) -> RealizerResult<()> {
    Ok(())
}

/// First `.mrpack` among `paths`, used when a pack ships inside an outer zip.
pub fn find_modpack(paths: &[PathBuf]) -> Option<&PathBuf> {
    paths.iter().find(|p| {
        p.is_file()
            && p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("mrpack"))
                .unwrap_or(false)
    })
}
