use std::path::Path;

use tracing::{debug, info};

use crate::core::error::{RealizerError, RealizerResult};

/// Directory inside an extracted pack whose contents overlay the install root.
pub const OVERRIDES_DIR: &str = "overrides";

/// Copy the `source` tree onto `destination`, file for file.
///
/// Existing files are replaced. A missing `source` is not an error; packs
/// without overrides are common. Returns the number of files copied.
pub fn copy_overrides(source: &Path, destination: &Path) -> RealizerResult<usize> {
    if !source.is_dir() {
        info!("No overrides at {:?}", source);
        return Ok(0);
    }

    std::fs::create_dir_all(destination).map_err(|e| RealizerError::io(destination, e))?;
    let copied = copy_dir_recursive(source, destination)?;
    info!("Copied {} override files into {:?}", copied, destination);
    Ok(copied)
}

fn copy_dir_recursive(source: &Path, destination: &Path) -> RealizerResult<usize> {
    let mut copied = 0;

    let entries = std::fs::read_dir(source).map_err(|e| RealizerError::io(source, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| RealizerError::io(source, e))?;
        let src_path = entry.path();
        let dst_path = destination.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| RealizerError::io(&src_path, e))?;

        if file_type.is_dir() {
            std::fs::create_dir_all(&dst_path).map_err(|e| RealizerError::io(&dst_path, e))?;
            copied += copy_dir_recursive(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            if dst_path.exists() {
                std::fs::remove_file(&dst_path).map_err(|e| RealizerError::io(&dst_path, e))?;
            }
            std::fs::copy(&src_path, &dst_path).map_err(|e| RealizerError::io(&dst_path, e))?;
            debug!("Override {:?} -> {:?}", src_path, dst_path);
            copied += 1;
        }
    }

    Ok(copied)
}
