use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the realizer.
/// Every module returns `Result<T, RealizerError>`.
#[derive(Debug, Error)]
pub enum RealizerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    #[error("Download of {url} timed out after {secs}s")]
    FetchTimeout { url: String, secs: u64 },

    // ── Integrity ───────────────────────────────────────
    #[error("{algorithm} mismatch for {path:?}: expected {expected}, got {actual}")]
    HashMismatch {
        path: PathBuf,
        algorithm: String,
        expected: String,
        actual: String,
    },

    #[error("Size mismatch for {path:?}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    // ── Manifest ────────────────────────────────────────
    #[error("Cannot read manifest {path:?}: {source}")]
    ManifestRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cannot parse manifest {path:?}: {source}")]
    ManifestParse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Archive ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Archive entry escapes destination: {0}")]
    UnsafeArchivePath(String),

    // ── Settings ────────────────────────────────────────
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    // ── Runtime ─────────────────────────────────────────
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Convenience alias used throughout the crate.
pub type RealizerResult<T> = Result<T, RealizerError>;

impl From<std::io::Error> for RealizerError {
    fn from(source: std::io::Error) -> Self {
        RealizerError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

impl RealizerError {
    /// Attach a path to an IO error, the shape used by every filesystem call.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RealizerError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors that mean the manifest itself is unusable.
    pub fn is_manifest_error(&self) -> bool {
        matches!(
            self,
            RealizerError::ManifestRead { .. }
                | RealizerError::ManifestParse { .. }
                | RealizerError::InvalidManifest(_)
        )
    }
}
