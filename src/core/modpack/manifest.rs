use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::{RealizerError, RealizerResult};
use crate::core::integrity::{ExpectedHashes, HashAlgorithm};

/// File name of the index inside an extracted `.mrpack`.
pub const MANIFEST_FILE_NAME: &str = "modrinth.index.json";

/// Algorithms every entry must carry.
const REQUIRED_HASHES: [HashAlgorithm; 2] = [HashAlgorithm::Sha1, HashAlgorithm::Sha512];

/// Which half of the game an installation is for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Client,
    Server,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Client => write!(f, "client"),
            Side::Server => write!(f, "server"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "client" => Ok(Side::Client),
            "server" => Ok(Side::Server),
            other => Err(format!("unknown side '{other}', expected client or server")),
        }
    }
}

/// How strongly a side needs a file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SideSupport {
    Required,
    Optional,
    Unsupported,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileEnv {
    pub client: SideSupport,
    pub server: SideSupport,
}

impl FileEnv {
    pub fn support_for(&self, side: Side) -> SideSupport {
        match side {
            Side::Client => self.client,
            Side::Server => self.server,
        }
    }
}

/// One artifact the installation needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    /// Relative path under the installation root.
    pub path: String,
    pub hashes: ExpectedHashes,
    /// Candidate URLs, highest priority first.
    pub downloads: Vec<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub env: Option<FileEnv>,
}

impl FileEntry {
    /// Where this entry lands under `root`.
    pub fn destination(&self, root: &Path) -> PathBuf {
        root.join(&self.path)
    }

    /// Entries without `env` are wanted on both sides.
    pub fn wanted_on(&self, side: Side) -> bool {
        self.env
            .as_ref()
            .map(|env| env.support_for(side) != SideSupport::Unsupported)
            .unwrap_or(true)
    }
}

/// Top-level `modrinth.index.json` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModManifest {
    #[serde(default)]
    pub name: String,
    pub files: Vec<FileEntry>,

    // ── Informational ──
    #[serde(default)]
    pub format_version: Option<u32>,
    #[serde(default)]
    pub game: Option<String>,
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Game and loader versions, e.g. `minecraft` -> `1.20.1`.
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl ModManifest {
    /// Read and decode a manifest file. Call `validate` before acting on it.
    pub async fn load(path: &Path) -> RealizerResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| RealizerError::ManifestRead {
                path: path.to_path_buf(),
                source,
            })?;
        let manifest: ModManifest =
            serde_json::from_str(&raw).map_err(|source| RealizerError::ManifestParse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(manifest)
    }

    /// Reject manifests the installer cannot process safely.
    pub fn validate(&self) -> RealizerResult<()> {
        if Path::new(&self.name)
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(RealizerError::InvalidManifest(format!(
                "pack name '{}' is not a plain directory name",
                self.name
            )));
        }

        let mut seen = HashSet::new();

        for entry in &self.files {
            validate_relative_path(&entry.path)?;

            for algorithm in REQUIRED_HASHES {
                if !entry.hashes.contains(algorithm) {
                    return Err(RealizerError::InvalidManifest(format!(
                        "entry '{}' has no {} hash",
                        entry.path, algorithm
                    )));
                }
            }

            if entry.downloads.is_empty() {
                return Err(RealizerError::InvalidManifest(format!(
                    "entry '{}' has no download URLs",
                    entry.path
                )));
            }

            // Two entries writing one file would race.
            if !seen.insert(normalize_entry_path(&entry.path)) {
                return Err(RealizerError::InvalidManifest(format!(
                    "duplicate entry path '{}'",
                    entry.path
                )));
            }
        }

        Ok(())
    }

    /// Installation root for this pack under `output_base`.
    pub fn install_root(&self, output_base: &Path) -> PathBuf {
        if self.name.is_empty() {
            output_base.to_path_buf()
        } else {
            output_base.join(&self.name)
        }
    }
}

fn validate_relative_path(raw: &str) -> RealizerResult<()> {
    if raw.is_empty() {
        return Err(RealizerError::InvalidManifest("entry with empty path".into()));
    }

    for component in Path::new(raw).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(RealizerError::InvalidManifest(format!(
                    "entry path '{raw}' escapes the installation root"
                )));
            }
        }
    }

    Ok(())
}

fn normalize_entry_path(raw: &str) -> PathBuf {
    Path::new(raw)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}
