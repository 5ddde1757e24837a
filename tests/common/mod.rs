#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use mrpack_realizer::core::downloader::Fetcher;
use mrpack_realizer::core::integrity::{ExpectedHashes, HashAlgorithm};
use mrpack_realizer::{RealizerError, RealizerResult};

/// In-memory fetcher that records how it was used.
#[derive(Default)]
pub struct MockFetcher {
    bodies: HashMap<String, Vec<u8>>,
    hanging: HashSet<String>,
    broken: HashMap<String, Vec<u8>>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `url`. Unknown URLs answer like a 404.
    pub fn serve(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies.insert(url.to_string(), body.to_vec());
        self
    }

    /// `url` never completes.
    pub fn hang(mut self, url: &str) -> Self {
        self.hanging.insert(url.to_string());
        self
    }

    /// Write `partial` for `url`, then fail as if the connection dropped.
    pub fn cut_off(mut self, url: &str, partial: &[u8]) -> Self {
        self.broken.insert(url.to_string(), partial.to_vec());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> RealizerResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(url.to_string());

        if self.hanging.contains(url) {
            std::future::pending::<()>().await;
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(partial) = self.broken.get(url) {
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(dest, partial).await?;
            return Err(RealizerError::Io {
                path: dest.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionReset, "body cut off"),
            });
        }

        let Some(body) = self.bodies.get(url) else {
            return Err(RealizerError::DownloadFailed {
                url: url.to_string(),
                status: 404,
            });
        };

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(dest, body).await?;
        Ok(body.len() as u64)
    }
}

pub fn hashes_of(bytes: &[u8]) -> ExpectedHashes {
    ExpectedHashes::of_bytes(bytes, [HashAlgorithm::Sha1, HashAlgorithm::Sha512])
}

/// Manifest JSON entry for `path` whose digests match `content`.
pub fn entry_json(path: &str, content: &[u8], urls: &[&str]) -> serde_json::Value {
    let hashes = hashes_of(content);
    serde_json::json!({
        "path": path,
        "hashes": {
            "sha1": hashes.get(HashAlgorithm::Sha1).unwrap(),
            "sha512": hashes.get(HashAlgorithm::Sha512).unwrap(),
        },
        "downloads": urls,
    })
}

pub fn manifest_json(name: &str, files: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "formatVersion": 1,
        "game": "minecraft",
        "versionId": "1.0.0",
        "name": name,
        "files": files,
        "dependencies": { "minecraft": "1.20.1" }
    })
}

pub fn write_manifest(dir: &Path, manifest: &serde_json::Value) -> std::path::PathBuf {
    let path = dir.join("modrinth.index.json");
    std::fs::write(&path, serde_json::to_vec_pretty(manifest).unwrap()).unwrap();
    path
}
