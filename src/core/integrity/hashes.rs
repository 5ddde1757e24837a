use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha1::{Digest, Sha1};
use sha2::{Sha256, Sha512};

/// Digest algorithms a manifest may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(HashAlgorithm::Sha1),
            "sha256" => Ok(HashAlgorithm::Sha256),
            "sha512" => Ok(HashAlgorithm::Sha512),
            other => Err(format!("unknown hash algorithm '{other}'")),
        }
    }
}

/// The digest set a file must match, keyed by algorithm.
///
/// Deserializes from the manifest's `{"sha1": "..", "sha512": ".."}` object.
/// Names this crate does not know are dropped rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectedHashes(BTreeMap<HashAlgorithm, String>);

impl ExpectedHashes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, algorithm: HashAlgorithm, hex_digest: impl Into<String>) -> Self {
        self.0.insert(algorithm, hex_digest.into());
        self
    }

    pub fn get(&self, algorithm: HashAlgorithm) -> Option<&str> {
        self.0.get(&algorithm).map(String::as_str)
    }

    pub fn contains(&self, algorithm: HashAlgorithm) -> bool {
        self.0.contains_key(&algorithm)
    }

    pub fn algorithms(&self) -> impl Iterator<Item = HashAlgorithm> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (HashAlgorithm, &str)> {
        self.0.iter().map(|(a, h)| (*a, h.as_str()))
    }

    /// Digest `bytes` under every algorithm named here.
    pub fn of_bytes(bytes: &[u8], algorithms: impl IntoIterator<Item = HashAlgorithm>) -> Self {
        let mut hasher = MultiHasher::new(algorithms);
        hasher.update(bytes);
        hasher.finalize()
    }
}

impl Serialize for ExpectedHashes {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let map: BTreeMap<&str, &str> = self.iter().map(|(a, h)| (a.as_str(), h)).collect();
        map.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ExpectedHashes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = BTreeMap::<String, String>::deserialize(deserializer)?;
        let mut hashes = BTreeMap::new();
        for (name, digest) in raw {
            match name.parse::<HashAlgorithm>() {
                Ok(algorithm) => {
                    hashes.insert(algorithm, digest);
                }
                Err(_) => tracing::debug!("Ignoring unsupported hash '{}'", name),
            }
        }
        Ok(ExpectedHashes(hashes))
    }
}

/// Runs several digests over one byte stream.
pub struct MultiHasher {
    sha1: Option<Sha1>,
    sha256: Option<Sha256>,
    sha512: Option<Sha512>,
}

impl MultiHasher {
    pub fn new(algorithms: impl IntoIterator<Item = HashAlgorithm>) -> Self {
        let mut hasher = Self {
            sha1: None,
            sha256: None,
            sha512: None,
        };
        for algorithm in algorithms {
            match algorithm {
                HashAlgorithm::Sha1 => hasher.sha1 = Some(Sha1::new()),
                HashAlgorithm::Sha256 => hasher.sha256 = Some(Sha256::new()),
                HashAlgorithm::Sha512 => hasher.sha512 = Some(Sha512::new()),
            }
        }
        hasher
    }

    pub fn update(&mut self, chunk: &[u8]) {
        if let Some(h) = self.sha1.as_mut() {
            h.update(chunk);
        }
        if let Some(h) = self.sha256.as_mut() {
            h.update(chunk);
        }
        if let Some(h) = self.sha512.as_mut() {
            h.update(chunk);
        }
    }

    /// Lowercase hex digests for every algorithm the hasher was built with.
    pub fn finalize(self) -> ExpectedHashes {
        let mut out = ExpectedHashes::new();
        if let Some(h) = self.sha1 {
            out = out.with(HashAlgorithm::Sha1, hex::encode(h.finalize()));
        }
        if let Some(h) = self.sha256 {
            out = out.with(HashAlgorithm::Sha256, hex::encode(h.finalize()));
        }
        if let Some(h) = self.sha512 {
            out = out.with(HashAlgorithm::Sha512, hex::encode(h.finalize()));
        }
        out
    }
}
