pub mod hashes;
pub mod verifier;

pub use hashes::{ExpectedHashes, HashAlgorithm, MultiHasher};
pub use verifier::{check, digest_file, verify};
