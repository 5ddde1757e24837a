use std::path::Path;

use tokio::io::AsyncReadExt;

use super::hashes::{ExpectedHashes, MultiHasher};
use crate::core::error::{RealizerError, RealizerResult};

const READ_CHUNK: usize = 64 * 1024;

/// Hash the whole file at `path` under every algorithm named in `expected`.
pub async fn digest_file(path: &Path, expected: &ExpectedHashes) -> RealizerResult<ExpectedHashes> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| RealizerError::io(path, e))?;

    let mut hasher = MultiHasher::new(expected.algorithms());
    let mut buffer = vec![0u8; READ_CHUNK];
    loop {
        let n = file
            .read(&mut buffer)
            .await
            .map_err(|e| RealizerError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize())
}

/// Check `path` against the expected digests (and length, when known).
///
/// Every named algorithm must match; the first mismatch is returned as
/// `HashMismatch`. Comparison is case-insensitive on the hex text.
pub async fn check(
    path: &Path,
    expected: &ExpectedHashes,
    expected_size: Option<u64>,
) -> RealizerResult<()> {
    if let Some(size) = expected_size {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| RealizerError::io(path, e))?;
        if metadata.len() != size {
            return Err(RealizerError::SizeMismatch {
                path: path.to_path_buf(),
                expected: size,
                actual: metadata.len(),
            });
        }
    }

    let actual = digest_file(path, expected).await?;
    for (algorithm, want) in expected.iter() {
        let got = actual.get(algorithm).unwrap_or_default();
        if !got.eq_ignore_ascii_case(want) {
            return Err(RealizerError::HashMismatch {
                path: path.to_path_buf(),
                algorithm: algorithm.to_string(),
                expected: want.to_string(),
                actual: got.to_string(),
            });
        }
    }

    Ok(())
}

/// True iff the file exists, is readable and matches every expected digest.
pub async fn verify(path: &Path, expected: &ExpectedHashes) -> bool {
    check(path, expected, None).await.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::integrity::HashAlgorithm;

    fn hashes_for(bytes: &[u8]) -> ExpectedHashes {
        ExpectedHashes::of_bytes(bytes, [HashAlgorithm::Sha1, HashAlgorithm::Sha512])
    }

    #[tokio::test]
    async fn matching_file_verifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jar");
        tokio::fs::write(&path, b"mod bytes").await.unwrap();

        assert!(verify(&path, &hashes_for(b"mod bytes")).await);
    }

    #[tokio::test]
    async fn uppercase_expected_hex_still_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jar");
        tokio::fs::write(&path, b"mod bytes").await.unwrap();

        let lower = hashes_for(b"mod bytes");
        let mut upper = ExpectedHashes::new();
        for (algorithm, digest) in lower.iter() {
            upper = upper.with(algorithm, digest.to_ascii_uppercase());
        }
        assert!(verify(&path, &upper).await);
    }

    #[tokio::test]
    async fn one_bad_algorithm_invalidates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jar");
        tokio::fs::write(&path, b"mod bytes").await.unwrap();

        let good = hashes_for(b"mod bytes");
        let expected = ExpectedHashes::new()
            .with(HashAlgorithm::Sha1, good.get(HashAlgorithm::Sha1).unwrap())
            .with(HashAlgorithm::Sha512, "00".repeat(64));

        let err = check(&path, &expected, None).await.unwrap_err();
        match err {
            RealizerError::HashMismatch { algorithm, .. } => assert_eq!(algorithm, "sha512"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!verify(&path, &expected).await);
    }

    #[tokio::test]
    async fn missing_file_is_not_satisfied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.jar");

        assert!(!verify(&path, &hashes_for(b"x")).await);
        assert!(matches!(
            check(&path, &hashes_for(b"x"), None).await,
            Err(RealizerError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn size_mismatch_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.jar");
        tokio::fs::write(&path, b"12345").await.unwrap();

        let err = check(&path, &hashes_for(b"12345"), Some(4)).await.unwrap_err();
        assert!(matches!(
            err,
            RealizerError::SizeMismatch {
                expected: 4,
                actual: 5,
                ..
            }
        ));
        assert!(check(&path, &hashes_for(b"12345"), Some(5)).await.is_ok());
    }
}
