use crate::core::ScriptGrabError;
use anyhow::Result;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

/// Verifies a fetched script body against a pinned SHA-256 digest.
///
/// Digests are hex-encoded. An optional `sha256:` prefix is accepted and the
/// comparison is case-insensitive.
pub struct ChecksumVerifier;

impl ChecksumVerifier {
    /// Hex-encoded SHA-256 of `bytes`.
    #[must_use]
    pub fn compute_sha256(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// Check `bytes` fetched from `url` against `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptGrabError::ChecksumMismatch`] if the digests differ.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use scriptgrab::upgrade::verification::ChecksumVerifier;
    ///
    /// let expected = ChecksumVerifier::compute_sha256(b"print('hi')\n");
    /// assert!(ChecksumVerifier::verify(b"print('hi')\n", &expected, "https://example.com/u.py").is_ok());
    /// ```
    pub fn verify(bytes: &[u8], expected: &str, url: &str) -> Result<()> {
        debug!("Verifying checksum of {} bytes from {}", bytes.len(), url);

        let expected = expected.trim();
        let expected = expected.strip_prefix("sha256:").unwrap_or(expected).to_lowercase();
        let actual = Self::compute_sha256(bytes);

        if actual != expected {
            return Err(ScriptGrabError::ChecksumMismatch {
                url: url.to_string(),
                expected,
                actual,
            }
            .into());
        }

        info!("Checksum verification successful");
        Ok(())
    }
}
