//! Algorithm-tagged content checksums.
//!
//! Storing the algorithm alongside the digest means a future change of hash
//! function does not silently invalidate every existing record: checksums
//! produced by different algorithms simply never compare equal.

use crate::error::{ErrorKind, Result};
use sha2::{Digest, Sha256};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::{ErrorKind as IoErrorKind, Read};
use std::str::FromStr;

/// Files are hashed in chunks of this many bytes; never all at once.
pub const CHUNK_SIZE: usize = 1024 * 1024;
/// Name of the algorithm used by [`Checksum::from_reader`].
pub const DEFAULT_ALGORITHM: &str = "sha256";

/// Content checksum: hash algorithm name plus lower-case hex digest.
///
/// Serialized as `algorithm:digest` for storage (see [`Display`] and
/// [`FromStr`]) and as `token=digest` for integrity headers (see
/// [`as_header_value`](Self::as_header_value)).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: String,
    digest: String,
}
impl Checksum {
    pub fn new(algorithm: impl Into<String>, digest: impl Into<String>) -> Self {
        Self {
            algorithm: algorithm.into(),
            digest: digest.into(),
        }
    }

    /// Hash everything readable from `reader`, [`CHUNK_SIZE`] bytes at a time.
    ///
    /// This is blocking I/O; async callers should go through
    /// [`StorageBackend::checksum`](crate::StorageBackend::checksum).
    pub fn from_reader(mut reader: impl Read) -> Result<Self> {
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];
        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == IoErrorKind::Interrupted => continue,
                Err(e) => exn::bail!(ErrorKind::Io(e)),
            };
            hasher.update(&buffer[..read]);
        }
        let checksum = Self::new(DEFAULT_ALGORITHM, hex::encode(hasher.finalize()));
        tracing::trace!(%checksum, "Calculated checksum");
        Ok(checksum)
    }

    /// Checksum of an in-memory buffer.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Self {
        Self::new(DEFAULT_ALGORITHM, hex::encode(Sha256::digest(bytes.as_ref())))
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Format for a content-integrity response header, e.g. `sha-256=ab12…`.
    pub fn as_header_value(&self) -> String {
        let token = if let Some(bits) = self.algorithm.strip_prefix("id-sha") {
            format!("id-sha-{bits}")
        } else if let Some(bits) = self.algorithm.strip_prefix("sha") {
            format!("sha-{bits}")
        } else {
            self.algorithm.clone()
        };
        format!("{token}={}", self.digest)
    }
}
impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}:{}", self.algorithm, self.digest)
    }
}
impl FromStr for Checksum {
    type Err = crate::error::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let Some((algorithm, digest)) = s.split_once(':') else {
            exn::bail!(ErrorKind::InvalidChecksum(s.to_string()));
        };
        if algorithm.is_empty() || digest.is_empty() || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            exn::bail!(ErrorKind::InvalidChecksum(s.to_string()));
        }
        Ok(Self::new(algorithm, digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Cursor;

    // SHA-256 of the empty string.
    const EMPTY: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    /// Reader that hands out at most `limit` bytes per `read()` call.
    struct Trickle<'a> {
        data: &'a [u8],
        limit: usize,
    }
    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.limit.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_empty_input() {
        let checksum = Checksum::from_reader(Cursor::new(b"")).unwrap();
        assert_eq!(checksum.algorithm(), "sha256");
        assert_eq!(checksum.digest(), EMPTY);
    }

    #[rstest]
    #[case(1)]
    #[case(7)]
    #[case(4096)]
    fn test_chunk_boundaries_do_not_matter(#[case] limit: usize) {
        // Larger than one chunk so the buffer is refilled at least once.
        let data: Vec<u8> = (0..CHUNK_SIZE + 4321).map(|i| (i % 251) as u8).collect();
        let whole = Checksum::from_reader(Cursor::new(&data)).unwrap();
        let trickled = Checksum::from_reader(Trickle { data: &data, limit }).unwrap();
        assert_eq!(whole, trickled);
        assert_eq!(whole, Checksum::from_bytes(&data));
    }

    #[test]
    fn test_different_algorithms_never_equal() {
        assert_ne!(Checksum::new("sha256", "abcd"), Checksum::new("sha512", "abcd"));
    }

    #[rstest]
    #[case("sha256", "sha-256=abcd")]
    #[case("sha512", "sha-512=abcd")]
    #[case("id-sha256", "id-sha-256=abcd")]
    #[case("md5", "md5=abcd")]
    fn test_header_value(#[case] algorithm: &str, #[case] expected: &str) {
        assert_eq!(Checksum::new(algorithm, "abcd").as_header_value(), expected);
    }

    #[test]
    fn test_storage_form() {
        let checksum: Checksum = format!("sha256:{EMPTY}").parse().unwrap();
        assert_eq!(checksum, Checksum::from_bytes(b""));
        assert_eq!(checksum.to_string(), format!("sha256:{EMPTY}"));
    }

    #[rstest]
    #[case("")]
    #[case("sha256")]
    #[case(":abcd")]
    #[case("sha256:")]
    #[case("sha256:not-hex")]
    fn test_storage_form_invalid(#[case] input: &str) {
        let err = input.parse::<Checksum>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidChecksum(_)));
    }
}
