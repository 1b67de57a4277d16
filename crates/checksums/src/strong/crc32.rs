use super::StrongDigest;

/// Streaming CRC-32 hasher used by the legacy `XCRC` command.
#[derive(Clone, Debug)]
pub struct Crc32 {
    inner: crc32fast::Hasher,
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc32 {
    /// Creates a hasher with an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: crc32fast::Hasher::new(),
        }
    }

    /// Feeds additional bytes into the digest state.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Finalises the digest and returns the big-endian CRC-32 output.
    #[must_use]
    pub fn finalize(self) -> [u8; 4] {
        self.inner.finalize().to_be_bytes()
    }

    /// Convenience helper that computes the CRC-32 digest for `data` in one shot.
    #[must_use]
    pub fn digest(data: &[u8]) -> [u8; 4] {
        <Self as StrongDigest>::digest(data)
    }
}

impl StrongDigest for Crc32 {
    type Digest = [u8; 4];
    const DIGEST_LEN: usize = 4;

    fn new() -> Self {
        Crc32::new()
    }

    fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    fn finalize(self) -> Self::Digest {
        self.inner.finalize().to_be_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc32_matches_known_vector() {
        assert_eq!(Crc32::digest(b"123456789"), 0xCBF4_3926u32.to_be_bytes());
    }

    #[test]
    fn crc32_streaming_matches_one_shot() {
        let input = b"the quick brown fox jumps over the lazy dog";
        let mut hasher = Crc32::new();
        let mid = input.len() / 2;
        hasher.update(&input[..mid]);
        hasher.update(&input[mid..]);
        assert_eq!(hasher.finalize(), Crc32::digest(input));
    }

    #[test]
    fn empty_input_is_zero() {
        assert_eq!(Crc32::digest(b""), [0, 0, 0, 0]);
    }
}
