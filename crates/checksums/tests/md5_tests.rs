//! Comprehensive MD5 checksum tests.
//!
//! This test module validates the MD5 implementation against:
//! 1. RFC 1321 official test vectors
//! 2. Edge cases (empty input, single byte)
//! 3. Various sizes up to 1MB
//! 4. Streaming API incremental computation
//! 5. Comparison with system md5sum command

use checksums::strong::{Md5, StrongDigest};
use std::io::Write;
use std::process::{Command, Stdio};

/// Convert a byte slice to a lowercase hex string.
fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut out, "{byte:02x}").expect("write! to String cannot fail");
    }
    out
}

// ============================================================================
// RFC 1321 Official Test Vectors
// ============================================================================

/// RFC 1321 Section A.5 defines the official MD5 test suite.
/// These vectors are authoritative for validating MD5 implementations.
mod rfc1321_test_vectors {
    use super::*;

    #[test]
    fn rfc1321_empty_string() {
        let digest = Md5::digest(b"");
        assert_eq!(to_hex(&digest), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn rfc1321_single_char_a() {
        let digest = Md5::digest(b"a");
        assert_eq!(to_hex(&digest), "0cc175b9c0f1b6a831c399e269772661");
    }

    #[test]
    fn rfc1321_abc() {
        let digest = Md5::digest(b"abc");
        assert_eq!(to_hex(&digest), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn rfc1321_message_digest() {
        let digest = Md5::digest(b"message digest");
        assert_eq!(to_hex(&digest), "f96b697d7cb7938d525a2f31aaf161d0");
    }

    #[test]
    fn rfc1321_lowercase_alphabet() {
        let digest = Md5::digest(b"abcdefghijklmnopqrstuvwxyz");
        assert_eq!(to_hex(&digest), "c3fcd3d76192e4007dfb496cca67e13b");
    }

    #[test]
    fn rfc1321_alphanumeric_mixed_case() {
        let digest = Md5::digest(b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789");
        assert_eq!(to_hex(&digest), "d174ab98d277d9f5a5611c2c9f419d9f");
    }

    #[test]
    fn rfc1321_numeric_sequence() {
        let digest = Md5::digest(
            b"12345678901234567890123456789012345678901234567890123456789012345678901234567890",
        );
        assert_eq!(to_hex(&digest), "57edf4a22be3c955ac49da2e2107b67a");
    }

    /// 55 bytes: one byte short of requiring an extra 64-byte block.
    #[test]
    fn rfc1321_55_bytes_padding_boundary() {
        let input = b"0123456789012345678901234567890123456789012345678901234";
        assert_eq!(input.len(), 55);
        let digest = Md5::digest(input);
        assert_eq!(to_hex(&digest), "6e7a4fc92eb1c3f6e652425bcc8d44b5");
    }

    #[test]
    fn rfc1321_56_bytes_padding_boundary() {
        let input = b"01234567890123456789012345678901234567890123456789012345";
        assert_eq!(input.len(), 56);
        let digest = Md5::digest(input);
        assert_eq!(to_hex(&digest), "8af270b2847610e742b0791b53648c09");
    }

    #[test]
    fn rfc1321_64_bytes_exactly_one_block() {
        let input = b"0123456789012345678901234567890123456789012345678901234567890123";
        assert_eq!(input.len(), 64);
        let digest = Md5::digest(input);
        assert_eq!(to_hex(&digest), "7f7bfd348709deeaace19e3f535f8c54");
    }

    #[test]
    fn rfc1321_119_bytes_two_block_padding_boundary() {
        let input: Vec<u8> = (0..119).map(|i| b'0' + (i % 10) as u8).collect();
        assert_eq!(input.len(), 119);
        let digest = Md5::digest(&input);
        let mut hasher = Md5::new();
        hasher.update(&input);
        assert_eq!(hasher.finalize(), digest);
    }

    #[test]
    fn rfc1321_120_bytes_two_block_padding_boundary() {
        let input: Vec<u8> = (0..120).map(|i| b'0' + (i % 10) as u8).collect();
        assert_eq!(input.len(), 120);
        let digest = Md5::digest(&input);
        let mut hasher = Md5::new();
        hasher.update(&input);
        assert_eq!(hasher.finalize(), digest);
    }
}

// ============================================================================
// Empty Input Tests
// ============================================================================

mod empty_input {
    use super::*;

    #[test]
    fn empty_slice_produces_known_digest() {
        let digest = Md5::digest(b"");
        assert_eq!(to_hex(&digest), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(digest.len(), 16);
    }

    #[test]
    fn empty_streaming_produces_same_digest() {
        let hasher = Md5::new();
        let digest = hasher.finalize();
        assert_eq!(to_hex(&digest), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn empty_streaming_with_empty_updates() {
        let mut hasher = Md5::new();
        hasher.update(&[]);
        hasher.update(&[]);
        hasher.update(&[]);
        let digest = hasher.finalize();
        assert_eq!(to_hex(&digest), "d41d8cd98f00b204e9800998ecf8427e");
    }
}

// ============================================================================
// Single Byte Tests
// ============================================================================

mod single_byte {
    use super::*;

    #[test]
    fn single_byte_zero() {
        let digest = Md5::digest(&[0x00]);
        assert_eq!(to_hex(&digest), "93b885adfe0da089cdf634904fd59f71");
    }

    #[test]
    fn single_byte_one() {
        let digest = Md5::digest(&[0x01]);
        assert_eq!(to_hex(&digest), "55a54008ad1ba589aa210d2629c1df41");
    }

    #[test]
    fn single_byte_max() {
        let digest = Md5::digest(&[0xFF]);
        assert_eq!(to_hex(&digest), "00594fd4f42ba43fc1ca0427a0576295");
    }

    #[test]
    fn single_byte_streaming() {
        let mut hasher = Md5::new();
        hasher.update(&[0x42]);
        let streaming = hasher.finalize();

        let oneshot = Md5::digest(&[0x42]);
        assert_eq!(streaming, oneshot);
    }

    #[test]
    fn all_256_single_bytes_unique() {
        let mut digests = std::collections::HashSet::new();
        for byte in 0u8..=255 {
            let digest = Md5::digest(&[byte]);
            assert!(
                digests.insert(digest),
                "Collision detected for single byte {byte}"
            );
        }
        assert_eq!(digests.len(), 256);
    }
}

// ============================================================================
// Various Sizes Tests (up to 1MB)
// ============================================================================

mod various_sizes {
    use super::*;

    fn generate_data(size: usize) -> Vec<u8> {
        (0..size).map(|i| (i % 256) as u8).collect()
    }

    #[test]
    fn size_1mb() {
        let data = generate_data(1024 * 1024);
        let digest = Md5::digest(&data);
        assert_eq!(digest.len(), 16);

        let mut hasher = Md5::new();
        hasher.update(&data);
        assert_eq!(hasher.finalize(), digest);
    }

    #[test]
    fn size_1mb_chunked() {
        let data = generate_data(1024 * 1024);
        let mut hasher = Md5::new();
        for chunk in data.chunks(4096) {
            hasher.update(chunk);
        }
        let chunked = hasher.finalize();

        let oneshot = Md5::digest(&data);
        assert_eq!(chunked, oneshot);
    }

    #[test]
    fn sizes_near_block_boundaries() {
        for offset in [-3_i32, -2, -1, 0, 1, 2, 3] {
            for multiplier in [1, 2, 4, 8, 16] {
                let base_size = 64 * multiplier;
                let size = (base_size + offset).max(0) as usize;
                let data = generate_data(size);

                let oneshot = Md5::digest(&data);
                let mut hasher = Md5::new();
                hasher.update(&data);
                let streaming = hasher.finalize();

                assert_eq!(
                    oneshot, streaming,
                    "Mismatch at size {size} (base={base_size}, offset={offset})"
                );
            }
        }
    }
}

// ============================================================================
// Streaming API Incremental Computation Tests
// ============================================================================

mod streaming_api {
    use super::*;

    #[test]
    fn streaming_byte_by_byte() {
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut hasher = Md5::new();
        for &byte in data.iter() {
            hasher.update(&[byte]);
        }
        let streaming = hasher.finalize();

        let oneshot = Md5::digest(data);
        assert_eq!(streaming, oneshot);
    }

    #[test]
    fn streaming_random_chunk_sizes() {
        let data: Vec<u8> = (0..1000).map(|i| (i * 17 % 256) as u8).collect();

        let chunk_sizes = [1, 3, 7, 13, 31, 63, 127, 255];
        let mut hasher = Md5::new();
        let mut offset = 0;
        let mut chunk_idx = 0;

        while offset < data.len() {
            let chunk_size = chunk_sizes[chunk_idx % chunk_sizes.len()];
            let end = (offset + chunk_size).min(data.len());
            hasher.update(&data[offset..end]);
            offset = end;
            chunk_idx += 1;
        }

        let streaming = hasher.finalize();
        let oneshot = Md5::digest(&data);
        assert_eq!(streaming, oneshot);
    }

    #[test]
    fn streaming_clone_mid_computation() {
        let data = b"hello world";
        let mut hasher = Md5::new();
        hasher.update(b"hello");

        let cloned = hasher.clone();

        hasher.update(b" world");
        let full = hasher.finalize();

        let mut cloned_hasher = cloned;
        cloned_hasher.update(b" world");
        let cloned_full = cloned_hasher.finalize();

        assert_eq!(full, cloned_full);
        assert_eq!(full, Md5::digest(data));
    }

    #[test]
    fn trait_new_matches_inherent_new() {
        let mut trait_hasher: Md5 = StrongDigest::new();
        trait_hasher.update(b"trait test");
        let trait_result = trait_hasher.finalize();

        let mut inherent_hasher = Md5::new();
        inherent_hasher.update(b"trait test");
        let inherent_result = inherent_hasher.finalize();

        assert_eq!(trait_result, inherent_result);
    }

    #[test]
    fn trait_digest_matches_inherent_digest() {
        let trait_result = <Md5 as StrongDigest>::digest(b"quick test");
        let inherent_result = Md5::digest(b"quick test");
        assert_eq!(trait_result, inherent_result);
    }
}

// ============================================================================
// System md5sum Comparison Tests
// ============================================================================

mod system_md5sum_comparison {
    use super::*;

    /// Run system md5sum on the given data and return the hex digest.
    fn system_md5sum(data: &[u8]) -> Option<String> {
        let mut child = Command::new("md5sum")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .ok()?;

        {
            let stdin = child.stdin.as_mut()?;
            stdin.write_all(data).ok()?;
        }

        let output = child.wait_with_output().ok()?;
        if !output.status.success() {
            return None;
        }

        let stdout = String::from_utf8(output.stdout).ok()?;
        stdout.split_whitespace().next().map(|s| s.to_lowercase())
    }

    #[test]
    fn compare_rfc_vectors_with_system() {
        let test_cases: &[&[u8]] = &[
            b"",
            b"a",
            b"abc",
            b"message digest",
            b"abcdefghijklmnopqrstuvwxyz",
        ];

        for data in test_cases {
            if let Some(system_hash) = system_md5sum(data) {
                let our_hash = to_hex(&Md5::digest(data));
                assert_eq!(
                    our_hash,
                    system_hash,
                    "RFC vector {:?} hash mismatch with system md5sum",
                    String::from_utf8_lossy(data)
                );
            }
        }
    }

    #[test]
    fn compare_binary_data_with_system() {
        let data: Vec<u8> = (0..=255).collect();
        if let Some(system_hash) = system_md5sum(&data) {
            let our_hash = to_hex(&Md5::digest(&data));
            assert_eq!(
                our_hash, system_hash,
                "Binary data (0-255) hash mismatch with system md5sum"
            );
        }
    }
}

// ============================================================================
// Additional Edge Case Tests
// ============================================================================

mod edge_cases {
    use super::*;

    #[test]
    fn digest_len_constant() {
        assert_eq!(Md5::DIGEST_LEN, 16);
    }

    #[test]
    fn digest_output_is_16_bytes() {
        let digest = Md5::digest(b"test");
        assert_eq!(digest.len(), 16);
        assert_eq!(digest.as_ref().len(), 16);
    }

    #[test]
    fn deterministic_output() {
        let data = b"determinism test";
        let d1 = Md5::digest(data);
        let d2 = Md5::digest(data);
        let d3 = Md5::digest(data);
        assert_eq!(d1, d2);
        assert_eq!(d2, d3);
    }

    #[test]
    fn different_inputs_different_outputs() {
        let d1 = Md5::digest(b"input1");
        let d2 = Md5::digest(b"input2");
        assert_ne!(d1, d2);
    }

    #[test]
    fn similar_inputs_different_outputs() {
        let d1 = Md5::digest(b"test");
        let d2 = Md5::digest(b"Test");
        let d3 = Md5::digest(b"test ");
        let d4 = Md5::digest(b" test");

        assert_ne!(d1, d2);
        assert_ne!(d1, d3);
        assert_ne!(d1, d4);
        assert_ne!(d2, d3);
        assert_ne!(d2, d4);
        assert_ne!(d3, d4);
    }

    #[test]
    fn debug_format_contains_md5() {
        let hasher = Md5::new();
        let debug = format!("{hasher:?}");
        assert!(debug.contains("Md5"));
    }

    #[test]
    fn default_equals_new() {
        let mut default_hasher = Md5::default();
        let mut new_hasher = Md5::new();

        default_hasher.update(b"test");
        new_hasher.update(b"test");

        assert_eq!(default_hasher.finalize(), new_hasher.finalize());
    }

    #[test]
    fn all_zero_input_various_sizes() {
        for size in [0, 1, 16, 64, 128, 1024] {
            let data = vec![0u8; size];
            let digest = Md5::digest(&data);
            assert_eq!(digest.len(), 16);
        }
    }

    #[test]
    fn all_ones_input_various_sizes() {
        for size in [0, 1, 16, 64, 128, 1024] {
            let data = vec![0xFFu8; size];
            let digest = Md5::digest(&data);
            assert_eq!(digest.len(), 16);
        }
    }
}
