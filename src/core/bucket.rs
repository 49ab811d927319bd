//! Deterministic percentage bucketing.

use md5::{Digest, Md5};

/// Number of buckets identifiers are spread over.
pub const BUCKET_COUNT: u32 = 100;

/// Map `identifier` to a stable bucket in `[0, 99]` for the given `salt`.
///
/// The bucket is the first four bytes of `MD5(salt + "." + identifier)`, read
/// as a big-endian `u32`, modulo 100. Any implementation using the same
/// recipe buckets identically.
///
/// # Examples
///
/// ```rust
/// use feature_release::core::bucket;
///
/// // MD5("f..x") starts with 0x9abe474f = 2596161359
/// assert_eq!(bucket("f.", "x"), 59);
/// ```
pub fn bucket(salt: &str, identifier: &str) -> u8 {
    let mut hash = Md5::new();
    hash.update(salt.as_bytes());
    hash.update(b".");
    hash.update(identifier.as_bytes());
    let digest = hash.finalize();

    let prefix = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (prefix % BUCKET_COUNT) as u8
}

/// Salt for a flag evaluated in an optional namespace: `flag + "." + namespace`.
///
/// A missing namespace contributes an empty string, so the same identifier
/// lands in unrelated buckets for different flags and namespaces.
pub fn salt(flag: &str, namespace: Option<&str>) -> String {
    format!("{}.{}", flag, namespace.unwrap_or(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_reference_values() {
        // First four digest bytes precomputed with an independent MD5 tool.
        assert_eq!(bucket("f.", "x"), 59); // 0x9abe474f
        assert_eq!(bucket("f.", "user-0"), 16); // 0x06fd4594
        assert_eq!(bucket("f.", "bob"), 7); // 0x911c5ed7
        assert_eq!(bucket("f.", "42"), 82); // 0x2c445a5a
        assert_eq!(bucket("flag.staging", "user-1"), 48); // 0xd9d0e2e8
        assert_eq!(bucket("flag.production", "user-1"), 60); // 0x9fca7ad4
    }

    #[test]
    fn test_salt() {
        assert_eq!(salt("f", None), "f.");
        assert_eq!(salt("f", Some("")), "f.");
        assert_eq!(salt("f", Some("eu")), "f.eu");
    }

    proptest! {
        #[test]
        fn bucket_is_in_range(salt in ".*", id in ".*") {
            prop_assert!(bucket(&salt, &id) < 100);
        }

        #[test]
        fn bucket_is_deterministic(salt in "[a-z]{1,8}\\.[a-z]{0,8}", id in "[a-zA-Z0-9]{1,16}") {
            prop_assert_eq!(bucket(&salt, &id), bucket(&salt, &id));
        }
    }
}
