//! At-rest obfuscation codec
//!
//! Each byte of the serialized document is XORed with the key, cycling
//! through the key bytes, and the result is written as standard base64 text.
//! Decoding reverses the two steps; XOR is its own inverse.
//!
//! **This is obfuscation, not encryption.** The key is short and
//! human-chosen, there is no nonce, no authentication tag and no key
//! derivation. Anyone holding the encoded file can recover the key from known
//! JSON structure in seconds, and can flip bytes undetected. It only keeps the
//! file from being read at a glance. Use real authenticated encryption when
//! the document holds anything sensitive.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{DocError, DocResult};

/// Shared secret for the obfuscation codec. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct ObfuscationKey(Vec<u8>);

impl ObfuscationKey {
    /// Build a key from raw bytes. Fails on an empty key.
    pub fn new(key: impl Into<Vec<u8>>) -> DocResult<Self> {
        let key = key.into();
        if key.is_empty() {
            return Err(DocError::Config {
                reason: "obfuscation key must not be empty".into(),
            });
        }
        Ok(Self(key))
    }

    /// Read the key from environment variable `var`.
    ///
    /// There is no fallback: an unset or empty variable is an error.
    pub fn from_env(var: &str) -> DocResult<Self> {
        match std::env::var(var) {
            Ok(value) if !value.is_empty() => Self::new(value),
            Ok(_) => Err(DocError::Config {
                reason: format!("environment variable {} is empty", var),
            }),
            Err(e) => Err(DocError::Config {
                reason: format!("environment variable {} is not usable: {}", var, e),
            }),
        }
    }

    /// Key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ObfuscationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObfuscationKey(<{} bytes redacted>)", self.0.len())
    }
}

/// XOR `data` in place with the repeating key stream.
fn xor_stream(data: &mut [u8], key: &ObfuscationKey) {
    let key = key.as_bytes();
    for (i, byte) in data.iter_mut().enumerate() {
        *byte ^= key[i % key.len()];
    }
}

/// Obfuscate `plain` into base64 text.
pub fn encode(plain: &[u8], key: &ObfuscationKey) -> String {
    let mut buf = plain.to_vec();
    xor_stream(&mut buf, key);
    STANDARD.encode(buf)
}

/// Reverse [`encode`]. Surrounding whitespace (e.g. a trailing newline added
/// by an editor) is ignored.
pub fn decode(text: &[u8], key: &ObfuscationKey) -> DocResult<Vec<u8>> {
    let trimmed = text.trim_ascii();
    let mut buf = STANDARD.decode(trimmed).map_err(|e| DocError::Codec {
        path: None,
        message: format!("invalid base64: {}", e),
    })?;
    xor_stream(&mut buf, key);
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(k: &str) -> ObfuscationKey {
        ObfuscationKey::new(k).unwrap()
    }

    #[test]
    fn test_roundtrip_document() {
        let k = key("mySecretKey");
        let doc = br#"{"users":{"1":{"firstName":"John","lastName":"Doe"}}}"#;

        let encoded = encode(doc, &k);
        assert_ne!(encoded.as_bytes(), &doc[..]);
        assert!(!encoded.contains("John"));

        let decoded = decode(encoded.as_bytes(), &k).unwrap();
        assert_eq!(decoded, doc.to_vec());
    }

    #[test]
    fn test_known_vector() {
        // 'A' ^ 'k' = 0x2a, 'B' ^ 'k' = 0x29 -> base64 "Kik="
        let k = key("k");
        assert_eq!(encode(b"AB", &k), "Kik=");
        assert_eq!(decode(b"Kik=\n", &k).unwrap(), b"AB".to_vec());
    }

    #[test]
    fn test_wrong_key_does_not_roundtrip() {
        let encoded = encode(b"{\"a\":1}", &key("right"));
        let decoded = decode(encoded.as_bytes(), &key("wrong")).unwrap();
        assert_ne!(decoded, b"{\"a\":1}".to_vec());
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let err = decode(b"not base64 !!", &key("k")).unwrap_err();
        assert!(matches!(err, DocError::Codec { .. }));
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(ObfuscationKey::new("").is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", key("hunter2"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("7 bytes"));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("LITEDOC_CODEC_TEST_KEY", "envkey");
        assert_eq!(ObfuscationKey::from_env("LITEDOC_CODEC_TEST_KEY").unwrap(), key("envkey"));
        assert!(ObfuscationKey::from_env("LITEDOC_CODEC_TEST_UNSET_VAR").is_err());
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            text in ".*",
            k in proptest::collection::vec(any::<u8>(), 1..32),
        ) {
            let k = ObfuscationKey::new(k).unwrap();
            let encoded = encode(text.as_bytes(), &k);
            if !text.is_empty() {
                prop_assert_ne!(encoded.as_bytes(), text.as_bytes());
            }
            prop_assert_eq!(decode(encoded.as_bytes(), &k).unwrap(), text.as_bytes().to_vec());
        }
    }
}
