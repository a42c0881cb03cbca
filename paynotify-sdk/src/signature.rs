//! Check string construction and checksum verification.
//!
//! Both checksum schemes authenticate the same message, the *check string*:
//! every field except `checksum`, sorted by key, rendered as `key;value;`.
//!
//! * **Symmetric**:
//!   `checksum = lower_hex(HMAC-SHA256(check_string, shared_secret))`
//!
//! * **Asymmetric**:
//!   `checksum = hex(RSA-PKCS1v15-SHA512(check_string))`, verified with the
//!   bank's public key. Hex case is not significant.

use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs1v15::{Signature as RsaSignature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use serde::{Deserialize, Serialize};
use sha2::Sha512;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::NotificationError;
use crate::notification::{CHECKSUM, Fields};

/// Checksum scheme a merchant account is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Shared-secret HMAC-SHA256.
    Hmac,
    /// RSA/SHA-512 signature checked against the bank's public key.
    Rsa,
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scheme::Hmac => write!(f, "hmac"),
            Scheme::Rsa => write!(f, "rsa"),
        }
    }
}

impl std::str::FromStr for Scheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hmac" => Ok(Scheme::Hmac),
            "rsa" => Ok(Scheme::Rsa),
            other => Err(format!("unknown checksum scheme `{other}`")),
        }
    }
}

/// Key material able to authenticate a check string against a checksum.
pub trait ChecksumVerifier {
    fn scheme(&self) -> Scheme;

    /// Returns `true` iff `checksum` authenticates `message`.
    fn verify_checksum(&self, message: &str, checksum: &str) -> bool;
}

// ---------------------------------------------------------------------------
// Check string
// ---------------------------------------------------------------------------

/// Build the canonical check string for a set of notification fields.
///
/// `checksum` is left out; the remaining entries are sorted by key in byte
/// order and each contributes `key;value;`. Values are used verbatim.
pub fn check_string(fields: &Fields) -> String {
    let mut entries: Vec<(&str, &str)> = fields
        .iter()
        .filter(|(key, _)| *key != CHECKSUM)
        .collect();
    entries.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let capacity = entries.iter().map(|(k, v)| k.len() + v.len() + 2).sum();
    let mut out = String::with_capacity(capacity);
    for (key, value) in entries {
        out.push_str(key);
        out.push(';');
        out.push_str(value);
        out.push(';');
    }
    out
}

// ---------------------------------------------------------------------------
// Symmetric scheme
// ---------------------------------------------------------------------------

/// Compute the lower-hex HMAC-SHA256 checksum of `message`.
pub fn sign_hmac(message: &str, secret: &[u8]) -> String {
    let tag = ring::hmac::sign(
        &ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        message.as_bytes(),
    );
    hex::encode(tag.as_ref())
}

/// Non-empty shared secret for the symmetric scheme.
#[derive(Debug, Clone)]
pub struct SharedSecret {
    key: ring::hmac::Key,
}

impl SharedSecret {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, NotificationError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(NotificationError::EmptySecret);
        }
        Ok(Self {
            key: ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret),
        })
    }
}

impl ChecksumVerifier for SharedSecret {
    fn scheme(&self) -> Scheme {
        Scheme::Hmac
    }

    fn verify_checksum(&self, message: &str, checksum: &str) -> bool {
        let tag = ring::hmac::sign(&self.key, message.as_bytes());
        let expected = hex::encode(tag.as_ref());
        expected.as_bytes().ct_eq(checksum.as_bytes()).into()
    }
}

// ---------------------------------------------------------------------------
// Asymmetric scheme
// ---------------------------------------------------------------------------

/// The bank's RSA public key for the asymmetric scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    key: RsaPublicKey,
}

impl PublicKey {
    /// Parse a PEM public key, either SPKI (`BEGIN PUBLIC KEY`) or PKCS#1
    /// (`BEGIN RSA PUBLIC KEY`).
    pub fn from_pem(pem: &str) -> Result<Self, NotificationError> {
        if pem.is_empty() {
            return Err(NotificationError::EmptyPublicKey);
        }
        let pem = pem.trim();
        let key = RsaPublicKey::from_public_key_pem(pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
            .map_err(|e| NotificationError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { key })
    }
}

impl ChecksumVerifier for PublicKey {
    fn scheme(&self) -> Scheme {
        Scheme::Rsa
    }

    fn verify_checksum(&self, message: &str, checksum: &str) -> bool {
        let Some(raw) = decode_checksum(checksum) else {
            debug!("checksum is not a hex encoded signature");
            return false;
        };
        let Ok(signature) = RsaSignature::try_from(raw.as_slice()) else {
            return false;
        };
        VerifyingKey::<Sha512>::new(self.key.clone())
            .verify(message.as_bytes(), &signature)
            .is_ok()
    }
}

/// Hex-decode a signature checksum, case-insensitively.
///
/// `None` for empty or non-hex input; callers treat that as "not verified".
fn decode_checksum(checksum: &str) -> Option<Vec<u8>> {
    hex::decode(checksum).ok().filter(|raw| !raw.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_vectors::*;

    #[test]
    fn test_sign_hmac_matches_published_vector() {
        assert_eq!(
            sign_hmac(CHECK_STRING_WITH_AMOUNT, SYMMETRIC_SECRET.as_bytes()),
            HMAC_WITH_AMOUNT
        );
        assert_eq!(
            sign_hmac(CHECK_STRING, SYMMETRIC_SECRET.as_bytes()),
            HMAC_WITHOUT_AMOUNT
        );
    }

    #[test]
    fn test_shared_secret_rejects_empty() {
        assert_eq!(
            SharedSecret::new("").unwrap_err(),
            NotificationError::EmptySecret
        );
        assert_eq!(
            SharedSecret::new(Vec::<u8>::new()).unwrap_err(),
            NotificationError::EmptySecret
        );
    }

    #[test]
    fn test_shared_secret_verifies_exact_lowercase_tag_only() {
        let secret = SharedSecret::new(SYMMETRIC_SECRET).unwrap();
        assert_eq!(secret.scheme(), Scheme::Hmac);
        assert!(secret.verify_checksum(CHECK_STRING_WITH_AMOUNT, HMAC_WITH_AMOUNT));
        assert!(!secret.verify_checksum(
            CHECK_STRING_WITH_AMOUNT,
            &HMAC_WITH_AMOUNT.to_uppercase()
        ));
        assert!(!secret.verify_checksum(CHECK_STRING_WITH_AMOUNT, ""));
        assert!(!secret.verify_checksum(CHECK_STRING_WITH_AMOUNT, &HMAC_WITH_AMOUNT[1..]));
        assert!(!secret.verify_checksum(CHECK_STRING, HMAC_WITH_AMOUNT));
    }

    #[test]
    fn test_shared_secret_detects_single_character_mutation() {
        let secret = SharedSecret::new(SYMMETRIC_SECRET).unwrap();
        for i in 0..HMAC_WITH_AMOUNT.len() {
            let mut mutated = HMAC_WITH_AMOUNT.as_bytes().to_vec();
            mutated[i] = if mutated[i] == b'0' { b'1' } else { b'0' };
            let mutated = String::from_utf8(mutated).unwrap();
            assert!(!secret.verify_checksum(CHECK_STRING_WITH_AMOUNT, &mutated));
        }
    }

    #[test]
    fn test_public_key_accepts_spki_and_pkcs1_pem() {
        let spki = PublicKey::from_pem(ASYMMETRIC_PUBLIC_KEY).unwrap();
        let pkcs1 = PublicKey::from_pem(ASYMMETRIC_PUBLIC_KEY_PKCS1).unwrap();
        assert_eq!(spki, pkcs1);
        assert_eq!(spki.scheme(), Scheme::Rsa);
    }

    #[test]
    fn test_public_key_rejects_garbage() {
        assert_eq!(
            PublicKey::from_pem("").unwrap_err(),
            NotificationError::EmptyPublicKey
        );
        assert!(matches!(
            PublicKey::from_pem("-----BEGIN PUBLIC KEY-----\nnope\n-----END PUBLIC KEY-----"),
            Err(NotificationError::InvalidPublicKey(_))
        ));
    }

    #[test]
    fn test_public_key_verifies_published_signature() {
        let key = PublicKey::from_pem(ASYMMETRIC_PUBLIC_KEY).unwrap();
        assert!(key.verify_checksum(RSA_CHECK_STRING, RSA_SIGNATURE));
        assert!(key.verify_checksum(RSA_CHECK_STRING, &RSA_SIGNATURE.to_lowercase()));
        assert!(!key.verify_checksum(RSA_CHECK_STRING_TAMPERED, RSA_SIGNATURE));
    }

    #[test]
    fn test_public_key_malformed_checksum_is_not_verified() {
        let key = PublicKey::from_pem(ASYMMETRIC_PUBLIC_KEY).unwrap();
        for checksum in ["", "zz", "abc", "9524FD76", &RSA_SIGNATURE[2..]] {
            assert!(!key.verify_checksum(RSA_CHECK_STRING, checksum));
        }
    }

    #[test]
    fn test_scheme_wire_names() {
        assert_eq!("hmac".parse::<Scheme>().unwrap(), Scheme::Hmac);
        assert_eq!("rsa".parse::<Scheme>().unwrap(), Scheme::Rsa);
        assert!("RSA".parse::<Scheme>().is_err());
        assert_eq!(serde_json::to_string(&Scheme::Rsa).unwrap(), "\"rsa\"");
    }
}
