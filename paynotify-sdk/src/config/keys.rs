//! Merchant key material.

use crate::error::NotificationError;
use crate::notification::Notification;
use crate::signature::{ChecksumVerifier, PublicKey, Scheme, SharedSecret};

/// Key material a merchant account verifies callbacks with.
///
/// A bank account is set up for one scheme, but both keys may be present
/// while migrating from one to the other.
#[derive(Debug, Clone, Default)]
pub struct VerificationKeys {
    /// Shared secret for HMAC checksums.
    pub secret: Option<SharedSecret>,
    /// Bank public key for signature checksums.
    pub public_key: Option<PublicKey>,
}

impl VerificationKeys {
    /// Create a new VerificationKeys.
    pub fn new(secret: Option<SharedSecret>, public_key: Option<PublicKey>) -> Self {
        Self { secret, public_key }
    }

    /// Build from raw secret text and PEM text.
    pub fn from_raw(
        secret: Option<&str>,
        public_key_pem: Option<&str>,
    ) -> Result<Self, NotificationError> {
        Ok(Self {
            secret: secret.map(SharedSecret::new).transpose()?,
            public_key: public_key_pem.map(PublicKey::from_pem).transpose()?,
        })
    }

    /// Key material for `scheme`, if configured.
    pub fn verifier(&self, scheme: Scheme) -> Option<&dyn ChecksumVerifier> {
        match scheme {
            Scheme::Hmac => self
                .secret
                .as_ref()
                .map(|secret| secret as &dyn ChecksumVerifier),
            Scheme::Rsa => self
                .public_key
                .as_ref()
                .map(|key| key as &dyn ChecksumVerifier),
        }
    }

    /// Schemes that have key material configured.
    pub fn schemes(&self) -> Vec<Scheme> {
        [Scheme::Hmac, Scheme::Rsa]
            .into_iter()
            .filter(|scheme| self.verifier(*scheme).is_some())
            .collect()
    }

    /// Verify `notification` under `scheme`.
    ///
    /// `None` when no key material is configured for `scheme`.
    pub fn verify(&self, notification: &Notification, scheme: Scheme) -> Option<bool> {
        self.verifier(scheme)
            .map(|verifier| notification.verify_with(verifier))
    }
}
