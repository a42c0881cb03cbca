//! Error type shared by decoding and verification.

/// Errors produced while decoding or authenticating a notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    /// Payload is not a JSON object (or a decodable query string) of scalars.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// A required field is missing, empty, or has an unexpected value.
    #[error("incorrect structure: field `{field}`")]
    InvalidStructure { field: &'static str },

    /// `operation` is not one of the known lifecycle operations.
    #[error("unknown operation: {0:?}")]
    UnknownOperation(String),

    /// Generic field lookup hit a missing or falsy value.
    #[error("field does not exist: {0}")]
    FieldNotFound(String),

    #[error("empty shared secret")]
    EmptySecret,

    #[error("empty public key")]
    EmptyPublicKey,

    /// Public key material could not be parsed as an RSA PEM key.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedPayload(err.to_string())
    }
}
