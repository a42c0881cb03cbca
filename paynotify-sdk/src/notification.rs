//! Callback notification decoding and typed access.
//!
//! The bank reports each payment lifecycle event with a flat set of
//! parameters:
//!
//! ```text
//! mdOrder=...&orderNumber=...&checksum=...&operation=deposited&status=1
//! ```
//!
//! delivered either as a JSON object or as a query string. Every parameter
//! other than `checksum` is part of the signed check string, including
//! account-specific extension parameters, so all of them are retained.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::NotificationError;
use crate::operation::Operation;
use crate::signature::{self, ChecksumVerifier, PublicKey, SharedSecret};

pub const MD_ORDER: &str = "mdOrder";
pub const ORDER_NUMBER: &str = "orderNumber";
pub const OPERATION: &str = "operation";
pub const STATUS: &str = "status";
pub const CHECKSUM: &str = "checksum";

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Notification parameters as text, in order of first appearance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    /// Convert a decoded object into field text.
    ///
    /// Strings are kept verbatim, numbers keep their JSON literal, `true`
    /// becomes `"1"`, `false` and `null` become `""`. Nested arrays and
    /// objects are rejected.
    fn from_object(map: &Map<String, Value>) -> Result<Self, NotificationError> {
        map.iter()
            .map(|(key, value)| field_text(key, value).map(|text| (key.clone(), text)))
            .collect::<Result<Vec<_>, _>>()
            .map(Fields)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn field_text(key: &str, value: &Value) -> Result<String, NotificationError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(true) => Ok("1".to_owned()),
        Value::Bool(false) | Value::Null => Ok(String::new()),
        Value::Array(_) | Value::Object(_) => Err(NotificationError::MalformedPayload(format!(
            "field `{key}` is not a scalar value"
        ))),
    }
}

/// Empty text and `"0"` count as "no value" for generic lookups.
fn is_falsy(value: &str) -> bool {
    value.is_empty() || value == "0"
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// A decoded callback notification. Immutable once constructed.
///
/// Construction always guarantees that `operation` is a known
/// [`Operation`]. With structural checking enabled it also guarantees that
/// `mdOrder`, `orderNumber` and `operation` are non-empty strings and that
/// `status` is exactly `"0"` or `"1"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Notification {
    fields: Fields,
    #[serde(skip)]
    operation: Operation,
}

impl Notification {
    /// Decode a JSON object payload.
    ///
    /// With `check_structure` set, required fields are validated first
    /// ([`NotificationError::InvalidStructure`]). The operation is always
    /// validated ([`NotificationError::UnknownOperation`]), so callers that
    /// accept partial payloads still never see an unrecognised event.
    pub fn parse(payload: &str, check_structure: bool) -> Result<Self, NotificationError> {
        let value: Value = serde_json::from_str(payload).inspect_err(|e| {
            debug!(error = %e, "callback payload is not valid JSON");
        })?;
        let Value::Object(map) = value else {
            debug!("callback payload is not a JSON object");
            return Err(NotificationError::MalformedPayload(
                "payload is not a JSON object".to_owned(),
            ));
        };
        Self::from_map(map, check_structure)
    }

    /// Decode the query string of a GET callback. A leading `?` is ignored.
    ///
    /// Repeated keys keep their first position and their last value.
    pub fn from_query(query: &str, check_structure: bool) -> Result<Self, NotificationError> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let map: Map<String, Value> = url::form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), Value::String(value.into_owned())))
            .collect();
        Self::from_map(map, check_structure)
    }

    /// Build a notification from an already decoded object.
    pub fn from_map(
        map: Map<String, Value>,
        check_structure: bool,
    ) -> Result<Self, NotificationError> {
        let result = Self::validate(&map, check_structure);
        if let Err(e) = &result {
            debug!(error = %e, "rejected callback notification");
        }
        result
    }

    fn validate(map: &Map<String, Value>, check_structure: bool) -> Result<Self, NotificationError> {
        let fields = Fields::from_object(map)?;

        if check_structure {
            check_required_fields(map)?;
        }

        let operation = match map.get(OPERATION) {
            Some(Value::String(raw)) => raw.parse::<Operation>()?,
            Some(other) => return Err(NotificationError::UnknownOperation(other.to_string())),
            None => return Err(NotificationError::UnknownOperation(String::new())),
        };

        Ok(Self { fields, operation })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Order id in the payment gateway.
    ///
    /// Empty only when structural checking was skipped and the field is
    /// absent.
    pub fn md_order(&self) -> &str {
        self.fields.get(MD_ORDER).unwrap_or_default()
    }

    /// Order id in the merchant's system.
    pub fn order_number(&self) -> &str {
        self.fields.get(ORDER_NUMBER).unwrap_or_default()
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Checksum carried by the notification, empty if absent.
    pub fn checksum(&self) -> &str {
        self.fields.get(CHECKSUM).unwrap_or_default()
    }

    /// Whether the reported operation succeeded (`status == "1"`).
    pub fn status(&self) -> bool {
        self.fields.get(STATUS) == Some("1")
    }

    /// Raw lookup of any field.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name)
    }

    /// Value of an account-specific field.
    ///
    /// Fails with [`NotificationError::FieldNotFound`] when the field is
    /// absent or holds a falsy value (`""` or `"0"`).
    pub fn value_or_error(&self, name: &str) -> Result<&str, NotificationError> {
        match self.fields.get(name) {
            Some(value) if !is_falsy(value) => Ok(value),
            _ => Err(NotificationError::FieldNotFound(name.to_owned())),
        }
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    // -----------------------------------------------------------------------
    // Lifecycle predicates
    // -----------------------------------------------------------------------

    /// Funds were successfully put on hold.
    pub fn is_approved(&self) -> bool {
        self.operation == Operation::Approved && self.status()
    }

    /// The order expired unpaid. Final regardless of `status`.
    pub fn is_declined_by_timeout(&self) -> bool {
        self.operation == Operation::DeclinedByTimeout
    }

    pub fn is_deposited(&self) -> bool {
        self.operation == Operation::Deposited && self.status()
    }

    pub fn is_reversed(&self) -> bool {
        self.operation == Operation::Reversed && self.status()
    }

    pub fn is_refunded(&self) -> bool {
        self.operation == Operation::Refunded && self.status()
    }

    /// The operation, if it actually took effect according to the
    /// predicates above.
    pub fn completed_operation(&self) -> Option<Operation> {
        let completed = match self.operation {
            Operation::Approved => self.is_approved(),
            Operation::DeclinedByTimeout => self.is_declined_by_timeout(),
            Operation::Deposited => self.is_deposited(),
            Operation::Reversed => self.is_reversed(),
            Operation::Refunded => self.is_refunded(),
        };
        completed.then_some(self.operation)
    }

    // -----------------------------------------------------------------------
    // Authenticity
    // -----------------------------------------------------------------------

    /// Canonical message both checksum schemes authenticate.
    pub fn check_string(&self) -> String {
        signature::check_string(&self.fields)
    }

    /// Check the checksum as an HMAC-SHA256 tag under `secret`.
    pub fn verify_hmac(&self, secret: &str) -> Result<bool, NotificationError> {
        let secret = SharedSecret::new(secret)?;
        Ok(self.verify_with(&secret))
    }

    /// Check the checksum as an RSA/SHA-512 signature under a PEM public key.
    ///
    /// Only an empty key is an error. An unparseable key or checksum means
    /// the notification is simply not verified.
    pub fn verify_signature(&self, public_key_pem: &str) -> Result<bool, NotificationError> {
        match PublicKey::from_pem(public_key_pem) {
            Ok(key) => Ok(self.verify_with(&key)),
            Err(NotificationError::EmptyPublicKey) => Err(NotificationError::EmptyPublicKey),
            Err(e) => {
                warn!(error = %e, "public key could not be parsed, notification not verified");
                Ok(false)
            }
        }
    }

    /// Check the checksum with pre-loaded key material.
    pub fn verify_with<V: ChecksumVerifier + ?Sized>(&self, verifier: &V) -> bool {
        let verified = verifier.verify_checksum(&self.check_string(), self.checksum());
        debug!(
            md_order = self.md_order(),
            operation = %self.operation,
            scheme = %verifier.scheme(),
            verified,
            "checked notification checksum"
        );
        verified
    }
}

fn check_required_fields(map: &Map<String, Value>) -> Result<(), NotificationError> {
    for field in [MD_ORDER, ORDER_NUMBER, OPERATION] {
        match map.get(field) {
            Some(Value::String(text)) if !text.is_empty() => {}
            _ => return Err(NotificationError::InvalidStructure { field }),
        }
    }
    match map.get(STATUS) {
        Some(Value::String(status)) if status == "0" || status == "1" => Ok(()),
        _ => Err(NotificationError::InvalidStructure { field: STATUS }),
    }
}

impl FromStr for Notification {
    type Err = NotificationError;

    /// Same as [`Notification::parse`] with structural checking.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, true)
    }
}

impl TryFrom<Map<String, Value>> for Notification {
    type Error = NotificationError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        Self::from_map(map, true)
    }
}
