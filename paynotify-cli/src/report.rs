//! JSON verification report printed to stdout.

use paynotify_sdk::{Fields, Notification, Operation, Scheme};
use serde::Serialize;

/// Outcome of verifying one callback notification.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub md_order: &'a str,
    pub order_number: &'a str,
    pub operation: Operation,
    pub status: bool,
    /// The operation if it took effect, `null` otherwise.
    pub completed_operation: Option<Operation>,
    pub check_string: String,
    pub scheme: Scheme,
    pub verified: bool,
    pub fields: &'a Fields,
}

impl<'a> Report<'a> {
    pub fn new(notification: &'a Notification, scheme: Scheme, verified: bool) -> Self {
        Self {
            md_order: notification.md_order(),
            order_number: notification.order_number(),
            operation: notification.operation(),
            status: notification.status(),
            completed_operation: notification.completed_operation(),
            check_string: notification.check_string(),
            scheme,
            verified,
            fields: notification.fields(),
        }
    }
}
