#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

//! Parsing and authenticity verification for the callback notifications an
//! acquiring bank sends after each payment lifecycle event.
//!
//! ```ignore
//! use paynotify_sdk::Notification;
//!
//! let notification = Notification::parse(&body, true)?;
//! if notification.verify_hmac(merchant_secret)? && notification.is_deposited() {
//!     // mark the order as paid
//! }
//! ```

pub mod config;
pub mod error;
pub mod notification;
pub mod operation;
pub mod signature;

#[cfg(test)]
mod test_vectors;

pub use config::VerificationKeys;
pub use error::NotificationError;
pub use notification::{Fields, Notification};
pub use operation::Operation;
pub use signature::{ChecksumVerifier, PublicKey, Scheme, SharedSecret};
