//! Verification configuration types.
//!
//! These types hold validated key material ready for use. Reading it from
//! files or the environment is left to the binary embedding the SDK.

mod keys;

pub use keys::VerificationKeys;
