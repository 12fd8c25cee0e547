//! Hotel credential access for the card encoder.
//!
//! Every credential-bound encoder command needs the hotel's opaque credential
//! payload, which the cloud hotel-management API hands out for a limited time.
//!
//! - [`CloudClient`] calls the two read-only endpoints (`hotel/getInfo` and
//!   `hotel/getServerDateTime`).
//! - [`CredentialCache`] keeps the latest payload for its validity window
//!   (10 minutes by default) and coalesces concurrent refreshes into a single
//!   fetch.
//!
//! The cache is generic over [`CredentialSource`] so sessions can be tested
//! without a network.

pub mod cache;
pub mod client;
pub mod error;

pub use cache::{CredentialCache, CredentialSource};
pub use client::{CloudClient, CredentialInfo};
pub use error::{CloudError, Result};
