//! Credential handles for the Drive API.

#[cfg(feature = "oauth")]
mod google;
mod token;

pub use token::{DRIVE_SCOPE, TokenSource};
