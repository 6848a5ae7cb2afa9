//! Secret types for protecting API tokens from accidental logging.
//!
//! Re-exports the [`secrecy`] types used for the telemetry auth token. Any
//! struct deriving `Debug` around a [`SecretString`] prints it redacted, so a
//! `Config` can be logged with `{:?}` without leaking credentials.
//!
//! ```rust
//! use secrecy::ExposeSecret;
//! use telemetry_common::secret::SecretString;
//!
//! let token = SecretString::from("gAAAAABk-token");
//! assert!(!format!("{token:?}").contains("gAAAAABk"));
//! assert_eq!(token.expose_secret(), "gAAAAABk-token");
//! ```

pub use secrecy::{ExposeSecret, SecretString};
