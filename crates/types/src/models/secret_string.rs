//! Secret handling for partner credentials and signing keys

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

const REDACTED: &str = "[REDACTED]";

/// Partner API key, API secret or signing-key PEM
///
/// The value is wiped on drop and never shows up in `Debug`, `Display` or
/// serialized output. Equality runs in time independent of where the values
/// first differ.
///
/// ```rust
/// use gateway_types::SecretString;
///
/// let key = SecretString::from("qx-live-4f2a");
/// assert_eq!(key.expose_secret(), "qx-live-4f2a");
/// assert_eq!(format!("{} {:?}", key, key), "[REDACTED] SecretString([REDACTED])");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretString {
	value: String,
}

impl SecretString {
	pub fn new(value: impl Into<String>) -> Self {
		Self {
			value: value.into(),
		}
	}

	/// The raw value, for building auth headers and parsing keys
	pub fn expose_secret(&self) -> &str {
		&self.value
	}

	/// True when the value is empty or whitespace only
	pub fn is_blank(&self) -> bool {
		self.value.trim().is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString({})", REDACTED)
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

impl Serialize for SecretString {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		String::deserialize(deserializer).map(Self::new)
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		let (a, b) = (self.value.as_bytes(), other.value.as_bytes());
		a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
	}
}

impl Eq for SecretString {}
