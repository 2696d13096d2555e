//! License key derivation.
//!
//! Keys use the format `XXXXX-XXXXX-XXXXX-XXXXX` and carry no decodable
//! fields. A key is the HMAC-SHA-256 of the device id and the canonical
//! entitlement, truncated and written in a 31-symbol alphabet that leaves out
//! the easily confused `0 O 1 I L`. Validation re-derives and compares.

use crate::device::DeviceId;
use crate::entitlement::Entitlement;
use crate::error::{LicenseError, LicenseResult};
use crate::secret::SharedSecret;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use std::str::FromStr;

/// Symbols a key is written in.
pub const KEY_ALPHABET: &[u8; 31] = b"23456789ABCDEFGHJKMNPQRSTUVWXYZ";

/// Number of dash-separated groups in a key.
pub const KEY_GROUPS: usize = 4;

/// Characters per group.
pub const GROUP_LEN: usize = 5;

/// Bytes of the MAC encoded into a key. 31^20 exceeds 2^96, so twelve bytes
/// always fit in twenty symbols.
const MAC_PREFIX_LEN: usize = 12;

const KEY_SYMBOLS: usize = KEY_GROUPS * GROUP_LEN;

/// A license key in canonical (uppercase, dashed) form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LicenseKey(String);

impl LicenseKey {
    /// Parses user-supplied key text.
    ///
    /// Surrounding whitespace is trimmed and letters are uppercased before the
    /// shape is checked. Parsing says nothing about validity.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidKeyFormat`] if the text is not four
    /// dash-separated groups of five key symbols.
    pub fn parse(key: &str) -> LicenseResult<Self> {
        let key = key.trim().to_ascii_uppercase();

        let groups: Vec<&str> = key.split('-').collect();
        if groups.len() != KEY_GROUPS {
            return Err(LicenseError::InvalidKeyFormat(format!(
                "expected {KEY_GROUPS} groups separated by dashes, got {}",
                groups.len()
            )));
        }

        for group in &groups {
            if group.len() != GROUP_LEN {
                return Err(LicenseError::InvalidKeyFormat(format!(
                    "each group must have {GROUP_LEN} characters"
                )));
            }
            if !group.bytes().all(|b| KEY_ALPHABET.contains(&b)) {
                return Err(LicenseError::InvalidKeyFormat(
                    "key contains characters outside the key alphabet".to_string(),
                ));
            }
        }

        Ok(Self(key))
    }

    /// Returns the key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the key bytes, for constant-time comparison.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for LicenseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LicenseKey {
    type Err = LicenseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for LicenseKey {
    type Error = LicenseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<LicenseKey> for String {
    fn from(key: LicenseKey) -> Self {
        key.0
    }
}

/// Derives the license key for a device and entitlement using the embedded secret.
#[must_use]
pub fn derive_key(device_id: &DeviceId, entitlement: &Entitlement) -> LicenseKey {
    derive_key_with_secret(device_id, entitlement, &SharedSecret::embedded())
}

/// Derives the license key for a device and entitlement using a custom secret.
///
/// Deterministic: equal inputs always give the same key.
#[must_use]
pub fn derive_key_with_secret(
    device_id: &DeviceId,
    entitlement: &Entitlement,
    secret: &SharedSecret,
) -> LicenseKey {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(device_id.as_str().as_bytes());
    mac.update(b"|");
    mac.update(entitlement.canonical().as_bytes());
    let tag = mac.finalize().into_bytes();

    LicenseKey(encode_key(&tag[..MAC_PREFIX_LEN]))
}

/// Writes `bytes` as a big-endian base-31 number and groups it with dashes.
fn encode_key(bytes: &[u8]) -> String {
    let mut n = bytes
        .iter()
        .fold(0u128, |acc, &b| (acc << 8) | u128::from(b));

    let radix = KEY_ALPHABET.len() as u128;
    let mut symbols = [KEY_ALPHABET[0]; KEY_SYMBOLS];
    for slot in symbols.iter_mut().rev() {
        *slot = KEY_ALPHABET[(n % radix) as usize];
        n /= radix;
    }

    symbols
        .chunks(GROUP_LEN)
        .map(|group| group.iter().map(|&b| char::from(b)).collect::<String>())
        .collect::<Vec<_>>()
        .join("-")
}
