//! The shared secret keying license derivation.

use std::borrow::Cow;
use std::fmt;

/// Default secret embedded in both the key generator and the product.
const EMBEDDED_SECRET: &str = "dentadesk-license-hmac-secret-2025";

/// Key material for the license HMAC. Rotating it invalidates every key
/// issued under the previous value.
///
/// Builds may replace the default by setting `DENTADESK_LICENSE_SECRET`
/// at compile time.
#[derive(Clone, PartialEq, Eq)]
pub struct SharedSecret(Cow<'static, [u8]>);

impl SharedSecret {
    /// Returns the secret compiled into this build.
    #[must_use]
    pub fn embedded() -> Self {
        let secret = option_env!("DENTADESK_LICENSE_SECRET").unwrap_or(EMBEDDED_SECRET);
        Self(Cow::Borrowed(secret.as_bytes()))
    }

    /// Creates a secret from arbitrary bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Cow::Owned(bytes.into()))
    }

    /// Returns the secret bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Default for SharedSecret {
    fn default() -> Self {
        Self::embedded()
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedSecret").field(&"[REDACTED]").finish()
    }
}
