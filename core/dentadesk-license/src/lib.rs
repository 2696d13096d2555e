//! Offline licensing for DentaDesk.
//!
//! This module handles:
//! - Hardware fingerprinting for device binding
//! - Deterministic license key derivation (operator side)
//! - Offline license validation (product side)
//! - A local activation cache so the product remembers an accepted key
//!
//! # Design Principles
//!
//! - **Offline only**: no activation server, no phoning home
//! - **Device binding**: a key is valid for exactly one device id and one entitlement
//! - **Re-derive, never decode**: keys carry no readable fields; validation
//!   recomputes the expected key and compares in constant time
//! - **Stateless**: every check fingerprints the machine afresh
//!
//! # License Key Format
//!
//! Keys are formatted as `XXXXX-XXXXX-XXXXX-XXXXX`, a truncated
//! HMAC-SHA-256 over `device_id | TIER|REGION|EXPIRY`.

mod activation;
mod device;
mod entitlement;
mod error;
mod key;
mod secret;
mod validator;

pub use activation::{activate, ActivationRecord, ActivationStore};
pub use device::{
    normalize_mac, normalize_uuid, Collector, DeviceFingerprint, DeviceId, FingerprintSource,
    HardwareProbe, SourceStrength, SystemProbe, DEVICE_ID_LEN, DEVICE_SALT,
};
pub use entitlement::{Entitlement, Region, Tier, PERPETUAL};
pub use error::{LicenseError, LicenseResult};
pub use key::{derive_key, derive_key_with_secret, LicenseKey, GROUP_LEN, KEY_ALPHABET, KEY_GROUPS};
pub use secret::SharedSecret;
pub use validator::{LicenseStatus, Validator};
