//! Error types for the licensing module.

use chrono::NaiveDate;
use thiserror::Error;

/// Licensing-specific errors.
///
/// Messages never carry secret material or raw machine identifiers.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// No hardware identifier source could be read on this machine.
    #[error("device fingerprint unavailable: no hardware identifier could be read")]
    FingerprintUnavailable,

    /// Device identifier is not 32 lowercase hex characters.
    #[error("invalid device id: {0}")]
    InvalidDeviceId(String),

    /// Tier or region does not name a known value.
    #[error("invalid entitlement: {0}")]
    InvalidEntitlement(String),

    /// Key text does not have the `XXXXX-XXXXX-XXXXX-XXXXX` shape.
    #[error("invalid license key format: {0}")]
    InvalidKeyFormat(String),

    /// Key does not match this device and entitlement.
    #[error("license key is not valid for this device")]
    InvalidKey,

    /// Key matched but the entitlement window has lapsed.
    #[error("license expired on {0}")]
    Expired(NaiveDate),

    /// No activation record has been stored.
    #[error("license not activated")]
    NotActivated,

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
