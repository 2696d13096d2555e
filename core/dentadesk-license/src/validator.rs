//! Product-side license validation.
//!
//! Validation never decodes a key. It recomputes the local device id,
//! re-derives the key the entitlement should have, and compares the two in
//! constant time. Every failure mode of the comparison collapses into
//! [`LicenseError::InvalidKey`] so callers cannot learn which part was wrong.

use crate::activation::ActivationStore;
use crate::device::{Collector, DeviceId, HardwareProbe, SystemProbe};
use crate::entitlement::Entitlement;
use crate::error::{LicenseError, LicenseResult};
use crate::key::{derive_key_with_secret, LicenseKey};
use crate::secret::SharedSecret;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::debug;

/// Outcome of a license check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    /// No check has run yet.
    Unverified,
    /// Key matches this device and entitlement.
    Valid,
    /// Key does not match this device and entitlement.
    Invalid,
    /// Key matches but the entitlement has lapsed.
    Expired,
    /// The machine could not be fingerprinted, so no key was checked.
    Unavailable,
}

impl LicenseStatus {
    /// Maps a validation result onto a status.
    ///
    /// A fingerprint failure maps to [`Unavailable`](Self::Unavailable) so
    /// callers can tell an unreadable machine from a wrong key.
    #[must_use]
    pub fn from_result<T>(result: &LicenseResult<T>) -> Self {
        match result {
            Ok(_) => Self::Valid,
            Err(LicenseError::Expired(_)) => Self::Expired,
            Err(LicenseError::FingerprintUnavailable) => Self::Unavailable,
            Err(_) => Self::Invalid,
        }
    }

    /// Returns true if the product may run with this status.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Checks license keys against the machine it runs on.
#[derive(Debug, Clone, Default)]
pub struct Validator<P = SystemProbe> {
    collector: Collector<P>,
    secret: SharedSecret,
}

impl Validator<SystemProbe> {
    /// Creates a validator for this machine using the embedded secret.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collector: Collector::new(),
            secret: SharedSecret::embedded(),
        }
    }
}

impl<P: HardwareProbe> Validator<P> {
    /// Creates a validator from a custom collector and secret.
    #[must_use]
    pub fn with_parts(collector: Collector<P>, secret: SharedSecret) -> Self {
        Self { collector, secret }
    }

    /// Returns the device id of the machine being validated.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::FingerprintUnavailable`] if no source can be read.
    pub fn device_id(&self) -> LicenseResult<DeviceId> {
        self.collector.collect().map(|fp| fp.id().clone())
    }

    /// Validates `candidate` for `claimed` on this machine, as of today (UTC).
    ///
    /// # Errors
    ///
    /// - [`LicenseError::FingerprintUnavailable`] if the machine cannot be fingerprinted
    /// - [`LicenseError::InvalidKey`] if the key does not match
    /// - [`LicenseError::Expired`] if the key matches but has lapsed
    pub fn validate(&self, candidate: &str, claimed: &Entitlement) -> LicenseResult<Entitlement> {
        let fingerprint = self.collector.collect()?;
        let today = chrono::Utc::now().date_naive();
        self.validate_for_device(candidate, claimed, fingerprint.id(), today)
    }

    /// Validates `candidate` for `claimed` against a known device id and date.
    ///
    /// The expiry is only looked at once the key has matched.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::InvalidKey`] or [`LicenseError::Expired`].
    pub fn validate_for_device(
        &self,
        candidate: &str,
        claimed: &Entitlement,
        device_id: &DeviceId,
        today: NaiveDate,
    ) -> LicenseResult<Entitlement> {
        let candidate = match LicenseKey::parse(candidate) {
            Ok(key) => key,
            Err(e) => {
                debug!(reason = %e, "rejecting malformed license key");
                return Err(LicenseError::InvalidKey);
            }
        };

        let expected = derive_key_with_secret(device_id, claimed, &self.secret);
        if !bool::from(candidate.as_bytes().ct_eq(expected.as_bytes())) {
            debug!(
                tier = %claimed.tier(),
                region = %claimed.region(),
                "license key does not match device and entitlement"
            );
            return Err(LicenseError::InvalidKey);
        }

        if let Some(expiry) = claimed.expiry().filter(|_| claimed.is_expired_on(today)) {
            debug!(%expiry, "license key matched but has expired");
            return Err(LicenseError::Expired(expiry));
        }

        Ok(*claimed)
    }

    /// Runs [`validate`](Self::validate) and reports only the status.
    #[must_use]
    pub fn status(&self, candidate: &str, claimed: &Entitlement) -> LicenseStatus {
        LicenseStatus::from_result(&self.validate(candidate, claimed))
    }

    /// Re-validates the activation record kept in `store`.
    ///
    /// The record's device id is not trusted; the machine is fingerprinted again.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::NotActivated`] when no record exists, storage
    /// errors when it cannot be read, and otherwise the errors of
    /// [`validate`](Self::validate).
    pub fn check_stored(&self, store: &ActivationStore) -> LicenseResult<Entitlement> {
        let record = store.load()?.ok_or(LicenseError::NotActivated)?;
        self.validate(record.key.as_str(), &record.entitlement)
    }
}
