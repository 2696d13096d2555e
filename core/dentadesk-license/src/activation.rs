//! Local activation cache.
//!
//! Remembers the last accepted key so the product can skip the activation
//! screen on later launches. The record is a convenience, not a credential:
//! [`Validator::check_stored`] re-validates it against a fresh fingerprint
//! every time.

use crate::device::{DeviceId, HardwareProbe};
use crate::entitlement::Entitlement;
use crate::error::{LicenseError, LicenseResult};
use crate::key::LicenseKey;
use crate::validator::Validator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the platform data dir.
const APP_DIR: &str = "DentaDesk";

/// File name of the activation record.
const RECORD_FILE: &str = "license.json";

/// A key accepted on this machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationRecord {
    /// The accepted key, normalized.
    pub key: LicenseKey,
    /// The entitlement the key was accepted for.
    pub entitlement: Entitlement,
    /// Device id at activation time. Informational only.
    pub device_id: DeviceId,
    /// When the key was accepted.
    pub activated_at: DateTime<Utc>,
}

/// JSON file holding at most one [`ActivationRecord`].
#[derive(Debug, Clone)]
pub struct ActivationStore {
    path: PathBuf,
}

impl ActivationStore {
    /// Opens a store backed by `path`. The file need not exist.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Opens the store in the platform data directory.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if the platform has no data directory.
    pub fn default_location() -> LicenseResult<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| LicenseError::Storage("no data directory on this platform".into()))?;
        Ok(Self::open(dir.join(APP_DIR).join(RECORD_FILE)))
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the stored record, if any.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if the file exists but cannot be read,
    /// or [`LicenseError::Serialization`] if it does not hold a record.
    pub fn load(&self) -> LicenseResult<Option<ActivationRecord>> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error("read", &e)),
        };
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Writes `record`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if the directory or file cannot be written.
    pub fn save(&self, record: &ActivationRecord) -> LicenseResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| storage_error("create directory", &e))?;
        }
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&self.path, json).map_err(|e| storage_error("write", &e))?;
        debug!(path = %self.path.display(), "activation record saved");
        Ok(())
    }

    /// Removes the stored record. Succeeds if there was none.
    ///
    /// # Errors
    ///
    /// Returns [`LicenseError::Storage`] if an existing record cannot be removed.
    pub fn clear(&self) -> LicenseResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", &e)),
        }
    }

    /// Returns true if no key has been activated yet.
    #[must_use]
    pub fn is_first_run(&self) -> bool {
        !self.path.exists()
    }
}

fn storage_error(action: &str, e: &io::Error) -> LicenseError {
    LicenseError::Storage(format!("failed to {action} activation record: {e}"))
}

/// Validates `key` on this machine and records it in `store`.
///
/// The machine is fingerprinted once; the stored device id is the one the
/// key was checked against. Nothing is written unless validation succeeds.
///
/// # Errors
///
/// Returns the validation error, or a storage error if the record cannot be written.
pub fn activate<P: HardwareProbe>(
    validator: &Validator<P>,
    store: &ActivationStore,
    key: &str,
    entitlement: &Entitlement,
) -> LicenseResult<ActivationRecord> {
    let device_id = validator.device_id()?;
    let today = Utc::now().date_naive();
    let entitlement = validator.validate_for_device(key, entitlement, &device_id, today)?;

    let record = ActivationRecord {
        key: LicenseKey::parse(key)?,
        entitlement,
        device_id,
        activated_at: Utc::now(),
    };
    store.save(&record)?;

    info!(
        tier = %entitlement.tier(),
        region = %entitlement.region(),
        "license activated"
    );
    Ok(record)
}
