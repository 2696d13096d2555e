//! Shared report types for the DentaDesk license tools.
//!
//! The generator's text report keeps the `Key: XXXXX-XXXXX-XXXXX-XXXXX` line
//! that older front-ends scrape from stdout; [`extract_key`] implements that
//! scraping for callers still consuming text.

use chrono::NaiveDate;
use dentadesk_license::{
    derive_key, DeviceFingerprint, DeviceId, Entitlement, FingerprintSource, LicenseResult,
    SourceStrength,
};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const RULE: &str = "==================================================";

/// Result of generating one license key.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct KeyReport {
    pub device_id: String,
    pub tier: String,
    pub region: String,
    pub expires: Option<NaiveDate>,
    pub key: String,
    pub issued_on: NaiveDate,
}

impl KeyReport {
    /// Renders the human-readable report printed by `dentadesk-keygen`.
    #[must_use]
    pub fn render_text(&self) -> String {
        let expires = self
            .expires
            .map_or_else(|| "never".to_string(), |d| d.to_string());

        let mut out = String::new();
        let _ = writeln!(out, "DentaDesk License Key");
        let _ = writeln!(out, "{RULE}");
        let _ = writeln!(out, "Device ID: {}", self.device_id);
        let _ = writeln!(out, "Tier:      {}", self.tier);
        let _ = writeln!(out, "Region:    {}", self.region);
        let _ = writeln!(out, "Expires:   {expires}");
        let _ = writeln!(out, "Issued:    {}", self.issued_on);
        let _ = writeln!(out);
        let _ = writeln!(out, "Key: {}", self.key);
        let _ = writeln!(out, "{RULE}");
        out
    }
}

/// Validates the operator's inputs and derives the key.
///
/// `tier` and `region` must match the enumerated names exactly.
///
/// # Errors
///
/// Returns `InvalidDeviceId` or `InvalidEntitlement` for malformed input.
pub fn generate(
    device_id: &str,
    tier: &str,
    region: &str,
    expires: Option<NaiveDate>,
) -> LicenseResult<KeyReport> {
    let device_id = DeviceId::parse(device_id)?;
    let mut entitlement = Entitlement::parse(tier, region)?;
    if let Some(date) = expires {
        entitlement = entitlement.with_expiry(date);
    }

    debug!(device_id = %device_id, "deriving license key");
    let key = derive_key(&device_id, &entitlement);
    info!(
        tier = %entitlement.tier(),
        region = %entitlement.region(),
        perpetual = expires.is_none(),
        "license key generated"
    );

    Ok(KeyReport {
        device_id: device_id.to_string(),
        tier: entitlement.tier().to_string(),
        region: entitlement.region().to_string(),
        expires: entitlement.expiry(),
        key: key.to_string(),
        issued_on: chrono::Utc::now().date_naive(),
    })
}

/// Finds the key in a free-form text report.
///
/// Looks for a `label: value` line with a token that contains a dash, is
/// longer than 15 characters and consists only of letters, digits and dashes.
/// Text around the key on the same line is ignored.
#[must_use]
pub fn extract_key(report: &str) -> Option<&str> {
    report.lines().find_map(|line| {
        let (label, value) = line.split_once(':')?;
        if label.trim().is_empty() {
            return None;
        }
        value.split_whitespace().find(|token| looks_like_key(token))
    })
}

fn looks_like_key(token: &str) -> bool {
    token.len() > 15
        && token.contains('-')
        && token.chars().all(|c| c.is_alphanumeric() || c == '-')
}

/// Describes the local machine's fingerprint.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FingerprintReport {
    pub device_id: String,
    pub source: FingerprintSource,
    pub strength: SourceStrength,
}

impl From<&DeviceFingerprint> for FingerprintReport {
    fn from(fp: &DeviceFingerprint) -> Self {
        Self {
            device_id: fp.id().to_string(),
            source: fp.source(),
            strength: fp.strength(),
        }
    }
}

impl FingerprintReport {
    /// Renders the human-readable fingerprint summary.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Device ID: {}", self.device_id);
        let _ = writeln!(out, "Source:    {}", self.source);
        if self.strength == SourceStrength::Weak {
            let _ = writeln!(
                out,
                "Warning:   derived from hostname only; identically configured machines may share this id"
            );
        }
        out
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` overrides the level.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
