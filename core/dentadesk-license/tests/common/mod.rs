//! Shared test helpers for license tests.

#![allow(dead_code)]

use dentadesk_license::{
    Collector, DeviceId, Entitlement, HardwareProbe, Region, SharedSecret, Tier, Validator,
};

/// Device id from the operator tooling's reference scenario.
pub const SCENARIO_DEVICE_ID: &str = "40677b86a3f4d164d1d5e8f9a2b3c4d5";

/// Key derived for the reference scenario (STANDARD, GLOBAL, perpetual)
/// under the embedded secret.
pub const SCENARIO_KEY: &str = "5AVJY-UAEFA-9U7EU-8SNY8";

/// A probe returning fixed values instead of reading the machine.
#[derive(Debug, Clone, Default)]
pub struct FixedProbe {
    pub uuid: Option<String>,
    pub mac: Option<String>,
    pub platform: Option<String>,
}

impl FixedProbe {
    /// A probe whose only source is a platform UUID.
    pub fn with_uuid(uuid: &str) -> Self {
        Self {
            uuid: Some(uuid.to_string()),
            ..Self::default()
        }
    }

    /// A probe with no readable sources.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl HardwareProbe for FixedProbe {
    fn platform_uuid(&self) -> Option<String> {
        self.uuid.clone()
    }

    fn mac_address(&self) -> Option<String> {
        self.mac.clone()
    }

    fn platform_string(&self) -> Option<String> {
        self.platform.clone()
    }
}

/// A secret distinct from the embedded one.
pub fn test_secret() -> SharedSecret {
    SharedSecret::from_bytes(b"test-secret-do-not-ship".to_vec())
}

/// Validator for a machine whose platform UUID is `uuid`, using [`test_secret`].
pub fn validator_for(uuid: &str) -> Validator<FixedProbe> {
    Validator::with_parts(Collector::with_probe(FixedProbe::with_uuid(uuid)), test_secret())
}

/// Device id that [`validator_for`] computes for `uuid`.
pub fn device_id_for(uuid: &str) -> DeviceId {
    DeviceId::from_source(uuid)
}

/// Parses a known-good device id.
pub fn device(id: &str) -> DeviceId {
    DeviceId::parse(id).unwrap()
}

/// The most common entitlement.
pub fn standard_global() -> Entitlement {
    Entitlement::new(Tier::Standard, Region::Global)
}
