//! Property-based tests for key derivation and validation.
//!
//! These tests verify binding properties that must always hold:
//! - Derivation is deterministic
//! - Distinct devices never share a key for the same entitlement
//! - Every entitlement field feeds into the key
//! - A derived key validates on its own device and nowhere else
//! - Malformed device ids are rejected

mod common;

use chrono::NaiveDate;
use common::{test_secret, FixedProbe};
use dentadesk_license::{
    derive_key_with_secret, Collector, DeviceId, Entitlement, LicenseError, LicenseKey, Region,
    Tier, Validator,
};
use proptest::prelude::*;

// =============================================================================
// HELPER STRATEGIES
// =============================================================================

fn device_id_strategy() -> impl Strategy<Value = DeviceId> {
    "[0-9a-f]{32}".prop_map(|s| DeviceId::parse(&s).unwrap())
}

fn tier_strategy() -> impl Strategy<Value = Tier> {
    prop::sample::select(Tier::ALL.to_vec())
}

fn region_strategy() -> impl Strategy<Value = Region> {
    prop::sample::select(Region::ALL.to_vec())
}

fn expiry_strategy() -> impl Strategy<Value = Option<NaiveDate>> {
    prop::option::of((2024i32..2100, 1u32..=12, 1u32..=28).prop_map(|(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }))
}

fn entitlement_strategy() -> impl Strategy<Value = Entitlement> {
    (tier_strategy(), region_strategy(), expiry_strategy()).prop_map(|(tier, region, expiry)| {
        let e = Entitlement::new(tier, region);
        match expiry {
            Some(d) => e.with_expiry(d),
            None => e,
        }
    })
}

fn machine_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9-]{1,40}"
}

fn validator_on(machine: &str) -> Validator<FixedProbe> {
    Validator::with_parts(
        Collector::with_probe(FixedProbe::with_uuid(machine)),
        test_secret(),
    )
}

// =============================================================================
// DERIVATION PROPERTIES
// =============================================================================

mod derivation_properties {
    use super::*;

    proptest! {
        /// Same inputs always produce the same key
        #[test]
        fn deterministic(id in device_id_strategy(), ent in entitlement_strategy()) {
            let a = derive_key_with_secret(&id, &ent, &test_secret());
            let b = derive_key_with_secret(&id, &ent, &test_secret());
            prop_assert_eq!(a, b);
        }

        /// Derived keys always parse back to themselves
        #[test]
        fn keys_are_well_formed(id in device_id_strategy(), ent in entitlement_strategy()) {
            let key = derive_key_with_secret(&id, &ent, &test_secret());
            let parsed = LicenseKey::parse(key.as_str()).unwrap();
            prop_assert_eq!(parsed, key);
        }

        /// Different devices get different keys for the same entitlement
        #[test]
        fn binding_uniqueness(
            a in device_id_strategy(),
            b in device_id_strategy(),
            ent in entitlement_strategy(),
        ) {
            prop_assume!(a != b);
            let ka = derive_key_with_secret(&a, &ent, &test_secret());
            let kb = derive_key_with_secret(&b, &ent, &test_secret());
            prop_assert_ne!(ka, kb);
        }

        /// Different entitlements get different keys on the same device
        #[test]
        fn entitlement_sensitivity(
            id in device_id_strategy(),
            e1 in entitlement_strategy(),
            e2 in entitlement_strategy(),
        ) {
            prop_assume!(e1 != e2);
            let k1 = derive_key_with_secret(&id, &e1, &test_secret());
            let k2 = derive_key_with_secret(&id, &e2, &test_secret());
            prop_assert_ne!(k1, k2);
        }
    }
}

// =============================================================================
// VALIDATION PROPERTIES
// =============================================================================

mod validation_properties {
    use super::*;

    proptest! {
        /// A key derived for a machine validates on that machine
        #[test]
        fn roundtrip(machine in machine_strategy(), tier in tier_strategy(), region in region_strategy()) {
            let ent = Entitlement::new(tier, region);
            let key = derive_key_with_secret(&DeviceId::from_source(&machine), &ent, &test_secret());
            let validated = validator_on(&machine).validate(key.as_str(), &ent).unwrap();
            prop_assert_eq!(validated, ent);
        }

        /// A key derived for one machine fails on any other
        #[test]
        fn cross_device_rejection(
            a in machine_strategy(),
            b in machine_strategy(),
            ent in entitlement_strategy(),
        ) {
            prop_assume!(a != b);
            let key = derive_key_with_secret(&DeviceId::from_source(&a), &ent, &test_secret());
            let result = validator_on(&b).validate(key.as_str(), &ent);
            prop_assert!(matches!(result, Err(LicenseError::InvalidKey)));
        }
    }
}

// =============================================================================
// FORMAT PROPERTIES
// =============================================================================

mod format_properties {
    use super::*;

    proptest! {
        /// Wrong-length hex strings are rejected
        #[test]
        fn wrong_length_rejected(s in "[0-9a-f]{0,64}") {
            prop_assume!(s.len() != 32);
            prop_assert!(matches!(DeviceId::parse(&s), Err(LicenseError::InvalidDeviceId(_))));
        }

        /// Any uppercase letter makes a device id invalid
        #[test]
        fn uppercase_rejected(s in "[0-9a-f]{31}", pos in 0usize..32, c in "[A-F]") {
            let mut id = s.clone();
            id.insert_str(pos.min(id.len()), &c);
            prop_assert!(matches!(DeviceId::parse(&id), Err(LicenseError::InvalidDeviceId(_))));
        }
    }
}
